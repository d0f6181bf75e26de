//! Page-tree helpers: inherited attributes and the visible page box.

use lopdf::{Document, Object, ObjectId};

/// Visible page area in PDF user space as `[llx, lly, urx, ury]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageBox {
    pub llx: f64,
    pub lly: f64,
    pub urx: f64,
    pub ury: f64,
}

impl PageBox {
    /// US Letter, used when a page carries no usable box.
    pub const LETTER: PageBox = PageBox {
        llx: 0.0,
        lly: 0.0,
        urx: 612.0,
        ury: 792.0,
    };

    /// Convert a user-space point to top-left page space.
    pub fn to_top_left(&self, x: f64, y: f64) -> (f64, f64) {
        (x - self.llx, self.ury - y)
    }

    /// Convert a top-left page-space point to user space.
    pub fn to_user_space(&self, x: f64, y: f64) -> (f64, f64) {
        (x + self.llx, self.ury - y)
    }

    fn from_object(doc: &Document, obj: &Object) -> Option<Self> {
        let (_, obj) = doc.dereference(obj).ok()?;
        let values: Vec<f64> = obj
            .as_array()
            .ok()?
            .iter()
            .filter_map(|o| number(doc, o))
            .collect();

        match values.as_slice() {
            [x0, y0, x1, y1] => Some(Self {
                llx: x0.min(*x1),
                lly: y0.min(*y1),
                urx: x0.max(*x1),
                ury: y0.max(*y1),
            }),
            _ => None,
        }
    }
}

/// Look up a page attribute, walking up the page tree for inheritable keys.
fn inherited<'a>(doc: &'a Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node_id = page_id;
    // Guard against cyclic Parent links in damaged files.
    for _ in 0..64 {
        let dict = doc.get_object(node_id).ok()?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value);
        }
        node_id = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

/// CropBox if present, else MediaBox, else US Letter.
pub fn page_box(doc: &Document, page_id: ObjectId) -> PageBox {
    inherited(doc, page_id, b"CropBox")
        .and_then(|obj| PageBox::from_object(doc, obj))
        .or_else(|| inherited(doc, page_id, b"MediaBox").and_then(|obj| PageBox::from_object(doc, obj)))
        .unwrap_or(PageBox::LETTER)
}

/// Resolve a numeric object, following references.
fn number(doc: &Document, obj: &Object) -> Option<f64> {
    let (_, obj) = doc.dereference(obj).ok()?;
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}
