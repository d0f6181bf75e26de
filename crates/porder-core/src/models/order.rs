//! Purchase-order data extracted from a document and the per-file outcome.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One of the three values read from a purchase order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Order identifier ("N° commande").
    OrderId,
    /// Order date ("Date de commande").
    OrderDate,
    /// Supplier name, read from the capture zone.
    Supplier,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::OrderId => "order_id",
            Field::OrderDate => "order_date",
            Field::Supplier => "supplier",
        };
        f.write_str(name)
    }
}

/// Fields recovered from one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderFields {
    /// Order identifier.
    pub order_id: Option<String>,

    /// Order date, as printed.
    pub order_date: Option<String>,

    /// Supplier name.
    pub supplier: Option<String>,
}

impl OrderFields {
    /// Fields that are absent or empty, in filename order.
    pub fn missing(&self) -> Vec<Field> {
        [
            (Field::OrderId, &self.order_id),
            (Field::OrderDate, &self.order_date),
            (Field::Supplier, &self.supplier),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().is_none_or(str::is_empty))
        .map(|(field, _)| field)
        .collect()
    }

    /// Attach the zone text as the supplier. Blank text counts as absent.
    pub fn with_supplier(mut self, zone_text: &str) -> Self {
        let trimmed = zone_text.trim();
        self.supplier = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    /// Whether all three fields are usable for renaming.
    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }
}

/// What happened to the file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RenameOutcome {
    /// The file was renamed in place (or would be, on a dry run).
    Renamed { from: String, to: String },

    /// At least one field was missing; the original name was kept.
    MissingFields { missing: Vec<Field> },

    /// The candidate name already exists; the original name was kept.
    Collision { candidate: String },
}

impl RenameOutcome {
    /// Whether the name changed.
    pub fn is_renamed(&self) -> bool {
        matches!(self, RenameOutcome::Renamed { .. })
    }
}

/// Report for one processed file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileReport {
    /// Name of the file when the batch started.
    pub original_name: String,

    /// Name of the file after processing.
    pub final_name: String,

    /// Fields read before the rename decision.
    pub fields: OrderFields,

    /// Rename decision.
    pub rename: RenameOutcome,

    /// Zone text read again just before annotating.
    pub zone_text: Option<String>,

    /// Annotated copy. On dry runs this is where it would be written.
    pub output_path: Option<PathBuf>,

    /// Why the annotated copy could not be written. The rename, if any,
    /// already happened and stands.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_error: Option<String>,

    /// Non-fatal problems met along the way.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}
