//! One opened purchase order, from first read to annotated copy.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{PdfError, Result};
use crate::models::config::AnnotationStyle;
use crate::models::zone::CaptureZone;
use crate::pdf::PdfProcessor;

/// The zone and the outline always go on the first page.
const FIRST_PAGE: u32 = 1;

/// A document held open for the whole per-file pipeline.
///
/// The file may be renamed while the session is alive; [`path`](Self::path)
/// always reports where it currently lives. The loaded document is released
/// when the session is dropped.
pub struct DocumentSession<P: PdfProcessor> {
    path: PathBuf,
    processor: P,
}

impl<P: PdfProcessor + Default> DocumentSession<P> {
    /// Read and load the file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let data = fs::read(path)
            .map_err(|e| PdfError::Parse(format!("{}: {}", path.display(), e)))?;
        let mut processor = P::default();
        processor.load(&data)?;
        debug!("Opened {} ({} bytes)", path.display(), data.len());

        Ok(Self {
            path: path.to_path_buf(),
            processor,
        })
    }
}

impl<P: PdfProcessor> DocumentSession<P> {
    /// Current location of the file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current leaf name of the file.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.processor.page_count()
    }

    /// Full text of the document.
    pub fn full_text(&self) -> Result<String> {
        Ok(self.processor.extract_text()?)
    }

    /// Text inside the zone on the first page.
    pub fn zone_text(&self, zone: &CaptureZone) -> Result<String> {
        Ok(self.processor.extract_region_text(FIRST_PAGE, zone)?)
    }

    /// Rename the file within its directory.
    pub fn rename_to(&mut self, file_name: &str) -> Result<()> {
        let target = self.path.with_file_name(file_name);
        fs::rename(&self.path, &target)?;
        info!("Renamed {} -> {}", self.path.display(), target.display());
        self.path = target;
        Ok(())
    }

    /// Outline the zone and write the document into `output_dir` under the
    /// file's current name. Returns the written path.
    pub fn annotate_and_save(
        &mut self,
        zone: &CaptureZone,
        style: &AnnotationStyle,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        self.processor.draw_rectangle(FIRST_PAGE, zone, style)?;
        let output = output_dir.join(self.file_name());
        self.processor.save(&output)?;
        debug!("Wrote annotated copy {}", output.display());
        Ok(output)
    }
}
