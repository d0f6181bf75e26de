//! Configuration structures for the renaming pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::zone::CaptureZone;

/// Directory scanned for purchase orders when nothing else is given.
pub const DEFAULT_INPUT_DIR: &str = "01_Commandes";

/// Directory receiving the annotated copies when nothing else is given.
pub const DEFAULT_OUTPUT_DIR: &str = "dessin";

/// Main configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PorderConfig {
    /// Directory holding the purchase orders; files are renamed in place.
    pub input_dir: PathBuf,

    /// Directory receiving one annotated copy per processed file.
    pub output_dir: PathBuf,

    /// Where the supplier name is printed on the first page.
    pub zone: CaptureZone,

    /// How the zone is outlined on the annotated copy.
    pub annotation: AnnotationStyle,
}

impl Default for PorderConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            zone: CaptureZone::default(),
            annotation: AnnotationStyle::default(),
        }
    }
}

impl PorderConfig {
    /// Set the input directory.
    pub fn with_input_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.input_dir = dir.into();
        self
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Set the capture zone.
    pub fn with_zone(mut self, zone: CaptureZone) -> Self {
        self.zone = zone;
        self
    }
}

/// Stroke used to outline the capture zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationStyle {
    /// RGB stroke colour, each component in 0.0 - 1.0.
    pub color: [f32; 3],

    /// Line width in points.
    pub line_width: f32,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            color: [1.0, 0.0, 0.0],
            line_width: 1.0,
        }
    }
}
