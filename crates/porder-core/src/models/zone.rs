//! Capture zone geometry.

use serde::{Deserialize, Serialize};

use crate::error::{PorderError, Result};

/// Axis-aligned rectangle on the first page where the supplier name is printed.
///
/// Coordinates are in points with the origin at the top-left corner of the
/// page, the way a reader measures a printed form. Conversion to PDF user
/// space (origin bottom-left) happens at the PDF layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CaptureZone {
    /// Left edge.
    pub x0: f64,
    /// Top edge.
    pub y0: f64,
    /// Width, strictly positive.
    pub width: f64,
    /// Height, strictly positive.
    pub height: f64,
}

impl CaptureZone {
    /// Default left edge of the supplier zone.
    pub const DEFAULT_X0: f64 = 350.0;
    /// Default top edge of the supplier zone.
    pub const DEFAULT_Y0: f64 = 140.0;
    /// Default width of the supplier zone.
    pub const DEFAULT_WIDTH: f64 = 240.0;
    /// Default height of the supplier zone.
    pub const DEFAULT_HEIGHT: f64 = 20.0;

    /// Create a zone, rejecting empty or non-finite rectangles.
    pub fn new(x0: f64, y0: f64, width: f64, height: f64) -> Result<Self> {
        let finite = [x0, y0, width, height].iter().all(|v| v.is_finite());
        if !finite {
            return Err(PorderError::Config(format!(
                "capture zone must be finite, got ({x0}, {y0}, {width}, {height})"
            )));
        }
        if width <= 0.0 || height <= 0.0 {
            return Err(PorderError::Config(format!(
                "capture zone needs a positive size, got {width}x{height}"
            )));
        }
        Ok(Self {
            x0,
            y0,
            width,
            height,
        })
    }

    /// Right edge.
    pub fn x1(&self) -> f64 {
        self.x0 + self.width
    }

    /// Bottom edge.
    pub fn y1(&self) -> f64 {
        self.y0 + self.height
    }

    /// Whether a point (top-left space) lies inside the zone, edges included.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x0 && x <= self.x1() && y >= self.y0 && y <= self.y1()
    }

    /// Parse `x0,y0,width,height` as given on the command line.
    pub fn parse(s: &str) -> Result<Self> {
        let values: Vec<f64> = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| PorderError::Config(format!("invalid capture zone '{s}': {e}")))?;

        match values.as_slice() {
            [x0, y0, width, height] => Self::new(*x0, *y0, *width, *height),
            _ => Err(PorderError::Config(format!(
                "capture zone needs four values x0,y0,width,height, got '{s}'"
            ))),
        }
    }
}

impl Default for CaptureZone {
    fn default() -> Self {
        Self {
            x0: Self::DEFAULT_X0,
            y0: Self::DEFAULT_Y0,
            width: Self::DEFAULT_WIDTH,
            height: Self::DEFAULT_HEIGHT,
        }
    }
}

impl std::fmt::Display for CaptureZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})-({}, {})", self.x0, self.y0, self.x1(), self.y1())
    }
}
