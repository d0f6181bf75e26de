//! Core library for purchase-order PDF renaming.
//!
//! This crate provides:
//! - PDF processing (full text, text inside a capture zone, zone outline)
//! - Order number and date extraction from French purchase orders
//! - File name sanitizing and the rename decision
//! - A sequential batch driver over an input directory

pub mod batch;
pub mod error;
pub mod models;
pub mod order;
pub mod pdf;
pub mod session;

pub use batch::{BatchProcessor, BatchSummary, FileFailure};
pub use error::{PdfError, PorderError, Result};
pub use models::config::{AnnotationStyle, PorderConfig};
pub use models::order::{Field, FileReport, OrderFields, RenameOutcome};
pub use models::zone::CaptureZone;
pub use order::{candidate_filename, parse_fields, sanitize_for_filename, OrderParser};
pub use pdf::{extract_full_text, extract_text_in_region, PdfExtractor, PdfProcessor};
pub use session::DocumentSession;
