//! Purchase-order field extraction and file naming.

pub mod naming;
mod parser;
pub mod rules;

pub use naming::{candidate_filename, sanitize_for_filename};
pub use parser::{parse_fields, OrderParser};
