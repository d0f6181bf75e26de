//! Rule-based field extractors for purchase orders.

pub mod dates;
pub mod number;
pub mod patterns;

pub use dates::{extract_order_date, OrderDateExtractor};
pub use number::{extract_order_number, OrderNumberExtractor};

/// Trait for field extractors.
pub trait FieldExtractor {
    /// The type of value this extractor produces.
    type Output;

    /// Extract the first occurrence of the field.
    fn extract(&self, text: &str) -> Option<Self::Output>;

    /// Extract all occurrences of the field, in document order.
    fn extract_all(&self, text: &str) -> Vec<Self::Output>;
}
