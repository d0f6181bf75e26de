//! Order number extraction.

use super::patterns::ORDER_NUMBER;
use super::FieldExtractor;

/// Extracts the value following the "N° commande" label.
pub struct OrderNumberExtractor;

impl OrderNumberExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OrderNumberExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for OrderNumberExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        ORDER_NUMBER
            .captures_iter(text)
            .map(|caps| caps[1].trim().to_string())
            .filter(|value| !value.is_empty())
            .collect()
    }
}

/// Extract the first order number in document order.
pub fn extract_order_number(text: &str) -> Option<String> {
    OrderNumberExtractor::new().extract(text)
}
