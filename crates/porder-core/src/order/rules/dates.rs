//! Order date extraction.
//!
//! The date is kept exactly as printed. No calendar check is made, so
//! "45/13/24" is accepted when it follows the label.

use super::patterns::ORDER_DATE;
use super::FieldExtractor;

/// Extracts the date following the "Date de commande" label.
pub struct OrderDateExtractor;

impl OrderDateExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OrderDateExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldExtractor for OrderDateExtractor {
    type Output = String;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        ORDER_DATE
            .captures_iter(text)
            .filter(|caps| caps[2] == caps[4])
            .map(|caps| {
                format!("{}{}{}{}{}", &caps[1], &caps[2], &caps[3], &caps[4], &caps[5])
                    .trim()
                    .to_string()
            })
            .collect()
    }
}

/// Extract the first order date in document order.
pub fn extract_order_date(text: &str) -> Option<String> {
    OrderDateExtractor::new().extract(text)
}
