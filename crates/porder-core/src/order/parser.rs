//! Rule-based parser for the text fields of a purchase order.

use tracing::debug;

use super::rules::{FieldExtractor, OrderDateExtractor, OrderNumberExtractor};
use crate::models::order::OrderFields;

/// Parser recovering the order number and date from full document text.
///
/// The supplier is not printed under a label and is read from the capture
/// zone instead, so it is always `None` in the parser's output.
pub struct OrderParser {
    number: OrderNumberExtractor,
    date: OrderDateExtractor,
}

impl OrderParser {
    pub fn new() -> Self {
        Self {
            number: OrderNumberExtractor::new(),
            date: OrderDateExtractor::new(),
        }
    }

    /// Parse both text fields. Either may be absent.
    pub fn parse(&self, text: &str) -> OrderFields {
        let order_id = self.number.extract(text);
        let order_date = self.date.extract(text);

        debug!(
            "Parsed {} chars: order_id={:?}, order_date={:?}",
            text.len(),
            order_id,
            order_date
        );

        OrderFields {
            order_id,
            order_date,
            supplier: None,
        }
    }
}

impl Default for OrderParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse order number and date from document text.
pub fn parse_fields(text: &str) -> OrderFields {
    OrderParser::new().parse(text)
}
