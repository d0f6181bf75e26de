//! File name construction from extracted fields.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::rules::patterns::{FILENAME_DISALLOWED, WHITESPACE_RUN};
use crate::models::order::OrderFields;

/// Turn an arbitrary string into a file name fragment.
///
/// Accents are folded to their base letter, anything outside
/// `[A-Za-z0-9 _.-]` is dropped, space runs become a single `_` and
/// underscores at either end are trimmed.
pub fn sanitize_for_filename(s: &str) -> String {
    let folded: String = s.nfd().filter(|c| !is_combining_mark(*c)).collect();
    let cleaned = FILENAME_DISALLOWED.replace_all(&folded, "");
    let joined = WHITESPACE_RUN.replace_all(&cleaned, "_");
    joined.trim_matches('_').to_string()
}

/// Build `{id}_{date}_{supplier}.pdf`, or `None` when a field is missing.
///
/// Slashes in the date become dashes before sanitizing so that `05/03/2024`
/// survives as `05-03-2024`.
pub fn candidate_filename(fields: &OrderFields) -> Option<String> {
    if !fields.is_complete() {
        return None;
    }
    let order_id = fields.order_id.as_deref()?;
    let order_date = fields.order_date.as_deref()?;
    let supplier = fields.supplier.as_deref()?;

    Some(format!(
        "{}_{}_{}.pdf",
        sanitize_for_filename(order_id),
        sanitize_for_filename(&order_date.replace('/', "-")),
        sanitize_for_filename(supplier),
    ))
}
