//! Regex patterns for French purchase-order labels.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // "N° commande : AB-1234"
    pub static ref ORDER_NUMBER: Regex = Regex::new(
        r"(?i)N°\s*commande\s*:?\s*([A-Za-z0-9.\-]+)"
    ).unwrap();

    // "Date de commande : 05/03/2024". Separators are checked for equality
    // after matching since the regex crate has no backreferences.
    pub static ref ORDER_DATE: Regex = Regex::new(
        r"(?i)Date\s+de\s+commande\s*:?\s*([0-9]{2})([-/])([0-9]{2})([-/])([0-9]{4}|[0-9]{2})"
    ).unwrap();

    // Characters kept in a file name fragment.
    pub static ref FILENAME_DISALLOWED: Regex = Regex::new(
        r"[^A-Za-z0-9 _.\-]"
    ).unwrap();

    pub static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").unwrap();
}
