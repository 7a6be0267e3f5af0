//! ICS feed parsing (RFC 5545 subset).
//!
//! Only VEVENT blocks are read, and only the properties listed in
//! [`PropertyName`]. Parsing never converts times; see [`crate::timezone`].

mod parse;
mod property;
mod text;

pub use parse::{ParseDiagnostic, ParseReport, parse, parse_with_report};
pub use property::{ContentLine, PropertyName};
pub use text::{extract_address, unescape_text, unfold_lines};
