//! Value-level helpers: line unfolding, TEXT unescaping, address extraction.

/// Split raw text into logical lines (RFC 5545 §3.1).
///
/// A physical line starting with one space or tab continues the previous
/// line; that single character is dropped and nothing else is inserted.
/// Logical lines are trimmed and blank ones removed.
pub fn unfold_lines(text: &str) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines: Vec<String> = Vec::new();

    for physical in normalized.split('\n') {
        let continuation = physical
            .strip_prefix(' ')
            .or_else(|| physical.strip_prefix('\t'));

        match (continuation, lines.last_mut()) {
            (Some(rest), Some(previous)) => previous.push_str(rest),
            _ => lines.push(physical.to_string()),
        }
    }

    lines
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Undo TEXT escaping. Replacements run in a fixed order, one pass each.
pub fn unescape_text(value: &str) -> String {
    value
        .replace("\\n", "\n")
        .replace("\\N", "\n")
        .replace("\\r", "\r")
        .replace("\\t", "\t")
        .replace("\\\\", "\\")
        .replace("\\;", ";")
        .replace("\\,", ",")
}

const MAILTO: &str = "MAILTO:";

/// Address after a case-insensitive `MAILTO:` up to the next `;`, or the
/// whole value when there is no usable marker.
pub fn extract_address(value: &str) -> String {
    // ASCII uppercasing keeps byte offsets aligned with `value`
    let upper = value.to_ascii_uppercase();

    upper
        .find(MAILTO)
        .map(|idx| &value[idx + MAILTO.len()..])
        .map(|rest| rest.split(';').next().unwrap_or_default())
        .filter(|address| !address.is_empty())
        .unwrap_or(value)
        .to_string()
}
