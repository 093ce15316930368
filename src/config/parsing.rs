//! Line-level helpers shared by settings parsing.

/// Whether `line` carries no setting (blank or a `#`, `//`, `;` comment).
pub(crate) fn skip_comment_or_empty(line: &str) -> bool {
    let t = line.trim();
    t.is_empty() || t.starts_with('#') || t.starts_with("//") || t.starts_with(';')
}

/// What: Split a `key = value` line into a normalized key and a cleaned value.
///
/// Inputs:
/// - `line`: Raw settings line.
///
/// Output:
/// - `Some((key, value))` with the key lowercased and `.`/`-`/space mapped to
///   `_`, and the value stripped of inline comments; `None` for lines without
///   `=` or comment lines.
pub(crate) fn parse_key_value(line: &str) -> Option<(String, &str)> {
    if skip_comment_or_empty(line) {
        return None;
    }
    let (raw_key, raw_val) = line.trim().split_once('=')?;
    let key = raw_key.trim().to_lowercase().replace(['.', '-', ' '], "_");
    if key.is_empty() {
        return None;
    }
    Some((key, strip_inline_comment(raw_val.trim())))
}

/// What: Strip a trailing inline comment from a value.
///
/// Details:
/// - `//` starts a comment anywhere; `#` does too, except a leading `#` is
///   kept as part of the value.
pub(crate) fn strip_inline_comment(mut s: &str) -> &str {
    if let Some(i) = s.find("//") {
        s = &s[..i];
    }
    if let Some(i_rel) = if let Some(stripped) = s.strip_prefix('#') {
        stripped.find('#').map(|j| j + 1)
    } else {
        s.find('#')
    } {
        s = &s[..i_rel];
    }
    s.trim()
}

/// Interpret common truthy spellings; `None` when not a boolean.
pub(crate) fn parse_bool(val: &str) -> Option<bool> {
    match val.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
