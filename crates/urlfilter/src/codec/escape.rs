//! Reserved-character escaping for positional tokens.
//!
//! Condition tokens are split on [`SEPARATOR`] and list values on
//! [`LIST_SEPARATOR`], so any literal occurrence of those characters inside a
//! free-text segment is replaced by a placeholder before emission and restored
//! after splitting.
//!
//! The placeholder is the percent form of the reserved character (`|` → `%7C`).
//! `%` itself is always written as `%25`, which keeps the scheme reversible for
//! every input, including text that already contains something looking like a
//! placeholder.

/// Separator between the segments of a condition token.
pub const SEPARATOR: char = '|';

/// Separator between the items of a list value.
pub const LIST_SEPARATOR: char = ',';

const ESCAPE: char = '%';

fn placeholder(reserved: char) -> String {
    format!("{}{:02X}", ESCAPE, reserved as u32)
}

/// Replace every `reserved` character (and the escape character) in `text`.
pub fn escape(text: &str, reserved: char) -> String {
    if !text.contains(reserved) && !text.contains(ESCAPE) {
        return text.to_string();
    }

    let reserved_placeholder = placeholder(reserved);
    let escape_placeholder = placeholder(ESCAPE);
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        if c == ESCAPE {
            out.push_str(&escape_placeholder);
        } else if c == reserved {
            out.push_str(&reserved_placeholder);
        } else {
            out.push(c);
        }
    }
    out
}

/// Inverse of [`escape`]. Unknown `%XX` sequences are kept verbatim.
pub fn unescape(text: &str, reserved: char) -> String {
    if !text.contains(ESCAPE) {
        return text.to_string();
    }

    let reserved_placeholder = placeholder(reserved);
    let escape_placeholder = placeholder(ESCAPE);
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find(ESCAPE) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with(&escape_placeholder) {
            out.push(ESCAPE);
            rest = &tail[escape_placeholder.len()..];
        } else if tail.starts_with(&reserved_placeholder) {
            out.push(reserved);
            rest = &tail[reserved_placeholder.len()..];
        } else {
            out.push(ESCAPE);
            rest = &tail[ESCAPE.len_utf8()..];
        }
    }
    out.push_str(rest);
    out
}

/// Split `text` on unescaped `reserved` characters, unescaping each part.
pub fn split_escaped(text: &str, reserved: char) -> Vec<String> {
    text.split(reserved).map(|p| unescape(p, reserved)).collect()
}

/// Escape each part and join with `reserved`.
pub fn join_escaped<I, S>(parts: I, reserved: char) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .map(|p| escape(p.as_ref(), reserved))
        .collect::<Vec<_>>()
        .join(&reserved.to_string())
}
