//! Conversion of display titles into filesystem names.
//!
//! Titles come straight from remote feeds and may contain path separators,
//! shell metacharacters or be arbitrarily long. [`sanitize`] turns a title
//! into a legal, length-bounded name; [`disambiguate`] makes a sorted batch
//! of sibling names unique by appending ` [n]` suffixes.

use std::collections::HashSet;

/// Characters that are never allowed in a generated name.
pub const RESERVED_CHARS: [char; 11] = ['/', '\\', ':', '#', '?', '<', '>', '*', '|', '"', '\0'];

/// Replacement for reserved characters.
pub const FALLBACK_CHAR: char = '-';

/// Maximum length (in bytes) of a sanitized name, before any suffix.
pub const MAX_NAME_LEN: usize = 200;

/// Name used when a title sanitizes to nothing.
pub const UNTITLED: &str = "untitled";

/// Returns a filesystem-legal name for `title`.
///
/// Reserved characters become [`FALLBACK_CHAR`], surrounding whitespace is
/// trimmed and the result is cut to at most [`MAX_NAME_LEN`] bytes on a
/// character boundary.
pub fn sanitize(title: &str) -> String {
    let replaced: String = title
        .chars()
        .map(|c| if RESERVED_CHARS.contains(&c) { FALLBACK_CHAR } else { c })
        .collect();

    let mut out = truncate(replaced.trim(), MAX_NAME_LEN).trim_end();
    if out.is_empty() {
        out = UNTITLED;
    }

    match out {
        "." | ".." => out.replace('.', "-"),
        _ => out.to_string(),
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Makes a batch of already-sorted sanitized names unique.
///
/// Walks the names in order keeping the previous name and a run counter: a
/// name equal to its predecessor gets a ` [n]` suffix where `n` counts the
/// repetitions so far, and the counter resets on the first different name.
/// `["A", "A", "A", "B"]` becomes `["A", "A [1]", "A [2]", "B"]`.
///
/// If a suffixed name clashes with a literal title elsewhere in the batch
/// the counter keeps increasing until the name is free, so the output never
/// contains duplicates. The result is a pure function of the input order.
pub fn disambiguate<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut taken: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    let mut prev: Option<String> = None;
    let mut count = 0u32;

    for name in names {
        let name = name.as_ref();
        if prev.as_deref() == Some(name) {
            count += 1;
        } else {
            count = 0;
            prev = Some(name.to_string());
        }

        let mut candidate = with_suffix(name, count);
        while taken.contains(&candidate) {
            count += 1;
            candidate = with_suffix(name, count);
        }
        taken.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

fn with_suffix(name: &str, n: u32) -> String {
    if n == 0 {
        name.to_string()
    } else {
        format!("{name} [{n}]")
    }
}
