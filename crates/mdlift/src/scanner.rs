//! Attachment reference scanning.
//!
//! Extracts raw attachment-reference substrings from markdown text.
//! Two syntaxes are recognized in a single pass:
//!
//! - `![alt](target)` - standard markdown image/link syntax
//! - `![[target]]` - wiki-style embed syntax (no alt text)
//!
//! The scanner is purely textual: it does not parse markdown structure
//! beyond these two token shapes, and it does not exclude matches inside
//! code fences or inline code spans. References written inside a code
//! sample are reported like any other.

/// Scan document text for attachment references.
///
/// Returns the raw matched substrings, byte-for-byte as they appear in
/// the document, in document order. The raw match is the key used later
/// for verbatim substitution, so it must not be trimmed or re-encoded.
/// Returns an empty vector when nothing matches.
pub fn scan(text: &str) -> Vec<String> {
    let pattern = regex::Regex::new(r"!\[(.*?)\]\((.*?)\)|!\[\[([^\]]+)\]\]").unwrap();

    pattern
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}
