//! Replacement token construction and document substitution.
//!
//! Given a resolved attachment and its new URL, builds the markdown
//! token that replaces the original reference (image token for
//! recognized image extensions, plain link otherwise) and performs the
//! exact substitution in document text.

use crate::attachment::Attachment;

/// Extensions rendered as inline images by markdown hosts.
const IMAGE_EXTENSIONS: [&str; 8] = ["avif", "bmp", "gif", "jpeg", "jpg", "png", "svg", "webp"];

/// Whether the given extension (with or without leading dot) denotes an
/// image. Comparison is case-insensitive.
pub fn is_image_extension(extension: &str) -> bool {
    let ext = extension.trim_start_matches('.').to_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str())
}

/// Percent-encode a URL for embedding in a markdown token.
///
/// Spaces become `%20`; already-encoded sequences are left untouched so
/// the upload command may return either form.
pub fn encode_url(url: &str) -> String {
    url.replace(' ', "%20")
}

/// Build the markdown token that replaces an attachment reference.
///
/// Image extensions produce `![name](url)`, everything else `[name](url)`.
pub fn build_replacement(attachment: &Attachment, url: &str) -> String {
    let encoded = encode_url(url);
    if is_image_extension(&attachment.extension) {
        format!("![{}]({})", attachment.name, encoded)
    } else {
        format!("[{}]({})", attachment.name, encoded)
    }
}

/// Replace the attachment's reference in document text.
///
/// Substitutes the first occurrence of the attachment's exact `source`
/// substring. Because `source` was captured verbatim from the scan, this
/// targets precisely the reference that was resolved; a document with
/// the same raw reference written twice gets one occurrence replaced per
/// invocation.
pub fn apply_replacement(text: &str, attachment: &Attachment, replacement: &str) -> String {
    text.replacen(&attachment.source, replacement, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::Resolver;
    use crate::vault::InMemoryVault;

    fn attachment(raw: &str, files: &[&str]) -> Attachment {
        let vault = InMemoryVault::with_files(files.iter().copied());
        Resolver::new(&vault, "/vault").resolve(raw).unwrap()
    }

    #[test]
    fn test_is_image_extension() {
        assert!(is_image_extension(".png"));
        assert!(is_image_extension("png"));
        assert!(is_image_extension(".PNG"));
        assert!(is_image_extension(".WebP"));
        assert!(!is_image_extension(".pdf"));
        assert!(!is_image_extension(""));
    }

    #[test]
    fn test_build_replacement_image_token() {
        let att = attachment("![cat](img/cat.png)", &["img/cat.png"]);
        assert_eq!(
            build_replacement(&att, "https://x/y.png"),
            "![cat](https://x/y.png)"
        );
    }

    #[test]
    fn test_build_replacement_link_token_for_non_image() {
        let att = attachment("![report](docs/report.pdf)", &["docs/report.pdf"]);
        assert_eq!(
            build_replacement(&att, "https://x/report.pdf"),
            "[report](https://x/report.pdf)"
        );
    }

    #[test]
    fn test_build_replacement_uppercase_extension_is_image() {
        let att = attachment("![cat](img/cat.PNG)", &["img/cat.PNG"]);
        assert!(build_replacement(&att, "https://x/y.PNG").starts_with("!["));
    }

    #[test]
    fn test_build_replacement_encodes_spaces() {
        let att = attachment("![cat](img/cat.png)", &["img/cat.png"]);
        assert_eq!(
            build_replacement(&att, "https://x/my cat.png"),
            "![cat](https://x/my%20cat.png)"
        );
    }

    #[test]
    fn test_apply_replacement_exact_substitution() {
        let att = attachment("![cat](./img/cat.png)", &["img/cat.png"]);
        let replacement = build_replacement(&att, "https://cdn/x/cat.png");
        let updated = apply_replacement("see ![cat](./img/cat.png) here", &att, &replacement);
        assert_eq!(updated, "see ![cat](https://cdn/x/cat.png) here");
    }

    #[test]
    fn test_apply_replacement_first_occurrence_only() {
        let att = attachment("![cat](cat.png)", &["cat.png"]);
        let text = "![cat](cat.png) and again ![cat](cat.png)";
        let updated = apply_replacement(text, &att, "![cat](https://x/cat.png)");
        assert_eq!(
            updated,
            "![cat](https://x/cat.png) and again ![cat](cat.png)"
        );
    }

    #[test]
    fn test_apply_replacement_leaves_unrelated_text_alone() {
        let att = attachment("![cat](cat.png)", &["cat.png"]);
        let text = "before ![dog](dog.png) ![cat](cat.png) after";
        let updated = apply_replacement(text, &att, "![cat](https://x/cat.png)");
        assert_eq!(updated, "before ![dog](dog.png) ![cat](https://x/cat.png) after");
    }

    #[test]
    fn test_rescan_after_replacement_finds_no_local_reference() {
        // Round-trip: once rewritten, the reference classifies as network.
        let vault = InMemoryVault::with_files(["img/cat.png"]);
        let resolver = Resolver::new(&vault, "/vault");
        let att = resolver.resolve("![cat](img/cat.png)").unwrap();

        let replacement = build_replacement(&att, "https://x/y.png");
        let updated = apply_replacement("see ![cat](img/cat.png)", &att, &replacement);

        let rescanned = resolver.resolve_all(&updated);
        assert_eq!(rescanned.len(), 1);
        assert_eq!(
            rescanned[0].existence,
            crate::attachment::ExistenceState::Network
        );
    }
}
