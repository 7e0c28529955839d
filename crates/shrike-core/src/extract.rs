use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // local-part@domain with at least one dot in the domain
    static ref EMAIL_RE: Regex =
        Regex::new(r"(?i)\b[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}\b").unwrap();
}

/// "Addresses" whose domain tail is an image filename are srcset/markup
/// artifacts (`img@2x.png`), not contacts.
const MARKUP_ARTIFACT_SUFFIXES: &[&str] = &[".png", ".jpg", ".jpeg", ".gif", ".webp"];

/// Return the first email-like substring in `text`, or `None` if the page
/// contains no candidate. Matching is case-insensitive but the original
/// casing is preserved in the returned value. Pure and total: a page with no
/// address is a normal miss, not an error.
pub fn first_email(text: &str) -> Option<String> {
    EMAIL_RE
        .find_iter(text)
        .map(|m| m.as_str())
        .find(|candidate| {
            let lowered = candidate.to_lowercase();
            !MARKUP_ARTIFACT_SUFFIXES
                .iter()
                .any(|suffix| lowered.ends_with(suffix))
        })
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_first_address() {
        let text = "contact us at foo.bar@example.com today";
        assert_eq!(first_email(text), Some("foo.bar@example.com".to_string()));
    }

    #[test]
    fn test_first_match_wins() {
        let text = "press: press@example.com, sales: sales@example.com";
        assert_eq!(first_email(text), Some("press@example.com".to_string()));
    }

    #[test]
    fn test_no_address_is_a_miss() {
        assert_eq!(first_email(""), None);
        assert_eq!(first_email("no contact info on this page"), None);
        assert_eq!(first_email("half an address: foo@bar"), None);
    }

    #[test]
    fn test_preserves_original_casing() {
        let text = "write to Jane.Doe@Example.COM for details";
        assert_eq!(first_email(text), Some("Jane.Doe@Example.COM".to_string()));
    }

    #[test]
    fn test_skips_markup_artifacts() {
        let text = r#"<img src="logo@2x.png"> reach us: ops@example.com"#;
        assert_eq!(first_email(text), Some("ops@example.com".to_string()));
    }

    #[test]
    fn test_deterministic() {
        let text = "contact us at foo.bar@example.com today";
        assert_eq!(first_email(text), first_email(text));
    }
}
