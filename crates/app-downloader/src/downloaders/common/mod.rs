pub mod file_name;
pub mod icon;
pub mod page;
pub mod request;

/// Primary subtag of a language tag, lowercased: `en-US` and `EN_us` give `en`.
#[must_use]
pub fn primary_language(tag: &str) -> String {
    tag.trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Whether a request for `requested` can be served by a source speaking
/// `supported`.
#[must_use]
pub fn language_matches(requested: &str, supported: &str) -> bool {
    let requested = primary_language(requested);

    !requested.is_empty() && requested == primary_language(supported)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_language_strips_region() {
        assert_eq!(primary_language("en-US"), "en");
        assert_eq!(primary_language(" PT_br "), "pt");
        assert_eq!(primary_language("ja"), "ja");
        assert_eq!(primary_language(""), "");
    }

    #[test]
    fn matches_ignore_region_and_case() {
        assert!(language_matches("en-GB", "en"));
        assert!(language_matches("JA", "ja"));
        assert!(!language_matches("de", "en"));
        assert!(!language_matches("", "en"));
    }
}
