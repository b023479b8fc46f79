//! Text canonicalisation for equality matching.

/// Normalize a title/abstract for comparison.
///
/// Keeps ASCII letters and digits only and lower-cases them. Returns `None`
/// when nothing is left, so empty texts never match each other.
pub fn normalize_text(text: Option<&str>) -> Option<String> {
    let normalized: String = text?
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    (!normalized.is_empty()).then_some(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text(Some("Foo Bar")), Some("foobar".to_string()));
        assert_eq!(normalize_text(Some("foo   bar!!")), Some("foobar".to_string()));
        assert_eq!(
            normalize_text(Some("COVID-19: A Review (2020)")),
            Some("covid19areview2020".to_string())
        );
    }

    #[test]
    fn test_non_ascii_is_stripped() {
        assert_eq!(normalize_text(Some("Café Über")), Some("cafber".to_string()));
    }

    #[test]
    fn test_empty_is_absent() {
        assert_eq!(normalize_text(None), None);
        assert_eq!(normalize_text(Some("")), None);
        assert_eq!(normalize_text(Some("   ")), None);
        assert_eq!(normalize_text(Some("?!- ...")), None);
    }

    #[test]
    fn test_idempotent() {
        for text in ["Hello, World!", "a  B c", "10.1000/XYZ", "   "] {
            let once = normalize_text(Some(text));
            let twice = normalize_text(once.as_deref());
            assert_eq!(once, twice);
        }
    }
}
