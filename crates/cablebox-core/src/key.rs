//! Box-id key normalization
//!
//! Stored box ids and operator queries go through the same
//! [`KeyNormalizer::normalize`], so both sides of a lookup share one key space.

/// Canonical form of a raw identifier: uppercase, without whitespace or hyphens.
fn canonical(raw: &str) -> String {
    raw.chars()
        .flat_map(char::to_uppercase)
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}

/// Turns free-form box ids into canonical lookup keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyNormalizer {
    prefix: String,
}

impl KeyNormalizer {
    /// Create a normalizer for a facility prefix.
    ///
    /// The prefix is itself canonicalized, so `"av"` and `"A V"` both mean `"AV"`.
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: canonical(prefix),
        }
    }

    /// The canonical facility prefix
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Normalize a box id or query into its lookup key.
    ///
    /// # Examples
    /// ```
    /// use cablebox_core::KeyNormalizer;
    ///
    /// let keys = KeyNormalizer::new("AV");
    /// assert_eq!(keys.normalize(" av 04-01 "), "AV0401");
    /// assert_eq!(keys.normalize("04-01"), "AV0401");
    /// ```
    pub fn normalize(&self, raw: &str) -> String {
        let key = canonical(raw);
        if key.starts_with(&self.prefix) {
            key
        } else {
            let mut prefixed = String::with_capacity(self.prefix.len() + key.len());
            prefixed.push_str(&self.prefix);
            prefixed.push_str(&key);
            prefixed
        }
    }
}

impl Default for KeyNormalizer {
    fn default() -> Self {
        Self::new(crate::DEFAULT_FACILITY_PREFIX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_format_insensitive() {
        let keys = KeyNormalizer::new("AV");
        let expected = keys.normalize("AV0401");

        assert_eq!(expected, "AV0401");
        assert_eq!(keys.normalize("04-01"), expected);
        assert_eq!(keys.normalize(" av 04 01 "), expected);
        assert_eq!(keys.normalize("Av-04-01"), expected);
    }

    #[test]
    fn test_prefix_is_canonicalized() {
        assert_eq!(KeyNormalizer::new(" a-v ").prefix(), "AV");
        assert_eq!(KeyNormalizer::new("a v").normalize("12"), "AV12");
    }

    #[test]
    fn test_strips_all_whitespace_kinds() {
        let keys = KeyNormalizer::new("AV");
        assert_eq!(keys.normalize("04\t01\n"), "AV0401");
        assert_eq!(keys.normalize("04\u{3000}01"), "AV0401");
    }

    #[test]
    fn test_blank_input_is_just_the_prefix() {
        let keys = KeyNormalizer::new("AV");
        assert_eq!(keys.normalize(""), "AV");
        assert_eq!(keys.normalize(" - "), "AV");
    }

    #[test]
    fn test_empty_prefix_only_canonicalizes() {
        let keys = KeyNormalizer::new("");
        assert_eq!(keys.normalize("gt-01"), "GT01");
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(raw in "[ a-zA-Z0-9\\-\u{3000}大劇院]{0,24}") {
            let keys = KeyNormalizer::new("AV");
            let once = keys.normalize(&raw);
            prop_assert_eq!(keys.normalize(&once), once);
        }

        #[test]
        fn prop_key_is_uppercase_prefixed_and_clean(raw in "[ a-z0-9\\-]{0,24}") {
            let keys = KeyNormalizer::new("av");
            let key = keys.normalize(&raw);
            prop_assert!(key.starts_with("AV"));
            prop_assert!(!key.contains(' ') && !key.contains('-'));
            prop_assert_eq!(key.to_uppercase(), key.clone());
        }
    }
}
