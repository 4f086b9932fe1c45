//! Hall-name to hall-code policy

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How a raw hall name is matched against configured long-form names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum HallMatch {
    /// The cleaned name must equal a configured name
    Exact,
    /// A configured name contained in the cleaned name also matches
    #[default]
    Contains,
}

/// One long-form hall name and the short code it maps to
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HallCode {
    /// Long-form name as it appears in the spreadsheet
    pub name: String,
    /// Short code shown to operators
    pub code: String,
}

impl HallCode {
    /// Create a new mapping entry
    pub fn new<N: Into<String>, C: Into<String>>(name: N, code: C) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
        }
    }
}

/// Strip embedded line breaks and surrounding whitespace from a hall name.
pub fn clean_hall_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '\n' && *c != '\r')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Ordered hall-name mapping.
///
/// An exact match always wins. In [`HallMatch::Contains`] mode the longest
/// configured name contained in the input wins next, and equal lengths fall
/// back to declaration order. Names that match nothing pass through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HallCodes {
    entries: Vec<HallCode>,
    mode: HallMatch,
}

impl HallCodes {
    /// Create a mapping from entries in declaration order
    pub fn new(entries: Vec<HallCode>, mode: HallMatch) -> Self {
        Self { entries, mode }
    }

    /// A mapping that passes every name through
    pub fn empty() -> Self {
        Self::default()
    }

    /// Configured entries in declaration order
    pub fn entries(&self) -> &[HallCode] {
        &self.entries
    }

    /// Matching mode
    pub fn mode(&self) -> HallMatch {
        self.mode
    }

    /// Look up the code for an already-cleaned hall name.
    pub fn code_for(&self, name: &str) -> Option<&str> {
        if let Some(entry) = self.entries.iter().find(|e| e.name == name) {
            return Some(&entry.code);
        }

        if self.mode == HallMatch::Exact {
            return None;
        }

        let mut best: Option<&HallCode> = None;
        for entry in &self.entries {
            if entry.name.is_empty() || !name.contains(entry.name.as_str()) {
                continue;
            }
            // Strictly longer only, so earlier declarations keep ties
            if best.map_or(true, |b| entry.name.chars().count() > b.name.chars().count()) {
                best = Some(entry);
            }
        }
        best.map(|e| e.code.as_str())
    }

    /// Clean a raw hall name and map it to its code when one is configured.
    pub fn resolve(&self, raw: &str) -> String {
        let cleaned = clean_hall_name(raw);
        match self.code_for(&cleaned) {
            Some(code) => code.to_string(),
            None => cleaned,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn theater_codes(mode: HallMatch) -> HallCodes {
        HallCodes::new(
            vec![
                HallCode::new("大劇院", "GT"),
                HallCode::new("多形式中劇院", "BB"),
                HallCode::new("鏡框式中劇院", "GP"),
            ],
            mode,
        )
    }

    #[test]
    fn test_clean_hall_name() {
        assert_eq!(clean_hall_name(" 大劇\n院 "), "大劇院");
        assert_eq!(clean_hall_name("多形式\r\n中劇院\n"), "多形式中劇院");
    }

    #[test]
    fn test_exact_mapping() {
        let codes = theater_codes(HallMatch::Exact);
        assert_eq!(codes.resolve("大劇院"), "GT");
        assert_eq!(codes.resolve("鏡框式\n中劇院"), "GP");
        assert_eq!(codes.resolve("國家大劇院 後台"), "國家大劇院 後台");
    }

    #[test]
    fn test_containment_mapping() {
        let codes = theater_codes(HallMatch::Contains);
        assert_eq!(codes.resolve("國家大劇院 後台"), "GT");
        assert_eq!(codes.resolve("2F 多形式中劇院"), "BB");
    }

    #[test]
    fn test_longest_contained_name_wins() {
        let codes = HallCodes::new(
            vec![HallCode::new("中劇院", "MID"), HallCode::new("鏡框式中劇院", "GP")],
            HallMatch::Contains,
        );
        assert_eq!(codes.resolve("北側 鏡框式中劇院"), "GP");
        assert_eq!(codes.resolve("中劇院 後台"), "MID");
    }

    #[test]
    fn test_equal_length_ties_use_declaration_order() {
        let codes = HallCodes::new(
            vec![HallCode::new("Hall", "FIRST"), HallCode::new("Main", "SECOND")],
            HallMatch::Contains,
        );
        assert_eq!(codes.resolve("Main Hall"), "FIRST");
    }

    #[test]
    fn test_unmatched_names_pass_through_cleaned() {
        let codes = theater_codes(HallMatch::Contains);
        assert_eq!(codes.resolve(" 實驗劇場\n"), "實驗劇場");
        assert_eq!(HallCodes::empty().resolve(" 大劇院 "), "大劇院");
    }
}
