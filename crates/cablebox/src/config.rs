//! Loader configuration

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use cablebox_core::{HallCode, HallCodes, HallMatch, KeyNormalizer, DEFAULT_FACILITY_PREFIX};

/// Header aliases for each inventory field.
///
/// The first alias present in the sheet wins. Matching ignores ASCII case and
/// surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ColumnAliases {
    pub box_id: Vec<String>,
    pub hall: Vec<String>,
    pub location: Vec<String>,
    pub system: Vec<String>,
    pub connector_type: Vec<String>,
    pub connector_form: Vec<String>,
    pub connector_count: Vec<String>,
}

fn aliases(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

impl Default for ColumnAliases {
    fn default() -> Self {
        Self {
            box_id: aliases(&["迴路盒編號", "Box ID", "box_id"]),
            hall: aliases(&["廳別", "Hall", "hall"]),
            location: aliases(&["位置", "Location", "location"]),
            system: aliases(&["系統", "System", "system"]),
            connector_type: aliases(&["接頭種類", "Connector Type", "connector_type"]),
            connector_form: aliases(&["接頭型式", "Connector Form", "connector_form"]),
            connector_count: aliases(&["數量", "Count", "connector_count"]),
        }
    }
}

/// Everything the loader and resolver can be told.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoaderConfig {
    /// Directory scanned for the inventory spreadsheet
    pub source_dir: PathBuf,
    /// Candidate file extensions, without the dot
    pub extensions: Vec<String>,
    /// File-name tokens identifying the inventory file among candidates
    pub keywords: Vec<String>,
    /// Token every normalized key starts with
    pub facility_prefix: String,
    /// Long-form hall names and their codes, in declaration order
    pub hall_codes: Vec<HallCode>,
    /// How hall names are matched against `hall_codes`
    pub hall_match: HallMatch,
    /// Header aliases per field
    pub columns: ColumnAliases,
    /// Worksheet to read; the first one when unset
    pub sheet: Option<String>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("."),
            extensions: vec!["xlsx".to_string()],
            keywords: aliases(&["Cable", "音視訊", "迴路盒"]),
            facility_prefix: DEFAULT_FACILITY_PREFIX.to_string(),
            hall_codes: vec![
                HallCode::new("大劇院", "GT"),
                HallCode::new("多形式中劇院", "BB"),
                HallCode::new("鏡框式中劇院", "GP"),
            ],
            hall_match: HallMatch::Contains,
            columns: ColumnAliases::default(),
            sheet: None,
        }
    }
}

impl LoaderConfig {
    /// Read a JSON configuration file; omitted fields keep their defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse a JSON configuration string
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Pretty JSON form of this configuration
    pub fn to_json_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Set the directory to scan
    pub fn with_source_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.source_dir = dir.into();
        self
    }

    /// The key normalizer for the configured facility prefix
    pub fn key_normalizer(&self) -> KeyNormalizer {
        KeyNormalizer::new(&self.facility_prefix)
    }

    /// The hall-code policy
    pub fn hall_policy(&self) -> HallCodes {
        HallCodes::new(self.hall_codes.clone(), self.hall_match)
    }

    /// Whether a file name carries one of the candidate extensions
    pub fn has_candidate_extension(&self, file_name: &str) -> bool {
        let Some((_, ext)) = file_name.rsplit_once('.') else {
            return false;
        };
        self.extensions
            .iter()
            .any(|want| want.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}
