//! Source discovery, parsing and normalization into an [`InventoryTable`]

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::LoaderConfig;
use crate::error::{LoadError, MissingColumn, SheetError};
use cablebox_core::{coerce_count, HallCodes, InventoryRow, InventoryTable, KeyNormalizer, Sheet};
use cablebox_csv::{CsvReadOptions, CsvReader};
use cablebox_xlsx::XlsxReader;

/// File-name prefix of the lock files office suites leave next to an open workbook
pub const LOCK_FILE_MARKER: &str = "~$";

/// Pick the inventory file from a directory listing.
///
/// Candidates are names with a configured extension that are not lock files.
/// The first candidate containing a keyword (ASCII case ignored) wins; with no
/// keyword match the first candidate is used. Listing order decides ties, so
/// callers wanting stable results pass a sorted listing.
pub fn select_source<'a, S: AsRef<str>>(listing: &'a [S], config: &LoaderConfig) -> Option<&'a S> {
    let candidates: Vec<&S> = listing
        .iter()
        .filter(|name| {
            let name: &str = name.as_ref();
            !name.starts_with(LOCK_FILE_MARKER) && config.has_candidate_extension(name)
        })
        .collect();

    let keywords: Vec<String> = config
        .keywords
        .iter()
        .filter(|k| !k.is_empty())
        .map(|k| k.to_lowercase())
        .collect();

    candidates
        .iter()
        .find(|name| {
            let name: &str = name.as_ref();
            let name = name.to_lowercase();
            keywords.iter().any(|k| name.contains(k.as_str()))
        })
        .or_else(|| candidates.first())
        .copied()
}

/// Column positions resolved against one sheet's headers
struct ColumnMap {
    box_id: usize,
    hall: Option<usize>,
    location: Option<usize>,
    system: Option<usize>,
    connector_type: Option<usize>,
    connector_form: Option<usize>,
    connector_count: Option<usize>,
}

/// Produces [`InventoryTable`] snapshots from the configured source directory.
#[derive(Debug, Clone)]
pub struct Loader {
    config: LoaderConfig,
    keys: KeyNormalizer,
    halls: HallCodes,
}

impl Loader {
    pub fn new(config: LoaderConfig) -> Self {
        let keys = config.key_normalizer();
        let halls = config.hall_policy();
        Self {
            config,
            keys,
            halls,
        }
    }

    /// Find the inventory file in the configured source directory
    pub fn discover_source(&self) -> Result<PathBuf, LoadError> {
        self.discover_source_in(&self.config.source_dir)
    }

    /// Find the inventory file in `directory`
    pub fn discover_source_in(&self, directory: &Path) -> Result<PathBuf, LoadError> {
        let not_found = |cause| LoadError::SourceNotFound {
            directory: directory.to_path_buf(),
            cause,
        };

        let entries = fs::read_dir(directory).map_err(|e| not_found(Some(e)))?;

        let mut listing: Vec<String> = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| not_found(Some(e)))?;
            if !entry.path().is_file() {
                continue;
            }
            match entry.file_name().into_string() {
                Ok(name) => listing.push(name),
                Err(name) => debug!(?name, "skipping non UTF-8 file name"),
            }
        }
        listing.sort();

        let selected = select_source(&listing, &self.config).ok_or_else(|| not_found(None))?;
        debug!(
            directory = %directory.display(),
            candidates = listing.len(),
            selected = %selected,
            "selected inventory source"
        );
        Ok(directory.join(selected))
    }

    /// Read a spreadsheet into a sheet with trimmed headers
    pub fn parse(&self, path: &Path) -> Result<Sheet, LoadError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        let result = match extension.as_deref() {
            Some("xlsx") | Some("xlsm") => {
                XlsxReader::read_file(path, self.config.sheet.as_deref()).map_err(SheetError::from)
            }
            Some("csv") => {
                // Text only: ids like "4.10" or "1E5" must survive as written
                let options = CsvReadOptions {
                    detect_numbers: false,
                    ..CsvReadOptions::default()
                };
                CsvReader::read_file(path, &options).map_err(SheetError::from)
            }
            other => Err(SheetError::UnsupportedFormat(
                other.unwrap_or("(none)").to_string(),
            )),
        };

        result.map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Turn sheet rows into inventory rows.
    ///
    /// Hall names are cleaned and mapped to codes, box ids get their lookup
    /// key, and counts are coerced. Rows whose box id is blank or yields an
    /// empty key cannot be looked up and are skipped.
    pub fn normalize(&self, sheet: &Sheet) -> Result<InventoryTable, MissingColumn> {
        let columns = self.resolve_columns(sheet)?;

        let text = |row: usize, col: Option<usize>| -> String {
            col.map(|c| sheet.value(row, c).to_string().trim().to_string())
                .unwrap_or_default()
        };

        let mut rows = Vec::with_capacity(sheet.row_count());
        let mut skipped = 0;

        for idx in 0..sheet.row_count() {
            let box_id = text(idx, Some(columns.box_id));
            // With an empty prefix an id like "-" canonicalizes to nothing
            if box_id.is_empty() || self.keys.normalize(&box_id).is_empty() {
                skipped += 1;
                continue;
            }

            // Hall names are cleaned before trimming so embedded line breaks go too
            let hall = columns
                .hall
                .map(|c| self.halls.resolve(&sheet.value(idx, c).to_string()))
                .unwrap_or_default();
            let count = columns
                .connector_count
                .map(|c| coerce_count(sheet.value(idx, c)))
                .unwrap_or(0);

            rows.push(
                InventoryRow::new(box_id, &self.keys)
                    .with_hall(hall)
                    .with_location(text(idx, columns.location))
                    .with_interface(
                        text(idx, columns.system),
                        text(idx, columns.connector_type),
                        text(idx, columns.connector_form),
                    )
                    .with_count(count),
            );
        }

        if skipped > 0 {
            warn!(skipped, sheet = sheet.name(), "skipped rows without a usable box id");
        }

        Ok(InventoryTable::new(rows).with_skipped_rows(skipped))
    }

    /// Discover, parse and normalize in one step
    pub fn load(&self) -> Result<InventoryTable, LoadError> {
        let path = self.discover_source()?;
        self.load_from(&path)
    }

    /// Parse and normalize a known file
    pub fn load_from(&self, path: &Path) -> Result<InventoryTable, LoadError> {
        let sheet = self.parse(path)?;
        let table = self
            .normalize(&sheet)
            .map_err(|source| LoadError::SchemaMismatch {
                path: path.to_path_buf(),
                source,
            })?
            .with_source(path);

        info!(
            source = %path.display(),
            rows = table.len(),
            boxes = table.box_count(),
            "loaded inventory"
        );
        Ok(table)
    }

    fn resolve_columns(&self, sheet: &Sheet) -> Result<ColumnMap, MissingColumn> {
        let columns = &self.config.columns;
        let find = |names: &[String]| sheet.find_column(names.iter().map(String::as_str));

        let box_id = find(&columns.box_id).ok_or_else(|| MissingColumn {
            column: columns
                .box_id
                .first()
                .cloned()
                .unwrap_or_else(|| "box_id".to_string()),
            found: sheet.headers().to_vec(),
        })?;

        let map = ColumnMap {
            box_id,
            hall: find(&columns.hall),
            location: find(&columns.location),
            system: find(&columns.system),
            connector_type: find(&columns.connector_type),
            connector_form: find(&columns.connector_form),
            connector_count: find(&columns.connector_count),
        };
        if map.connector_count.is_none() {
            debug!(sheet = sheet.name(), "no count column, all counts are 0");
        }
        Ok(map)
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new(LoaderConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cablebox_core::CellValue;
    use pretty_assertions::assert_eq;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn record(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|v| CellValue::from(*v)).collect()
    }

    #[test]
    fn test_select_prefers_keyword_match() {
        let listing = names(&["budget.xlsx", "舞台音視訊迴路盒.xlsx", "Cable list.xlsx"]);
        let selected = select_source(&listing, &LoaderConfig::default());
        assert_eq!(selected.map(String::as_str), Some("舞台音視訊迴路盒.xlsx"));
    }

    #[test]
    fn test_select_keyword_ignores_ascii_case() {
        let listing = names(&["a.xlsx", "CABLE_2024.xlsx"]);
        let selected = select_source(&listing, &LoaderConfig::default());
        assert_eq!(selected.map(String::as_str), Some("CABLE_2024.xlsx"));
    }

    #[test]
    fn test_select_skips_lock_files() {
        let listing = names(&["~$Cable.xlsx", "Cable.xlsx"]);
        let selected = select_source(&listing, &LoaderConfig::default());
        assert_eq!(selected.map(String::as_str), Some("Cable.xlsx"));
    }

    #[test]
    fn test_select_falls_back_to_first_candidate() {
        let listing = names(&["notes.txt", "budget.xlsx", "zzz.xlsx"]);
        let selected = select_source(&listing, &LoaderConfig::default());
        assert_eq!(selected.map(String::as_str), Some("budget.xlsx"));
    }

    #[test]
    fn test_select_nothing_without_candidates() {
        let listing = names(&["notes.txt", "~$Cable.xlsx", "Cable.xlsx.bak"]);
        assert_eq!(select_source(&listing, &LoaderConfig::default()), None);

        let empty: Vec<String> = Vec::new();
        assert_eq!(select_source(&empty, &LoaderConfig::default()), None);
    }

    #[test]
    fn test_normalize_rows() {
        let sheet = Sheet::from_records(
            "Sheet1",
            vec![
                record(&[" 迴路盒編號", "廳別 ", "位置", "系統", "接頭種類", "接頭型式", "數量"]),
                record(&["AV 04-01", "大劇\n院", "Rack 3, Shelf B", "Video", "HDMI", "Panel", "2"]),
                record(&["04-02", "實驗劇場", "", "Audio", "XLR", "Inline", "n/a"]),
                record(&["", "大劇院", "orphan", "Audio", "XLR", "Panel", "1"]),
            ],
        );

        let table = Loader::default().normalize(&sheet).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.skipped_rows(), 1);

        let first = &table.rows()[0];
        assert_eq!(first.normalized_key(), "AV0401");
        assert_eq!(first.hall(), "GT");
        assert_eq!(first.location(), "Rack 3, Shelf B");
        assert_eq!(first.connector_count(), 2);

        let second = &table.rows()[1];
        assert_eq!(second.normalized_key(), "AV0402");
        assert_eq!(second.hall(), "實驗劇場");
        assert_eq!(second.connector_count(), 0);
    }

    #[test]
    fn test_normalize_numeric_box_ids() {
        let sheet = Sheet::from_records(
            "Sheet1",
            vec![
                record(&["Box ID", "Count"]),
                vec![CellValue::Number(401.0), CellValue::Number(3.0)],
            ],
        );

        let table = Loader::default().normalize(&sheet).unwrap();
        assert_eq!(table.rows()[0].normalized_key(), "AV401");
        assert_eq!(table.rows()[0].connector_count(), 3);
    }

    #[test]
    fn test_normalize_optional_columns_default_empty() {
        let sheet = Sheet::from_records("Sheet1", vec![record(&["box_id"]), record(&["AV0101"])]);

        let table = Loader::default().normalize(&sheet).unwrap();
        let row = &table.rows()[0];
        assert_eq!(row.hall(), "");
        assert_eq!(row.system(), "");
        assert_eq!(row.connector_count(), 0);
    }

    #[test]
    fn test_normalize_requires_box_id_column() {
        let sheet = Sheet::from_records("Sheet1", vec![record(&["廳別", "數量"])]);

        let err = Loader::default().normalize(&sheet).unwrap_err();
        assert_eq!(err.column, "迴路盒編號");
        assert_eq!(err.found, vec!["廳別", "數量"]);
    }

    #[test]
    fn test_rows_with_empty_keys_are_skipped() {
        let loader = Loader::new(LoaderConfig {
            facility_prefix: "-".to_string(),
            ..LoaderConfig::default()
        });
        let sheet = Sheet::from_records(
            "Sheet1",
            vec![record(&["Box ID"]), record(&["-"]), record(&[" - - "]), record(&["gt-1"])],
        );

        let table = loader.normalize(&sheet).unwrap();

        assert_eq!(table.skipped_rows(), 2);
        let keys: Vec<&str> = table.rows().iter().map(|r| r.normalized_key()).collect();
        assert_eq!(keys, vec!["GT1"]);
        assert!(table.rows_for_key("").is_empty());
    }

    #[test]
    fn test_parse_rejects_unknown_extension() {
        let err = Loader::default().parse(Path::new("inventory.ods")).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Parse {
                source: SheetError::UnsupportedFormat(ref ext),
                ..
            } if ext == "ods"
        ));
    }
}
