//! Resolving operator input to a circuit box and its connectors

use ahash::AHashMap;
use serde::Serialize;
use tracing::warn;

use crate::config::LoaderConfig;
use cablebox_core::{InterfaceSummaryRow, InventoryRow, InventoryTable, KeyNormalizer};

/// Rows sharing one normalized key, in table order
pub type MatchSet<'a> = Vec<&'a InventoryRow>;

/// Display fields of a box, taken from the first row of its match set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoxDetails {
    pub box_id: String,
    pub hall: String,
    pub location: String,
    /// Other rows disagree with the first on box id, hall or location
    pub conflicting: bool,
}

/// Everything shown for a resolved box
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoxReport {
    pub key: String,
    pub details: BoxDetails,
    pub interfaces: Vec<InterfaceSummaryRow>,
    /// Number of inventory rows behind this report
    pub rows: usize,
}

/// Result of handling one line of operator input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueryOutcome {
    /// Input was empty; nothing was looked up
    Idle,
    /// No box has this key
    NotFound { key: String },
    /// The box was found
    Found(BoxReport),
}

/// Stateless query resolution against an [`InventoryTable`].
///
/// Uses the same [`KeyNormalizer`] as the loader so queries and rows share
/// one key space.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    keys: KeyNormalizer,
}

impl Resolver {
    pub fn new(keys: KeyNormalizer) -> Self {
        Self { keys }
    }

    pub fn from_config(config: &LoaderConfig) -> Self {
        Self::new(config.key_normalizer())
    }

    /// Normalize raw input into the row key space
    pub fn normalize_query(&self, raw: &str) -> String {
        self.keys.normalize(raw)
    }

    /// All rows whose key equals `query_key`; empty means no such box.
    pub fn lookup<'t>(&self, table: &'t InventoryTable, query_key: &str) -> MatchSet<'t> {
        table.rows_for_key(query_key)
    }

    /// Full pipeline for one line of input.
    ///
    /// Input is trimmed first; empty input yields [`QueryOutcome::Idle`]
    /// without touching the table.
    pub fn query(&self, table: &InventoryTable, raw: &str) -> QueryOutcome {
        let raw = raw.trim();
        if raw.is_empty() {
            return QueryOutcome::Idle;
        }

        let key = self.normalize_query(raw);
        let matches = self.lookup(table, &key);

        match present_summary(&matches) {
            Some(details) => QueryOutcome::Found(BoxReport {
                interfaces: summarize(&matches),
                rows: matches.len(),
                key,
                details,
            }),
            None => QueryOutcome::NotFound { key },
        }
    }
}

/// Sum connector counts per (system, connector type, connector form), in
/// first-seen order.
pub fn summarize(matches: &[&InventoryRow]) -> Vec<InterfaceSummaryRow> {
    let mut groups: Vec<InterfaceSummaryRow> = Vec::new();
    let mut positions: AHashMap<(&str, &str, &str), usize> = AHashMap::new();

    for row in matches {
        let triple = (row.system(), row.connector_type(), row.connector_form());
        let count = u64::from(row.connector_count());

        match positions.get(&triple).copied() {
            Some(pos) => groups[pos].total += count,
            None => {
                positions.insert(triple, groups.len());
                groups.push(InterfaceSummaryRow::new(triple.0, triple.1, triple.2, count));
            }
        }
    }

    groups
}

/// Display fields from the first matching row.
///
/// The first row is authoritative. When later rows disagree the result is
/// flagged `conflicting` and a warning is logged.
pub fn present_summary(matches: &[&InventoryRow]) -> Option<BoxDetails> {
    let first = matches.first()?;

    let conflicting = matches.iter().skip(1).any(|row| {
        row.box_id() != first.box_id()
            || row.hall() != first.hall()
            || row.location() != first.location()
    });
    if conflicting {
        warn!(
            key = first.normalized_key(),
            rows = matches.len(),
            "rows for this box disagree on display fields, using the first"
        );
    }

    Some(BoxDetails {
        box_id: first.box_id().to_string(),
        hall: first.hall().to_string(),
        location: first.location().to_string(),
        conflicting,
    })
}
