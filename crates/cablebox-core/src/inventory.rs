//! Inventory rows, the loaded table, and per-box interface summaries

use std::path::{Path, PathBuf};

use ahash::AHashMap;

#[cfg(feature = "serde")]
use serde::Serialize;

use crate::cell::CellValue;
use crate::key::KeyNormalizer;

/// One connector entry belonging to a circuit box
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct InventoryRow {
    box_id: String,
    hall: String,
    location: String,
    system: String,
    connector_type: String,
    connector_form: String,
    connector_count: u32,
    normalized_key: String,
}

impl InventoryRow {
    /// Create a row for a box id; the lookup key is derived immediately.
    pub fn new<S: Into<String>>(box_id: S, keys: &KeyNormalizer) -> Self {
        let box_id = box_id.into();
        let normalized_key = keys.normalize(&box_id);
        Self {
            box_id,
            hall: String::new(),
            location: String::new(),
            system: String::new(),
            connector_type: String::new(),
            connector_form: String::new(),
            connector_count: 0,
            normalized_key,
        }
    }

    /// Set the hall (already cleaned/mapped)
    pub fn with_hall<S: Into<String>>(mut self, hall: S) -> Self {
        self.hall = hall.into();
        self
    }

    /// Set the location text
    pub fn with_location<S: Into<String>>(mut self, location: S) -> Self {
        self.location = location.into();
        self
    }

    /// Set the (system, connector type, connector form) triple
    pub fn with_interface<A, B, C>(mut self, system: A, connector_type: B, connector_form: C) -> Self
    where
        A: Into<String>,
        B: Into<String>,
        C: Into<String>,
    {
        self.system = system.into();
        self.connector_type = connector_type.into();
        self.connector_form = connector_form.into();
        self
    }

    /// Set the connector count
    pub fn with_count(mut self, count: u32) -> Self {
        self.connector_count = count;
        self
    }

    pub fn box_id(&self) -> &str {
        &self.box_id
    }

    pub fn hall(&self) -> &str {
        &self.hall
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn connector_type(&self) -> &str {
        &self.connector_type
    }

    pub fn connector_form(&self) -> &str {
        &self.connector_form
    }

    pub fn connector_count(&self) -> u32 {
        self.connector_count
    }

    /// Canonical lookup key derived from the box id
    pub fn normalized_key(&self) -> &str {
        &self.normalized_key
    }
}

/// Connector total for one (system, connector type, connector form) triple
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct InterfaceSummaryRow {
    pub system: String,
    pub connector_type: String,
    pub connector_form: String,
    pub total: u64,
}

impl InterfaceSummaryRow {
    pub fn new<A, B, C>(system: A, connector_type: B, connector_form: C, total: u64) -> Self
    where
        A: Into<String>,
        B: Into<String>,
        C: Into<String>,
    {
        Self {
            system: system.into(),
            connector_type: connector_type.into(),
            connector_form: connector_form.into(),
            total,
        }
    }
}

/// Read-only snapshot of every inventory row from one spreadsheet.
///
/// Rows keep their spreadsheet order. Keys are not unique: a box with several
/// connector kinds spans several rows.
#[derive(Debug, Clone, Default)]
pub struct InventoryTable {
    source: Option<PathBuf>,
    rows: Vec<InventoryRow>,
    index: AHashMap<String, Vec<usize>>,
    skipped_rows: usize,
}

impl InventoryTable {
    /// Build a table and its key index
    pub fn new(rows: Vec<InventoryRow>) -> Self {
        let mut index: AHashMap<String, Vec<usize>> = AHashMap::new();
        for (pos, row) in rows.iter().enumerate() {
            index
                .entry(row.normalized_key.clone())
                .or_default()
                .push(pos);
        }

        Self {
            source: None,
            rows,
            index,
            skipped_rows: 0,
        }
    }

    /// Record the file this snapshot was read from
    pub fn with_source<P: Into<PathBuf>>(mut self, source: P) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Record how many source rows could not become inventory rows
    pub fn with_skipped_rows(mut self, skipped: usize) -> Self {
        self.skipped_rows = skipped;
        self
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn rows(&self) -> &[InventoryRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    /// Number of distinct normalized keys
    pub fn box_count(&self) -> usize {
        self.index.len()
    }

    /// All rows with this normalized key, in table order
    pub fn rows_for_key(&self, key: &str) -> Vec<&InventoryRow> {
        self.index
            .get(key)
            .map(|positions| positions.iter().map(|&pos| &self.rows[pos]).collect())
            .unwrap_or_default()
    }
}

/// Coerce a count cell to a non-negative integer.
///
/// Numbers truncate toward zero; text is trimmed and parsed as an integer or
/// decimal. Negative, non-finite, missing and unparseable values all become 0.
pub fn coerce_count(value: &CellValue) -> u32 {
    let number = match value {
        CellValue::Number(n) => *n,
        CellValue::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(n) => n as f64,
                Err(_) => s.parse::<f64>().unwrap_or(0.0),
            }
        }
        CellValue::Empty | CellValue::Boolean(_) => 0.0,
    };

    if !number.is_finite() || number <= 0.0 {
        0
    } else if number >= u32::MAX as f64 {
        u32::MAX
    } else {
        number.trunc() as u32
    }
}
