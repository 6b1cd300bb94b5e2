//! Expected feature schema and column alignment.
//!
//! The schema is the ordered list of engineered columns a model was fitted on.
//! It is persisted next to the model and is the only thing inference relies on
//! to reproduce the training layout: an engineered row is *aligned* to it by
//! name, columns the schema does not know are dropped and schema columns the
//! row does not carry are filled with `0.0`.

use crate::preprocessing::encoding::indicator_name;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Version of the feature recipe that produced a schema.
///
/// Bump whenever [`crate::preprocessing::features::engineer`] changes the
/// meaning or naming of any column.
pub const FEATURE_RECIPE_VERSION: u32 = 1;

/// What a column represents.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    /// A numeric value carried (possibly transformed) from the raw record.
    Numeric,
    /// A one-hot indicator for `field == value`.
    Indicator { field: String, value: String },
}

/// A named engineered column.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnSpec {
    pub fn numeric(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ColumnKind::Numeric,
        }
    }

    pub fn indicator(field: &str, value: &str) -> Self {
        Self {
            name: indicator_name(field, value),
            kind: ColumnKind::Indicator {
                field: field.to_string(),
                value: value.to_string(),
            },
        }
    }

    pub fn is_indicator(&self) -> bool {
        matches!(self.kind, ColumnKind::Indicator { .. })
    }
}

/// One engineered record: named columns in a deterministic order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EngineeredRow {
    entries: Vec<(ColumnSpec, f64)>,
}

impl EngineeredRow {
    pub fn new(entries: Vec<(ColumnSpec, f64)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(spec, _)| spec.name == name)
            .map(|(_, v)| *v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.entries.iter().map(|(spec, _)| spec.name.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(ColumnSpec, f64)> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The ordered column list a model was trained on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub version: u32,
    pub columns: Vec<ColumnSpec>,
}

impl FeatureSchema {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self {
            version: FEATURE_RECIPE_VERSION,
            columns,
        }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Category values seen for `field` during fit, in schema order.
    pub fn categories(&self, field: &str) -> Vec<&str> {
        self.columns
            .iter()
            .filter_map(|c| match &c.kind {
                ColumnKind::Indicator { field: f, value } if f == field => Some(value.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Reindex `row` against the schema.
    ///
    /// The result always has exactly `self.len()` values in schema order.
    pub fn align(&self, row: &EngineeredRow) -> AlignedRow {
        let by_name: HashMap<&str, f64> = row
            .iter()
            .map(|(spec, v)| (spec.name.as_str(), *v))
            .collect();

        let mut values = Vec::with_capacity(self.columns.len());
        let mut filled = Vec::new();
        for column in &self.columns {
            match by_name.get(column.name.as_str()) {
                Some(v) => values.push(*v),
                None => {
                    values.push(0.0);
                    filled.push(column.clone());
                }
            }
        }

        let dropped = row
            .iter()
            .filter(|(spec, _)| self.position(&spec.name).is_none())
            .map(|(spec, _)| spec.clone())
            .collect();

        AlignedRow {
            values,
            dropped,
            filled,
        }
    }
}

/// A row reindexed against a [`FeatureSchema`], plus what the reindexing did.
#[derive(Clone, Debug, PartialEq)]
pub struct AlignedRow {
    /// One value per schema column, in schema order.
    pub values: Vec<f64>,
    /// Columns produced by the row that the schema does not know.
    pub dropped: Vec<ColumnSpec>,
    /// Schema columns absent from the row, filled with `0.0`.
    pub filled: Vec<ColumnSpec>,
}

impl AlignedRow {
    /// Turn the aligned values back into a named row.
    pub fn to_row(&self, schema: &FeatureSchema) -> EngineeredRow {
        EngineeredRow::new(
            schema
                .columns
                .iter()
                .cloned()
                .zip(self.values.iter().copied())
                .collect(),
        )
    }

    /// Summarise the schema drift this alignment papered over.
    ///
    /// Zero-filled indicator columns are expected (a single record only ever
    /// activates one category per field) and are not reported.
    pub fn drift(&self) -> SchemaDrift {
        let mut drift = SchemaDrift::default();
        for spec in &self.dropped {
            match &spec.kind {
                ColumnKind::Indicator { field, value } => drift
                    .unseen_categories
                    .push((field.clone(), value.clone())),
                ColumnKind::Numeric => drift.unknown_columns.push(spec.name.clone()),
            }
        }
        drift.missing_columns = self
            .filled
            .iter()
            .filter(|spec| !spec.is_indicator())
            .map(|spec| spec.name.clone())
            .collect();
        drift
    }
}

/// Differences between an engineered row and the trained schema.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SchemaDrift {
    /// `(field, value)` pairs whose indicator column the model never saw.
    pub unseen_categories: Vec<(String, String)>,
    /// Numeric columns the model never saw.
    pub unknown_columns: Vec<String>,
    /// Numeric schema columns the record did not provide (zero-filled).
    pub missing_columns: Vec<String>,
}

impl SchemaDrift {
    pub fn is_empty(&self) -> bool {
        self.unseen_categories.is_empty()
            && self.unknown_columns.is_empty()
            && self.missing_columns.is_empty()
    }
}

impl std::fmt::Display for SchemaDrift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if !self.unseen_categories.is_empty() {
            let cats: Vec<String> = self
                .unseen_categories
                .iter()
                .map(|(field, value)| format!("{field}={value}"))
                .collect();
            parts.push(format!("unseen categories [{}]", cats.join(", ")));
        }
        if !self.unknown_columns.is_empty() {
            parts.push(format!("unknown columns [{}]", self.unknown_columns.join(", ")));
        }
        if !self.missing_columns.is_empty() {
            parts.push(format!("missing columns [{}]", self.missing_columns.join(", ")));
        }
        if parts.is_empty() {
            f.write_str("no drift")
        } else {
            f.write_str(&parts.join("; "))
        }
    }
}
