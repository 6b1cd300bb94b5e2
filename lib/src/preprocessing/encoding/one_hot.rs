//! One-hot encoding for categorical features.
//!
//! The encoder only learns the category vocabulary. Setting the indicators
//! happens per record in [`crate::preprocessing::features::engineer`] and the
//! schema alignment drops whatever the vocabulary does not know.

use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::schema::ColumnSpec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Categorical values of one record, keyed by field name.
pub type Categories = BTreeMap<String, String>;

/// Name of the indicator column for `field == value`.
///
/// This naming is part of the persisted schema; changing it invalidates
/// every trained artifact.
pub fn indicator_name(field: &str, value: &str) -> String {
    format!("{}_{}", field, value)
}

/// One-hot encoder for categorical features.
///
/// Learns, for every categorical field, the set of values present during
/// fitting. Each (field, value) pair becomes one output column; fields are
/// ordered by name and values sorted within a field.
#[derive(Clone, Debug, Default)]
pub struct OneHotEncoder;

impl OneHotEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Collect the category vocabulary of `data`.
    pub fn fit(&self, data: &[Categories]) -> Result<FittedOneHotEncoder, PreprocessingError> {
        if data.is_empty() {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit OneHotEncoder on empty data".to_string(),
            ));
        }

        let mut seen: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for record in data {
            for (field, value) in record {
                seen.entry(field.as_str()).or_default().insert(value.as_str());
            }
        }

        let categories_ = seen
            .into_iter()
            .map(|(field, values)| CategorySet {
                field: field.to_string(),
                values: values.into_iter().map(str::to_string).collect(),
            })
            .collect();
        Ok(FittedOneHotEncoder { categories_ })
    }
}

/// The categories learned for one field.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CategorySet {
    pub field: String,
    pub values: Vec<String>,
}

/// The learned vocabulary.
#[derive(Clone, Debug)]
pub struct FittedOneHotEncoder {
    categories_: Vec<CategorySet>,
}

impl FittedOneHotEncoder {
    /// Get the categories learned for each field.
    pub fn categories(&self) -> &[CategorySet] {
        &self.categories_
    }

    /// Total number of indicator columns.
    pub fn n_features_out(&self) -> usize {
        self.categories_.iter().map(|set| set.values.len()).sum()
    }

    /// Output columns, in encoding order.
    pub fn column_specs(&self) -> Vec<ColumnSpec> {
        self.categories_
            .iter()
            .flat_map(|set| {
                set.values
                    .iter()
                    .map(move |value| ColumnSpec::indicator(&set.field, value))
            })
            .collect()
    }
}
