//! Label encoding for classification targets.
//!
//! Maps text labels to class indices (0, 1, 2, ...) in sorted label order.

use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Label encoder for target labels.
///
/// # Example
/// ```ignore
/// use booking_model::preprocessing::{LabelEncoder, Transformer};
///
/// let labels = vec!["Not_Canceled".to_string(), "Canceled".to_string()];
/// let fitted = LabelEncoder::new().fit(&labels)?;
///
/// // Classes are sorted: ["Canceled", "Not_Canceled"]
/// assert_eq!(fitted.transform(&labels)?, vec![1, 0]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct LabelEncoder;

impl LabelEncoder {
    /// Create a new LabelEncoder.
    pub fn new() -> Self {
        Self
    }
}

/// Serializable parameters for a fitted LabelEncoder.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LabelEncoderParams {
    /// Unique classes in sorted order.
    pub classes_: Vec<String>,
}

/// Fitted LabelEncoder ready for inference.
#[derive(Clone, Debug)]
pub struct FittedLabelEncoder {
    classes_: Vec<String>,
    class_to_idx: HashMap<String, usize>,
}

impl FittedLabelEncoder {
    /// Get the unique classes in sorted order.
    pub fn classes(&self) -> &[String] {
        &self.classes_
    }

    pub fn n_classes(&self) -> usize {
        self.classes_.len()
    }

    /// Index of `label`, if it was seen during fit.
    pub fn index_of(&self, label: &str) -> Option<usize> {
        self.class_to_idx.get(label).copied()
    }

    /// Convert a class index back to its label.
    pub fn inverse(&self, idx: usize) -> Result<&str, PreprocessingError> {
        self.classes_
            .get(idx)
            .map(String::as_str)
            .ok_or(PreprocessingError::UnknownClassIndex {
                index: idx,
                n_classes: self.classes_.len(),
            })
    }

    fn build(classes_: Vec<String>) -> Self {
        let class_to_idx = classes_
            .iter()
            .enumerate()
            .map(|(idx, class)| (class.clone(), idx))
            .collect();
        Self {
            classes_,
            class_to_idx,
        }
    }
}

impl Transformer for LabelEncoder {
    type Input = [String];
    type Output = Vec<usize>;
    type Fitted = FittedLabelEncoder;

    fn fit(&self, labels: &Self::Input) -> Result<Self::Fitted, PreprocessingError> {
        if labels.is_empty() {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit LabelEncoder on empty data".to_string(),
            ));
        }

        let classes: BTreeSet<&str> = labels.iter().map(String::as_str).collect();
        Ok(FittedLabelEncoder::build(
            classes.into_iter().map(str::to_string).collect(),
        ))
    }
}

impl FittedTransformer for FittedLabelEncoder {
    type Input = [String];
    type Output = Vec<usize>;
    type Params = LabelEncoderParams;

    fn transform(&self, labels: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        labels
            .iter()
            .map(|label| {
                self.index_of(label)
                    .ok_or_else(|| PreprocessingError::UnknownLabel(label.clone()))
            })
            .collect()
    }

    fn extract_params(&self) -> Self::Params {
        LabelEncoderParams {
            classes_: self.classes_.clone(),
        }
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        if params.classes_.is_empty() {
            return Err(PreprocessingError::EmptyData(
                "LabelEncoder params carry no classes".to_string(),
            ));
        }
        Ok(FittedLabelEncoder::build(params.classes_))
    }

    fn n_features_out(&self) -> usize {
        1
    }
}
