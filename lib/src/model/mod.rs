//! Classification models with compile-time state tracking.
//!
//! A model is either `Unfitted` (carries hyperparameters, can be trained) or
//! `Fitted` (carries learned parameters, can predict and be serialized). The
//! state is a type parameter, so calling `predict` on an untrained model does
//! not compile.

use crate::serialization::SerializableParams;
use thiserror::Error;

pub mod forest;
pub mod tree;

pub use forest::{ForestConfig, ForestParams, MaxFeatures, RandomForest, RandomForestClassifier};
pub use tree::{DecisionTree, Node, TreeConfig};

/// Marker: the model has not been trained yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unfitted;

/// Marker: the model holds learned parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fitted;

/// Errors raised while fitting or invoking a model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Cannot fit a model on an empty training set")]
    EmptyTrainingSet,
    #[error("Got {n_rows} rows but {n_labels} labels")]
    LabelMismatch { n_rows: usize, n_labels: usize },
    #[error("Class index {label} out of range for {n_classes} classes")]
    InvalidLabel { label: usize, n_classes: usize },
    #[error("Invalid model configuration: {0}")]
    InvalidConfig(String),
    #[error("Feature mismatch: expected {expected} features, got {got}")]
    FeatureMismatch { expected: usize, got: usize },
    #[error("Corrupt model parameters: {0}")]
    CorruptParams(String),
}

/// Inference interface of a fitted model.
///
/// Fitted models are free of training state: everything they need to predict
/// is in [`InferenceModel::ParamsRepr`], which round-trips through
/// [`InferenceModel::extract_params`] and [`InferenceModel::from_params`].
pub trait InferenceModel {
    type InputSingle: ?Sized;
    type InputBatch: ?Sized;
    type OutputSingle;
    type OutputBatch;
    type ParamsRepr: SerializableParams;

    /// Predict on a single sample (feature vector).
    fn predict(&self, input: &Self::InputSingle) -> Result<Self::OutputSingle, ModelError>;

    fn predict_batch(&self, input: &Self::InputBatch) -> Result<Self::OutputBatch, ModelError>;

    fn extract_params(&self) -> Self::ParamsRepr;

    fn from_params(params: Self::ParamsRepr) -> Result<Self, ModelError>
    where
        Self: Sized;
}
