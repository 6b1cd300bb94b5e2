//! Offline training: dataset in, model artifact out.
//!
//! The [`Trainer`] runs the fixed recipe end to end:
//!
//! 1. fit the booking feature pipeline on the whole dataset and transform it;
//! 2. label-encode the targets (classes sorted);
//! 3. stratified train/validation split;
//! 4. fit the random forest on the training partition;
//! 5. score the validation partition;
//! 6. bundle schema, classes, forest and report into a [`ModelArtifact`].

use crate::artifact::{ArtifactError, ModelArtifact};
use crate::dataset::{BookingDataset, DatasetError};
use crate::metrics::ClassificationReport;
use crate::model::{ForestConfig, InferenceModel, ModelError, RandomForest};
use crate::preprocessing::{
    BookingFeatures, FittedTransformer, LabelEncoder, PreprocessingError, Transformer,
};
use std::path::Path;
use std::time::Instant;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrainError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Preprocessing(#[from] PreprocessingError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("Positive label {0:?} does not occur in the dataset")]
    UnknownPositiveLabel(String),
}

/// Fitted artifact plus partition sizes.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    pub n_train: usize,
    pub n_validation: usize,
}

impl TrainingOutcome {
    pub fn report(&self) -> &ClassificationReport {
        &self.artifact.report
    }
}

/// Runs the training recipe. Once built via [`TrainerBuilder`] it is
/// immutable and can be reused across datasets.
#[derive(Debug, Clone)]
pub struct Trainer {
    pub(crate) forest: ForestConfig,
    pub(crate) test_size: f64,
    pub(crate) positive_label: String,
}

/// Fluent builder for constructing a `Trainer` with custom hyperparameters.
///
/// Defaults:
/// - `seed`: 42 (split and forest)
/// - `n_estimators`: 300
/// - `max_depth`: 15
/// - `min_samples_split`: 5
/// - `test_size`: 0.2
/// - `positive_label`: `"Canceled"`
#[derive(Debug, Clone)]
pub struct TrainerBuilder {
    forest: ForestConfig,
    test_size: f64,
    positive_label: String,
}

impl Default for TrainerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainerBuilder {
    pub fn new() -> Self {
        Self {
            forest: ForestConfig::default(),
            test_size: 0.2,
            positive_label: "Canceled".to_string(),
        }
    }

    /// Seed for both the validation split and the forest.
    pub fn seed(mut self, seed: u64) -> Self {
        self.forest.seed = seed;
        self
    }

    pub fn n_estimators(mut self, n: usize) -> Self {
        self.forest.n_estimators = n;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.forest.max_depth = depth;
        self
    }

    pub fn min_samples_split(mut self, n: usize) -> Self {
        self.forest.min_samples_split = n;
        self
    }

    /// Fraction of rows held out for validation, in `(0, 1)`.
    pub fn test_size(mut self, fraction: f64) -> Self {
        self.test_size = fraction;
        self
    }

    pub fn positive_label(mut self, label: impl Into<String>) -> Self {
        self.positive_label = label.into();
        self
    }

    pub fn build(self) -> Trainer {
        Trainer {
            forest: self.forest,
            test_size: self.test_size,
            positive_label: self.positive_label,
        }
    }
}

impl Trainer {
    /// Convenience constructor that starts the builder pattern.
    pub fn builder() -> TrainerBuilder {
        TrainerBuilder::new()
    }

    pub fn forest_config(&self) -> &ForestConfig {
        &self.forest
    }

    /// Train on an in-memory dataset.
    pub fn fit(&self, dataset: &BookingDataset) -> Result<TrainingOutcome, TrainError> {
        let started = Instant::now();

        let features = BookingFeatures::new().fit(dataset.records())?;
        let frame = features.transform(dataset.records())?;
        tracing::info!(
            rows = frame.n_rows(),
            features = frame.n_cols(),
            "engineered training features"
        );

        let labels = LabelEncoder::new().fit(dataset.labels())?;
        let y = labels.transform(dataset.labels())?;
        let positive = labels
            .index_of(&self.positive_label)
            .ok_or_else(|| TrainError::UnknownPositiveLabel(self.positive_label.clone()))?;

        let (train_idx, test_idx) =
            dataset.stratified_split_indices(self.test_size, self.forest.seed)?;
        let x_train = frame.select_rows(&train_idx);
        let x_test = frame.select_rows(&test_idx);
        let y_train: Vec<usize> = train_idx.iter().map(|&i| y[i]).collect();
        let y_test: Vec<usize> = test_idx.iter().map(|&i| y[i]).collect();

        let forest = RandomForest::new(self.forest.clone()).fit(
            x_train.view(),
            &y_train,
            labels.n_classes(),
        )?;
        tracing::info!(
            trees = forest.n_trees(),
            train_rows = y_train.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "fitted random forest"
        );

        let y_pred = forest.predict_view(x_test.view())?;
        let report = ClassificationReport::new(&y_test, &y_pred, labels.classes(), positive);
        tracing::info!(
            accuracy = report.accuracy,
            precision = report.precision,
            recall = report.recall,
            positive = %report.positive_label,
            validation_rows = y_test.len(),
            "validation scores"
        );

        Ok(TrainingOutcome {
            artifact: ModelArtifact {
                schema: features.extract_params(),
                labels: labels.extract_params(),
                forest: forest.extract_params(),
                report,
            },
            n_train: y_train.len(),
            n_validation: y_test.len(),
        })
    }

    /// Load a CSV, train, and write the artifact to `output`.
    ///
    /// Nothing is written unless training succeeds.
    pub fn fit_csv(
        &self,
        data: &Path,
        output: &Path,
        label_column: &str,
        id_column: Option<&str>,
    ) -> Result<TrainingOutcome, TrainError> {
        let dataset = BookingDataset::from_csv(data, label_column, id_column)?;
        let outcome = self.fit(&dataset)?;
        outcome.artifact.save(output)?;
        Ok(outcome)
    }
}
