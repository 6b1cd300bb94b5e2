//! Online inference for single booking records.
//!
//! A [`Predictor`] is built once from a [`ModelArtifact`] and is immutable
//! afterwards, so one instance can be shared by every request thread.
//! Each call engineers the record with the same recipe the trainer used,
//! aligns it to the trained schema and asks the forest for a label.

use crate::artifact::{ArtifactError, ModelArtifact};
use crate::metrics::ClassificationReport;
use crate::model::{Fitted, InferenceModel, ModelError, RandomForestClassifier};
use crate::preprocessing::{
    FeatureSchema, FittedBookingFeatures, FittedLabelEncoder, FittedTransformer,
    PreprocessingError, SchemaDrift,
};
use crate::record::RawRecord;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// What to do when a record does not line up with the trained schema.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaPolicy {
    /// Align best-effort (unknown columns dropped, missing ones zero) and log a warning.
    #[default]
    Lenient,
    /// Reject the record with [`PredictError::SchemaMismatch`].
    Strict,
}

impl FromStr for SchemaPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(SchemaPolicy::Lenient),
            "strict" => Ok(SchemaPolicy::Strict),
            other => Err(format!(
                "unknown schema policy {:?} (expected lenient or strict)",
                other
            )),
        }
    }
}

/// Coarse classification of a prediction failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    SchemaMismatch,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::SchemaMismatch => "schema_mismatch",
            ErrorKind::Internal => "internal",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
pub enum PredictError {
    /// The record is malformed or incomplete.
    #[error(transparent)]
    Validation(#[from] PreprocessingError),
    /// The record does not match the trained schema (strict policy only).
    #[error("Record does not match the trained schema: {0}")]
    SchemaMismatch(SchemaDrift),
    /// The model itself failed.
    #[error("Model invocation failed: {0}")]
    Internal(#[from] ModelError),
}

impl PredictError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PredictError::Validation(_) => ErrorKind::Validation,
            PredictError::SchemaMismatch(_) => ErrorKind::SchemaMismatch,
            PredictError::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Errors raised while turning an artifact into a predictor.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error("Invalid feature schema: {0}")]
    Schema(#[from] PreprocessingError),
    #[error("Invalid forest: {0}")]
    Model(#[from] ModelError),
    #[error("Inconsistent artifact: {0}")]
    Inconsistent(String),
}

/// A predicted label plus the schema drift that was tolerated to produce it.
#[derive(Clone, Debug, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub drift: SchemaDrift,
}

pub struct Predictor {
    features: FittedBookingFeatures,
    labels: FittedLabelEncoder,
    forest: RandomForestClassifier<Fitted>,
    report: ClassificationReport,
    policy: SchemaPolicy,
}

impl Predictor {
    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self, LoadError> {
        let features = FittedBookingFeatures::from_params(artifact.schema)?;
        let labels = FittedLabelEncoder::from_params(artifact.labels)?;
        let forest = RandomForestClassifier::<Fitted>::from_params(artifact.forest)?;

        if forest.n_features() != features.n_features_out() {
            return Err(LoadError::Inconsistent(format!(
                "forest expects {} features but the schema has {}",
                forest.n_features(),
                features.n_features_out()
            )));
        }
        if forest.n_classes() != labels.n_classes() {
            return Err(LoadError::Inconsistent(format!(
                "forest predicts {} classes but {} labels are stored",
                forest.n_classes(),
                labels.n_classes()
            )));
        }

        Ok(Self {
            features,
            labels,
            forest,
            report: artifact.report,
            policy: SchemaPolicy::default(),
        })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        Self::from_artifact(ModelArtifact::load(path)?)
    }

    pub fn with_policy(mut self, policy: SchemaPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> SchemaPolicy {
        self.policy
    }

    pub fn schema(&self) -> &FeatureSchema {
        self.features.schema()
    }

    pub fn classes(&self) -> &[String] {
        self.labels.classes()
    }

    /// Validation scores recorded when the model was trained.
    pub fn report(&self) -> &ClassificationReport {
        &self.report
    }

    pub fn predict(&self, record: &RawRecord) -> Result<Prediction, PredictError> {
        let aligned = self.features.transform_one(record)?;
        let drift = aligned.drift();
        if !drift.is_empty() {
            match self.policy {
                SchemaPolicy::Strict => return Err(PredictError::SchemaMismatch(drift)),
                SchemaPolicy::Lenient => {
                    tracing::warn!(%drift, "record does not match the trained schema, aligned best-effort")
                }
            }
        }

        let idx = self.forest.predict(&aligned.values)?;
        let label = self
            .labels
            .inverse(idx)
            .map_err(|e| ModelError::CorruptParams(e.to_string()))?;
        Ok(Prediction {
            label: label.to_string(),
            drift,
        })
    }

    /// Predict from a JSON object as received over HTTP.
    pub fn predict_json(&self, value: &serde_json::Value) -> Result<Prediction, PredictError> {
        let record = RawRecord::from_json(value)?;
        self.predict(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::BookingDataset;
    use crate::record::*;
    use crate::trainer::Trainer;
    use serde_json::json;

    fn record(i: usize, canceled: bool) -> RawRecord {
        RawRecord::new()
            .with(NO_OF_ADULTS, 2.0)
            .with(NO_OF_CHILDREN, (i % 2) as f64)
            .with(NO_OF_WEEK_NIGHTS, (i % 3) as f64)
            .with(NO_OF_WEEKEND_NIGHTS, 1.0)
            .with(LEAD_TIME, if canceled { 180.0 + i as f64 } else { (i % 15) as f64 })
            .with(AVG_PRICE_PER_ROOM, 100.0)
            .with(ROOM_TYPE_RESERVED, "Room_Type 1")
            .with(TYPE_OF_MEAL_PLAN, if i % 2 == 0 { "Meal Plan 1" } else { "Not Selected" })
            .with(MARKET_SEGMENT_TYPE, "Online")
            .with(REPEATED_GUEST, 0.0)
            .with(NO_OF_SPECIAL_REQUESTS, if canceled { 0.0 } else { 1.0 })
    }

    fn predictor() -> Predictor {
        let mut records = Vec::new();
        let mut labels = Vec::new();
        for i in 0..80 {
            let canceled = i % 2 == 0;
            records.push(record(i, canceled));
            labels.push(if canceled { "Canceled" } else { "Not_Canceled" }.to_string());
        }
        let outcome = Trainer::builder()
            .n_estimators(10)
            .build()
            .fit(&BookingDataset::new(records, labels))
            .unwrap();
        Predictor::from_artifact(outcome.artifact).unwrap()
    }

    fn request() -> serde_json::Value {
        json!({
            "no_of_adults": 2,
            "no_of_children": 0,
            "total_nights": 3,
            "lead_time": 250,
            "avg_price_per_room": 100.0,
            "room_type_reserved": "Room_Type 1",
            "type_of_meal_plan": "Meal Plan 1",
            "market_segment_type": "Online",
            "repeated_guest": 0,
            "no_of_special_requests": 0
        })
    }

    #[test]
    fn test_predict_json() {
        let prediction = predictor().predict_json(&request()).unwrap();
        assert_eq!(prediction.label, "Canceled");
        assert!(prediction.drift.is_empty());
    }

    #[test]
    fn test_missing_field_is_validation_error() {
        let mut body = request();
        body.as_object_mut().unwrap().remove("lead_time");
        let err = predictor().predict_json(&body).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert!(err.to_string().contains("lead_time"));
    }

    #[test]
    fn test_unseen_category_is_ignored() {
        let p = predictor();
        let seen = p.predict_json(&request()).unwrap();

        let mut body = request();
        body["market_segment_type"] = json!("Aviation");
        let unseen = p.predict_json(&body).unwrap();

        assert_eq!(
            unseen.drift.unseen_categories,
            vec![(MARKET_SEGMENT_TYPE.to_string(), "Aviation".to_string())]
        );
        let mut other = request();
        other["market_segment_type"] = json!("Complementary");
        assert_eq!(p.predict_json(&other).unwrap().label, unseen.label);
        assert!(!seen.label.is_empty());
    }

    #[test]
    fn test_strict_policy_rejects_drift() {
        let p = predictor().with_policy(SchemaPolicy::Strict);
        let mut body = request();
        body["room_type_reserved"] = json!("Room_Type 7");
        let err = p.predict_json(&body).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
        assert!(err.to_string().contains("room_type_reserved=Room_Type 7"));

        assert!(p.predict_json(&request()).is_ok());
    }

    #[test]
    fn test_inconsistent_artifact_rejected() {
        let mut records = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            records.push(record(i, i % 2 == 0));
            labels.push(if i % 2 == 0 { "Canceled" } else { "Not_Canceled" }.to_string());
        }
        let mut artifact = Trainer::builder()
            .n_estimators(2)
            .build()
            .fit(&BookingDataset::new(records, labels))
            .unwrap()
            .artifact;
        artifact.schema.columns.pop();
        assert!(matches!(
            Predictor::from_artifact(artifact),
            Err(LoadError::Inconsistent(_))
        ));
    }

    #[test]
    fn test_schema_policy_from_str() {
        assert_eq!("STRICT".parse::<SchemaPolicy>().unwrap(), SchemaPolicy::Strict);
        assert_eq!("lenient".parse::<SchemaPolicy>().unwrap(), SchemaPolicy::Lenient);
        assert!("loose".parse::<SchemaPolicy>().is_err());
    }

    #[test]
    fn test_error_kind_names() {
        assert_eq!(ErrorKind::Validation.as_str(), "validation");
        assert_eq!(ErrorKind::SchemaMismatch.to_string(), "schema_mismatch");
        assert_eq!(ErrorKind::Internal.as_str(), "internal");
    }
}
