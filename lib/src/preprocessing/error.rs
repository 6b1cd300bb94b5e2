//! Error types for preprocessing operations.

use thiserror::Error;

/// Error type for preprocessing operations.
///
/// Every variant that concerns a single input field names that field, so the
/// caller can tell which part of a record was rejected.
#[derive(Debug, Error)]
pub enum PreprocessingError {
    /// A field required by the feature recipe is absent.
    #[error("Missing field: {0}")]
    MissingField(String),
    /// A field holds a value of the wrong kind (e.g. text where a number is required).
    #[error("Invalid type for field {field}: expected {expected}")]
    InvalidType {
        field: String,
        expected: &'static str,
    },
    /// A field holds a value of the right kind but outside the accepted range.
    #[error("Invalid value for field {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    /// The input could not be interpreted as a flat record at all.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),
    /// Empty data provided where non-empty was required.
    #[error("Empty data: {0}")]
    EmptyData(String),
    /// Target label never seen during fit.
    #[error("Unknown label: {0}")]
    UnknownLabel(String),
    /// Class index outside the fitted label set.
    #[error("Unknown class index {index}: only {n_classes} classes")]
    UnknownClassIndex { index: usize, n_classes: usize },
    /// A persisted schema was produced by another version of the feature recipe.
    #[error("Schema version mismatch: expected {expected}, found {found}")]
    SchemaVersion { expected: u32, found: u32 },
    /// Error raised while engineering one record of a batch.
    #[error("Record {index}: {source}")]
    Record {
        index: usize,
        #[source]
        source: Box<PreprocessingError>,
    },
    /// Feature dimension mismatch.
    #[error("Feature mismatch: expected {expected_features} features, got {got_features}")]
    FeatureMismatch {
        expected_features: usize,
        got_features: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_missing_field() {
        let err = PreprocessingError::MissingField("lead_time".to_string());
        assert_eq!(err.to_string(), "Missing field: lead_time");
    }

    #[test]
    fn test_error_display_invalid_type() {
        let err = PreprocessingError::InvalidType {
            field: "lead_time".to_string(),
            expected: "number",
        };
        assert!(err.to_string().contains("lead_time"));
        assert!(err.to_string().contains("expected number"));
    }

    #[test]
    fn test_error_display_invalid_value() {
        let err = PreprocessingError::InvalidValue {
            field: "avg_price_per_room".to_string(),
            reason: "must be non-negative, got -3".to_string(),
        };
        assert!(err.to_string().contains("avg_price_per_room"));
    }

    #[test]
    fn test_error_display_unknown_class_index() {
        let err = PreprocessingError::UnknownClassIndex {
            index: 4,
            n_classes: 2,
        };
        assert_eq!(err.to_string(), "Unknown class index 4: only 2 classes");
    }

    #[test]
    fn test_error_display_feature_mismatch() {
        let err = PreprocessingError::FeatureMismatch {
            expected_features: 5,
            got_features: 3,
        };
        assert!(err.to_string().contains("Feature mismatch"));
    }

    #[test]
    fn test_error_display_record_wraps_source() {
        let err = PreprocessingError::Record {
            index: 7,
            source: Box::new(PreprocessingError::MissingField("lead_time".to_string())),
        };
        assert_eq!(err.to_string(), "Record 7: Missing field: lead_time");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_error_is_std_error() {
        let err = PreprocessingError::EmptyData("test".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
