use ::serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct PredictionResponse {
    pub prediction: String,
}

/// Error body in typed mode.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

/// Error body in compat mode: the message only.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CompatErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HealthResponse {
    pub status: String,
    pub schema_version: u32,
    pub n_features: usize,
    pub classes: Vec<String>,
}
