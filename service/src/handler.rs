use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::{
    extract::{Json, State},
    response::{IntoResponse, Response},
};
use booking_model::ErrorKind;
use serde_json::Value;

use crate::app::AppState;
use crate::config::ErrorMode;
use crate::schema::{CompatErrorResponse, ErrorResponse, HealthResponse, PredictionResponse};

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::SchemaMismatch => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Render a failure in the configured envelope.
pub fn error_response(mode: ErrorMode, kind: ErrorKind, message: String) -> Response {
    match mode {
        ErrorMode::Typed => (
            status_for(kind),
            Json(ErrorResponse {
                error: message,
                kind: kind.as_str().to_string(),
            }),
        )
            .into_response(),
        ErrorMode::Compat => (StatusCode::OK, Json(CompatErrorResponse { error: message })).into_response(),
    }
}

pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => {
            tracing::warn!(error = %rejection.body_text(), "rejected prediction request body");
            return error_response(state.error_mode, ErrorKind::Validation, rejection.body_text());
        }
    };

    match state.predictor.predict_json(&body) {
        Ok(prediction) => (
            StatusCode::OK,
            Json(PredictionResponse {
                prediction: prediction.label,
            }),
        )
            .into_response(),
        Err(e) => {
            match e.kind() {
                ErrorKind::Internal => tracing::error!(error = %e, "prediction failed"),
                kind => tracing::warn!(error = %e, kind = %kind, "prediction rejected"),
            }
            error_response(state.error_mode, e.kind(), e.to_string())
        }
    }
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let schema = state.predictor.schema();
    Json(HealthResponse {
        status: "ok".to_string(),
        schema_version: schema.version,
        n_features: schema.len(),
        classes: state.predictor.classes().to_vec(),
    })
}
