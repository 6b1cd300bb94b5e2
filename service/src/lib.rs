//! HTTP prediction service for hotel booking status.
//!
//! `POST /predict` takes one raw booking as JSON and answers
//! `{ "prediction": <label> }`; `GET /health` reports the loaded model.

pub mod app;
pub mod config;
pub mod handler;
pub mod schema;

pub use app::{create_router, AppState};
pub use config::{ErrorMode, LogFormat, ServiceConfig};
