use anyhow::{Context, Result};
use booking_model::SchemaPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

/// How prediction failures are reported over HTTP.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorMode {
    /// Status code per error kind, body `{ "error", "kind" }`.
    #[default]
    Typed,
    /// Always HTTP 200 with body `{ "error" }`, as the deployed frontend expects.
    Compat,
}

impl FromStr for ErrorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "typed" => Ok(ErrorMode::Typed),
            "compat" => Ok(ErrorMode::Compat),
            other => Err(format!("unknown error mode {:?} (expected typed or compat)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format {:?} (expected pretty or json)", other)),
        }
    }
}

impl LogFormat {
    /// Read `LOG_FORMAT` alone, so a bad server variable does not stop
    /// logging from starting for `train`.
    pub fn from_env() -> Result<Self> {
        parse_var("LOG_FORMAT", LogFormat::default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub port: u16,
    pub model_path: PathBuf,
    pub error_mode: ErrorMode,
    pub schema_policy: SchemaPolicy,
    pub log_format: LogFormat,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            model_path: PathBuf::from("hotel_model.bin"),
            error_mode: ErrorMode::default(),
            schema_policy: SchemaPolicy::default(),
            log_format: LogFormat::default(),
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Invalid {} value {:?}", name, raw)),
        _ => Ok(default),
    }
}

impl ServiceConfig {
    /// Read `PORT`, `MODEL_PATH`, `ERROR_MODE`, `SCHEMA_POLICY` and `LOG_FORMAT`.
    ///
    /// Unset or empty variables fall back to the defaults; a set but
    /// unparseable variable is an error.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            port: parse_var("PORT", defaults.port)?,
            model_path: env::var("MODEL_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            error_mode: parse_var("ERROR_MODE", defaults.error_mode)?,
            schema_policy: parse_var("SCHEMA_POLICY", defaults.schema_policy)?,
            log_format: parse_var("LOG_FORMAT", defaults.log_format)?,
        })
    }
}
