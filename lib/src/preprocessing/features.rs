//! The booking feature recipe shared by training and inference.
//!
//! [`engineer`] turns one [`RawRecord`] into an [`EngineeredRow`]:
//!
//! - `total_nights = no_of_week_nights + no_of_weekend_nights`, the two source
//!   fields are removed (a record that already carries `total_nights` keeps it);
//! - `lead_time` and `avg_price_per_room` become `ln(1 + x)`;
//! - `repeated_guest` is coerced to `0.0`/`1.0`;
//! - every categorical field expands to a `<field>_<value>` indicator set to `1.0`.
//!
//! The function is stateless: it looks at one record only. A single record can
//! only ever produce the indicators for its own categories, so inference must
//! align the result against the training schema ([`FittedBookingFeatures`]).

use crate::preprocessing::encoding::{Categories, OneHotEncoder};
use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::frame::FeatureFrame;
use crate::preprocessing::schema::{
    AlignedRow, ColumnKind, ColumnSpec, EngineeredRow, FeatureSchema, FEATURE_RECIPE_VERSION,
};
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use crate::record::*;
use std::collections::BTreeSet;

/// Fields expanded into indicator columns regardless of their value type.
pub const CATEGORICAL_FIELDS: [&str; 3] = [ROOM_TYPE_RESERVED, TYPE_OF_MEAL_PLAN, MARKET_SEGMENT_TYPE];

/// Fields replaced by `ln(1 + x)`.
pub const LOG_SCALED_FIELDS: [&str; 2] = [LEAD_TIME, AVG_PRICE_PER_ROOM];

/// Numeric fields every record must carry (the night counts are checked separately).
pub const REQUIRED_NUMERIC_FIELDS: [&str; 6] = [
    NO_OF_ADULTS,
    NO_OF_CHILDREN,
    LEAD_TIME,
    AVG_PRICE_PER_ROOM,
    REPEATED_GUEST,
    NO_OF_SPECIAL_REQUESTS,
];

fn is_known_numeric(name: &str) -> bool {
    REQUIRED_NUMERIC_FIELDS.contains(&name)
        || name == TOTAL_NIGHTS
        || name == NO_OF_WEEK_NIGHTS
        || name == NO_OF_WEEKEND_NIGHTS
}

/// Read a known numeric field: finite and non-negative.
///
/// Numeric text (`"5"`) is accepted, so form posts that stringify numbers work.
fn count_value(name: &str, value: &FieldValue) -> Result<f64, PreprocessingError> {
    let x = match value {
        FieldValue::Number(x) => *x,
        FieldValue::Text(s) => s.trim().parse::<f64>().map_err(|_| PreprocessingError::InvalidType {
            field: name.to_string(),
            expected: "number",
        })?,
    };
    if !x.is_finite() {
        return Err(PreprocessingError::InvalidValue {
            field: name.to_string(),
            reason: format!("must be finite, got {}", x),
        });
    }
    if x < 0.0 {
        return Err(PreprocessingError::InvalidValue {
            field: name.to_string(),
            reason: format!("must be non-negative, got {}", x),
        });
    }
    Ok(x)
}

fn required<'a>(record: &'a RawRecord, name: &str) -> Result<&'a FieldValue, PreprocessingError> {
    record
        .get(name)
        .ok_or_else(|| PreprocessingError::MissingField(name.to_string()))
}

/// Coerce the repeat-guest flag: `0/1`, `true/false`, `yes/no`.
fn flag_value(name: &str, value: &FieldValue) -> Result<f64, PreprocessingError> {
    let parsed = match value {
        FieldValue::Number(x) if *x == 0.0 || *x == 1.0 => Some(*x),
        FieldValue::Number(_) => None,
        FieldValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "y" => Some(1.0),
            "0" | "false" | "no" | "n" => Some(0.0),
            _ => None,
        },
    };
    parsed.ok_or_else(|| PreprocessingError::InvalidValue {
        field: name.to_string(),
        reason: format!("expected 0/1, true/false or yes/no, got {}", value),
    })
}

/// Render a categorical value as its indicator suffix.
///
/// Numbers and numeric text share one rendering (`1`, `1.0` and `"1.0"` all
/// give `1`), so a CSV cell and a JSON string name the same column.
fn category_label(value: &FieldValue) -> String {
    match value {
        FieldValue::Number(x) => x.to_string(),
        FieldValue::Text(s) => match s.trim().parse::<f64>() {
            Ok(x) if x.is_finite() => x.to_string(),
            _ => s.clone(),
        },
    }
}

/// Resolve `total_nights`, consuming the per-week night counts when present.
fn total_nights(record: &RawRecord) -> Result<f64, PreprocessingError> {
    let week = record.get(NO_OF_WEEK_NIGHTS);
    let weekend = record.get(NO_OF_WEEKEND_NIGHTS);
    match (week, weekend) {
        (Some(week), Some(weekend)) => Ok(count_value(NO_OF_WEEK_NIGHTS, week)?
            + count_value(NO_OF_WEEKEND_NIGHTS, weekend)?),
        (Some(_), None) => Err(PreprocessingError::MissingField(NO_OF_WEEKEND_NIGHTS.to_string())),
        (None, Some(_)) => Err(PreprocessingError::MissingField(NO_OF_WEEK_NIGHTS.to_string())),
        (None, None) => count_value(TOTAL_NIGHTS, required(record, TOTAL_NIGHTS)?),
    }
}

/// Engineer one raw record.
///
/// Columns come out in a fixed order: numeric columns sorted by name, then
/// indicator columns sorted by field and value. The order does not depend on
/// the order of fields in the input.
pub fn engineer(record: &RawRecord) -> Result<EngineeredRow, PreprocessingError> {
    let nights = total_nights(record)?;
    for name in REQUIRED_NUMERIC_FIELDS.iter().chain(CATEGORICAL_FIELDS.iter()) {
        required(record, name)?;
    }

    let mut numeric: Vec<(ColumnSpec, f64)> = vec![(ColumnSpec::numeric(TOTAL_NIGHTS), nights)];
    let mut indicators: Vec<(String, String)> = Vec::new();

    for (name, value) in record.iter() {
        if name == TOTAL_NIGHTS || name == NO_OF_WEEK_NIGHTS || name == NO_OF_WEEKEND_NIGHTS {
            continue;
        }
        if CATEGORICAL_FIELDS.contains(&name) {
            indicators.push((name.to_string(), category_label(value)));
            continue;
        }
        let x = if name == REPEATED_GUEST {
            flag_value(name, value)?
        } else if is_known_numeric(name) {
            count_value(name, value)?
        } else {
            match value {
                FieldValue::Number(x) if x.is_finite() => *x,
                FieldValue::Number(x) => {
                    return Err(PreprocessingError::InvalidValue {
                        field: name.to_string(),
                        reason: format!("must be finite, got {}", x),
                    })
                }
                FieldValue::Text(s) => match s.trim().parse::<f64>() {
                    Ok(x) if x.is_finite() => x,
                    // Any other text field is categorical too.
                    _ => {
                        indicators.push((name.to_string(), s.clone()));
                        continue;
                    }
                },
            }
        };
        let x = if LOG_SCALED_FIELDS.contains(&name) {
            x.ln_1p()
        } else {
            x
        };
        numeric.push((ColumnSpec::numeric(name), x));
    }

    numeric.sort_by(|(a, _), (b, _)| a.name.cmp(&b.name));
    indicators.sort();

    let mut entries = numeric;
    entries.extend(
        indicators
            .into_iter()
            .map(|(field, value)| (ColumnSpec::indicator(&field, &value), 1.0)),
    );
    Ok(EngineeredRow::new(entries))
}

/// Engineer every record of a batch; errors carry the record index.
pub fn engineer_batch(records: &[RawRecord]) -> Result<Vec<EngineeredRow>, PreprocessingError> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            engineer(record).map_err(|e| PreprocessingError::Record {
                index,
                source: Box::new(e),
            })
        })
        .collect()
}

fn categories_of(row: &EngineeredRow) -> Categories {
    row.iter()
        .filter_map(|(spec, _)| match &spec.kind {
            ColumnKind::Indicator { field, value } => Some((field.clone(), value.clone())),
            ColumnKind::Numeric => None,
        })
        .collect()
}

/// Unfitted booking feature pipeline.
///
/// Fitting engineers the whole batch and records the union of the columns it
/// produced as the [`FeatureSchema`]; that is the only learned state.
#[derive(Clone, Debug, Default)]
pub struct BookingFeatures;

impl BookingFeatures {
    pub fn new() -> Self {
        Self
    }
}

/// Booking feature pipeline bound to a trained schema.
#[derive(Clone, Debug)]
pub struct FittedBookingFeatures {
    schema: FeatureSchema,
}

impl FittedBookingFeatures {
    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    /// Engineer and align a single record, keeping the alignment report.
    pub fn transform_one(&self, record: &RawRecord) -> Result<AlignedRow, PreprocessingError> {
        let row = engineer(record)?;
        Ok(self.schema.align(&row))
    }
}

impl Transformer for BookingFeatures {
    type Input = [RawRecord];
    type Output = FeatureFrame;
    type Fitted = FittedBookingFeatures;

    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PreprocessingError> {
        if data.is_empty() {
            return Err(PreprocessingError::EmptyData(
                "Cannot fit BookingFeatures on empty data".to_string(),
            ));
        }

        let rows = engineer_batch(data)?;

        let numeric: BTreeSet<&str> = rows
            .iter()
            .flat_map(|row| row.iter())
            .filter(|(spec, _)| !spec.is_indicator())
            .map(|(spec, _)| spec.name.as_str())
            .collect();

        let categories: Vec<Categories> = rows.iter().map(categories_of).collect();
        let encoder = OneHotEncoder::new().fit(&categories)?;

        let mut columns: Vec<ColumnSpec> = numeric.into_iter().map(ColumnSpec::numeric).collect();
        columns.extend(encoder.column_specs());

        tracing::debug!(
            n_records = data.len(),
            n_columns = columns.len(),
            "fitted booking feature schema"
        );

        Ok(FittedBookingFeatures {
            schema: FeatureSchema::new(columns),
        })
    }
}

impl FittedTransformer for FittedBookingFeatures {
    type Input = [RawRecord];
    type Output = FeatureFrame;
    type Params = FeatureSchema;

    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        let rows = engineer_batch(data)?
            .iter()
            .map(|row| self.schema.align(row).values)
            .collect();
        let columns = self
            .schema
            .column_names()
            .into_iter()
            .map(str::to_string)
            .collect();
        FeatureFrame::from_rows(columns, rows)
    }

    fn extract_params(&self) -> Self::Params {
        self.schema.clone()
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        if params.version != FEATURE_RECIPE_VERSION {
            return Err(PreprocessingError::SchemaVersion {
                expected: FEATURE_RECIPE_VERSION,
                found: params.version,
            });
        }
        Ok(Self { schema: params })
    }

    fn n_features_out(&self) -> usize {
        self.schema.len()
    }
}
