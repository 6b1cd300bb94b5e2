//! Feature preprocessing for booking records.
//!
//! Training and inference share one recipe ([`features::engineer`]); what the
//! trainer learns from it is the [`FeatureSchema`], which travels with the
//! model so that serving reproduces the exact training layout.
//!
//! # Core Traits
//!
//! - [`Transformer`]: Unfitted transformer with hyperparameters
//! - [`FittedTransformer`]: Fitted transformer ready for inference
//!
//! # Example
//!
//! ```ignore
//! use booking_model::preprocessing::{BookingFeatures, FittedTransformer, Transformer};
//!
//! let fitted = BookingFeatures::new().fit(&records)?;
//! let frame = fitted.transform(&records)?;
//!
//! // One request at a time, with a report of what alignment dropped or filled
//! let aligned = fitted.transform_one(&record)?;
//! if !aligned.drift().is_empty() {
//!     tracing::warn!(drift = %aligned.drift(), "record does not match training schema");
//! }
//! ```

pub mod encoding;
pub mod error;
pub mod features;
pub mod frame;
pub mod schema;
pub mod traits;

// Re-export main types
pub use encoding::{
    indicator_name, Categories, CategorySet, FittedLabelEncoder, FittedOneHotEncoder,
    LabelEncoder, LabelEncoderParams, OneHotEncoder,
};
pub use error::PreprocessingError;
pub use features::{engineer, engineer_batch, BookingFeatures, FittedBookingFeatures};
pub use frame::FeatureFrame;
pub use schema::{
    AlignedRow, ColumnKind, ColumnSpec, EngineeredRow, FeatureSchema, SchemaDrift,
    FEATURE_RECIPE_VERSION,
};
pub use traits::{FittedTransformer, Transformer};
