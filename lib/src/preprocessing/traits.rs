//! Fit/transform split shared by the encoders and the booking feature recipe.
//!
//! [`Transformer`] is the unfitted side, only used by the trainer.
//! [`FittedTransformer`] is what ends up in the artifact and runs at serving time.

use crate::preprocessing::error::PreprocessingError;
use crate::serialization::SerializableParams;

/// A transformer that still has to see training data.
///
/// # Example
/// ```ignore
/// use booking_model::preprocessing::{BookingFeatures, Transformer};
///
/// let fitted = BookingFeatures::new().fit(&records)?;
/// let frame = fitted.transform(&records)?;
/// ```
pub trait Transformer: Clone {
    /// Input data type for transformation.
    type Input: ?Sized;
    /// Output data type after transformation.
    type Output;
    /// The fitted transformer type ready for inference.
    type Fitted: FittedTransformer<Input = Self::Input, Output = Self::Output>;

    /// Fit the transformer to the training data.
    ///
    /// # Errors
    /// Returns [`PreprocessingError`] if:
    /// - Data is empty
    /// - A record is missing a required field or holds an invalid value
    fn fit(&self, data: &Self::Input) -> Result<Self::Fitted, PreprocessingError>;

    /// Fit the transformer and transform the data in one step.
    fn fit_transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError> {
        let fitted = self.fit(data)?;
        fitted.transform(data)
    }
}

/// A transformer whose learned state is frozen.
///
/// `from_params(extract_params())` must rebuild an equivalent transformer:
/// the trainer and the server only share these params.
pub trait FittedTransformer: Clone {
    /// Input data type for transformation.
    type Input: ?Sized;
    /// Output data type after transformation.
    type Output;
    /// Serializable representation of learned parameters.
    type Params: SerializableParams;

    /// Transform data using learned parameters.
    fn transform(&self, data: &Self::Input) -> Result<Self::Output, PreprocessingError>;

    /// Extract learned parameters as a serializable representation.
    fn extract_params(&self) -> Self::Params;

    /// Reconstruct a fitted transformer from parameters.
    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError>
    where
        Self: Sized;

    /// Returns the number of output columns produced by `transform`.
    fn n_features_out(&self) -> usize;
}
