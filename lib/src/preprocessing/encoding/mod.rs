//! Categorical feature encoding.
//!
//! # Available Encoders
//!
//! ## OneHotEncoder
//! Expands each categorical field into one indicator column per category
//! value seen during fit.
//!
//! ```ignore
//! // room_type_reserved: ["Room_Type 1", "Room_Type 4"]
//! // -> room_type_reserved_Room_Type 1, room_type_reserved_Room_Type 4
//! ```
//!
//! ## LabelEncoder
//! Encodes text target labels to class indices (for classification targets).

mod label;
mod one_hot;

pub use label::{FittedLabelEncoder, LabelEncoder, LabelEncoderParams};
pub use one_hot::{indicator_name, Categories, CategorySet, FittedOneHotEncoder, OneHotEncoder};
