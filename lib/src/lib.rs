//! # booking_model
//!
//! Hotel booking status prediction with strict separation between training
//! and inference, and one feature recipe shared by both.
//!
//! ## Core Design Principles
//!
//! - **Stateful Type Safety**: Models carry their training state in the type system
//!   (`Unfitted` vs `Fitted`), preventing invalid operations at compile time.
//! - **Train/Serve Consistency**: the feature recipe is a single stateless function;
//!   the only learned preprocessing state is the ordered [`FeatureSchema`], persisted
//!   inside the model artifact and used to align every inference row.
//! - **Explicit Persistence**: fitted components expose plain parameter structs
//!   that are bincode-encoded into one versioned artifact file.
//!
//! ## Quick Start
//!
//! ```no_run
//! use booking_model::{BookingDataset, Predictor, Trainer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let dataset = BookingDataset::from_csv("Hotel_Reservations.csv", "booking_status", Some("Booking_ID"))?;
//! let outcome = Trainer::builder().seed(42).build().fit(&dataset)?;
//! println!("{}", outcome.report());
//! outcome.artifact.save("hotel_model.bin")?;
//!
//! let predictor = Predictor::load("hotel_model.bin")?;
//! let prediction = predictor.predict_json(&serde_json::json!({
//!     "no_of_adults": 2, "no_of_children": 0, "total_nights": 3,
//!     "lead_time": 45, "avg_price_per_room": 99.5,
//!     "room_type_reserved": "Room_Type 1", "type_of_meal_plan": "Meal Plan 1",
//!     "market_segment_type": "Online", "repeated_guest": 0, "no_of_special_requests": 1
//! }))?;
//! println!("{}", prediction.label);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Structure
//!
//! - `record`: Raw booking records and field names
//! - `preprocessing`: Feature recipe, schema alignment, encoders
//! - `dataset`: CSV loading and stratified splitting
//! - `model`: Decision tree and random forest with stateful type parameters
//! - `metrics`: Accuracy, precision, recall and the classification report
//! - `trainer`: The offline training recipe
//! - `artifact`: Versioned model artifact file
//! - `predictor`: Single-record inference
//! - `serialization`: Parameter (de)serialization

/// Versioned model artifact persistence.
pub mod artifact;

/// Data loading utilities and dataset abstractions.
pub mod dataset;

/// Classification metrics.
pub mod metrics;

/// Machine learning models with compile-time state safety.
pub mod model;

/// Single-record inference against a trained artifact.
pub mod predictor;

/// Feature preprocessing shared by training and inference.
pub mod preprocessing;

/// Raw booking records.
pub mod record;

/// Parameter persistence.
pub mod serialization;

/// High-level training orchestration.
pub mod trainer;

pub use artifact::{ArtifactError, ModelArtifact, ARTIFACT_FORMAT_VERSION};
pub use dataset::{BookingDataset, DatasetError};
pub use metrics::{ClassificationReport, Metrics};
pub use predictor::{
    ErrorKind, LoadError, PredictError, Prediction, Predictor, SchemaPolicy,
};
pub use preprocessing::{FeatureSchema, PreprocessingError, SchemaDrift};
pub use record::{FieldValue, RawRecord};
pub use trainer::{TrainError, Trainer, TrainerBuilder, TrainingOutcome};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::{engineer, BookingFeatures, FittedTransformer, Transformer};
    use crate::record::*;
    use serde_json::json;
    use std::io::Write;

    const HEADER: &str = "Booking_ID,no_of_adults,no_of_children,no_of_weekend_nights,\
no_of_week_nights,type_of_meal_plan,required_car_parking_space,room_type_reserved,lead_time,\
arrival_month,market_segment_type,repeated_guest,avg_price_per_room,no_of_special_requests,booking_status";

    const MEALS: [&str; 3] = ["Meal Plan 1", "Meal Plan 2", "Not Selected"];
    const ROOMS: [&str; 3] = ["Room_Type 1", "Room_Type 2", "Room_Type 4"];
    const SEGMENTS: [&str; 3] = ["Online", "Offline", "Corporate"];

    fn write_csv(path: &std::path::Path, n: usize) {
        let mut file = std::fs::File::create(path).unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        for i in 0..n {
            let canceled = i % 3 != 1;
            let lead = if canceled { 90 + (i * 7) % 200 } else { (i * 3) % 60 };
            writeln!(
                file,
                "INN{:05},{},{},{},{},{},0,{},{},{},{},0,{:.2},{},{}",
                i,
                1 + i % 3,
                i % 2,
                i % 3,
                1 + i % 4,
                MEALS[i % 3],
                ROOMS[(i / 3) % 3],
                lead,
                1 + i % 12,
                SEGMENTS[(i / 2) % 3],
                70.0 + (i % 40) as f64 * 1.5,
                if canceled { 0 } else { 1 + i % 2 },
                if canceled { "Canceled" } else { "Not_Canceled" }
            )
            .unwrap();
        }
    }

    fn form(lead_time: f64, segment: &str) -> serde_json::Value {
        json!({
            "no_of_adults": 2,
            "no_of_children": 0,
            "total_nights": 3,
            "lead_time": lead_time,
            "avg_price_per_room": 95.0,
            "room_type_reserved": "Room_Type 1",
            "type_of_meal_plan": "Meal Plan 1",
            "market_segment_type": segment,
            "repeated_guest": 0,
            "no_of_special_requests": 0
        })
    }

    #[test]
    fn test_train_save_load_predict() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("Hotel_Reservations.csv");
        let model = dir.path().join("hotel_model.bin");
        write_csv(&data, 150);

        let outcome = Trainer::builder()
            .n_estimators(20)
            .build()
            .fit_csv(&data, &model, BOOKING_STATUS, Some(BOOKING_ID))
            .unwrap();
        assert_eq!(outcome.n_validation, 30);

        let predictor = Predictor::load(&model).unwrap();
        assert_eq!(predictor.schema(), &outcome.artifact.schema);
        assert_eq!(predictor.classes(), &["Canceled", "Not_Canceled"]);

        let prediction = predictor.predict_json(&form(250.0, "Online")).unwrap();
        assert_eq!(prediction.label, "Canceled");
        // arrival_month and required_car_parking_space are not sent by the form
        assert_eq!(prediction.drift.missing_columns.len(), 2);

        let a = predictor.predict_json(&form(10.0, "Aviation")).unwrap();
        let b = predictor.predict_json(&form(10.0, "Complementary")).unwrap();
        assert_eq!(a.label, b.label);
    }

    #[test]
    fn test_numeric_room_codes_match_between_csv_and_json() {
        let mut csv = String::from(HEADER);
        for i in 0..40 {
            let canceled = i % 2 == 0;
            csv.push_str(&format!(
                "\nINN{:05},2,0,1,2,Meal Plan 1,0,{},{},5,Online,0,99.5,{},{}",
                i,
                if i % 4 < 2 { "1.0" } else { "2.0" },
                if canceled { 200 + i } else { i },
                if canceled { 0 } else { 1 },
                if canceled { "Canceled" } else { "Not_Canceled" }
            ));
        }
        let dataset = BookingDataset::from_reader(csv.as_bytes(), BOOKING_STATUS, Some(BOOKING_ID)).unwrap();
        let outcome = Trainer::builder().n_estimators(5).build().fit(&dataset).unwrap();
        let predictor = Predictor::from_artifact(outcome.artifact).unwrap();
        assert_eq!(predictor.schema().categories(ROOM_TYPE_RESERVED), vec!["1", "2"]);

        let mut request = form(10.0, "Online");
        request["arrival_month"] = json!(5);
        request["required_car_parking_space"] = json!(0);
        for room in [json!("1.0"), json!("1"), json!(1), json!(1.0)] {
            request["room_type_reserved"] = room.clone();
            let prediction = predictor.predict_json(&request).unwrap();
            assert!(prediction.drift.is_empty(), "{room}: {}", prediction.drift);
        }
    }

    #[test]
    fn test_inference_matches_training_transform() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("Hotel_Reservations.csv");
        write_csv(&data, 30);
        let dataset = BookingDataset::from_csv(&data, BOOKING_STATUS, Some(BOOKING_ID)).unwrap();

        let fitted = BookingFeatures::new().fit(dataset.records()).unwrap();
        let frame = fitted.transform(dataset.records()).unwrap();

        // The single-record path must reproduce the batch rows bit for bit.
        for (i, record) in dataset.records().iter().enumerate() {
            let aligned = fitted.transform_one(record).unwrap();
            assert_eq!(aligned.values, frame.row(i).to_vec(), "row {i}");
        }

        // Splitting the night counts or sending total_nights gives the same row.
        let mut web = dataset.records()[0].clone();
        let nights = engineer(&web).unwrap().get(TOTAL_NIGHTS).unwrap();
        web.remove(NO_OF_WEEK_NIGHTS);
        web.remove(NO_OF_WEEKEND_NIGHTS);
        web.insert(TOTAL_NIGHTS, nights);
        assert_eq!(fitted.transform_one(&web).unwrap().values, frame.row(0).to_vec());
    }
}
