//! Booking dataset loading and splitting.
//!
//! A [`BookingDataset`] holds the raw records (identifier and label columns
//! removed) and the text labels side by side. Loading is strict: an unreadable
//! file, a missing label column or an empty cell aborts the load, since a
//! partially read training set silently skews the model.
//!
//! # Example
//!
//! ```no_run
//! use booking_model::dataset::BookingDataset;
//!
//! let dataset = BookingDataset::from_csv("Hotel_Reservations.csv", "booking_status", Some("Booking_ID"))?;
//! let (train, test) = dataset.stratified_split(0.2, 42)?;
//! # Ok::<(), booking_model::dataset::DatasetError>(())
//! ```

use crate::record::{FieldValue, RawRecord};
use csv::ReaderBuilder;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use thiserror::Error;

/// Errors raised while loading or splitting a dataset.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Failed to open dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Missing column: {0}")]
    MissingColumn(String),
    /// `row` is 1-based and counts data rows only (the header is not a row).
    #[error("Empty value in row {row}, column {column}")]
    EmptyCell { row: usize, column: String },
    #[error("Dataset is empty")]
    Empty,
    #[error("Invalid split: {0}")]
    InvalidSplit(String),
}

/// Raw booking records with their text labels.
#[derive(Debug, Clone, Default)]
pub struct BookingDataset {
    records: Vec<RawRecord>,
    labels: Vec<String>,
}

impl BookingDataset {
    /// Build a dataset from already parsed records.
    ///
    /// # Panics
    /// Panics if `records` and `labels` differ in length.
    pub fn new(records: Vec<RawRecord>, labels: Vec<String>) -> Self {
        assert_eq!(
            records.len(),
            labels.len(),
            "records and labels must have the same length"
        );
        Self { records, labels }
    }

    /// Load a dataset from a CSV file with a header row.
    ///
    /// `label_column` is split off as the target; `id_column`, when given, is
    /// dropped. Every other column becomes a record field, parsed with
    /// [`FieldValue::parse`].
    pub fn from_csv<P: AsRef<Path>>(
        path: P,
        label_column: &str,
        id_column: Option<&str>,
    ) -> Result<Self, DatasetError> {
        let file = File::open(path.as_ref())?;
        let dataset = Self::from_reader(BufReader::new(file), label_column, id_column)?;
        tracing::info!(
            path = %path.as_ref().display(),
            rows = dataset.len(),
            "loaded booking dataset"
        );
        Ok(dataset)
    }

    /// Load a dataset from any CSV source; see [`BookingDataset::from_csv`].
    pub fn from_reader<R: Read>(
        reader: R,
        label_column: &str,
        id_column: Option<&str>,
    ) -> Result<Self, DatasetError> {
        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();

        let label_idx = headers
            .iter()
            .position(|h| h == label_column)
            .ok_or_else(|| DatasetError::MissingColumn(label_column.to_string()))?;
        let id_idx = match id_column {
            Some(id) => Some(
                headers
                    .iter()
                    .position(|h| h == id)
                    .ok_or_else(|| DatasetError::MissingColumn(id.to_string()))?,
            ),
            None => None,
        };

        let mut records = Vec::new();
        let mut labels = Vec::new();

        for (row, result) in rdr.records().enumerate() {
            let row_record = result?;
            let mut record = RawRecord::new();
            let mut label = None;

            for (idx, (name, cell)) in headers.iter().zip(row_record.iter()).enumerate() {
                if Some(idx) == id_idx {
                    continue;
                }
                let cell = cell.trim();
                if cell.is_empty() {
                    return Err(DatasetError::EmptyCell {
                        row: row + 1,
                        column: name.clone(),
                    });
                }
                if idx == label_idx {
                    label = Some(cell.to_string());
                } else {
                    record.insert(name, FieldValue::parse(cell));
                }
            }

            // The csv reader rejects ragged rows, so the label cell is always present.
            let label = label.ok_or_else(|| DatasetError::MissingColumn(label_column.to_string()))?;
            records.push(record);
            labels.push(label);
        }

        if records.is_empty() {
            return Err(DatasetError::Empty);
        }
        Ok(Self { records, labels })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Number of rows per label, in label order.
    pub fn class_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for label in &self.labels {
            *counts.entry(label.as_str()).or_insert(0) += 1;
        }
        counts
    }

    /// A new dataset holding the given rows, in the given order.
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            records: indices.iter().map(|&i| self.records[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i].clone()).collect(),
        }
    }

    /// Stratified split into `(train, test)` index sets.
    ///
    /// The test partition gets `ceil(n * test_size)` rows, shared across
    /// classes by largest remainder so that each class keeps its proportion.
    /// Rows are shuffled with a seeded RNG, so the split is reproducible.
    pub fn stratified_split_indices(
        &self,
        test_size: f64,
        seed: u64,
    ) -> Result<(Vec<usize>, Vec<usize>), DatasetError> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(DatasetError::InvalidSplit(format!(
                "test_size must be in (0, 1), got {}",
                test_size
            )));
        }
        let n = self.len();
        let n_test = (n as f64 * test_size).ceil() as usize;
        if n_test == 0 || n_test >= n {
            return Err(DatasetError::InvalidSplit(format!(
                "{} rows cannot be split with test_size {}",
                n, test_size
            )));
        }

        let mut by_class: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (idx, label) in self.labels.iter().enumerate() {
            by_class.entry(label.as_str()).or_default().push(idx);
        }

        // Largest-remainder allocation of the test rows.
        let mut quotas: Vec<(usize, f64)> = by_class
            .values()
            .map(|rows| {
                let exact = rows.len() as f64 * n_test as f64 / n as f64;
                (exact.floor() as usize, exact - exact.floor())
            })
            .collect();
        let mut remaining = n_test - quotas.iter().map(|(q, _)| q).sum::<usize>();
        let mut order: Vec<usize> = (0..quotas.len()).collect();
        order.sort_by(|&a, &b| quotas[b].1.total_cmp(&quotas[a].1).then(a.cmp(&b)));
        for &class in &order {
            if remaining == 0 {
                break;
            }
            quotas[class].0 += 1;
            remaining -= 1;
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut train = Vec::with_capacity(n - n_test);
        let mut test = Vec::with_capacity(n_test);
        for ((_, rows), (quota, _)) in by_class.iter_mut().zip(&quotas) {
            rows.shuffle(&mut rng);
            test.extend_from_slice(&rows[..*quota]);
            train.extend_from_slice(&rows[*quota..]);
        }
        train.shuffle(&mut rng);
        test.shuffle(&mut rng);
        Ok((train, test))
    }

    /// Stratified split into `(train, test)` datasets.
    pub fn stratified_split(&self, test_size: f64, seed: u64) -> Result<(Self, Self), DatasetError> {
        let (train, test) = self.stratified_split_indices(test_size, seed)?;
        Ok((self.subset(&train), self.subset(&test)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CSV: &str = "\
Booking_ID,no_of_adults,lead_time,room_type_reserved,booking_status
INN00001,2,224,Room_Type 1,Not_Canceled
INN00002,2,5,Room_Type 1,Not_Canceled
INN00003,1,1,Room_Type 1,Canceled
INN00004,2,211,Room_Type 4,Canceled
INN00005,2,48,Room_Type 1,Not_Canceled
";

    fn labelled(n_a: usize, n_b: usize) -> BookingDataset {
        let mut records = Vec::new();
        let mut labels = Vec::new();
        for i in 0..n_a + n_b {
            records.push(RawRecord::new().with("lead_time", i as f64));
            labels.push(if i < n_a { "Canceled" } else { "Not_Canceled" }.to_string());
        }
        BookingDataset::new(records, labels)
    }

    #[test]
    fn test_from_reader_parses_rows() {
        let ds = BookingDataset::from_reader(CSV.as_bytes(), "booking_status", Some("Booking_ID"))
            .unwrap();
        assert_eq!(ds.len(), 5);
        assert_eq!(ds.labels()[2], "Canceled");

        let first = &ds.records()[0];
        assert!(!first.contains("Booking_ID"));
        assert!(!first.contains("booking_status"));
        assert_eq!(first.get("lead_time"), Some(&FieldValue::Number(224.0)));
        assert_eq!(
            first.get("room_type_reserved"),
            Some(&FieldValue::Text("Room_Type 1".to_string()))
        );
    }

    #[test]
    fn test_from_csv_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CSV.as_bytes()).unwrap();
        let ds = BookingDataset::from_csv(file.path(), "booking_status", Some("Booking_ID")).unwrap();
        assert_eq!(ds.class_counts().get("Canceled"), Some(&2));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = BookingDataset::from_csv("/nonexistent/bookings.csv", "booking_status", None)
            .unwrap_err();
        assert!(matches!(err, DatasetError::Io(_)));
    }

    #[test]
    fn test_missing_label_column() {
        let err = BookingDataset::from_reader(CSV.as_bytes(), "status", None).unwrap_err();
        assert!(matches!(err, DatasetError::MissingColumn(c) if c == "status"));
    }

    #[test]
    fn test_empty_cell_is_fatal() {
        let csv = "lead_time,booking_status\n5,Canceled\n,Not_Canceled\n";
        let err = BookingDataset::from_reader(csv.as_bytes(), "booking_status", None).unwrap_err();
        match err {
            DatasetError::EmptyCell { row, column } => {
                assert_eq!(row, 2);
                assert_eq!(column, "lead_time");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ragged_row_is_csv_error() {
        let csv = "lead_time,booking_status\n5,Canceled\n7\n";
        let err = BookingDataset::from_reader(csv.as_bytes(), "booking_status", None).unwrap_err();
        assert!(matches!(err, DatasetError::Csv(_)));
    }

    #[test]
    fn test_header_only_is_empty() {
        let csv = "lead_time,booking_status\n";
        let err = BookingDataset::from_reader(csv.as_bytes(), "booking_status", None).unwrap_err();
        assert!(matches!(err, DatasetError::Empty));
    }

    #[test]
    fn test_stratified_split_sizes_and_proportions() {
        let ds = labelled(30, 70);
        let (train, test) = ds.stratified_split(0.2, 42).unwrap();
        assert_eq!(train.len(), 80);
        assert_eq!(test.len(), 20);
        assert_eq!(test.class_counts().get("Canceled"), Some(&6));
        assert_eq!(test.class_counts().get("Not_Canceled"), Some(&14));
    }

    #[test]
    fn test_stratified_split_rounds_up_test_rows() {
        let ds = labelled(3, 8);
        let (train, test) = ds.stratified_split_indices(0.2, 42).unwrap();
        // ceil(11 * 0.2) = 3
        assert_eq!(test.len(), 3);
        assert_eq!(train.len(), 8);
    }

    #[test]
    fn test_stratified_split_is_partition() {
        let ds = labelled(13, 29);
        let (mut train, test) = ds.stratified_split_indices(0.25, 7).unwrap();
        train.extend(&test);
        train.sort_unstable();
        assert_eq!(train, (0..42).collect::<Vec<_>>());
    }

    #[test]
    fn test_stratified_split_is_reproducible() {
        let ds = labelled(20, 20);
        assert_eq!(
            ds.stratified_split_indices(0.2, 42).unwrap(),
            ds.stratified_split_indices(0.2, 42).unwrap()
        );
        assert_ne!(
            ds.stratified_split_indices(0.2, 42).unwrap(),
            ds.stratified_split_indices(0.2, 43).unwrap()
        );
    }

    #[test]
    fn test_invalid_test_size() {
        let ds = labelled(5, 5);
        assert!(ds.stratified_split(0.0, 42).is_err());
        assert!(ds.stratified_split(1.0, 42).is_err());
    }
}
