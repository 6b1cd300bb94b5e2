//! The persisted model artifact.
//!
//! One bincode file carries everything inference needs: the feature schema,
//! the class labels, the forest and the validation report. The file starts
//! with an explicit format version; an artifact written by another version is
//! rejected on load instead of being misread.

use crate::metrics::ClassificationReport;
use crate::model::ForestParams;
use crate::preprocessing::{FeatureSchema, LabelEncoderParams};
use crate::serialization::SerializableParams;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Version of the artifact layout written by [`ModelArtifact::save`].
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to access artifact {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to encode or decode artifact: {0}")]
    Encoding(#[from] bincode::Error),
    #[error("Unsupported artifact format version {found} (expected {expected})")]
    Version { expected: u32, found: u32 },
}

/// Fixed-layout prefix read before the body, so a version mismatch is
/// detected even when the body layout changed.
#[derive(Serialize, Deserialize)]
struct Header {
    format_version: u32,
}

/// Everything a predictor needs, plus how the model scored when trained.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub schema: FeatureSchema,
    pub labels: LabelEncoderParams,
    pub forest: ForestParams,
    pub report: ClassificationReport,
}

impl ModelArtifact {
    /// Encode as header followed by body.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ArtifactError> {
        let mut bytes = Header {
            format_version: ARTIFACT_FORMAT_VERSION,
        }
        .to_bytes()?;
        bytes.extend(SerializableParams::to_bytes(self)?);
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ArtifactError> {
        let header = Header::from_bytes(bytes)?;
        if header.format_version != ARTIFACT_FORMAT_VERSION {
            return Err(ArtifactError::Version {
                expected: ARTIFACT_FORMAT_VERSION,
                found: header.format_version,
            });
        }
        let header_len = bincode::serialized_size(&header)? as usize;
        Ok(<Self as SerializableParams>::from_bytes(&bytes[header_len..])?)
    }

    /// Write the artifact to `path`, replacing any existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ArtifactError> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        std::fs::write(path, &bytes).map_err(|source| ArtifactError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "saved model artifact");
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| ArtifactError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let artifact = Self::from_bytes(&bytes)?;
        tracing::info!(
            path = %path.display(),
            n_features = artifact.schema.len(),
            n_trees = artifact.forest.trees.len(),
            "loaded model artifact"
        );
        Ok(artifact)
    }
}
