//! Error types for artifact loading, schema construction and prediction

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which of the two persisted artifacts an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Model,
    FeatureList,
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Model => f.write_str("model"),
            ArtifactKind::FeatureList => f.write_str("feature list"),
        }
    }
}

/// Failure to load a startup artifact. Always fatal.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("{kind} artifact not found at {}", path.display())]
    NotFound { kind: ArtifactKind, path: PathBuf },

    #[error("{kind} artifact at {} could not be deserialized: {source:#}", path.display())]
    Corrupt {
        kind: ArtifactKind,
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

impl ArtifactError {
    pub fn corrupt(kind: ArtifactKind, path: impl Into<PathBuf>, source: impl Into<anyhow::Error>) -> Self {
        ArtifactError::Corrupt {
            kind,
            path: path.into(),
            source: source.into(),
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        match self {
            ArtifactError::NotFound { kind, .. } | ArtifactError::Corrupt { kind, .. } => *kind,
        }
    }
}

/// Invalid feature schema contents
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("feature schema has no columns")]
    Empty,

    #[error("feature schema lists column '{0}' more than once")]
    DuplicateColumn(String),
}

/// A single prediction attempt failed. The process keeps serving.
#[derive(Debug, Error)]
#[error("prediction with model '{model}' failed: {source:#}")]
pub struct PredictionError {
    pub model: String,
    #[source]
    pub source: anyhow::Error,
}

impl PredictionError {
    pub fn new(model: impl Into<String>, source: anyhow::Error) -> Self {
        Self {
            model: model.into(),
            source,
        }
    }
}

/// Rejected user input from the listing form
#[derive(Debug, Error, PartialEq)]
pub enum FormError {
    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("expected key=value, got '{0}'")]
    MalformedToken(String),

    #[error("unterminated quote in input")]
    UnterminatedQuote,

    #[error("input line is not valid UTF-8")]
    InvalidEncoding,

    #[error("invalid value '{value}' for {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: String,
        min: String,
        max: String,
    },
}
