//! Artifact loading: trained model plus the feature list it expects

use crate::config::ArtifactsConfig;
use crate::error::{ArtifactError, ArtifactKind};
use crate::models::onnx::OnnxPriceModel;
use crate::models::PriceModel;
use crate::types::features::FeatureSchema;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::info;

/// Model and schema loaded at startup, read-only afterwards
pub struct Artifacts {
    pub model: Box<dyn PriceModel>,
    pub schema: FeatureSchema,
}

/// Somewhere the two artifacts can be read from
pub trait ArtifactSource {
    fn load_schema(&self) -> Result<FeatureSchema, ArtifactError>;
    fn load_model(&self) -> Result<Box<dyn PriceModel>, ArtifactError>;
}

/// Reads an ONNX model and a JSON feature list from fixed paths
#[derive(Debug, Clone)]
pub struct OnnxArtifactSource {
    model_path: PathBuf,
    features_path: PathBuf,
    onnx_threads: usize,
    missing_text: String,
}

impl OnnxArtifactSource {
    pub fn new(model_path: impl Into<PathBuf>, features_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            features_path: features_path.into(),
            onnx_threads: 1,
            missing_text: String::new(),
        }
    }

    pub fn from_config(config: &ArtifactsConfig) -> Self {
        Self {
            model_path: config.model_path.clone(),
            features_path: config.features_path.clone(),
            onnx_threads: config.onnx_threads,
            missing_text: config.missing_text.clone(),
        }
    }
}

fn ensure_exists(kind: ArtifactKind, path: &Path) -> Result<(), ArtifactError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(ArtifactError::NotFound {
            kind,
            path: path.to_path_buf(),
        })
    }
}

/// Parse a feature list artifact: a JSON array of column names
pub fn read_feature_list(path: &Path) -> Result<FeatureSchema, ArtifactError> {
    let kind = ArtifactKind::FeatureList;
    ensure_exists(kind, path)?;

    let raw = std::fs::read(path).map_err(|e| ArtifactError::corrupt(kind, path, e))?;
    let columns: Vec<String> =
        serde_json::from_slice(&raw).map_err(|e| ArtifactError::corrupt(kind, path, e))?;

    FeatureSchema::from_columns(columns).map_err(|e| ArtifactError::corrupt(kind, path, e))
}

impl ArtifactSource for OnnxArtifactSource {
    fn load_schema(&self) -> Result<FeatureSchema, ArtifactError> {
        let schema = read_feature_list(&self.features_path)?;
        info!(
            path = %self.features_path.display(),
            columns = schema.len(),
            "Feature list loaded"
        );
        Ok(schema)
    }

    fn load_model(&self) -> Result<Box<dyn PriceModel>, ArtifactError> {
        let kind = ArtifactKind::Model;
        ensure_exists(kind, &self.model_path)?;

        let model = OnnxPriceModel::load(&self.model_path, self.onnx_threads, &self.missing_text)
            .map_err(|e| ArtifactError::corrupt(kind, &self.model_path, e))?;
        Ok(Box::new(model))
    }
}

/// One-time artifact initialization.
///
/// The first successful `load` reads storage; every later call returns the
/// same cached `Artifacts`. Failures are not cached.
pub struct ArtifactCache<S> {
    source: S,
    artifacts: OnceLock<Artifacts>,
}

impl<S: ArtifactSource> ArtifactCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            artifacts: OnceLock::new(),
        }
    }

    pub fn load(&self) -> Result<&Artifacts, ArtifactError> {
        if let Some(artifacts) = self.artifacts.get() {
            return Ok(artifacts);
        }

        let schema = self.source.load_schema()?;
        let model = self.source.load_model()?;
        info!(model = %model.name(), columns = schema.len(), "Artifacts ready");

        Ok(self.artifacts.get_or_init(|| Artifacts { model, schema }))
    }

    pub fn is_loaded(&self) -> bool {
        self.artifacts.get().is_some()
    }
}
