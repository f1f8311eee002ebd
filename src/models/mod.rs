//! Price model loading and inference components

pub mod inference;
pub mod loader;
pub mod onnx;

pub use inference::{predict, PriceRecommender};
pub use loader::{ArtifactCache, ArtifactSource, Artifacts, OnnxArtifactSource};
pub use onnx::OnnxPriceModel;

use crate::types::features::FeatureVector;

/// A trained regression model scoring one feature row.
///
/// Implementations read columns by name and must not depend on the order
/// of the row. Errors are wrapped into `PredictionError` by the caller.
pub trait PriceModel: Send + Sync {
    /// Name used in logs and quotes
    fn name(&self) -> &str;

    fn predict(&self, row: &FeatureVector) -> anyhow::Result<f64>;
}
