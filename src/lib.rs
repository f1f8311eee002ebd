//! Listing Price Recommender Library
//!
//! Suggests a nightly price for a short-term rental listing from a
//! pre-trained regression model exported to ONNX.

pub mod config;
pub mod error;
pub mod feature_builder;
pub mod form;
pub mod metrics;
pub mod models;
pub mod types;

pub use config::AppConfig;
pub use error::{ArtifactError, PredictionError};
pub use feature_builder::FeatureBuilder;
pub use metrics::QuoteMetrics;
pub use models::{ArtifactCache, Artifacts, OnnxArtifactSource, PriceModel, PriceRecommender};
pub use types::{FeatureSchema, FeatureValue, FeatureVector, ListingDetails, PriceQuote};
