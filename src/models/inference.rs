//! Price inference: build the row, score it, package the quote

use crate::error::PredictionError;
use crate::feature_builder::FeatureBuilder;
use crate::metrics::QuoteMetrics;
use crate::models::loader::Artifacts;
use crate::models::PriceModel;
use crate::types::features::{FeatureVector, SuppliedFeatures};
use crate::types::listing::ListingDetails;
use crate::types::quote::PriceQuote;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Score one row.
///
/// Any failure inside the model comes back as a `PredictionError` carrying
/// the original cause. Nothing is retried.
pub fn predict(model: &dyn PriceModel, vector: &FeatureVector) -> Result<f64, PredictionError> {
    match model.predict(vector) {
        Ok(price) => {
            debug!(model = %model.name(), price = price, "Model inference complete");
            Ok(price)
        }
        Err(e) => {
            warn!(model = %model.name(), error = %e, "Model inference failed");
            Err(PredictionError::new(model.name(), e))
        }
    }
}

/// Turns listing details into price quotes using the loaded artifacts
pub struct PriceRecommender<'a> {
    artifacts: &'a Artifacts,
    metrics: Option<&'a QuoteMetrics>,
}

impl<'a> PriceRecommender<'a> {
    pub fn new(artifacts: &'a Artifacts) -> Self {
        Self {
            artifacts,
            metrics: None,
        }
    }

    /// Record every quote and failure into `metrics`
    pub fn with_metrics(mut self, metrics: &'a QuoteMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn model_name(&self) -> &str {
        self.artifacts.model.name()
    }

    /// Quote a listing from the form
    pub fn quote(&self, details: &ListingDetails) -> Result<PriceQuote, PredictionError> {
        self.quote_supplied(&details.to_supplied())
    }

    /// Quote an arbitrary set of supplied features
    pub fn quote_supplied(&self, supplied: &SuppliedFeatures) -> Result<PriceQuote, PredictionError> {
        let start = Instant::now();
        let row = FeatureBuilder::new(&self.artifacts.schema).build(supplied);
        let missing = row.missing_count();

        let result = predict(self.artifacts.model.as_ref(), &row);
        let latency = start.elapsed();

        match result {
            Ok(price) => {
                let quote = PriceQuote::new(price, self.model_name())
                    .with_missing_columns(missing)
                    .with_latency(latency);

                if let Some(metrics) = self.metrics {
                    metrics.record_quote(latency, price);
                }

                info!(
                    quote_id = %quote.quote_id,
                    price = %quote.formatted_price(),
                    missing_columns = missing,
                    latency_us = latency.as_micros(),
                    "Price quote generated"
                );
                Ok(quote)
            }
            Err(e) => {
                if let Some(metrics) = self.metrics {
                    metrics.record_failure();
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_builder;
    use crate::types::features::{FeatureSchema, FeatureValue};
    use anyhow::bail;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Linear in accommodates and bedrooms, fails on text where a number belongs
    struct LinearModel;

    impl PriceModel for LinearModel {
        fn name(&self) -> &str {
            "linear"
        }

        fn predict(&self, row: &FeatureVector) -> anyhow::Result<f64> {
            let mut price = 50.0;
            for (column, weight) in [("accommodates", 25.0), ("bedrooms", 40.0)] {
                match row.get(column) {
                    Some(FeatureValue::Integer(n)) => price += weight * *n as f64,
                    Some(FeatureValue::Float(x)) => price += weight * x,
                    Some(FeatureValue::Missing) | None => {}
                    Some(other) => bail!("column '{}' expects a number, got {}", column, other),
                }
            }
            Ok(price)
        }
    }

    /// Fails on the first call only
    struct FlakyModel {
        calls: AtomicUsize,
    }

    impl PriceModel for FlakyModel {
        fn name(&self) -> &str {
            "flaky"
        }

        fn predict(&self, _row: &FeatureVector) -> anyhow::Result<f64> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                bail!("numerical error in tree 17");
            }
            Ok(99.5)
        }
    }

    fn artifacts(model: Box<dyn PriceModel>) -> Artifacts {
        let schema = FeatureSchema::from_columns(
            ["accommodates", "bedrooms", "neighbourhood_cleansed", "review_scores_rating"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
        .unwrap();
        Artifacts { model, schema }
    }

    #[test]
    fn test_predict_is_deterministic() {
        let artifacts = artifacts(Box::new(LinearModel));
        let row = feature_builder::build(&artifacts.schema, &ListingDetails::default().to_supplied());

        let first = predict(artifacts.model.as_ref(), &row).unwrap();
        let second = predict(artifacts.model.as_ref(), &row).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, 50.0 + 25.0 * 4.0 + 40.0);
    }

    #[test]
    fn test_predict_wraps_model_failure() {
        let artifacts = artifacts(Box::new(LinearModel));
        let mut supplied = SuppliedFeatures::new();
        supplied.insert("accommodates".to_string(), FeatureValue::Text("four".to_string()));
        let row = feature_builder::build(&artifacts.schema, &supplied);

        let err = predict(artifacts.model.as_ref(), &row).unwrap_err();

        assert_eq!(err.model, "linear");
        assert!(err.source.to_string().contains("accommodates"));
    }

    #[test]
    fn test_failure_does_not_affect_next_request() {
        let artifacts = artifacts(Box::new(FlakyModel {
            calls: AtomicUsize::new(0),
        }));
        let metrics = QuoteMetrics::new();
        let recommender = PriceRecommender::new(&artifacts).with_metrics(&metrics);
        let details = ListingDetails::default();

        let err = recommender.quote(&details).unwrap_err();
        assert!(err.to_string().contains("numerical error in tree 17"));

        let quote = recommender.quote(&details).unwrap();
        assert_eq!(quote.nightly_price, 99.5);
        assert_eq!(metrics.quotes_served(), 1);
        assert_eq!(metrics.failures(), 1);
    }

    #[test]
    fn test_quote_counts_missing_columns() {
        let artifacts = artifacts(Box::new(LinearModel));
        let recommender = PriceRecommender::new(&artifacts);

        let quote = recommender.quote(&ListingDetails::default()).unwrap();

        // neighbourhood is supplied, review_scores_rating is not
        assert_eq!(quote.missing_columns, 1);
        assert_eq!(quote.model, "linear");
        assert_eq!(quote.formatted_price(), "$190.00");
    }

    #[test]
    fn test_quote_supplied_empty_mapping() {
        let artifacts = artifacts(Box::new(LinearModel));
        let recommender = PriceRecommender::new(&artifacts);

        let quote = recommender.quote_supplied(&SuppliedFeatures::new()).unwrap();

        assert_eq!(quote.missing_columns, 4);
        assert_eq!(quote.nightly_price, 50.0);
    }
}
