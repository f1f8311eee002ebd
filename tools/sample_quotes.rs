//! Sample Quote Generator
//!
//! Generates random in-range listings, quotes each one against the loaded
//! model and logs a latency and price summary. Useful as a smoke test after
//! replacing the model artifacts.

use clap::Parser;
use listing_price_recommender::{
    config::{AppConfig, DEFAULT_CONFIG_PATH},
    models::{ArtifactCache, OnnxArtifactSource, PriceRecommender},
    types::listing::{PropertyType, RoomType},
    ListingDetails, QuoteMetrics,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const NEIGHBOURHOODS: [&str; 8] = [
    "Back Bay",
    "Allston",
    "Downtown",
    "South End",
    "Jamaica Plain",
    "Beacon Hill",
    "Dorchester",
    "East Boston",
];

#[derive(Debug, Parser)]
#[command(name = "sample-quotes", about = "Quote randomly generated listings")]
struct Cli {
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Number of listings to quote
    #[arg(long, default_value_t = 100)]
    count: u64,

    /// Seed for reproducible listings
    #[arg(long)]
    seed: Option<u64>,
}

/// Random listing generator bounded by the form's ranges
struct ListingGenerator {
    rng: StdRng,
}

impl ListingGenerator {
    fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    fn generate(&mut self) -> ListingDetails {
        let (min_guests, max_guests) = ListingDetails::ACCOMMODATES_RANGE;
        let accommodates = self.rng.gen_range(min_guests..=max_guests);
        let (_, max_bedrooms) = ListingDetails::BEDROOMS_RANGE;
        let (_, max_amenities) = ListingDetails::AMENITIES_RANGE;
        let (min_nights, max_nights) = ListingDetails::MINIMUM_NIGHTS_RANGE;
        let (_, max_days) = ListingDetails::AVAILABILITY_RANGE;

        ListingDetails {
            neighbourhood: self.random_choice(&NEIGHBOURHOODS).to_string(),
            property_type: *self.random_choice(&PropertyType::ALL),
            room_type: *self.random_choice(&RoomType::ALL),
            accommodates,
            // Roughly two guests per bedroom
            bedrooms: (accommodates / 2).min(max_bedrooms),
            bathrooms: f64::from(self.rng.gen_range(0..=10_u32)) * 0.5,
            amenities: self.rng.gen_range(0..=max_amenities),
            superhost: self.rng.gen_bool(0.3),
            minimum_nights: self.rng.gen_range(min_nights..=max_nights),
            availability_365: self.rng.gen_range(0..=max_days),
        }
    }

    fn random_choice<'a, T>(&mut self, choices: &'a [T]) -> &'a T {
        &choices[self.rng.gen_range(0..choices.len())]
    }
}

/// Progress at info, library chatter at warn, but keep the metrics summary
fn log_filter(base: EnvFilter) -> anyhow::Result<EnvFilter> {
    Ok(base
        .add_directive("sample_quotes=info".parse()?)
        .add_directive("listing_price_recommender=warn".parse()?)
        .add_directive("listing_price_recommender::metrics=info".parse()?))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(EnvFilter::from_default_env())?)
        .init();

    let cli = Cli::parse();
    info!(count = cli.count, seed = ?cli.seed, "Starting sample quote run");

    let config = AppConfig::load_from_path(&cli.config)?;
    let cache = ArtifactCache::new(OnnxArtifactSource::from_config(&config.artifacts));
    let artifacts = cache.load()?;

    let metrics = QuoteMetrics::new();
    let recommender = PriceRecommender::new(artifacts).with_metrics(&metrics);
    let mut generator = ListingGenerator::new(cli.seed);

    for i in 1..=cli.count {
        let details = generator.generate();
        if let Err(e) = recommender.quote(&details) {
            warn!(
                listing = i,
                neighbourhood = %details.neighbourhood,
                error = %e,
                "Quote failed"
            );
        }

        if i % 100 == 0 {
            info!(quoted = i, "Progress");
        }
    }

    metrics.print_summary();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_log_filter_keeps_metrics_summary() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(log_filter(EnvFilter::new("")).unwrap())
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let metrics = QuoteMetrics::new();
            metrics.record_quote(Duration::from_micros(250), 180.0);
            metrics.print_summary();
        });

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Session summary"));
        assert!(output.contains("Quoted nightly prices"));
    }

    #[test]
    fn test_generated_listings_are_valid() {
        let mut generator = ListingGenerator::new(Some(7));
        for _ in 0..200 {
            assert!(generator.generate().validate().is_ok());
        }
    }
}
