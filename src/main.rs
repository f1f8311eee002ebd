//! Listing Price Recommender - Main Entry Point
//!
//! Loads the trained price model once, then quotes listings from command-line
//! flags or an interactive session.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use listing_price_recommender::{
    config::{AppConfig, LoggingConfig, DEFAULT_CONFIG_PATH},
    form::{self, FormRequest, FIELD_NAMES},
    models::{ArtifactCache, Artifacts, OnnxArtifactSource, PriceRecommender},
    types::listing::{columns, PropertyType, RoomType},
    FeatureBuilder, ListingDetails, PriceQuote, QuoteMetrics,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "price-recommender", about = "Suggest a nightly price for a rental listing")]
struct Cli {
    /// Configuration file (missing file falls back to built-in defaults)
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Quote a single listing and exit
    Quote(ListingArgs),
    /// Read one listing per line from stdin and quote each
    Interactive,
    /// Show the model's feature columns and which ones the form fills
    Features,
}

#[derive(Debug, Args)]
struct ListingArgs {
    /// Neighbourhood, e.g. "Back Bay", "Allston", "Downtown"
    #[arg(long, default_value = "Back Bay")]
    neighbourhood: String,
    #[arg(long, default_value = "Apartment")]
    property_type: PropertyType,
    #[arg(long, default_value = "Entire home/apt")]
    room_type: RoomType,
    /// Number of guests (1-16)
    #[arg(long, default_value_t = 4)]
    accommodates: u32,
    /// 0-10
    #[arg(long, default_value_t = 1)]
    bedrooms: u32,
    /// 0.0-5.0 in steps of 0.5
    #[arg(long, default_value_t = 1.0)]
    bathrooms: f64,
    /// Number of amenities (0-60)
    #[arg(long, default_value_t = 15)]
    amenities: u32,
    /// Host is a Superhost
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    superhost: bool,
    /// 1-30
    #[arg(long, default_value_t = 2)]
    minimum_nights: u32,
    /// Available days per year (0-365)
    #[arg(long, default_value_t = 200)]
    availability: u32,
}

impl From<ListingArgs> for ListingDetails {
    fn from(args: ListingArgs) -> Self {
        Self {
            neighbourhood: args.neighbourhood,
            property_type: args.property_type,
            room_type: args.room_type,
            accommodates: args.accommodates,
            bedrooms: args.bedrooms,
            bathrooms: args.bathrooms,
            amenities: args.amenities,
            superhost: args.superhost,
            minimum_nights: args.minimum_nights,
            availability_365: args.availability,
        }
    }
}

fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::new(format!("listing_price_recommender={}", config.level))
            .add_directive(format!("price_recommender={}", config.level).parse()?),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr);
    if config.is_json() {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

fn print_quote(quote: &PriceQuote) {
    println!("Recommended Nightly Price");
    println!("Suggested price (USD): {}", quote.formatted_price());
}

fn run_quote(artifacts: &Artifacts, details: ListingDetails) -> ExitCode {
    if let Err(e) = details.validate() {
        eprintln!("Invalid listing details: {}", e);
        return ExitCode::from(2);
    }

    match PriceRecommender::new(artifacts).quote(&details) {
        Ok(quote) => {
            print_quote(&quote);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Something went wrong while predicting: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn print_help() {
    println!("Enter listing details as key=value pairs, e.g.");
    println!("  neighbourhood=\"South End\" room_type=\"Private room\" accommodates=2");
    println!("Fields: {}", FIELD_NAMES.join(", "));
    println!("A blank line quotes the defaults. Type 'quit' to leave.");
}

fn run_interactive(artifacts: &Artifacts, summary_on_exit: bool) -> Result<()> {
    let metrics = QuoteMetrics::new();
    let recommender = PriceRecommender::new(artifacts).with_metrics(&metrics);
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    print_help();
    loop {
        print!("listing> ");
        stdout.flush()?;

        let mut line = Vec::new();
        if stdin.lock().read_until(b'\n', &mut line)? == 0 {
            break;
        }

        match form::parse_bytes(&line) {
            Ok(FormRequest::Quit) => break,
            Ok(FormRequest::Help) => print_help(),
            Ok(FormRequest::Quote(details)) => match recommender.quote(&details) {
                Ok(quote) => print_quote(&quote),
                Err(e) => println!("Something went wrong while predicting: {}", e),
            },
            Err(e) => println!("Invalid input: {}", e),
        }
    }

    if summary_on_exit {
        metrics.print_summary();
    }
    Ok(())
}

fn run_features(artifacts: &Artifacts) {
    let builder = FeatureBuilder::new(&artifacts.schema);
    let coverage = builder.coverage(&ListingDetails::default().to_supplied());

    println!(
        "Model '{}' expects {} features",
        artifacts.model.name(),
        builder.feature_count()
    );
    for name in builder.feature_names() {
        let source = if coverage.filled.contains(name) { "form" } else { "missing" };
        println!("  {:<40} {}", name, source);
    }
    if !coverage.dropped.is_empty() {
        println!("Form fields unknown to this model: {}", coverage.dropped.join(", "));
    }
    println!(
        "The form fills {} of {} columns ({} available); the rest use values learned in training.",
        coverage.filled.len(),
        builder.feature_count(),
        columns::ALL.len()
    );
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = AppConfig::load_from_path(&cli.config)?;
    init_logging(&config.logging)?;
    info!(config = %cli.config.display(), "Configuration loaded");

    // Artifacts are loaded exactly once; everything below borrows them.
    let cache = ArtifactCache::new(OnnxArtifactSource::from_config(&config.artifacts));
    let artifacts = match cache.load() {
        Ok(artifacts) => artifacts,
        Err(e) => {
            error!(error = %e, "Failed to load model artifacts");
            return Err(e.into());
        }
    };

    match cli.command {
        Command::Quote(args) => Ok(run_quote(artifacts, args.into())),
        Command::Interactive => {
            run_interactive(artifacts, config.session.summary_on_exit)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Features => {
            run_features(artifacts);
            Ok(ExitCode::SUCCESS)
        }
    }
}
