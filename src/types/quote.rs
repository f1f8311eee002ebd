//! Price quote returned for one prediction request

use chrono::{DateTime, Utc};
use std::time::Duration;
use uuid::Uuid;

/// Suggested nightly price for a listing
#[derive(Debug, Clone)]
pub struct PriceQuote {
    /// Unique quote identifier, used to correlate log lines
    pub quote_id: Uuid,

    /// Predicted nightly price in USD. Not bounds-checked.
    pub nightly_price: f64,

    /// Name of the model that produced the price
    pub model: String,

    /// Number of columns sent to the model as missing
    pub missing_columns: usize,

    /// Time spent building the row and scoring it
    pub latency: Duration,

    pub generated_at: DateTime<Utc>,
}

impl PriceQuote {
    pub fn new(nightly_price: f64, model: impl Into<String>) -> Self {
        Self {
            quote_id: Uuid::new_v4(),
            nightly_price,
            model: model.into(),
            missing_columns: 0,
            latency: Duration::ZERO,
            generated_at: Utc::now(),
        }
    }

    pub fn with_missing_columns(mut self, missing_columns: usize) -> Self {
        self.missing_columns = missing_columns;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Price formatted for display, e.g. `$1,234.50`
    pub fn formatted_price(&self) -> String {
        format_usd(self.nightly_price)
    }
}

/// Format an amount as USD with thousands separators and two decimals.
pub fn format_usd(amount: f64) -> String {
    if !amount.is_finite() {
        return format!("${}", amount);
    }

    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    // -0.004 rounds to 0.00 and should not print as negative
    let sign = if amount < 0.0 && fixed != "0.00" { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, cents)
}
