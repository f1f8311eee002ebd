//! Quote statistics for an interactive session or a sampling run.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::info;

use crate::types::quote::format_usd;

/// Window size for latency and price samples
const WINDOW: usize = 10_000;

/// Metrics collector for served quotes
pub struct QuoteMetrics {
    quotes_served: AtomicU64,
    failures: AtomicU64,
    /// Quote latencies in microseconds
    latencies: RwLock<Vec<u64>>,
    prices: RwLock<Vec<f64>>,
    start_time: Instant,
}

impl QuoteMetrics {
    pub fn new() -> Self {
        Self {
            quotes_served: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            latencies: RwLock::new(Vec::with_capacity(1000)),
            prices: RwLock::new(Vec::with_capacity(1000)),
            start_time: Instant::now(),
        }
    }

    /// Record a successful quote
    pub fn record_quote(&self, latency: Duration, price: f64) {
        self.quotes_served.fetch_add(1, Ordering::Relaxed);

        if let Ok(mut latencies) = self.latencies.write() {
            latencies.push(latency.as_micros() as u64);
            if latencies.len() > WINDOW {
                latencies.drain(0..WINDOW / 2);
            }
        }

        if let Ok(mut prices) = self.prices.write() {
            prices.push(price);
            if prices.len() > WINDOW {
                prices.drain(0..WINDOW / 2);
            }
        }
    }

    /// Record a failed prediction
    pub fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn quotes_served(&self) -> u64 {
        self.quotes_served.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Latency statistics over the current window
    pub fn latency_stats(&self) -> LatencyStats {
        let mut sorted = match self.latencies.read() {
            Ok(latencies) if !latencies.is_empty() => latencies.clone(),
            _ => return LatencyStats::default(),
        };
        sorted.sort_unstable();

        let count = sorted.len();
        let sum: u64 = sorted.iter().sum();

        LatencyStats {
            count: count as u64,
            mean_us: sum / count as u64,
            p50_us: sorted[count / 2],
            p95_us: sorted[((count as f64 * 0.95) as usize).min(count - 1)],
            max_us: sorted[count - 1],
        }
    }

    /// Price statistics over the current window
    pub fn price_stats(&self) -> Option<PriceStats> {
        let prices = self.prices.read().ok()?;
        let finite: Vec<f64> = prices.iter().copied().filter(|p| p.is_finite()).collect();
        if finite.is_empty() {
            return None;
        }

        Some(PriceStats {
            min: finite.iter().copied().fold(f64::INFINITY, f64::min),
            max: finite.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean: finite.iter().sum::<f64>() / finite.len() as f64,
        })
    }

    /// Quotes per second since the collector was created
    pub fn throughput(&self) -> f64 {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.quotes_served() as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Log summary statistics
    pub fn print_summary(&self) {
        let served = self.quotes_served();
        let failures = self.failures();
        let attempts = served + failures;
        let failure_rate = if attempts > 0 {
            (failures as f64 / attempts as f64) * 100.0
        } else {
            0.0
        };
        let latency = self.latency_stats();

        info!(
            quotes = served,
            failures = failures,
            failure_rate = format!("{:.1}%", failure_rate),
            throughput = format!("{:.1} quotes/s", self.throughput()),
            "Session summary"
        );
        info!(
            mean_us = latency.mean_us,
            p50_us = latency.p50_us,
            p95_us = latency.p95_us,
            max_us = latency.max_us,
            "Quote latency"
        );
        if let Some(prices) = self.price_stats() {
            info!(
                min = %format_usd(prices.min),
                mean = %format_usd(prices.mean),
                max = %format_usd(prices.max),
                "Quoted nightly prices"
            );
        }
    }
}

impl Default for QuoteMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Quote latency statistics
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LatencyStats {
    pub count: u64,
    pub mean_us: u64,
    pub p50_us: u64,
    pub p95_us: u64,
    pub max_us: u64,
}

#[derive(Debug, PartialEq)]
pub struct PriceStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_recording() {
        let metrics = QuoteMetrics::new();

        metrics.record_quote(Duration::from_micros(100), 150.0);
        metrics.record_quote(Duration::from_micros(300), 250.0);
        metrics.record_failure();

        assert_eq!(metrics.quotes_served(), 2);
        assert_eq!(metrics.failures(), 1);

        let latency = metrics.latency_stats();
        assert_eq!(latency.count, 2);
        assert_eq!(latency.mean_us, 200);
        assert_eq!(latency.max_us, 300);

        let prices = metrics.price_stats().unwrap();
        assert_eq!(prices.min, 150.0);
        assert_eq!(prices.max, 250.0);
        assert_eq!(prices.mean, 200.0);
    }

    #[test]
    fn test_empty_metrics() {
        let metrics = QuoteMetrics::new();

        assert_eq!(metrics.latency_stats(), LatencyStats::default());
        assert!(metrics.price_stats().is_none());
    }
}
