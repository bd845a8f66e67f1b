//! Latency distribution of a measured run

use serde::Serialize;
use std::time::Duration;

/// Summary of per-operation latencies, in microseconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LatencyStats {
    pub samples: usize,
    pub min_us: f64,
    pub mean_us: f64,
    pub p50_us: f64,
    pub p95_us: f64,
    pub p99_us: f64,
    pub max_us: f64,
    /// Operations per second over the wall-clock time of the run
    pub throughput: f64,
}

impl LatencyStats {
    /// Summarize `samples` taken over `elapsed` wall-clock time.
    ///
    /// Percentiles use the nearest-rank method. Returns `None` when there are
    /// no samples.
    pub fn from_samples(samples: &[Duration], elapsed: Duration) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let mut sorted: Vec<f64> = samples.iter().map(as_micros).collect();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let total: f64 = sorted.iter().sum();
        let secs = elapsed.as_secs_f64();
        let throughput = if secs > 0.0 {
            sorted.len() as f64 / secs
        } else {
            f64::INFINITY
        };

        Some(Self {
            samples: sorted.len(),
            min_us: sorted[0],
            mean_us: total / sorted.len() as f64,
            p50_us: nearest_rank(&sorted, 50.0),
            p95_us: nearest_rank(&sorted, 95.0),
            p99_us: nearest_rank(&sorted, 99.0),
            max_us: sorted[sorted.len() - 1],
            throughput,
        })
    }
}

fn as_micros(d: &Duration) -> f64 {
    d.as_nanos() as f64 / 1_000.0
}

/// Value at percentile `p` of an ascending, non-empty slice.
fn nearest_rank(sorted: &[f64], p: f64) -> f64 {
    let rank = ((p / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn micros(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|&v| Duration::from_micros(v)).collect()
    }

    #[test]
    fn test_empty_samples() {
        assert!(LatencyStats::from_samples(&[], Duration::from_secs(1)).is_none());
    }

    #[test]
    fn test_percentiles_nearest_rank() {
        // 1..=100 in reverse, to check that samples are sorted first
        let samples: Vec<_> = micros(&(1..=100).rev().collect::<Vec<_>>());
        let stats = LatencyStats::from_samples(&samples, Duration::from_millis(10)).unwrap();

        assert_eq!(stats.samples, 100);
        assert_eq!(stats.min_us, 1.0);
        assert_eq!(stats.max_us, 100.0);
        assert_eq!(stats.p50_us, 50.0);
        assert_eq!(stats.p95_us, 95.0);
        assert_eq!(stats.p99_us, 99.0);
        assert!((stats.mean_us - 50.5).abs() < 1e-9);
        assert!((stats.throughput - 10_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_single_sample() {
        let stats =
            LatencyStats::from_samples(&micros(&[42]), Duration::from_micros(42)).unwrap();
        assert_eq!(stats.p50_us, 42.0);
        assert_eq!(stats.p99_us, 42.0);
        assert_eq!(stats.min_us, stats.max_us);
    }

    #[test]
    fn test_small_sample_tail() {
        let stats = LatencyStats::from_samples(&micros(&[5, 1, 3]), Duration::from_secs(1)).unwrap();
        assert_eq!(stats.p50_us, 3.0);
        assert_eq!(stats.p95_us, 5.0);
        assert_eq!(stats.p99_us, 5.0);
        assert_eq!(stats.throughput, 3.0);
    }
}
