//! Rolling log of per-tick network statistics, exportable as CSV.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt::Write as _;
use std::path::Path;

pub const DEFAULT_CAPACITY: usize = 10_000;
const CSV_HEADER: &str = "t,mean_amp,kuramoto_R,energy_variance,field_mean";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    pub t: f32,
    pub mean_amplitude: f32,
    pub order_parameter: f32,
    pub energy_variance: f32,
    /// Mean background field density.
    pub field_mean: f32,
}

/// Bounded history; the oldest samples fall off once `capacity` is reached.
#[derive(Debug, Clone)]
pub struct MetricsLog {
    samples: VecDeque<MetricSample>,
    capacity: usize,
}

impl Default for MetricsLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl MetricsLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity.min(DEFAULT_CAPACITY)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, sample: MetricSample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn latest(&self) -> Option<&MetricSample> {
        self.samples.back()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricSample> {
        self.samples.iter()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn to_csv(&self) -> String {
        let mut out = String::with_capacity(CSV_HEADER.len() + 1 + self.samples.len() * 40);
        out.push_str(CSV_HEADER);
        out.push('\n');
        for s in &self.samples {
            // Writing into a String cannot fail.
            let _ = writeln!(
                out,
                "{},{},{},{},{}",
                s.t, s.mean_amplitude, s.order_parameter, s.energy_variance, s.field_mean
            );
        }
        out
    }

    pub fn write_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_csv())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(t: f32) -> MetricSample {
        MetricSample {
            t,
            mean_amplitude: 0.5,
            order_parameter: 0.25,
            energy_variance: 0.125,
            field_mean: 0.375,
        }
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut log = MetricsLog::with_capacity(3);
        for t in 0..5 {
            log.push(sample(t as f32));
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.iter().next().map(|s| s.t), Some(2.0));
        assert_eq!(log.latest().map(|s| s.t), Some(4.0));
    }

    #[test]
    fn test_csv_layout() {
        let mut log = MetricsLog::default();
        log.push(sample(0.5));
        let csv = log.to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines, vec![CSV_HEADER, "0.5,0.5,0.25,0.125,0.375"]);
    }

    #[test]
    fn test_write_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.csv");
        let mut log = MetricsLog::default();
        log.push(sample(1.0));
        log.write_csv(&path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with(CSV_HEADER));
        assert_eq!(written.lines().count(), 2);
    }
}
