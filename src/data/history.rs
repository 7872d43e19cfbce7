//! Statistics over a window of readings, for sparklines and the history view.

use serde::Serialize;

use aquawatch_types::{Parameter, Reading, Status};

use super::classify::ThresholdPolicy;

/// Number of bar levels a sparkline value is normalized into.
const SPARKLINE_LEVELS: f64 = 7.0;

/// Minimum, mean and maximum of one parameter over a window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParameterStats {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}

impl ParameterStats {
    /// Compute stats for `parameter`, skipping non-finite values.
    ///
    /// Returns `None` if there are no finite values.
    pub fn compute(readings: &[Reading], parameter: Parameter) -> Option<Self> {
        let values: Vec<f64> = readings
            .iter()
            .map(|r| r.value(parameter))
            .filter(|v| v.is_finite())
            .collect();

        if values.is_empty() {
            return None;
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let avg = values.iter().sum::<f64>() / values.len() as f64;

        Some(Self { min, avg, max })
    }
}

/// How many readings in a window fall in each status.
///
/// A reading counts under the worst status of its parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusDistribution {
    pub good: usize,
    pub warning: usize,
    pub critical: usize,
}

impl StatusDistribution {
    /// Tally readings against a threshold policy.
    pub fn compute(readings: &[Reading], policy: &ThresholdPolicy) -> Self {
        let mut dist = Self::default();
        for reading in readings {
            let worst = reading
                .values()
                .map(|(parameter, value)| policy.classify(parameter, value))
                .max()
                .unwrap_or(Status::Good);
            match worst {
                Status::Good => dist.good += 1,
                Status::Warning => dist.warning += 1,
                Status::Critical => dist.critical += 1,
            }
        }
        dist
    }

    /// Total number of readings tallied.
    pub fn total(&self) -> usize {
        self.good + self.warning + self.critical
    }

    /// Share of readings with `status`, as a percentage. `0.0` for an empty window.
    pub fn percent(&self, status: Status) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let count = match status {
            Status::Good => self.good,
            Status::Warning => self.warning,
            Status::Critical => self.critical,
        };
        count as f64 / total as f64 * 100.0
    }
}

/// Normalize values to 0-7 for sparkline display.
///
/// Returns an empty Vec if there are fewer than two points. A flat series
/// sits at the middle level. Non-finite values map to 0.
pub fn sparkline(values: &[f64]) -> Vec<u64> {
    if values.len() < 2 {
        return Vec::new();
    }

    let finite = values.iter().copied().filter(|v| v.is_finite());
    let min = finite.clone().fold(f64::INFINITY, f64::min);
    let max = finite.fold(f64::NEG_INFINITY, f64::max);

    if !min.is_finite() || !max.is_finite() {
        return vec![0; values.len()];
    }

    let range = max - min;
    values
        .iter()
        .map(|&v| {
            if !v.is_finite() {
                0
            } else if range <= f64::EPSILON {
                (SPARKLINE_LEVELS / 2.0).round() as u64
            } else {
                ((v - min) / range * SPARKLINE_LEVELS).round() as u64
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(ph: f64, tds: f64) -> Reading {
        Reading::builder()
            .ph(ph)
            .temperature(22.0)
            .turbidity(0.5)
            .tds(tds)
            .build()
    }

    #[test]
    fn test_parameter_stats() {
        let readings = vec![reading(7.0, 300.0), reading(7.4, 100.0), reading(6.6, 200.0)];
        let stats = ParameterStats::compute(&readings, Parameter::Ph).unwrap();
        assert_eq!(stats.min, 6.6);
        assert_eq!(stats.max, 7.4);
        assert!((stats.avg - 7.0).abs() < 1e-9);

        assert!(ParameterStats::compute(&[], Parameter::Ph).is_none());
    }

    #[test]
    fn test_stats_skip_non_finite() {
        let readings = vec![reading(f64::NAN, 300.0), reading(7.0, 300.0)];
        let stats = ParameterStats::compute(&readings, Parameter::Ph).unwrap();
        assert_eq!(stats.min, 7.0);
        assert_eq!(stats.max, 7.0);
    }

    #[test]
    fn test_status_distribution() {
        let readings = vec![
            reading(7.0, 300.0),  // good
            reading(6.7, 300.0),  // warning
            reading(7.0, 2000.0), // critical
            reading(7.0, 250.0),  // good
        ];
        let dist = StatusDistribution::compute(&readings, &ThresholdPolicy::default());
        assert_eq!(dist, StatusDistribution { good: 2, warning: 1, critical: 1 });
        assert_eq!(dist.percent(Status::Good), 50.0);
        assert_eq!(StatusDistribution::default().percent(Status::Critical), 0.0);
    }

    #[test]
    fn test_sparkline_normalization() {
        assert!(sparkline(&[1.0]).is_empty());
        assert_eq!(sparkline(&[0.0, 7.0, 3.5]), vec![0, 7, 4]);
        assert_eq!(sparkline(&[5.0, 5.0, 5.0]), vec![4, 4, 4]);
        assert_eq!(sparkline(&[f64::NAN, 1.0, 2.0]), vec![0, 0, 7]);
    }
}
