//! Chart-ready series derived from a window of readings.

use crate::Parameter;

/// One labelled line of a chart.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Series {
    pub label: String,
    pub parameter: Parameter,
    /// Values index-aligned with [`ChartSeries::timestamps`].
    pub values: Vec<f64>,
}

/// Chronologically ordered chart data for all parameters.
///
/// An empty `ChartSeries` (no timestamps, no series) means "nothing to plot".
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChartSeries {
    pub timestamps: Vec<String>,
    pub series: Vec<Series>,
}

impl ChartSeries {
    /// An empty chart.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if there is nothing to plot.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Number of points per series.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Get the series for a parameter.
    pub fn get(&self, parameter: Parameter) -> Option<&Series> {
        self.series.iter().find(|s| s.parameter == parameter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_parameter() {
        let chart = ChartSeries {
            timestamps: vec!["12:00:00".into(), "12:05:00".into()],
            series: vec![Series {
                label: Parameter::Tds.series_label().into(),
                parameter: Parameter::Tds,
                values: vec![300.0, 310.0],
            }],
        };
        assert_eq!(chart.len(), 2);
        assert!(!chart.is_empty());
        assert_eq!(chart.get(Parameter::Tds).unwrap().values[1], 310.0);
        assert!(chart.get(Parameter::Ph).is_none());
        assert!(ChartSeries::empty().is_empty());
    }
}
