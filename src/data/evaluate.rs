//! Per-cycle evaluation of the latest reading.

use aquawatch_types::{MetricEvaluation, Parameter, Reading};

use super::classify::ThresholdPolicy;
use super::trend::trend;

/// Evaluate every parameter of `latest`, in parameter order.
///
/// Trends compare against `previous` when one is available. The result always
/// holds exactly one evaluation per parameter.
pub fn evaluate(
    policy: &ThresholdPolicy,
    latest: &Reading,
    previous: Option<&Reading>,
) -> Vec<MetricEvaluation> {
    Parameter::ALL
        .iter()
        .map(|&parameter| {
            let value = latest.value(parameter);
            MetricEvaluation {
                parameter,
                value,
                unit: parameter.unit().to_string(),
                status: policy.classify(parameter, value),
                trend: trend(value, previous.map(|p| p.value(parameter))),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aquawatch_types::Status;

    fn reading(ph: f64, temperature: f64, turbidity: f64, tds: f64) -> Reading {
        Reading::builder()
            .ph(ph)
            .temperature(temperature)
            .turbidity(turbidity)
            .tds(tds)
            .build()
    }

    #[test]
    fn test_one_evaluation_per_parameter() {
        let evaluations = evaluate(
            &ThresholdPolicy::default(),
            &reading(7.0, 22.0, 0.5, 300.0),
            None,
        );
        let parameters: Vec<Parameter> = evaluations.iter().map(|e| e.parameter).collect();
        assert_eq!(parameters, Parameter::ALL.to_vec());
        assert!(evaluations.iter().all(|e| e.trend == 0.0));
        assert!(evaluations.iter().all(|e| e.status == Status::Good));
    }

    #[test]
    fn test_trend_against_previous() {
        let latest = reading(7.0, 22.0, 0.5, 300.0);
        let previous = reading(7.2, 22.0, 0.5, 300.0);
        let evaluations = evaluate(&ThresholdPolicy::default(), &latest, Some(&previous));

        let ph = &evaluations[0];
        assert_eq!(ph.status, Status::Good);
        assert_eq!(ph.unit, "pH");
        assert!((ph.trend + 2.78).abs() < 0.01, "got {}", ph.trend);
        assert_eq!(evaluations[1].trend, 0.0);
    }

    #[test]
    fn test_mixed_statuses() {
        let evaluations = evaluate(
            &ThresholdPolicy::default(),
            &reading(6.7, 22.0, 6.0, 300.0),
            None,
        );
        let statuses: Vec<Status> = evaluations.iter().map(|e| e.status).collect();
        assert_eq!(
            statuses,
            vec![Status::Warning, Status::Good, Status::Critical, Status::Good]
        );
    }
}
