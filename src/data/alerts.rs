//! Alert synthesis and overall status aggregation.

use aquawatch_types::{Alert, MetricEvaluation, OverallStatus, Parameter, Severity, Status};

/// Derive alerts from a cycle's evaluations.
///
/// Alerts follow parameter order regardless of the order of `evaluations`.
/// Every non-good evaluation yields exactly one alert; good ones yield none.
pub fn synthesize(evaluations: &[MetricEvaluation]) -> Vec<Alert> {
    let mut sorted: Vec<&MetricEvaluation> = evaluations.iter().collect();
    sorted.sort_by_key(|e| e.parameter);

    sorted.into_iter().filter_map(alert_for).collect()
}

fn alert_for(evaluation: &MetricEvaluation) -> Option<Alert> {
    let severity = evaluation.status.severity()?;
    let parameter = evaluation.parameter;
    let key = parameter.key().to_uppercase();
    let reading = format!("{}{}", format_value(evaluation.value), evaluation.unit);

    let (title, message) = match severity {
        Severity::Critical => (
            format!("Critical: {}", key),
            format!("{} levels are at critical levels: {}", subject(parameter), reading),
        ),
        Severity::Warning => (
            format!("Warning: {}", key),
            format!("{} levels need attention: {}", subject(parameter), reading),
        ),
    };

    Some(Alert {
        severity,
        parameter,
        title,
        message,
    })
}

/// How a parameter is named inside alert messages.
fn subject(parameter: Parameter) -> &'static str {
    match parameter {
        Parameter::Tds => "TDS",
        other => other.key(),
    }
}

/// Round to two decimals and drop trailing zeros: `7.0 -> "7"`, `22.50 -> "22.5"`.
pub fn format_value(value: f64) -> String {
    let s = format!("{:.2}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Worst status across the evaluations.
pub fn overall_status(evaluations: &[MetricEvaluation]) -> OverallStatus {
    evaluations
        .iter()
        .map(|e| e.status)
        .max()
        .map_or(OverallStatus::Optimal, OverallStatus::from)
}

/// Count evaluations per non-good status, `(warnings, criticals)`.
pub fn count_issues(evaluations: &[MetricEvaluation]) -> (usize, usize) {
    evaluations.iter().fold((0, 0), |(w, c), e| match e.status {
        Status::Good => (w, c),
        Status::Warning => (w + 1, c),
        Status::Critical => (w, c + 1),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(parameter: Parameter, value: f64, status: Status) -> MetricEvaluation {
        MetricEvaluation {
            parameter,
            value,
            unit: parameter.unit().to_string(),
            status,
            trend: 0.0,
        }
    }

    #[test]
    fn test_all_good_yields_no_alerts() {
        let evaluations: Vec<_> =
            Parameter::ALL.iter().map(|p| eval(*p, 1.0, Status::Good)).collect();
        assert!(synthesize(&evaluations).is_empty());
        assert_eq!(overall_status(&evaluations), OverallStatus::Optimal);
    }

    #[test]
    fn test_one_alert_per_non_good_parameter() {
        let evaluations = vec![
            eval(Parameter::Ph, 6.7, Status::Warning),
            eval(Parameter::Temperature, 22.0, Status::Good),
            eval(Parameter::Turbidity, 7.25, Status::Critical),
            eval(Parameter::Tds, 300.0, Status::Good),
        ];

        let alerts = synthesize(&evaluations);
        assert_eq!(alerts.len(), 2);

        assert_eq!(alerts[0].severity, Severity::Warning);
        assert_eq!(alerts[0].title, "Warning: PH");
        assert_eq!(alerts[0].message, "ph levels need attention: 6.7pH");

        assert_eq!(alerts[1].severity, Severity::Critical);
        assert_eq!(alerts[1].title, "Critical: TURBIDITY");
        assert_eq!(
            alerts[1].message,
            "turbidity levels are at critical levels: 7.25NTU"
        );

        assert_eq!(overall_status(&evaluations), OverallStatus::Critical);
        assert_eq!(count_issues(&evaluations), (1, 1));
    }

    #[test]
    fn test_tds_is_named_in_capitals() {
        let alerts = synthesize(&[eval(Parameter::Tds, 1200.0, Status::Critical)]);
        assert_eq!(alerts[0].title, "Critical: TDS");
        assert_eq!(alerts[0].message, "TDS levels are at critical levels: 1200ppm");
    }

    #[test]
    fn test_alerts_follow_parameter_order() {
        let evaluations = vec![
            eval(Parameter::Tds, 40.0, Status::Critical),
            eval(Parameter::Ph, 9.0, Status::Critical),
        ];
        let alerts = synthesize(&evaluations);
        assert_eq!(alerts[0].parameter, Parameter::Ph);
        assert_eq!(alerts[1].parameter, Parameter::Tds);
    }

    #[test]
    fn test_severity_matches_status() {
        let evaluations = vec![
            eval(Parameter::Ph, 6.7, Status::Warning),
            eval(Parameter::Temperature, 40.0, Status::Critical),
        ];
        for (alert, evaluation) in synthesize(&evaluations).iter().zip(&evaluations) {
            assert_eq!(alert.severity.status(), evaluation.status);
        }
    }

    #[test]
    fn test_warning_overall() {
        let evaluations = vec![
            eval(Parameter::Ph, 6.7, Status::Warning),
            eval(Parameter::Tds, 300.0, Status::Good),
        ];
        assert_eq!(overall_status(&evaluations), OverallStatus::Warning);
        assert_eq!(overall_status(&[]), OverallStatus::Optimal);
    }

    #[test]
    fn test_synthesize_is_idempotent() {
        let evaluations = vec![eval(Parameter::Ph, 9.0, Status::Critical)];
        assert_eq!(synthesize(&evaluations), synthesize(&evaluations));
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(7.0), "7");
        assert_eq!(format_value(22.5), "22.5");
        assert_eq!(format_value(0.123456), "0.12");
        assert_eq!(format_value(-0.001), "0");
        assert_eq!(format_value(100.0), "100");
    }
}
