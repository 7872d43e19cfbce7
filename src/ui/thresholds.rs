//! Thresholds view rendering.

use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    text::Span,
    widgets::{Block, Borders, Cell, Row, Table},
    Frame,
};

use aquawatch_types::{Parameter, Status};

use crate::app::App;
use crate::data::{format_value, Band};

/// Render the active threshold policy, one row per parameter.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let header = Row::new(vec![
        Cell::from("Parameter"),
        Cell::from("Unit"),
        Cell::from("Critical below"),
        Cell::from("Good range"),
        Cell::from("Critical above"),
        Cell::from("Current"),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = Parameter::ALL
        .iter()
        .map(|&parameter| {
            let band = app.policy.band(parameter);
            let current = app
                .state
                .evaluations
                .iter()
                .find(|e| e.parameter == parameter)
                .map(|e| {
                    Span::styled(
                        format!("{} ({})", format_value(e.value), e.status),
                        app.theme.status_style(e.status),
                    )
                })
                .unwrap_or_else(|| Span::raw("-"));

            Row::new(vec![
                Cell::from(parameter.label()),
                Cell::from(parameter.unit()),
                Cell::from(Span::styled(
                    bound(band.critical_low),
                    app.theme.status_style(Status::Critical),
                )),
                Cell::from(Span::styled(good_range(band), app.theme.status_style(Status::Good))),
                Cell::from(Span::styled(
                    bound(band.critical_high),
                    app.theme.status_style(Status::Critical),
                )),
                Cell::from(current),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(13),
        Constraint::Length(5),
        Constraint::Length(15),
        Constraint::Fill(1),
        Constraint::Length(15),
        Constraint::Length(18),
    ];

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(" Thresholds · values between good and critical raise a warning ")
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border)),
    );

    frame.render_widget(table, area);
}

fn bound(value: Option<f64>) -> String {
    value.map(format_value).unwrap_or_else(|| "-".to_string())
}

/// The good range of a band, e.g. "6.8 – 8.2" or "< 1".
fn good_range(band: &Band) -> String {
    match (band.warning_low, band.warning_high) {
        (Some(low), Some(high)) => format!("{} – {}", format_value(low), format_value(high)),
        (None, Some(high)) => format!("< {}", format_value(high)),
        (Some(low), None) => format!("> {}", format_value(low)),
        (None, None) => "any".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ThresholdPolicy;

    #[test]
    fn test_good_range() {
        let policy = ThresholdPolicy::default();
        assert_eq!(good_range(&policy.ph), "6.8 – 8.2");
        assert_eq!(good_range(&policy.turbidity), "< 1");
        assert_eq!(bound(policy.turbidity.critical_low), "-");
        assert_eq!(bound(policy.tds.critical_high), "1000");
    }
}
