//! Dashboard view rendering.
//!
//! Shows one card per parameter, the active alerts, and a sparkline of each
//! parameter over the selected time range.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use aquawatch_types::{MetricEvaluation, Parameter};

use crate::app::{format_local, App};
use crate::data::{format_value, sparkline};
use crate::refresh::LoadState;

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Render the Dashboard view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    if !app.state.has_data() {
        let text = match &app.state.load {
            LoadState::Loading => "Loading readings...".to_string(),
            LoadState::NoData => "No readings available".to_string(),
            LoadState::Failed(e) | LoadState::Stale(e) => format!("Failed to load readings: {}", e),
            LoadState::Ready => "No metrics".to_string(),
        };
        super::render_placeholder(frame, app, area, &text);
        return;
    }

    let chunks = Layout::vertical([
        Constraint::Length(6), // Metric cards
        Constraint::Min(4),    // Trends + alerts
    ])
    .split(area);

    render_cards(frame, app, chunks[0]);

    let lower = Layout::horizontal([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[1]);
    render_trends(frame, app, lower[0]);
    render_alerts(frame, app, lower[1]);
}

fn render_cards(frame: &mut Frame, app: &App, area: Rect) {
    let cells = Layout::horizontal([Constraint::Ratio(1, 4); 4]).split(area);

    for (evaluation, cell) in app.state.evaluations.iter().zip(cells.iter()) {
        let status_style = app.theme.status_style(evaluation.status);
        let block = Block::default()
            .title(format!(" {} ", evaluation.parameter.label()))
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(status_style);

        let lines = vec![
            Line::from(vec![
                Span::styled(
                    format_value(evaluation.value),
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(format!(" {}", evaluation.unit)),
            ]),
            Line::from(Span::styled(evaluation.status.to_string(), status_style)),
            Line::from(Span::styled(
                format_trend(evaluation.trend),
                Style::default().add_modifier(Modifier::DIM),
            )),
        ];

        frame.render_widget(Paragraph::new(lines).block(block), *cell);
    }
}

fn render_trends(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.state.latest {
        Some(ref latest) => format!(
            " Trends ({}) · last reading {} ",
            app.state.range,
            format_local(latest.created_at)
        ),
        None => format!(" Trends ({}) ", app.state.range),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let label_width = 18;
    let width = (block.inner(area).width as usize).saturating_sub(label_width + 1);

    let lines: Vec<Line> = Parameter::ALL
        .iter()
        .map(|&parameter| {
            let values = app
                .state
                .chart
                .get(parameter)
                .map(|s| s.values.as_slice())
                .unwrap_or_default();
            let style = evaluation_for(&app.state.evaluations, parameter)
                .map(|e| app.theme.status_style(e.status))
                .unwrap_or_default();
            Line::from(vec![
                Span::raw(format!("{:<width$} ", parameter.series_label(), width = label_width)),
                Span::styled(sparkline_text(values, width), style),
            ])
        })
        .collect();

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_alerts(frame: &mut Frame, app: &App, area: Rect) {
    let alerts = &app.state.alerts;
    let block = Block::default()
        .title(format!(" Alerts ({}) ", alerts.len()))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if alerts.is_empty() {
        let paragraph = Paragraph::new(Span::styled(
            "All parameters within range",
            Style::default().fg(app.theme.good),
        ))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let items: Vec<ListItem> = alerts
        .iter()
        .map(|alert| {
            let style = app.theme.severity_style(alert.severity);
            ListItem::new(vec![
                Line::from(Span::styled(alert.title.clone(), style)),
                Line::from(format!("  {}", alert.message)),
            ])
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn evaluation_for(evaluations: &[MetricEvaluation], parameter: Parameter) -> Option<&MetricEvaluation> {
    evaluations.iter().find(|e| e.parameter == parameter)
}

/// Format a trend percentage with a direction arrow.
pub fn format_trend(trend: f64) -> String {
    if trend > 0.0 {
        format!("▲ {:.1}%", trend)
    } else if trend < 0.0 {
        format!("▼ {:.1}%", trend.abs())
    } else {
        "─ 0.0%".to_string()
    }
}

/// Render the most recent `width` values as sparkline characters.
pub fn sparkline_text(values: &[f64], width: usize) -> String {
    let start = values.len().saturating_sub(width);
    let levels = sparkline(&values[start..]);
    if levels.is_empty() {
        return "-".to_string();
    }
    levels
        .iter()
        .map(|&level| SPARKLINE_CHARS[level.min(7) as usize])
        .collect()
}
