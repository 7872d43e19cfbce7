//! History view rendering.
//!
//! Left: readings in the selected range with a per-row quality assessment.
//! Right: window statistics, status distribution, and gauges plus
//! recommendations for the selected reading.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use aquawatch_types::{Parameter, Reading, Status};

use crate::app::{format_local, App};
use crate::data::quality::{ph_gauge, tds_gauge, turbidity_gauge};
use crate::data::{assess, format_value, recommendations, ParameterStats, StatusDistribution};

/// Render the History view.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let columns = Layout::horizontal([Constraint::Percentage(58), Constraint::Percentage(42)])
        .split(area);

    render_table(frame, app, columns[0]);

    let side = Layout::vertical([
        Constraint::Length(7), // Stats
        Constraint::Length(5), // Distribution
        Constraint::Min(6),    // Selected reading
    ])
    .split(columns[1]);

    render_stats(frame, app, side[0]);
    render_distribution(frame, app, side[1]);
    render_selected(frame, app, side[2]);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let readings = app.filtered_readings();

    let title = if app.filter_text.is_empty() {
        format!(" Readings ({}) · {} ", readings.len(), app.state.range)
    } else {
        format!(
            " Readings ({}/{}) · {} · filter: {}{} ",
            readings.len(),
            app.state.readings.len(),
            app.state.range,
            app.filter_text,
            if app.filter_active { "_" } else { "" }
        )
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if readings.is_empty() {
        let text = if app.state.readings.is_empty() {
            "No readings in this range"
        } else {
            "No readings match the filter"
        };
        frame.render_widget(Paragraph::new(text).block(block), area);
        return;
    }

    let header = Row::new(vec![
        Cell::from("Time"),
        Cell::from("pH"),
        Cell::from("°C"),
        Cell::from("NTU"),
        Cell::from("ppm"),
        Cell::from("Quality"),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = readings
        .iter()
        .map(|reading| {
            let assessment = assess(reading);
            let mut cells = vec![Cell::from(format_local(reading.created_at))];
            cells.extend(Parameter::ALL.iter().map(|&p| value_cell(app, reading, p)));
            cells.push(Cell::from(Span::styled(
                assessment.to_string(),
                app.theme.assessment_style(assessment),
            )));
            Row::new(cells)
        })
        .collect();

    let widths = [
        Constraint::Length(19),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Length(15),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default()
        .with_offset(app.history_offset.get())
        .with_selected(Some(app.selected_reading_index));

    frame.render_stateful_widget(table, area, &mut state);
    app.history_offset.set(state.offset());
}

fn value_cell<'a>(app: &App, reading: &Reading, parameter: Parameter) -> Cell<'a> {
    let value = reading.value(parameter);
    let status = app.policy.classify(parameter, value);
    let style = if status == Status::Good {
        Style::default()
    } else {
        app.theme.status_style(status)
    };
    Cell::from(Span::styled(format_value(value), style))
}

fn render_stats(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Statistics ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let mut lines = vec![Line::from(Span::styled(
        format!("{:<12}{:>9}{:>9}{:>9}", "", "min", "avg", "max"),
        app.theme.header,
    ))];
    for parameter in Parameter::ALL {
        let line = match ParameterStats::compute(&app.state.readings, parameter) {
            Some(stats) => format!(
                "{:<12}{:>9}{:>9}{:>9}",
                parameter.label(),
                format_value(stats.min),
                format_value(stats.avg),
                format_value(stats.max)
            ),
            None => format!("{:<12}{:>9}{:>9}{:>9}", parameter.label(), "-", "-", "-"),
        };
        lines.push(Line::from(line));
    }

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_distribution(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Status Distribution ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let dist = StatusDistribution::compute(&app.state.readings, &app.policy);
    let line = |status: Status, count: usize| {
        Line::from(vec![
            Span::styled(format!("{:<10}", status.to_string()), app.theme.status_style(status)),
            Span::raw(format!("{:>5}  {:>5.1}%", count, dist.percent(status))),
        ])
    };

    let lines = vec![
        line(Status::Good, dist.good),
        line(Status::Warning, dist.warning),
        line(Status::Critical, dist.critical),
    ];
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_selected(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Selected Reading ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let Some(reading) = app.selected_reading() else {
        frame.render_widget(Paragraph::new("No reading selected").block(block), area);
        return;
    };

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::vertical([
        Constraint::Length(2), // Assessment
        Constraint::Length(1), // pH gauge
        Constraint::Length(1), // Turbidity gauge
        Constraint::Length(1), // TDS gauge
        Constraint::Min(1),    // Recommendations
    ])
    .split(inner);

    let assessment = assess(reading);
    let style = app.theme.assessment_style(assessment);
    let header = Paragraph::new(vec![
        Line::from(Span::styled(assessment.to_string(), style.add_modifier(Modifier::BOLD))),
        Line::from(assessment.message()),
    ])
    .wrap(Wrap { trim: true });
    frame.render_widget(header, chunks[0]);

    let gauges = [
        (Parameter::Ph, ph_gauge(reading.ph)),
        (Parameter::Turbidity, turbidity_gauge(reading.turbidity)),
        (Parameter::Tds, tds_gauge(reading.tds)),
    ];
    for ((parameter, percent), chunk) in gauges.into_iter().zip(chunks[1..4].iter()) {
        let status = app.policy.classify(parameter, reading.value(parameter));
        let gauge = Gauge::default()
            .gauge_style(app.theme.status_style(status))
            .percent(percent)
            .label(format!(
                "{} {} {}",
                parameter.label(),
                format_value(reading.value(parameter)),
                parameter.unit()
            ));
        frame.render_widget(gauge, *chunk);
    }

    let lines: Vec<Line> = recommendations(reading)
        .into_iter()
        .map(|text| Line::from(format!("• {}", text)))
        .collect();
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), chunks[4]);
}
