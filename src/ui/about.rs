//! About view rendering.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::data::duration::format_duration;

/// Render version, data source and refresh settings.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let row = |label: &'static str, value: String| {
        Line::from(vec![Span::styled(format!("  {:<16}", label), dim), Span::raw(value)])
    };

    let lines = vec![
        Line::from(Span::styled(
            format!("aquawatch {}", env!("CARGO_PKG_VERSION")),
            app.theme.header,
        )),
        Line::from(env!("CARGO_PKG_DESCRIPTION")),
        Line::from(""),
        Line::from(Span::styled(" Data", bold)),
        row("Source", app.source_description.clone()),
        row("Refresh every", format_duration(app.refresh_interval)),
        row("Time range", app.state.range.to_string()),
        row("Readings", app.state.readings.len().to_string()),
        row("Cycle", app.state.generation.to_string()),
        Line::from(""),
        Line::from(Span::styled(" Parameters", bold)),
        Line::from("  pH, temperature (°C), turbidity (NTU) and total dissolved solids (ppm)"),
        Line::from("  are classified against the policy on the Thresholds tab. The trend is"),
        Line::from("  the change from the previous reading in the selected range."),
    ];

    let block = Block::default()
        .title(" About ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).block(block), area);
}
