//! Notifications view rendering.

use chrono::Utc;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::app::{format_local, App};
use crate::data::duration::format_age;

/// Render the Notifications view: the log on top, the selected entry below.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let log = &app.notifications;

    let block = Block::default()
        .title(format!(
            " Notifications ({} · {} unread) ",
            log.len(),
            log.unread_count()
        ))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if log.is_empty() {
        frame.render_widget(
            Paragraph::new("No notifications. Alerts are logged here when they first appear.")
                .block(block),
            area,
        );
        return;
    }

    let chunks = Layout::vertical([Constraint::Min(4), Constraint::Length(5)]).split(area);

    let header = Row::new(vec![
        Cell::from(" "),
        Cell::from("Severity"),
        Cell::from("Title"),
        Cell::from("Raised"),
    ])
    .height(1)
    .style(app.theme.header);

    let now = Utc::now();
    let rows: Vec<Row> = log
        .entries()
        .map(|n| {
            let marker = if n.read { " " } else { "●" };
            let text_style = if n.read {
                Style::default().add_modifier(Modifier::DIM)
            } else {
                Style::default().add_modifier(Modifier::BOLD)
            };
            Row::new(vec![
                Cell::from(Span::styled(marker, Style::default().fg(app.theme.highlight))),
                Cell::from(Span::styled(
                    n.severity.to_string(),
                    app.theme.severity_style(n.severity),
                )),
                Cell::from(Span::styled(n.title.clone(), text_style)),
                Cell::from(format_age(now - n.raised_at)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(1),
        Constraint::Length(9),
        Constraint::Fill(1),
        Constraint::Length(10),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default()
        .with_offset(app.notification_offset.get())
        .with_selected(Some(app.selected_notification_index));
    frame.render_stateful_widget(table, chunks[0], &mut state);
    app.notification_offset.set(state.offset());

    if let Some(n) = log.get(app.selected_notification_index) {
        let detail = Paragraph::new(vec![
            Line::from(Span::styled(n.title.clone(), app.theme.severity_style(n.severity))),
            Line::from(n.message.clone()),
            Line::from(Span::styled(
                format!("{} · {}", n.parameter.label(), format_local(n.raised_at)),
                Style::default().add_modifier(Modifier::DIM),
            )),
        ])
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        );
        frame.render_widget(detail, chunks[1]);
    }
}
