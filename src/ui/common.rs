//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, and help overlay.

use chrono::Utc;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use crate::data::count_issues;
use crate::data::duration::format_age;
use crate::refresh::{LoadState, Phase};

/// Render the header bar with the overall water status.
///
/// Displays: status indicator, metric counts by status, time range, fetch activity.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = Span::styled(" AQUAWATCH ", Style::default().add_modifier(Modifier::BOLD));

    if !app.state.has_data() {
        let text = match app.state.load {
            LoadState::Loading => "Loading...",
            LoadState::NoData => "No readings",
            _ => "Unavailable",
        };
        let line = Line::from(vec![title, Span::raw("│ "), Span::raw(text)]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let state = &app.state;
    let (warnings, criticals) = count_issues(&state.evaluations);
    let good = state.evaluations.len() - warnings - criticals;

    let mut spans = vec![
        Span::styled(" ● ", app.theme.overall_style(state.overall)),
        title,
        Span::raw("│ "),
        Span::styled(state.overall.to_string(), app.theme.overall_style(state.overall)),
        Span::raw(" │ "),
        Span::styled(format!("{}", good), Style::default().fg(app.theme.good)),
        Span::raw(" ok "),
        if warnings > 0 {
            Span::styled(format!("{}", warnings), Style::default().fg(app.theme.warning))
        } else {
            Span::styled("0", Style::default().add_modifier(Modifier::DIM))
        },
        Span::raw(" warn "),
        if criticals > 0 {
            Span::styled(
                format!("{}", criticals),
                Style::default().fg(app.theme.critical).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled("0", Style::default().add_modifier(Modifier::DIM))
        },
        Span::raw(" crit │ range "),
        Span::styled(state.range.as_str(), Style::default().add_modifier(Modifier::BOLD)),
    ];

    if matches!(state.load, LoadState::Stale(_)) {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled("STALE", Style::default().fg(app.theme.warning)));
    }
    if state.phase == Phase::Fetching {
        spans.push(Span::raw(" │ "));
        spans.push(Span::styled("⟳", Style::default().fg(app.theme.highlight)));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the tab bar showing available views.
///
/// Highlights the currently active view; the Notifications tab carries the
/// unread count.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let unread = app.notifications.unread_count();
    let titles: Vec<Line> = View::ALL
        .iter()
        .enumerate()
        .map(|(i, view)| {
            if *view == View::Notifications && unread > 0 {
                Line::from(vec![
                    Span::raw(format!(" {}:{}", i + 1, view.label())),
                    Span::styled(format!("({}) ", unread), Style::default().fg(app.theme.warning)),
                ])
            } else {
                Line::from(format!(" {}:{} ", i + 1, view.label()))
            }
        })
        .collect();

    let tabs = Tabs::new(titles)
        .select(app.current_view.index())
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows: current view, time since last update, available controls.
/// Also displays temporary status messages and errors.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = match app.current_view {
        View::History if app.filter_active => "Type to search | Enter:apply Esc:cancel",
        View::History => "/:search c:clear t/T:range ↑↓:select ?:help q:quit",
        View::Notifications => "m:read M:all read d:delete ↑↓:select ?:help q:quit",
        _ => "r:refresh t/T:range Tab:switch e:export ?:help q:quit",
    };

    let status = match (&app.state.load, app.state.updated_at) {
        (LoadState::Stale(err), _) | (LoadState::Failed(err), _) => {
            format!(" Error: {} | r:retry | {}", err, controls)
        }
        (_, Some(updated)) => format!(
            " {} | Updated {} | {}",
            app.current_view.label(),
            format_age(Utc::now() - updated),
            controls
        ),
        (_, None) => format!(" Loading... | {}", controls),
    };

    let style = if app.state.error().is_some() {
        Style::default().fg(app.theme.warning)
    } else {
        Style::default().add_modifier(Modifier::DIM)
    };
    frame.render_widget(Paragraph::new(status).style(style), area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        Line::from(vec![Span::styled(" Navigation", bold)]),
        Line::from("  1-5         Jump to view"),
        Line::from("  Tab ←/→     Switch views"),
        Line::from("  ↑/↓ j/k     Navigate list"),
        Line::from("  PgUp/PgDn   Jump 10 items"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from(""),
        Line::from(vec![Span::styled(" Data", bold)]),
        Line::from("  r         Refresh now"),
        Line::from("  t / T     Next / previous time range"),
        Line::from("  /         Filter history"),
        Line::from("  c         Clear filter"),
        Line::from(""),
        Line::from(vec![Span::styled(" Notifications", bold)]),
        Line::from("  m         Mark read"),
        Line::from("  M         Mark all read"),
        Line::from("  d         Delete"),
        Line::from(""),
        Line::from(vec![Span::styled(" General", bold)]),
        Line::from("  e         Export to JSON"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 44u16.min(area.width.saturating_sub(4));
    let help_height = 27u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
