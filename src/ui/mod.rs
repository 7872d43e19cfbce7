//! Terminal UI rendering using ratatui.
//!
//! Each view is implemented in its own submodule with a `render` function.
//!
//! ## Submodules
//!
//! - [`dashboard`]: Overall status, metric cards, active alerts and sparklines
//! - [`history`]: Readings table with quality assessment, statistics and recommendations
//! - [`notifications`]: Log of alert onsets with read state
//! - [`thresholds`]: The active threshold policy
//! - [`about`]: Version, data source and refresh settings
//! - [`common`]: Shared components (header, tabs, status bar, help overlay)
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Rendering Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Tabs (common::render_tabs)           │
//! ├──────────────────────────────────────┤
//! │                                      │
//! │ View Content (<view>::render)        │
//! │                                      │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    common::render_help drawn on top
//! ```

pub mod about;
pub mod common;
pub mod dashboard;
pub mod history;
pub mod notifications;
pub mod theme;
pub mod thresholds;

pub use theme::Theme;

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, View};

/// Minimum terminal size for usable display.
pub const MIN_WIDTH: u16 = 60;
pub const MIN_HEIGHT: u16 = 16;

/// Row where view content starts (after header and tabs).
pub const CONTENT_START_ROW: u16 = 2;

/// Draw a full frame.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = format!(
            "Terminal too small: {}x{}\nMinimum: {}x{}\n\nResize to continue",
            area.width, area.height, MIN_WIDTH, MIN_HEIGHT
        );
        let paragraph = Paragraph::new(msg)
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::Yellow));
        let centered = Rect::new(0, (area.height / 2).saturating_sub(2), area.width, 5.min(area.height));
        frame.render_widget(paragraph, centered);
        return;
    }

    let chunks = Layout::vertical([
        Constraint::Length(1), // Header bar
        Constraint::Length(1), // Tabs
        Constraint::Min(8),    // Content
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    common::render_header(frame, app, chunks[0]);
    common::render_tabs(frame, app, chunks[1]);

    match app.current_view {
        View::Dashboard => dashboard::render(frame, app, chunks[2]),
        View::History => history::render(frame, app, chunks[2]),
        View::Notifications => notifications::render(frame, app, chunks[2]),
        View::Thresholds => thresholds::render(frame, app, chunks[2]),
        View::About => about::render(frame, app, chunks[2]),
    }

    common::render_status_bar(frame, app, chunks[3]);

    if app.show_help {
        common::render_help(frame, app, area);
    }
}

/// A centered placeholder used when a view has nothing to show.
pub(crate) fn render_placeholder(frame: &mut Frame, app: &App, area: Rect, text: &str) {
    let paragraph = Paragraph::new(text.to_string())
        .alignment(Alignment::Center)
        .style(Style::default().fg(app.theme.border));
    let y = area.y + area.height / 2;
    frame.render_widget(paragraph, Rect::new(area.x, y, area.width, 1));
}
