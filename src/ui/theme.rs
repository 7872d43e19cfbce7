//! Theme configuration for the TUI.
//!
//! Supports light and dark themes with automatic terminal detection.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use aquawatch_types::{OverallStatus, Severity, Status};

use crate::config::ThemeChoice;
use crate::data::Assessment;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] for automatic theme selection based on
/// terminal background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights and active elements.
    pub highlight: Color,
    /// Color for warning status.
    pub warning: Color,
    /// Color for critical status.
    pub critical: Color,
    /// Color for good status.
    pub good: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Style for header rows in tables.
    pub header: Style,
    /// Style for selected/highlighted rows.
    pub selected: Style,
    /// Style for the active tab.
    pub tab_active: Style,
    /// Style for inactive tabs.
    pub tab_inactive: Style,
    /// Border style (rounded, plain, etc.).
    pub border_type: BorderType,
}

impl Theme {
    /// Create a dark theme suitable for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            warning: Color::Yellow,
            critical: Color::Red,
            good: Color::Green,
            border: Color::Gray,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            border_type: BorderType::Rounded,
        }
    }

    /// Create a light theme suitable for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            warning: Color::Yellow,
            critical: Color::Red,
            good: Color::Green,
            border: Color::DarkGray,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Theme for a configured choice.
    pub fn from_choice(choice: ThemeChoice) -> Self {
        match choice {
            ThemeChoice::Auto => Self::auto_detect(),
            ThemeChoice::Dark => Self::dark(),
            ThemeChoice::Light => Self::light(),
        }
    }

    /// Get style for a metric status
    pub fn status_style(&self, status: Status) -> Style {
        match status {
            Status::Good => Style::default().fg(self.good),
            Status::Warning => Style::default().fg(self.warning),
            Status::Critical => Style::default().fg(self.critical).add_modifier(Modifier::BOLD),
        }
    }

    pub fn overall_style(&self, overall: OverallStatus) -> Style {
        match overall {
            OverallStatus::Optimal => self.status_style(Status::Good),
            OverallStatus::Warning => self.status_style(Status::Warning),
            OverallStatus::Critical => self.status_style(Status::Critical),
        }
    }

    pub fn severity_style(&self, severity: Severity) -> Style {
        self.status_style(severity.status())
    }

    /// Get style for a water-quality assessment
    pub fn assessment_style(&self, assessment: Assessment) -> Style {
        match assessment {
            Assessment::Safe => self.status_style(Status::Good),
            Assessment::Monitor => self.status_style(Status::Warning),
            Assessment::ActionRequired => self.status_style(Status::Critical),
        }
    }
}
