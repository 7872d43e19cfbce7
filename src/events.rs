use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::{App, View};

/// File written by the in-app export key.
pub const EXPORT_FILE: &str = "aquawatch_export.json";

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    if app.filter_active {
        handle_filter_input(app, key);
        return;
    }

    match key.code {
        KeyCode::Char('q') => app.quit(),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => app.quit(),

        // View switching
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_view();
            } else {
                app.next_view();
            }
        }
        KeyCode::BackTab => app.prev_view(),
        KeyCode::Left | KeyCode::Char('h') => app.prev_view(),
        KeyCode::Right | KeyCode::Char('l') => app.next_view(),
        KeyCode::Char(c @ '1'..='5') => {
            let index = c as usize - '1' as usize;
            app.set_view(View::ALL[index]);
        }

        // List navigation
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),

        KeyCode::Char('r') => app.refresh(),

        // Time range
        KeyCode::Char('t') => app.next_range(),
        KeyCode::Char('T') => app.prev_range(),

        // Filter (History view)
        KeyCode::Char('/') => app.start_filter(),
        KeyCode::Char('c') => {
            if !app.filter_text.is_empty() {
                app.clear_filter();
            }
        }
        KeyCode::Esc => {
            if !app.filter_text.is_empty() {
                app.clear_filter();
            } else {
                app.set_view(View::Dashboard);
            }
        }

        // Notifications
        KeyCode::Char('m') if app.current_view == View::Notifications => app.mark_selected_read(),
        KeyCode::Char('M') => app.mark_all_read(),
        KeyCode::Char('d') | KeyCode::Delete if app.current_view == View::Notifications => {
            app.delete_selected()
        }

        KeyCode::Char('?') => app.toggle_help(),

        KeyCode::Char('e') => {
            let export_path = PathBuf::from(EXPORT_FILE);
            match app.export_state(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }

        _ => {}
    }
}

/// Handle key input while filter is active
fn handle_filter_input(app: &mut App, key: KeyEvent) {
    match key.code {
        // Confirm filter
        KeyCode::Enter => {
            app.filter_active = false;
        }

        // Cancel filter (keep text but exit input mode)
        KeyCode::Esc => {
            app.cancel_filter();
        }

        // Clear and exit
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.clear_filter();
        }

        KeyCode::Backspace => {
            app.filter_pop();
            if app.filter_text.is_empty() {
                app.filter_active = false;
            }
        }

        KeyCode::Char(c) => {
            app.filter_push(c);
        }

        _ => {}
    }
}

/// Handle mouse events
///
/// `content_start_row` is the first row of the content area; list views
/// draw one header row below it.
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent, content_start_row: u16) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.select_prev(),
        MouseEventKind::ScrollDown => app.select_next(),

        MouseEventKind::Down(MouseButton::Left) => {
            let clicked_row = mouse.row;

            // Tab bar sits on the row above the content
            if clicked_row + 1 == content_start_row {
                if let Some(view) = tab_at(mouse.column) {
                    app.set_view(view);
                }
                return;
            }

            // Border and table header precede the first item
            if clicked_row > content_start_row + 1 {
                app.select_visible_row((clicked_row - content_start_row - 2) as usize);
            }
        }

        _ => {}
    }
}

/// The view whose tab title covers a column of the tab bar.
fn tab_at(column: u16) -> Option<View> {
    let mut start = 0u16;
    for view in View::ALL {
        // " n:Label " plus the divider
        let width = view.label().len() as u16 + 4 + 1;
        if column < start + width {
            return Some(view);
        }
        start += width;
    }
    None
}
