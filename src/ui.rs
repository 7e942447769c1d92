// src/ui.rs

pub mod chat;
pub mod footer;
pub mod header;
pub mod input;

use crate::App;
use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

/// Renders the whole widget: header, message list, typing line, input row, footer.
pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(1),    // Messages
            Constraint::Length(1), // Typing indicator
            Constraint::Length(3), // Input + Send
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    header::draw_header(f, chunks[0], app);
    chat::draw_messages(f, chunks[1], app);
    app.typing_indicator
        .render(f, chunks[2], app.session.is_typing());
    input::draw_input(f, chunks[3], app);
    footer::draw_footer(f, chunks[4], app);
}
