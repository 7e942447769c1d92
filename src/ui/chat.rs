use crate::chat_message::render_message;
use crate::App;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::Line,
    widgets::Paragraph,
    Frame,
};

pub fn draw_messages(f: &mut Frame<'_>, area: Rect, app: &mut App) {
    let feed = app.session.messages();
    if feed.is_empty() {
        let empty = Paragraph::new("No messages yet. Say hello!")
            .style(
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            )
            .alignment(Alignment::Center);
        f.render_widget(empty, area);
        return;
    }

    let mut lines: Vec<Line<'static>> = Vec::new();
    for message in feed.iter() {
        if !lines.is_empty() {
            lines.push(Line::from(""));
        }
        lines.extend(render_message(message, area.width));
    }

    // Follow the newest message unless the user scrolled back.
    let total_lines = u16::try_from(lines.len()).unwrap_or(u16::MAX);
    let max_scroll = total_lines.saturating_sub(area.height);
    app.scroll_back = app.scroll_back.min(max_scroll);
    let top = max_scroll - app.scroll_back;

    f.render_widget(Paragraph::new(lines).scroll((top, 0)), area);
}
