use crate::constants::{INPUT_PLACEHOLDER, SEND_LABEL};
use crate::App;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub fn draw_input(f: &mut Frame<'_>, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(SEND_LABEL.len() as u16 + 2),
        ])
        .split(area);

    let enabled = app.input_enabled();
    let border_color = if enabled { Color::LightBlue } else { Color::DarkGray };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(border_color));

    // One column is kept free for the cursor.
    let room = chunks[0].width.saturating_sub(3) as usize;
    let visible = visible_tail(&app.input, room);
    let visible_width = UnicodeWidthStr::width(visible);

    let content = if app.input.is_empty() {
        Line::from(Span::styled(
            INPUT_PLACEHOLDER,
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ))
    } else {
        Line::from(Span::styled(
            visible.to_string(),
            Style::default().fg(if enabled { Color::White } else { Color::DarkGray }),
        ))
    };

    f.render_widget(
        Paragraph::new(content).block(input_block),
        chunks[0],
    );

    let button_style = if enabled {
        Style::default()
            .fg(Color::Black)
            .bg(Color::LightBlue)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let button = Paragraph::new(SEND_LABEL)
        .style(button_style)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(border_color)),
        );
    f.render_widget(button, chunks[1]);
    app.send_button = chunks[1];

    if enabled {
        let offset = u16::try_from(visible_width.min(room)).unwrap_or(0);
        let cursor_x = chunks[0].x.saturating_add(1).saturating_add(offset);
        f.set_cursor_position((cursor_x, chunks[0].y + 1));
    }
}

/// Longest suffix of `input` that fits in `room` columns.
fn visible_tail(input: &str, room: usize) -> &str {
    let mut width = 0;
    let mut start = input.len();
    for (idx, c) in input.char_indices().rev() {
        width += UnicodeWidthChar::width(c).unwrap_or(0);
        if width > room {
            break;
        }
        start = idx;
    }
    &input[start..]
}
