use crate::chat::{ChatMessage, Sender};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};
use textwrap::wrap;

const USER_INDENT: &str = "  ";

/// Renders one chat turn as a boxed block of lines, wrapped to `width` columns.
pub fn render_message(message: &ChatMessage, width: u16) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let style = base_style(message.sender());
    let indent = indent_for(message.sender());

    render_header(&mut lines, message, style, indent);
    render_content(&mut lines, message.text(), width, style, indent);
    lines.push(Line::from(vec![
        Span::styled(indent.to_string(), style),
        Span::styled("╰─".to_string(), style),
    ]));

    lines
}

fn base_style(sender: Sender) -> Style {
    Style::default().fg(match sender {
        Sender::User => Color::Rgb(255, 223, 128),
        Sender::Bot => Color::Rgb(144, 238, 144),
    })
}

fn indent_for(sender: Sender) -> &'static str {
    match sender {
        Sender::User => USER_INDENT,
        Sender::Bot => "",
    }
}

fn render_header(lines: &mut Vec<Line<'static>>, message: &ChatMessage, style: Style, indent: &str) {
    let timestamp = message.timestamp().format("%H:%M").to_string();

    lines.push(Line::from(vec![
        Span::styled(indent.to_string(), style),
        Span::styled("┌─ ".to_string(), style),
        Span::styled(
            format!("{}:", message.sender().label()),
            style.add_modifier(Modifier::BOLD),
        ),
        Span::styled(" ", style),
        Span::styled(timestamp, style.add_modifier(Modifier::DIM)),
    ]));
}

fn render_content(
    lines: &mut Vec<Line<'static>>,
    text: &str,
    width: u16,
    style: Style,
    indent: &str,
) {
    let mut in_code_block = false;
    let mut code_buffer = String::new();
    let mut text_buffer = String::new();

    for line in text.lines() {
        if line.trim().starts_with("```") {
            flush_text_buffer(lines, &text_buffer, width, style, indent);
            flush_code_buffer(lines, &code_buffer, style, indent);
            text_buffer.clear();
            code_buffer.clear();
            in_code_block = !in_code_block;
            continue;
        }

        let buffer = if in_code_block {
            &mut code_buffer
        } else {
            &mut text_buffer
        };
        buffer.push_str(line);
        buffer.push('\n');
    }

    flush_text_buffer(lines, &text_buffer, width, style, indent);
    flush_code_buffer(lines, &code_buffer, style, indent);
}

fn flush_text_buffer(
    lines: &mut Vec<Line<'static>>,
    buffer: &str,
    width: u16,
    style: Style,
    indent: &str,
) {
    if buffer.is_empty() {
        return;
    }

    let wrap_width = (width as usize)
        .saturating_sub(indent.len() + 2)
        .max(1);

    for paragraph in buffer.lines() {
        if paragraph.is_empty() {
            lines.push(Line::from(vec![
                Span::styled(indent.to_string(), style),
                Span::styled("│".to_string(), style),
            ]));
            continue;
        }
        for wrapped_line in wrap(paragraph, wrap_width) {
            lines.push(Line::from(vec![
                Span::styled(indent.to_string(), style),
                Span::styled("│ ".to_string(), style),
                Span::styled(wrapped_line.to_string(), style),
            ]));
        }
    }
}

fn flush_code_buffer(lines: &mut Vec<Line<'static>>, buffer: &str, style: Style, indent: &str) {
    if buffer.is_empty() {
        return;
    }

    let code_style = Style::default()
        .fg(Color::Rgb(209, 154, 102))
        .add_modifier(Modifier::BOLD);

    for code_line in buffer.lines() {
        lines.push(Line::from(vec![
            Span::styled(indent.to_string(), style),
            Span::styled("│ ".to_string(), style),
            Span::styled("▎".to_string(), Style::default().fg(Color::DarkGray)),
            Span::styled(format!(" {}", code_line), code_style),
        ]));
    }
}
