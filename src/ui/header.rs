use crate::constants::WIDGET_TITLE;
use crate::models::ConnectionState;
use crate::session::BootstrapStatus;
use crate::App;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn draw_header(f: &mut Frame<'_>, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::LightBlue))
        .title(Span::styled(
            format!(" 💬 {} ", WIDGET_TITLE),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);

    let paragraph = Paragraph::new(status_line(app))
        .block(block)
        .alignment(Alignment::Center);

    f.render_widget(paragraph, area);
}

fn status_line(app: &App) -> Line<'static> {
    let (text, color) = match (app.session.bootstrap(), app.session.state()) {
        (_, ConnectionState::Connected) => ("● Connected".to_string(), Color::LightGreen),
        (BootstrapStatus::Pending, _) => ("○ Requesting session...".to_string(), Color::Yellow),
        (BootstrapStatus::Failed(_), _) => ("✗ Offline".to_string(), Color::Red),
        (BootstrapStatus::Ready, ConnectionState::Disconnected) => {
            if app.session.attempts() <= 1 {
                ("○ Connecting...".to_string(), Color::Yellow)
            } else {
                (
                    format!("○ Reconnecting (attempt {})", app.session.attempts()),
                    Color::Yellow,
                )
            }
        }
    };

    Line::from(Span::styled(text, Style::default().fg(color)))
}
