use crate::constants::{SPINNER_FRAMES, TYPING_TEXT};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// "Bot is typing..." line shown while a reveal is pending.
#[derive(Debug, Default)]
pub struct TypingIndicator {
    spinner_idx: usize,
}

impl TypingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_spinner(&mut self) {
        self.spinner_idx = self.spinner_idx.wrapping_add(1);
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, typing: bool) {
        if !typing {
            return;
        }

        let spinner = SPINNER_FRAMES[self.spinner_idx % SPINNER_FRAMES.len()];
        let status = Line::from(vec![
            Span::raw(" "),
            Span::styled(spinner, Style::default().fg(Color::LightBlue)),
            Span::raw(" "),
            Span::styled(TYPING_TEXT, Style::default().fg(Color::DarkGray)),
        ]);

        frame.render_widget(Paragraph::new(status).alignment(Alignment::Left), area);
    }
}
