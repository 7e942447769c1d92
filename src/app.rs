use crate::session::ChatSession;
use crate::status_indicator::TypingIndicator;
use ratatui::layout::Rect;

pub struct App {
    pub session: ChatSession,
    pub input: String,
    /// Lines scrolled back from the newest message; 0 follows the conversation.
    pub scroll_back: u16,
    pub should_quit: bool,
    pub typing_indicator: TypingIndicator,
    /// Where the Send button was last drawn, for mouse hit-testing.
    pub send_button: Rect,
}

impl App {
    pub fn new(session: ChatSession) -> App {
        App {
            session,
            input: String::new(),
            scroll_back: 0,
            should_quit: false,
            typing_indicator: TypingIndicator::new(),
            send_button: Rect::default(),
        }
    }

    /// The input box and Send button are only live while connected.
    pub fn input_enabled(&self) -> bool {
        self.session.is_connected()
    }

    /// Sends the current input. Clears it only when something was actually sent.
    pub fn submit(&mut self) -> bool {
        if !self.session.send(&self.input) {
            return false;
        }
        self.input.clear();
        self.scroll_back = 0;
        true
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.scroll_back = self.scroll_back.saturating_add(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll_back = self.scroll_back.saturating_sub(lines);
    }

    pub fn on_tick(&mut self) {
        if self.session.is_typing() {
            self.typing_indicator.update_spinner();
        }
    }

    pub fn send_button_hit(&self, column: u16, row: u16) -> bool {
        let button = self.send_button;
        column >= button.x
            && column < button.x.saturating_add(button.width)
            && row >= button.y
            && row < button.y.saturating_add(button.height)
    }
}
