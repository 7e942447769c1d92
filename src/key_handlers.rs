use crate::App;
use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

const PAGE: u16 = 10;

pub fn handle_chat_input(key: KeyEvent, app: &mut App) {
    if key.kind == KeyEventKind::Release {
        return;
    }

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }
        KeyCode::Enter => {
            app.submit();
        }
        KeyCode::PageUp => app.scroll_up(PAGE),
        KeyCode::PageDown => app.scroll_down(PAGE),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        // The input box is disabled while disconnected.
        KeyCode::Backspace if app.input_enabled() => {
            app.input.pop();
        }
        KeyCode::Char(c) if app.input_enabled() => {
            if !key.modifiers.contains(KeyModifiers::CONTROL) {
                app.input.push(c);
            }
        }
        _ => {}
    }
}

pub fn handle_mouse_input(mouse: MouseEvent, app: &mut App) {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) if app.send_button_hit(mouse.column, mouse.row) => {
            app.submit();
        }
        MouseEventKind::ScrollUp => app.scroll_up(1),
        MouseEventKind::ScrollDown => app.scroll_down(1),
        _ => {}
    }
}
