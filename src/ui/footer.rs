use crate::session::BootstrapStatus;
use crate::App;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Style},
    widgets::Paragraph,
    Frame,
};

/// Draws the footer with key hints, or the reason the session could not start.
pub fn draw_footer(f: &mut Frame<'_>, area: Rect, app: &App) {
    let footer = match app.session.bootstrap() {
        BootstrapStatus::Failed(reason) => Paragraph::new(format!(
            "Restart to try again · {}",
            reason
        ))
        .style(Style::default().fg(Color::Red)),
        _ => Paragraph::new("Enter to send · PgUp/PgDn to scroll · Esc to quit")
            .style(Style::default().fg(Color::LightCyan)),
    };

    f.render_widget(footer.alignment(Alignment::Center), area);
}
