use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use finchat::{
    config::Config,
    constants::TICK_RATE_MS,
    key_handlers::{handle_chat_input, handle_mouse_input},
    logging::init_logging,
    ui, App, ChatSession,
};
use log::{error, info};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    io,
    time::{Duration, Instant},
};
use tokio::sync::mpsc;

#[derive(Debug)]
enum Event {
    Input(CEvent),
    Tick,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;
    let _logger = init_logging(&config)?;
    info!("Starting finchat against {}", config.server_url);

    let session = ChatSession::start(&config)?;
    let mut app = App::new(session);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app).await;

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    app.session.shutdown().await;
    info!("finchat stopped");

    if let Err(err) = res {
        error!("UI loop failed: {:?}", err);
        eprintln!("{:?}", err);
    }

    Ok(())
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::channel::<Event>(100);
    spawn_input_reader(tx);
    // The session task ends after a credential failure; stop polling its channel then.
    let mut session_open = true;

    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        tokio::select! {
            event = rx.recv() => match next_input(event)? {
                Event::Input(CEvent::Key(key)) => handle_chat_input(key, app),
                Event::Input(CEvent::Mouse(mouse)) => handle_mouse_input(mouse, app),
                Event::Input(_) => {}
                Event::Tick => app.on_tick(),
            },
            event = app.session.next_event(), if session_open => match event {
                Some(event) => app.session.apply(event),
                None => session_open = false,
            },
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// The reader only closes its channel after a terminal error; without it the widget
/// cannot be quit, so the loop ends too.
fn next_input(event: Option<Event>) -> anyhow::Result<Event> {
    event.ok_or_else(|| anyhow::anyhow!("terminal input reader stopped"))
}

/// Polls the terminal on a blocking thread and forwards input and ticks to the UI loop.
/// Stops once the UI loop drops its receiver.
fn spawn_input_reader(tx: mpsc::Sender<Event>) {
    tokio::task::spawn_blocking(move || {
        let tick_rate = Duration::from_millis(TICK_RATE_MS);
        let mut last_tick = Instant::now();
        loop {
            let timeout = tick_rate.saturating_sub(last_tick.elapsed());
            match event::poll(timeout) {
                Ok(true) => match event::read() {
                    Ok(event) => {
                        if tx.blocking_send(Event::Input(event)).is_err() {
                            return;
                        }
                    }
                    Err(e) => {
                        error!("Failed to read terminal event: {}", e);
                        return;
                    }
                },
                Ok(false) => {}
                Err(e) => {
                    error!("Failed to poll terminal: {}", e);
                    return;
                }
            }

            if last_tick.elapsed() >= tick_rate {
                if tx.blocking_send(Event::Tick).is_err() {
                    return;
                }
                last_tick = Instant::now();
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closed_input_channel_ends_the_loop() {
        let err = next_input(None).unwrap_err();
        assert!(err.to_string().contains("input reader stopped"));
        assert!(matches!(next_input(Some(Event::Tick)), Ok(Event::Tick)));
    }

    #[tokio::test]
    async fn test_reader_error_closes_channel() {
        let (tx, mut rx) = mpsc::channel::<Event>(1);
        drop(tx);
        assert!(next_input(rx.recv().await).is_err());
    }
}
