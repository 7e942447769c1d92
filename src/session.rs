use crate::{
    api::fetch_credential,
    chat::{ChatMessage, MessageFeed},
    config::Config,
    connection::{ConnectionConfig, ConnectionManager},
    errors::FinchatResult,
    models::ConnectionState,
};
use log::{debug, error, info, warn};
use reqwest::Client;
use std::time::Duration;
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Notifications from the background session task to the widget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    CredentialFailed(String),
    Connecting { attempt: u32 },
    Connected,
    Disconnected,
    TypingStarted,
    BotMessage(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapStatus {
    Pending,
    Ready,
    Failed(String),
}

/// UI-side half of a chat session.
///
/// Owns the feed, the connection state and the typing flag, plus the cancellation
/// token that bounds every background task. Dropping the session tears the
/// connection down.
///
/// `state` follows applied events and drives the UI. `live` is the connection
/// manager's view of the socket, which `send` also requires to be up.
#[derive(Debug)]
pub struct ChatSession {
    feed: MessageFeed,
    state: ConnectionState,
    typing: bool,
    bootstrap: BootstrapStatus,
    attempts: u32,
    live: watch::Receiver<ConnectionState>,
    outbound: mpsc::UnboundedSender<String>,
    events: mpsc::UnboundedReceiver<SessionEvent>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ChatSession {
    /// Spawns the session task: fetch a credential, then run the connection loop.
    /// Must be called from within a tokio runtime.
    pub fn start(config: &Config) -> FinchatResult<Self> {
        let token_url = config.token_url()?;
        let token_timeout = config.token_timeout();
        let connection = ConnectionConfig::from_config(config)?;

        let (events_tx, events) = mpsc::unbounded_channel();
        let (live_tx, live) = watch::channel(ConnectionState::Disconnected);
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let task = tokio::spawn(run_session(
            token_url,
            token_timeout,
            connection,
            events_tx,
            live_tx,
            outbound_rx,
            cancel.clone(),
        ));

        Ok(Self::from_parts(live, outbound, events, cancel, Some(task)))
    }

    fn from_parts(
        live: watch::Receiver<ConnectionState>,
        outbound: mpsc::UnboundedSender<String>,
        events: mpsc::UnboundedReceiver<SessionEvent>,
        cancel: CancellationToken,
        task: Option<JoinHandle<()>>,
    ) -> Self {
        Self {
            feed: MessageFeed::new(),
            state: ConnectionState::Disconnected,
            typing: false,
            bootstrap: BootstrapStatus::Pending,
            attempts: 0,
            live,
            outbound,
            events,
            cancel,
            task,
        }
    }

    /// Appends `text` as a user turn and transmits it.
    ///
    /// A no-op returning `false` when disconnected or when `text` is blank.
    pub fn send(&mut self, text: &str) -> bool {
        if self.state != ConnectionState::Connected
            || *self.live.borrow() != ConnectionState::Connected
        {
            debug!("Ignoring send while disconnected");
            return false;
        }
        if text.trim().is_empty() {
            return false;
        }
        if self.outbound.send(text.to_string()).is_err() {
            warn!("Session task has stopped; message not sent");
            return false;
        }

        self.feed.push(ChatMessage::user(text));
        true
    }

    /// Waits for the next event from the session task. `None` once the task has ended.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }

    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::CredentialFailed(reason) => {
                self.bootstrap = BootstrapStatus::Failed(reason);
                self.state = ConnectionState::Disconnected;
            }
            SessionEvent::Connecting { attempt } => {
                self.bootstrap = BootstrapStatus::Ready;
                self.attempts = attempt;
            }
            SessionEvent::Connected => self.state = ConnectionState::Connected,
            SessionEvent::Disconnected => self.state = ConnectionState::Disconnected,
            SessionEvent::TypingStarted => self.typing = true,
            SessionEvent::BotMessage(text) => {
                self.feed.push(ChatMessage::bot(text));
                self.typing = false;
            }
        }
    }

    pub fn messages(&self) -> &MessageFeed {
        &self.feed
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn bootstrap(&self) -> &BootstrapStatus {
        &self.bootstrap
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Cancels all background work and waits for the session task to finish.
    pub async fn shutdown(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!("Session task ended abnormally: {}", e);
            }
        }
    }
}

impl Drop for ChatSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_session(
    token_url: Url,
    token_timeout: Duration,
    connection: ConnectionConfig,
    events: mpsc::UnboundedSender<SessionEvent>,
    live: watch::Sender<ConnectionState>,
    outbound: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
) {
    let client = match Client::builder().timeout(token_timeout).build() {
        Ok(client) => client,
        Err(e) => {
            error!("Could not build the HTTP client: {}", e);
            let _ = events.send(SessionEvent::CredentialFailed(e.to_string()));
            return;
        }
    };
    let fetched = tokio::select! {
        _ = cancel.cancelled() => return,
        fetched = fetch_credential(&client, &token_url) => fetched,
    };

    let credential = match fetched {
        Ok(credential) => credential,
        Err(e) => {
            error!("Could not obtain a session credential: {}", e);
            let _ = events.send(SessionEvent::CredentialFailed(e.to_string()));
            return;
        }
    };

    info!("Session credential obtained");
    ConnectionManager::new(connection, credential, events, live, outbound, cancel)
        .run()
        .await;
}

#[cfg(test)]
pub(crate) struct SessionProbe {
    pub outbound: mpsc::UnboundedReceiver<String>,
    pub events: mpsc::UnboundedSender<SessionEvent>,
    pub live: watch::Sender<ConnectionState>,
}

#[cfg(test)]
impl ChatSession {
    /// A session with no background task; the probe plays the connection side.
    /// The probe's socket starts up, so applied events alone decide whether sends go out.
    pub(crate) fn detached() -> (Self, SessionProbe) {
        let (events_tx, events) = mpsc::unbounded_channel();
        let (live_tx, live) = watch::channel(ConnectionState::Connected);
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let session = Self::from_parts(live, outbound, events, CancellationToken::new(), None);
        (
            session,
            SessionProbe {
                outbound: outbound_rx,
                events: events_tx,
                live: live_tx,
            },
        )
    }
}
