use crate::{
    config::Config,
    constants::TOKEN_QUERY_KEY,
    errors::{FinchatError, FinchatResult},
    models::{ConnectionState, Credential},
    reveal::Revealer,
    session::SessionEvent,
};
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use std::time::Duration;
use tokio::{
    net::TcpStream,
    sync::{mpsc, watch},
};
use tokio_tungstenite::{
    connect_async, tungstenite::Message as WsMessage, MaybeTlsStream, WebSocketStream,
};
use tokio_util::sync::CancellationToken;
use url::Url;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const CLOSE_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Connecting,
    Connected,
    ReconnectWait,
}

#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub chat_url: Url,
    pub reconnect_delay: Duration,
    pub reveal_delay: Duration,
}

impl ConnectionConfig {
    pub fn from_config(config: &Config) -> FinchatResult<Self> {
        Ok(Self {
            chat_url: config.chat_url()?,
            reconnect_delay: config.reconnect_delay(),
            reveal_delay: config.reveal_delay(),
        })
    }
}

/// `<chat_url>?token=<credential>`
pub fn authorized_url(chat_url: &Url, credential: &Credential) -> Url {
    let mut url = chat_url.clone();
    url.query_pairs_mut()
        .append_pair(TOKEN_QUERY_KEY, credential.as_str());
    url
}

async fn open(url: Url) -> FinchatResult<WsStream> {
    let (stream, response) = connect_async(url.as_str()).await?;
    debug!("Handshake complete with status {}", response.status());
    Ok(stream)
}

/// Slot for the one live socket. Installing always closes the previous socket first.
#[derive(Default)]
struct LiveConnection {
    stream: Option<WsStream>,
}

impl LiveConnection {
    async fn install(&mut self, stream: WsStream) {
        self.close().await;
        self.stream = Some(stream);
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            match tokio::time::timeout(CLOSE_TIMEOUT, stream.close(None)).await {
                Ok(Ok(())) => debug!("Socket closed"),
                Ok(Err(e)) => debug!("Socket close failed: {}", e),
                Err(_) => debug!("Socket close timed out"),
            }
        }
    }

    fn stream_mut(&mut self) -> Option<&mut WsStream> {
        self.stream.as_mut()
    }
}

/// Owns the chat connection and keeps it alive until cancelled.
///
/// Idle -> Connecting -> Connected -> Reconnect-Wait -> Connecting -> ...
/// Every failure is treated as transient and retried after a fixed delay with the
/// same credential.
///
/// `live_state` tracks the socket itself, ahead of the `Connected`/`Disconnected`
/// events: it drops to `Disconnected` the moment the pump stops.
pub struct ConnectionManager {
    config: ConnectionConfig,
    credential: Credential,
    events: mpsc::UnboundedSender<SessionEvent>,
    live_state: watch::Sender<ConnectionState>,
    outbound: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
    live: LiveConnection,
    phase: Phase,
    attempts: u32,
}

impl ConnectionManager {
    pub fn new(
        config: ConnectionConfig,
        credential: Credential,
        events: mpsc::UnboundedSender<SessionEvent>,
        live_state: watch::Sender<ConnectionState>,
        outbound: mpsc::UnboundedReceiver<String>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            credential,
            events,
            live_state,
            outbound,
            cancel,
            live: LiveConnection::default(),
            phase: Phase::Idle,
            attempts: 0,
        }
    }

    pub async fn run(mut self) {
        let revealer = Revealer::spawn(
            self.config.reveal_delay,
            self.events.clone(),
            self.cancel.child_token(),
        );

        loop {
            self.enter(Phase::Connecting);
            self.attempts += 1;
            self.emit(SessionEvent::Connecting {
                attempt: self.attempts,
            });

            let url = authorized_url(&self.config.chat_url, &self.credential);
            let opened = tokio::select! {
                _ = self.cancel.cancelled() => break,
                opened = open(url) => opened,
            };

            match opened {
                Ok(stream) => {
                    self.live.install(stream).await;
                    self.discard_outbound();
                    self.live_state.send_replace(ConnectionState::Connected);
                    self.enter(Phase::Connected);
                    self.emit(SessionEvent::Connected);

                    match self.pump(&revealer).await {
                        Ok(()) => info!("Chat connection closed"),
                        Err(e) => warn!("Chat connection lost: {}", e),
                    }
                    self.live_state.send_replace(ConnectionState::Disconnected);
                    self.live.close().await;
                }
                Err(e) => warn!("Connection attempt {} failed: {}", self.attempts, e),
            }

            if self.cancel.is_cancelled() {
                break;
            }

            self.emit(SessionEvent::Disconnected);
            self.enter(Phase::ReconnectWait);
            self.discard_outbound();
            info!(
                "Reconnecting in {}ms",
                self.config.reconnect_delay.as_millis()
            );

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.reconnect_delay) => {}
            }
        }

        self.live_state.send_replace(ConnectionState::Disconnected);
        self.live.close().await;
        drop(revealer);
        info!("Connection manager stopped after {} attempt(s)", self.attempts);
    }

    /// Moves frames in both directions until the socket ends or the session is cancelled.
    async fn pump(&mut self, revealer: &Revealer) -> FinchatResult<()> {
        loop {
            let Some(ws) = self.live.stream_mut() else {
                return Err(FinchatError::connection_error("no live socket"));
            };

            tokio::select! {
                _ = self.cancel.cancelled() => return Ok(()),
                frame = ws.next() => match frame {
                    Some(Ok(WsMessage::Text(text))) => {
                        self.emit(SessionEvent::TypingStarted);
                        revealer.reveal(text);
                    }
                    Some(Ok(WsMessage::Close(frame))) => {
                        info!("Server closed the connection: {:?}", frame);
                        return Ok(());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => return Ok(()),
                },
                outgoing = self.outbound.recv() => match outgoing {
                    Some(text) => {
                        debug!("Sending frame ({} bytes)", text.len());
                        ws.send(WsMessage::Text(text)).await?;
                    }
                    None => {
                        // The session went away; wait for its cancellation.
                        self.cancel.cancelled().await;
                        return Ok(());
                    }
                },
            }
        }
    }

    fn discard_outbound(&mut self) {
        while let Ok(text) = self.outbound.try_recv() {
            debug!("Dropping frame queued while offline ({} bytes)", text.len());
        }
    }

    fn enter(&mut self, phase: Phase) {
        debug!("Connection phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    fn emit(&self, event: SessionEvent) {
        if self.events.send(event).is_err() {
            debug!("Session receiver dropped");
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use tokio::time::Instant;

    struct Harness {
        events: mpsc::UnboundedReceiver<SessionEvent>,
        live_state: watch::Receiver<ConnectionState>,
        outbound: mpsc::UnboundedSender<String>,
        cancel: CancellationToken,
        task: tokio::task::JoinHandle<()>,
    }

    fn spawn_manager(chat_url: Url, reconnect_ms: u64, reveal_ms: u64) -> Harness {
        let (events_tx, events) = mpsc::unbounded_channel();
        let (live_tx, live_state) = watch::channel(ConnectionState::Disconnected);
        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let config = ConnectionConfig {
            chat_url,
            reconnect_delay: Duration::from_millis(reconnect_ms),
            reveal_delay: Duration::from_millis(reveal_ms),
        };
        let manager = ConnectionManager::new(
            config,
            Credential::new("tok1"),
            events_tx,
            live_tx,
            outbound_rx,
            cancel.clone(),
        );
        let task = tokio::spawn(manager.run());
        Harness {
            events,
            live_state,
            outbound,
            cancel,
            task,
        }
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<SessionEvent>) -> SessionEvent {
        within(rx.recv()).await.expect("event channel closed")
    }

    #[test]
    fn test_authorized_url_appends_token() {
        let base = Url::parse("ws://localhost:5000/chat").unwrap();
        let url = authorized_url(&base, &Credential::new("abc.def-ghi"));
        assert_eq!(url.as_str(), "ws://localhost:5000/chat?token=abc.def-ghi");
    }

    #[tokio::test]
    async fn test_connects_with_credential_and_transmits() {
        let (url, mut conns) = start_ws_server().await;
        let mut h = spawn_manager(url, 50, 20);

        assert_eq!(
            next_event(&mut h.events).await,
            SessionEvent::Connecting { attempt: 1 }
        );
        let mut conn = within(conns.recv()).await.unwrap();
        assert_eq!(conn.uri, "/chat?token=tok1");
        assert_eq!(next_event(&mut h.events).await, SessionEvent::Connected);

        h.outbound.send("Hi".to_string()).unwrap();
        let frame = within(conn.ws.next()).await.unwrap().unwrap();
        assert_eq!(frame, WsMessage::Text("Hi".to_string()));

        h.cancel.cancel();
        within(h.task).await.unwrap();
    }

    #[tokio::test]
    async fn test_inbound_frame_reveals_after_delay() {
        let (url, mut conns) = start_ws_server().await;
        let mut h = spawn_manager(url, 50, 150);

        let mut conn = within(conns.recv()).await.unwrap();
        assert_eq!(
            next_event(&mut h.events).await,
            SessionEvent::Connecting { attempt: 1 }
        );
        assert_eq!(next_event(&mut h.events).await, SessionEvent::Connected);

        conn.ws
            .send(WsMessage::Text("Hello from Bot!".to_string()))
            .await
            .unwrap();
        assert_eq!(next_event(&mut h.events).await, SessionEvent::TypingStarted);
        let typing_at = Instant::now();

        assert_eq!(
            next_event(&mut h.events).await,
            SessionEvent::BotMessage("Hello from Bot!".to_string())
        );
        assert!(typing_at.elapsed() >= Duration::from_millis(100));

        h.cancel.cancel();
        within(h.task).await.unwrap();
    }

    #[tokio::test]
    async fn test_every_frame_is_revealed_in_order() {
        let (url, mut conns) = start_ws_server().await;
        let mut h = spawn_manager(url, 50, 30);

        let mut conn = within(conns.recv()).await.unwrap();
        for text in ["one", "two", "three"] {
            conn.ws.send(WsMessage::Text(text.to_string())).await.unwrap();
        }

        let mut revealed = Vec::new();
        let mut typing = 0;
        while revealed.len() < 3 {
            match next_event(&mut h.events).await {
                SessionEvent::BotMessage(text) => revealed.push(text),
                SessionEvent::TypingStarted => typing += 1,
                _ => {}
            }
        }
        assert_eq!(revealed, vec!["one", "two", "three"]);
        assert_eq!(typing, 3);

        h.cancel.cancel();
        within(h.task).await.unwrap();
    }

    #[tokio::test]
    async fn test_reconnects_with_same_credential() {
        let (url, mut conns) = start_ws_server().await;
        let mut h = spawn_manager(url, 200, 20);

        let mut first = within(conns.recv()).await.unwrap();
        assert_eq!(
            next_event(&mut h.events).await,
            SessionEvent::Connecting { attempt: 1 }
        );
        assert_eq!(next_event(&mut h.events).await, SessionEvent::Connected);
        assert_eq!(*h.live_state.borrow(), ConnectionState::Connected);

        first.ws.close(None).await.unwrap();
        assert_eq!(next_event(&mut h.events).await, SessionEvent::Disconnected);
        assert_eq!(*h.live_state.borrow(), ConnectionState::Disconnected);
        let dropped_at = Instant::now();

        let second = within(conns.recv()).await.unwrap();
        assert!(dropped_at.elapsed() >= Duration::from_millis(150));
        assert_eq!(second.uri, first.uri);
        assert_eq!(
            next_event(&mut h.events).await,
            SessionEvent::Connecting { attempt: 2 }
        );
        assert_eq!(next_event(&mut h.events).await, SessionEvent::Connected);

        h.cancel.cancel();
        within(h.task).await.unwrap();
    }

    #[tokio::test]
    async fn test_failed_open_is_retried() {
        let mut h = spawn_manager(unused_ws_url(), 30, 20);

        assert_eq!(
            next_event(&mut h.events).await,
            SessionEvent::Connecting { attempt: 1 }
        );
        assert_eq!(next_event(&mut h.events).await, SessionEvent::Disconnected);
        assert_eq!(
            next_event(&mut h.events).await,
            SessionEvent::Connecting { attempt: 2 }
        );

        h.cancel.cancel();
        within(h.task).await.unwrap();
    }

    #[tokio::test]
    async fn test_frames_queued_while_offline_are_dropped() {
        let (url, mut conns) = start_ws_server().await;
        let mut h = spawn_manager(url, 100, 20);

        let mut first = within(conns.recv()).await.unwrap();
        assert_eq!(
            next_event(&mut h.events).await,
            SessionEvent::Connecting { attempt: 1 }
        );
        assert_eq!(next_event(&mut h.events).await, SessionEvent::Connected);
        first.ws.close(None).await.unwrap();
        assert_eq!(next_event(&mut h.events).await, SessionEvent::Disconnected);

        h.outbound.send("stale".to_string()).unwrap();

        let mut second = within(conns.recv()).await.unwrap();
        assert_eq!(
            next_event(&mut h.events).await,
            SessionEvent::Connecting { attempt: 2 }
        );
        assert_eq!(next_event(&mut h.events).await, SessionEvent::Connected);
        h.outbound.send("fresh".to_string()).unwrap();

        let frame = within(second.ws.next()).await.unwrap().unwrap();
        assert_eq!(frame, WsMessage::Text("fresh".to_string()));

        h.cancel.cancel();
        within(h.task).await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_closes_socket_and_stops_reconnecting() {
        let (url, mut conns) = start_ws_server().await;
        let mut h = spawn_manager(url, 30, 20);

        let mut conn = within(conns.recv()).await.unwrap();
        assert_eq!(
            next_event(&mut h.events).await,
            SessionEvent::Connecting { attempt: 1 }
        );
        assert_eq!(next_event(&mut h.events).await, SessionEvent::Connected);

        h.cancel.cancel();
        within(h.task).await.unwrap();

        match within(conn.ws.next()).await {
            Some(Ok(WsMessage::Close(_))) | None | Some(Err(_)) => {}
            other => panic!("expected the client to close, got {:?}", other),
        }

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(conns.try_recv().is_err());
    }
}
