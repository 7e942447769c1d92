use crate::session::SessionEvent;
use log::{debug, trace};
use std::time::Duration;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{sleep_until, Instant},
};
use tokio_util::sync::CancellationToken;

/// Delays inbound frames before they reach the feed.
///
/// Every frame gets its own deadline (arrival + delay). A single task drains the
/// deadlines in FIFO order, so reveals come out in arrival order. Cancelling the
/// token drops everything still pending.
#[derive(Debug)]
pub struct Revealer {
    delay: Duration,
    queue: mpsc::UnboundedSender<(Instant, String)>,
    task: JoinHandle<()>,
}

impl Revealer {
    pub fn spawn(
        delay: Duration,
        events: mpsc::UnboundedSender<SessionEvent>,
        cancel: CancellationToken,
    ) -> Self {
        let (queue, pending) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_reveals(pending, events, cancel));
        Self { delay, queue, task }
    }

    /// Schedules `text` to be revealed after the configured delay.
    pub fn reveal(&self, text: String) {
        let deadline = Instant::now() + self.delay;
        if self.queue.send((deadline, text)).is_err() {
            debug!("Reveal task already stopped; dropping frame");
        }
    }
}

impl Drop for Revealer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_reveals(
    mut pending: mpsc::UnboundedReceiver<(Instant, String)>,
    events: mpsc::UnboundedSender<SessionEvent>,
    cancel: CancellationToken,
) {
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => break,
            next = pending.recv() => next,
        };
        let Some((deadline, text)) = next else {
            break;
        };

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep_until(deadline) => {}
        }

        trace!("Revealing frame ({} bytes)", text.len());
        if events.send(SessionEvent::BotMessage(text)).is_err() {
            break;
        }
    }
    debug!("Reveal task stopped");
}
