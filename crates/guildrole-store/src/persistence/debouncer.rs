//! Debounced flush worker
//!
//! One background task per store. Mutations send `Touch`; the worker waits until
//! no `Touch` has arrived for the quiet period and then flushes once, so a burst
//! of mutations costs a single write of the final state.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::time::sleep;
use tracing::{debug, trace, warn};

/// Something the worker can flush
#[async_trait]
pub trait FlushTarget: Send + Sync + 'static {
    /// Store name used in log fields
    fn name(&self) -> &'static str;

    /// Write the current state; failures are handled (logged) by the target
    async fn flush(&self);
}

enum Command {
    Touch,
    FlushNow(oneshot::Sender<()>),
    Shutdown(oneshot::Sender<()>),
}

/// Handle to a store's flush worker
#[derive(Clone)]
pub struct Debouncer {
    store: &'static str,
    commands: mpsc::UnboundedSender<Command>,
}

impl Debouncer {
    /// Spawn the worker on the current tokio runtime
    pub fn spawn(target: Arc<dyn FlushTarget>, quiet_period: Duration) -> Self {
        let (commands, receiver) = mpsc::unbounded_channel();
        let store = target.name();
        tokio::spawn(run(target, quiet_period, receiver));
        Self { store, commands }
    }

    /// Record a mutation and restart the quiet period
    pub fn touch(&self) {
        if self.commands.send(Command::Touch).is_err() {
            warn!(store = self.store, "Persistence worker stopped; mutation will not be flushed");
        }
    }

    /// Flush now if a write is pending; resolves once the write has finished
    pub async fn flush_now(&self) {
        self.request(Command::FlushNow).await;
    }

    /// Flush pending state and stop the worker
    pub async fn shutdown(&self) {
        self.request(Command::Shutdown).await;
    }

    async fn request(&self, command: fn(oneshot::Sender<()>) -> Command) {
        let (ack, done) = oneshot::channel();
        if self.commands.send(command(ack)).is_err() {
            return;
        }
        // The worker drops the sender only when it is gone, which also means nothing is pending
        let _ = done.await;
    }
}

async fn run(
    target: Arc<dyn FlushTarget>,
    quiet_period: Duration,
    mut commands: mpsc::UnboundedReceiver<Command>,
) {
    let store = target.name();
    let mut pending = false;

    loop {
        let command = if pending {
            // A fresh sleep on every pass: each Touch restarts the quiet period
            tokio::select! {
                command = commands.recv() => command,
                () = sleep(quiet_period) => {
                    trace!(store, "Quiet period elapsed");
                    target.flush().await;
                    pending = false;
                    continue;
                }
            }
        } else {
            commands.recv().await
        };

        match command {
            Some(Command::Touch) => pending = true,
            Some(Command::FlushNow(ack)) => {
                if std::mem::take(&mut pending) {
                    target.flush().await;
                }
                let _ = ack.send(());
            }
            Some(Command::Shutdown(ack)) => {
                if pending {
                    target.flush().await;
                }
                let _ = ack.send(());
                break;
            }
            None => {
                if pending {
                    target.flush().await;
                }
                break;
            }
        }
    }

    debug!(store, "Persistence worker stopped");
}
