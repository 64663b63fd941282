//! Outbound side: where the events for the real-time clients go.
//!
//! An event is a `(namespace, event, payload)` triple, the payload being JSON.
//!

use std::io::Write;

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

/// Anything that can push an event to the clients.
///
pub trait Emitter: Send + Sync {
    fn emit(&self, namespace: &str, event: &str, payload: &str) -> eyre::Result<()>;
}

/// One event as sent.
///
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Message {
    pub namespace: String,
    pub event: String,
    /// JSON
    pub payload: String,
}

impl Message {
    pub fn new(namespace: &str, event: &str, payload: &str) -> Self {
        Message {
            namespace: namespace.to_owned(),
            event: event.to_owned(),
            payload: payload.to_owned(),
        }
    }
}

/// Fan events out to any number of in-process receivers.
///
/// Having nobody listening is not an error, the event is just lost.
///
#[derive(Clone, Debug)]
pub struct ChannelEmitter {
    tx: broadcast::Sender<Message>,
}

impl ChannelEmitter {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        ChannelEmitter { tx }
    }

    /// Get a receiver for everything emitted from now on.
    ///
    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.tx.subscribe()
    }
}

impl Emitter for ChannelEmitter {
    fn emit(&self, namespace: &str, event: &str, payload: &str) -> eyre::Result<()> {
        let msg = Message::new(namespace, event, payload);
        if self.tx.send(msg).is_err() {
            trace!("no listener on {namespace}");
        }
        Ok(())
    }
}

/// Print every event as a JSON line on stdout.
///
#[derive(Clone, Copy, Debug, Default)]
pub struct StdoutEmitter;

impl Emitter for StdoutEmitter {
    fn emit(&self, namespace: &str, event: &str, payload: &str) -> eyre::Result<()> {
        let msg = Message::new(namespace, event, payload);
        let line = serde_json::to_string(&msg)?;

        let mut out = std::io::stdout().lock();
        writeln!(out, "{line}")?;
        Ok(())
    }
}
