//! In-process connector.
//!
//! [`ChannelConnector`] lets a producer living in the same process (an
//! embedding application, a replay tool, a test) stand in for the external
//! pipe. The producer side decides whether it is accepting connections; each
//! accepted connection hands it a [`ProducerLink`] to write payloads into.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncWriteExt, DuplexStream};
use tokio::sync::mpsc;

use super::{BoxedReader, Connector};

const DUPLEX_CAPACITY: usize = 64 * 1024;

/// Consumer half: hand this to a [`Connection`](super::Connection).
#[derive(Debug, Clone)]
pub struct ChannelConnector {
    listening: Arc<AtomicBool>,
    accepted: mpsc::UnboundedSender<ProducerLink>,
}

/// Producer half: accepts connections and writes payloads.
#[derive(Debug)]
pub struct ProducerEndpoint {
    listening: Arc<AtomicBool>,
    accepted: mpsc::UnboundedReceiver<ProducerLink>,
}

/// One accepted connection, seen from the producer.
#[derive(Debug)]
pub struct ProducerLink {
    channel: String,
    writer: DuplexStream,
}

impl ChannelConnector {
    /// Create a connected pair. The endpoint starts out not listening.
    pub fn create() -> (Self, ProducerEndpoint) {
        let listening = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                listening: listening.clone(),
                accepted: tx,
            },
            ProducerEndpoint {
                listening,
                accepted: rx,
            },
        )
    }
}

#[async_trait]
impl Connector for ChannelConnector {
    async fn connect(&self, channel: &str) -> io::Result<BoxedReader> {
        if !self.listening.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("no producer listening on {}", channel),
            ));
        }

        let (reader, writer) = tokio::io::duplex(DUPLEX_CAPACITY);
        self.accepted
            .send(ProducerLink {
                channel: channel.to_string(),
                writer,
            })
            .map_err(|_| io::Error::new(io::ErrorKind::ConnectionRefused, "producer is gone"))?;

        Ok(Box::new(reader))
    }

    fn address(&self, channel: &str) -> String {
        format!("channel:{}", channel)
    }
}

impl ProducerEndpoint {
    /// Start or stop accepting connections. Established links are unaffected.
    pub fn set_listening(&self, listening: bool) {
        self.listening.store(listening, Ordering::SeqCst);
    }

    /// Wait for the next accepted connection.
    pub async fn accept(&mut self) -> Option<ProducerLink> {
        self.accepted.recv().await
    }

    /// Take an already accepted connection without waiting.
    pub fn try_accept(&mut self) -> Option<ProducerLink> {
        self.accepted.try_recv().ok()
    }
}

impl ProducerLink {
    /// Channel name the consumer asked for.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Write one payload.
    pub async fn send(&mut self, payload: &str) -> io::Result<()> {
        self.writer.write_all(payload.as_bytes()).await?;
        self.writer.flush().await
    }
}
