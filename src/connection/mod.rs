//! The producer connection.
//!
//! A [`Connection`] wraps at most one live byte-stream channel to the
//! producer. It never retries and never reports failure: connect errors,
//! read errors and end-of-stream all turn into an implicit [`close`], and the
//! only things callers ever observe are state transitions and data.
//!
//! The transport runs in a background task that forwards what it sees to the
//! owner; [`Connection::next_event`] turns that into [`ConnectionEvent`]s.
//! Events from a link that has since been closed or replaced are discarded,
//! so nothing read on an old link is ever surfaced.
//!
//! [`close`]: Connection::close

mod channel;
mod connector;

pub use channel::{ChannelConnector, ProducerEndpoint, ProducerLink};
pub use connector::{BoxedReader, Connector, PipeConnector};

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Observable connection state.
///
/// A connect attempt in flight is not a separate state: the connection stays
/// `Disconnected` until the transport reports that it opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// What a connection reports to its owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The transport finished connecting.
    Opened,
    /// One inbound chunk, verbatim.
    Data(String),
    /// A connected link went away. Reported once per open link.
    Closed,
}

/// Transport tuning.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    /// Upper bound on one connect attempt.
    pub connect_timeout: Duration,
    /// Size of the buffer each chunk is read into.
    pub read_buffer_size: usize,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(1),
            read_buffer_size: 64 * 1024,
        }
    }
}

/// Raw notifications from a link task.
#[derive(Debug)]
enum LinkEvent {
    Opened,
    Data(Vec<u8>),
    Lost(String),
}

#[derive(Debug)]
struct Link {
    generation: u64,
    opened: bool,
    task: JoinHandle<()>,
}

/// A single on-demand connection to the producer.
#[derive(Debug)]
pub struct Connection {
    connector: Arc<dyn Connector>,
    settings: ConnectionSettings,
    link: Option<Link>,
    generation: u64,
    link_tx: mpsc::Sender<(u64, LinkEvent)>,
    link_rx: mpsc::Receiver<(u64, LinkEvent)>,
    pending: VecDeque<ConnectionEvent>,
}

impl Connection {
    pub fn new(connector: Arc<dyn Connector>, settings: ConnectionSettings) -> Self {
        let (link_tx, link_rx) = mpsc::channel(64);
        Self {
            connector,
            settings,
            link: None,
            generation: 0,
            link_tx,
            link_rx,
            pending: VecDeque::new(),
        }
    }

    /// Start connecting to `channel`. Returns immediately.
    ///
    /// Any existing link is closed first.
    pub fn open(&mut self, channel: &str) {
        self.close();

        self.generation += 1;
        let generation = self.generation;
        debug!(
            address = %self.connector.address(channel),
            generation,
            "connecting"
        );

        let task = tokio::spawn(run_link(
            self.connector.clone(),
            channel.to_string(),
            self.settings,
            generation,
            self.link_tx.clone(),
        ));

        self.link = Some(Link {
            generation,
            opened: false,
            task,
        });
    }

    /// Drop the current link, if any. Safe to call at any time.
    ///
    /// Queues a [`ConnectionEvent::Closed`] when the link had opened.
    pub fn close(&mut self) {
        let Some(link) = self.link.take() else {
            return;
        };
        link.task.abort();

        if link.opened {
            info!(generation = link.generation, "connection closed");
            self.pending.push_back(ConnectionEvent::Closed);
        } else {
            debug!(generation = link.generation, "connect attempt abandoned");
        }
    }

    pub fn state(&self) -> ConnectionState {
        match &self.link {
            Some(link) if link.opened => ConnectionState::Connected,
            _ => ConnectionState::Disconnected,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Whether a connect attempt is still in flight.
    pub fn is_connecting(&self) -> bool {
        matches!(&self.link, Some(link) if !link.opened)
    }

    /// Wait for the next event.
    ///
    /// Cancel-safe: nothing is lost if the returned future is dropped before
    /// completion.
    pub async fn next_event(&mut self) -> ConnectionEvent {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return event;
            }

            // The connection holds a sender itself, so the channel never
            // closes while it is alive.
            let Some((generation, event)) = self.link_rx.recv().await else {
                return std::future::pending().await;
            };

            let current = match self.link.as_mut() {
                Some(link) if link.generation == generation => link,
                _ => {
                    debug!(generation, "discarding event from stale link");
                    continue;
                }
            };

            match event {
                LinkEvent::Opened => {
                    current.opened = true;
                    info!(generation, "connection opened");
                    return ConnectionEvent::Opened;
                }
                LinkEvent::Data(bytes) => {
                    return ConnectionEvent::Data(String::from_utf8_lossy(&bytes).into_owned());
                }
                LinkEvent::Lost(reason) => {
                    debug!(generation, %reason, "link lost");
                    self.close();
                }
            }
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(link) = self.link.take() {
            link.task.abort();
        }
    }
}

async fn run_link(
    connector: Arc<dyn Connector>,
    channel: String,
    settings: ConnectionSettings,
    generation: u64,
    tx: mpsc::Sender<(u64, LinkEvent)>,
) {
    let connected = tokio::time::timeout(settings.connect_timeout, connector.connect(&channel)).await;
    let mut reader = match connected {
        Ok(Ok(reader)) => reader,
        Ok(Err(err)) => {
            let _ = tx.send((generation, LinkEvent::Lost(err.to_string()))).await;
            return;
        }
        Err(_) => {
            let _ = tx
                .send((generation, LinkEvent::Lost("connect timed out".to_string())))
                .await;
            return;
        }
    };

    if tx.send((generation, LinkEvent::Opened)).await.is_err() {
        return;
    }

    let mut buf = vec![0u8; settings.read_buffer_size.max(1)];
    loop {
        let event = match reader.read(&mut buf).await {
            Ok(0) => LinkEvent::Lost("end of stream".to_string()),
            Ok(n) => LinkEvent::Data(buf[..n].to_vec()),
            Err(err) => LinkEvent::Lost(err.to_string()),
        };
        let lost = matches!(event, LinkEvent::Lost(_));

        if tx.send((generation, event)).await.is_err() || lost {
            return;
        }
    }
}
