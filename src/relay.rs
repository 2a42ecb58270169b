//! The relay event loop.
//!
//! [`Relay`] owns the connection, the supervisor and the dispatcher and drives
//! all three from a single task. Supervisor ticks, transport events and host
//! commands are handled one at a time, each to completion, so the
//! subscription registry never changes in the middle of a fan-out and
//! snapshots are processed strictly in arrival order.
//!
//! Everything outside the loop talks to it through a cloneable
//! [`RelayHandle`].
//!
//! ```no_run
//! use deckgauge::{ChannelSink, Relay, RelayConfig};
//!
//! # tokio_test::block_on(async {
//! let config = RelayConfig::default();
//! let (relay, handle) = Relay::new(&config);
//! let task = relay.spawn();
//!
//! let (sink, mut gauges) = ChannelSink::create();
//! let id = handle.subscribe("GPU usage", Box::new(sink)).await.unwrap();
//! handle.producer_started("MSIAfterburner.exe").unwrap();
//!
//! if let Some(gauge) = gauges.recv().await {
//!     println!("{} {}", gauge.label, gauge.display_text());
//! }
//!
//! handle.unsubscribe(id).unwrap();
//! handle.shutdown().unwrap();
//! task.await.unwrap();
//! # });
//! ```

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::catalog::SharedCatalog;
use crate::config::RelayConfig;
use crate::connection::{Connection, ConnectionEvent, ConnectionState, Connector};
use crate::dispatch::{MeasurementDispatcher, RenderSink, SubscriptionId};
use crate::error::{RelayError, Result};
use crate::lifecycle::{LifecycleEvent, ProducerWatch};
use crate::supervisor::Supervisor;

/// Commands accepted by the relay loop.
enum RelayCommand {
    Subscribe {
        measurement_type: String,
        sink: Box<dyn RenderSink>,
        reply: oneshot::Sender<SubscriptionId>,
    },
    Rebind {
        id: SubscriptionId,
        measurement_type: String,
    },
    Unsubscribe {
        id: SubscriptionId,
    },
    Lifecycle(LifecycleEvent),
    Status {
        reply: oneshot::Sender<RelayStatus>,
    },
    Shutdown,
}

impl std::fmt::Debug for RelayCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RelayCommand::Subscribe {
                measurement_type, ..
            } => f
                .debug_struct("Subscribe")
                .field("measurement_type", measurement_type)
                .finish(),
            RelayCommand::Rebind {
                id,
                measurement_type,
            } => f
                .debug_struct("Rebind")
                .field("id", id)
                .field("measurement_type", measurement_type)
                .finish(),
            RelayCommand::Unsubscribe { id } => {
                f.debug_struct("Unsubscribe").field("id", id).finish()
            }
            RelayCommand::Lifecycle(event) => f.debug_tuple("Lifecycle").field(event).finish(),
            RelayCommand::Status { .. } => f.write_str("Status"),
            RelayCommand::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Point-in-time view of the relay, for hosts and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayStatus {
    pub connection: ConnectionState,
    pub producer_available: bool,
    pub subscriptions: usize,
}

/// Owner of the connection, supervisor and dispatcher.
#[derive(Debug)]
pub struct Relay {
    supervisor: Supervisor,
    dispatcher: MeasurementDispatcher,
    connection: Connection,
    commands: mpsc::UnboundedReceiver<RelayCommand>,
}

impl Relay {
    /// Build a relay on the configured pipe with a fresh catalog.
    pub fn new(config: &RelayConfig) -> (Self, RelayHandle) {
        Self::with_connector(config, config.connector(), config.catalog.build())
    }

    /// Build a relay on an arbitrary transport and catalog.
    pub fn with_connector(
        config: &RelayConfig,
        connector: Arc<dyn Connector>,
        catalog: SharedCatalog,
    ) -> (Self, RelayHandle) {
        let (tx, rx) = mpsc::unbounded_channel();
        let producer = ProducerWatch::new(
            config.producer_application.clone(),
            config.assume_producer_running,
        );

        let relay = Self {
            supervisor: Supervisor::new(config.pipe_name.clone(), config.tick_interval(), producer),
            dispatcher: MeasurementDispatcher::new(catalog),
            connection: Connection::new(connector, config.connection_settings()),
            commands: rx,
        };
        (relay, RelayHandle { commands: tx })
    }

    /// Run the loop on a new task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Run until shut down or until every handle is dropped.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.supervisor.interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            channel = %self.supervisor.channel(),
            interval_ms = self.supervisor.interval().as_millis() as u64,
            "relay started"
        );

        loop {
            // Commands queued before a payload arrived are applied before
            // that payload is dispatched.
            tokio::select! {
                biased;

                command = self.commands.recv() => match command {
                    Some(RelayCommand::Shutdown) | None => break,
                    Some(command) => self.on_command(command),
                },
                _ = ticker.tick() => {
                    self.supervisor.tick(&self.dispatcher, &mut self.connection);
                }
                event = self.connection.next_event() => {
                    self.on_connection_event(event);
                }
            }
        }

        self.connection.close();
        info!("relay stopped");
    }

    fn on_connection_event(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Opened => {
                debug!(subscriptions = self.dispatcher.subscription_count(), "streaming");
            }
            ConnectionEvent::Data(raw) => {
                self.dispatcher.on_data_received(&raw);
            }
            ConnectionEvent::Closed => {
                debug!("stream ended, supervisor will reconnect when needed");
            }
        }
    }

    fn on_command(&mut self, command: RelayCommand) {
        match command {
            RelayCommand::Subscribe {
                measurement_type,
                sink,
                reply,
            } => {
                let id = self.dispatcher.subscribe(measurement_type, sink);
                if reply.send(id).is_err() {
                    // Nobody kept the id, so nobody can ever unsubscribe it.
                    self.dispatcher.unsubscribe(id);
                }
            }
            RelayCommand::Rebind {
                id,
                measurement_type,
            } => {
                self.dispatcher.rebind(id, measurement_type);
            }
            RelayCommand::Unsubscribe { id } => {
                self.dispatcher.unsubscribe(id);
            }
            RelayCommand::Lifecycle(event) => {
                self.supervisor.on_lifecycle(&event);
            }
            RelayCommand::Status { reply } => {
                let _ = reply.send(RelayStatus {
                    connection: self.connection.state(),
                    producer_available: self.supervisor.producer_available(),
                    subscriptions: self.dispatcher.subscription_count(),
                });
            }
            // Handled by the loop itself.
            RelayCommand::Shutdown => {}
        }
    }
}

/// Cloneable front-end to a running [`Relay`].
///
/// No method waits on the relay's own progress beyond a reply.
#[derive(Debug, Clone)]
pub struct RelayHandle {
    commands: mpsc::UnboundedSender<RelayCommand>,
}

impl RelayHandle {
    fn send(&self, command: RelayCommand) -> Result<()> {
        self.commands.send(command).map_err(|_| RelayError::Stopped)
    }

    /// Bind a new display subscription to `measurement_type`.
    pub async fn subscribe(
        &self,
        measurement_type: impl Into<String>,
        sink: Box<dyn RenderSink>,
    ) -> Result<SubscriptionId> {
        let (reply, rx) = oneshot::channel();
        self.send(RelayCommand::Subscribe {
            measurement_type: measurement_type.into(),
            sink,
            reply,
        })?;
        rx.await.map_err(|_| RelayError::Stopped)
    }

    pub fn rebind(&self, id: SubscriptionId, measurement_type: impl Into<String>) -> Result<()> {
        self.send(RelayCommand::Rebind {
            id,
            measurement_type: measurement_type.into(),
        })
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        self.send(RelayCommand::Unsubscribe { id })
    }

    /// Report that `application` started.
    pub fn producer_started(&self, application: impl Into<String>) -> Result<()> {
        self.send(RelayCommand::Lifecycle(LifecycleEvent::Started(application.into())))
    }

    /// Report that `application` stopped.
    pub fn producer_stopped(&self, application: impl Into<String>) -> Result<()> {
        self.send(RelayCommand::Lifecycle(LifecycleEvent::Stopped(application.into())))
    }

    pub async fn status(&self) -> Result<RelayStatus> {
        let (reply, rx) = oneshot::channel();
        self.send(RelayCommand::Status { reply })?;
        rx.await.map_err(|_| RelayError::Stopped)
    }

    /// Ask the loop to close the connection and exit.
    pub fn shutdown(&self) -> Result<()> {
        self.send(RelayCommand::Shutdown)
    }
}
