//! # deckgauge
//!
//! Relays live hardware telemetry (GPU/CPU usage, clocks, temperatures, ...)
//! from a local monitoring producer to the gauges of a control surface.
//!
//! The producer writes JSON snapshots to a named local channel. deckgauge
//! keeps one connection to it open only while the producer is running and at
//! least one display slot wants data, decodes every snapshot once, and hands
//! each display slot a rendered gauge for the measurement it is bound to.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────── Relay task ─────────────────────────────┐
//! │                                                                          │
//! │  ┌────────────┐  tick   ┌────────────┐  open/close  ┌──────────────┐     │
//! │  │  interval  │───────▶│ Supervisor │─────────────▶│  Connection  │◀─── pipe
//! │  └────────────┘         └─────┬──────┘              └──────┬───────┘     │
//! │                               │ has_demand?                │ data        │
//! │                               ▼                            ▼             │
//! │                        ┌──────────────────────────────────────────┐      │
//! │  RelayHandle ─────────▶│           MeasurementDispatcher          │      │
//! │  (subscribe/rebind/…)  │  decode ─▶ fan-out ─▶ gauge::render      │      │
//! │                        └──────────────────────┬───────────────────┘      │
//! └───────────────────────────────────────────────┼──────────────────────────┘
//!                                                 ▼
//!                                      RenderSink (display host)
//! ```
//!
//! - **[`connection`]**: one on-demand link; errors become silent closes
//! - **[`supervisor`]**: level-triggered open/close policy, evaluated per tick
//! - **[`dispatch`]**: subscription registry and snapshot fan-out
//! - **[`gauge`]**: pure measurement-to-gauge rendering, plus SVG output
//! - **[`relay`]**: the single task that drives all of the above
//! - **[`slot`]**: adapter from host slot events to relay subscriptions
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Render GPU usage and temperature to ./gauges/slot-*.svg
//! deckgauge --slot "GPU usage" --slot "GPU temperature" --out-dir gauges
//! ```
//!
//! ### As a library with an in-process producer
//!
//! ```
//! use std::sync::Arc;
//! use deckgauge::{CatalogKind, ChannelConnector, ChannelSink, Relay, RelayConfig};
//!
//! # tokio_test::block_on(async {
//! let (connector, mut producer) = ChannelConnector::create();
//! producer.set_listening(true);
//!
//! let config = RelayConfig { assume_producer_running: true, ..RelayConfig::default() };
//! let (relay, handle) = Relay::with_connector(&config, Arc::new(connector), CatalogKind::Basic.build());
//! let task = relay.spawn();
//!
//! let (sink, mut gauges) = ChannelSink::create();
//! handle.subscribe("GPU usage", Box::new(sink)).await.unwrap();
//!
//! let mut link = producer.accept().await.unwrap();
//! link.send(r#"[{"Type":{"Name":"GPU usage","Unit":"%","Min":0,"Max":100},"Value":55}]"#)
//!     .await
//!     .unwrap();
//!
//! let gauge = gauges.recv().await.unwrap();
//! assert_eq!(gauge.display_text(), "55%");
//!
//! handle.shutdown().unwrap();
//! task.await.unwrap();
//! # });
//! ```

pub mod catalog;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod gauge;
pub mod lifecycle;
pub mod relay;
pub mod slot;
pub mod supervisor;

pub use catalog::{BasicCatalog, CatalogKind, DynamicCatalog, MeasurementCatalog, SharedCatalog};
pub use config::RelayConfig;
pub use connection::{
    ChannelConnector, Connection, ConnectionEvent, ConnectionState, Connector, PipeConnector,
    ProducerEndpoint, ProducerLink,
};
pub use dispatch::{ChannelSink, DispatchOutcome, MeasurementDispatcher, RenderSink, SubscriptionId};
pub use error::RelayError;
pub use gauge::Gauge;
pub use lifecycle::{LifecycleEvent, ProducerWatch};
pub use relay::{Relay, RelayHandle, RelayStatus};
pub use slot::{SlotController, SlotSettings};
pub use supervisor::{Supervisor, SupervisorAction};

// Re-export the wire schema for convenience
pub use deckgauge_types::{DecodeError, Measurement, MeasurementType, Payload, Snapshot};
