//! # deckgauge-types
//!
//! Wire schema for the telemetry stream a hardware-monitoring producer writes
//! to its local IPC channel. The producer emits two kinds of JSON documents:
//!
//! - a **catalog announcement** listing the measurement types it can report
//!   (`{"messageType": "MeasurementTypes", "payload": [...]}`), and
//! - a **snapshot**: a bare array of measurements, each embedding its type.
//!
//! [`Payload::decode`] tells the two apart strictly. Anything that is neither
//! is rejected with a [`DecodeError`]; nothing is ever partially trusted.
//!
//! ## Example
//!
//! ```rust
//! use deckgauge_types::Payload;
//!
//! let raw = r#"[{"Type":{"Name":"GPU usage","Unit":"%","Min":0,"Max":100},"Value":55}]"#;
//!
//! match Payload::decode(raw).unwrap() {
//!     Payload::Snapshot(snapshot) => {
//!         let gpu = snapshot.find("GPU usage").unwrap();
//!         assert_eq!(gpu.value, 55.0);
//!     }
//!     Payload::Catalog(_) => unreachable!(),
//! }
//! ```

mod error;
mod measurement;
mod payload;
mod snapshot;

pub use error::DecodeError;
pub use measurement::{Measurement, MeasurementType};
pub use payload::{Payload, CATALOG_MESSAGE_TYPE};
pub use snapshot::Snapshot;
