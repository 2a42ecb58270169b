//! Tagged-union decoding of raw producer payloads.

use serde::Deserialize;
use serde_json::Value;

use crate::{DecodeError, MeasurementType, Snapshot};

/// `messageType` value of a catalog announcement.
pub const CATALOG_MESSAGE_TYPE: &str = "MeasurementTypes";

/// Field whose presence marks an enveloped (non-snapshot) payload.
const DISCRIMINATOR: &str = "messageType";

/// A decoded producer payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// The producer announced the measurement types it can report.
    Catalog(Vec<MeasurementType>),
    /// A batch of live readings.
    Snapshot(Snapshot),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    message_type: String,
    #[serde(default)]
    payload: Value,
}

impl Payload {
    /// Decode one raw payload.
    ///
    /// An object carrying `messageType` is an envelope and must be a catalog
    /// announcement; a bare array must be a snapshot. Everything else is an
    /// error.
    pub fn decode(raw: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(raw.trim()).map_err(DecodeError::Json)?;

        match value {
            Value::Object(ref map) if map.contains_key(DISCRIMINATOR) => {
                let envelope: Envelope =
                    serde_json::from_value(value).map_err(|source| DecodeError::Shape {
                        expected: "envelope",
                        source,
                    })?;

                if envelope.message_type != CATALOG_MESSAGE_TYPE {
                    return Err(DecodeError::UnknownMessageType(envelope.message_type));
                }

                let types: Vec<MeasurementType> = serde_json::from_value(envelope.payload)
                    .map_err(|source| DecodeError::Shape {
                        expected: "catalog",
                        source,
                    })?;
                Ok(Payload::Catalog(types))
            }
            Value::Array(_) => {
                let snapshot: Snapshot =
                    serde_json::from_value(value).map_err(|source| DecodeError::Shape {
                        expected: "snapshot",
                        source,
                    })?;
                Ok(Payload::Snapshot(snapshot))
            }
            _ => Err(DecodeError::Unrecognized),
        }
    }
}
