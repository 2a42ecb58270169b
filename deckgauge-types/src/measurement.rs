//! Measurement types and individual readings.

use serde::{Deserialize, Serialize};

/// Description of one kind of reading the producer can report.
///
/// `name` is the unique key subscriptions bind to. `format` only matters by
/// its presence: a formatted type is displayed with decimals, an unformatted
/// one as a rounded integer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MeasurementType {
    /// Unique name, e.g. `"GPU usage"`.
    pub name: String,

    /// Display unit, e.g. `"%"` or `"MHz"`.
    #[serde(default)]
    pub unit: String,

    /// Lower bound of the gauge range.
    #[serde(default)]
    pub min: f64,

    /// Upper bound of the gauge range.
    #[serde(default)]
    pub max: f64,

    /// Informational numeric base reported by the producer.
    #[serde(default)]
    pub base: i64,

    /// Producer-side format string.
    #[serde(default)]
    pub format: Option<String>,
}

impl MeasurementType {
    /// Create a type with the given name, unit and range.
    pub fn new(name: impl Into<String>, unit: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            name: name.into(),
            unit: unit.into(),
            min,
            max,
            base: 0,
            format: None,
        }
    }

    /// Set the format string, switching display to decimals.
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    /// Set the informational base.
    pub fn with_base(mut self, base: i64) -> Self {
        self.base = base;
        self
    }

    /// Whether values of this type are displayed with decimals.
    pub fn is_formatted(&self) -> bool {
        self.format.is_some()
    }
}

/// A single reading: a value together with the type it measures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Measurement {
    #[serde(rename = "Type")]
    pub kind: MeasurementType,
    pub value: f64,
}

impl Measurement {
    pub fn new(kind: MeasurementType, value: f64) -> Self {
        Self { kind, value }
    }

    /// Name of the measured type.
    pub fn name(&self) -> &str {
        &self.kind.name
    }
}
