//! Measurement-type catalog.
//!
//! The catalog is the list of measurement types a slot can be bound to. Hosts
//! use it to pick a default for a new slot and to cycle through types on a
//! key press. The producer may announce its own list at any time; whether that
//! announcement replaces the list depends on the catalog kind.

use std::fmt::Debug;
use std::sync::Arc;

use deckgauge_types::MeasurementType;
use parking_lot::RwLock;
use serde::Deserialize;
use tracing::{debug, info};

/// Types known before the producer has announced anything.
pub const BUILTIN_TYPES: [&str; 14] = [
    "Power",
    "CPU usage",
    "CPU clock",
    "CPU power",
    "Core clock",
    "RAM usage",
    "Memory usage",
    "Memory clock",
    "Commit charge",
    "GPU temperature",
    "GPU usage",
    "Fan speed",
    "Fan tachometer",
    "FB usage",
];

/// A list of selectable measurement type names.
pub trait MeasurementCatalog: Send + Sync + Debug {
    /// All type names, in display order.
    fn types(&self) -> &[String];

    /// Replace the list with names announced by the producer.
    fn set_types(&mut self, names: Vec<String>);

    /// Type a freshly configured slot starts with.
    fn default_type(&self) -> Option<&str> {
        self.types().first().map(String::as_str)
    }

    /// Type following `current`, wrapping around at the end.
    ///
    /// An unknown `current` yields the first type.
    fn next_type(&self, current: &str) -> Option<&str> {
        let types = self.types();
        if types.is_empty() {
            return None;
        }
        let next = match types.iter().position(|t| t == current) {
            Some(index) => (index + 1) % types.len(),
            None => 0,
        };
        Some(types[next].as_str())
    }
}

/// Fixed catalog of the producer's well-known types.
#[derive(Debug, Clone)]
pub struct BasicCatalog {
    types: Vec<String>,
}

impl BasicCatalog {
    pub fn new() -> Self {
        Self {
            types: BUILTIN_TYPES.iter().map(|t| t.to_string()).collect(),
        }
    }
}

impl Default for BasicCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MeasurementCatalog for BasicCatalog {
    fn types(&self) -> &[String] {
        &self.types
    }

    fn set_types(&mut self, names: Vec<String>) {
        debug!(announced = names.len(), "basic catalog ignores announced types");
    }
}

/// Catalog that mirrors whatever the producer last announced.
#[derive(Debug, Clone, Default)]
pub struct DynamicCatalog {
    types: Vec<String>,
}

impl DynamicCatalog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MeasurementCatalog for DynamicCatalog {
    fn types(&self) -> &[String] {
        &self.types
    }

    fn set_types(&mut self, names: Vec<String>) {
        self.types = names;
    }
}

/// Which catalog implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CatalogKind {
    #[default]
    Basic,
    Dynamic,
}

impl CatalogKind {
    pub fn build(self) -> SharedCatalog {
        match self {
            CatalogKind::Basic => SharedCatalog::new(BasicCatalog::new()),
            CatalogKind::Dynamic => SharedCatalog::new(DynamicCatalog::new()),
        }
    }
}

/// A catalog shared between the dispatcher, which feeds it announcements, and
/// the slot controller, which reads it.
#[derive(Debug, Clone)]
pub struct SharedCatalog {
    inner: Arc<RwLock<Box<dyn MeasurementCatalog>>>,
}

impl SharedCatalog {
    pub fn new(catalog: impl MeasurementCatalog + 'static) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Box::new(catalog))),
        }
    }

    /// Apply a catalog announcement received from the producer.
    pub fn announce(&self, announced: &[MeasurementType]) {
        let names: Vec<String> = announced.iter().map(|t| t.name.clone()).collect();
        info!(count = names.len(), "producer announced measurement types");
        self.inner.write().set_types(names);
    }

    pub fn types(&self) -> Vec<String> {
        self.inner.read().types().to_vec()
    }

    pub fn default_type(&self) -> Option<String> {
        self.inner.read().default_type().map(str::to_string)
    }

    pub fn next_type(&self, current: &str) -> Option<String> {
        self.inner.read().next_type(current).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_catalog_defaults_to_power() {
        let catalog = BasicCatalog::new();
        assert_eq!(catalog.default_type(), Some("Power"));
        assert_eq!(catalog.types().len(), 14);
    }

    #[test]
    fn next_type_wraps_around() {
        let catalog = BasicCatalog::new();
        assert_eq!(catalog.next_type("Power"), Some("CPU usage"));
        assert_eq!(catalog.next_type("FB usage"), Some("Power"));
    }

    #[test]
    fn next_type_of_unknown_is_first() {
        let catalog = BasicCatalog::new();
        assert_eq!(catalog.next_type("Warp drive"), Some("Power"));
    }

    #[test]
    fn basic_catalog_ignores_announcements() {
        let mut catalog = BasicCatalog::new();
        catalog.set_types(vec!["Only".to_string()]);
        assert_eq!(catalog.types().len(), 14);
    }

    #[test]
    fn dynamic_catalog_starts_empty() {
        let catalog = DynamicCatalog::new();
        assert!(catalog.default_type().is_none());
        assert!(catalog.next_type("anything").is_none());
    }

    #[test]
    fn shared_dynamic_catalog_takes_announcements() {
        let catalog = CatalogKind::Dynamic.build();
        catalog.announce(&[
            MeasurementType::new("GPU usage", "%", 0.0, 100.0),
            MeasurementType::new("GPU temperature", "C", 0.0, 100.0),
        ]);

        assert_eq!(catalog.types(), vec!["GPU usage", "GPU temperature"]);
        assert_eq!(catalog.default_type().as_deref(), Some("GPU usage"));
        assert_eq!(
            catalog.next_type("GPU temperature").as_deref(),
            Some("GPU usage")
        );
    }

    #[test]
    fn catalog_kind_deserializes_lowercase() {
        let kind: CatalogKind = serde_json::from_str(r#""dynamic""#).unwrap();
        assert_eq!(kind, CatalogKind::Dynamic);
    }
}
