//! Display-slot controller.
//!
//! Translates the host's per-slot events (a key appearing, disappearing,
//! being pressed, or having its settings edited) into relay subscriptions.
//! The host persists [`SlotSettings`]; the controller only remembers which
//! subscription belongs to which slot.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::SharedCatalog;
use crate::dispatch::{RenderSink, SubscriptionId};
use crate::error::Result;
use crate::relay::RelayHandle;

/// Per-slot settings as persisted by the host.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement_type: Option<String>,
}

impl SlotSettings {
    /// Settings count as initialised once `enabled` has been written.
    pub fn is_valid(&self) -> bool {
        self.enabled.is_some()
    }

    fn bound_type(&self) -> Option<&str> {
        self.measurement_type.as_deref().filter(|t| !t.is_empty())
    }
}

/// Maps host slots to relay subscriptions.
#[derive(Debug)]
pub struct SlotController {
    relay: RelayHandle,
    catalog: SharedCatalog,
    slots: HashMap<String, SubscriptionId>,
}

impl SlotController {
    pub fn new(relay: RelayHandle, catalog: SharedCatalog) -> Self {
        Self {
            relay,
            catalog,
            slots: HashMap::new(),
        }
    }

    /// Subscription currently serving `slot`.
    pub fn subscription(&self, slot: &str) -> Option<SubscriptionId> {
        self.slots.get(slot).copied()
    }

    pub fn active_slots(&self) -> usize {
        self.slots.len()
    }

    /// A slot became visible. Returns the settings the host should persist.
    pub async fn activate(
        &mut self,
        slot: &str,
        mut settings: SlotSettings,
        sink: Box<dyn RenderSink>,
    ) -> Result<SlotSettings> {
        if !settings.is_valid() {
            self.initialize(&mut settings);
        }
        if settings.bound_type().is_none() {
            settings.measurement_type = self.catalog.default_type();
        }
        settings.enabled = Some(true);

        if let Some(previous) = self.slots.remove(slot) {
            debug!(%slot, subscription = %previous, "replacing subscription of reactivated slot");
            self.relay.unsubscribe(previous)?;
        }

        // An unbound slot still subscribes: its demand opens the connection,
        // and a dynamic catalog is only filled by what arrives over it.
        let measurement_type = match settings.bound_type() {
            Some(bound) => bound.to_string(),
            None => {
                debug!(%slot, "catalog has no types yet, subscribing unbound");
                String::new()
            }
        };
        let id = self.relay.subscribe(measurement_type, sink).await?;
        self.slots.insert(slot.to_string(), id);
        debug!(%slot, subscription = %id, "slot activated");

        Ok(settings)
    }

    /// A slot went away.
    pub fn deactivate(&mut self, slot: &str) -> Result<()> {
        match self.slots.remove(slot) {
            Some(id) => self.relay.unsubscribe(id),
            None => {
                warn!(%slot, "deactivation of unknown slot");
                Ok(())
            }
        }
    }

    /// The host delivered edited settings for a slot.
    pub fn settings_changed(&mut self, slot: &str, settings: &SlotSettings) -> Result<()> {
        let Some(id) = self.slots.get(slot) else {
            warn!(%slot, "settings change for inactive slot");
            return Ok(());
        };
        match settings.bound_type() {
            Some(measurement_type) => self.relay.rebind(*id, measurement_type),
            None => {
                debug!(%slot, "settings carry no measurement type, keeping binding");
                Ok(())
            }
        }
    }

    /// The slot's key was pressed: advance to the next catalog type.
    ///
    /// Returns the settings the host should persist.
    pub fn key_pressed(&mut self, slot: &str, mut settings: SlotSettings) -> Result<SlotSettings> {
        if !settings.is_valid() {
            self.initialize(&mut settings);
        }

        let current = settings.bound_type().unwrap_or_default().to_string();
        let Some(next) = self.catalog.next_type(&current) else {
            debug!(%slot, "catalog is empty, nothing to cycle to");
            return Ok(settings);
        };

        match self.slots.get(slot) {
            Some(id) => self.relay.rebind(*id, next.clone())?,
            None => warn!(%slot, "key press on inactive slot"),
        }
        settings.measurement_type = Some(next);
        Ok(settings)
    }

    fn initialize(&self, settings: &mut SlotSettings) {
        settings.enabled = Some(false);
        settings.measurement_type = self.catalog.default_type();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_use_camel_case() {
        let settings = SlotSettings {
            enabled: Some(true),
            measurement_type: Some("GPU usage".to_string()),
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(json, r#"{"enabled":true,"measurementType":"GPU usage"}"#);

        let empty: SlotSettings = serde_json::from_str("{}").unwrap();
        assert!(!empty.is_valid());
    }

    #[test]
    fn empty_type_is_unbound() {
        let settings = SlotSettings {
            enabled: Some(true),
            measurement_type: Some(String::new()),
        };
        assert!(settings.bound_type().is_none());
    }
}
