//! Subscription registry.

use std::collections::HashMap;
use std::fmt;

use super::RenderSink;

/// Opaque handle identifying one subscription.
///
/// Ids are allocated from a monotonically increasing counter and are never
/// reused, even after the subscription is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// A display slot's binding to one measurement type.
pub struct Subscription {
    pub measurement_type: String,
    pub sink: Box<dyn RenderSink>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("measurement_type", &self.measurement_type)
            .finish()
    }
}

/// All active subscriptions, keyed by id.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    entries: HashMap<SubscriptionId, Subscription>,
    next_id: u64,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, measurement_type: String, sink: Box<dyn RenderSink>) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.entries.insert(
            id,
            Subscription {
                measurement_type,
                sink,
            },
        );
        id
    }

    pub fn remove(&mut self, id: SubscriptionId) -> Option<Subscription> {
        self.entries.remove(&id)
    }

    pub fn get(&self, id: SubscriptionId) -> Option<&Subscription> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: SubscriptionId) -> Option<&mut Subscription> {
        self.entries.get_mut(&id)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&SubscriptionId, &mut Subscription)> {
        self.entries.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gauge::Gauge;

    fn noop() -> Box<dyn RenderSink> {
        Box::new(|_: &Gauge| {})
    }

    #[test]
    fn ids_are_never_reused() {
        let mut registry = SubscriptionRegistry::new();
        let first = registry.insert("Power".to_string(), noop());
        registry.remove(first);
        let second = registry.insert("Power".to_string(), noop());

        assert_ne!(first, second);
        assert!(registry.get(first).is_none());
    }

    #[test]
    fn remove_unknown_is_none() {
        let mut registry = SubscriptionRegistry::new();
        let id = registry.insert("Power".to_string(), noop());
        assert!(registry.remove(id).is_some());
        assert!(registry.remove(id).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn id_display() {
        let mut registry = SubscriptionRegistry::new();
        let id = registry.insert("Power".to_string(), noop());
        assert_eq!(id.to_string(), "sub-1");
    }
}
