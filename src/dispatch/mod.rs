//! Measurement dispatch.
//!
//! The [`MeasurementDispatcher`] owns every active subscription. Each inbound
//! payload is decoded once and fanned out synchronously: a subscription bound
//! to type `T` receives exactly one gauge when the snapshot contains `T`, and
//! nothing otherwise. Because fan-out never suspends, a snapshot is delivered
//! atomically with respect to subscribe/rebind/unsubscribe.

mod registry;
mod sink;

pub use registry::{Subscription, SubscriptionId, SubscriptionRegistry};
pub use sink::{ChannelSink, RenderSink};

use deckgauge_types::{Payload, Snapshot};
use tracing::{debug, error, warn};

use crate::catalog::SharedCatalog;
use crate::gauge;

/// What happened to one inbound payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A snapshot was fanned out.
    Dispatched {
        /// Subscriptions that received a gauge.
        rendered: usize,
        /// Subscriptions whose type was absent from the snapshot.
        missed: usize,
    },
    /// A catalog announcement was forwarded to the catalog.
    Catalog { types: usize },
    /// The payload could not be decoded and was dropped.
    Rejected,
}

/// Registry of display subscriptions and router of decoded snapshots.
#[derive(Debug)]
pub struct MeasurementDispatcher {
    registry: SubscriptionRegistry,
    catalog: SharedCatalog,
}

impl MeasurementDispatcher {
    pub fn new(catalog: SharedCatalog) -> Self {
        Self {
            registry: SubscriptionRegistry::new(),
            catalog,
        }
    }

    /// Bind a new subscription to `measurement_type`.
    pub fn subscribe(
        &mut self,
        measurement_type: impl Into<String>,
        sink: Box<dyn RenderSink>,
    ) -> SubscriptionId {
        let measurement_type = measurement_type.into();
        let id = self.registry.insert(measurement_type.clone(), sink);
        debug!(subscription = %id, %measurement_type, "subscribed");
        id
    }

    /// Change the type a subscription is bound to.
    ///
    /// Returns false, after logging, when the id is unknown.
    pub fn rebind(&mut self, id: SubscriptionId, measurement_type: impl Into<String>) -> bool {
        let measurement_type = measurement_type.into();
        match self.registry.get_mut(id) {
            Some(subscription) => {
                debug!(
                    subscription = %id,
                    from = %subscription.measurement_type,
                    to = %measurement_type,
                    "rebound"
                );
                subscription.measurement_type = measurement_type;
                true
            }
            None => {
                warn!(subscription = %id, "rebind of unknown subscription");
                false
            }
        }
    }

    /// Remove a subscription. Returns false, after logging, when the id is
    /// unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        match self.registry.remove(id) {
            Some(subscription) => {
                debug!(
                    subscription = %id,
                    measurement_type = %subscription.measurement_type,
                    "unsubscribed"
                );
                true
            }
            None => {
                warn!(subscription = %id, "unsubscribe of unknown subscription");
                false
            }
        }
    }

    /// Type a subscription is currently bound to.
    pub fn binding(&self, id: SubscriptionId) -> Option<&str> {
        self.registry
            .get(id)
            .map(|subscription| subscription.measurement_type.as_str())
    }

    /// Whether anyone is listening.
    pub fn has_demand(&self) -> bool {
        !self.registry.is_empty()
    }

    pub fn subscription_count(&self) -> usize {
        self.registry.len()
    }

    /// Decode one raw payload and route it.
    pub fn on_data_received(&mut self, raw: &str) -> DispatchOutcome {
        match Payload::decode(raw) {
            Ok(Payload::Catalog(types)) => {
                self.catalog.announce(&types);
                DispatchOutcome::Catalog { types: types.len() }
            }
            Ok(Payload::Snapshot(snapshot)) => self.dispatch(&snapshot),
            Err(err) => {
                error!(error = %err, bytes = raw.len(), "dropping undecodable payload");
                DispatchOutcome::Rejected
            }
        }
    }

    /// Fan a snapshot out to every subscription bound to one of its types.
    pub fn dispatch(&mut self, snapshot: &Snapshot) -> DispatchOutcome {
        let index = snapshot.index_by_name();
        let mut rendered = 0;
        let mut missed = 0;

        for (id, subscription) in self.registry.iter_mut() {
            match index.get(subscription.measurement_type.as_str()) {
                Some(measurement) => {
                    subscription.sink.render(&gauge::render(measurement));
                    rendered += 1;
                }
                None => {
                    debug!(
                        subscription = %id,
                        measurement_type = %subscription.measurement_type,
                        "measurement not found in snapshot"
                    );
                    missed += 1;
                }
            }
        }

        DispatchOutcome::Dispatched { rendered, missed }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::catalog::CatalogKind;
    use crate::gauge::Gauge;

    type Calls = Arc<Mutex<Vec<Gauge>>>;

    fn recorder() -> (Calls, Box<dyn RenderSink>) {
        let calls: Calls = Arc::new(Mutex::new(Vec::new()));
        let sink_calls = calls.clone();
        let sink: Box<dyn RenderSink> =
            Box::new(move |gauge: &Gauge| sink_calls.lock().unwrap().push(gauge.clone()));
        (calls, sink)
    }

    fn dispatcher() -> MeasurementDispatcher {
        MeasurementDispatcher::new(CatalogKind::Dynamic.build())
    }

    const GPU_55: &str = r#"[{"Type":{"Name":"GPU usage","Min":0,"Max":100,"Unit":"%"},"Value":55}]"#;

    #[test]
    fn single_subscription_receives_one_render() {
        let mut d = dispatcher();
        let (calls, sink) = recorder();
        d.subscribe("GPU usage", sink);

        let outcome = d.on_data_received(GPU_55);

        assert_eq!(outcome, DispatchOutcome::Dispatched { rendered: 1, missed: 0 });
        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].level, 0.55);
        assert_eq!(calls[0].display_text(), "55%");
    }

    #[test]
    fn malformed_payload_is_dropped_and_dispatcher_survives() {
        let mut d = dispatcher();
        let (calls, sink) = recorder();
        d.subscribe("GPU usage", sink);

        assert_eq!(d.on_data_received("{not json"), DispatchOutcome::Rejected);
        assert!(calls.lock().unwrap().is_empty());

        d.on_data_received(GPU_55);
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn duplicate_bindings_both_render() {
        let mut d = dispatcher();
        let (first, sink_a) = recorder();
        let (second, sink_b) = recorder();
        d.subscribe("CPU usage", sink_a);
        d.subscribe("CPU usage", sink_b);

        let raw = r#"[{"Type":{"Name":"CPU usage","Unit":"%","Min":0,"Max":100},"Value":42}]"#;
        d.on_data_received(raw);

        let first = first.lock().unwrap();
        let second = second.lock().unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(first[0].level, second[0].level);
    }

    #[test]
    fn first_match_wins_within_a_snapshot() {
        let mut d = dispatcher();
        let (calls, sink) = recorder();
        d.subscribe("Power", sink);

        let raw = r#"[
            {"Type":{"Name":"Power","Unit":"W","Min":0,"Max":100},"Value":10},
            {"Type":{"Name":"Power","Unit":"W","Min":0,"Max":100},"Value":90}
        ]"#;
        d.on_data_received(raw);

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].value_text, "10");
    }

    #[test]
    fn unmatched_subscription_gets_nothing() {
        let mut d = dispatcher();
        let (gpu, gpu_sink) = recorder();
        let (fan, fan_sink) = recorder();
        d.subscribe("GPU usage", gpu_sink);
        d.subscribe("Fan speed", fan_sink);

        let outcome = d.on_data_received(GPU_55);

        assert_eq!(outcome, DispatchOutcome::Dispatched { rendered: 1, missed: 1 });
        assert_eq!(gpu.lock().unwrap().len(), 1);
        assert!(fan.lock().unwrap().is_empty());
    }

    #[test]
    fn rebind_applies_to_next_snapshot() {
        let mut d = dispatcher();
        let (calls, sink) = recorder();
        let id = d.subscribe("Fan speed", sink);

        d.on_data_received(GPU_55);
        assert!(calls.lock().unwrap().is_empty());

        assert!(d.rebind(id, "GPU usage"));
        assert_eq!(d.binding(id), Some("GPU usage"));

        d.on_data_received(GPU_55);
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[test]
    fn unsubscribe_stops_delivery_and_demand() {
        let mut d = dispatcher();
        let (calls, sink) = recorder();
        let id = d.subscribe("GPU usage", sink);
        assert!(d.has_demand());

        assert!(d.unsubscribe(id));
        assert!(!d.has_demand());

        d.on_data_received(GPU_55);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn unknown_ids_are_tolerated() {
        let mut d = dispatcher();
        let (_calls, sink) = recorder();
        let id = d.subscribe("GPU usage", sink);
        d.unsubscribe(id);

        assert!(!d.unsubscribe(id));
        assert!(!d.rebind(id, "Power"));
        assert!(d.binding(id).is_none());
    }

    #[test]
    fn catalog_payload_feeds_catalog_not_sinks() {
        let catalog = CatalogKind::Dynamic.build();
        let mut d = MeasurementDispatcher::new(catalog.clone());
        let (calls, sink) = recorder();
        d.subscribe("GPU usage", sink);

        let raw = r#"{"messageType":"MeasurementTypes","payload":[
            {"Name":"GPU usage","Unit":"%","Min":0,"Max":100,"Base":1,"Format":null}
        ]}"#;

        assert_eq!(d.on_data_received(raw), DispatchOutcome::Catalog { types: 1 });
        assert!(calls.lock().unwrap().is_empty());
        assert_eq!(catalog.types(), vec!["GPU usage"]);
    }

    #[test]
    fn channel_sink_forwards_gauges() {
        let mut d = dispatcher();
        let (sink, mut rx) = ChannelSink::create();
        d.subscribe("GPU usage", Box::new(sink));

        d.on_data_received(GPU_55);

        let gauge = rx.try_recv().unwrap();
        assert_eq!(gauge.label, "GPU usage");
        assert!(rx.try_recv().is_err());
    }
}
