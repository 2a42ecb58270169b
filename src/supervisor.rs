//! Connection supervision.
//!
//! The supervisor is a level-triggered control loop: on every tick it looks at
//! whether the producer is available and whether any subscription exists, and
//! opens or closes the connection to match. It keeps no memory of past
//! decisions, so a lost or reordered notification costs at most one tick.

use std::time::Duration;

use tracing::debug;

use crate::connection::Connection;
use crate::dispatch::MeasurementDispatcher;
use crate::lifecycle::{LifecycleEvent, ProducerWatch};

/// Decision taken on one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorAction {
    Open,
    Close,
    Idle,
}

/// Decide what to do given the current inputs.
///
/// `connecting` counts as holding the connection: no second open is issued
/// while an attempt is in flight, and an unwanted attempt is closed.
pub fn evaluate(
    available: bool,
    demand: bool,
    connected: bool,
    connecting: bool,
) -> SupervisorAction {
    let held = connected || connecting;
    match (available && demand, held) {
        (true, false) => SupervisorAction::Open,
        (false, true) => SupervisorAction::Close,
        _ => SupervisorAction::Idle,
    }
}

/// Opens and closes the producer connection on a fixed tick.
#[derive(Debug)]
pub struct Supervisor {
    channel: String,
    interval: Duration,
    producer: ProducerWatch,
}

impl Supervisor {
    pub fn new(channel: impl Into<String>, interval: Duration, producer: ProducerWatch) -> Self {
        Self {
            channel: channel.into(),
            interval,
            producer,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn producer_available(&self) -> bool {
        self.producer.is_available()
    }

    /// Latch a lifecycle edge. Takes effect on the next tick.
    pub fn on_lifecycle(&mut self, event: &LifecycleEvent) {
        self.producer.apply(event);
    }

    /// Evaluate the policy once and act on the connection.
    pub fn tick(
        &mut self,
        dispatcher: &MeasurementDispatcher,
        connection: &mut Connection,
    ) -> SupervisorAction {
        let action = evaluate(
            self.producer.is_available(),
            dispatcher.has_demand(),
            connection.is_connected(),
            connection.is_connecting(),
        );

        match action {
            SupervisorAction::Open => {
                debug!(channel = %self.channel, "producer available and demand present, opening");
                connection.open(&self.channel);
            }
            SupervisorAction::Close => {
                debug!(
                    available = self.producer.is_available(),
                    demand = dispatcher.has_demand(),
                    "closing connection"
                );
                connection.close();
            }
            SupervisorAction::Idle => {}
        }

        action
    }
}
