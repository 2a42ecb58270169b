//! Render sinks supplied by the display host.

use tokio::sync::mpsc;

use crate::gauge::Gauge;

/// Receives the gauges rendered for one subscription.
///
/// Sinks are called from the relay's event loop and must not block. Any
/// closure `FnMut(&Gauge)` is a sink.
pub trait RenderSink: Send {
    fn render(&mut self, gauge: &Gauge);
}

impl<F> RenderSink for F
where
    F: FnMut(&Gauge) + Send,
{
    fn render(&mut self, gauge: &Gauge) {
        self(gauge)
    }
}

/// A sink that forwards gauges into a channel, for hosts running elsewhere.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<Gauge>,
}

impl ChannelSink {
    /// Create a sink and the receiver its gauges arrive on.
    pub fn create() -> (Self, mpsc::UnboundedReceiver<Gauge>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl RenderSink for ChannelSink {
    fn render(&mut self, gauge: &Gauge) {
        // A dropped receiver means the slot is going away; the next
        // unsubscribe removes this sink.
        let _ = self.sender.send(gauge.clone());
    }
}
