// ── Named application events ──
//
// A publish/subscribe side channel for notifications that fall outside
// the normal data flow (e.g. "the duty list changed somewhere").

use serde_json::Value;
use tokio::sync::broadcast;
use tracing::trace;

/// Published after a duty is created, updated or deleted.
pub const DUTIES_CHANGED: &str = "duties:changed";

const CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct AppEvent {
    pub name: String,
    pub detail: Value,
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CAPACITY);
        Self { tx }
    }

    /// Publish an event. Returns how many subscribers received it.
    pub fn emit(&self, name: &str, detail: Value) -> usize {
        trace!(event = name, "emit");
        self.tx
            .send(AppEvent {
                name: name.to_owned(),
                detail,
            })
            .unwrap_or(0)
    }

    /// Receive every event.
    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }

    /// Receive only events called `name`. Dropping the handle unsubscribes.
    pub fn on(&self, name: &str) -> EventSubscription {
        EventSubscription {
            name: name.to_owned(),
            rx: self.tx.subscribe(),
        }
    }
}

pub struct EventSubscription {
    name: String,
    rx: broadcast::Receiver<AppEvent>,
}

impl EventSubscription {
    /// Next matching event; `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<AppEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) if event.name == self.name => return Some(event),
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn on_filters_by_name() {
        let bus = EventBus::new();
        let mut duties = bus.on(DUTIES_CHANGED);

        bus.emit("courses:changed", json!({}));
        bus.emit(DUTIES_CHANGED, json!({"id": 7, "action": "deleted"}));

        let event = duties.recv().await.unwrap();
        assert_eq!(event.name, DUTIES_CHANGED);
        assert_eq!(event.detail["id"], 7);
    }

    #[test]
    fn emit_without_subscribers_is_harmless() {
        let bus = EventBus::new();
        assert_eq!(bus.emit(DUTIES_CHANGED, Value::Null), 0);
    }

    #[tokio::test]
    async fn dropping_subscription_unsubscribes() {
        let bus = EventBus::new();
        let sub = bus.on(DUTIES_CHANGED);
        assert_eq!(bus.emit(DUTIES_CHANGED, Value::Null), 1);
        drop(sub);
        assert_eq!(bus.emit(DUTIES_CHANGED, Value::Null), 0);
    }
}
