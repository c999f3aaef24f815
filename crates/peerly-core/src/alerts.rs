// ── Global alert bus ──
//
// Single-slot: a newer alert replaces whatever is showing. Success alerts
// from mutation flows dismiss themselves after `SUCCESS_TIMEOUT`; the
// timer only clears the alert it was started for.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use strum::Display;
use tokio::sync::watch;
use tracing::debug;

/// How long success alerts stay up before dismissing themselves.
pub const SUCCESS_TIMEOUT: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum AlertVariant {
    Success,
    Danger,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub variant: AlertVariant,
    pub message: String,
}

impl Alert {
    pub fn new(variant: AlertVariant, message: impl Into<String>) -> Self {
        Self {
            variant,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(AlertVariant::Success, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Self::new(AlertVariant::Danger, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(AlertVariant::Warning, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(AlertVariant::Info, message)
    }
}

/// The alert currently showing, tagged with a sequence number so stale
/// timers can tell it apart from a replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveAlert {
    pub id: u64,
    pub alert: Alert,
}

#[derive(Clone)]
pub struct AlertBus {
    slot: Arc<watch::Sender<Option<ActiveAlert>>>,
    next_id: Arc<AtomicU64>,
}

impl Default for AlertBus {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertBus {
    pub fn new() -> Self {
        let (slot, _) = watch::channel(None);
        Self {
            slot: Arc::new(slot),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Show an alert, replacing the current one. Success alerts get the
    /// standard auto-dismiss timer. Returns the alert's id.
    pub fn show(&self, alert: Alert) -> u64 {
        let timeout = (alert.variant == AlertVariant::Success).then_some(SUCCESS_TIMEOUT);
        self.show_for(alert, timeout)
    }

    /// Show an alert with an explicit auto-dismiss timeout (`None` = sticky).
    ///
    /// The timer needs a tokio runtime; outside one the alert is sticky.
    pub fn show_for(&self, alert: Alert, timeout: Option<Duration>) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(id, variant = %alert.variant, message = %alert.message, "alert");
        self.slot.send_replace(Some(ActiveAlert { id, alert }));

        if let (Some(after), Ok(handle)) = (timeout, tokio::runtime::Handle::try_current()) {
            let bus = self.clone();
            handle.spawn(async move {
                tokio::time::sleep(after).await;
                bus.dismiss_if(id);
            });
        }
        id
    }

    /// The alert currently showing.
    pub fn current(&self) -> Option<Alert> {
        self.slot.borrow().as_ref().map(|a| a.alert.clone())
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ActiveAlert>> {
        self.slot.subscribe()
    }

    /// Manually dismiss whatever is showing.
    pub fn dismiss(&self) {
        self.slot.send_replace(None);
    }

    /// Dismiss only if alert `id` is still the one showing.
    pub fn dismiss_if(&self, id: u64) -> bool {
        self.slot.send_if_modified(|slot| {
            if slot.as_ref().is_some_and(|a| a.id == id) {
                *slot = None;
                true
            } else {
                false
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_alert_replaces_older() {
        let bus = AlertBus::new();
        bus.show(Alert::danger("first"));
        bus.show(Alert::info("second"));
        assert_eq!(bus.current(), Some(Alert::info("second")));
    }

    #[test]
    fn dismiss_if_ignores_stale_ids() {
        let bus = AlertBus::new();
        let first = bus.show_for(Alert::warning("first"), None);
        let second = bus.show_for(Alert::warning("second"), None);
        assert!(!bus.dismiss_if(first));
        assert!(bus.current().is_some());
        assert!(bus.dismiss_if(second));
        assert!(bus.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn success_alert_dismisses_after_timeout() {
        let bus = AlertBus::new();
        bus.show(Alert::success("Duty updated successfully!"));

        tokio::time::sleep(Duration::from_millis(2999)).await;
        assert!(bus.current().is_some());

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert!(bus.current().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn old_timer_does_not_clear_replacement() {
        let bus = AlertBus::new();
        bus.show(Alert::success("saved"));
        tokio::time::sleep(Duration::from_millis(2000)).await;
        bus.show(Alert::danger("Failed to update grade"));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(bus.current(), Some(Alert::danger("Failed to update grade")));
    }

    #[tokio::test(start_paused = true)]
    async fn danger_alerts_are_sticky() {
        let bus = AlertBus::new();
        bus.show(Alert::danger("Network Error"));
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(bus.current().is_some());
    }
}
