//! Bus bridge: forwards session, alert and domain-event changes from the
//! [`AppContext`] into the TUI action loop.

use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use peerly_core::AppContext;

use crate::action::Action;

/// Push the current session and alert, then forward every change until
/// `cancel` fires or the action channel closes.
pub async fn spawn_bridge(
    ctx: AppContext,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut session = ctx.session.subscribe();
    let mut alerts = ctx.alerts.subscribe();
    let mut events = ctx.events.subscribe();

    let _ = action_tx.send(Action::SessionChanged(session.borrow_and_update().clone()));
    let _ = action_tx.send(Action::AlertChanged(alerts.borrow_and_update().clone()));

    loop {
        let action = tokio::select! {
            () = cancel.cancelled() => break,
            changed = session.changed() => {
                if changed.is_err() {
                    break;
                }
                Action::SessionChanged(session.borrow_and_update().clone())
            }
            changed = alerts.changed() => {
                if changed.is_err() {
                    break;
                }
                Action::AlertChanged(alerts.borrow_and_update().clone())
            }
            event = events.recv() => match event {
                Ok(event) => Action::DomainEvent(event),
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "event bridge lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        };
        if action_tx.send(action).is_err() {
            break;
        }
    }
    debug!("bus bridge stopped");
}
