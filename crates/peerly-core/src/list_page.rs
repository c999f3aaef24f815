// ── Resource list page state ──
//
// Owns the fetch lifecycle of one list view. A fetch is started with
// `begin_fetch`, which hands out a generation ticket; `finish_fetch`
// applies a result only if its ticket is still current. Fetching is
// suspended while a modal is visible and resumes exactly once when it
// closes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::alerts::{Alert, AlertBus};
use crate::editor::Hook;
use crate::error::CoreError;

/// Identifies one fetch. Stale tickets are ignored by `finish_fetch`.
#[derive(Debug, Clone)]
pub struct FetchTicket {
    generation: u64,
    cancel: CancellationToken,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Cancelled when the page unmounts.
    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchApplied {
    Applied,
    Failed,
    Stale,
}

#[derive(Debug)]
pub struct ListState<R> {
    rows: Vec<R>,
    loading: bool,
    error: Option<String>,
    mounted: bool,
    modal_visible: bool,
    pending: Arc<AtomicBool>,
    generation: u64,
    cancel: CancellationToken,
    fetch_failed: &'static str,
}

impl<R> ListState<R> {
    /// `fetch_failed` is the alert text when a fetch error carries no
    /// server message.
    pub fn new(fetch_failed: &'static str) -> Self {
        Self {
            rows: Vec::new(),
            loading: false,
            error: None,
            mounted: false,
            modal_visible: false,
            pending: Arc::new(AtomicBool::new(false)),
            generation: 0,
            cancel: CancellationToken::new(),
            fetch_failed,
        }
    }

    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Schedule a fetch.
    pub fn mount(&mut self) {
        self.mounted = true;
        self.cancel = CancellationToken::new();
        self.pending.store(true, Ordering::SeqCst);
    }

    /// Cancel in-flight work; later results are discarded.
    pub fn unmount(&mut self) {
        self.mounted = false;
        self.loading = false;
        self.cancel.cancel();
        self.generation += 1;
    }

    /// Ask for a refetch at the next opportunity.
    pub fn request_refresh(&self) {
        self.pending.store(true, Ordering::SeqCst);
    }

    /// Shareable handle for editor refresh callbacks.
    pub fn refresh_hook(&self) -> Hook {
        let pending = Arc::clone(&self.pending);
        Arc::new(move || pending.store(true, Ordering::SeqCst))
    }

    /// Track modal visibility. Closing a modal schedules one fetch.
    pub fn set_modal_visible(&mut self, visible: bool) {
        if self.modal_visible && !visible {
            self.pending.store(true, Ordering::SeqCst);
        }
        self.modal_visible = visible;
    }

    pub fn needs_fetch(&self) -> bool {
        self.mounted && !self.modal_visible && self.pending.load(Ordering::SeqCst)
    }

    /// Start a fetch if one is due. Returns `None` while unmounted, while
    /// a modal is visible, or when nothing is pending.
    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        if !self.needs_fetch() {
            return None;
        }
        self.pending.store(false, Ordering::SeqCst);
        self.generation += 1;
        self.loading = true;
        debug!(generation = self.generation, "list fetch started");
        Some(FetchTicket {
            generation: self.generation,
            cancel: self.cancel.child_token(),
        })
    }

    /// Apply a fetch result. Errors publish a danger alert and keep the
    /// previous rows.
    pub fn finish_fetch(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<R>, CoreError>,
        alerts: &AlertBus,
    ) -> FetchApplied {
        if !self.mounted || ticket.generation != self.generation || ticket.cancel.is_cancelled() {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale list fetch"
            );
            return FetchApplied::Stale;
        }
        self.loading = false;
        match result {
            Ok(rows) => {
                self.rows = rows;
                self.error = None;
                FetchApplied::Applied
            }
            Err(e) => {
                let message = e.user_message(self.fetch_failed);
                warn!(error = %e, "list fetch failed");
                alerts.show(Alert::danger(message.clone()));
                self.error = Some(message);
                FetchApplied::Failed
            }
        }
    }
}
