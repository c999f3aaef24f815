//! All UI actions. Actions are the sole mechanism for state mutation:
//! key handlers and background tasks produce them, `App::process_action`
//! consumes them.

use secrecy::SecretString;
use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;

use peerly_core::alerts::ActiveAlert;
use peerly_core::model::{Assignment, ReviewReport};
use peerly_core::pages::duties::DutyListing;
use peerly_core::pages::review_report::GradeChange;
use peerly_core::{AppEvent, CoreError, FetchTicket, PageOutcome, Session};

#[derive(Debug)]
pub enum Action {
    // ── Lifecycle ──
    Quit,
    Tick,
    Render,
    Resize(u16, u16),
    ToggleHelp,

    // ── Navigation ──
    /// Resolve, guard and load a location.
    Navigate(String),
    /// Return to the previous location.
    GoBack,
    /// Reload the current location.
    Reload,
    /// Open the location prompt.
    OpenPrompt,
    /// A navigation finished. `generation` identifies the request.
    PageLoaded {
        generation: u64,
        target: String,
        outcome: PageOutcome,
    },

    // ── Session ──
    Login {
        user_name: String,
        password: SecretString,
        /// Where to go once logged in.
        redirect: String,
    },
    LoginFailed(String),
    Logout,
    SessionChanged(Session),

    // ── Buses ──
    AlertChanged(Option<ActiveAlert>),
    DismissAlert,
    DomainEvent(AppEvent),

    // ── Screen tasks ──
    /// Result of a task spawned by screen `screen`.
    Screen { screen: u64, update: ScreenUpdate },
}

/// Results of screen-owned background work, routed back to the screen
/// that started it.
#[derive(Debug)]
pub enum ScreenUpdate {
    DutiesFetched {
        ticket: FetchTicket,
        result: Result<DutyListing, CoreError>,
    },
    AssignmentsFetched {
        ticket: FetchTicket,
        result: Result<Vec<Assignment>, CoreError>,
    },
    ReportFetched(Result<ReviewReport, CoreError>),
    /// An editor's create or update finished.
    Saved(Result<Value, CoreError>),
    Deleted(Result<Value, CoreError>),
    GradeSaved {
        change: GradeChange,
        result: Result<(), CoreError>,
    },
}

/// Sender handed to each screen. Task results are stamped with the
/// screen's id so the app can drop results for screens that are gone.
#[derive(Debug, Clone)]
pub struct ScreenTx {
    tx: UnboundedSender<Action>,
    screen: u64,
}

impl ScreenTx {
    pub fn new(tx: UnboundedSender<Action>, screen: u64) -> Self {
        Self { tx, screen }
    }

    pub fn screen(&self) -> u64 {
        self.screen
    }

    pub fn update(&self, update: ScreenUpdate) {
        let _ = self.tx.send(Action::Screen {
            screen: self.screen,
            update,
        });
    }
}
