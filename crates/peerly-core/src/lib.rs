//! UI-agnostic application core shared by the `peerly` CLI and TUI.
//!
//! - **[`AppContext`]**: created once at startup; holds the
//!   [`ResourceClient`](peerly_api::ResourceClient), [`SessionStore`],
//!   [`AlertBus`], [`EventBus`] and the validated [`RouteTable`].
//!
//! - **Routing** ([`routes`]): an immutable tree of [`RouteNode`]s resolved by
//!   exact segment matching. The guard redirects anonymous users to `/login`
//!   and under-privileged users to `/`; loaders prefetch page data.
//!
//! - **Tables** ([`table`], [`columns`]): declarative [`ColumnDef`]s over any
//!   [`TableRow`], with sort, filters, visibility and pagination projected
//!   into a [`TableView`](table::TableView).
//!
//! - **Pages** ([`pages`]): list-page state machines with generation-ticketed
//!   fetches, modal editors and delete confirmations.

pub mod alerts;
pub mod columns;
pub mod config;
pub mod context;
pub mod editor;
pub mod error;
pub mod events;
pub mod list_page;
pub mod modal;
pub mod model;
pub mod pages;
pub mod role;
pub mod routes;
pub mod session;
pub mod table;

// ── Primary re-exports ──────────────────────────────────────────────
pub use alerts::{Alert, AlertBus, AlertVariant};
pub use config::{AppConfig, Credentials};
pub use context::AppContext;
pub use editor::{DeleteConfirmation, Editor, EditorHost, EditorMode, EditorResult, Mutation};
pub use error::CoreError;
pub use events::{AppEvent, EventBus};
pub use list_page::{FetchApplied, FetchTicket, ListState};
pub use modal::{Modal, ModalPhase};
pub use role::Role;
pub use routes::{
    Access, LoadedPage, PageId, PageOutcome, RedirectReason, Resolution, RouteNode, RouteTable,
    app_routes,
};
pub use session::{Session, SessionStore, SessionUser};
pub use table::{ColumnDef, RowCommand, Table, TableRow};

pub use peerly_api::{TlsMode, TransportConfig};
