//! jot-client: typed client for the remote todo collection plus the sync
//! session that reconciles optimistic local state against it

pub mod api;
pub mod session;

pub use api::{ApiConfig, ApiError, TodoApi};
pub use session::{SyncError, TodoBackend, TodoSession};
