//! jot-core: Core types and the optimistic store for the Jot todo client

pub mod store;
pub mod todo;

pub use store::{StoreError, TodoStore, is_temp_id, TEMP_ID_PREFIX};
pub use todo::{Todo, TodoDraft, TodoPatch};
