//! TodoStore — optimistic, rollback-capable view of the remote collection.
//!
//! Purpose:
//! - Apply local mutations immediately so the caller never waits on the
//!   network to show the user's intent.
//! - Track which records are unconfirmed and reconcile them against the
//!   authoritative records (or failures) the remote calls return later.
//!
//! Design (v0):
//! - Keep todos in a Vec, newest first. Order is display-only.
//! - Speculative creates get a "temp-" id from a local counter, so a
//!   temporary id can never collide with a server-assigned one.
//! - Before a speculative update/delete the prior record is snapshotted;
//!   rollback restores the snapshot in place instead of dropping the record.
//! - One outstanding mutation per id: a second optimistic call on a record
//!   that is still unconfirmed fails with MutationInFlight.
//! - The store itself never performs I/O and never throws past its Result;
//!   the caller owns the remote calls and decides confirm vs rollback.

use crate::todo::{Todo, TodoDraft, TodoPatch};
use chrono::Utc;
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

pub const TEMP_ID_PREFIX: &str = "temp-";

pub fn is_temp_id(id: &str) -> bool {
    id.starts_with(TEMP_ID_PREFIX)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no todo with id {id}")]
    NotFound { id: String },

    #[error("todo {id} already has a mutation in flight")]
    MutationInFlight { id: String },
}

#[derive(Debug, Default)]
pub struct TodoStore {
    todos: Vec<Todo>,

    // id -> pre-mutation copy, kept until confirm or rollback resolves it.
    snapshots: HashMap<String, Todo>,

    // Monotonic source for temp ids.
    next_temp: u64,

    loading: bool,
    last_error: Option<String>,
}

impl TodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn len(&self) -> usize {
        self.todos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Todo> {
        self.todos.iter().find(|t| t.id == id)
    }

    /// Replace the whole collection with the authoritative list.
    ///
    /// Used at session start (and reloads). Pending snapshots are dropped:
    /// the incoming list is the source of truth for every id it contains.
    pub fn replace_all(&mut self, todos: Vec<Todo>) {
        self.todos = todos;
        self.snapshots.clear();
    }

    /// Insert a speculative record at the front and return its temporary id.
    ///
    /// The caller uses the returned id to correlate the eventual remote
    /// response (confirm) or failure (rollback).
    pub fn optimistic_add(&mut self, draft: TodoDraft) -> String {
        self.next_temp += 1;
        let id = format!("{TEMP_ID_PREFIX}{}", self.next_temp);

        let mut todo = Todo::new(id.clone(), draft.title);
        todo.completed = draft.completed;
        todo.optimistic = true;

        debug!(id = %id, "speculative create");
        self.todos.insert(0, todo);
        id
    }

    /// Merge `patch` into the record matching `id` and mark it speculative.
    pub fn optimistic_update(&mut self, id: &str, patch: &TodoPatch) -> Result<(), StoreError> {
        let Some(todo) = self.todos.iter_mut().find(|t| t.id == id) else {
            return Err(StoreError::NotFound { id: id.to_string() });
        };
        if todo.optimistic {
            return Err(StoreError::MutationInFlight { id: id.to_string() });
        }

        self.snapshots.insert(id.to_string(), todo.clone());
        patch.apply(todo);
        todo.updated_at = Utc::now();
        todo.optimistic = true;

        debug!(id = %id, "speculative update");
        Ok(())
    }

    /// Mark the record matching `id` as speculatively deleted.
    ///
    /// The record stays in the collection so a failed remote delete can
    /// restore it without a re-fetch; physical removal happens in
    /// `confirm_delete`.
    pub fn optimistic_delete(&mut self, id: &str) -> Result<(), StoreError> {
        let Some(todo) = self.todos.iter_mut().find(|t| t.id == id) else {
            return Err(StoreError::NotFound { id: id.to_string() });
        };
        if todo.optimistic {
            return Err(StoreError::MutationInFlight { id: id.to_string() });
        }

        self.snapshots.insert(id.to_string(), todo.clone());
        todo.optimistic = true;

        debug!(id = %id, "speculative delete");
        Ok(())
    }

    /// Commit point: replace the speculative record with the authoritative
    /// one returned by the remote call.
    ///
    /// `id` is the id the caller mutated under: the temporary id for
    /// creates, the real id for updates. Matching also accepts the
    /// authoritative id, so calling this twice with the same arguments
    /// leaves the collection exactly as one call would.
    pub fn confirm_optimistic(&mut self, id: &str, mut authoritative: Todo) {
        authoritative.optimistic = false;
        self.snapshots.remove(id);
        self.snapshots.remove(&authoritative.id);

        let pos = self
            .todos
            .iter()
            .position(|t| t.id == id || t.id == authoritative.id);

        match pos {
            Some(i) => {
                debug!(id = %id, real_id = %authoritative.id, "confirmed");
                self.todos[i] = authoritative;
            }
            None => {
                // Record was already dropped (e.g. a reload raced the call).
                warn!(id = %id, "confirm for unknown id; ignoring");
            }
        }
    }

    /// Remove the record after the remote delete succeeded. Idempotent.
    pub fn confirm_delete(&mut self, id: &str) {
        self.snapshots.remove(id);
        self.todos.retain(|t| t.id != id);
    }

    /// Undo a speculative mutation after its remote call failed.
    ///
    /// Temporary ids are removed outright (the record never existed
    /// remotely); known ids are restored from their pre-mutation snapshot.
    /// Anything else is a logged no-op.
    pub fn rollback_optimistic(&mut self, id: &str) {
        if is_temp_id(id) {
            let before = self.todos.len();
            self.todos.retain(|t| t.id != id);
            if self.todos.len() == before {
                warn!(id = %id, "rollback for unknown temp id");
            }
            return;
        }

        match self.snapshots.remove(id) {
            Some(prior) => {
                debug!(id = %id, "rolled back to prior state");
                if let Some(slot) = self.todos.iter_mut().find(|t| t.id == id) {
                    *slot = prior;
                }
            }
            None => warn!(id = %id, "rollback without a pending mutation; ignoring"),
        }
    }

    pub fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Latest-error slot. Each new error replaces the previous one; the UI
    /// shows it as a single dismissible banner.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}
