//! TodoSession — wires the optimistic store to the remote collection.
//!
//! Every user action follows the same shape: mutate the store immediately,
//! issue the remote call, then confirm with the authoritative record or
//! roll back and surface the error through the store's banner slot. The
//! store never talks to the network; this is the only place the two meet.
//!
//! Each operation runs its mutation to completion before returning, so per-
//! identifier serialization holds by construction; the store additionally
//! rejects overlapping mutations on the same id with MutationInFlight.

use async_trait::async_trait;
use jot_core::{StoreError, Todo, TodoDraft, TodoPatch, TodoStore};
use thiserror::Error;
use tracing::debug;

use crate::api::{ApiError, TodoApi};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Remote side of the sync protocol.
///
/// `TodoApi` is the real implementation; tests substitute an in-memory fake.
#[async_trait]
pub trait TodoBackend {
    async fn list(&self) -> Result<Vec<Todo>, ApiError>;
    async fn create(&self, draft: &TodoDraft) -> Result<Todo, ApiError>;
    async fn update(&self, id: &str, patch: &TodoPatch) -> Result<Todo, ApiError>;
    async fn delete(&self, id: &str) -> Result<(), ApiError>;
}

#[async_trait]
impl TodoBackend for TodoApi {
    async fn list(&self) -> Result<Vec<Todo>, ApiError> {
        TodoApi::list(self).await
    }

    async fn create(&self, draft: &TodoDraft) -> Result<Todo, ApiError> {
        TodoApi::create(self, draft).await
    }

    async fn update(&self, id: &str, patch: &TodoPatch) -> Result<Todo, ApiError> {
        TodoApi::update(self, id, patch).await
    }

    async fn delete(&self, id: &str) -> Result<(), ApiError> {
        TodoApi::delete(self, id).await
    }
}

pub struct TodoSession<B> {
    store: TodoStore,
    backend: B,
}

impl<B: TodoBackend> TodoSession<B> {
    pub fn new(backend: B) -> Self {
        Self {
            store: TodoStore::new(),
            backend,
        }
    }

    pub fn store(&self) -> &TodoStore {
        &self.store
    }

    /// Replace the local view with the authoritative list.
    pub async fn load(&mut self) -> Result<(), SyncError> {
        self.store.set_loading(true);
        let result = self.backend.list().await;
        self.store.set_loading(false);

        match result {
            Ok(todos) => {
                debug!(count = todos.len(), "loaded todos");
                self.store.replace_all(todos);
                self.store.clear_error();
                Ok(())
            }
            Err(e) => {
                self.store.set_error("failed to load todos");
                Err(e.into())
            }
        }
    }

    /// Create a todo. Returns the server-assigned id on success.
    ///
    /// A blank title is rejected before the store or the network sees it.
    pub async fn add(&mut self, title: &str) -> Result<String, SyncError> {
        let title = title.trim();
        if title.is_empty() {
            self.store.set_error("title must not be empty");
            return Err(ApiError::EmptyTitle.into());
        }

        let draft = TodoDraft::new(title);
        let temp_id = self.store.optimistic_add(draft.clone());

        match self.backend.create(&draft).await {
            Ok(todo) => {
                let real_id = todo.id.clone();
                self.store.confirm_optimistic(&temp_id, todo);
                Ok(real_id)
            }
            Err(e) => {
                self.store.rollback_optimistic(&temp_id);
                self.store.set_error("failed to create todo");
                Err(e.into())
            }
        }
    }

    pub async fn set_completed(&mut self, id: &str, completed: bool) -> Result<(), SyncError> {
        self.apply_patch(id, TodoPatch::default().with_completed(completed))
            .await
    }

    pub async fn toggle(&mut self, id: &str) -> Result<(), SyncError> {
        let completed = match self.store.get(id) {
            Some(t) => t.completed,
            None => return Err(StoreError::NotFound { id: id.to_string() }.into()),
        };
        self.set_completed(id, !completed).await
    }

    pub async fn rename(&mut self, id: &str, title: &str) -> Result<(), SyncError> {
        self.apply_patch(id, TodoPatch::default().with_title(title.trim()))
            .await
    }

    pub async fn remove(&mut self, id: &str) -> Result<(), SyncError> {
        self.store.optimistic_delete(id)?;

        match self.backend.delete(id).await {
            Ok(()) => {
                self.store.confirm_delete(id);
                Ok(())
            }
            Err(e) => {
                self.store.rollback_optimistic(id);
                self.store.set_error("failed to delete todo");
                Err(e.into())
            }
        }
    }

    async fn apply_patch(&mut self, id: &str, patch: TodoPatch) -> Result<(), SyncError> {
        // NotFound / MutationInFlight propagate before any network call.
        self.store.optimistic_update(id, &patch)?;

        match self.backend.update(id, &patch).await {
            Ok(todo) => {
                self.store.confirm_optimistic(id, todo);
                Ok(())
            }
            Err(e) => {
                self.store.rollback_optimistic(id);
                self.store.set_error("failed to update todo");
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jot_core::is_temp_id;
    use std::sync::Mutex;

    /// In-memory stand-in for the remote collection. `fail_next_call` makes
    /// the next call answer 500, the way a broken server would.
    #[derive(Default)]
    struct FakeBackend {
        todos: Mutex<Vec<Todo>>,
        next_id: Mutex<u32>,
        fail: Mutex<bool>,
        calls: Mutex<usize>,
    }

    impl FakeBackend {
        fn seeded(todos: Vec<Todo>) -> Self {
            Self {
                todos: Mutex::new(todos),
                ..Self::default()
            }
        }

        fn fail_next_call(&self) {
            *self.fail.lock().unwrap() = true;
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }

        fn gate(&self, what: &str) -> Result<(), ApiError> {
            *self.calls.lock().unwrap() += 1;
            if std::mem::take(&mut *self.fail.lock().unwrap()) {
                return Err(ApiError::Remote {
                    status: 500,
                    message: format!("failed to {what}"),
                    details: None,
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl TodoBackend for FakeBackend {
        async fn list(&self) -> Result<Vec<Todo>, ApiError> {
            self.gate("fetch todos")?;
            Ok(self.todos.lock().unwrap().clone())
        }

        async fn create(&self, draft: &TodoDraft) -> Result<Todo, ApiError> {
            self.gate("create todo")?;
            let mut next = self.next_id.lock().unwrap();
            *next += 1;
            let todo = Todo::new(format!("{}", 100 + *next), draft.title.clone())
                .with_completed(draft.completed);
            self.todos.lock().unwrap().insert(0, todo.clone());
            Ok(todo)
        }

        async fn update(&self, id: &str, patch: &TodoPatch) -> Result<Todo, ApiError> {
            self.gate("update todo")?;
            let mut todos = self.todos.lock().unwrap();
            let todo = todos
                .iter_mut()
                .find(|t| t.id == id)
                .ok_or_else(|| ApiError::Remote {
                    status: 404,
                    message: "failed to update todo".to_string(),
                    details: None,
                })?;
            patch.apply(todo);
            Ok(todo.clone())
        }

        async fn delete(&self, id: &str) -> Result<(), ApiError> {
            self.gate("delete todo")?;
            let mut todos = self.todos.lock().unwrap();
            let before = todos.len();
            todos.retain(|t| t.id != id);
            if todos.len() == before {
                return Err(ApiError::Remote {
                    status: 404,
                    message: "failed to delete todo".to_string(),
                    details: None,
                });
            }
            Ok(())
        }
    }

    fn seeded_session(todos: Vec<Todo>) -> TodoSession<FakeBackend> {
        TodoSession::new(FakeBackend::seeded(todos))
    }

    #[tokio::test]
    async fn add_confirms_against_server_record() {
        let mut session = seeded_session(vec![]);
        session.load().await.unwrap();

        let id = session.add("Buy milk").await.unwrap();
        assert!(!is_temp_id(&id));

        let store = session.store();
        assert_eq!(store.len(), 1);
        let t = store.get(&id).unwrap();
        assert_eq!(t.title, "Buy milk");
        assert!(!t.optimistic);
    }

    #[tokio::test]
    async fn add_rolls_back_on_remote_failure() {
        let mut session = seeded_session(vec![]);
        session.load().await.unwrap();

        session.backend.fail_next_call();
        let err = session.add("Buy milk").await.unwrap_err();
        assert!(matches!(err, SyncError::Api(ApiError::Remote { status: 500, .. })));

        assert!(session.store().is_empty());
        assert_eq!(session.store().last_error(), Some("failed to create todo"));
    }

    #[tokio::test]
    async fn blank_title_never_reaches_store_or_network() {
        let mut session = seeded_session(vec![]);

        let err = session.add("   ").await.unwrap_err();
        assert!(matches!(err, SyncError::Api(ApiError::EmptyTitle)));
        assert!(session.store().is_empty());
        assert_eq!(session.backend.calls(), 0);
    }

    #[tokio::test]
    async fn toggle_failure_restores_prior_state() {
        let mut session = seeded_session(vec![Todo::new("1", "Buy milk")]);
        session.load().await.unwrap();

        session.backend.fail_next_call();
        session.toggle("1").await.unwrap_err();

        let t = session.store().get("1").unwrap();
        assert!(!t.completed);
        assert!(!t.optimistic);
        assert_eq!(session.store().last_error(), Some("failed to update todo"));
    }

    #[tokio::test]
    async fn toggle_round_trips_through_the_backend() {
        let mut session = seeded_session(vec![Todo::new("1", "Buy milk")]);
        session.load().await.unwrap();

        session.toggle("1").await.unwrap();
        assert!(session.store().get("1").unwrap().completed);

        session.toggle("1").await.unwrap();
        assert!(!session.store().get("1").unwrap().completed);
    }

    #[tokio::test]
    async fn remove_failure_restores_record() {
        let mut session = seeded_session(vec![Todo::new("1", "keep me")]);
        session.load().await.unwrap();

        session.backend.fail_next_call();
        session.remove("1").await.unwrap_err();

        assert_eq!(session.store().len(), 1);
        assert!(!session.store().get("1").unwrap().optimistic);
        assert_eq!(session.store().last_error(), Some("failed to delete todo"));
    }

    #[tokio::test]
    async fn remove_missing_id_is_a_local_error() {
        let mut session = seeded_session(vec![]);
        session.load().await.unwrap();
        let calls_after_load = session.backend.calls();

        let err = session.remove("ghost").await.unwrap_err();
        assert!(matches!(
            err,
            SyncError::Store(StoreError::NotFound { .. })
        ));
        assert_eq!(session.backend.calls(), calls_after_load);
    }

    #[tokio::test]
    async fn load_failure_sets_banner_and_keeps_old_view() {
        let mut session = seeded_session(vec![Todo::new("1", "old")]);
        session.load().await.unwrap();

        session.backend.fail_next_call();
        session.load().await.unwrap_err();

        assert_eq!(session.store().len(), 1);
        assert_eq!(session.store().last_error(), Some("failed to load todos"));
        assert!(!session.store().is_loading());
    }
}
