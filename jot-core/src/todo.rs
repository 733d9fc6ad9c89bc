//! Todo model shared by the store, the remote client, and the CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Core todo type.
///
/// Note: the serialized shape matches the remote collection exactly
/// (`{id, title, completed, created_at, updated_at}` with RFC 3339
/// timestamps). `optimistic` is local bookkeeping and never goes on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub title: String,
    pub completed: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// True while a local mutation on this record awaits remote confirmation.
    #[serde(skip)]
    pub optimistic: bool,
}

impl Todo {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            title: title.into(),
            completed: false,
            created_at: now,
            updated_at: now,
            optimistic: false,
        }
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = completed;
        self
    }
}

/// Fields a caller supplies when creating a todo; doubles as the POST body.
#[derive(Debug, Clone, Serialize)]
pub struct TodoDraft {
    pub title: String,
    pub completed: bool,
}

impl TodoDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            completed: false,
        }
    }
}

/// Partial update; `None` fields are left untouched and omitted from the
/// PUT body.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TodoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TodoPatch {
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.completed.is_none()
    }

    /// Merge into an existing record. Timestamps are the caller's concern.
    pub fn apply(&self, todo: &mut Todo) {
        if let Some(title) = &self.title {
            todo.title = title.clone();
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optimistic_marker_stays_local() {
        let mut t = Todo::new("1", "Buy milk");
        t.optimistic = true;

        let json = serde_json::to_string(&t).unwrap();
        assert!(!json.contains("optimistic"));

        let back: Todo = serde_json::from_str(&json).unwrap();
        assert!(!back.optimistic);
        assert_eq!(back.title, "Buy milk");
    }

    #[test]
    fn patch_serializes_only_set_fields() {
        let patch = TodoPatch::default().with_completed(true);
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"completed":true}"#);
    }
}
