//! The authoritative in-process todo collection.
//!
//! # Design
//! All state sits behind one `RwLock`. Mutations (`create`, `update_status`,
//! `delete`) hold the write lock across their whole check-then-act sequence,
//! so title uniqueness and id allocation cannot race. Reads share the lock
//! and never observe a half-applied mutation.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::mirror::{MirrorEvent, TodoMirror};
use crate::types::{NewTodo, SortKey, Status, StatusFilter, Todo};

#[derive(Debug)]
struct Inner {
    // Ids are allocated in increasing order, so key order is insertion order.
    todos: BTreeMap<u64, Todo>,
    next_id: u64,
}

pub struct TodoStore {
    inner: RwLock<Inner>,
    mirrors: Vec<Arc<dyn TodoMirror>>,
}

impl Default for TodoStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TodoStore {
    pub fn new() -> Self {
        Self::with_mirrors(Vec::new())
    }

    /// Store that forwards every committed mutation to `mirrors`.
    pub fn with_mirrors(mirrors: Vec<Arc<dyn TodoMirror>>) -> Self {
        Self {
            inner: RwLock::new(Inner {
                todos: BTreeMap::new(),
                next_id: 1,
            }),
            mirrors,
        }
    }

    /// Inserts a new `PENDING` todo and returns its id.
    ///
    /// Fails if the title is already taken or the due date lies in the past.
    #[tracing::instrument(skip(self, new), fields(title = %new.title))]
    pub async fn create(&self, new: NewTodo) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;

        if inner.todos.values().any(|todo| todo.title == new.title) {
            return Err(StoreError::DuplicateTitle(new.title));
        }
        if new.due_date < Utc::now() {
            return Err(StoreError::DueDateInPast);
        }

        let id = inner.next_id;
        inner.next_id += 1;
        let todo = Todo {
            id,
            title: new.title,
            content: new.content,
            status: Status::Pending,
            due_date: new.due_date,
        };
        inner.todos.insert(id, todo.clone());
        tracing::debug!(id, "todo created");

        self.publish(MirrorEvent::Inserted(todo));
        Ok(id)
    }

    pub async fn count(&self, filter: StatusFilter) -> usize {
        let inner = self.inner.read().await;
        inner
            .todos
            .values()
            .filter(|todo| filter.matches(todo.status))
            .count()
    }

    /// Matching todos, sorted ascending by `sort`. Ties keep id order.
    pub async fn list(&self, filter: StatusFilter, sort: SortKey) -> Vec<Todo> {
        let mut todos: Vec<Todo> = {
            let inner = self.inner.read().await;
            inner
                .todos
                .values()
                .filter(|todo| filter.matches(todo.status))
                .cloned()
                .collect()
        };
        match sort {
            // Already in id order.
            SortKey::Id => {}
            SortKey::DueDate => todos.sort_by_key(|todo| todo.due_date),
            SortKey::Title => todos.sort_by(|a, b| a.title.cmp(&b.title)),
        }
        todos
    }

    pub async fn contains(&self, id: u64) -> bool {
        self.inner.read().await.todos.contains_key(&id)
    }

    /// Sets a new status and returns the one it replaced.
    #[tracing::instrument(skip(self))]
    pub async fn update_status(&self, id: u64, status: Status) -> Result<Status, StoreError> {
        let mut inner = self.inner.write().await;
        let todo = inner
            .todos
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(id))?;
        let previous = std::mem::replace(&mut todo.status, status);
        tracing::debug!(%previous, "status updated");

        self.publish(MirrorEvent::StatusChanged { id, status });
        Ok(previous)
    }

    /// Removes a todo and returns how many remain.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: u64) -> Result<usize, StoreError> {
        let mut inner = self.inner.write().await;
        inner
            .todos
            .remove(&id)
            .ok_or_else(|| StoreError::not_found(id))?;
        let remaining = inner.todos.len();
        tracing::debug!(remaining, "todo deleted");

        self.publish(MirrorEvent::Removed { id });
        Ok(remaining)
    }

    fn publish(&self, event: MirrorEvent) {
        for mirror in &self.mirrors {
            if let Err(err) = mirror.apply(&event) {
                tracing::warn!(mirror = mirror.name(), error = %err, "mirror write failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::{DateTime, Duration};

    use super::*;
    use crate::mirror::MirrorError;

    fn in_days(days: i64) -> DateTime<Utc> {
        Utc::now() + Duration::days(days)
    }

    fn new_todo(title: &str, due_in_days: i64) -> NewTodo {
        NewTodo {
            title: title.to_string(),
            content: format!("content of {title}"),
            due_date: in_days(due_in_days),
        }
    }

    #[derive(Default)]
    struct RecordingMirror {
        events: Mutex<Vec<MirrorEvent>>,
    }

    impl TodoMirror for RecordingMirror {
        fn name(&self) -> &str {
            "recording"
        }

        fn apply(&self, event: &MirrorEvent) -> Result<(), MirrorError> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    struct FailingMirror;

    impl TodoMirror for FailingMirror {
        fn name(&self) -> &str {
            "failing"
        }

        fn apply(&self, _event: &MirrorEvent) -> Result<(), MirrorError> {
            Err(MirrorError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids_from_one() {
        let store = TodoStore::new();
        assert_eq!(store.create(new_todo("a", 1)).await.unwrap(), 1);
        assert_eq!(store.create(new_todo("b", 1)).await.unwrap(), 2);
        assert_eq!(store.create(new_todo("c", 1)).await.unwrap(), 3);
        assert_eq!(store.count(StatusFilter::All).await, 3);
    }

    #[tokio::test]
    async fn created_todo_starts_pending() {
        let store = TodoStore::new();
        store.create(new_todo("a", 1)).await.unwrap();
        let todos = store.list(StatusFilter::All, SortKey::Id).await;
        assert_eq!(todos[0].status, Status::Pending);
        assert_eq!(todos[0].content, "content of a");
    }

    #[tokio::test]
    async fn duplicate_title_conflicts_regardless_of_other_fields() {
        let store = TodoStore::new();
        store.create(new_todo("Buy milk", 1)).await.unwrap();

        let err = store.create(new_todo("Buy milk", 30)).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateTitle(ref t) if t == "Buy milk"));
        assert_eq!(store.count(StatusFilter::All).await, 1);
    }

    #[tokio::test]
    async fn title_match_is_case_sensitive() {
        let store = TodoStore::new();
        store.create(new_todo("Buy milk", 1)).await.unwrap();
        assert!(store.create(new_todo("buy milk", 1)).await.is_ok());
    }

    #[tokio::test]
    async fn past_due_date_conflicts() {
        let store = TodoStore::new();
        let err = store.create(new_todo("late already", -1)).await.unwrap_err();
        assert!(matches!(err, StoreError::DueDateInPast));
        assert_eq!(store.count(StatusFilter::All).await, 0);
    }

    #[tokio::test]
    async fn failed_create_does_not_consume_an_id() {
        let store = TodoStore::new();
        store.create(new_todo("a", 1)).await.unwrap();
        store.create(new_todo("a", 1)).await.unwrap_err();
        store.create(new_todo("b", -1)).await.unwrap_err();
        assert_eq!(store.create(new_todo("b", 1)).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn list_sorts_by_requested_key() {
        let store = TodoStore::new();
        store.create(new_todo("charlie", 3)).await.unwrap();
        store.create(new_todo("alpha", 9)).await.unwrap();
        store.create(new_todo("bravo", 1)).await.unwrap();

        let ids = |todos: Vec<Todo>| todos.into_iter().map(|t| t.id).collect::<Vec<_>>();
        assert_eq!(ids(store.list(StatusFilter::All, SortKey::Id).await), vec![1, 2, 3]);
        assert_eq!(ids(store.list(StatusFilter::All, SortKey::DueDate).await), vec![3, 1, 2]);
        assert_eq!(ids(store.list(StatusFilter::All, SortKey::Title).await), vec![2, 3, 1]);
    }

    #[tokio::test]
    async fn title_sort_is_byte_wise() {
        let store = TodoStore::new();
        store.create(new_todo("banana", 1)).await.unwrap();
        store.create(new_todo("Zebra", 1)).await.unwrap();
        store.create(new_todo("apple", 1)).await.unwrap();

        let titles: Vec<String> = store
            .list(StatusFilter::All, SortKey::Title)
            .await
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["Zebra", "apple", "banana"]);
    }

    #[tokio::test]
    async fn list_filters_before_sorting() {
        let store = TodoStore::new();
        store.create(new_todo("a", 1)).await.unwrap();
        store.create(new_todo("b", 1)).await.unwrap();
        store.create(new_todo("c", 1)).await.unwrap();
        store.update_status(3, Status::Done).await.unwrap();
        store.update_status(1, Status::Done).await.unwrap();

        let done = store.list(StatusFilter::Only(Status::Done), SortKey::Id).await;
        assert_eq!(done.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 3]);
        assert!(store.list(StatusFilter::Only(Status::Late), SortKey::Id).await.is_empty());
    }

    #[tokio::test]
    async fn update_status_returns_previous_and_moves_buckets() {
        let store = TodoStore::new();
        store.create(new_todo("a", 1)).await.unwrap();

        assert_eq!(store.update_status(1, Status::Done).await.unwrap(), Status::Pending);
        assert_eq!(store.update_status(1, Status::Late).await.unwrap(), Status::Done);
        assert_eq!(store.count(StatusFilter::Only(Status::Pending)).await, 0);
        assert_eq!(store.count(StatusFilter::Only(Status::Done)).await, 0);
        assert_eq!(store.count(StatusFilter::Only(Status::Late)).await, 1);
    }

    #[tokio::test]
    async fn update_status_unknown_id_is_not_found() {
        let store = TodoStore::new();
        let err = store.update_status(9, Status::Done).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(ref id) if id == "9"));
    }

    #[tokio::test]
    async fn delete_returns_remaining_and_never_reuses_ids() {
        let store = TodoStore::new();
        store.create(new_todo("a", 1)).await.unwrap();
        store.create(new_todo("b", 1)).await.unwrap();

        assert_eq!(store.delete(2).await.unwrap(), 1);
        assert!(!store.contains(2).await);
        assert!(matches!(store.delete(2).await, Err(StoreError::NotFound(_))));

        assert_eq!(store.create(new_todo("c", 1)).await.unwrap(), 3);
        let ids: Vec<u64> = store
            .list(StatusFilter::All, SortKey::Id)
            .await
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn deleted_title_can_be_reused() {
        let store = TodoStore::new();
        store.create(new_todo("a", 1)).await.unwrap();
        store.delete(1).await.unwrap();
        assert_eq!(store.create(new_todo("a", 1)).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn concurrent_creates_with_same_title_admit_exactly_one() {
        let store = Arc::new(TodoStore::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.create(new_todo("race", 1)).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.count(StatusFilter::All).await, 1);
    }

    #[tokio::test]
    async fn mirrors_see_committed_mutations_in_order() {
        let recording = Arc::new(RecordingMirror::default());
        let store = TodoStore::with_mirrors(vec![recording.clone() as Arc<dyn TodoMirror>]);

        store.create(new_todo("a", 1)).await.unwrap();
        store.create(new_todo("a", 1)).await.unwrap_err();
        store.update_status(1, Status::Done).await.unwrap();
        store.update_status(5, Status::Done).await.unwrap_err();
        store.delete(1).await.unwrap();

        let events = recording.events.lock().unwrap();
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], MirrorEvent::Inserted(todo) if todo.id == 1));
        assert_eq!(events[1], MirrorEvent::StatusChanged { id: 1, status: Status::Done });
        assert_eq!(events[2], MirrorEvent::Removed { id: 1 });
    }

    #[tokio::test]
    async fn failing_mirror_does_not_affect_store_or_other_mirrors() {
        let recording = Arc::new(RecordingMirror::default());
        let store = TodoStore::with_mirrors(vec![
            Arc::new(FailingMirror) as Arc<dyn TodoMirror>,
            recording.clone(),
        ]);

        assert_eq!(store.create(new_todo("a", 1)).await.unwrap(), 1);
        assert_eq!(store.count(StatusFilter::All).await, 1);
        assert_eq!(recording.events.lock().unwrap().len(), 1);
    }
}
