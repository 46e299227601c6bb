//! Session state and the reducer that owns every transition.
//!
//! # Design
//! All mutation of the to-do list, the loading/saving flags and the error
//! banner goes through `TodoState::apply`, one `Action` at a time. The store
//! decides which action to dispatch; this module decides what the action
//! does, so the optimistic and rollback paths can be tested without any
//! request plumbing.
//!
//! Two counters guard against late responses:
//! - fetches are numbered; a list response older than the last applied one
//!   is dropped, and only the newest issued fetch clears `is_loading`.
//! - every todo carries a local revision, bumped on each local write. A
//!   rollback or an update response only lands if the revision it was
//!   issued against is still current.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::types::Todo;

/// Suffix appended to the error banner when a local change was undone.
pub const REVERT_SUFFIX: &str = ". Reverting todo...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    FetchStart { seq: u64 },
    FetchSuccess { seq: u64, todos: Vec<Todo> },
    FetchFailure { seq: u64, message: String },
    CreateStart,
    CreateSuccess(Todo),
    CreateFailure(String),
    /// Input refused before any request was built.
    Rejected(String),
    CompleteOptimistic { id: String },
    CompleteFailure { snapshot: Todo, revision: u64, message: String },
    UpdateSuccess { todo: Todo, revision: u64 },
    UpdateFailure { snapshot: Todo, revision: u64, message: String },
    DismissError,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoState {
    todos: Vec<Todo>,
    fetch_issued: u64,
    fetch_applied: u64,
    is_loading: bool,
    creates_in_flight: usize,
    error_message: Option<String>,
    revisions: HashMap<String, u64>,
}

impl TodoState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn todo(&self, id: &str) -> Option<&Todo> {
        self.todos.iter().find(|t| t.id == id)
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_saving(&self) -> bool {
        self.creates_in_flight > 0
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    /// Local revision of a todo; zero until it is first written locally.
    pub fn revision(&self, id: &str) -> u64 {
        self.revisions.get(id).copied().unwrap_or(0)
    }

    pub fn apply(&mut self, action: Action) {
        debug!(?action, "applying action");
        match action {
            Action::FetchStart { seq } => {
                self.fetch_issued = self.fetch_issued.max(seq);
                self.is_loading = true;
            }
            Action::FetchSuccess { seq, todos } => {
                self.finish_fetch(seq);
                if seq <= self.fetch_applied {
                    warn!(seq, applied = self.fetch_applied, "dropping stale list response");
                    return;
                }
                self.fetch_applied = seq;
                self.revisions.retain(|id, _| todos.iter().any(|t| &t.id == id));
                self.todos = todos;
            }
            Action::FetchFailure { seq, message } => {
                self.finish_fetch(seq);
                if seq <= self.fetch_applied {
                    warn!(seq, applied = self.fetch_applied, "dropping stale list failure");
                    return;
                }
                // A failed newer fetch still supersedes older ones.
                self.fetch_applied = seq;
                self.error_message = Some(message);
            }
            Action::CreateStart => {
                self.creates_in_flight += 1;
            }
            Action::CreateSuccess(todo) => {
                self.creates_in_flight = self.creates_in_flight.saturating_sub(1);
                self.todos.push(todo);
            }
            Action::CreateFailure(message) => {
                self.creates_in_flight = self.creates_in_flight.saturating_sub(1);
                self.error_message = Some(message);
            }
            Action::Rejected(message) => {
                self.error_message = Some(message);
            }
            Action::CompleteOptimistic { id } => {
                if let Some(todo) = self.todos.iter_mut().find(|t| t.id == id) {
                    todo.is_completed = true;
                    self.bump(&id);
                }
            }
            Action::CompleteFailure { snapshot, revision, message }
            | Action::UpdateFailure { snapshot, revision, message } => {
                self.restore(snapshot, revision);
                self.error_message = Some(format!("{message}{REVERT_SUFFIX}"));
            }
            Action::UpdateSuccess { todo, revision } => {
                if self.revision(&todo.id) != revision {
                    warn!(id = %todo.id, "dropping update response for a todo changed since");
                    return;
                }
                let Some(local) = self.todos.iter_mut().find(|t| t.id == todo.id) else {
                    return;
                };
                local.title = todo.title;
                local.is_completed = todo.is_completed;
                if todo.created_time.is_some() {
                    local.created_time = todo.created_time;
                }
                self.bump(&todo.id);
            }
            Action::DismissError => {
                self.error_message = None;
            }
        }
    }

    fn finish_fetch(&mut self, seq: u64) {
        if seq >= self.fetch_issued {
            self.is_loading = false;
        }
    }

    fn bump(&mut self, id: &str) {
        *self.revisions.entry(id.to_string()).or_insert(0) += 1;
    }

    fn restore(&mut self, snapshot: Todo, revision: u64) {
        if self.revision(&snapshot.id) != revision {
            warn!(id = %snapshot.id, "todo changed since the failed request; keeping newer state");
            return;
        }
        let id = snapshot.id.clone();
        if let Some(local) = self.todos.iter_mut().find(|t| t.id == id) {
            warn!(%id, "reverting todo to its snapshot");
            *local = snapshot;
            // Tickets issued before the revert must not land on top of it.
            self.bump(&id);
        }
    }
}
