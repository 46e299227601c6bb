//! The to-do store: local state kept in step with the record store.
//!
//! # Design
//! Each operation is a `begin_*` / `finish_*` pair around the host's network
//! round trip. `begin_*` applies whatever local change happens up front (the
//! optimistic completion, the loading or saving flag) and returns a pending
//! ticket holding the `HttpRequest` plus what `finish_*` needs to reconcile
//! or roll back. The host may hold several tickets at once and finish them
//! in any order; the reducer in `state` sorts out which responses still
//! apply.
//!
//! Failures never escape: `finish_*` turns them into the session's error
//! message. Nothing is retried.

use tracing::{debug, warn};

use crate::client::RecordClient;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::query::ViewQuery;
use crate::state::{Action, TodoState};
use crate::types::{Todo, TodoDraft};

const EMPTY_TITLE: &str = "Title must not be empty";

/// Result of the host's round trip: a response, or the reason there is none.
pub type Outcome = Result<HttpResponse, ApiError>;

/// A list request in flight.
#[derive(Debug)]
#[must_use = "the request must be executed and handed back to finish_fetch"]
pub struct PendingFetch {
    seq: u64,
    request: HttpRequest,
}

impl PendingFetch {
    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

/// A create request in flight.
#[derive(Debug)]
#[must_use = "the request must be executed and handed back to finish_create"]
pub struct PendingCreate {
    request: HttpRequest,
}

impl PendingCreate {
    pub fn request(&self) -> &HttpRequest {
        &self.request
    }
}

/// A completion in flight; the todo is already shown as completed.
#[derive(Debug)]
#[must_use = "the request must be executed and handed back to finish_complete"]
pub struct PendingComplete {
    snapshot: Todo,
    revision: u64,
    request: HttpRequest,
}

impl PendingComplete {
    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    /// The todo as it was before the optimistic write.
    pub fn snapshot(&self) -> &Todo {
        &self.snapshot
    }
}

/// An edit in flight; local state is untouched until it finishes.
#[derive(Debug)]
#[must_use = "the request must be executed and handed back to finish_update"]
pub struct PendingUpdate {
    snapshot: Todo,
    revision: u64,
    request: HttpRequest,
}

impl PendingUpdate {
    pub fn request(&self) -> &HttpRequest {
        &self.request
    }

    pub fn snapshot(&self) -> &Todo {
        &self.snapshot
    }
}

#[derive(Debug)]
pub struct TodoStore {
    client: RecordClient,
    state: TodoState,
    next_fetch_seq: u64,
}

impl TodoStore {
    pub fn new(client: RecordClient) -> Self {
        Self {
            client,
            state: TodoState::new(),
            next_fetch_seq: 0,
        }
    }

    pub fn state(&self) -> &TodoState {
        &self.state
    }

    pub fn client(&self) -> &RecordClient {
        &self.client
    }

    pub fn dismiss_error(&mut self) {
        self.state.apply(Action::DismissError);
    }

    pub fn begin_fetch(&mut self, query: &ViewQuery) -> PendingFetch {
        self.next_fetch_seq += 1;
        let seq = self.next_fetch_seq;
        self.state.apply(Action::FetchStart { seq });
        PendingFetch {
            seq,
            request: self.client.build_list(query),
        }
    }

    pub fn finish_fetch(&mut self, pending: PendingFetch, outcome: Outcome) {
        let seq = pending.seq;
        match outcome.and_then(|resp| self.client.parse_list(resp)) {
            Ok(todos) => {
                debug!(seq, count = todos.len(), "list fetched");
                self.state.apply(Action::FetchSuccess { seq, todos });
            }
            Err(e) => {
                warn!(seq, error = %e, "list fetch failed");
                self.state.apply(Action::FetchFailure {
                    seq,
                    message: e.to_string(),
                });
            }
        }
    }

    /// Start persisting a draft. Returns `None` (with the error message set)
    /// when the title is blank or the payload cannot be built.
    pub fn begin_create(&mut self, draft: &TodoDraft) -> Option<PendingCreate> {
        if draft.title.trim().is_empty() {
            self.state.apply(Action::Rejected(EMPTY_TITLE.to_string()));
            return None;
        }
        let request = match self.client.build_create(draft) {
            Ok(request) => request,
            Err(e) => {
                self.state.apply(Action::Rejected(e.to_string()));
                return None;
            }
        };
        self.state.apply(Action::CreateStart);
        Some(PendingCreate { request })
    }

    pub fn finish_create(&mut self, _pending: PendingCreate, outcome: Outcome) {
        match outcome.and_then(|resp| self.client.parse_create(resp)) {
            Ok(todo) => {
                debug!(id = %todo.id, "todo created");
                self.state.apply(Action::CreateSuccess(todo));
            }
            Err(e) => {
                warn!(error = %e, "create failed");
                self.state.apply(Action::CreateFailure(e.to_string()));
            }
        }
    }

    /// Mark a todo completed right away and return the PATCH that confirms
    /// it. `None` when no todo has this id.
    pub fn begin_complete(&mut self, id: &str) -> Option<PendingComplete> {
        let snapshot = self.state.todo(id)?.clone();
        let completed = Todo {
            is_completed: true,
            ..snapshot.clone()
        };
        let request = match self.client.build_update(&completed) {
            Ok(request) => request,
            Err(e) => {
                let revision = self.state.revision(id);
                self.state.apply(Action::CompleteFailure {
                    snapshot,
                    revision,
                    message: e.to_string(),
                });
                return None;
            }
        };
        self.state.apply(Action::CompleteOptimistic { id: id.to_string() });
        Some(PendingComplete {
            snapshot,
            revision: self.state.revision(id),
            request,
        })
    }

    /// A successful completion keeps the optimistic state as is; the
    /// returned record is not re-applied.
    pub fn finish_complete(&mut self, pending: PendingComplete, outcome: Outcome) {
        match outcome.and_then(|resp| self.client.parse_update(resp)) {
            Ok(todo) => debug!(id = %todo.id, "completion confirmed"),
            Err(e) => {
                warn!(id = %pending.snapshot.id, error = %e, "completion failed");
                self.state.apply(Action::CompleteFailure {
                    snapshot: pending.snapshot,
                    revision: pending.revision,
                    message: e.to_string(),
                });
            }
        }
    }

    /// Send an edited todo. Local state changes only once the record store
    /// answers. `None` when no todo has this id or the title is blank.
    pub fn begin_update(&mut self, edited: &Todo) -> Option<PendingUpdate> {
        let snapshot = self.state.todo(&edited.id)?.clone();
        if edited.title.trim().is_empty() {
            self.state.apply(Action::Rejected(EMPTY_TITLE.to_string()));
            return None;
        }
        let revision = self.state.revision(&edited.id);
        let request = match self.client.build_update(edited) {
            Ok(request) => request,
            Err(e) => {
                self.state.apply(Action::UpdateFailure {
                    snapshot,
                    revision,
                    message: e.to_string(),
                });
                return None;
            }
        };
        Some(PendingUpdate {
            snapshot,
            revision,
            request,
        })
    }

    pub fn finish_update(&mut self, pending: PendingUpdate, outcome: Outcome) {
        match outcome.and_then(|resp| self.client.parse_update(resp)) {
            Ok(todo) => {
                debug!(id = %todo.id, "update confirmed");
                self.state.apply(Action::UpdateSuccess {
                    todo,
                    revision: pending.revision,
                });
            }
            Err(e) => {
                warn!(id = %pending.snapshot.id, error = %e, "update failed");
                self.state.apply(Action::UpdateFailure {
                    snapshot: pending.snapshot,
                    revision: pending.revision,
                    message: e.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;

    fn store() -> TodoStore {
        TodoStore::new(RecordClient::new("http://localhost:3000/v0", "app", "Todos", "t"))
    }

    fn ok(body: &str) -> Outcome {
        Ok(HttpResponse {
            status: 200,
            status_text: "OK".to_string(),
            headers: Vec::new(),
            body: body.to_string(),
        })
    }

    #[test]
    fn fetch_sequence_numbers_increase() {
        let mut s = store();
        let first = s.begin_fetch(&ViewQuery::default());
        let second = s.begin_fetch(&ViewQuery::default());
        assert!(second.seq() > first.seq());
        assert_eq!(first.request().method, HttpMethod::Get);
        s.finish_fetch(second, ok(r#"{"records":[]}"#));
        s.finish_fetch(first, ok(r#"{"records":[{"id":"x","fields":{}}]}"#));
        assert!(s.state().todos().is_empty());
    }

    #[test]
    fn blank_title_is_rejected_without_request() {
        let mut s = store();
        assert!(s.begin_create(&TodoDraft::new("   ")).is_none());
        assert!(!s.state().is_saving());
        assert!(s.state().error_message().is_some());
    }

    #[test]
    fn complete_unknown_id_is_a_no_op() {
        let mut s = store();
        assert!(s.begin_complete("missing").is_none());
        assert!(s.state().error_message().is_none());
    }

    #[test]
    fn transport_error_takes_failure_path() {
        let mut s = store();
        let pending = s.begin_fetch(&ViewQuery::default());
        s.finish_fetch(pending, Err(ApiError::Transport("connection refused".to_string())));
        assert_eq!(s.state().error_message(), Some("connection refused"));
        assert!(!s.state().is_loading());
    }
}
