//! A to-do session: the store plus a transport that runs its round trips.
//!
//! Each intent (refresh, add, complete, edit, change the query) begins the
//! store operation, executes the request, and finishes it. Failures end up
//! in `state().error_message()`; nothing is returned to the caller.

use todo_core::{
    ApiError, HttpRequest, Outcome, RecordClient, Todo, TodoDraft, TodoState, TodoStore, ViewQuery,
};
use tracing::info;

use crate::config::HostConfig;
use crate::transport::{Transport, UreqTransport};

pub struct TodoApp<T> {
    store: TodoStore,
    transport: T,
    query: ViewQuery,
}

impl TodoApp<UreqTransport> {
    /// Session against the configured table over HTTP.
    pub fn connect(config: &HostConfig) -> Self {
        info!(api_url = %config.api_url, base_id = %config.base_id, table = %config.table_name, "connecting");
        Self::new(config, UreqTransport::new(config.timeout))
    }
}

impl<T: Transport> TodoApp<T> {
    pub fn new(config: &HostConfig, transport: T) -> Self {
        let client = RecordClient::new(&config.api_url, &config.base_id, &config.table_name, &config.token);
        Self {
            store: TodoStore::new(client),
            transport,
            query: ViewQuery::default(),
        }
    }

    pub fn state(&self) -> &TodoState {
        self.store.state()
    }

    pub fn query(&self) -> &ViewQuery {
        &self.query
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Fetch the list for the current query.
    pub fn refresh(&mut self) {
        let pending = self.store.begin_fetch(&self.query);
        let outcome = self.round_trip(pending.request());
        self.store.finish_fetch(pending, outcome);
    }

    /// Replace the query; fetches again only when it actually changed.
    pub fn set_query(&mut self, query: ViewQuery) -> bool {
        if query == self.query {
            return false;
        }
        self.query = query;
        self.refresh();
        true
    }

    pub fn add_todo(&mut self, draft: &TodoDraft) {
        if let Some(pending) = self.store.begin_create(draft) {
            let outcome = self.round_trip(pending.request());
            self.store.finish_create(pending, outcome);
        }
    }

    pub fn complete_todo(&mut self, id: &str) {
        if let Some(pending) = self.store.begin_complete(id) {
            let outcome = self.round_trip(pending.request());
            self.store.finish_complete(pending, outcome);
        }
    }

    pub fn update_todo(&mut self, edited: &Todo) {
        if let Some(pending) = self.store.begin_update(edited) {
            let outcome = self.round_trip(pending.request());
            self.store.finish_update(pending, outcome);
        }
    }

    pub fn dismiss_error(&mut self) {
        self.store.dismiss_error();
    }

    fn round_trip(&self, request: &HttpRequest) -> Outcome {
        self.transport.execute(request).map_err(ApiError::from)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::time::Duration;

    use todo_core::{HttpMethod, HttpResponse, SortField};

    use super::*;
    use crate::transport::TransportError;

    /// Replays canned responses in order and remembers every request.
    #[derive(Default)]
    struct Scripted {
        responses: RefCell<VecDeque<Result<HttpResponse, TransportError>>>,
        seen: RefCell<Vec<HttpRequest>>,
    }

    impl Scripted {
        fn push_ok(&self, body: serde_json::Value) {
            self.responses.borrow_mut().push_back(Ok(HttpResponse {
                status: 200,
                status_text: "OK".to_string(),
                headers: Vec::new(),
                body: body.to_string(),
            }));
        }

        fn push(&self, response: Result<HttpResponse, TransportError>) {
            self.responses.borrow_mut().push_back(response);
        }
    }

    impl Transport for Scripted {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.borrow_mut().push(request.clone());
            self.responses
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Request("no scripted response".to_string())))
        }
    }

    fn config() -> HostConfig {
        HostConfig {
            api_url: "http://localhost:3000/v0".to_string(),
            base_id: "appTest".to_string(),
            table_name: "Todos".to_string(),
            token: "test-token".to_string(),
            timeout: Duration::from_secs(1),
        }
    }

    #[test]
    fn unchanged_query_does_not_fetch() {
        let transport = Scripted::default();
        let mut app = TodoApp::new(&config(), &transport);
        assert!(!app.set_query(ViewQuery::default()));
        assert!(transport.seen.borrow().is_empty());
    }

    #[test]
    fn changed_query_fetches_once() {
        let transport = Scripted::default();
        transport.push_ok(serde_json::json!({"records": []}));
        let mut app = TodoApp::new(&config(), &transport);

        let query = ViewQuery {
            sort_field: SortField::Title,
            ..ViewQuery::default()
        };
        assert!(app.set_query(query.clone()));
        assert!(!app.set_query(query));

        let seen = transport.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, HttpMethod::Get);
        assert!(seen[0].url.contains("sort%5B0%5D%5Bfield%5D=title"));
    }

    #[test]
    fn transport_failure_lands_in_state() {
        let transport = Scripted::default();
        transport.push(Err(TransportError::Request("connection reset".to_string())));
        let mut app = TodoApp::new(&config(), &transport);
        app.refresh();
        assert_eq!(app.state().error_message(), Some("connection reset"));
        app.dismiss_error();
        assert!(app.state().error_message().is_none());
    }

    #[test]
    fn blank_draft_never_reaches_the_transport() {
        let transport = Scripted::default();
        let mut app = TodoApp::new(&config(), &transport);
        app.add_todo(&TodoDraft::new(""));
        assert!(transport.seen.borrow().is_empty());
        assert!(app.state().error_message().is_some());
    }

    #[test]
    fn complete_then_rollback_through_the_session() {
        let transport = Scripted::default();
        transport.push_ok(serde_json::json!({"records": [{"id": "rec1", "fields": {"title": "Buy milk"}}]}));
        transport.push(Ok(HttpResponse {
            status: 500,
            status_text: "Internal Server Error".to_string(),
            headers: Vec::new(),
            body: String::new(),
        }));
        let mut app = TodoApp::new(&config(), &transport);
        app.refresh();
        app.complete_todo("rec1");

        assert!(!app.state().todo("rec1").unwrap().is_completed);
        assert_eq!(
            app.state().error_message(),
            Some("Internal Server Error. Reverting todo...")
        );
        assert_eq!(transport.seen.borrow()[1].method, HttpMethod::Patch);
    }
}
