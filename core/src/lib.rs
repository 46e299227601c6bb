//! Synchronous core of a to-do list backed by a tabular record store.
//!
//! # Overview
//! Builds `HttpRequest` values and parses `HttpResponse` values without
//! touching the network (host-does-IO pattern). On top of that sits
//! `TodoStore`, which keeps the local list in step with the record store:
//! list with sort and search, create, optimistic complete with rollback,
//! and edit.
//!
//! # Design
//! - `RecordClient` is stateless; it holds only the table endpoint and token.
//! - Every store operation is a `begin_*` / `finish_*` pair so the host can
//!   run the round trip however it likes and overlap operations freely.
//! - All state transitions go through `TodoState::apply` and a typed
//!   `Action`.
//! - Wire DTOs are defined independently from the record-server crate;
//!   integration tests catch schema drift.

pub mod client;
pub mod error;
pub mod http;
pub mod query;
pub mod state;
pub mod store;
pub mod types;
pub mod view;

pub use client::RecordClient;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use query::{SortDirection, SortField, ViewQuery};
pub use state::{Action, TodoState};
pub use store::{Outcome, PendingComplete, PendingCreate, PendingFetch, PendingUpdate, TodoStore};
pub use types::{Record, RecordFields, RecordList, Todo, TodoDraft};
pub use view::{CreateForm, ItemView, ListRender, ListView, QueryForm};
