//! Stateless HTTP request builder and response parser for the record store.
//!
//! # Design
//! `RecordClient` holds only the table endpoint and the bearer token, and
//! carries no mutable state between calls. Each operation is split into a
//! `build_*` method that produces an `HttpRequest` and a `parse_*` method
//! that consumes an `HttpResponse`. The caller executes the actual HTTP
//! round trip, keeping the core deterministic and free of I/O dependencies.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::query::ViewQuery;
use crate::types::{NewRecord, RecordFields, RecordList, RecordPatch, Todo, TodoDraft, WriteRecords};

/// Synchronous, stateless client for one table of the record store.
#[derive(Clone)]
pub struct RecordClient {
    endpoint: String,
    token: String,
}

impl std::fmt::Debug for RecordClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordClient")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl RecordClient {
    /// `api_url` is the service root (e.g. `https://api.airtable.com/v0`);
    /// the table endpoint is `<api_url>/<base_id>/<table_name>`.
    pub fn new(api_url: &str, base_id: &str, table_name: &str, token: &str) -> Self {
        let endpoint = format!(
            "{}/{}/{}",
            api_url.trim_end_matches('/'),
            base_id,
            percent_encoding::utf8_percent_encode(table_name, percent_encoding::NON_ALPHANUMERIC)
        );
        Self {
            endpoint,
            token: token.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn build_list(&self, query: &ViewQuery) -> HttpRequest {
        let url = format!("{}?{}", self.endpoint, query.to_query_string());
        debug!(%url, "building list request");
        HttpRequest {
            method: HttpMethod::Get,
            url,
            headers: vec![self.auth_header()],
            body: None,
        }
    }

    pub fn build_create(&self, draft: &TodoDraft) -> Result<HttpRequest, ApiError> {
        let payload = WriteRecords {
            records: vec![NewRecord {
                fields: RecordFields {
                    title: Some(draft.title.clone()),
                    is_completed: Some(draft.is_completed),
                },
            }],
        };
        self.write_request(HttpMethod::Post, &payload)
    }

    /// PATCH the record with the todo's title and completion flag.
    pub fn build_update(&self, todo: &Todo) -> Result<HttpRequest, ApiError> {
        let payload = WriteRecords {
            records: vec![RecordPatch {
                id: todo.id.clone(),
                fields: RecordFields {
                    title: Some(todo.title.clone()),
                    is_completed: Some(todo.is_completed),
                },
            }],
        };
        self.write_request(HttpMethod::Patch, &payload)
    }

    pub fn parse_list(&self, response: HttpResponse) -> Result<Vec<Todo>, ApiError> {
        let list: RecordList = decode(response)?;
        Ok(list.records.into_iter().map(Todo::from).collect())
    }

    pub fn parse_create(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        single_record(decode(response)?)
    }

    pub fn parse_update(&self, response: HttpResponse) -> Result<Todo, ApiError> {
        single_record(decode(response)?)
    }

    fn write_request<T: Serialize>(&self, method: HttpMethod, payload: &T) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(payload).map_err(|e| ApiError::Serialization(e.to_string()))?;
        debug!(%method, url = %self.endpoint, "building write request");
        Ok(HttpRequest {
            method,
            url: self.endpoint.clone(),
            headers: vec![
                self.auth_header(),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body: Some(body),
        })
    }

    fn auth_header(&self) -> (String, String) {
        ("Authorization".to_string(), format!("Bearer {}", self.token))
    }
}

/// Map non-success statuses to `RequestFailed`, otherwise decode the body.
fn decode<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    if !response.is_success() {
        return Err(ApiError::request_failed(response.status, &response.status_text));
    }
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

fn single_record(list: RecordList) -> Result<Todo, ApiError> {
    let mut records = list.records.into_iter();
    match (records.next(), records.next()) {
        (Some(record), None) => Ok(Todo::from(record)),
        (None, _) => Err(ApiError::Deserialization("response contained no records".to_string())),
        (Some(_), Some(_)) => Err(ApiError::Deserialization(
            "response contained more than one record".to_string(),
        )),
    }
}
