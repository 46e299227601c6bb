//! In-process stand-in for the tabular record store.
//!
//! Serves `GET|POST|PATCH /v0/{base_id}/{table}` with the same envelope the
//! real service uses: `{"records": [{"id", "createdTime", "fields"}]}`.
//! Every call needs `Authorization: Bearer <token>`. Writes take at most ten
//! records. `false` and empty field values are left out of responses, the
//! way the real service drops empty cells.

use std::{cmp::Ordering, collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

/// Most records a single create or update may carry.
pub const MAX_RECORDS_PER_WRITE: usize = 10;

fn is_false(b: &bool) -> bool {
    !*b
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fields {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_completed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub created_time: DateTime<Utc>,
    pub fields: Fields,
}

/// Incoming cell values; absent keys are left untouched on PATCH.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldsInput {
    pub title: Option<String>,
    pub is_completed: Option<bool>,
}

#[derive(Deserialize)]
pub struct CreateRecord {
    #[serde(default)]
    pub fields: FieldsInput,
}

#[derive(Deserialize)]
pub struct PatchRecord {
    pub id: String,
    #[serde(default)]
    pub fields: FieldsInput,
}

#[derive(Serialize, Deserialize)]
pub struct Records<T> {
    pub records: Vec<T>,
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Record ID {0} does not exist in this table")]
    RecordNotFound(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Unknown field name: {0}")]
    UnknownField(String),

    #[error("The formula for filtering records is invalid: {0}")]
    InvalidFormula(String),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            ServerError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServerError::RecordNotFound(_) => StatusCode::NOT_FOUND,
            ServerError::InvalidRequest(_) | ServerError::UnknownField(_) | ServerError::InvalidFormula(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ServerError::Unauthorized => "AUTHENTICATION_REQUIRED",
            ServerError::RecordNotFound(_) => "ROW_DOES_NOT_EXIST",
            ServerError::InvalidRequest(_) => "INVALID_REQUEST_UNKNOWN",
            ServerError::UnknownField(_) => "UNKNOWN_FIELD_NAME",
            ServerError::InvalidFormula(_) => "INVALID_FILTER_BY_FORMULA",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        debug!(error = %self, "rejecting request");
        let body = serde_json::json!({
            "error": { "type": self.kind(), "message": self.to_string() }
        });
        (self.status(), Json(body)).into_response()
    }
}

/// Rows per `<base_id>/<table>`, in insertion order.
pub type Db = Arc<RwLock<HashMap<String, Vec<Record>>>>;

#[derive(Clone)]
pub struct AppState {
    db: Db,
    token: Arc<str>,
}

pub fn app(token: &str) -> Router {
    let state = AppState {
        db: Arc::new(RwLock::new(HashMap::new())),
        token: Arc::from(token),
    };
    Router::new()
        .route(
            "/v0/{base_id}/{table}",
            get(list_records).post(create_records).patch(update_records),
        )
        .with_state(state)
}

pub async fn run(listener: TcpListener, token: &str) -> Result<(), std::io::Error> {
    info!(addr = ?listener.local_addr().ok(), "record server listening");
    axum::serve(listener, app(token)).await
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ServerError> {
    let expected = format!("Bearer {}", state.token);
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) if value == expected => Ok(()),
        _ => Err(ServerError::Unauthorized),
    }
}

fn table_key(base_id: &str, table: &str) -> String {
    format!("{base_id}/{table}")
}

async fn list_records(
    State(state): State<AppState>,
    Path((base_id, table)): Path<(String, String)>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Records<Record>>, ServerError> {
    authorize(&state, &headers)?;

    let needle = params
        .get("filterByFormula")
        .map(|f| parse_search_formula(f))
        .transpose()?;
    let sort = match params.get("sort[0][field]") {
        Some(field) => {
            let descending = match params.get("sort[0][direction]").map(String::as_str) {
                None | Some("asc") => false,
                Some("desc") => true,
                Some(other) => {
                    return Err(ServerError::InvalidRequest(format!("invalid sort direction: {other}")))
                }
            };
            Some((field.clone(), descending))
        }
        None => None,
    };

    let db = state.db.read().await;
    let mut records: Vec<Record> = db
        .get(&table_key(&base_id, &table))
        .map(|rows| {
            rows.iter()
                .filter(|r| needle.as_deref().is_none_or(|n| r.fields.title.contains(n)))
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    if let Some((field, descending)) = sort {
        let compare: fn(&Record, &Record) -> Ordering = match field.as_str() {
            "createdTime" => |a, b| a.created_time.cmp(&b.created_time),
            "title" => |a, b| a.fields.title.cmp(&b.fields.title),
            "isCompleted" => |a, b| a.fields.is_completed.cmp(&b.fields.is_completed),
            _ => return Err(ServerError::UnknownField(field.clone())),
        };
        if descending {
            records.sort_by(|a, b| compare(b, a));
        } else {
            records.sort_by(compare);
        }
    }

    debug!(%table, count = records.len(), "listing records");
    Ok(Json(Records { records }))
}

async fn create_records(
    State(state): State<AppState>,
    Path((base_id, table)): Path<(String, String)>,
    headers: HeaderMap,
    Json(input): Json<Records<CreateRecord>>,
) -> Result<Json<Records<Record>>, ServerError> {
    authorize(&state, &headers)?;
    check_batch_size(input.records.len())?;

    let mut db = state.db.write().await;
    let rows = db.entry(table_key(&base_id, &table)).or_default();
    let mut created = Vec::with_capacity(input.records.len());
    for new in input.records {
        let record = Record {
            id: new_record_id(),
            created_time: next_created_time(rows),
            fields: Fields {
                title: new.fields.title.unwrap_or_default(),
                is_completed: new.fields.is_completed.unwrap_or(false),
            },
        };
        rows.push(record.clone());
        created.push(record);
    }
    debug!(%table, count = created.len(), "created records");
    Ok(Json(Records { records: created }))
}

async fn update_records(
    State(state): State<AppState>,
    Path((base_id, table)): Path<(String, String)>,
    headers: HeaderMap,
    Json(input): Json<Records<PatchRecord>>,
) -> Result<Json<Records<Record>>, ServerError> {
    authorize(&state, &headers)?;
    check_batch_size(input.records.len())?;

    let mut db = state.db.write().await;
    let rows = db.entry(table_key(&base_id, &table)).or_default();

    // All ids must exist before anything is written.
    if let Some(missing) = input
        .records
        .iter()
        .find(|patch| !rows.iter().any(|r| r.id == patch.id))
    {
        return Err(ServerError::RecordNotFound(missing.id.clone()));
    }

    let mut updated = Vec::with_capacity(input.records.len());
    for patch in input.records {
        if let Some(record) = rows.iter_mut().find(|r| r.id == patch.id) {
            if let Some(title) = patch.fields.title {
                record.fields.title = title;
            }
            if let Some(done) = patch.fields.is_completed {
                record.fields.is_completed = done;
            }
            updated.push(record.clone());
        }
    }
    debug!(%table, count = updated.len(), "updated records");
    Ok(Json(Records { records: updated }))
}

fn check_batch_size(len: usize) -> Result<(), ServerError> {
    if len == 0 {
        return Err(ServerError::InvalidRequest("records must not be empty".to_string()));
    }
    if len > MAX_RECORDS_PER_WRITE {
        return Err(ServerError::InvalidRequest(format!(
            "at most {MAX_RECORDS_PER_WRITE} records per request, got {len}"
        )));
    }
    Ok(())
}

fn new_record_id() -> String {
    let hex = Uuid::new_v4().simple().to_string();
    format!("rec{}", &hex[..14])
}

/// Creation times are strictly increasing per table so sorting by
/// `createdTime` is deterministic even for records created in the same
/// millisecond.
fn next_created_time(rows: &[Record]) -> DateTime<Utc> {
    let now = Utc::now();
    match rows.iter().map(|r| r.created_time).max() {
        Some(last) if last >= now => last + Duration::milliseconds(1),
        _ => now,
    }
}

/// Extract the needle from `SEARCH("<needle>", title)`.
///
/// The `+` in front of `title` arrives as a space after form decoding, so
/// any whitespace is accepted there. `{title}` is accepted as well.
pub fn parse_search_formula(formula: &str) -> Result<String, ServerError> {
    let invalid = || ServerError::InvalidFormula(formula.to_string());

    let rest = formula.trim().strip_prefix("SEARCH(").ok_or_else(invalid)?;
    let rest = rest.trim_start().strip_prefix('"').ok_or_else(invalid)?;

    let mut needle = String::new();
    let mut chars = rest.char_indices();
    let end = loop {
        match chars.next() {
            Some((_, '\\')) => match chars.next() {
                Some((_, c)) => needle.push(c),
                None => return Err(invalid()),
            },
            Some((i, '"')) => break i,
            Some((_, c)) => needle.push(c),
            None => return Err(invalid()),
        }
    };

    let rest = rest[end + 1..].trim_start().strip_prefix(',').ok_or_else(invalid)?;
    let rest = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '+');
    let rest = rest
        .strip_prefix("{title}")
        .or_else(|| rest.strip_prefix("title"))
        .ok_or_else(invalid)?;
    if rest.trim() != ")" {
        return Err(invalid());
    }
    Ok(needle)
}
