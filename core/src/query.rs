//! Sort and search parameters that shape a list request.
//!
//! The record store reads sorting from `sort[0][field]` / `sort[0][direction]`
//! and filtering from a `filterByFormula` expression. The search is a
//! `SEARCH("<needle>",+title)` formula; the `+` stays literal in the URL, so
//! the server decodes it as a space, while the needle itself is fully
//! percent-encoded.

use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

/// Everything except RFC 3986 unreserved characters.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortField {
    #[default]
    #[serde(rename = "createdTime")]
    CreatedTime,
    #[serde(rename = "title")]
    Title,
    #[serde(rename = "isCompleted")]
    IsCompleted,
}

impl SortField {
    pub const ALL: [SortField; 3] = [SortField::CreatedTime, SortField::Title, SortField::IsCompleted];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::CreatedTime => "createdTime",
            SortField::Title => "title",
            SortField::IsCompleted => "isCompleted",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-controlled fetch parameters. Newest first, unfiltered by default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewQuery {
    pub sort_field: SortField,
    pub sort_direction: SortDirection,
    pub query_string: String,
}

impl ViewQuery {
    /// The search formula in its unencoded form, or `None` for an empty
    /// search.
    pub fn filter_formula(&self) -> Option<String> {
        if self.query_string.is_empty() {
            return None;
        }
        Some(format!("SEARCH(\"{}\",+title)", escape_formula_string(&self.query_string)))
    }

    /// Percent-encoded query string, without the leading `?`.
    pub fn to_query_string(&self) -> String {
        let mut parts = vec![
            format!("{}={}", encode("sort[0][field]"), self.sort_field.as_str()),
            format!("{}={}", encode("sort[0][direction]"), self.sort_direction.as_str()),
        ];
        if !self.query_string.is_empty() {
            let needle = escape_formula_string(&self.query_string);
            parts.push(format!("filterByFormula=SEARCH(%22{}%22,+title)", encode(&needle)));
        }
        parts.join("&")
    }
}

fn encode(s: &str) -> String {
    utf8_percent_encode(s, COMPONENT).to_string()
}

/// Escape a value for use inside a double-quoted formula string literal.
fn escape_formula_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}
