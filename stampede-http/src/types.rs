//! Request and response bodies of the table API

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Successful response with its status code
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub body: T,
}

impl<T> ApiResponse<T> {
    pub fn new(status: u16, body: T) -> Self {
        Self { status, body }
    }
}

/// `POST /auth/signup`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    pub name: String,
    pub password: String,
    pub org_slug: String,
}

/// `POST /tables/`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTableRequest {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CreateTableResponse {
    #[serde(default)]
    pub created: Option<bool>,
    #[serde(default)]
    pub table: Option<TableInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TableInfo {
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl CreateTableResponse {
    /// Non-empty `table.slug`, if present
    pub fn slug(&self) -> Option<&str> {
        self.table
            .as_ref()
            .and_then(|table| table.slug.as_deref())
            .filter(|slug| !slug.is_empty())
    }
}

/// Column types understood by the table API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Enum,
    Float,
    Bool,
}

/// `POST /tables/{slug}/columns`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub required: bool,
    pub indexed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            required: false,
            indexed: false,
            enum_values: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn indexed(mut self) -> Self {
        self.indexed = true;
        self
    }

    pub fn with_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = Some(values.into_iter().map(Into::into).collect());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

/// Single search predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterField {
    pub field: String,
    pub operation: String,
    pub value: Value,
}

impl FilterField {
    /// Equality predicate
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            operation: "eq".to_string(),
            value: value.into(),
        }
    }
}

/// `POST /tables/{slug}/search`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub page_num: u32,
    pub page_size: u32,
    pub filter_fields: Vec<FilterField>,
    pub sort_field: String,
    pub direction: SortDirection,
}

/// Search results; `content` and `total_count` are mandatory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub content: Vec<Value>,
    pub total_count: i64,
    #[serde(default)]
    pub columns: Vec<Value>,
}
