use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "$eq")] Eq,
    #[serde(rename = "$ne")] Ne,
    #[serde(rename = "$in")] In,
    #[serde(rename = "$nin")] NIn,
}

/// Query against a document collection.
///
/// `where_clause` uses the JSON filter language:
/// `{ "email": "a@x.com" }`, `{ "assignmentId": { "$in": [...] } }`,
/// `{ "$or": [ {...}, {...} ] }`, `{ "$not": {...} }`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterData {
    pub where_clause: Option<Value>,
}

impl FilterData {
    /// Matches every document in the collection
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(where_clause: Value) -> Self {
        Self { where_clause: Some(where_clause) }
    }

    /// Implicit equality on a single field
    pub fn eq(field: &str, value: impl Into<Value>) -> Self {
        let mut map = serde_json::Map::new();
        map.insert(field.to_string(), value.into());
        Self::new(Value::Object(map))
    }

    pub fn any_of(field: &str, values: Vec<Value>) -> Self {
        let mut map = serde_json::Map::new();
        map.insert(field.to_string(), json!({ "$in": values }));
        Self::new(Value::Object(map))
    }
}

/// Parsed form of a WHERE clause shared by the SQL generator and the
/// in-memory matcher so both backends agree on semantics.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Field(FilterWhereInfo),
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterWhereInfo {
    pub field: String,
    pub operator: FilterOp,
    pub data: Value,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}
