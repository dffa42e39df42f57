use serde_json::{Map, Value};

use super::types::{Condition, FilterOp, FilterWhereInfo};

/// Evaluate a parsed WHERE clause against a document held in memory.
///
/// Mirrors the JSONB semantics of `FilterWhere`: a missing key and an
/// explicit `null` are both "null", and `$ne`/`$nin` match missing keys.
pub fn matches(condition: &Condition, doc: &Map<String, Value>) -> bool {
    match condition {
        Condition::And(parts) => parts.iter().all(|p| matches(p, doc)),
        Condition::Or(parts) => parts.iter().any(|p| matches(p, doc)),
        Condition::Not(inner) => !matches(inner, doc),
        Condition::Field(info) => matches_field(info, doc),
    }
}

fn matches_field(info: &FilterWhereInfo, doc: &Map<String, Value>) -> bool {
    let value = doc.get(&info.field);
    match info.operator {
        FilterOp::Eq => equals(value, &info.data),
        FilterOp::Ne => !equals(value, &info.data),
        FilterOp::In => match &info.data {
            Value::Array(candidates) => candidates.iter().any(|c| value.is_some_and(|v| v == c)),
            _ => false,
        },
        FilterOp::NIn => match &info.data {
            Value::Array(candidates) => !candidates.iter().any(|c| value.is_some_and(|v| v == c)),
            _ => true,
        },
    }
}

fn equals(value: Option<&Value>, expected: &Value) -> bool {
    match (value, expected) {
        (None, Value::Null) => true,
        (Some(v), Value::Null) => v.is_null(),
        (Some(v), e) => v == e,
        (None, _) => false,
    }
}
