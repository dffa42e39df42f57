use serde_json::Value;

use super::error::FilterError;
use super::types::{Condition, FilterOp, FilterWhereInfo};

/// Parses JSON WHERE clauses and renders them as SQL over a JSONB `doc` column.
pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Render a WHERE clause body; parameters are numbered from `starting_param_index + 1`.
    pub fn generate(where_data: &Value, starting_param_index: usize) -> Result<(String, Vec<Value>), FilterError> {
        let condition = Self::parse(where_data)?;
        let mut filter_where = Self::new(starting_param_index);
        let sql = filter_where.build_sql(&condition)?;
        Ok((sql, filter_where.param_values))
    }

    pub fn validate(where_data: &Value) -> Result<(), FilterError> {
        Self::parse(where_data).map(|_| ())
    }

    pub fn parse(where_data: &Value) -> Result<Condition, FilterError> {
        match where_data {
            Value::Null => Ok(Condition::And(vec![])),
            Value::Object(obj) => {
                let mut conditions = Vec::with_capacity(obj.len());
                for (key, value) in obj {
                    if key.starts_with('$') {
                        conditions.push(Self::parse_logical_operator(key, value)?);
                    } else {
                        conditions.extend(Self::parse_field_condition(key, value)?);
                    }
                }
                Ok(match conditions.len() {
                    1 => conditions.remove(0),
                    _ => Condition::And(conditions),
                })
            }
            _ => Err(FilterError::InvalidWhereClause("WHERE must be an object".to_string())),
        }
    }

    fn parse_logical_operator(op: &str, value: &Value) -> Result<Condition, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| FilterError::InvalidOperatorData(format!("{} requires array", op)))?;
                let parts = arr.iter().map(Self::parse).collect::<Result<Vec<_>, _>>()?;
                Ok(if op == "$and" { Condition::And(parts) } else { Condition::Or(parts) })
            }
            "$not" => Ok(Condition::Not(Box::new(Self::parse(value)?))),
            _ => Err(FilterError::UnsupportedOperator(op.to_string())),
        }
    }

    fn parse_field_condition(field: &str, value: &Value) -> Result<Vec<Condition>, FilterError> {
        Self::validate_field(field)?;

        if let Value::Object(obj) = value {
            if obj.keys().all(|k| k.starts_with('$')) && !obj.is_empty() {
                let mut out = Vec::with_capacity(obj.len());
                for (op_key, op_val) in obj {
                    let operator = Self::map_operator(op_key)?;
                    out.push(Condition::Field(FilterWhereInfo {
                        field: field.to_string(),
                        operator,
                        data: op_val.clone(),
                    }));
                }
                return Ok(out);
            }
        }

        // Implicit equality: { field: value }
        Ok(vec![Condition::Field(FilterWhereInfo {
            field: field.to_string(),
            operator: FilterOp::Eq,
            data: value.clone(),
        })])
    }

    fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
        Ok(match op_key {
            "$eq" => FilterOp::Eq,
            "$ne" | "$neq" => FilterOp::Ne,
            "$in" => FilterOp::In,
            "$nin" => FilterOp::NIn,
            other => return Err(FilterError::UnsupportedOperator(other.to_string())),
        })
    }

    /// Field names are interpolated into SQL as JSON keys, so keep them to a safe alphabet.
    fn validate_field(field: &str) -> Result<(), FilterError> {
        let mut chars = field.chars();
        let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
        if !valid_start || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(FilterError::InvalidField(field.to_string()));
        }
        Ok(())
    }

    fn build_sql(&mut self, condition: &Condition) -> Result<String, FilterError> {
        match condition {
            Condition::And(parts) => {
                if parts.is_empty() {
                    return Ok("1=1".to_string());
                }
                let sql = parts
                    .iter()
                    .map(|p| self.build_sql(p).map(|s| format!("({})", s)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(sql.join(" AND "))
            }
            Condition::Or(parts) => {
                if parts.is_empty() {
                    return Ok("1=0".to_string());
                }
                let sql = parts
                    .iter()
                    .map(|p| self.build_sql(p).map(|s| format!("({})", s)))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(sql.join(" OR "))
            }
            Condition::Not(inner) => Ok(format!("NOT ({})", self.build_sql(inner)?)),
            Condition::Field(info) => self.build_field_sql(info),
        }
    }

    fn build_field_sql(&mut self, condition: &FilterWhereInfo) -> Result<String, FilterError> {
        let column = format!("doc->'{}'", condition.field);
        match condition.operator {
            FilterOp::Eq => {
                if condition.data.is_null() {
                    Ok(format!("({0} IS NULL OR {0} = 'null'::jsonb)", column))
                } else {
                    Ok(format!("{} = {}", column, self.param(condition.data.clone())))
                }
            }
            FilterOp::Ne => {
                if condition.data.is_null() {
                    Ok(format!("({0} IS NOT NULL AND {0} <> 'null'::jsonb)", column))
                } else {
                    Ok(format!("{} IS DISTINCT FROM {}", column, self.param(condition.data.clone())))
                }
            }
            FilterOp::In => match &condition.data {
                Value::Array(values) if values.is_empty() => Ok("1=0".to_string()),
                Value::Array(values) => {
                    let params: Vec<String> = values.iter().map(|v| self.param(v.clone())).collect();
                    Ok(format!("{} IN ({})", column, params.join(", ")))
                }
                _ => Err(FilterError::InvalidOperatorData("$in requires array".to_string())),
            },
            FilterOp::NIn => match &condition.data {
                Value::Array(values) if values.is_empty() => Ok("1=1".to_string()),
                Value::Array(values) => {
                    let params: Vec<String> = values.iter().map(|v| self.param(v.clone())).collect();
                    Ok(format!("({0} IS NULL OR {0} NOT IN ({1}))", column, params.join(", ")))
                }
                _ => Err(FilterError::InvalidOperatorData("$nin requires array".to_string())),
            },
        }
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn implicit_equality_binds_json_param() {
        let (sql, params) = FilterWhere::generate(&json!({ "email": "ana@x.com" }), 0).unwrap();
        assert_eq!(sql, "doc->'email' = $1");
        assert_eq!(params, vec![json!("ana@x.com")]);
    }

    #[test]
    fn or_of_pairs_numbers_params_in_order() {
        // Object keys iterate in sorted order
        let where_data = json!({
            "$or": [
                { "senderEmail": "a", "receiverEmail": "b" },
                { "senderEmail": "b", "receiverEmail": "a" }
            ]
        });
        let (sql, params) = FilterWhere::generate(&where_data, 0).unwrap();
        assert_eq!(
            sql,
            "((doc->'receiverEmail' = $1) AND (doc->'senderEmail' = $2)) OR ((doc->'receiverEmail' = $3) AND (doc->'senderEmail' = $4))"
        );
        assert_eq!(params.len(), 4);
    }

    #[test]
    fn starting_index_offsets_placeholders() {
        let (sql, _) = FilterWhere::generate(&json!({ "_id": "x" }), 1).unwrap();
        assert_eq!(sql, "doc->'_id' = $2");
    }

    #[test]
    fn empty_in_matches_nothing() {
        let (sql, params) = FilterWhere::generate(&json!({ "assignmentId": { "$in": [] } }), 0).unwrap();
        assert_eq!(sql, "1=0");
        assert!(params.is_empty());
    }

    #[test]
    fn null_equality_covers_missing_keys() {
        let (sql, _) = FilterWhere::generate(&json!({ "mark": null }), 0).unwrap();
        assert_eq!(sql, "(doc->'mark' IS NULL OR doc->'mark' = 'null'::jsonb)");
    }

    #[test]
    fn rejects_injection_in_field_names() {
        let err = FilterWhere::generate(&json!({ "email' OR 1=1 --": "x" }), 0).unwrap_err();
        assert!(matches!(err, FilterError::InvalidField(_)));
    }

    #[test]
    fn rejects_unknown_operators() {
        let err = FilterWhere::generate(&json!({ "age": { "$regex": "^1" } }), 0).unwrap_err();
        assert!(matches!(err, FilterError::UnsupportedOperator(_)));
    }

    #[test]
    fn object_values_without_operators_are_equality() {
        let condition = FilterWhere::parse(&json!({ "course": { "name": "Rust" } })).unwrap();
        assert!(matches!(condition, Condition::Field(FilterWhereInfo { operator: FilterOp::Eq, .. })));
    }
}
