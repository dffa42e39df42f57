//! Shared types used across the codebase

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::database::store::Document;

/// Partial-update field that tells "omitted" apart from "explicitly cleared".
///
/// Use with `#[serde(default)]` so a missing key deserializes to `Absent`;
/// a JSON `null` becomes `Null` and anything else `Value`.
#[derive(Debug, Clone, PartialEq)]
pub enum Patch<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for Patch<T> {
    fn default() -> Self {
        Patch::Absent
    }
}

impl<'de, T> Deserialize<'de> for Patch<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Patch::Value(value),
            None => Patch::Null,
        })
    }
}

impl<T: Serialize> Patch<T> {
    /// Write this field into a change set; absent fields leave it untouched
    pub fn apply(&self, changes: &mut Document, key: &str) -> Result<(), serde_json::Error> {
        match self {
            Patch::Absent => {}
            Patch::Null => {
                changes.insert(key.to_string(), Value::Null);
            }
            Patch::Value(value) => {
                changes.insert(key.to_string(), serde_json::to_value(value)?);
            }
        }
        Ok(())
    }
}
