//! Field-level patch operations over JSON documents.
//!
//! Fields are addressed with JSON pointers (`/name`, `/address/city`,
//! `/tags/0`). A sequence of operations is applied to a copy of the document
//! and only returned when every operation succeeds.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ResourceError;

/// The mutation performed by a [`PatchOperation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatchKind {
    /// Set a field; on arrays, insert at an index or append with `-`.
    Add,
    /// Remove a field. Removing an absent field is a no-op.
    Remove,
    /// Set a field, creating it when absent.
    Replace,
    /// Add a number to a numeric field.
    Increment,
    /// Copy the value at `from` to `field`.
    Copy,
    /// Move the value at `from` to `field`.
    Move,
}

/// One field-level mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub operation: PatchKind,
    pub field: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

impl PatchOperation {
    pub fn add(field: impl Into<String>, value: Value) -> Self {
        Self::with_value(PatchKind::Add, field, value)
    }

    pub fn remove(field: impl Into<String>) -> Self {
        Self::with_value(PatchKind::Remove, field, Value::Null)
    }

    pub fn replace(field: impl Into<String>, value: Value) -> Self {
        Self::with_value(PatchKind::Replace, field, value)
    }

    pub fn increment(field: impl Into<String>, by: Value) -> Self {
        Self::with_value(PatchKind::Increment, field, by)
    }

    pub fn copy(from: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            operation: PatchKind::Copy,
            field: field.into(),
            value: Value::Null,
            from: Some(from.into()),
        }
    }

    pub fn move_to(from: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            operation: PatchKind::Move,
            field: field.into(),
            value: Value::Null,
            from: Some(from.into()),
        }
    }

    fn with_value(operation: PatchKind, field: impl Into<String>, value: Value) -> Self {
        Self {
            operation,
            field: field.into(),
            value,
            from: None,
        }
    }

    /// Top-level field name this operation writes, if any.
    pub fn top_level_fields(&self) -> Vec<String> {
        let mut fields = Vec::new();
        if let Ok(tokens) = parse_pointer(&self.field) {
            fields.extend(tokens.into_iter().next());
        }
        if self.operation == PatchKind::Move {
            if let Some(Ok(tokens)) = self.from.as_deref().map(parse_pointer) {
                fields.extend(tokens.into_iter().next());
            }
        }
        fields
    }
}

/// Apply `operations` in order to a copy of `document`.
pub fn apply_patch(document: &Value, operations: &[PatchOperation]) -> Result<Value, ResourceError> {
    let mut patched = document.clone();
    for op in operations {
        apply_one(&mut patched, op)?;
    }
    Ok(patched)
}

fn apply_one(document: &mut Value, op: &PatchOperation) -> Result<(), ResourceError> {
    let tokens = parse_pointer(&op.field)?;
    match op.operation {
        PatchKind::Add => set_field(document, &tokens, &op.field, op.value.clone(), true),
        PatchKind::Replace => set_field(document, &tokens, &op.field, op.value.clone(), false),
        PatchKind::Remove => {
            let (parent, key) = parent_mut(document, &tokens, &op.field)?;
            remove_child(parent, key);
            Ok(())
        }
        PatchKind::Increment => {
            let current = get_field(document, &tokens).ok_or_else(|| {
                ResourceError::bad_request(format!("Field {} does not exist", op.field))
            })?;
            let sum = add_numbers(current, &op.value, &op.field)?;
            set_field(document, &tokens, &op.field, sum, false)
        }
        PatchKind::Copy | PatchKind::Move => {
            let from = op.from.as_deref().ok_or_else(|| {
                ResourceError::bad_request(format!(
                    "Patch operation on {} requires a from field",
                    op.field
                ))
            })?;
            let from_tokens = parse_pointer(from)?;
            let value = get_field(document, &from_tokens).cloned().ok_or_else(|| {
                ResourceError::bad_request(format!("Field {} does not exist", from))
            })?;
            if op.operation == PatchKind::Move {
                let (parent, key) = parent_mut(document, &from_tokens, from)?;
                remove_child(parent, key);
            }
            set_field(document, &tokens, &op.field, value, true)
        }
    }
}

/// Split a JSON pointer into unescaped tokens. The document root is not
/// addressable.
fn parse_pointer(field: &str) -> Result<Vec<String>, ResourceError> {
    let tokens: Vec<String> = field
        .trim_start_matches('/')
        .split('/')
        .map(|t| t.replace("~1", "/").replace("~0", "~"))
        .collect();
    if tokens.iter().any(String::is_empty) {
        return Err(ResourceError::bad_request(format!(
            "Invalid patch field '{}'",
            field
        )));
    }
    Ok(tokens)
}

fn get_field<'a>(document: &'a Value, tokens: &[String]) -> Option<&'a Value> {
    let mut cursor = document;
    for token in tokens {
        cursor = match cursor {
            Value::Object(map) => map.get(token)?,
            Value::Array(arr) => arr.get(token.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(cursor)
}

fn parent_mut<'a, 't>(
    document: &'a mut Value,
    tokens: &'t [String],
    field: &str,
) -> Result<(&'a mut Value, &'t str), ResourceError> {
    let Some((last, parents)) = tokens.split_last() else {
        return Err(ResourceError::bad_request("Patch field must not be empty"));
    };
    let mut cursor = document;
    for token in parents {
        cursor = match cursor {
            Value::Object(map) => map.get_mut(token),
            Value::Array(arr) => token.parse::<usize>().ok().and_then(move |i| arr.get_mut(i)),
            _ => None,
        }
        .ok_or_else(|| {
            ResourceError::bad_request(format!("Parent of field {} does not exist", field))
        })?;
    }
    Ok((cursor, last.as_str()))
}

fn set_field(
    document: &mut Value,
    tokens: &[String],
    field: &str,
    value: Value,
    insert: bool,
) -> Result<(), ResourceError> {
    let (parent, key) = parent_mut(document, tokens, field)?;
    match parent {
        Value::Object(map) => {
            map.insert(key.to_string(), value);
            Ok(())
        }
        Value::Array(arr) => {
            if key == "-" {
                arr.push(value);
                return Ok(());
            }
            let index = key.parse::<usize>().map_err(|_| {
                ResourceError::bad_request(format!("Field {} is not an array index", field))
            })?;
            if insert && index <= arr.len() {
                arr.insert(index, value);
                Ok(())
            } else if !insert && index < arr.len() {
                arr[index] = value;
                Ok(())
            } else {
                Err(ResourceError::bad_request(format!(
                    "Index of field {} is out of bounds",
                    field
                )))
            }
        }
        _ => Err(ResourceError::bad_request(format!(
            "Parent of field {} is not an object or array",
            field
        ))),
    }
}

fn remove_child(parent: &mut Value, key: &str) -> Option<Value> {
    match parent {
        Value::Object(map) => map.remove(key),
        Value::Array(arr) => {
            let index = key.parse::<usize>().ok()?;
            (index < arr.len()).then(|| arr.remove(index))
        }
        _ => None,
    }
}

fn add_numbers(current: &Value, by: &Value, field: &str) -> Result<Value, ResourceError> {
    let overflow =
        || ResourceError::bad_request(format!("Incrementing field {} overflows", field));

    if let (Some(a), Some(b)) = (current.as_i64(), by.as_i64()) {
        return a.checked_add(b).map(Value::from).ok_or_else(overflow);
    }
    match (current.as_f64(), by.as_f64()) {
        (Some(a), Some(b)) => serde_json::Number::from_f64(a + b)
            .map(Value::Number)
            .ok_or_else(overflow),
        _ => Err(ResourceError::bad_request(format!(
            "Field {} and increment value must both be numbers",
            field
        ))),
    }
}
