//! Stored documents and their revision tags.

use serde_json::{Map, Value};

use crest_core::{ResourceError, ResourceResponse};

/// Field carrying a document's identity.
pub const FIELD_ID: &str = "_id";

/// Field carrying a document's revision tag.
pub const FIELD_REVISION: &str = "_rev";

/// Revision tag of a freshly created document.
pub const INITIAL_REVISION: &str = "1.0";

/// Render revision number `n` as a tag (`1` -> `"1.0"`).
pub fn format_revision(n: u64) -> String {
    format!("{}.0", n)
}

/// A document as held by the store: content without the `_id`/`_rev`
/// fields, which are stamped on the way out.
#[derive(Debug, Clone)]
pub(crate) struct StoredDocument {
    pub(crate) revision: u64,
    pub(crate) content: Map<String, Value>,
}

impl StoredDocument {
    /// Build from request content. Content must be a JSON object.
    pub(crate) fn from_content(content: Value) -> Result<Self, ResourceError> {
        Ok(Self {
            revision: 1,
            content: strip_reserved(content)?,
        })
    }

    pub(crate) fn revision_tag(&self) -> String {
        format_revision(self.revision)
    }

    /// Replace the content and advance the revision.
    pub(crate) fn replace(&mut self, content: Value) -> Result<(), ResourceError> {
        self.content = strip_reserved(content)?;
        self.revision += 1;
        Ok(())
    }

    /// The document with `_id` and `_rev` stamped in.
    pub(crate) fn to_value(&self, id: &str) -> Value {
        let mut content = self.content.clone();
        content.insert(FIELD_ID.to_string(), Value::from(id));
        content.insert(FIELD_REVISION.to_string(), Value::from(self.revision_tag()));
        Value::Object(content)
    }

    pub(crate) fn to_response(&self, id: &str) -> ResourceResponse {
        ResourceResponse::new(id, Some(self.revision_tag()), self.to_value(id))
    }
}

fn strip_reserved(content: Value) -> Result<Map<String, Value>, ResourceError> {
    match content {
        Value::Object(mut map) => {
            map.remove(FIELD_ID);
            map.remove(FIELD_REVISION);
            Ok(map)
        }
        Value::Null => Ok(Map::new()),
        other => Err(ResourceError::bad_request(format!(
            "Document content must be a JSON object, got {}",
            type_name(&other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reserved_fields_are_stamped() {
        let doc = StoredDocument::from_content(json!({
            "_id": "ignored",
            "_rev": "9.0",
            "name": "Andy",
        }))
        .unwrap();
        assert_eq!(
            doc.to_value("andy123"),
            json!({"_id": "andy123", "_rev": "1.0", "name": "Andy"})
        );
    }

    #[test]
    fn replace_advances_revision() {
        let mut doc = StoredDocument::from_content(json!({"name": "Andy"})).unwrap();
        doc.replace(json!({"name": "Andrew"})).unwrap();
        assert_eq!(doc.revision_tag(), "2.0");
        assert_eq!(doc.content["name"], "Andrew");
    }

    #[test]
    fn non_object_content_is_rejected() {
        let err = StoredDocument::from_content(json!(["a"])).unwrap_err();
        assert!(err.message.contains("an array"));
    }
}
