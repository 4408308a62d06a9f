//! The record trait and field patches.
//!
//! A record is any serde type with named fields. The trait is the
//! statically-typed replacement for attribute interception: it lets the
//! store enumerate a record's fields for diffing and write a single field
//! by name, with every write flowing through the proxy's mutation gateway.

use crate::error::{StoreError, StoreResult};
use mirrordb_codec::CodecError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

/// A value that can be managed by a [`Store`](crate::Store).
///
/// Blanket-implemented for every `Serialize + DeserializeOwned + Clone +
/// PartialEq` type whose serde form is a JSON object. Field names and
/// values are the ones serde produces — a `#[serde(rename)]`d or skipped
/// field is addressed by its serialized name, or not at all.
///
/// # Example
///
/// ```
/// use mirrordb_core::Record;
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
///
/// #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// struct User {
///     name: String,
///     age: u32,
/// }
///
/// let mut user = User { name: "x".into(), age: 3 };
/// assert_eq!(user.field("age").unwrap(), Some(json!(3)));
///
/// user.set_field("age", json!(4)).unwrap();
/// assert_eq!(user.age, 4);
/// ```
pub trait Record: Serialize + DeserializeOwned + Clone + PartialEq {
    /// Enumerates the record's fields as a JSON object map.
    fn fields(&self) -> StoreResult<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            _ => Err(CodecError::NotAnObject.into()),
        }
    }

    /// Reads one field by name. `None` when the record has no such field.
    fn field(&self, name: &str) -> StoreResult<Option<Value>> {
        Ok(self.fields()?.remove(name))
    }

    /// Writes one field by name, round-tripping through the record's
    /// serde form.
    ///
    /// # Errors
    ///
    /// [`StoreError::UnknownField`] when the record has no such field;
    /// [`StoreError::InvalidFieldValue`] when the field's type rejects
    /// the value.
    fn set_field(&mut self, name: &str, value: Value) -> StoreResult<()> {
        let mut map = self.fields()?;
        if !map.contains_key(name) {
            return Err(StoreError::unknown_field(name));
        }
        map.insert(name.to_owned(), value);
        *self = serde_json::from_value(Value::Object(map))
            .map_err(|err| StoreError::invalid_field_value(name, err.to_string()))?;
        Ok(())
    }
}

impl<T> Record for T where T: Serialize + DeserializeOwned + Clone + PartialEq {}

/// An ordered set of intended field changes.
///
/// Domain operations that want their mutations tracked return a
/// `FieldPatch` describing the writes instead of mutating the record
/// directly; the store applies and logs each entry through the proxy's
/// gateway (see [`Store::apply`](crate::Store::apply) and
/// [`Store::patch`](crate::Store::patch)).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldPatch {
    fields: Map<String, Value>,
}

impl FieldPatch {
    /// Creates an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field write, builder-style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Adds a field write.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(name.into(), value.into());
    }

    /// Returns true when the patch contains no writes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of field writes in the patch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Iterates the field writes.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Consumes the patch into its underlying field map.
    #[must_use]
    pub fn into_fields(self) -> Map<String, Value> {
        self.fields
    }
}

impl FromIterator<(String, Value)> for FieldPatch {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        age: u32,
    }

    fn sample() -> Sample {
        Sample {
            name: "test".to_owned(),
            age: 7,
        }
    }

    #[test]
    fn fields_enumerates_serde_form() {
        let fields = sample().fields().unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("name"), Some(&json!("test")));
        assert_eq!(fields.get("age"), Some(&json!(7)));
    }

    #[test]
    fn field_reads_one_value() {
        assert_eq!(sample().field("name").unwrap(), Some(json!("test")));
        assert_eq!(sample().field("missing").unwrap(), None);
    }

    #[test]
    fn set_field_writes_through_serde() {
        let mut record = sample();
        record.set_field("name", json!("other")).unwrap();
        assert_eq!(record.name, "other");
        assert_eq!(record.age, 7);
    }

    #[test]
    fn set_field_rejects_unknown_field() {
        let err = sample().set_field("nope", json!(1)).unwrap_err();
        assert!(matches!(err, StoreError::UnknownField { .. }));
    }

    #[test]
    fn set_field_rejects_mistyped_value() {
        let err = sample().set_field("age", json!("not a number")).unwrap_err();
        assert!(matches!(err, StoreError::InvalidFieldValue { .. }));
    }

    #[test]
    fn patch_builder_collects_writes() {
        let patch = FieldPatch::new().with("a", 1).with("b", "two");
        assert_eq!(patch.len(), 2);
        let fields = patch.into_fields();
        assert_eq!(fields.get("a"), Some(&json!(1)));
        assert_eq!(fields.get("b"), Some(&json!("two")));
    }

    #[test]
    fn empty_patch() {
        assert!(FieldPatch::new().is_empty());
    }
}
