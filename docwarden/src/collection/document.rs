use crate::common::{Value, FIELD_SEPARATOR};
use crate::errors::{ErrorKind, WardenError, WardenResult};
use smallvec::SmallVec;
use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt::{Debug, Display};

type FieldVec = SmallVec<[String; 8]>;

/// The store-level representation of one record.
///
/// Documents are key-ordered maps from field name to [Value]. Embedded
/// documents are addressed with dotted paths, so `doc.get("address.city")`
/// reads the `city` field of the `address` document, and array elements are
/// addressed by position (`tags.0`).
///
/// A typed collection converts its entities to documents before handing them
/// to a store binding and converts them back after every read. Filters and
/// patches are expressed over documents as well.
#[derive(Clone, Eq, PartialEq, Hash, Default, Ord, PartialOrd)]
pub struct Document {
    data: BTreeMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document {
            data: BTreeMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of top level entries.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Associates `value` with `key`.
    ///
    /// A dotted key writes into embedded documents, creating the missing
    /// levels on the way.
    ///
    /// # Errors
    ///
    /// Returns [ErrorKind::InvalidOperation] if the key is empty or if an
    /// intermediate segment of a dotted key holds something other than a
    /// document.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let mut doc = Document::new();
    /// doc.put("name", "Alice")?;
    /// doc.put("address.city", "London")?;
    /// assert_eq!(doc.get("address.city")?, Value::from("London"));
    /// ```
    pub fn put<T: Into<Value>>(&mut self, key: &str, value: T) -> WardenResult<()> {
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(WardenError::new(
                "Document does not support empty key",
                ErrorKind::InvalidOperation,
            ));
        }

        let value = value.into();
        if key.contains(FIELD_SEPARATOR) {
            let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
            self.deep_put(&splits, value)
        } else {
            self.data.insert(key.to_string(), value);
            Ok(())
        }
    }

    /// Returns the value under `key`, or [Value::Null] when there is none.
    pub fn get(&self, key: &str) -> WardenResult<Value> {
        match self.data.get(key) {
            Some(value) => Ok(value.clone()),
            None if key.contains(FIELD_SEPARATOR) => Ok(self.deep_get(key)),
            None => Ok(Value::Null),
        }
    }

    /// Removes `key` (top level or embedded). Missing keys are ignored.
    pub fn remove(&mut self, key: &str) -> WardenResult<()> {
        if self.data.remove(key).is_some() || !key.contains(FIELD_SEPARATOR) {
            return Ok(());
        }

        let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
        let (last, parents) = match splits.split_last() {
            Some(parts) => parts,
            None => return Ok(()),
        };

        let mut current = &mut self.data;
        for segment in parents {
            match current.get_mut(*segment) {
                Some(Value::Document(nested)) => current = &mut nested.data,
                _ => return Ok(()),
            }
        }
        current.remove(*last);
        Ok(())
    }

    /// Checks if a top level key exists in the document.
    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Checks if a top level or embedded field exists in the document.
    pub fn contains_field(&self, field: &str) -> bool {
        if self.contains_key(field) {
            return true;
        }
        field.contains(FIELD_SEPARATOR) && self.locate(field).is_some()
    }

    /// Merges `other` into this document.
    ///
    /// Embedded documents present on both sides are merged recursively;
    /// every other value from `other` overwrites the existing one.
    pub fn merge(&mut self, other: &Document) -> WardenResult<()> {
        for (key, value) in other.data.iter() {
            match (self.data.get_mut(key), value) {
                (Some(Value::Document(existing)), Value::Document(incoming)) => {
                    existing.merge(incoming)?;
                }
                _ => {
                    self.data.insert(key.clone(), value.clone());
                }
            }
        }
        Ok(())
    }

    /// Retrieves all leaf field paths, embedded fields joined with `.`.
    pub fn fields(&self) -> FieldVec {
        let mut fields = FieldVec::new();
        self.collect_fields("", &mut fields);
        fields
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.data.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.data.keys()
    }

    /// Converts this document into a JSON object.
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .data
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect::<serde_json::Map<String, serde_json::Value>>();
        serde_json::Value::Object(map)
    }

    /// Builds a document from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [ErrorKind::ObjectMappingError] when `json` is not an object.
    pub fn from_json(json: serde_json::Value) -> WardenResult<Document> {
        match json {
            serde_json::Value::Object(map) => Ok(Document::from_json_map(map)),
            other => {
                log::error!("Cannot convert non object json {} to a document", other);
                Err(WardenError::new(
                    &format!("Cannot convert non object json {} to a document", other),
                    ErrorKind::ObjectMappingError,
                ))
            }
        }
    }

    pub(crate) fn from_json_map(map: serde_json::Map<String, serde_json::Value>) -> Document {
        Document {
            data: map
                .into_iter()
                .map(|(k, v)| (k, Value::from_json(v)))
                .collect(),
        }
    }

    fn deep_put(&mut self, splits: &[&str], value: Value) -> WardenResult<()> {
        let (last, parents) = match splits.split_last() {
            Some(parts) => parts,
            None => return Ok(()),
        };

        if splits.iter().any(|s| s.is_empty()) {
            log::error!("Invalid embedded field {}", splits.join(FIELD_SEPARATOR));
            return Err(WardenError::new(
                &format!("Invalid embedded field {}", splits.join(FIELD_SEPARATOR)),
                ErrorKind::InvalidOperation,
            ));
        }

        let mut current = &mut self.data;
        for segment in parents {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Document(Document::new()));
            match entry {
                Value::Document(nested) => current = &mut nested.data,
                other => {
                    log::error!("Cannot embed field {} into non document value {}", segment, other);
                    return Err(WardenError::new(
                        &format!("Cannot embed field {} into non document value {}", segment, other),
                        ErrorKind::InvalidOperation,
                    ));
                }
            }
        }
        current.insert(last.to_string(), value);
        Ok(())
    }

    fn deep_get(&self, key: &str) -> Value {
        self.locate(key).cloned().unwrap_or(Value::Null)
    }

    fn locate(&self, key: &str) -> Option<&Value> {
        let mut segments = key.split(FIELD_SEPARATOR);
        let mut current = self.data.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Document(doc) => doc.data.get(segment)?,
                Value::Array(array) => array.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    fn collect_fields(&self, prefix: &str, fields: &mut FieldVec) {
        for (key, value) in self.data.iter() {
            let path = if prefix.is_empty() {
                key.clone()
            } else {
                format!("{}{}{}", prefix, FIELD_SEPARATOR, key)
            };
            match value {
                Value::Document(nested) if !nested.is_empty() => {
                    nested.collect_fields(&path, fields)
                }
                _ => fields.push(path),
            }
        }
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.iter()
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Document {
            data: iter.into_iter().collect(),
        }
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.data.iter()).finish()
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax.
///
/// # Examples
///
/// ```rust
/// use docwarden::doc;
///
/// let empty = doc!{};
///
/// let simple = doc!{
///     name: "Alice",
///     age: 30
/// };
///
/// let base = 100;
/// let with_expr = doc!{
///     score: (base * 2),
///     "$inc": { visits: 1 }
/// };
///
/// let complex = doc!{
///     user: {
///         name: "Charlie",
///         tags: ["admin", "user"]
///     },
///     values: [1, 2, 3]
/// };
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::collection::Document::new()
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::doc_value;

            let mut doc = $crate::collection::Document::new();
            $(
                doc.put(&$crate::collection::normalize(stringify!($key)), $crate::doc_value!($value))
                    .expect(&format!("Failed to put value {} in document", stringify!($value)));
            )*
            doc
        }
    };
}

/// Helper macro converting the values of the [doc!] macro.
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    fn set_up() -> Document {
        doc! {
            score: 1034,
            location: {
                state: "NY",
                city: "New York",
                address: {
                    line1: "40",
                    zip: 10001,
                },
            },
            category: ["food", "produce", "grocery"],
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("\"ABC\""), "ABC");
        assert_eq!(normalize("ABC"), "ABC");
    }

    #[test]
    fn test_put_and_get() {
        let mut doc = Document::new();
        doc.put("name", "Alice").unwrap();
        assert_eq!(doc.get("name").unwrap(), Value::from("Alice"));
        assert_eq!(doc.get("missing").unwrap(), Value::Null);
    }

    #[test]
    fn test_put_empty_key_fails() {
        let mut doc = Document::new();
        let err = doc.put("", 1).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_put_embedded_creates_levels() {
        let mut doc = Document::new();
        doc.put("a.b.c", 1).unwrap();
        assert_eq!(doc.get("a.b.c").unwrap(), Value::I64(1));
        assert!(doc.get("a.b").unwrap().is_document());
    }

    #[test]
    fn test_put_embedded_into_scalar_fails() {
        let mut doc = doc! { a: 1 };
        let err = doc.put("a.b", 2).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
    }

    #[test]
    fn test_get_embedded_and_array_index() {
        let doc = set_up();
        assert_eq!(doc.get("location.address.zip").unwrap(), Value::I64(10001));
        assert_eq!(doc.get("category.1").unwrap(), Value::from("produce"));
        assert_eq!(doc.get("category.9").unwrap(), Value::Null);
        assert_eq!(doc.get("score.x").unwrap(), Value::Null);
    }

    #[test]
    fn test_remove_top_level_and_embedded() {
        let mut doc = set_up();
        doc.remove("score").unwrap();
        doc.remove("location.address.zip").unwrap();
        doc.remove("does.not.exist").unwrap();
        assert!(!doc.contains_key("score"));
        assert!(!doc.contains_field("location.address.zip"));
        assert!(doc.contains_field("location.address.line1"));
    }

    #[test]
    fn test_merge_is_recursive() {
        let mut doc = doc! { user: { name: "Alice", age: 30 }, status: "open" };
        let patch = doc! { user: { email: "a@b.c" }, status: "closed" };
        doc.merge(&patch).unwrap();
        assert_eq!(doc.get("user.name").unwrap(), Value::from("Alice"));
        assert_eq!(doc.get("user.email").unwrap(), Value::from("a@b.c"));
        assert_eq!(doc.get("status").unwrap(), Value::from("closed"));
    }

    #[test]
    fn test_fields_lists_leaves() {
        let doc = set_up();
        let fields = doc.fields();
        assert!(fields.contains(&"score".to_string()));
        assert!(fields.contains(&"location.address.zip".to_string()));
        assert!(fields.contains(&"category".to_string()));
        assert!(!fields.contains(&"location".to_string()));
    }

    #[test]
    fn test_json_round_trip() {
        let doc = set_up();
        let json = doc.to_json();
        assert_eq!(Document::from_json(json).unwrap(), doc);
    }

    #[test]
    fn test_from_json_rejects_non_object() {
        let err = Document::from_json(serde_json::json!([1, 2])).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ObjectMappingError);
    }

    #[test]
    fn test_doc_macro_quoted_keys() {
        let doc = doc! { "$set": { status: "closed" } };
        assert_eq!(doc.get("$set.status").unwrap(), Value::from("closed"));
    }

    #[test]
    fn test_display_is_json() {
        let doc = doc! { a: 1, b: "x" };
        assert_eq!(doc.to_string(), "{\"a\":1,\"b\":\"x\"}");
    }
}
