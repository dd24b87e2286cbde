use crate::collection::Document;
use crate::common::{Value, DEFAULT_ID_FIELD};
use crate::errors::{ErrorKind, WardenError, WardenResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// The logical document type of a [Collection](crate::collection::Collection).
///
/// Entities are mapped to and from store documents with serde, so any
/// `Serialize + Deserialize + Clone` struct qualifies. Override
/// [entity_name](Entity::entity_name) to pick the default collection name
/// and [id_field](Entity::id_field) when the identifier is not stored
/// under `id`.
///
/// ```rust,ignore
/// #[derive(Serialize, Deserialize, Clone)]
/// struct User {
///     #[serde(default, skip_serializing_if = "Option::is_none")]
///     id: Option<String>,
///     first: String,
///     last: String,
/// }
///
/// impl Entity for User {
///     fn entity_name() -> String {
///         "users".to_string()
///     }
/// }
/// ```
///
/// An identifier left unset on insert is assigned by the store, so id
/// fields are usually `Option`s skipped while `None`.
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    fn entity_name() -> String {
        let name = std::any::type_name::<Self>();
        name.rsplit("::").next().unwrap_or(name).to_string()
    }

    fn id_field() -> &'static str {
        DEFAULT_ID_FIELD
    }
}

/// Converts an entity into its store document.
pub fn to_document<T: Entity>(entity: &T) -> WardenResult<Document> {
    let json = serde_json::to_value(entity)?;
    match Document::from_json(json) {
        Ok(document) => Ok(document),
        Err(e) => {
            log::error!("Entity {} does not serialize to a document", T::entity_name());
            Err(WardenError::new_with_cause(
                &format!("Entity {} does not serialize to a document", T::entity_name()),
                ErrorKind::ObjectMappingError,
                e,
            ))
        }
    }
}

/// Converts a store document back into an entity.
pub fn from_document<T: Entity>(document: Document) -> WardenResult<T> {
    match serde_json::from_value(document.to_json()) {
        Ok(entity) => Ok(entity),
        Err(e) => {
            log::error!("Failed to map document into {}: {}", T::entity_name(), e);
            Err(WardenError::new(
                &format!("Failed to map document into {}: {}", T::entity_name(), e),
                ErrorKind::ObjectMappingError,
            ))
        }
    }
}

/// Extracts the identifier stored under `id_field`.
///
/// # Errors
///
/// [ErrorKind::InvalidId] when the field is missing or null.
pub fn id_of(document: &Document, id_field: &str) -> WardenResult<Value> {
    let id = document.get(id_field)?;
    if id.is_null() {
        log::error!("Document has no value for id field {}", id_field);
        return Err(WardenError::new(
            &format!("Document has no value for id field {}", id_field),
            ErrorKind::InvalidId,
        ));
    }
    Ok(id)
}
