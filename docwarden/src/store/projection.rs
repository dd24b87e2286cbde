use crate::collection::Document;
use crate::errors::WardenResult;
use itertools::Itertools;
use std::fmt::Display;

/// Restricts the fields a read returns.
///
/// An include projection keeps only the listed fields plus the identifier;
/// an exclude projection drops the listed fields. Fields may be dotted paths
/// into embedded documents.
///
/// Projected documents are still mapped back into the entity type, so the
/// fields left out must be optional (or defaulted) in that type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    Include(Vec<String>),
    Exclude(Vec<String>),
}

impl Projection {
    pub fn include(fields: &[&str]) -> Projection {
        Projection::Include(fields.iter().map(|f| f.to_string()).collect())
    }

    pub fn exclude(fields: &[&str]) -> Projection {
        Projection::Exclude(fields.iter().map(|f| f.to_string()).collect())
    }

    /// Applies the projection to `document`. `id_field` survives every
    /// include projection.
    pub fn apply(&self, document: &Document, id_field: &str) -> WardenResult<Document> {
        match self {
            Projection::Include(fields) => {
                let mut projected = Document::new();
                let kept = std::iter::once(id_field).chain(fields.iter().map(String::as_str));
                for field in kept.unique() {
                    if document.contains_field(field) {
                        projected.put(field, document.get(field)?)?;
                    }
                }
                Ok(projected)
            }
            Projection::Exclude(fields) => {
                let mut projected = document.clone();
                for field in fields {
                    projected.remove(field)?;
                }
                Ok(projected)
            }
        }
    }
}

impl Display for Projection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Projection::Include(fields) => write!(f, "include[{}]", fields.join(", ")),
            Projection::Exclude(fields) => write!(f, "exclude[{}]", fields.join(", ")),
        }
    }
}
