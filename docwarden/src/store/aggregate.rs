use crate::collection::Document;
use crate::common::{SortOrder, Value, GROUP_KEY_FIELD};
use crate::errors::WardenResult;
use crate::filter::Filter;
use crate::store::find_options::sort_documents;
use crate::store::Projection;
use indexmap::IndexMap;
use std::fmt::Display;

/// One stage of an aggregation pipeline.
///
/// Stages run in order, each consuming the documents the previous one
/// produced. Results are plain documents: aggregation never maps back into
/// the entity type and never composes virtual fields.
#[derive(Debug, Clone)]
pub enum AggregateStage {
    /// Keeps the documents matching the filter.
    Match(Filter),
    /// Reshapes every document.
    Project(Projection),
    /// Stable sort on one field.
    Sort(String, SortOrder),
    Skip(usize),
    Limit(usize),
    /// Groups documents by the value of `key` (everything in one group when
    /// `None`) and emits one document per group, in order of first
    /// appearance, holding the key under `_id` plus every accumulator.
    Group {
        key: Option<String>,
        accumulators: Vec<Accumulator>,
    },
    /// Replaces the stream with a single `{ name: count }` document.
    Count(String),
}

/// Reduces a group of documents to one value stored under its output name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accumulator {
    Count(String),
    Sum(String, String),
    Avg(String, String),
    Min(String, String),
    Max(String, String),
}

impl Accumulator {
    fn output(&self) -> &str {
        match self {
            Accumulator::Count(out)
            | Accumulator::Sum(out, _)
            | Accumulator::Avg(out, _)
            | Accumulator::Min(out, _)
            | Accumulator::Max(out, _) => out,
        }
    }

    fn evaluate(&self, group: &[Document]) -> WardenResult<Value> {
        match self {
            Accumulator::Count(_) => Ok(Value::from(group.len())),
            Accumulator::Sum(_, field) => {
                let mut total = Value::I64(0);
                for value in numbers(group, field)? {
                    total = total.checked_add(&value)?;
                }
                Ok(total)
            }
            Accumulator::Avg(_, field) => {
                let values = numbers(group, field)?;
                if values.is_empty() {
                    return Ok(Value::Null);
                }
                let sum: f64 = values.iter().filter_map(Value::as_f64).sum();
                Ok(Value::F64(sum / values.len() as f64))
            }
            Accumulator::Min(_, field) => Ok(present(group, field)?.into_iter().min().unwrap_or(Value::Null)),
            Accumulator::Max(_, field) => Ok(present(group, field)?.into_iter().max().unwrap_or(Value::Null)),
        }
    }
}

fn present(group: &[Document], field: &str) -> WardenResult<Vec<Value>> {
    let mut values = Vec::with_capacity(group.len());
    for document in group {
        let value = document.get(field)?;
        if !value.is_null() {
            values.push(value);
        }
    }
    Ok(values)
}

// non-numeric values are skipped
fn numbers(group: &[Document], field: &str) -> WardenResult<Vec<Value>> {
    Ok(present(group, field)?
        .into_iter()
        .filter(Value::is_number)
        .collect())
}

impl Display for AggregateStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregateStage::Match(filter) => write!(f, "match{}", filter),
            AggregateStage::Project(projection) => write!(f, "project {}", projection),
            AggregateStage::Sort(field, order) => write!(f, "sort({} {:?})", field, order),
            AggregateStage::Skip(n) => write!(f, "skip({})", n),
            AggregateStage::Limit(n) => write!(f, "limit({})", n),
            AggregateStage::Group { key, accumulators } => write!(
                f,
                "group({}, {} accumulators)",
                key.as_deref().unwrap_or("*"),
                accumulators.len()
            ),
            AggregateStage::Count(name) => write!(f, "count({})", name),
        }
    }
}

/// Runs `stages` over `documents`.
///
/// Store bindings without a native aggregation engine can evaluate a
/// pipeline with this function once they have the candidate documents.
pub fn run_pipeline(
    documents: Vec<Document>,
    stages: &[AggregateStage],
    id_field: &str,
) -> WardenResult<Vec<Document>> {
    let mut current = documents;
    for stage in stages {
        log::debug!("Running aggregate stage {}", stage);
        current = run_stage(current, stage, id_field)?;
    }
    Ok(current)
}

fn run_stage(
    documents: Vec<Document>,
    stage: &AggregateStage,
    id_field: &str,
) -> WardenResult<Vec<Document>> {
    match stage {
        AggregateStage::Match(filter) => {
            let mut matched = Vec::new();
            for document in documents {
                if filter.apply(&document)? {
                    matched.push(document);
                }
            }
            Ok(matched)
        }
        AggregateStage::Project(projection) => documents
            .iter()
            .map(|document| projection.apply(document, id_field))
            .collect(),
        AggregateStage::Sort(field, order) => {
            let mut documents = documents;
            sort_documents(&mut documents, &[(field.clone(), *order)])?;
            Ok(documents)
        }
        AggregateStage::Skip(n) => Ok(documents.into_iter().skip(*n).collect()),
        AggregateStage::Limit(n) => Ok(documents.into_iter().take(*n).collect()),
        AggregateStage::Group { key, accumulators } => group(documents, key.as_deref(), accumulators),
        AggregateStage::Count(name) => {
            let mut result = Document::new();
            result.put(name, documents.len())?;
            Ok(vec![result])
        }
    }
}

fn group(
    documents: Vec<Document>,
    key: Option<&str>,
    accumulators: &[Accumulator],
) -> WardenResult<Vec<Document>> {
    let mut groups: IndexMap<Value, Vec<Document>> = IndexMap::new();
    for document in documents {
        let group_key = match key {
            Some(field) => document.get(field)?,
            None => Value::Null,
        };
        groups.entry(group_key).or_default().push(document);
    }

    let mut results = Vec::with_capacity(groups.len());
    for (group_key, members) in groups {
        let mut result = Document::new();
        result.put(GROUP_KEY_FIELD, group_key)?;
        for accumulator in accumulators {
            result.put(accumulator.output(), accumulator.evaluate(&members)?)?;
        }
        results.push(result);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::filter::field;

    fn orders() -> Vec<Document> {
        vec![
            doc! { id: 1, customer: "ada", total: 10, status: "paid" },
            doc! { id: 2, customer: "bob", total: 5.5, status: "open" },
            doc! { id: 3, customer: "ada", total: 20, status: "paid" },
            doc! { id: 4, customer: "cy", status: "open" },
        ]
    }

    #[test]
    fn test_empty_pipeline_returns_input() {
        let result = run_pipeline(orders(), &[], "id").unwrap();
        assert_eq!(result, orders());
    }

    #[test]
    fn test_match_sort_limit() {
        let stages = vec![
            AggregateStage::Match(field("status").eq("paid")),
            AggregateStage::Sort("total".to_string(), SortOrder::Descending),
            AggregateStage::Limit(1),
        ];
        let result = run_pipeline(orders(), &stages, "id").unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].get("id").unwrap(), Value::from(3));
    }

    #[test]
    fn test_skip_and_count() {
        let stages = vec![AggregateStage::Skip(1), AggregateStage::Count("n".to_string())];
        let result = run_pipeline(orders(), &stages, "id").unwrap();
        assert_eq!(result, vec![doc! { n: 3 }]);
    }

    #[test]
    fn test_project_keeps_id() {
        let stages = vec![AggregateStage::Project(Projection::include(&["customer"]))];
        let result = run_pipeline(orders(), &stages, "id").unwrap();
        assert_eq!(result[0], doc! { id: 1, customer: "ada" });
    }

    #[test]
    fn test_group_by_key_in_first_appearance_order() {
        let stages = vec![AggregateStage::Group {
            key: Some("customer".to_string()),
            accumulators: vec![
                Accumulator::Count("orders".to_string()),
                Accumulator::Sum("spent".to_string(), "total".to_string()),
                Accumulator::Max("largest".to_string(), "total".to_string()),
            ],
        }];
        let result = run_pipeline(orders(), &stages, "id").unwrap();
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].get("_id").unwrap(), Value::from("ada"));
        assert_eq!(result[0].get("orders").unwrap(), Value::from(2));
        assert_eq!(result[0].get("spent").unwrap(), Value::from(30));
        assert_eq!(result[0].get("largest").unwrap(), Value::from(20));
        assert_eq!(result[2].get("_id").unwrap(), Value::from("cy"));
        assert_eq!(result[2].get("spent").unwrap(), Value::from(0));
        assert_eq!(result[2].get("largest").unwrap(), Value::Null);
    }

    #[test]
    fn test_group_everything_with_avg_and_min() {
        let stages = vec![AggregateStage::Group {
            key: None,
            accumulators: vec![
                Accumulator::Avg("avg".to_string(), "total".to_string()),
                Accumulator::Min("min".to_string(), "total".to_string()),
            ],
        }];
        let result = run_pipeline(orders(), &stages, "id").unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].get("_id").unwrap(), Value::Null);
        assert_eq!(result[0].get("avg").unwrap(), Value::from(35.5 / 3.0));
        assert_eq!(result[0].get("min").unwrap(), Value::from(5.5));
    }

    #[test]
    fn test_avg_of_nothing_is_null() {
        let stages = vec![AggregateStage::Group {
            key: None,
            accumulators: vec![Accumulator::Avg("avg".to_string(), "missing".to_string())],
        }];
        let result = run_pipeline(orders(), &stages, "id").unwrap();
        assert_eq!(result[0].get("avg").unwrap(), Value::Null);
    }
}
