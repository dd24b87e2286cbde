use std::any::Any;
use std::fmt::Display;

use regex::Regex;

use crate::collection::Document;
use crate::common::Value;
use crate::errors::{ErrorKind, WardenError, WardenResult};

use super::FilterProvider;

/// Matches every document.
pub(crate) struct AllFilter;

impl FilterProvider for AllFilter {
    fn apply(&self, _entry: &Document) -> WardenResult<bool> {
        Ok(true)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Display for AllFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AllFilter")
    }
}

/// Matches documents where a field equals a value.
pub(crate) struct EqualsFilter {
    field_name: String,
    field_value: Value,
}

impl EqualsFilter {
    pub(crate) fn new(field_name: String, field_value: Value) -> Self {
        EqualsFilter {
            field_name,
            field_value,
        }
    }
}

impl Display for EqualsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} == {})", self.field_name, self.field_value)
    }
}

impl FilterProvider for EqualsFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> WardenResult<bool> {
        let value = entry.get(&self.field_name)?;
        Ok(value == self.field_value)
    }

    fn equality_on(&self, field: &str) -> Option<Value> {
        if self.field_name == field {
            Some(self.field_value.clone())
        } else {
            None
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Matches documents where a field differs from a value.
pub(crate) struct NotEqualsFilter {
    field_name: String,
    field_value: Value,
}

impl NotEqualsFilter {
    pub(crate) fn new(field_name: String, field_value: Value) -> Self {
        NotEqualsFilter {
            field_name,
            field_value,
        }
    }
}

impl Display for NotEqualsFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} != {})", self.field_name, self.field_value)
    }
}

impl FilterProvider for NotEqualsFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> WardenResult<bool> {
        let value = entry.get(&self.field_name)?;
        Ok(value != self.field_value)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ComparisonMode {
    Greater,
    GreaterEqual,
    Lesser,
    LesserEqual,
}

/// Relational comparison of a field against a value.
///
/// Only values of the same kind compare: numbers with numbers (integer and
/// float alike), strings with strings, booleans with booleans. A missing
/// field or a value of another kind never matches.
pub(crate) struct ComparisonFilter {
    field_name: String,
    field_value: Value,
    comparison_mode: ComparisonMode,
}

impl ComparisonFilter {
    pub(crate) fn new(field_name: String, field_value: Value, comparison_mode: ComparisonMode) -> Self {
        ComparisonFilter {
            field_name,
            field_value,
            comparison_mode,
        }
    }
}

fn same_kind(lhs: &Value, rhs: &Value) -> bool {
    (lhs.is_number() && rhs.is_number())
        || (lhs.is_string() && rhs.is_string())
        || (lhs.is_bool() && rhs.is_bool())
}

impl Display for ComparisonFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let operator = match self.comparison_mode {
            ComparisonMode::Greater => ">",
            ComparisonMode::GreaterEqual => ">=",
            ComparisonMode::Lesser => "<",
            ComparisonMode::LesserEqual => "<=",
        };
        write!(f, "({} {} {})", self.field_name, operator, self.field_value)
    }
}

impl FilterProvider for ComparisonFilter {
    #[inline]
    fn apply(&self, entry: &Document) -> WardenResult<bool> {
        let value = entry.get(&self.field_name)?;
        if !same_kind(&value, &self.field_value) {
            return Ok(false);
        }

        let field_value = &self.field_value;
        match self.comparison_mode {
            ComparisonMode::Greater => Ok(&value > field_value),
            ComparisonMode::GreaterEqual => Ok(&value >= field_value),
            ComparisonMode::Lesser => Ok(&value < field_value),
            ComparisonMode::LesserEqual => Ok(&value <= field_value),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Matches documents whose field value is one of a set of values.
///
/// An array field matches when any of its elements is in the set.
pub(crate) struct InFilter {
    field_name: String,
    field_values: Vec<Value>,
}

impl InFilter {
    pub(crate) fn new(field_name: String, field_values: Vec<Value>) -> Self {
        InFilter {
            field_name,
            field_values,
        }
    }
}

fn contains_any(candidates: &[Value], value: &Value) -> bool {
    match value {
        Value::Array(elements) => elements.iter().any(|e| candidates.contains(e)),
        other => candidates.contains(other),
    }
}

impl Display for InFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} in {})", self.field_name, Value::Array(self.field_values.clone()))
    }
}

impl FilterProvider for InFilter {
    fn apply(&self, entry: &Document) -> WardenResult<bool> {
        let value = entry.get(&self.field_name)?;
        Ok(contains_any(&self.field_values, &value))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Matches documents whose field value is none of a set of values.
pub(crate) struct NotInFilter {
    field_name: String,
    field_values: Vec<Value>,
}

impl NotInFilter {
    pub(crate) fn new(field_name: String, field_values: Vec<Value>) -> Self {
        NotInFilter {
            field_name,
            field_values,
        }
    }
}

impl Display for NotInFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} not in {})", self.field_name, Value::Array(self.field_values.clone()))
    }
}

impl FilterProvider for NotInFilter {
    fn apply(&self, entry: &Document) -> WardenResult<bool> {
        let value = entry.get(&self.field_name)?;
        Ok(!contains_any(&self.field_values, &value))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Matches string fields against a regular expression.
///
/// The pattern is compiled once at construction. An invalid pattern is
/// logged and reported as a [ErrorKind::FilterError] when the filter is
/// applied, so building a query never panics.
pub(crate) struct RegexFilter {
    field_name: String,
    source: String,
    pattern: Option<Regex>,
}

impl RegexFilter {
    pub(crate) fn new(field_name: String, source: String) -> Self {
        let pattern = match Regex::new(&source) {
            Ok(regex) => Some(regex),
            Err(e) => {
                log::error!("Invalid regex pattern '{}': {}", source, e);
                None
            }
        };

        RegexFilter {
            field_name,
            source,
            pattern,
        }
    }
}

impl Display for RegexFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({} =~ {})", self.field_name, self.source)
    }
}

impl FilterProvider for RegexFilter {
    fn apply(&self, entry: &Document) -> WardenResult<bool> {
        let pattern = match &self.pattern {
            Some(pattern) => pattern,
            None => {
                log::error!("Cannot apply invalid regex pattern {}", self.source);
                return Err(WardenError::new(
                    &format!("Invalid regex pattern {}", self.source),
                    ErrorKind::FilterError,
                ));
            }
        };

        let value = entry.get(&self.field_name)?;
        match value.as_str() {
            Some(text) => Ok(pattern.is_match(text)),
            None => Ok(false),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
