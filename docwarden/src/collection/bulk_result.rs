use crate::common::Value;
use crate::errors::{WardenError, WardenResult};

/// What happened to one document of a bulk write.
#[derive(Debug)]
pub struct BulkOutcome<T> {
    /// Identifier the document was resolved under.
    pub id: Value,
    /// The written document, or why it was not written.
    pub result: WardenResult<T>,
    /// An after-phase hook failure. The write itself stands.
    pub after_hook_error: Option<WardenError>,
}

impl<T> BulkOutcome<T> {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-document outcomes of a bulk write, in resolution order.
///
/// One outcome exists for every document the query resolved to; a failed
/// document never hides the outcome of another.
#[derive(Debug)]
pub struct BulkResult<T> {
    outcomes: Vec<BulkOutcome<T>>,
}

impl<T> Default for BulkResult<T> {
    fn default() -> Self {
        BulkResult { outcomes: Vec::new() }
    }
}

impl<T> BulkResult<T> {
    pub(crate) fn new() -> Self {
        BulkResult::default()
    }

    pub(crate) fn push(&mut self, outcome: BulkOutcome<T>) {
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[BulkOutcome<T>] {
        &self.outcomes
    }

    /// Documents that were written, in resolution order.
    pub fn successes(&self) -> impl Iterator<Item = &T> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    /// Ids and errors of the documents that were not written.
    pub fn failures(&self) -> impl Iterator<Item = (&Value, &WardenError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (&o.id, e)))
    }

    /// After-hook failures of documents that were written.
    pub fn after_hook_errors(&self) -> impl Iterator<Item = (&Value, &WardenError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.after_hook_error.as_ref().map(|e| (&o.id, e)))
    }

    pub fn into_successes(self) -> Vec<T> {
        self.outcomes
            .into_iter()
            .filter_map(|o| o.result.ok())
            .collect()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

impl<T> IntoIterator for BulkResult<T> {
    type Item = BulkOutcome<T>;
    type IntoIter = std::vec::IntoIter<BulkOutcome<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.outcomes.into_iter()
    }
}
