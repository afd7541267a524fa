use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{FindError, FindResult};

/// One document returned by a find, full or projected.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    doc: Value,
}

impl Row {
    pub fn new(doc: Value) -> Self {
        Self { doc }
    }

    /// Document id, if the row carries one.
    pub fn id(&self) -> Option<&str> {
        self.doc.get("_id").and_then(Value::as_str)
    }

    pub fn raw(&self) -> &Value {
        &self.doc
    }

    pub fn into_value(self) -> Value {
        self.doc
    }

    /// Decode the row into a caller-declared shape.
    pub fn decode<T: DeserializeOwned>(&self) -> FindResult<T> {
        T::deserialize(&self.doc).map_err(|e| FindError::Unmarshal(e.to_string()))
    }
}

/// Rows and status of one logical find query.
///
/// Rows gathered before a failing round stay available, so check
/// [`ResultSet::is_ok`] before treating the rows as complete.
#[derive(Debug, Default)]
pub struct ResultSet {
    rows: Vec<Row>,
    error: Option<FindError>,
    bookmark: Option<String>,
    warnings: Vec<String>,
    rounds: usize,
}

impl ResultSet {
    pub(crate) fn push_page(&mut self, docs: Vec<Value>) {
        self.rounds += 1;
        self.rows.extend(docs.into_iter().map(Row::new));
    }

    pub(crate) fn set_bookmark(&mut self, bookmark: Option<String>) {
        if bookmark.as_deref().is_some_and(|b| !b.is_empty()) {
            self.bookmark = bookmark;
        }
    }

    pub(crate) fn push_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub(crate) fn fail(&mut self, error: FindError) {
        self.error = Some(error);
    }

    /// Number of materialized rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True when every round succeeded.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Terminal failure, if a round failed.
    pub fn error(&self) -> Option<&FindError> {
        self.error.as_ref()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Bookmark of the last successful round; resumes the query later.
    pub fn bookmark(&self) -> Option<&str> {
        self.bookmark.as_deref()
    }

    /// Number of successful round-trips.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    /// Warnings reported by the backend, in round order.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Delivers each row in order. The first error returned by `visit`
    /// stops the delivery and becomes the outcome.
    pub fn try_for_each<F, E>(&self, mut visit: F) -> Result<(), E>
    where
        F: FnMut(&Row) -> Result<(), E>,
    {
        for row in &self.rows {
            visit(row)?;
        }
        Ok(())
    }

    /// Decodes every row into `T`, stopping at the first mismatch.
    pub fn decode_all<T: DeserializeOwned>(&self) -> FindResult<Vec<T>> {
        self.rows.iter().map(|row| row.decode::<T>()).collect()
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// All-or-nothing view: the rows if every round succeeded, the error otherwise.
    pub fn into_result(self) -> FindResult<Vec<Row>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.rows),
        }
    }
}

impl<'a> IntoIterator for &'a ResultSet {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
