//! Options sent alongside a selector: projection, sort order, row limit and
//! index hint.
//!
//! ```rust
//! use selector_core::{ascending, QueryOptions};
//!
//! let options = QueryOptions::builder()
//!     .fields(["name", "age"])
//!     .sort([ascending("name")])
//!     .limit(100)
//!     .build()
//!     .unwrap();
//! assert_eq!(options.limit(), Some(100));
//! ```

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{SelectorError, SelectorResult};

/// Sort direction of a single field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

/// One `(field, direction)` pair of a sort specification.
///
/// Serializes as `{"<field>": "asc" | "desc"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SortField {
    pub field: String,
    pub direction: Direction,
}

impl Serialize for SortField {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, self.direction.as_str())?;
        map.end()
    }
}

pub fn ascending(field: &str) -> SortField {
    SortField {
        field: field.to_string(),
        direction: Direction::Asc,
    }
}

pub fn descending(field: &str) -> SortField {
    SortField {
        field: field.to_string(),
        direction: Direction::Desc,
    }
}

/// Index the backend should use. A bare design document id or a
/// `(design document, index name)` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum IndexHint {
    DesignDoc(String),
    Named(String, String),
}

impl From<&str> for IndexHint {
    fn from(ddoc: &str) -> Self {
        IndexHint::DesignDoc(ddoc.to_string())
    }
}

impl From<(&str, &str)> for IndexHint {
    fn from((ddoc, name): (&str, &str)) -> Self {
        IndexHint::Named(ddoc.to_string(), name.to_string())
    }
}

/// How many rounds a find call may issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pagination {
    /// Return only the first round's page.
    SingleRound,
    /// Keep fetching until this many rows are collected or the matches run out.
    UpTo(usize),
    /// Keep fetching until the matches run out, bounded by the safety ceiling.
    Exhaust,
}

/// Immutable set of options for one find query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    fields: Option<Vec<String>>,
    sort: Option<Vec<SortField>>,
    limit: Option<usize>,
    fetch_all: bool,
    use_index: Option<IndexHint>,
    execution_stats: bool,
}

impl QueryOptions {
    pub fn builder() -> QueryOptionsBuilder {
        QueryOptionsBuilder::default()
    }

    pub fn fields(&self) -> Option<&[String]> {
        self.fields.as_deref()
    }

    pub fn sort(&self) -> Option<&[SortField]> {
        self.sort.as_deref()
    }

    /// Requested row limit; `None` when omitted or zero.
    pub fn limit(&self) -> Option<usize> {
        self.limit.filter(|n| *n > 0)
    }

    pub fn use_index(&self) -> Option<&IndexHint> {
        self.use_index.as_ref()
    }

    pub fn execution_stats(&self) -> bool {
        self.execution_stats
    }

    /// Round-trip policy derived from the limit and `fetch_all` flag.
    pub fn pagination(&self) -> Pagination {
        match (self.limit(), self.fetch_all) {
            (Some(n), _) => Pagination::UpTo(n),
            (None, true) => Pagination::Exhaust,
            (None, false) => Pagination::SingleRound,
        }
    }
}

/// Builder for [`QueryOptions`]; checks its input in [`QueryOptionsBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct QueryOptionsBuilder {
    options: QueryOptions,
}

impl QueryOptionsBuilder {
    /// Projection; only these fields are returned per row.
    pub fn fields<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.fields = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn sort(mut self, pairs: impl IntoIterator<Item = SortField>) -> Self {
        self.options.sort = Some(pairs.into_iter().collect());
        self
    }

    /// Zero keeps the single-round behaviour, anything above switches to
    /// auto-pagination until `n` rows are collected.
    pub fn limit(mut self, n: usize) -> Self {
        self.options.limit = Some(n);
        self
    }

    /// Auto-paginate until the matches are exhausted.
    pub fn fetch_all(mut self) -> Self {
        self.options.fetch_all = true;
        self
    }

    pub fn use_index(mut self, hint: impl Into<IndexHint>) -> Self {
        self.options.use_index = Some(hint.into());
        self
    }

    pub fn execution_stats(mut self, enabled: bool) -> Self {
        self.options.execution_stats = enabled;
        self
    }

    pub fn build(self) -> SelectorResult<QueryOptions> {
        if let Some(fields) = &self.options.fields {
            if fields.is_empty() {
                return Err(SelectorError::EmptyProjection);
            }
            if fields.iter().any(|f| f.is_empty()) {
                return Err(SelectorError::EmptyFieldName("projection"));
            }
        }
        if let Some(sort) = &self.options.sort {
            if sort.is_empty() {
                return Err(SelectorError::EmptySort);
            }
            if sort.iter().any(|s| s.field.is_empty()) {
                return Err(SelectorError::EmptyFieldName("sort"));
            }
        }
        Ok(self.options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_is_single_round() {
        let options = QueryOptions::default();
        assert_eq!(options.pagination(), Pagination::SingleRound);
        assert!(options.fields().is_none());
        assert!(options.sort().is_none());
    }

    #[test]
    fn test_limit_modes() {
        let options = QueryOptions::builder().limit(0).build().unwrap();
        assert_eq!(options.limit(), None);
        assert_eq!(options.pagination(), Pagination::SingleRound);

        let options = QueryOptions::builder().limit(5).build().unwrap();
        assert_eq!(options.pagination(), Pagination::UpTo(5));

        let options = QueryOptions::builder().fetch_all().build().unwrap();
        assert_eq!(options.pagination(), Pagination::Exhaust);

        let options = QueryOptions::builder().fetch_all().limit(7).build().unwrap();
        assert_eq!(options.pagination(), Pagination::UpTo(7));
    }

    #[test]
    fn test_validation() {
        let err = QueryOptions::builder()
            .fields(Vec::<String>::new())
            .build()
            .unwrap_err();
        assert_eq!(err, SelectorError::EmptyProjection);

        let err = QueryOptions::builder().fields(["name", ""]).build().unwrap_err();
        assert_eq!(err, SelectorError::EmptyFieldName("projection"));

        let err = QueryOptions::builder().sort(Vec::new()).build().unwrap_err();
        assert_eq!(err, SelectorError::EmptySort);

        let err = QueryOptions::builder()
            .sort([ascending("")])
            .build()
            .unwrap_err();
        assert_eq!(err, SelectorError::EmptyFieldName("sort"));
    }

    #[test]
    fn test_sort_field_serialization() {
        let sort = vec![ascending("name"), descending("age")];
        assert_eq!(
            serde_json::to_value(&sort).unwrap(),
            json!([{"name": "asc"}, {"age": "desc"}])
        );
    }

    #[test]
    fn test_index_hint_serialization() {
        let hint: IndexHint = "_design/people".into();
        assert_eq!(serde_json::to_value(&hint).unwrap(), json!("_design/people"));

        let hint: IndexHint = ("_design/people", "by-name").into();
        assert_eq!(
            serde_json::to_value(&hint).unwrap(),
            json!(["_design/people", "by-name"])
        );
    }
}
