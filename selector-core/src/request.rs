//! Wire request documents for the find and index endpoints.

use serde::Serialize;
use serde_json::Value;

use crate::index::IndexSpec;
use crate::options::{IndexHint, QueryOptions, SortField};
use crate::selector::Selector;

/// Body of one find round-trip.
///
/// Fields are declared in wire order; absent options are left out of the
/// serialized document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FindRequest {
    pub selector: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<Vec<SortField>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmark: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_index: Option<IndexHint>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub execution_stats: bool,
}

impl FindRequest {
    /// Request without page size or bookmark.
    pub fn new(selector: &Selector, options: &QueryOptions) -> Self {
        Self {
            selector: selector.compile(),
            fields: options.fields().map(<[String]>::to_vec),
            sort: options.sort().map(<[SortField]>::to_vec),
            limit: None,
            bookmark: None,
            use_index: options.use_index().cloned(),
            execution_stats: options.execution_stats(),
        }
    }

    /// Copy of this request for a single round.
    pub fn for_round(&self, page_size: usize, bookmark: Option<&str>) -> Self {
        Self {
            limit: Some(page_size),
            bookmark: bookmark.map(str::to_string),
            ..self.clone()
        }
    }
}

/// Body of an index-creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexRequest {
    pub index: IndexFields,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ddoc: Option<String>,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexFields {
    pub fields: Vec<String>,
}

impl From<&IndexSpec> for IndexRequest {
    fn from(spec: &IndexSpec) -> Self {
        Self {
            index: IndexFields {
                fields: spec.fields().to_vec(),
            },
            name: spec.name().map(str::to_string),
            ddoc: spec.ddoc().map(str::to_string),
            kind: "json",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::new_index;
    use crate::options::ascending;
    use crate::selector::{equal, select};
    use serde_json::json;

    #[test]
    fn test_minimal_request() {
        let selector = select([equal("active", true)]).unwrap();
        let request = FindRequest::new(&selector, &QueryOptions::default());
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"selector":{"active":{"$eq":true}}}"#
        );
    }

    #[test]
    fn test_full_request_wire_order() {
        let selector = select([equal("active", true)]).unwrap();
        let options = QueryOptions::builder()
            .fields(["name", "age"])
            .sort([ascending("name")])
            .limit(100)
            .use_index("_design/people")
            .execution_stats(true)
            .build()
            .unwrap();
        let request = FindRequest::new(&selector, &options).for_round(25, Some("g1AAAA"));
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            concat!(
                r#"{"selector":{"active":{"$eq":true}},"fields":["name","age"],"#,
                r#""sort":[{"name":"asc"}],"limit":25,"bookmark":"g1AAAA","#,
                r#""use_index":"_design/people","execution_stats":true}"#
            )
        );
    }

    #[test]
    fn test_for_round_keeps_base() {
        let selector = select([equal("a", 1)]).unwrap();
        let base = FindRequest::new(&selector, &QueryOptions::default());
        let round = base.for_round(10, None);
        assert_eq!(round.selector, base.selector);
        assert_eq!(round.limit, Some(10));
        assert!(round.bookmark.is_none());
        assert!(base.limit.is_none());
    }

    #[test]
    fn test_index_request() {
        let spec = new_index(["name", "age"])
            .unwrap()
            .named("by-name-age")
            .in_design_doc("people");
        let request = IndexRequest::from(&spec);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "index": {"fields": ["name", "age"]},
                "name": "by-name-age",
                "ddoc": "people",
                "type": "json"
            })
        );

        let request = IndexRequest::from(&new_index(["name"]).unwrap());
        assert_eq!(
            serde_json::to_string(&request).unwrap(),
            r#"{"index":{"fields":["name"]},"type":"json"}"#
        );
    }
}
