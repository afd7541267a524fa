//! Selector Core - transport-independent selector algebra for document find queries.
//!
//! This crate builds, validates and compiles the boolean filters ("selectors")
//! understood by a document database's find endpoint, together with the
//! options and index specifications sent alongside them. It performs no I/O.
//!
//! # Main Components
//!
//! - **Selector**: immutable predicate tree built from plain constructor functions
//! - **Compiler**: renders a selector into the backend's query document
//! - **Options**: projection, sort, limit and index hint
//! - **Requests**: wire documents for the find and index endpoints
//! - **Eval**: local evaluation of compiled selectors against JSON documents
//!
//! # Example
//!
//! ```rust
//! use selector_core::{equal, match_element, select};
//! use serde_json::json;
//!
//! let selector = select([equal("active", true), match_element("shifts", equal("", 3))]).unwrap();
//! assert_eq!(
//!     selector.compile(),
//!     json!({"$and": [
//!         {"active": {"$eq": true}},
//!         {"shifts": {"$elemMatch": {"$eq": 3}}}
//!     ]})
//! );
//! ```

pub mod compile;
pub mod error;
pub mod eval;
pub mod index;
pub mod options;
pub mod request;
pub mod selector;

// Re-export main types for convenience
pub use error::{SelectorError, SelectorResult};
pub use index::{new_index, IndexSpec};
pub use options::{
    ascending, descending, Direction, IndexHint, Pagination, QueryOptions, QueryOptionsBuilder,
    SortField,
};
pub use request::{FindRequest, IndexFields, IndexRequest};
pub use selector::{
    and, equal, exists, greater_equal_than, greater_than, lower_equal_than, lower_than,
    match_all, match_element, not_equal, or, regex_match, select, CombinatorKind, Expr,
    MatchMode, Operator, Selector,
};
