use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use parking_lot::{Mutex, RwLock};
use selector_core::eval::{collate, get_field_value, matches, project};
use selector_core::{Direction, FindRequest, IndexHint, IndexRequest};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};

use crate::error::{FindError, FindResult};
use crate::port::{ExecutionPort, FindLimits, IndexOutcome, IndexResult, Page};

/// Rows returned when a request carries no limit.
const BACKEND_DEFAULT_LIMIT: usize = 25;

const NO_INDEX_WARNING: &str = "no matching index found, create an index to optimize query time";

#[derive(Debug, Clone)]
struct StoredIndex {
    ddoc: String,
    name: String,
    fields: Vec<String>,
}

#[derive(Debug, Clone)]
struct InjectedFailure {
    round: usize,
    status: u16,
    error: String,
    reason: String,
}

/// In-memory execution port for testing.
///
/// Evaluates compiled requests locally with the backend's rules: selector
/// matching, sort (which needs a covering index), projection and opaque
/// bookmarks.
pub struct MemoryPort {
    databases: RwLock<HashMap<String, Vec<Value>>>,
    indexes: RwLock<HashMap<String, Vec<StoredIndex>>>,
    limits: FindLimits,
    execute_calls: AtomicUsize,
    failure: Mutex<Option<InjectedFailure>>,
}

impl Default for MemoryPort {
    fn default() -> Self {
        Self::new(FindLimits::default())
    }
}

impl MemoryPort {
    pub fn new(limits: FindLimits) -> Self {
        Self {
            databases: RwLock::new(HashMap::new()),
            indexes: RwLock::new(HashMap::new()),
            limits,
            execute_calls: AtomicUsize::new(0),
            failure: Mutex::new(None),
        }
    }

    /// Creates `database` if needed and adds `docs` to it.
    pub fn add_documents(&self, database: &str, docs: Vec<Value>) {
        self.databases
            .write()
            .entry(database.to_string())
            .or_default()
            .extend(docs);
    }

    pub fn document_count(&self, database: &str) -> usize {
        self.databases.read().get(database).map_or(0, Vec::len)
    }

    /// Makes the `round`-th `execute` call (1-based, counted across all
    /// databases) fail with the given backend error.
    pub fn fail_on_round(&self, round: usize, status: u16, error: &str, reason: &str) {
        *self.failure.lock() = Some(InjectedFailure {
            round,
            status,
            error: error.to_string(),
            reason: reason.to_string(),
        });
    }

    /// Number of `execute` calls served so far.
    pub fn execute_calls(&self) -> usize {
        self.execute_calls.load(AtomicOrdering::SeqCst)
    }

    fn injected_failure(&self, call: usize) -> Option<FindError> {
        let failure = self.failure.lock();
        failure
            .as_ref()
            .filter(|f| f.round == call)
            .map(|f| FindError::backend(f.status, &f.error, &f.reason))
    }

    fn check_sort(&self, database: &str, request: &FindRequest) -> FindResult<()> {
        let Some(sort) = &request.sort else {
            return Ok(());
        };
        if sort.iter().any(|s| s.direction != sort[0].direction) {
            return Err(FindError::backend(
                400,
                "unsupported_mixed_sort",
                "Sorts currently only support a single direction for all fields.",
            ));
        }
        let wanted: Vec<&str> = sort.iter().map(|s| s.field.as_str()).collect();
        let indexes = self.indexes.read();
        let covered = indexes.get(database).is_some_and(|list| {
            list.iter().any(|idx| {
                idx.fields.len() >= wanted.len()
                    && idx.fields.iter().zip(&wanted).all(|(a, b)| a == b)
            })
        });
        if covered {
            Ok(())
        } else {
            Err(FindError::backend(
                400,
                "no_usable_index",
                "No global index exists for this sort, try indexing by the sort fields.",
            ))
        }
    }

    fn warning_for(&self, database: &str, request: &FindRequest) -> Option<String> {
        let indexes = self.indexes.read();
        let list = indexes.get(database).map(Vec::as_slice).unwrap_or_default();
        if let Some(hint) = &request.use_index {
            let known = match hint {
                IndexHint::DesignDoc(ddoc) => list.iter().any(|i| &i.ddoc == ddoc),
                IndexHint::Named(ddoc, name) => {
                    list.iter().any(|i| &i.ddoc == ddoc && &i.name == name)
                }
            };
            if !known {
                return Some(format!(
                    "{} was not used because it does not contain a valid index for this query.",
                    hint_label(hint)
                ));
            }
        }
        if list.is_empty() {
            return Some(NO_INDEX_WARNING.to_string());
        }
        None
    }
}

fn hint_label(hint: &IndexHint) -> String {
    match hint {
        IndexHint::DesignDoc(ddoc) => ddoc.clone(),
        IndexHint::Named(ddoc, name) => format!("{}, {}", ddoc, name),
    }
}

fn encode_bookmark(offset: usize) -> String {
    URL_SAFE_NO_PAD.encode(format!("g1:{}", offset))
}

fn decode_bookmark(bookmark: &str) -> FindResult<usize> {
    let invalid = || FindError::backend(400, "invalid_bookmark", "Invalid bookmark value");
    let bytes = URL_SAFE_NO_PAD.decode(bookmark).map_err(|_| invalid())?;
    let text = String::from_utf8(bytes).map_err(|_| invalid())?;
    text.strip_prefix("g1:")
        .and_then(|n| n.parse().ok())
        .ok_or_else(invalid)
}

fn sort_key<'a>(doc: &'a Value, field: &str) -> &'a Value {
    get_field_value(doc, field).unwrap_or(&Value::Null)
}

#[async_trait]
impl ExecutionPort for MemoryPort {
    async fn execute(&self, database: &str, request: &FindRequest) -> FindResult<Page> {
        let call = self.execute_calls.fetch_add(1, AtomicOrdering::SeqCst) + 1;
        if let Some(err) = self.injected_failure(call) {
            return Err(err);
        }

        let mut matched: Vec<Value> = {
            let databases = self.databases.read();
            let docs = databases.get(database).ok_or_else(|| {
                FindError::backend(404, "not_found", "Database does not exist.")
            })?;
            docs.iter()
                .filter(|doc| matches(&request.selector, doc))
                .cloned()
                .collect()
        };

        self.check_sort(database, request)?;
        match &request.sort {
            Some(sort) => matched.sort_by(|a, b| {
                sort.iter().fold(Ordering::Equal, |ord, s| {
                    ord.then_with(|| {
                        let ord = collate(sort_key(a, &s.field), sort_key(b, &s.field));
                        match s.direction {
                            Direction::Asc => ord,
                            Direction::Desc => ord.reverse(),
                        }
                    })
                })
            }),
            None => matched.sort_by(|a, b| collate(sort_key(a, "_id"), sort_key(b, "_id"))),
        }

        let offset = match &request.bookmark {
            Some(bookmark) if !bookmark.is_empty() => decode_bookmark(bookmark)?,
            _ => 0,
        };
        let limit = request
            .limit
            .unwrap_or(BACKEND_DEFAULT_LIMIT)
            .min(self.limits.max_page_size);
        let start = offset.min(matched.len());
        let end = (start + limit).min(matched.len());

        let docs: Vec<Value> = matched[start..end]
            .iter()
            .map(|doc| match &request.fields {
                Some(fields) => project(doc, fields),
                None => doc.clone(),
            })
            .collect();

        Ok(Page {
            bookmark: Some(encode_bookmark(end)),
            warning: self.warning_for(database, request),
            docs,
        })
    }

    async fn create_index(&self, database: &str, index: &IndexRequest) -> FindResult<IndexOutcome> {
        if !self.databases.read().contains_key(database) {
            return Err(FindError::backend(
                404,
                "not_found",
                "Database does not exist.",
            ));
        }

        let fields = index.index.fields.clone();
        let name = index
            .name
            .clone()
            .unwrap_or_else(|| format!("idx-{}", fields.join("-")));
        let ddoc = match &index.ddoc {
            Some(ddoc) if ddoc.starts_with("_design/") => ddoc.clone(),
            Some(ddoc) => format!("_design/{}", ddoc),
            None => format!("_design/{}", name),
        };

        let mut indexes = self.indexes.write();
        let list = indexes.entry(database.to_string()).or_default();
        if let Some(existing) = list
            .iter()
            .find(|i| i.fields == fields && i.name == name && i.ddoc == ddoc)
        {
            return Ok(IndexOutcome {
                result: IndexResult::Exists,
                id: existing.ddoc.clone(),
                name: existing.name.clone(),
            });
        }
        list.push(StoredIndex {
            ddoc: ddoc.clone(),
            name: name.clone(),
            fields,
        });
        Ok(IndexOutcome {
            result: IndexResult::Created,
            id: ddoc,
            name,
        })
    }

    fn limits(&self) -> FindLimits {
        self.limits
    }
}
