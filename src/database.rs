use selector_core::{IndexSpec, QueryOptions, Selector};

use crate::error::FindResult;
use crate::find::{find, ResultSet};
use crate::index::create_index;
use crate::port::{ExecutionPort, IndexOutcome};

/// A database scope bound to an execution port.
pub struct Database<'p, P: ?Sized> {
    port: &'p P,
    name: String,
}

impl<'p, P> Database<'p, P>
where
    P: ExecutionPort + ?Sized,
{
    pub fn new(port: &'p P, name: &str) -> Self {
        Self {
            port,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn find(&self, selector: &Selector, options: &QueryOptions) -> ResultSet {
        find(self.port, &self.name, selector, options).await
    }

    pub async fn create_index(&self, spec: &IndexSpec) -> FindResult<IndexOutcome> {
        create_index(self.port, &self.name, spec).await
    }
}
