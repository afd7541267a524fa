pub mod config;
pub mod database;
pub mod error;
pub mod find;
pub mod index;
pub mod port;
pub mod transport;

pub use config::{ClientConfig, ConfigError};
pub use database::Database;
pub use error::{FindError, FindResult};
pub use find::{find, ResultSet, Row};
pub use index::create_index;
pub use port::{ExecutionPort, FindLimits, IndexOutcome, IndexResult, Page};
pub use transport::{HttpPort, MemoryPort};

pub use selector_core::{
    and, ascending, descending, equal, exists, greater_equal_than, greater_than,
    lower_equal_than, lower_than, match_all, match_element, new_index, not_equal, or,
    regex_match, select, Direction, Expr, IndexHint, IndexSpec, Pagination, QueryOptions,
    QueryOptionsBuilder, Selector, SelectorError, SortField,
};
