pub(crate) mod builder;
pub(crate) mod pagination;
pub(crate) mod query;

pub use builder::{delete, select, DeleteQueryBuilder, SelectQueryBuilder};
pub use pagination::{seek_after, seek_before, token_from, CursorToken};
pub use query::{DeleteQuery, SelectQuery};
