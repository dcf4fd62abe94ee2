pub(crate) mod params;
pub(crate) mod parser;
pub(crate) mod prepared;
pub(crate) mod tokenizer;

pub use params::Params;
pub use parser::{ParsedQuery, QueryParser};
pub use prepared::PreparedStatement;
