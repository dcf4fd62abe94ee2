pub(crate) mod converter;
pub(crate) mod field_adapter;
pub(crate) mod param_adapter;

pub use converter::EntityConverter;
