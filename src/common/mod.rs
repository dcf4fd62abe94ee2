pub(crate) mod element;
pub(crate) mod instance;
pub(crate) mod sort_order;
pub(crate) mod value;

pub use element::Element;
pub use instance::{MappedEntity, ObjectInstance};
pub use sort_order::{Sort, SortOrder};
pub use value::Value;
