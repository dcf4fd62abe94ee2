pub(crate) mod condition;

pub use condition::{
    and, between, eq, gt, gte, in_values, like, lt, lte, not, or, CombinatorOperator,
    CriteriaCondition, LeafOperator,
};
