use crate::common::{Element, Value};
use itertools::Itertools;
use std::fmt::Display;

/// Comparison operator of a leaf condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LeafOperator {
    Equals,
    Like,
    GreaterThan,
    GreaterEqualsThan,
    LesserThan,
    LesserEqualsThan,
    Between,
    In,
}

impl Display for LeafOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            LeafOperator::Equals => "=",
            LeafOperator::Like => "like",
            LeafOperator::GreaterThan => ">",
            LeafOperator::GreaterEqualsThan => ">=",
            LeafOperator::LesserThan => "<",
            LeafOperator::LesserEqualsThan => "<=",
            LeafOperator::Between => "between",
            LeafOperator::In => "in",
        };
        write!(f, "{}", symbol)
    }
}

/// Combining operator of a composite condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CombinatorOperator {
    And,
    Or,
    Not,
}

/// One node of a condition tree.
///
/// A condition is either a leaf comparing one element against a value, or a
/// combinator over child conditions. The tree is an immutable value: the
/// combinator methods consume their operands and return a new node, and no
/// flattening or simplification happens except double-negation removal in
/// [`negate`].
///
/// Leaf values may be [Value::Parameter] placeholders; such a tree is not
/// executable until the placeholders are substituted through a prepared
/// statement.
///
/// `Between` carries a two-value [Value::Array], `In` an array of candidates.
///
/// [`negate`]: CriteriaCondition::negate
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CriteriaCondition {
    /// A single comparison of an element against its value.
    Leaf {
        operator: LeafOperator,
        element: Element,
    },
    /// A logical combination of child conditions. `Not` always carries
    /// exactly one child.
    Combinator {
        operator: CombinatorOperator,
        conditions: Vec<CriteriaCondition>,
    },
}

fn leaf(operator: LeafOperator, name: &str, value: Value) -> CriteriaCondition {
    CriteriaCondition::Leaf {
        operator,
        element: Element::new(name, value),
    }
}

/// Creates an equality condition.
pub fn eq<T: Into<Value>>(name: &str, value: T) -> CriteriaCondition {
    leaf(LeafOperator::Equals, name, value.into())
}

/// Creates a pattern-match condition.
pub fn like<T: Into<Value>>(name: &str, value: T) -> CriteriaCondition {
    leaf(LeafOperator::Like, name, value.into())
}

/// Creates a greater-than condition.
pub fn gt<T: Into<Value>>(name: &str, value: T) -> CriteriaCondition {
    leaf(LeafOperator::GreaterThan, name, value.into())
}

/// Creates a greater-than-or-equals condition.
pub fn gte<T: Into<Value>>(name: &str, value: T) -> CriteriaCondition {
    leaf(LeafOperator::GreaterEqualsThan, name, value.into())
}

/// Creates a lesser-than condition.
pub fn lt<T: Into<Value>>(name: &str, value: T) -> CriteriaCondition {
    leaf(LeafOperator::LesserThan, name, value.into())
}

/// Creates a lesser-than-or-equals condition.
pub fn lte<T: Into<Value>>(name: &str, value: T) -> CriteriaCondition {
    leaf(LeafOperator::LesserEqualsThan, name, value.into())
}

/// Creates a between condition over an inclusive range.
pub fn between<T: Into<Value>>(name: &str, lower: T, upper: T) -> CriteriaCondition {
    leaf(
        LeafOperator::Between,
        name,
        Value::Array(vec![lower.into(), upper.into()]),
    )
}

/// Creates a membership condition over candidate values.
pub fn in_values(name: &str, values: Vec<Value>) -> CriteriaCondition {
    leaf(LeafOperator::In, name, Value::Array(values))
}

/// Combines conditions with logical and.
pub fn and(conditions: Vec<CriteriaCondition>) -> CriteriaCondition {
    CriteriaCondition::Combinator {
        operator: CombinatorOperator::And,
        conditions,
    }
}

/// Combines conditions with logical or.
pub fn or(conditions: Vec<CriteriaCondition>) -> CriteriaCondition {
    CriteriaCondition::Combinator {
        operator: CombinatorOperator::Or,
        conditions,
    }
}

/// Negates a condition. Negating a negation returns the inner condition.
pub fn not(condition: CriteriaCondition) -> CriteriaCondition {
    condition.negate()
}

impl CriteriaCondition {
    /// Combines this condition with another under logical and.
    pub fn and(self, other: CriteriaCondition) -> CriteriaCondition {
        and(vec![self, other])
    }

    /// Combines this condition with another under logical or.
    pub fn or(self, other: CriteriaCondition) -> CriteriaCondition {
        or(vec![self, other])
    }

    /// Negates this condition. Double negation unwraps to the original
    /// condition. A hand-built `Not` node without a child is treated like any
    /// other condition and gets wrapped.
    pub fn negate(self) -> CriteriaCondition {
        match self {
            CriteriaCondition::Combinator {
                operator: CombinatorOperator::Not,
                mut conditions,
            } if !conditions.is_empty() => conditions.remove(0),
            other => CriteriaCondition::Combinator {
                operator: CombinatorOperator::Not,
                conditions: vec![other],
            },
        }
    }

    /// Checks whether any leaf of this tree still carries an unbound
    /// parameter placeholder.
    pub fn has_parameters(&self) -> bool {
        match self {
            CriteriaCondition::Leaf { element, .. } => match element.value() {
                Value::Parameter(_) => true,
                Value::Array(values) => values.iter().any(|v| v.is_parameter()),
                _ => false,
            },
            CriteriaCondition::Combinator { conditions, .. } => {
                conditions.iter().any(|c| c.has_parameters())
            }
        }
    }
}

impl Display for CriteriaCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CriteriaCondition::Leaf { operator, element } => {
                write!(f, "{} {} {}", element.name(), operator, element.value())
            }
            CriteriaCondition::Combinator {
                operator: CombinatorOperator::Not,
                conditions,
            } => match conditions.first() {
                Some(inner) => write!(f, "not ({})", inner),
                None => write!(f, "not ()"),
            },
            CriteriaCondition::Combinator {
                operator,
                conditions,
            } => {
                let keyword = match operator {
                    CombinatorOperator::And => " and ",
                    CombinatorOperator::Or => " or ",
                    CombinatorOperator::Not => unreachable!(),
                };
                write!(
                    f,
                    "({})",
                    conditions.iter().map(|c| c.to_string()).join(keyword)
                )
            }
        }
    }
}
