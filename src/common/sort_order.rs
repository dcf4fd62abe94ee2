use std::fmt::{Display, Formatter};

/// Specifies the direction for sorting query results.
///
/// # Variants
/// - `Ascending`: sort from smallest to largest value
/// - `Descending`: sort from largest to smallest value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SortOrder {
    /// Sort in ascending order (smallest to largest, A-Z, oldest to newest)
    Ascending,
    /// Sort in descending order (largest to smallest, Z-A, newest to oldest)
    Descending,
}

/// One sort key of a query: a physical column name plus a direction.
///
/// Sorts are value objects; a [crate::query::SelectQuery] carries them in the
/// order they were declared.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sort {
    name: String,
    order: SortOrder,
}

impl Sort {
    /// Creates an ascending sort on the given column.
    pub fn asc(name: &str) -> Self {
        Sort {
            name: name.to_string(),
            order: SortOrder::Ascending,
        }
    }

    /// Creates a descending sort on the given column.
    pub fn desc(name: &str) -> Self {
        Sort {
            name: name.to_string(),
            order: SortOrder::Descending,
        }
    }

    /// Creates a sort on the given column with an explicit direction.
    pub fn of(name: &str, order: SortOrder) -> Self {
        Sort {
            name: name.to_string(),
            order,
        }
    }

    /// Returns the column name this sort applies to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the sort direction.
    pub fn order(&self) -> SortOrder {
        self.order
    }
}

impl Display for Sort {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.order {
            SortOrder::Ascending => write!(f, "{} asc", self.name),
            SortOrder::Descending => write!(f, "{} desc", self.name),
        }
    }
}
