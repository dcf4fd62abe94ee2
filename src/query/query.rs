use crate::common::Sort;
use crate::criteria::CriteriaCondition;

/// An immutable select query over one logical entity.
///
/// Produced by a [crate::query::SelectQueryBuilder] or the text parser;
/// consumed by a [crate::manager::DatabaseManager]. Column and sort names are
/// physical element names, already resolved through metadata. A `limit` of
/// zero means unbounded.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelectQuery {
    name: String,
    columns: Vec<String>,
    condition: Option<CriteriaCondition>,
    sorts: Vec<Sort>,
    skip: u64,
    limit: u64,
}

impl SelectQuery {
    /// Creates a select query from its resolved parts.
    pub fn new(
        name: &str,
        columns: Vec<String>,
        condition: Option<CriteriaCondition>,
        sorts: Vec<Sort>,
        skip: u64,
        limit: u64,
    ) -> Self {
        SelectQuery {
            name: name.to_string(),
            columns,
            condition,
            sorts,
            skip,
            limit,
        }
    }

    /// Returns the logical entity name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the projected columns; empty means every column.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the filter condition, if any.
    pub fn condition(&self) -> Option<&CriteriaCondition> {
        self.condition.as_ref()
    }

    /// Returns the sort keys in priority order.
    pub fn sorts(&self) -> &[Sort] {
        &self.sorts
    }

    /// Returns the number of leading rows to skip.
    pub fn skip(&self) -> u64 {
        self.skip
    }

    /// Returns the maximum number of rows to return; zero means unbounded.
    pub fn limit(&self) -> u64 {
        self.limit
    }
}

/// An immutable delete query over one logical entity.
///
/// With columns set, only the named elements are removed from matching
/// entities; otherwise whole entities are deleted. No condition means every
/// entity matches.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeleteQuery {
    name: String,
    columns: Vec<String>,
    condition: Option<CriteriaCondition>,
}

impl DeleteQuery {
    /// Creates a delete query from its resolved parts.
    pub fn new(name: &str, columns: Vec<String>, condition: Option<CriteriaCondition>) -> Self {
        DeleteQuery {
            name: name.to_string(),
            columns,
            condition,
        }
    }

    /// Returns the logical entity name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the elements to remove; empty means the whole entity.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns the filter condition, if any.
    pub fn condition(&self) -> Option<&CriteriaCondition> {
        self.condition.as_ref()
    }
}
