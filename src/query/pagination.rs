use crate::common::{SortOrder, Value};
use crate::criteria::{self, CriteriaCondition};
use crate::entity::CommunicationEntity;
use crate::errors::{EntimapError, EntimapResult, ErrorKind};
use crate::query::query::SelectQuery;

/// An opaque cursor over one row's sort-key values.
///
/// A token is only meaningful against the query it was extracted from: it
/// carries one value per sort key, in sort priority order. Tokens travel
/// between page requests; clients never inspect them.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CursorToken {
    values: Vec<Value>,
}

impl CursorToken {
    pub(crate) fn new(values: Vec<Value>) -> Self {
        CursorToken { values }
    }

    pub(crate) fn values(&self) -> &[Value] {
        &self.values
    }
}

/// Extracts a cursor token from one result row of a query.
///
/// A row missing a sort-key element yields `Null` for that position.
///
/// # Errors
///
/// * `MissingSortKeyForCursor` - the query declares no sort keys; cursor
///   pagination needs a total order to seek against
pub fn token_from(query: &SelectQuery, row: &CommunicationEntity) -> EntimapResult<CursorToken> {
    if query.sorts().is_empty() {
        log::error!(
            "Query on {} declares no sort keys; cannot extract a cursor",
            query.name()
        );
        return Err(EntimapError::new(
            &format!(
                "Query on {} declares no sort keys; cannot extract a cursor",
                query.name()
            ),
            ErrorKind::MissingSortKeyForCursor,
        ));
    }
    let values = query
        .sorts()
        .iter()
        .map(|sort| row.value_of(sort.name()))
        .collect();
    Ok(CursorToken::new(values))
}

/// Rewrites a query to return the rows strictly after the cursor position.
///
/// The boundary expands the sort-key tuple lexicographically: with keys
/// `k1, k2` the seek condition is `k1 > v1 or (k1 = v1 and k2 > v2)`, where
/// `>` flips to `<` for descending keys. The boundary is `and`-combined with
/// the query's own condition, and `skip` resets to zero since the cursor
/// already positions the page.
pub fn seek_after(query: &SelectQuery, token: &CursorToken) -> EntimapResult<SelectQuery> {
    seek(query, token, false)
}

/// Rewrites a query to return the rows strictly before the cursor position,
/// for paging backwards. Comparison directions are mirrored relative to
/// [seek_after].
pub fn seek_before(query: &SelectQuery, token: &CursorToken) -> EntimapResult<SelectQuery> {
    seek(query, token, true)
}

fn seek(query: &SelectQuery, token: &CursorToken, backwards: bool) -> EntimapResult<SelectQuery> {
    if query.sorts().is_empty() {
        log::error!(
            "Query on {} declares no sort keys; cannot seek to a cursor",
            query.name()
        );
        return Err(EntimapError::new(
            &format!(
                "Query on {} declares no sort keys; cannot seek to a cursor",
                query.name()
            ),
            ErrorKind::MissingSortKeyForCursor,
        ));
    }
    if token.values().len() != query.sorts().len() {
        log::error!(
            "Cursor carries {} values but the query declares {} sort keys",
            token.values().len(),
            query.sorts().len()
        );
        return Err(EntimapError::new(
            &format!(
                "Cursor carries {} values but the query declares {} sort keys",
                token.values().len(),
                query.sorts().len()
            ),
            ErrorKind::ValidationError,
        ));
    }

    let boundary = boundary_condition(query, token, backwards);
    let condition = match query.condition() {
        Some(existing) => existing.clone().and(boundary),
        None => boundary,
    };

    Ok(SelectQuery::new(
        query.name(),
        query.columns().to_vec(),
        Some(condition),
        query.sorts().to_vec(),
        0,
        query.limit(),
    ))
}

/// Builds the lexicographic boundary over the sort-key tuple: one disjunct
/// per key, equality on every more significant key plus a strict comparison
/// on the key itself.
fn boundary_condition(
    query: &SelectQuery,
    token: &CursorToken,
    backwards: bool,
) -> CriteriaCondition {
    let mut disjuncts = Vec::with_capacity(query.sorts().len());
    for (position, sort) in query.sorts().iter().enumerate() {
        let forward = matches!(sort.order(), SortOrder::Ascending) != backwards;
        let comparison = if forward {
            criteria::gt(sort.name(), token.values()[position].clone())
        } else {
            criteria::lt(sort.name(), token.values()[position].clone())
        };

        let mut conjuncts: Vec<CriteriaCondition> = query.sorts()[..position]
            .iter()
            .zip(token.values())
            .map(|(prior, value)| criteria::eq(prior.name(), value.clone()))
            .collect();
        if conjuncts.is_empty() {
            disjuncts.push(comparison);
        } else {
            conjuncts.push(comparison);
            disjuncts.push(criteria::and(conjuncts));
        }
    }

    if disjuncts.len() == 1 {
        disjuncts.remove(0)
    } else {
        criteria::or(disjuncts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{Element, Sort};

    fn query_sorted(sorts: Vec<Sort>) -> SelectQuery {
        SelectQuery::new("people", vec![], None, sorts, 7, 10)
    }

    #[test]
    fn test_token_extraction() {
        let query = query_sorted(vec![Sort::asc("age"), Sort::asc("name")]);
        let row = CommunicationEntity::new(
            "people",
            vec![Element::new("name", "Ada"), Element::new("age", 36i32)],
        );

        let token = token_from(&query, &row).unwrap();
        assert_eq!(token.values(), &[Value::I32(36), Value::from("Ada")]);
    }

    #[test]
    fn test_token_missing_key_yields_null() {
        let query = query_sorted(vec![Sort::asc("age")]);
        let row = CommunicationEntity::new("people", vec![Element::new("name", "Ada")]);
        let token = token_from(&query, &row).unwrap();
        assert_eq!(token.values(), &[Value::Null]);
    }

    #[test]
    fn test_token_requires_sort_keys() {
        let query = query_sorted(vec![]);
        let row = CommunicationEntity::new("people", vec![]);
        let result = token_from(&query, &row);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().kind(),
            &ErrorKind::MissingSortKeyForCursor
        );
    }

    #[test]
    fn test_seek_single_key() {
        let query = query_sorted(vec![Sort::asc("age")]);
        let token = CursorToken::new(vec![Value::I32(36)]);

        let seeked = seek_after(&query, &token).unwrap();
        assert_eq!(seeked.condition(), Some(&criteria::gt("age", 36i32)));
        assert_eq!(seeked.skip(), 0);
        assert_eq!(seeked.limit(), 10);
    }

    #[test]
    fn test_seek_lexicographic_expansion() {
        let query = query_sorted(vec![Sort::asc("age"), Sort::desc("name")]);
        let token = CursorToken::new(vec![Value::I32(36), Value::from("Ada")]);

        let seeked = seek_after(&query, &token).unwrap();
        let expected = criteria::or(vec![
            criteria::gt("age", 36i32),
            criteria::and(vec![
                criteria::eq("age", 36i32),
                criteria::lt("name", "Ada"),
            ]),
        ]);
        assert_eq!(seeked.condition(), Some(&expected));
    }

    #[test]
    fn test_seek_before_mirrors_directions() {
        let query = query_sorted(vec![Sort::asc("age")]);
        let token = CursorToken::new(vec![Value::I32(36)]);

        let seeked = seek_before(&query, &token).unwrap();
        assert_eq!(seeked.condition(), Some(&criteria::lt("age", 36i32)));
    }

    #[test]
    fn test_seek_preserves_existing_condition() {
        let base = SelectQuery::new(
            "people",
            vec![],
            Some(criteria::eq("name", "Ada")),
            vec![Sort::asc("age")],
            0,
            0,
        );
        let token = CursorToken::new(vec![Value::I32(36)]);

        let seeked = seek_after(&base, &token).unwrap();
        let expected = criteria::eq("name", "Ada").and(criteria::gt("age", 36i32));
        assert_eq!(seeked.condition(), Some(&expected));
    }

    #[test]
    fn test_seek_token_arity_mismatch() {
        let query = query_sorted(vec![Sort::asc("age"), Sort::asc("name")]);
        let token = CursorToken::new(vec![Value::I32(36)]);

        let result = seek_after(&query, &token);
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::ValidationError);
    }
}
