use crate::common::{Sort, Value};
use crate::criteria::{self, CriteriaCondition};
use crate::errors::{EntimapError, EntimapResult, ErrorKind};
use crate::metadata::{ConverterRegistry, EntityMetadata, MetadataRegistry};
use crate::query::{DeleteQuery, SelectQuery};
use crate::text::params::Params;
use crate::text::tokenizer::{tokenize, Token};

/// The outcome of parsing one query text.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedQuery {
    Select(SelectQuery),
    Delete(DeleteQuery),
}

impl ParsedQuery {
    /// Unwraps a select query.
    ///
    /// # Errors
    ///
    /// * `InvalidOperation` - the parsed text was a delete
    pub fn into_select(self) -> EntimapResult<SelectQuery> {
        match self {
            ParsedQuery::Select(query) => Ok(query),
            ParsedQuery::Delete(_) => {
                log::error!("Parsed query is a delete, not a select");
                Err(EntimapError::new(
                    "Parsed query is a delete, not a select",
                    ErrorKind::InvalidOperation,
                ))
            }
        }
    }

    /// Unwraps a delete query.
    ///
    /// # Errors
    ///
    /// * `InvalidOperation` - the parsed text was a select
    pub fn into_delete(self) -> EntimapResult<DeleteQuery> {
        match self {
            ParsedQuery::Delete(query) => Ok(query),
            ParsedQuery::Select(_) => {
                log::error!("Parsed query is a select, not a delete");
                Err(EntimapError::new(
                    "Parsed query is a select, not a delete",
                    ErrorKind::InvalidOperation,
                ))
            }
        }
    }
}

/// Sequential view over the token stream with keyword-aware helpers.
/// Keywords compare case-insensitively.
struct TokenCursor {
    tokens: Vec<Token>,
    position: usize,
}

impl TokenCursor {
    fn new(tokens: Vec<Token>) -> Self {
        TokenCursor {
            tokens,
            position: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn at_end(&self) -> bool {
        self.position >= self.tokens.len()
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(word)) if word.eq_ignore_ascii_case(keyword))
    }

    fn take_keyword(&mut self, keyword: &str) -> bool {
        if self.is_keyword(keyword) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> EntimapResult<()> {
        if self.take_keyword(keyword) {
            Ok(())
        } else {
            log::error!("Expected keyword {} at token {:?}", keyword, self.peek());
            Err(EntimapError::new(
                &format!("Expected keyword {}", keyword),
                ErrorKind::MalformedQuery,
            ))
        }
    }

    fn expect_ident(&mut self) -> EntimapResult<String> {
        match self.next() {
            Some(Token::Ident(word)) => Ok(word),
            other => {
                log::error!("Expected an identifier, found {:?}", other);
                Err(EntimapError::new(
                    "Expected an identifier",
                    ErrorKind::MalformedQuery,
                ))
            }
        }
    }

    fn take_symbol(&mut self, symbol: char) -> bool {
        if matches!(self.peek(), Some(Token::Symbol(c)) if *c == symbol) {
            self.position += 1;
            true
        } else {
            false
        }
    }

    fn expect_symbol(&mut self, symbol: char) -> EntimapResult<()> {
        if self.take_symbol(symbol) {
            Ok(())
        } else {
            log::error!("Expected {:?} at token {:?}", symbol, self.peek());
            Err(EntimapError::new(
                &format!("Expected {:?}", symbol),
                ErrorKind::MalformedQuery,
            ))
        }
    }
}

/// Condition-parsing context: the resolved entity metadata, the attribute
/// converters for literal translation, and the parameter table under
/// construction.
struct ConditionContext<'a> {
    metadata: &'a EntityMetadata,
    converters: &'a ConverterRegistry,
    params: &'a mut Params,
}

/// Recursive-descent parser for the text query language.
///
/// # Grammar
///
/// ```text
/// select_stmt := "select" ( "*" | field ("," field)* ) "from" entity
///                [ "where" or_expr ] [ "order" "by" sort ("," sort)* ]
///                [ "skip" number ] [ "limit" number ]
/// delete_stmt := "delete" [ field ("," field)* ] "from" entity
///                [ "where" or_expr ]
/// or_expr     := and_expr ( "or" and_expr )*
/// and_expr    := unary ( "and" unary )*
/// unary       := [ "not" ] primary
/// primary     := "(" or_expr ")" | comparison
/// comparison  := field ( op value | "like" value
///                | "between" value "and" value
///                | "in" "(" value ("," value)* ")" )
/// value       := number | string | "true" | "false" | "@" name
/// ```
///
/// Field names resolve through entity metadata to physical element names;
/// literal values run through the field's attribute converter, and parameter
/// placeholders remember that converter for bind time. Queries on subtypes
/// come out scoped by their discriminator.
#[derive(Default)]
pub struct QueryParser;

impl QueryParser {
    /// Creates a parser.
    pub fn new() -> Self {
        QueryParser
    }

    /// Parses a query for direct execution.
    ///
    /// # Errors
    ///
    /// * `MalformedQuery` - the text violates the grammar
    /// * `UnsupportedCommand` - the text is an insert, update or unknown
    ///   command
    /// * `EntityNotFound` - the entity name resolves to no registered
    ///   metadata
    /// * `UnboundParameters` - the text declares parameters; use a prepared
    ///   statement instead
    pub fn parse(
        &self,
        text: &str,
        metadata: &MetadataRegistry,
        converters: &ConverterRegistry,
    ) -> EntimapResult<ParsedQuery> {
        let (query, params) = self.parse_with_params(text, metadata, converters)?;
        if !params.is_empty() {
            log::error!(
                "Query declares parameters ({}) and cannot run directly",
                params.unbound_list()
            );
            return Err(EntimapError::new(
                &format!(
                    "Query declares parameters ({}) and cannot run directly; prepare it instead",
                    params.unbound_list()
                ),
                ErrorKind::UnboundParameters,
            ));
        }
        Ok(query)
    }

    pub(crate) fn parse_with_params(
        &self,
        text: &str,
        metadata: &MetadataRegistry,
        converters: &ConverterRegistry,
    ) -> EntimapResult<(ParsedQuery, Params)> {
        let trimmed = text.trim();
        if trimmed.len() < 6 {
            log::error!("Query text {:?} is too short", trimmed);
            return Err(EntimapError::new(
                &format!("Query text {:?} is too short", trimmed),
                ErrorKind::MalformedQuery,
            ));
        }

        let mut cursor = TokenCursor::new(tokenize(trimmed)?);
        let command = cursor.expect_ident()?;
        let mut params = Params::new();

        let query = match command.to_ascii_lowercase().as_str() {
            "select" => {
                ParsedQuery::Select(self.parse_select(&mut cursor, metadata, converters, &mut params)?)
            }
            "delete" => {
                ParsedQuery::Delete(self.parse_delete(&mut cursor, metadata, converters, &mut params)?)
            }
            other => {
                log::error!("Command {} is not supported", other);
                return Err(EntimapError::new(
                    &format!("Command {} is not supported; only select and delete are", other),
                    ErrorKind::UnsupportedCommand,
                ));
            }
        };

        if !cursor.at_end() {
            log::error!("Unexpected trailing input at {:?}", cursor.peek());
            return Err(EntimapError::new(
                "Unexpected trailing input after the query",
                ErrorKind::MalformedQuery,
            ));
        }

        Ok((query, params))
    }

    fn parse_select(
        &self,
        cursor: &mut TokenCursor,
        registry: &MetadataRegistry,
        converters: &ConverterRegistry,
        params: &mut Params,
    ) -> EntimapResult<SelectQuery> {
        let mut raw_columns = Vec::new();
        if cursor.take_symbol('*') {
            // empty projection means every column
        } else if !cursor.is_keyword("from") {
            loop {
                raw_columns.push(cursor.expect_ident()?);
                if !cursor.take_symbol(',') {
                    break;
                }
            }
        }

        cursor.expect_keyword("from")?;
        let entity = cursor.expect_ident()?;
        let metadata = registry.find_by_name(&entity)?;

        let columns = raw_columns
            .iter()
            .map(|name| metadata.column_name(name))
            .collect();

        let condition = self.parse_where(cursor, &metadata, converters, params)?;

        let mut sorts = Vec::new();
        if cursor.take_keyword("order") {
            cursor.expect_keyword("by")?;
            loop {
                let field = cursor.expect_ident()?;
                let physical = metadata.column_name(&field);
                let sort = if cursor.take_keyword("desc") {
                    Sort::desc(&physical)
                } else {
                    cursor.take_keyword("asc");
                    Sort::asc(&physical)
                };
                sorts.push(sort);
                if !cursor.take_symbol(',') {
                    break;
                }
            }
        }

        let skip = if cursor.take_keyword("skip") {
            self.parse_unsigned(cursor)?
        } else {
            0
        };
        let limit = if cursor.take_keyword("limit") {
            self.parse_unsigned(cursor)?
        } else {
            0
        };

        Ok(SelectQuery::new(
            metadata.name(),
            columns,
            condition,
            sorts,
            skip,
            limit,
        ))
    }

    fn parse_delete(
        &self,
        cursor: &mut TokenCursor,
        registry: &MetadataRegistry,
        converters: &ConverterRegistry,
        params: &mut Params,
    ) -> EntimapResult<DeleteQuery> {
        let mut raw_columns = Vec::new();
        if !cursor.is_keyword("from") {
            loop {
                raw_columns.push(cursor.expect_ident()?);
                if !cursor.take_symbol(',') {
                    break;
                }
            }
        }

        cursor.expect_keyword("from")?;
        let entity = cursor.expect_ident()?;
        let metadata = registry.find_by_name(&entity)?;

        let columns = raw_columns
            .iter()
            .map(|name| metadata.column_name(name))
            .collect();

        let condition = self.parse_where(cursor, &metadata, converters, params)?;

        Ok(DeleteQuery::new(metadata.name(), columns, condition))
    }

    /// Parses the optional where clause and scopes subtypes by their
    /// discriminator.
    fn parse_where(
        &self,
        cursor: &mut TokenCursor,
        metadata: &EntityMetadata,
        converters: &ConverterRegistry,
        params: &mut Params,
    ) -> EntimapResult<Option<CriteriaCondition>> {
        let mut condition = if cursor.take_keyword("where") {
            let mut context = ConditionContext {
                metadata,
                converters,
                params,
            };
            Some(self.parse_or(cursor, &mut context)?)
        } else {
            None
        };

        if let Some(inheritance) = metadata.inheritance() {
            let discriminator = criteria::eq(
                inheritance.discriminator_column(),
                inheritance.discriminator_value(),
            );
            condition = Some(match condition {
                Some(parsed) => discriminator.and(parsed),
                None => discriminator,
            });
        }

        Ok(condition)
    }

    fn parse_or(
        &self,
        cursor: &mut TokenCursor,
        context: &mut ConditionContext<'_>,
    ) -> EntimapResult<CriteriaCondition> {
        let mut condition = self.parse_and(cursor, context)?;
        while cursor.take_keyword("or") {
            let right = self.parse_and(cursor, context)?;
            condition = condition.or(right);
        }
        Ok(condition)
    }

    fn parse_and(
        &self,
        cursor: &mut TokenCursor,
        context: &mut ConditionContext<'_>,
    ) -> EntimapResult<CriteriaCondition> {
        let mut condition = self.parse_unary(cursor, context)?;
        while cursor.take_keyword("and") {
            let right = self.parse_unary(cursor, context)?;
            condition = condition.and(right);
        }
        Ok(condition)
    }

    fn parse_unary(
        &self,
        cursor: &mut TokenCursor,
        context: &mut ConditionContext<'_>,
    ) -> EntimapResult<CriteriaCondition> {
        if cursor.take_keyword("not") {
            return Ok(self.parse_primary(cursor, context)?.negate());
        }
        self.parse_primary(cursor, context)
    }

    fn parse_primary(
        &self,
        cursor: &mut TokenCursor,
        context: &mut ConditionContext<'_>,
    ) -> EntimapResult<CriteriaCondition> {
        if cursor.take_symbol('(') {
            let condition = self.parse_or(cursor, context)?;
            cursor.expect_symbol(')')?;
            return Ok(condition);
        }
        self.parse_comparison(cursor, context)
    }

    fn parse_comparison(
        &self,
        cursor: &mut TokenCursor,
        context: &mut ConditionContext<'_>,
    ) -> EntimapResult<CriteriaCondition> {
        let field = cursor.expect_ident()?;
        let physical = context.metadata.column_name(&field);

        match cursor.next() {
            Some(Token::Operator(op)) => {
                let value = self.parse_value(cursor, &field, context)?;
                Ok(match op.as_str() {
                    "=" => criteria::eq(&physical, value),
                    ">" => criteria::gt(&physical, value),
                    ">=" => criteria::gte(&physical, value),
                    "<" => criteria::lt(&physical, value),
                    "<=" => criteria::lte(&physical, value),
                    other => {
                        log::error!("Unknown operator {}", other);
                        return Err(EntimapError::new(
                            &format!("Unknown operator {}", other),
                            ErrorKind::MalformedQuery,
                        ));
                    }
                })
            }
            Some(Token::Ident(word)) if word.eq_ignore_ascii_case("like") => {
                let value = self.parse_value(cursor, &field, context)?;
                Ok(criteria::like(&physical, value))
            }
            Some(Token::Ident(word)) if word.eq_ignore_ascii_case("between") => {
                let lower = self.parse_value(cursor, &field, context)?;
                cursor.expect_keyword("and")?;
                let upper = self.parse_value(cursor, &field, context)?;
                Ok(criteria::between(&physical, lower, upper))
            }
            Some(Token::Ident(word)) if word.eq_ignore_ascii_case("in") => {
                cursor.expect_symbol('(')?;
                let mut values = Vec::new();
                loop {
                    values.push(self.parse_value(cursor, &field, context)?);
                    if !cursor.take_symbol(',') {
                        break;
                    }
                }
                cursor.expect_symbol(')')?;
                Ok(criteria::in_values(&physical, values))
            }
            other => {
                log::error!("Expected a comparison after {}, found {:?}", field, other);
                Err(EntimapError::new(
                    &format!("Expected a comparison after {}", field),
                    ErrorKind::MalformedQuery,
                ))
            }
        }
    }

    /// Parses one literal or parameter. Literals run through the field's
    /// attribute converter right away; parameters only record it, for bind
    /// time.
    fn parse_value(
        &self,
        cursor: &mut TokenCursor,
        field: &str,
        context: &mut ConditionContext<'_>,
    ) -> EntimapResult<Value> {
        let converter = context
            .metadata
            .field(field)
            .and_then(|f| f.converter())
            .map(|id| id.to_string());

        let literal = match cursor.next() {
            Some(Token::Number(raw)) => {
                if raw.contains('.') {
                    Value::F64(raw.parse::<f64>()?)
                } else {
                    Value::I64(raw.parse::<i64>()?)
                }
            }
            Some(Token::QuotedString(text)) => Value::String(text),
            Some(Token::Ident(word)) if word.eq_ignore_ascii_case("true") => Value::Bool(true),
            Some(Token::Ident(word)) if word.eq_ignore_ascii_case("false") => Value::Bool(false),
            Some(Token::Ident(word)) if word.eq_ignore_ascii_case("null") => {
                log::error!("Predicate on field {} compares against null", field);
                return Err(EntimapError::new(
                    &format!("Predicate on field {} compares against null", field),
                    ErrorKind::ValidationError,
                ));
            }
            Some(Token::Parameter(name)) => {
                context.params.declare(&name, converter);
                return Ok(Value::Parameter(name));
            }
            other => {
                log::error!("Expected a literal value, found {:?}", other);
                return Err(EntimapError::new(
                    "Expected a literal value",
                    ErrorKind::MalformedQuery,
                ));
            }
        };

        match converter {
            Some(id) => context.converters.get(&id)?.to_storage(literal),
            None => Ok(literal),
        }
    }

    fn parse_unsigned(&self, cursor: &mut TokenCursor) -> EntimapResult<u64> {
        match cursor.next() {
            Some(Token::Number(raw)) => Ok(raw.parse::<u64>()?),
            other => {
                log::error!("Expected a number, found {:?}", other);
                Err(EntimapError::new(
                    "Expected a number",
                    ErrorKind::MalformedQuery,
                ))
            }
        }
    }
}
