use crate::errors::{EntimapError, EntimapResult, ErrorKind};

/// One lexical token of the text query language.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    /// A bare word: keyword, entity name or field name.
    Ident(String),
    /// A numeric literal, kept raw until the parser knows its type.
    Number(String),
    /// A single- or double-quoted string literal, quotes stripped.
    QuotedString(String),
    /// A named parameter placeholder, `@` stripped.
    Parameter(String),
    /// A structural symbol: `(`, `)`, `,` or `*`.
    Symbol(char),
    /// A comparison operator: `=`, `>`, `>=`, `<` or `<=`.
    Operator(String),
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_ident_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '.'
}

/// Splits a query text into tokens.
///
/// # Errors
///
/// * `MalformedQuery` - an unterminated string literal, a dangling `@`, or a
///   character outside the language
pub(crate) fn tokenize(input: &str) -> EntimapResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if is_ident_start(c) {
            let mut word = String::new();
            while let Some(&c) = chars.peek() {
                if is_ident_part(c) {
                    word.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Ident(word));
            continue;
        }

        if c.is_ascii_digit() || c == '-' {
            let mut number = String::new();
            number.push(c);
            chars.next();
            while let Some(&c) = chars.peek() {
                if c.is_ascii_digit() || c == '.' {
                    number.push(c);
                    chars.next();
                } else {
                    break;
                }
            }
            tokens.push(Token::Number(number));
            continue;
        }

        match c {
            '\'' | '"' => {
                let quote = c;
                chars.next();
                let mut literal = String::new();
                let mut terminated = false;
                for c in chars.by_ref() {
                    if c == quote {
                        terminated = true;
                        break;
                    }
                    literal.push(c);
                }
                if !terminated {
                    log::error!("Unterminated string literal in query");
                    return Err(EntimapError::new(
                        "Unterminated string literal in query",
                        ErrorKind::MalformedQuery,
                    ));
                }
                tokens.push(Token::QuotedString(literal));
            }
            '@' => {
                chars.next();
                let mut name = String::new();
                while let Some(&c) = chars.peek() {
                    if is_ident_part(c) {
                        name.push(c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if name.is_empty() {
                    log::error!("Dangling parameter marker in query");
                    return Err(EntimapError::new(
                        "Dangling parameter marker in query",
                        ErrorKind::MalformedQuery,
                    ));
                }
                tokens.push(Token::Parameter(name));
            }
            '(' | ')' | ',' | '*' => {
                chars.next();
                tokens.push(Token::Symbol(c));
            }
            '=' => {
                chars.next();
                tokens.push(Token::Operator("=".to_string()));
            }
            '>' | '<' => {
                chars.next();
                let mut operator = c.to_string();
                if chars.peek() == Some(&'=') {
                    chars.next();
                    operator.push('=');
                }
                tokens.push(Token::Operator(operator));
            }
            other => {
                log::error!("Unexpected character {:?} in query", other);
                return Err(EntimapError::new(
                    &format!("Unexpected character {:?} in query", other),
                    ErrorKind::MalformedQuery,
                ));
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_select() {
        let tokens = tokenize("select * from people where age >= 18").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("select".to_string()),
                Token::Symbol('*'),
                Token::Ident("from".to_string()),
                Token::Ident("people".to_string()),
                Token::Ident("where".to_string()),
                Token::Ident("age".to_string()),
                Token::Operator(">=".to_string()),
                Token::Number("18".to_string()),
            ]
        );
    }

    #[test]
    fn test_tokenize_strings_and_parameters() {
        let tokens = tokenize("name = 'Ada' or city = @city").unwrap();
        assert_eq!(tokens[2], Token::QuotedString("Ada".to_string()));
        assert_eq!(tokens[6], Token::Parameter("city".to_string()));
    }

    #[test]
    fn test_tokenize_negative_and_decimal_numbers() {
        let tokens = tokenize("-3 1.5").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Number("-3".to_string()),
                Token::Number("1.5".to_string()),
            ]
        );
    }

    #[test]
    fn test_unterminated_string() {
        let result = tokenize("name = 'Ada");
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::MalformedQuery);
    }

    #[test]
    fn test_dangling_parameter_marker() {
        let result = tokenize("name = @ ");
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::MalformedQuery);
    }

    #[test]
    fn test_unexpected_character() {
        let result = tokenize("name ! 'Ada'");
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::MalformedQuery);
    }
}
