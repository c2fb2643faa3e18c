use std::mem;

use thiserror::Error;

use crate::{
    ast::{Argument, Comparison, ComparisonOperator, Node, Token, node::parse_bool},
    lexer::{LexError, Lexer, Position},
    path::prefixed,
};

/// Default bound on group and `=matches=` nesting.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Default compiled-size bound for `=like=` patterns, in bytes.
pub const DEFAULT_REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Options shared by the parser and the criteria compilers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Path prefix applied to every top-level selector, e.g. `Doc`
    pub prefix: Option<String>,
    /// Maximum nesting of groups and `=matches=` sub-queries
    pub max_depth: usize,
    /// Compiled-size limit for `=like=` regular expressions
    pub regex_size_limit: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            prefix: None,
            max_depth: DEFAULT_MAX_DEPTH,
            regex_size_limit: DEFAULT_REGEX_SIZE_LIMIT,
        }
    }
}

impl CompileOptions {
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        CompileOptions {
            prefix: Some(prefix.into()),
            ..Self::default()
        }
    }
}

/// Errors produced while parsing FIQL text.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    /// A token that does not fit the grammar at this point
    #[error("expected {expected}, found {found} at {position} near '{fragment}'")]
    Unexpected {
        expected: String,
        found: String,
        position: Position,
        fragment: String,
    },

    /// Argument shape not accepted by the operator
    #[error("invalid argument for '{operator}': {reason} near '{fragment}'")]
    InvalidArgument {
        operator: ComparisonOperator,
        reason: String,
        fragment: String,
    },

    /// Malformed `=matches=` sub-query
    #[error("invalid =matches= sub-query '{fragment}': {source}")]
    NestedQuery {
        fragment: String,
        #[source]
        source: Box<ParseError>,
    },

    /// `=like=` argument that is not a usable regular expression
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("expression nesting exceeds {limit} levels")]
    TooDeep { limit: usize },
}

/// Recursive-descent FIQL parser.
///
/// ```text
/// expr       := and_expr (',' and_expr)*
/// and_expr   := primary (';' primary)*
/// primary    := '(' expr ')' | comparison
/// comparison := selector operator argument
/// argument   := bare | quoted | '(' literal (',' literal)* ')'
/// ```
pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    options: CompileOptions,
    depth: usize,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Result<Self, ParseError> {
        Self::with_options(lexer, CompileOptions::default())
    }

    pub fn with_options(mut lexer: Lexer, options: CompileOptions) -> Result<Self, ParseError> {
        let current_token = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current_token,
            options,
            depth: 0,
        })
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current_token = self.lexer.next_token()?;
        Ok(())
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current_token) == mem::discriminant(token)
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let position = self.lexer.token_start();
        ParseError::Unexpected {
            expected: expected.to_string(),
            found: self.current_token.describe(),
            position,
            fragment: self.lexer.fragment(position),
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if !self.check(&expected) {
            return Err(self.unexpected(&expected.describe()));
        }
        self.advance()
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > self.options.max_depth {
            return Err(ParseError::TooDeep {
                limit: self.options.max_depth,
            });
        }
        Ok(())
    }

    /// Parse a complete expression; trailing input is an error.
    pub fn parse(&mut self) -> Result<Node, ParseError> {
        let node = self.parse_expression()?;
        self.expect(Token::Eof)?;
        Ok(node)
    }

    pub fn parse_expression(&mut self) -> Result<Node, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Node, ParseError> {
        let mut children = vec![self.parse_and()?];

        while self.check(&Token::Comma) {
            self.advance()?;
            match self.parse_and()? {
                Node::Or(nested) => children.extend(nested),
                node => children.push(node),
            }
        }

        Ok(if children.len() == 1 {
            children.remove(0)
        } else {
            Node::Or(children)
        })
    }

    fn parse_and(&mut self) -> Result<Node, ParseError> {
        let mut node = self.parse_primary()?;

        while self.check(&Token::Semicolon) {
            self.advance()?;
            let right = self.parse_primary()?;
            node = node.and(right);
        }

        Ok(node)
    }

    fn parse_primary(&mut self) -> Result<Node, ParseError> {
        match mem::replace(&mut self.current_token, Token::Eof) {
            Token::LParen => {
                self.advance()?;
                self.enter()?;
                let node = self.parse_expression()?;
                self.expect(Token::RParen)?;
                self.depth -= 1;
                Ok(node)
            }
            Token::Selector(selector) => {
                self.advance()?;
                self.parse_comparison(selector)
            }
            token => {
                self.current_token = token;
                Err(self.unexpected("selector or '('"))
            }
        }
    }

    fn parse_comparison(&mut self, selector: String) -> Result<Node, ParseError> {
        let operator = match self.current_token {
            Token::Operator(op) => op,
            _ => return Err(self.unexpected("comparison operator")),
        };
        self.advance()?;

        let argument = self.parse_argument(operator)?;
        Ok(Node::Comparison(Comparison {
            path: prefixed(self.options.prefix.as_deref(), &selector),
            operator,
            argument,
        }))
    }

    fn parse_argument(&mut self, operator: ComparisonOperator) -> Result<Argument, ParseError> {
        let start = self.lexer.token_start();

        let raw = match mem::replace(&mut self.current_token, Token::Eof) {
            Token::Argument(text) | Token::Quoted(text) => {
                self.advance()?;
                Argument::Literal(text)
            }
            Token::LParen => {
                self.advance()?;
                Argument::List(self.parse_literal_list(operator)?)
            }
            token => {
                self.current_token = token;
                return Err(self.unexpected("argument"));
            }
        };

        let invalid = |reason: &str| ParseError::InvalidArgument {
            operator,
            reason: reason.to_string(),
            fragment: self.lexer.fragment(start),
        };

        match (operator, raw) {
            (op, Argument::Literal(text)) if op.takes_list() => Ok(Argument::List(vec![text])),
            (op, list @ Argument::List(_)) if op.takes_list() => Ok(list),
            (_, Argument::List(_)) => Err(invalid("expects a single value, not a list")),
            (ComparisonOperator::Exists, Argument::Literal(text)) => match parse_bool(&text) {
                Some(_) => Ok(Argument::Literal(text)),
                None => Err(invalid("expects true or false")),
            },
            (ComparisonOperator::Matches, Argument::Literal(text)) => {
                let nested = self.parse_nested(&text)?;
                Ok(Argument::Query(Box::new(nested)))
            }
            (_, literal) => Ok(literal),
        }
    }

    fn parse_literal_list(
        &mut self,
        operator: ComparisonOperator,
    ) -> Result<Vec<String>, ParseError> {
        let start = self.lexer.token_start();
        let mut items = Vec::new();

        if self.check(&Token::RParen) {
            return Err(ParseError::InvalidArgument {
                operator,
                reason: "empty list".to_string(),
                fragment: self.lexer.fragment(start),
            });
        }

        loop {
            match mem::replace(&mut self.current_token, Token::Eof) {
                Token::Argument(text) | Token::Quoted(text) => {
                    items.push(text);
                    self.advance()?;
                }
                token => {
                    self.current_token = token;
                    return Err(self.unexpected("list value"));
                }
            }

            if self.check(&Token::Comma) {
                self.advance()?;
            } else {
                self.expect(Token::RParen)?;
                return Ok(items);
            }
        }
    }

    /// `=matches=` sub-queries are relative to each list element, so the
    /// prefix does not apply to them.
    fn parse_nested(&self, text: &str) -> Result<Node, ParseError> {
        if self.depth + 1 > self.options.max_depth {
            return Err(ParseError::TooDeep {
                limit: self.options.max_depth,
            });
        }
        let options = CompileOptions {
            prefix: None,
            ..self.options.clone()
        };

        let nested = || -> Result<Node, ParseError> {
            let mut parser = Parser::with_options(Lexer::new(text), options)?;
            parser.depth = self.depth + 1;
            parser.parse()
        };

        nested().map_err(|source| ParseError::NestedQuery {
            fragment: text.to_string(),
            source: Box::new(source),
        })
    }
}

/// Parse FIQL text with default options.
pub fn parse_fiql(text: &str) -> Result<Node, ParseError> {
    parse_fiql_with(text, &CompileOptions::default())
}

pub fn parse_fiql_with(text: &str, options: &CompileOptions) -> Result<Node, ParseError> {
    Parser::with_options(Lexer::new(text), options.clone())?.parse()
}
