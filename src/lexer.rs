use std::fmt;

use thiserror::Error;

use crate::ast::{ComparisonOperator, Token};

/// Longest excerpt of the input quoted in error messages.
const FRAGMENT_LEN: usize = 24;

/// Character offset into the FIQL input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub offset: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offset {}", self.offset)
    }
}

/// Error produced while splitting FIQL text into tokens.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message} at {position} near '{fragment}'")]
pub struct LexError {
    pub message: String,
    pub position: Position,
    pub fragment: String,
}

/// What the lexer expects next.
///
/// FIQL arguments may contain characters that are structural elsewhere
/// (`.`, `-`, `:`, `=`), so arguments are read in their own mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Selectors, operators, grouping and combinators
    Selector,
    /// The argument right after an operator
    Argument,
    /// Inside `(v1,v2,...)` after an operator
    List,
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    token_start: usize,
    mode: Mode,
    /// The pending argument is a regex, so a leading `(` opens a group
    pattern_argument: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        Lexer {
            input: input.chars().collect(),
            position: 0,
            token_start: 0,
            mode: Mode::Selector,
            pattern_argument: false,
        }
    }

    /// Start of the most recently returned token.
    pub fn token_start(&self) -> Position {
        Position {
            offset: self.token_start,
        }
    }

    /// Up to a couple dozen characters of input starting at `position`.
    pub fn fragment(&self, position: Position) -> String {
        self.input
            .iter()
            .skip(position.offset)
            .take(FRAGMENT_LEN)
            .collect()
    }

    fn error(&self, message: impl Into<String>, at: usize) -> LexError {
        let position = Position { offset: at };
        LexError {
            message: message.into(),
            fragment: self.fragment(position),
            position,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_char(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn is_selector_char(ch: char) -> bool {
        !(ch.is_whitespace() || matches!(ch, '=' | '!' | ';' | ',' | '(' | ')' | '\'' | '"'))
    }

    fn read_selector(&mut self) -> String {
        let mut result = String::new();
        while let Some(ch) = self.current_char() {
            if Self::is_selector_char(ch) {
                result.push(ch);
                self.advance();
            } else {
                break;
            }
        }
        result
    }

    fn read_operator(&mut self) -> Result<ComparisonOperator, LexError> {
        let start = self.position;

        match (self.current_char(), self.peek_char(1)) {
            (Some('='), Some('=')) => {
                self.advance();
                self.advance();
                return Ok(ComparisonOperator::Equal);
            }
            (Some('!'), Some('=')) => {
                self.advance();
                self.advance();
                return Ok(ComparisonOperator::NotEqual);
            }
            (Some('!'), _) => return Err(self.error("expected '!='", start)),
            _ => {}
        }

        self.advance(); // Consume opening '='
        let mut name = String::new();
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_alphabetic() {
                name.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if self.current_char() != Some('=') {
            return Err(self.error("unterminated operator", start));
        }
        self.advance(); // Consume closing '='

        ComparisonOperator::from_name(&name)
            .ok_or_else(|| self.error(format!("unknown operator '={name}='"), start))
    }

    fn read_string(&mut self, quote: char) -> Result<String, LexError> {
        let start = self.position;
        let mut result = String::new();
        self.advance(); // Consume opening quote

        while let Some(ch) = self.current_char() {
            match ch {
                c if c == quote => {
                    self.advance();
                    return Ok(result);
                }
                '\\' => {
                    self.advance(); // Consume backslash
                    match self.current_char() {
                        Some('n') => result.push('\n'),
                        Some('t') => result.push('\t'),
                        Some('r') => result.push('\r'),
                        Some(c @ ('"' | '\'' | '\\')) => result.push(c),
                        // Regex escapes such as \d pass through untouched
                        Some(c) => {
                            result.push('\\');
                            result.push(c);
                        }
                        None => break,
                    }
                    self.advance();
                }
                _ => {
                    result.push(ch);
                    self.advance();
                }
            }
        }

        Err(self.error("unterminated string", start))
    }

    /// Unquoted argument. Parentheses must balance; separators inside them
    /// belong to the argument.
    fn read_bare(&mut self) -> Result<String, LexError> {
        let start = self.position;
        let mut result = String::new();
        let mut depth = 0usize;

        while let Some(ch) = self.current_char() {
            if depth == 0 && (ch.is_whitespace() || matches!(ch, ';' | ',' | ')')) {
                break;
            }
            match ch {
                '(' => depth += 1,
                ')' => depth -= 1,
                _ => {}
            }
            result.push(ch);
            self.advance();
        }

        if depth > 0 {
            return Err(self.error("unbalanced '(' in argument", start));
        }
        Ok(result)
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    pub fn next_token(&mut self) -> Result<Token, LexError> {
        self.skip_whitespace();
        self.token_start = self.position;

        match self.mode {
            Mode::Selector => self.selector_token(),
            Mode::Argument => self.argument_token(),
            Mode::List => self.list_token(),
        }
    }

    fn selector_token(&mut self) -> Result<Token, LexError> {
        match self.current_char() {
            None => Ok(Token::Eof),
            Some('(') => Ok(self.single(Token::LParen)),
            Some(')') => Ok(self.single(Token::RParen)),
            Some(';') => Ok(self.single(Token::Semicolon)),
            Some(',') => Ok(self.single(Token::Comma)),
            Some('=' | '!') => {
                let op = self.read_operator()?;
                self.mode = Mode::Argument;
                self.pattern_argument = op == ComparisonOperator::Like;
                Ok(Token::Operator(op))
            }
            Some(ch @ ('\'' | '"')) => Err(self.error(
                format!("unexpected {ch} where a selector was expected"),
                self.position,
            )),
            Some(_) => Ok(Token::Selector(self.read_selector())),
        }
    }

    fn argument_token(&mut self) -> Result<Token, LexError> {
        match self.current_char() {
            Some('(') if !self.pattern_argument => {
                self.mode = Mode::List;
                Ok(self.single(Token::LParen))
            }
            Some(quote @ ('\'' | '"')) => {
                self.mode = Mode::Selector;
                Ok(Token::Quoted(self.read_string(quote)?))
            }
            // Missing argument: hand the separator to the parser to report
            None | Some(';' | ',' | ')') => {
                self.mode = Mode::Selector;
                self.selector_token()
            }
            Some(_) => {
                self.mode = Mode::Selector;
                Ok(Token::Argument(self.read_bare()?))
            }
        }
    }

    fn list_token(&mut self) -> Result<Token, LexError> {
        match self.current_char() {
            None => Ok(Token::Eof),
            Some(',') => Ok(self.single(Token::Comma)),
            Some(')') => {
                self.mode = Mode::Selector;
                Ok(self.single(Token::RParen))
            }
            Some(quote @ ('\'' | '"')) => Ok(Token::Quoted(self.read_string(quote)?)),
            Some(_) => Ok(Token::Argument(self.read_bare()?)),
        }
    }

    /// Lex the whole input.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            if token == Token::Eof {
                break;
            }
            tokens.push(token);
        }
        Ok(tokens)
    }
}

#[test]
fn test_operators() {
    let mut lexer = Lexer::new("a==1;b!=2;c=ge=3");
    assert_eq!(lexer.next_token().unwrap(), Token::Selector("a".into()));
    assert_eq!(lexer.next_token().unwrap(), Token::Operator(ComparisonOperator::Equal));
    assert_eq!(lexer.next_token().unwrap(), Token::Argument("1".into()));
    assert_eq!(lexer.next_token().unwrap(), Token::Semicolon);
    assert_eq!(lexer.next_token().unwrap(), Token::Selector("b".into()));
    assert_eq!(lexer.next_token().unwrap(), Token::Operator(ComparisonOperator::NotEqual));
    assert_eq!(lexer.next_token().unwrap(), Token::Argument("2".into()));
    assert_eq!(lexer.next_token().unwrap(), Token::Semicolon);
    assert_eq!(lexer.next_token().unwrap(), Token::Selector("c".into()));
    assert_eq!(lexer.next_token().unwrap(), Token::Operator(ComparisonOperator::GreaterEqual));
    assert_eq!(lexer.next_token().unwrap(), Token::Argument("3".into()));
    assert_eq!(lexer.next_token().unwrap(), Token::Eof);
}

#[test]
fn test_argument_list() {
    let mut lexer = Lexer::new("tags=in=(a,'b c',d)");
    assert_eq!(
        lexer.tokenize().unwrap(),
        vec![
            Token::Selector("tags".into()),
            Token::Operator(ComparisonOperator::In),
            Token::LParen,
            Token::Argument("a".into()),
            Token::Comma,
            Token::Quoted("b c".into()),
            Token::Comma,
            Token::Argument("d".into()),
            Token::RParen,
        ]
    );
}
