use crate::ast::ComparisonOperator;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Dot-path naming the compared field
    ///
    /// # Examples
    /// ```text
    /// StringProperty
    /// Doc.geocode
    /// tags.0
    /// ```
    Selector(String),

    /// Comparison operator
    ///
    /// # Examples
    /// ```text
    /// ==
    /// !=
    /// =ge=
    /// =matches=
    /// ```
    Operator(ComparisonOperator),

    /// Unquoted argument
    ///
    /// Runs until `;`, `,`, `)` or whitespace. Parentheses inside the token
    /// must balance, so `^(LC|LE).*` can be written without quotes.
    ///
    /// # Examples
    /// ```text
    /// kevin
    /// 5.5
    /// 2014-05-30T13:45:10Z
    /// ```
    Argument(String),

    /// Quoted argument, single or double quotes, escapes already decoded
    ///
    /// # Examples
    /// ```text
    /// 'Severe weather'
    /// "valueName==UGC;value==X"
    /// ```
    Quoted(String),

    // Grouping and combinators
    /// `(` - opens a group, or an argument list after `=in=` / `=out=` / `=all=`
    LParen,

    /// `)`
    RParen,

    /// `;` - logical AND
    Semicolon,

    /// `,` - logical OR, or the separator inside an argument list
    Comma,

    /// End of input
    Eof,
}

impl Token {
    /// Short description used in parse errors.
    pub fn describe(&self) -> String {
        match self {
            Token::Selector(s) => format!("selector '{s}'"),
            Token::Operator(op) => format!("operator '{op}'"),
            Token::Argument(s) => format!("argument '{s}'"),
            Token::Quoted(s) => format!("quoted argument '{s}'"),
            Token::LParen => "'('".to_string(),
            Token::RParen => "')'".to_string(),
            Token::Semicolon => "';'".to_string(),
            Token::Comma => "','".to_string(),
            Token::Eof => "end of input".to_string(),
        }
    }
}
