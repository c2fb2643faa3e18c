// tests/lexer_tests.rs

use catalog_core::ast::{ComparisonOperator, Token};
use catalog_core::lexer::Lexer;

fn tokens(input: &str) -> Vec<Token> {
    Lexer::new(input).tokenize().unwrap()
}

fn sel(name: &str) -> Token {
    Token::Selector(name.to_string())
}

fn arg(text: &str) -> Token {
    Token::Argument(text.to_string())
}

// ============================================================================
// Arguments
// ============================================================================

#[test]
fn test_quoted_escapes() {
    assert_eq!(
        tokens(r"name=='O\'Brien'"),
        vec![
            sel("name"),
            Token::Operator(ComparisonOperator::Equal),
            Token::Quoted("O'Brien".to_string()),
        ]
    );
}

#[test]
fn test_regex_escapes_pass_through() {
    assert_eq!(
        tokens(r"code=like='^\d+'")[2],
        Token::Quoted(r"^\d+".to_string())
    );
}

#[test]
fn test_double_quotes_hold_nested_filters() {
    assert_eq!(
        tokens(r#"geocode=matches="valueName==UGC;value=like='^LE'""#)[2],
        Token::Quoted("valueName==UGC;value=like='^LE'".to_string())
    );
}

#[test]
fn test_bare_argument_with_balanced_parens() {
    assert_eq!(
        tokens("code=like=^(LC|LE).*;x==1"),
        vec![
            sel("code"),
            Token::Operator(ComparisonOperator::Like),
            arg("^(LC|LE).*"),
            Token::Semicolon,
            sel("x"),
            Token::Operator(ComparisonOperator::Equal),
            arg("1"),
        ]
    );
}

#[test]
fn test_like_argument_may_open_with_group() {
    assert_eq!(
        tokens("code=like=(LC|LE).*;x=in=(a,b)"),
        vec![
            sel("code"),
            Token::Operator(ComparisonOperator::Like),
            arg("(LC|LE).*"),
            Token::Semicolon,
            sel("x"),
            Token::Operator(ComparisonOperator::In),
            Token::LParen,
            arg("a"),
            Token::Comma,
            arg("b"),
            Token::RParen,
        ]
    );
}

#[test]
fn test_date_argument() {
    assert_eq!(
        tokens("when=gt=2014-05-30T15:45:10+02:00")[2],
        arg("2014-05-30T15:45:10+02:00")
    );
}

#[test]
fn test_whitespace_between_tokens() {
    assert_eq!(
        tokens(" a == 1 ; b==2 "),
        vec![
            sel("a"),
            Token::Operator(ComparisonOperator::Equal),
            arg("1"),
            Token::Semicolon,
            sel("b"),
            Token::Operator(ComparisonOperator::Equal),
            arg("2"),
        ]
    );
}

#[test]
fn test_dotted_selector() {
    assert_eq!(tokens("Doc.geocode.0.value==x")[0], sel("Doc.geocode.0.value"));
}

#[test]
fn test_missing_argument_leaves_separator() {
    assert_eq!(
        tokens("a==;b==1")[..3],
        [sel("a"), Token::Operator(ComparisonOperator::Equal), Token::Semicolon]
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_unterminated_string() {
    let err = Lexer::new("a=='abc").tokenize().unwrap_err();
    assert_eq!(err.message, "unterminated string");
    assert_eq!(err.position.offset, 3);
    assert_eq!(err.fragment, "'abc");
}

#[test]
fn test_unknown_operator() {
    let err = Lexer::new("a=foo=1").tokenize().unwrap_err();
    assert!(err.message.contains("=foo="));
    assert_eq!(err.position.offset, 1);
}

#[test]
fn test_unbalanced_paren_in_argument() {
    let err = Lexer::new("a=like=^(abc").tokenize().unwrap_err();
    assert!(err.message.contains("unbalanced"));
}

#[test]
fn test_error_display_includes_fragment() {
    let err = Lexer::new("StringProperty=xx=kevin").tokenize().unwrap_err();
    assert!(err.to_string().contains("near '=xx=kevin'"));
}
