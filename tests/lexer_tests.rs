// tests/lexer_tests.rs

use sqlmold::ast::Token;
use sqlmold::lexer::{LexError, Lexer};

fn tokens(input: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(input);
    let mut result = Vec::new();
    loop {
        let token = lexer.next_token().unwrap();
        if token == Token::Eof {
            break;
        }
        result.push(token);
    }
    result
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn test_comparison_operators() {
    assert_eq!(
        tokens("== != < <= > >="),
        vec![
            Token::EqEq,
            Token::NotEq,
            Token::Lt,
            Token::LtEq,
            Token::Gt,
            Token::GtEq,
        ]
    );
}

#[test]
fn test_logical_and_eager_operators() {
    assert_eq!(
        tokens("&& || & | !"),
        vec![
            Token::AndAnd,
            Token::OrOr,
            Token::Ampersand,
            Token::Pipe,
            Token::Bang,
        ]
    );
}

#[test]
fn test_arithmetic_operators() {
    assert_eq!(
        tokens("+ - * / % ^"),
        vec![
            Token::Plus,
            Token::Minus,
            Token::Star,
            Token::Slash,
            Token::Percent,
            Token::Caret,
        ]
    );
}

#[test]
fn test_word_operators_are_rewritten() {
    assert_eq!(
        tokens("a and b or not c"),
        vec![
            Token::Identifier("a".to_string()),
            Token::AndAnd,
            Token::Identifier("b".to_string()),
            Token::OrOr,
            Token::Bang,
            Token::Identifier("c".to_string()),
        ]
    );
}

#[test]
fn test_word_operator_prefix_is_identifier() {
    assert_eq!(
        tokens("order android"),
        vec![
            Token::Identifier("order".to_string()),
            Token::Identifier("android".to_string()),
        ]
    );
}

#[test]
fn test_single_equals_is_error() {
    let mut lexer = Lexer::new("a = 1");
    lexer.next_token().unwrap();
    assert!(matches!(lexer.next_token(), Err(LexError::SingleEquals(_))));
}

// ============================================================================
// Literals
// ============================================================================

#[test]
fn test_numbers() {
    assert_eq!(
        tokens("42 3.5 1e3 2.5E-1"),
        vec![
            Token::Integer(42),
            Token::Float(3.5),
            Token::Float(1000.0),
            Token::Float(0.25),
        ]
    );
}

#[test]
fn test_integer_overflow_is_error() {
    let mut lexer = Lexer::new("99999999999999999999999");
    assert!(matches!(
        lexer.next_token(),
        Err(LexError::InvalidNumber { .. })
    ));
}

#[test]
fn test_strings() {
    assert_eq!(
        tokens(r#""double" 'single' `raw\n`"#),
        vec![
            Token::String("double".to_string()),
            Token::String("single".to_string()),
            Token::String("raw\\n".to_string()),
        ]
    );
}

#[test]
fn test_string_escapes() {
    assert_eq!(
        tokens(r#""a\tb\"c""#),
        vec![Token::String("a\tb\"c".to_string())]
    );
}

#[test]
fn test_unterminated_string() {
    let mut lexer = Lexer::new("\"open");
    assert!(matches!(
        lexer.next_token(),
        Err(LexError::UnterminatedString(_))
    ));
}

#[test]
fn test_invalid_escape() {
    let mut lexer = Lexer::new(r#""\q""#);
    assert!(matches!(
        lexer.next_token(),
        Err(LexError::InvalidEscape { ch: 'q', .. })
    ));
}

#[test]
fn test_nil_spellings() {
    assert_eq!(tokens("nil null"), vec![Token::Nil, Token::Nil]);
}

// ============================================================================
// Access and calls
// ============================================================================

#[test]
fn test_member_index_and_slice() {
    assert_eq!(
        tokens("user.ids[1:2]"),
        vec![
            Token::Identifier("user".to_string()),
            Token::Dot,
            Token::Identifier("ids".to_string()),
            Token::LBracket,
            Token::Integer(1),
            Token::Colon,
            Token::Integer(2),
            Token::RBracket,
        ]
    );
}

#[test]
fn test_call_arguments() {
    assert_eq!(
        tokens("substr(name, 0, 3)"),
        vec![
            Token::Identifier("substr".to_string()),
            Token::LParen,
            Token::Identifier("name".to_string()),
            Token::Comma,
            Token::Integer(0),
            Token::Comma,
            Token::Integer(3),
            Token::RParen,
        ]
    );
}

#[test]
fn test_unexpected_character_position() {
    let mut lexer = Lexer::new("a # b");
    lexer.next_token().unwrap();
    match lexer.next_token() {
        Err(LexError::UnexpectedChar { ch, position }) => {
            assert_eq!(ch, '#');
            assert_eq!(position.offset, 2);
        }
        other => panic!("expected unexpected-char error, got {:?}", other),
    }
}
