// tests/parser_tests.rs

use sqlmold::ast::{BinOp, Expr, Literal, UnaryOp};
use sqlmold::parser::{ParseError, parse_expression};

fn parse(input: &str) -> Expr {
    parse_expression(input).unwrap()
}

fn ident(name: &str) -> Expr {
    Expr::Identifier(name.to_string())
}

fn int(n: i64) -> Expr {
    Expr::Literal(Literal::Int(n))
}

// ============================================================================
// Precedence
// ============================================================================

#[test]
fn test_parentheses() {
    let expr = parse("(1 + 2) * 3");

    // Should be: Multiply(Add(1, 2), 3)
    match expr {
        Expr::Binary {
            op: BinOp::Multiply,
            left,
            right,
        } => {
            assert!(matches!(*left, Expr::Binary { op: BinOp::Add, .. }));
            assert_eq!(*right, int(3));
        }
        _ => panic!("Expected multiplication"),
    }
}

#[test]
fn test_arithmetic() {
    let expr = parse("1 + 2 * 3");

    // Should be: Add(1, Multiply(2, 3))
    match expr {
        Expr::Binary {
            op: BinOp::Add,
            left,
            right,
        } => {
            assert_eq!(*left, int(1));
            assert!(matches!(*right, Expr::Binary { op: BinOp::Multiply, .. }));
        }
        _ => panic!("Expected addition"),
    }
}

#[test]
fn test_and_binds_tighter_than_or() {
    let expr = parse("a || b && c");
    match expr {
        Expr::Binary {
            op: BinOp::Or,
            left,
            right,
        } => {
            assert_eq!(*left, ident("a"));
            assert!(matches!(*right, Expr::Binary { op: BinOp::And, .. }));
        }
        _ => panic!("Expected or"),
    }
}

#[test]
fn test_comparison_binds_tighter_than_and() {
    let expr = parse("a != nil && len(a) > 0");
    match expr {
        Expr::Binary {
            op: BinOp::And,
            left,
            right,
        } => {
            assert!(matches!(*left, Expr::Binary { op: BinOp::NotEqual, .. }));
            assert!(matches!(*right, Expr::Binary { op: BinOp::GreaterThan, .. }));
        }
        _ => panic!("Expected and"),
    }
}

#[test]
fn test_eager_operators_bind_like_arithmetic() {
    // & at multiplicative level, | at additive level
    let expr = parse("(a > 1) | (b > 2) & (c > 3)");
    match expr {
        Expr::Binary {
            op: BinOp::EagerOr,
            right,
            ..
        } => {
            assert!(matches!(*right, Expr::Binary { op: BinOp::EagerAnd, .. }));
        }
        _ => panic!("Expected eager or"),
    }
}

#[test]
fn test_unary_is_right_associative() {
    let expr = parse("!!ok");
    assert_eq!(
        expr,
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(ident("ok")),
            }),
        }
    );
}

#[test]
fn test_word_operators() {
    assert_eq!(parse("a and not b"), parse("a && !b"));
}

// ============================================================================
// Postfix
// ============================================================================

#[test]
fn test_member_chain() {
    assert_eq!(
        parse("user.address.city"),
        Expr::Selector {
            base: Box::new(Expr::Selector {
                base: Box::new(ident("user")),
                member: "address".to_string(),
            }),
            member: "city".to_string(),
        }
    );
}

#[test]
fn test_index() {
    assert_eq!(
        parse("ids[0]"),
        Expr::Index {
            base: Box::new(ident("ids")),
            index: Box::new(int(0)),
        }
    );
}

#[test]
fn test_slices() {
    assert!(matches!(
        parse("ids[1:]"),
        Expr::Slice { low: Some(_), high: None, max: None, .. }
    ));
    assert!(matches!(
        parse("ids[:2]"),
        Expr::Slice { low: None, high: Some(_), max: None, .. }
    ));
    assert!(matches!(
        parse("ids[0:2:4]"),
        Expr::Slice { low: Some(_), high: Some(_), max: Some(_), .. }
    ));
}

#[test]
fn test_three_index_slice_requires_high() {
    assert!(parse_expression("ids[0::4]").is_err());
}

#[test]
fn test_empty_index_is_error() {
    assert!(parse_expression("ids[]").is_err());
}

#[test]
fn test_calls() {
    assert_eq!(
        parse("join(names, \",\")"),
        Expr::Call {
            function: Box::new(ident("join")),
            args: vec![ident("names"), Expr::Literal(Literal::String(",".to_string()))],
        }
    );
    assert!(matches!(parse("user.FullName()"), Expr::Call { args, .. } if args.is_empty()));
}

#[test]
fn test_large_integer_literal_is_unsigned() {
    assert_eq!(
        parse("18446744073709551615"),
        Expr::Literal(Literal::Uint(u64::MAX))
    );
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_syntax_error_wraps_parse_error() {
    let err = parse_expression("a +").unwrap_err();
    assert_eq!(err.expression, "a +");
    assert!(matches!(err.source, ParseError::UnexpectedToken { .. }));
    assert!(err.to_string().contains("a +"));
}

#[test]
fn test_lex_errors_surface_as_syntax_errors() {
    let err = parse_expression("a = 1").unwrap_err();
    assert!(matches!(err.source, ParseError::Lex(_)));
}

#[test]
fn test_trailing_input_is_error() {
    assert!(parse_expression("a b").is_err());
}

#[test]
fn test_unclosed_paren() {
    assert!(parse_expression("(a && b").is_err());
}

#[test]
fn test_deep_nesting_is_syntax_error() {
    let err = parse_expression(&"(".repeat(200_000)).unwrap_err();
    assert!(matches!(err.source, ParseError::TooDeep { .. }));

    let err = parse_expression(&format!("{}a", "!".repeat(100_000))).unwrap_err();
    assert!(matches!(err.source, ParseError::TooDeep { .. }));
}

#[test]
fn test_long_operator_chain_is_syntax_error() {
    let chain = vec!["1"; 10_000].join(" + ");
    let err = parse_expression(&chain).unwrap_err();
    assert!(matches!(err.source, ParseError::TooDeep { .. }));
}

#[test]
fn test_moderate_nesting_parses() {
    let text = format!("{}x{}", "(".repeat(50), ")".repeat(50));
    assert_eq!(parse(&text), ident("x"));

    let chain = vec!["a"; 20].join(" && ");
    assert!(parse_expression(&chain).is_ok());
}
