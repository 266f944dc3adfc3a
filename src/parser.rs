use std::mem;

use thiserror::Error;

use crate::{
    ast::{BinOp, Expr, Literal, Token, UnaryOp},
    lexer::{LexError, Lexer, Position},
};

/// Errors produced while parsing tokens into an [`Expr`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("expected {expected}, got {found:?} at {position}")]
    UnexpectedToken {
        expected: String,
        found: Token,
        position: Position,
    },

    /// Nesting beyond [`MAX_DEPTH`]
    #[error("expression nested too deeply at {position}")]
    TooDeep { position: Position },
}

/// Deepest expression tree the parser builds. Evaluation recurses once per
/// level, so this also bounds the evaluator's stack use.
pub const MAX_DEPTH: usize = 128;

/// Malformed expression text. Wraps the underlying [`ParseError`].
#[derive(Debug, Clone, PartialEq, Error)]
#[error("syntax error in expression `{expression}`: {source}")]
pub struct SyntaxError {
    pub expression: String,
    #[source]
    pub source: ParseError,
}

/// Recursive-descent parser, one method per precedence level.
pub struct Parser {
    lexer: Lexer,
    current_token: Token,
    token_position: Position,
    depth: usize,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Result<Self, ParseError> {
        let token_position = lexer.position();
        let current_token = lexer.next_token()?;
        Ok(Parser {
            lexer,
            current_token,
            token_position,
            depth: 0,
        })
    }

    /// Enter one more level of the tree being built.
    fn descend(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::TooDeep {
                position: self.token_position,
            });
        }
        Ok(())
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.token_position = self.lexer.position();
        self.current_token = self.lexer.next_token()?;
        Ok(())
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: self.current_token.clone(),
            position: self.token_position,
        }
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if mem::discriminant(&self.current_token) != mem::discriminant(&expected) {
            return Err(self.unexpected(&format!("{:?}", expected)));
        }
        self.advance()
    }

    fn check(&self, token: &Token) -> bool {
        mem::discriminant(&self.current_token) == mem::discriminant(token)
    }

    /// Parse primary expressions (atoms): literals, identifiers, parenthesized groups
    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let literal = match &self.current_token {
            Token::Integer(n) => Some(match i64::try_from(*n) {
                Ok(i) => Literal::Int(i),
                Err(_) => Literal::Uint(*n),
            }),
            Token::Float(n) => Some(Literal::Float(*n)),
            Token::Boolean(b) => Some(Literal::Bool(*b)),
            Token::Nil => Some(Literal::Nil),
            _ => None,
        };
        if let Some(literal) = literal {
            self.advance()?;
            return Ok(Expr::Literal(literal));
        }

        match mem::replace(&mut self.current_token, Token::Eof) {
            Token::String(s) => {
                self.advance()?;
                Ok(Expr::Literal(Literal::String(s)))
            }
            Token::Identifier(name) => {
                self.advance()?;
                Ok(Expr::Identifier(name))
            }
            Token::LParen => {
                self.advance()?;
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            token => {
                self.current_token = token;
                Err(self.unexpected("expression"))
            }
        }
    }

    /// Parse member access, indexing, slicing and calls
    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let entry = self.depth;
        let mut expr = self.parse_primary()?;

        loop {
            if self.check(&Token::Dot) {
                self.descend()?;
                self.advance()?; // consume '.'

                let member = match &self.current_token {
                    Token::Identifier(n) => n.clone(),
                    _ => return Err(self.unexpected("identifier after '.'")),
                };
                self.advance()?;

                expr = Expr::Selector {
                    base: Box::new(expr),
                    member,
                };
            } else if self.check(&Token::LBracket) {
                self.descend()?;
                self.advance()?; // consume '['
                expr = self.parse_index(expr)?;
            } else if self.check(&Token::LParen) {
                self.descend()?;
                self.advance()?; // consume '('
                let args = self.parse_arguments()?;
                expr = Expr::Call {
                    function: Box::new(expr),
                    args,
                };
            } else {
                break;
            }
        }
        self.depth = entry;
        Ok(expr)
    }

    fn parse_index(&mut self, base: Expr) -> Result<Expr, ParseError> {
        let low = if self.check(&Token::Colon) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };

        if self.check(&Token::RBracket) {
            self.advance()?;
            return match low {
                Some(index) => Ok(Expr::Index {
                    base: Box::new(base),
                    index,
                }),
                None => Err(self.unexpected("index")),
            };
        }

        self.expect(Token::Colon)?;

        let high = if self.check(&Token::Colon) || self.check(&Token::RBracket) {
            None
        } else {
            Some(Box::new(self.parse_expression()?))
        };

        let max = if self.check(&Token::Colon) {
            self.advance()?;
            // Three-index slices need both the high and max bounds
            if high.is_none() {
                return Err(self.unexpected("high bound in 3-index slice"));
            }
            Some(Box::new(self.parse_expression()?))
        } else {
            None
        };

        self.expect(Token::RBracket)?;

        Ok(Expr::Slice {
            base: Box::new(base),
            low,
            high,
            max,
        })
    }

    fn parse_arguments(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut args = vec![];

        while !self.check(&Token::RParen) {
            args.push(self.parse_expression()?);

            if !self.check(&Token::RParen) {
                self.expect(Token::Comma)?;
            }
        }

        self.expect(Token::RParen)?;
        Ok(args)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let op = match &self.current_token {
            Token::Minus => UnaryOp::Negate,
            Token::Plus => UnaryOp::Plus,
            Token::Bang => UnaryOp::Not,
            Token::Caret => UnaryOp::Complement,
            Token::Ampersand => UnaryOp::Reference,
            Token::Star => UnaryOp::Deref,
            _ => return self.parse_postfix(),
        };

        self.descend()?;
        self.advance()?;
        let operand = self.parse_unary()?; // Right-associative
        self.depth -= 1;

        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ParseError> {
        let entry = self.depth;
        let mut left = self.parse_unary()?;

        loop {
            let op = match &self.current_token {
                Token::Star => BinOp::Multiply,
                Token::Slash => BinOp::Divide,
                Token::Percent => BinOp::Modulo,
                Token::Ampersand => BinOp::EagerAnd,
                _ => break,
            };

            self.descend()?;
            self.advance()?;
            let right = self.parse_unary()?;

            left = binary(op, left, right);
        }
        self.depth = entry;
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, ParseError> {
        let entry = self.depth;
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match &self.current_token {
                Token::Plus => BinOp::Add,
                Token::Minus => BinOp::Subtract,
                Token::Pipe => BinOp::EagerOr,
                _ => break,
            };

            self.descend()?;
            self.advance()?;
            let right = self.parse_multiplicative()?;

            left = binary(op, left, right);
        }
        self.depth = entry;
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, ParseError> {
        let entry = self.depth;
        let mut left = self.parse_additive()?;

        while let Some(op) = match &self.current_token {
            Token::EqEq => Some(BinOp::Equal),
            Token::NotEq => Some(BinOp::NotEqual),
            Token::Lt => Some(BinOp::LessThan),
            Token::Gt => Some(BinOp::GreaterThan),
            Token::LtEq => Some(BinOp::LessEqual),
            Token::GtEq => Some(BinOp::GreaterEqual),
            _ => None,
        } {
            self.descend()?;
            self.advance()?;
            let right = self.parse_additive()?;

            left = binary(op, left, right);
        }
        self.depth = entry;
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let entry = self.depth;
        let mut left = self.parse_comparison()?;

        while self.check(&Token::AndAnd) {
            self.descend()?;
            self.advance()?;
            let right = self.parse_comparison()?;

            left = binary(BinOp::And, left, right);
        }
        self.depth = entry;
        Ok(left)
    }

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let entry = self.depth;
        let mut left = self.parse_and()?;

        while self.check(&Token::OrOr) {
            self.descend()?;
            self.advance()?;
            let right = self.parse_and()?;

            left = binary(BinOp::Or, left, right);
        }
        self.depth = entry;
        Ok(left)
    }

    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.descend()?;
        let expr = self.parse_or()?;
        self.depth -= 1;
        Ok(expr)
    }

    /// Parse a complete expression; trailing input is an error.
    pub fn parse(&mut self) -> Result<Expr, ParseError> {
        let expr = self.parse_expression()?;
        self.expect(Token::Eof)?;
        Ok(expr)
    }
}

fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Parse expression text, wrapping any failure in a [`SyntaxError`].
pub fn parse_expression(text: &str) -> Result<Expr, SyntaxError> {
    Parser::new(Lexer::new(text))
        .and_then(|mut parser| parser.parse())
        .map_err(|source| SyntaxError {
            expression: text.to_string(),
            source,
        })
}
