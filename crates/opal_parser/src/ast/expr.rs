use opal_error::{OpalError, Result};
use serde::{Deserialize, Serialize};

use crate::keywords::Keyword;
use crate::parser::Parser;
use crate::tokens::Token;

use super::{AstParseable, Ident};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    /// Minus, e.g. `-9`
    Minus,
    /// Not, e.g. `NOT true`
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    /// Plus, e.g. `a + b`
    Plus,
    /// Minus, e.g. `a - b`
    Minus,
    /// Multiply, e.g. `a * b`
    Multiply,
    /// Divide, e.g. `a / b`
    Divide,
    /// Modulo, e.g. `a % b`
    Modulo,
    /// String concat operator, e.g. `a || b`
    StringConcat,
    /// Greater than, e.g. `a > b`
    Gt,
    /// Less than, e.g. `a < b`
    Lt,
    /// Greater equal, e.g. `a >= b`
    GtEq,
    /// Less equal, e.g. `a <= b`
    LtEq,
    /// Equal, e.g. `a = b`
    Eq,
    /// Not equal, e.g. `a <> b`
    NotEq,
    /// And, e.g. `a AND b`
    And,
    /// Or, e.g. `a OR b`
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Literal {
    /// Unparsed number literal.
    Number(String),
    /// String literal.
    SingleQuotedString(String),
    /// Boolean literal.
    Boolean(bool),
    /// Null literal.
    Null,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Expr {
    /// Column or table identifier.
    Ident(Ident),
    /// Compound identifier.
    ///
    /// `table.col`
    CompoundIdent(Vec<Ident>),
    /// An expression literal.
    Literal(Literal),
    /// A unary expression.
    UnaryExpr {
        op: UnaryOperator,
        expr: Box<Expr>,
    },
    /// A binary expression.
    BinaryExpr {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    /// A parenthesized expression.
    Nested(Box<Expr>),
}

impl AstParseable for Expr {
    fn parse(parser: &mut Parser) -> Result<Self> {
        Self::parse_subexpr(parser, 0)
    }
}

impl Expr {
    fn parse_subexpr(parser: &mut Parser, precedence: u8) -> Result<Self> {
        let mut expr = Expr::parse_prefix(parser)?;

        loop {
            let next_precedence = Self::get_infix_precedence(parser);
            if precedence >= next_precedence {
                break;
            }

            expr = Self::parse_infix(parser, expr, next_precedence)?;
        }

        Ok(expr)
    }

    fn parse_prefix(parser: &mut Parser) -> Result<Self> {
        let tok = match parser.next() {
            Some(tok) => tok.clone(),
            None => {
                return Err(OpalError::syntax(
                    "expected expression, found end of statement",
                    Default::default(),
                ))
            }
        };

        let expr = match &tok.token {
            Token::Word(w) => match w.keyword {
                Some(Keyword::TRUE) => Expr::Literal(Literal::Boolean(true)),
                Some(Keyword::FALSE) => Expr::Literal(Literal::Boolean(false)),
                Some(Keyword::NULL) => Expr::Literal(Literal::Null),
                Some(Keyword::NOT) => Expr::UnaryExpr {
                    op: UnaryOperator::Not,
                    expr: Box::new(Expr::parse_subexpr(parser, PREC_NOT)?),
                },
                _ => Self::parse_ident_expr(
                    parser,
                    Ident {
                        value: w.value.clone(),
                        quoted: w.quote.is_some(),
                    },
                )?,
            },
            Token::SingleQuotedString(s) => Expr::Literal(Literal::SingleQuotedString(s.clone())),
            Token::Number(s) => Expr::Literal(Literal::Number(s.clone())),
            Token::Minus => Expr::UnaryExpr {
                op: UnaryOperator::Minus,
                expr: Box::new(Expr::parse_subexpr(parser, PREC_UNARY_MINUS)?),
            },
            Token::LeftParen => {
                let expr = Expr::parse(parser)?;
                parser.expect_token(&Token::RightParen)?;
                Expr::Nested(Box::new(expr))
            }
            other => {
                return Err(OpalError::syntax(
                    format!("unexpected token {other:?}, expected expression"),
                    tok.location,
                ))
            }
        };

        Ok(expr)
    }

    /// Continue parsing an identifier expression, possibly compound.
    fn parse_ident_expr(parser: &mut Parser, first: Ident) -> Result<Self> {
        if parser.peek().is_some_and(|tok| tok.token == Token::Period) {
            let mut idents = vec![first];
            while parser.consume_token(&Token::Period) {
                idents.push(Ident::parse(parser)?);
            }
            return Ok(Expr::CompoundIdent(idents));
        }
        Ok(Expr::Ident(first))
    }

    fn parse_infix(parser: &mut Parser, prefix: Expr, precedence: u8) -> Result<Self> {
        let tok = match parser.next() {
            Some(tok) => tok.clone(),
            None => {
                return Err(OpalError::syntax(
                    "expected infix expression, found end of statement",
                    Default::default(),
                ))
            }
        };

        let bin_op: Option<BinaryOperator> = match &tok.token {
            Token::DoubleEq => Some(BinaryOperator::Eq),
            Token::Eq => Some(BinaryOperator::Eq),
            Token::Neq => Some(BinaryOperator::NotEq),
            Token::Gt => Some(BinaryOperator::Gt),
            Token::GtEq => Some(BinaryOperator::GtEq),
            Token::Lt => Some(BinaryOperator::Lt),
            Token::LtEq => Some(BinaryOperator::LtEq),
            Token::Plus => Some(BinaryOperator::Plus),
            Token::Minus => Some(BinaryOperator::Minus),
            Token::Mul => Some(BinaryOperator::Multiply),
            Token::Div => Some(BinaryOperator::Divide),
            Token::Mod => Some(BinaryOperator::Modulo),
            Token::Concat => Some(BinaryOperator::StringConcat),
            Token::Word(w) => match w.keyword {
                Some(Keyword::AND) => Some(BinaryOperator::And),
                Some(Keyword::OR) => Some(BinaryOperator::Or),
                _ => None,
            },
            _ => None,
        };

        match bin_op {
            Some(op) => Ok(Expr::BinaryExpr {
                left: Box::new(prefix),
                op,
                right: Box::new(Expr::parse_subexpr(parser, precedence)?),
            }),
            None => Err(OpalError::syntax(
                format!("unable to parse token {:?} as an expression", tok.token),
                tok.location,
            )),
        }
    }

    /// Get the relative precedence of the next operator.
    ///
    /// If the next token is not an operator, zero is returned and the
    /// expression ends.
    ///
    /// See <https://www.postgresql.org/docs/16/sql-syntax-lexical.html#SQL-PRECEDENCE>
    fn get_infix_precedence(parser: &mut Parser) -> u8 {
        let tok = match parser.peek() {
            Some(tok) => &tok.token,
            None => return 0,
        };

        match tok {
            Token::Word(w) if w.keyword == Some(Keyword::OR) => PREC_OR,
            Token::Word(w) if w.keyword == Some(Keyword::AND) => PREC_AND,

            Token::Eq
            | Token::DoubleEq
            | Token::Neq
            | Token::Lt
            | Token::LtEq
            | Token::Gt
            | Token::GtEq => PREC_COMPARISON,

            Token::Plus | Token::Minus => PREC_ADD_SUB,
            Token::Mul | Token::Div | Token::Mod => PREC_MUL_DIV_MOD,

            Token::Concat => PREC_EVERYTHING_ELSE,

            _ => 0,
        }
    }
}

// Precedences, ordered low to high.
const PREC_OR: u8 = 10;
const PREC_AND: u8 = 20;
const PREC_NOT: u8 = 30;
const PREC_COMPARISON: u8 = 50;
const PREC_EVERYTHING_ELSE: u8 = 70;
const PREC_ADD_SUB: u8 = 80;
const PREC_MUL_DIV_MOD: u8 = 90;
const PREC_UNARY_MINUS: u8 = 100;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::testutil::parse_ast;
    use pretty_assertions::assert_eq;

    #[test]
    fn literal_number() {
        let expr: Expr = parse_ast("1830").unwrap();
        assert_eq!(Expr::Literal(Literal::Number("1830".to_string())), expr);
    }

    #[test]
    fn compound_ident() {
        let expr: Expr = parse_ast("b.year").unwrap();
        assert_eq!(
            Expr::CompoundIdent(vec![Ident::from_string("b"), Ident::from_string("year")]),
            expr
        );
    }

    #[test]
    fn compound_ident_quoted() {
        let expr: Expr = parse_ast("b.\"year\"").unwrap();
        assert_eq!(
            Expr::CompoundIdent(vec![
                Ident::from_string("b"),
                Ident {
                    value: "year".to_string(),
                    quoted: true
                }
            ]),
            expr
        );
    }

    #[test]
    fn binary_precedence() {
        // Multiplication binds tighter than addition.
        let expr: Expr = parse_ast("a + b * c").unwrap();
        assert_eq!(
            Expr::BinaryExpr {
                left: Box::new(Expr::Ident(Ident::from_string("a"))),
                op: BinaryOperator::Plus,
                right: Box::new(Expr::BinaryExpr {
                    left: Box::new(Expr::Ident(Ident::from_string("b"))),
                    op: BinaryOperator::Multiply,
                    right: Box::new(Expr::Ident(Ident::from_string("c"))),
                }),
            },
            expr
        );
    }

    #[test]
    fn comparison_binds_tighter_than_and() {
        let expr: Expr = parse_ast("a = 1 AND b = 2").unwrap();
        let lhs = Expr::BinaryExpr {
            left: Box::new(Expr::Ident(Ident::from_string("a"))),
            op: BinaryOperator::Eq,
            right: Box::new(Expr::Literal(Literal::Number("1".to_string()))),
        };
        let rhs = Expr::BinaryExpr {
            left: Box::new(Expr::Ident(Ident::from_string("b"))),
            op: BinaryOperator::Eq,
            right: Box::new(Expr::Literal(Literal::Number("2".to_string()))),
        };
        assert_eq!(
            Expr::BinaryExpr {
                left: Box::new(lhs),
                op: BinaryOperator::And,
                right: Box::new(rhs),
            },
            expr
        );
    }

    #[test]
    fn concat_chain() {
        let expr: Expr = parse_ast("a.firstname || ' ' || a.lastname").unwrap();
        // Left associative.
        let first = Expr::BinaryExpr {
            left: Box::new(Expr::CompoundIdent(vec![
                Ident::from_string("a"),
                Ident::from_string("firstname"),
            ])),
            op: BinaryOperator::StringConcat,
            right: Box::new(Expr::Literal(Literal::SingleQuotedString(" ".to_string()))),
        };
        assert_eq!(
            Expr::BinaryExpr {
                left: Box::new(first),
                op: BinaryOperator::StringConcat,
                right: Box::new(Expr::CompoundIdent(vec![
                    Ident::from_string("a"),
                    Ident::from_string("lastname"),
                ])),
            },
            expr
        );
    }

    #[test]
    fn unary_minus() {
        let expr: Expr = parse_ast("-1 + 2").unwrap();
        assert_eq!(
            Expr::BinaryExpr {
                left: Box::new(Expr::UnaryExpr {
                    op: UnaryOperator::Minus,
                    expr: Box::new(Expr::Literal(Literal::Number("1".to_string()))),
                }),
                op: BinaryOperator::Plus,
                right: Box::new(Expr::Literal(Literal::Number("2".to_string()))),
            },
            expr
        );
    }
}
