use opal_error::{OpalError, Result};
use serde::{Deserialize, Serialize};

use crate::keywords::{Keyword, RESERVED_FOR_COLUMN_ALIAS};
use crate::parser::Parser;
use crate::tokens::Token;

use super::{AstParseable, Expr, FromNode, Ident, ObjectReference};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectNode {
    /// Projection list. May include wildcards.
    pub projections: Vec<SelectExpr>,
    /// FROM
    pub from: Option<FromNode>,
    /// WHERE
    pub where_expr: Option<Expr>,
}

impl AstParseable for SelectNode {
    fn parse(parser: &mut Parser) -> Result<Self> {
        // Select list
        let projections = parser.parse_comma_separated(SelectExpr::parse)?;

        // FROM
        let from = if parser.parse_keyword(Keyword::FROM) {
            Some(FromNode::parse(parser)?)
        } else {
            None
        };

        // WHERE
        let where_expr = if parser.parse_keyword(Keyword::WHERE) {
            Some(Expr::parse(parser)?)
        } else {
            None
        };

        Ok(SelectNode {
            projections,
            from,
            where_expr,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SelectExpr {
    /// An unaliased expression.
    Expr(Expr),
    /// An aliased expression.
    ///
    /// `<expr> AS <ident>`
    AliasedExpr(Expr, Ident),
    /// A qualified wildcard.
    ///
    /// `<reference>.*`
    QualifiedWildcard(ObjectReference),
    /// An unqualified wildcard.
    Wildcard,
}

impl AstParseable for SelectExpr {
    fn parse(parser: &mut Parser) -> Result<Self> {
        let idx = parser.idx; // Needed for resetting the position if this is just an expression.

        let tok = match parser.next() {
            Some(tok) => tok.clone(),
            None => {
                return Err(OpalError::syntax(
                    "expected select expression, found end of statement",
                    Default::default(),
                ))
            }
        };

        // `*`
        if matches!(tok.token, Token::Mul) {
            return Ok(SelectExpr::Wildcard);
        }

        // Possibly qualified wildcard.
        //
        // `table.*`
        if let Token::Word(w) = &tok.token {
            if parser.peek().is_some_and(|tok| tok.token == Token::Period) {
                let mut idents = vec![Ident {
                    value: w.value.clone(),
                    quoted: w.quote.is_some(),
                }];

                let mut wildcard = false;
                while parser.consume_token(&Token::Period) {
                    if parser.consume_token(&Token::Mul) {
                        wildcard = true;
                        break;
                    }
                    idents.push(Ident::parse(parser)?);
                }

                if wildcard {
                    return Ok(SelectExpr::QualifiedWildcard(ObjectReference(idents)));
                }
            }
        }

        // None of the above. Parse as an expression.
        parser.idx = idx;
        let expr = Expr::parse(parser)?;

        let alias = parser.parse_alias(RESERVED_FOR_COLUMN_ALIAS)?;
        match alias {
            Some(alias) => Ok(SelectExpr::AliasedExpr(expr, alias)),
            None => Ok(SelectExpr::Expr(expr)),
        }
    }
}
