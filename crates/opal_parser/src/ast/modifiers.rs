use opal_error::Result;
use serde::{Deserialize, Serialize};

use crate::keywords::Keyword;
use crate::parser::Parser;

use super::{AstParseable, Expr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderByType {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderByNulls {
    First,
    Last,
}

/// A single ORDER BY key, e.g. `b.id DESC NULLS FIRST`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderByNode {
    pub typ: Option<OrderByType>,
    pub nulls: Option<OrderByNulls>,
    pub expr: Expr,
}

impl AstParseable for OrderByNode {
    fn parse(parser: &mut Parser) -> Result<Self> {
        let expr = Expr::parse(parser)?;

        let typ = match parser.parse_one_of_keywords(&[Keyword::ASC, Keyword::DESC]) {
            Some(Keyword::ASC) => Some(OrderByType::Asc),
            Some(Keyword::DESC) => Some(OrderByType::Desc),
            _ => None,
        };

        let nulls = if parser.parse_keyword(Keyword::NULLS) {
            match parser.parse_one_of_keywords(&[Keyword::FIRST, Keyword::LAST]) {
                Some(Keyword::FIRST) => Some(OrderByNulls::First),
                Some(Keyword::LAST) => Some(OrderByNulls::Last),
                _ => return Err(parser.error_at_current("expected FIRST or LAST after NULLS")),
            }
        } else {
            None
        };

        Ok(OrderByNode { typ, nulls, expr })
    }
}

/// LIMIT and OFFSET modifiers on a query.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LimitModifier {
    pub limit: Option<Expr>,
    pub offset: Option<Expr>,
}

impl AstParseable for LimitModifier {
    fn parse(parser: &mut Parser) -> Result<Self> {
        let mut modifier = LimitModifier::default();
        if parser.parse_keyword(Keyword::LIMIT) {
            modifier.limit = Some(Expr::parse(parser)?);
        }
        if parser.parse_keyword(Keyword::OFFSET) {
            modifier.offset = Some(Expr::parse(parser)?);
        }
        Ok(modifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::testutil::parse_ast;
    use crate::ast::{Ident, Literal};
    use pretty_assertions::assert_eq;

    #[test]
    fn order_by_defaults() {
        let node: OrderByNode = parse_ast("id").unwrap();
        assert_eq!(
            OrderByNode {
                typ: None,
                nulls: None,
                expr: Expr::Ident(Ident::from_string("id")),
            },
            node
        );
    }

    #[test]
    fn order_by_desc_nulls_first() {
        let node: OrderByNode = parse_ast("id DESC NULLS FIRST").unwrap();
        assert_eq!(
            OrderByNode {
                typ: Some(OrderByType::Desc),
                nulls: Some(OrderByNulls::First),
                expr: Expr::Ident(Ident::from_string("id")),
            },
            node
        );
    }

    #[test]
    fn limit_with_offset() {
        let node: LimitModifier = parse_ast("LIMIT 5 OFFSET 2").unwrap();
        assert_eq!(
            LimitModifier {
                limit: Some(Expr::Literal(Literal::Number("5".to_string()))),
                offset: Some(Expr::Literal(Literal::Number("2".to_string()))),
            },
            node
        );
    }
}
