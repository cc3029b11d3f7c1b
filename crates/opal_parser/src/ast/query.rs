use opal_error::Result;
use serde::{Deserialize, Serialize};

use crate::keywords::Keyword;
use crate::parser::Parser;

use super::{AstParseable, LimitModifier, OrderByNode, SelectNode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryNode {
    pub body: SelectNode,
    pub order_by: Vec<OrderByNode>,
    pub limit: LimitModifier,
}

impl AstParseable for QueryNode {
    fn parse(parser: &mut Parser) -> Result<Self> {
        parser.expect_keyword(Keyword::SELECT)?;
        let body = SelectNode::parse(parser)?;

        let order_by = if parser.parse_keyword_sequence(&[Keyword::ORDER, Keyword::BY]) {
            parser.parse_comma_separated(OrderByNode::parse)?
        } else {
            Vec::new()
        };

        let limit = LimitModifier::parse(parser)?;

        Ok(QueryNode {
            body,
            order_by,
            limit,
        })
    }
}
