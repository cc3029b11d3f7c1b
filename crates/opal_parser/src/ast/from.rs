use opal_error::Result;
use serde::{Deserialize, Serialize};

use crate::keywords::{Keyword, RESERVED_FOR_TABLE_ALIAS};
use crate::parser::Parser;
use crate::tokens::Token;

use super::{AstParseable, Expr, Ident, ObjectReference};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FromNode {
    pub alias: Option<Ident>,
    pub body: FromNodeBody,
}

impl AstParseable for FromNode {
    fn parse(parser: &mut Parser) -> Result<Self> {
        // Build the first part of the FROM clause.
        let reference = ObjectReference::parse(parser)?;
        let alias = parser.parse_alias(RESERVED_FOR_TABLE_ALIAS)?;
        let mut node = FromNode {
            alias,
            body: FromNodeBody::BaseTable(FromBaseTable { reference }),
        };

        // If followed by a join, recursively build up the FROM node using the
        // node built above as the left part.
        loop {
            let join_type = if parser.parse_keyword(Keyword::CROSS) {
                parser.expect_keyword(Keyword::JOIN)?;
                JoinType::Cross
            } else if parser.consume_token(&Token::Comma) {
                JoinType::Cross
            } else if parser.parse_keyword(Keyword::INNER) {
                parser.expect_keyword(Keyword::JOIN)?;
                JoinType::Inner
            } else if parser.parse_keyword(Keyword::JOIN) {
                JoinType::Inner
            } else if parser.parse_keyword(Keyword::LEFT) {
                // Optional OUTER.
                parser.parse_keyword(Keyword::OUTER);
                parser.expect_keyword(Keyword::JOIN)?;
                JoinType::Left
            } else {
                return Ok(node);
            };

            let right_reference = ObjectReference::parse(parser)?;
            let right_alias = parser.parse_alias(RESERVED_FOR_TABLE_ALIAS)?;
            let right = FromNode {
                alias: right_alias,
                body: FromNodeBody::BaseTable(FromBaseTable {
                    reference: right_reference,
                }),
            };

            let join_condition = if parser.parse_keyword(Keyword::ON) {
                let has_paren = parser.consume_token(&Token::LeftParen);
                let condition = Expr::parse(parser)?;
                if has_paren {
                    parser.expect_token(&Token::RightParen)?;
                }
                JoinCondition::On(condition)
            } else {
                JoinCondition::None
            };

            node = FromNode {
                alias: None,
                body: FromNodeBody::Join(FromJoin {
                    left: Box::new(node),
                    right: Box::new(right),
                    join_type,
                    join_condition,
                }),
            };
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FromNodeBody {
    BaseTable(FromBaseTable),
    Join(FromJoin),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FromBaseTable {
    pub reference: ObjectReference,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FromJoin {
    pub left: Box<FromNode>,
    pub right: Box<FromNode>,
    pub join_type: JoinType,
    pub join_condition: JoinCondition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinType {
    Cross,
    Inner,
    Left,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinCondition {
    On(Expr),
    None,
}
