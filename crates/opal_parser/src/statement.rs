use serde::{Deserialize, Serialize};

use crate::ast::QueryNode;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statement {
    Query(QueryNode),
}
