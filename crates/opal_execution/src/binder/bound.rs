use std::sync::Arc;

use opal_error::Result;

use crate::database::catalog::TableEntry;
use crate::expr::Expression;
use crate::logical::operator::{JoinType, OrderByExpr};

/// The FROM clause with all tables resolved and join conditions bound.
#[derive(Debug)]
pub enum BoundFrom {
    /// No FROM clause.
    Empty,
    Table(BoundBaseTable),
    Join(Box<BoundJoin>),
    CrossJoin(Box<BoundCrossJoin>),
}

impl BoundFrom {
    /// Visit every base table in FROM-clause order.
    pub fn for_each_table<F>(&self, func: &mut F) -> Result<()>
    where
        F: FnMut(&BoundBaseTable) -> Result<()>,
    {
        match self {
            Self::Empty => Ok(()),
            Self::Table(table) => func(table),
            Self::Join(join) => {
                join.left.for_each_table(func)?;
                join.right.for_each_table(func)
            }
            Self::CrossJoin(join) => {
                join.left.for_each_table(func)?;
                join.right.for_each_table(func)
            }
        }
    }
}

#[derive(Debug)]
pub struct BoundBaseTable {
    /// Catalog schema the table resolved in.
    pub schema: String,
    pub entry: Arc<TableEntry>,
    /// Alias the table is referenced by in the query.
    pub alias: String,
}

#[derive(Debug)]
pub struct BoundJoin {
    pub left: BoundFrom,
    pub right: BoundFrom,
    pub join_type: JoinType,
    /// Condition bound against the concatenated left and right rows.
    pub condition: Expression,
}

#[derive(Debug)]
pub struct BoundCrossJoin {
    pub left: BoundFrom,
    pub right: BoundFrom,
}

/// A fully bound, type-annotated query.
///
/// Every expression carries its resolved type, every column reference is a
/// flat offset into the FROM row, and ORDER BY keys point at select-list
/// outputs.
#[derive(Debug)]
pub struct BoundQuery {
    pub from: BoundFrom,
    pub filter: Option<Expression>,
    pub projections: Vec<Expression>,
    /// Output column names, same length as `projections`.
    pub names: Vec<String>,
    pub order_by: Vec<OrderByExpr>,
    pub limit: Option<usize>,
    pub offset: usize,
}
