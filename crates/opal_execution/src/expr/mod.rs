pub mod arith_expr;
pub mod cast_expr;
pub mod column_expr;
pub mod comparison_expr;
pub mod conjunction_expr;
pub mod literal_expr;
pub mod negate_expr;
pub mod physical;

pub use arith_expr::{ArithExpr, ArithOperator};
pub use cast_expr::CastExpr;
pub use column_expr::ColumnExpr;
pub use comparison_expr::{ComparisonExpr, ComparisonOperator};
pub use conjunction_expr::{ConjunctionExpr, ConjunctionOperator};
pub use literal_expr::LiteralExpr;
pub use negate_expr::{NegateExpr, NegateOperator};

use std::fmt;

use crate::types::datatype::DataType;

/// A bound scalar expression.
///
/// Every node carries enough information to know its output type without
/// consulting outside state. Column references are flat offsets into the row
/// produced by the operator's input.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Column(ColumnExpr),
    Literal(LiteralExpr),
    Arith(ArithExpr),
    Comparison(ComparisonExpr),
    Conjunction(ConjunctionExpr),
    Negate(NegateExpr),
    Cast(CastExpr),
}

impl Expression {
    pub fn datatype(&self) -> DataType {
        match self {
            Self::Column(expr) => expr.datatype,
            Self::Literal(expr) => expr.literal.datatype(),
            Self::Arith(expr) => expr.datatype(),
            Self::Comparison(_) => DataType::Boolean,
            Self::Conjunction(_) => DataType::Boolean,
            Self::Negate(expr) => expr.datatype(),
            Self::Cast(expr) => expr.to,
        }
    }

    /// Call `func` for every column reference in the expression.
    pub fn for_each_column<F>(&self, func: &mut F)
    where
        F: FnMut(&ColumnExpr),
    {
        match self {
            Self::Column(expr) => func(expr),
            Self::Literal(_) => (),
            Self::Arith(expr) => {
                expr.left.for_each_column(func);
                expr.right.for_each_column(func);
            }
            Self::Comparison(expr) => {
                expr.left.for_each_column(func);
                expr.right.for_each_column(func);
            }
            Self::Conjunction(expr) => {
                expr.left.for_each_column(func);
                expr.right.for_each_column(func);
            }
            Self::Negate(expr) => expr.expr.for_each_column(func),
            Self::Cast(expr) => expr.expr.for_each_column(func),
        }
    }

    /// Call `func` for every column reference, mutably.
    pub fn for_each_column_mut<F>(&mut self, func: &mut F)
    where
        F: FnMut(&mut ColumnExpr),
    {
        match self {
            Self::Column(expr) => func(expr),
            Self::Literal(_) => (),
            Self::Arith(expr) => {
                expr.left.for_each_column_mut(func);
                expr.right.for_each_column_mut(func);
            }
            Self::Comparison(expr) => {
                expr.left.for_each_column_mut(func);
                expr.right.for_each_column_mut(func);
            }
            Self::Conjunction(expr) => {
                expr.left.for_each_column_mut(func);
                expr.right.for_each_column_mut(func);
            }
            Self::Negate(expr) => expr.expr.for_each_column_mut(func),
            Self::Cast(expr) => expr.expr.for_each_column_mut(func),
        }
    }

    /// Shift every column reference left by `offset`.
    ///
    /// Used when a predicate bound against a join's output row is pushed to
    /// the right input of the join.
    pub fn rebase_columns(mut self, offset: usize) -> Expression {
        self.for_each_column_mut(&mut |col| col.column -= offset);
        self
    }

    /// Column index bounds `(min, max)` referenced by this expression, if it
    /// references any columns at all.
    pub fn column_bounds(&self) -> Option<(usize, usize)> {
        let mut bounds: Option<(usize, usize)> = None;
        self.for_each_column(&mut |col| {
            bounds = Some(match bounds {
                Some((min, max)) => (min.min(col.column), max.max(col.column)),
                None => (col.column, col.column),
            });
        });
        bounds
    }
}

/// Split an expression on AND into its conjuncts.
pub fn split_conjunction(expr: Expression, out: &mut Vec<Expression>) {
    match expr {
        Expression::Conjunction(ConjunctionExpr {
            op: ConjunctionOperator::And,
            left,
            right,
        }) => {
            split_conjunction(*left, out);
            split_conjunction(*right, out);
        }
        other => out.push(other),
    }
}

/// Join expressions back together with AND.
///
/// Returns None if the input is empty.
pub fn conjunction_from(exprs: impl IntoIterator<Item = Expression>) -> Option<Expression> {
    exprs.into_iter().reduce(|left, right| {
        Expression::Conjunction(ConjunctionExpr {
            op: ConjunctionOperator::And,
            left: Box::new(left),
            right: Box::new(right),
        })
    })
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(expr) => write!(f, "{expr}"),
            Self::Literal(expr) => write!(f, "{expr}"),
            Self::Arith(expr) => write!(f, "{expr}"),
            Self::Comparison(expr) => write!(f, "{expr}"),
            Self::Conjunction(expr) => write!(f, "{expr}"),
            Self::Negate(expr) => write!(f, "{expr}"),
            Self::Cast(expr) => write!(f, "{expr}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::scalar::ScalarValue;

    fn col(idx: usize) -> Expression {
        Expression::Column(ColumnExpr {
            column: idx,
            datatype: DataType::Int32,
        })
    }

    fn eq(left: Expression, right: Expression) -> Expression {
        Expression::Comparison(ComparisonExpr {
            op: ComparisonOperator::Eq,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    #[test]
    fn split_and_rejoin() {
        let pred = conjunction_from([
            eq(col(0), col(4)),
            eq(col(1), Expression::Literal(LiteralExpr {
                literal: ScalarValue::Int32(10),
            })),
        ])
        .unwrap();

        let mut conjuncts = Vec::new();
        split_conjunction(pred, &mut conjuncts);
        assert_eq!(2, conjuncts.len());
    }

    #[test]
    fn column_bounds() {
        let pred = eq(col(2), col(5));
        assert_eq!(Some((2, 5)), pred.column_bounds());

        let no_cols = Expression::Literal(LiteralExpr {
            literal: ScalarValue::Boolean(true),
        });
        assert_eq!(None, no_cols.column_bounds());
    }

    #[test]
    fn rebase_shifts_columns() {
        let rebased = eq(col(3), col(4)).rebase_columns(3);
        assert_eq!(Some((0, 1)), rebased.column_bounds());
    }
}
