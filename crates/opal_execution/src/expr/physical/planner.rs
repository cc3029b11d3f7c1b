use crate::expr::Expression;

use super::{
    PhysicalArithExpr, PhysicalCastExpr, PhysicalColumnExpr, PhysicalComparisonExpr,
    PhysicalConjunctionExpr, PhysicalLiteralExpr, PhysicalNegateExpr, PhysicalScalarExpression,
};

/// Plans bound expressions into executable expressions.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhysicalExpressionPlanner;

impl PhysicalExpressionPlanner {
    pub fn plan(&self, expr: &Expression) -> PhysicalScalarExpression {
        match expr {
            Expression::Column(expr) => PhysicalScalarExpression::Column(PhysicalColumnExpr {
                column: expr.column,
            }),
            Expression::Literal(expr) => PhysicalScalarExpression::Literal(PhysicalLiteralExpr {
                literal: expr.literal.clone(),
            }),
            Expression::Arith(expr) => PhysicalScalarExpression::Arith(PhysicalArithExpr {
                op: expr.op,
                left: Box::new(self.plan(&expr.left)),
                right: Box::new(self.plan(&expr.right)),
            }),
            Expression::Comparison(expr) => {
                PhysicalScalarExpression::Comparison(PhysicalComparisonExpr {
                    op: expr.op,
                    left: Box::new(self.plan(&expr.left)),
                    right: Box::new(self.plan(&expr.right)),
                })
            }
            Expression::Conjunction(expr) => {
                PhysicalScalarExpression::Conjunction(PhysicalConjunctionExpr {
                    op: expr.op,
                    left: Box::new(self.plan(&expr.left)),
                    right: Box::new(self.plan(&expr.right)),
                })
            }
            Expression::Negate(expr) => PhysicalScalarExpression::Negate(PhysicalNegateExpr {
                op: expr.op,
                expr: Box::new(self.plan(&expr.expr)),
            }),
            Expression::Cast(expr) => PhysicalScalarExpression::Cast(PhysicalCastExpr {
                to: expr.to,
                expr: Box::new(self.plan(&expr.expr)),
            }),
        }
    }

    pub fn plan_many(&self, exprs: &[Expression]) -> Vec<PhysicalScalarExpression> {
        exprs.iter().map(|expr| self.plan(expr)).collect()
    }
}
