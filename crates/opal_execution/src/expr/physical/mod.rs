pub mod planner;

use std::cmp::Ordering;
use std::fmt;

use opal_error::{OpalError, Result};

use crate::types::datatype::DataType;
use crate::types::row::Row;
use crate::types::scalar::ScalarValue;

use super::{ArithOperator, ComparisonOperator, ConjunctionOperator, NegateOperator};

/// An executable scalar expression, evaluated one row at a time.
///
/// Produced from a bound [`Expression`](super::Expression) during physical
/// plan extraction. Evaluation follows SQL null semantics: a null operand
/// makes arithmetic and comparisons null, and conjunctions use three-valued
/// logic.
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicalScalarExpression {
    Column(PhysicalColumnExpr),
    Literal(PhysicalLiteralExpr),
    Arith(PhysicalArithExpr),
    Comparison(PhysicalComparisonExpr),
    Conjunction(PhysicalConjunctionExpr),
    Negate(PhysicalNegateExpr),
    Cast(PhysicalCastExpr),
}

impl PhysicalScalarExpression {
    pub fn eval(&self, row: &Row) -> Result<ScalarValue> {
        match self {
            Self::Column(expr) => Ok(row.value(expr.column)?.clone()),
            Self::Literal(expr) => Ok(expr.literal.clone()),
            Self::Arith(expr) => expr.eval(row),
            Self::Comparison(expr) => expr.eval(row),
            Self::Conjunction(expr) => expr.eval(row),
            Self::Negate(expr) => expr.eval(row),
            Self::Cast(expr) => expr.expr.eval(row)?.cast(expr.to),
        }
    }

    /// Evaluate the expression as a predicate.
    ///
    /// Null results count as not-true, so rows with null predicates are
    /// excluded.
    pub fn eval_predicate(&self, row: &Row) -> Result<bool> {
        match self.eval(row)? {
            ScalarValue::Boolean(b) => Ok(b),
            ScalarValue::Null => Ok(false),
            other => Err(OpalError::Evaluation(format!(
                "predicate evaluated to non-boolean value: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalColumnExpr {
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalLiteralExpr {
    pub literal: ScalarValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalArithExpr {
    pub op: ArithOperator,
    pub left: Box<PhysicalScalarExpression>,
    pub right: Box<PhysicalScalarExpression>,
}

impl PhysicalArithExpr {
    fn eval(&self, row: &Row) -> Result<ScalarValue> {
        let left = self.left.eval(row)?;
        let right = self.right.eval(row)?;
        if left.is_null() || right.is_null() {
            return Ok(ScalarValue::Null);
        }
        match self.op {
            ArithOperator::Add => left.checked_add(&right),
            ArithOperator::Sub => left.checked_sub(&right),
            ArithOperator::Mul => left.checked_mul(&right),
            ArithOperator::Div => left.checked_div(&right),
            ArithOperator::Mod => left.checked_rem(&right),
            ArithOperator::Concat => left.concat(&right),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalComparisonExpr {
    pub op: ComparisonOperator,
    pub left: Box<PhysicalScalarExpression>,
    pub right: Box<PhysicalScalarExpression>,
}

impl PhysicalComparisonExpr {
    fn eval(&self, row: &Row) -> Result<ScalarValue> {
        let left = self.left.eval(row)?;
        let right = self.right.eval(row)?;
        if left.is_null() || right.is_null() {
            return Ok(ScalarValue::Null);
        }
        let ord = left.compare(&right).ok_or_else(|| {
            OpalError::Evaluation(format!(
                "cannot compare {} with {}",
                left.datatype(),
                right.datatype()
            ))
        })?;
        let result = match self.op {
            ComparisonOperator::Eq => ord == Ordering::Equal,
            ComparisonOperator::NotEq => ord != Ordering::Equal,
            ComparisonOperator::Lt => ord == Ordering::Less,
            ComparisonOperator::LtEq => ord != Ordering::Greater,
            ComparisonOperator::Gt => ord == Ordering::Greater,
            ComparisonOperator::GtEq => ord != Ordering::Less,
        };
        Ok(ScalarValue::Boolean(result))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalConjunctionExpr {
    pub op: ConjunctionOperator,
    pub left: Box<PhysicalScalarExpression>,
    pub right: Box<PhysicalScalarExpression>,
}

impl PhysicalConjunctionExpr {
    fn eval(&self, row: &Row) -> Result<ScalarValue> {
        let left = bool_or_null(self.left.eval(row)?)?;
        let right = bool_or_null(self.right.eval(row)?)?;
        // Three-valued logic.
        let result = match self.op {
            ConjunctionOperator::And => match (left, right) {
                (Some(false), _) | (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            },
            ConjunctionOperator::Or => match (left, right) {
                (Some(true), _) | (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            },
        };
        Ok(result.map(ScalarValue::Boolean).unwrap_or(ScalarValue::Null))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalNegateExpr {
    pub op: NegateOperator,
    pub expr: Box<PhysicalScalarExpression>,
}

impl PhysicalNegateExpr {
    fn eval(&self, row: &Row) -> Result<ScalarValue> {
        let value = self.expr.eval(row)?;
        if value.is_null() {
            return Ok(ScalarValue::Null);
        }
        match self.op {
            NegateOperator::Negate => match value {
                ScalarValue::Int32(v) => v
                    .checked_neg()
                    .map(ScalarValue::Int32)
                    .ok_or_else(|| OpalError::Evaluation("integer overflow negating value".to_string())),
                ScalarValue::Int64(v) => v
                    .checked_neg()
                    .map(ScalarValue::Int64)
                    .ok_or_else(|| OpalError::Evaluation("integer overflow negating value".to_string())),
                ScalarValue::Float64(v) => Ok(ScalarValue::Float64(-v)),
                other => Err(OpalError::Evaluation(format!(
                    "cannot negate value of type {}",
                    other.datatype()
                ))),
            },
            NegateOperator::Not => match value {
                ScalarValue::Boolean(b) => Ok(ScalarValue::Boolean(!b)),
                other => Err(OpalError::Evaluation(format!(
                    "NOT requires a boolean, got {}",
                    other.datatype()
                ))),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalCastExpr {
    pub to: DataType,
    pub expr: Box<PhysicalScalarExpression>,
}

fn bool_or_null(value: ScalarValue) -> Result<Option<bool>> {
    match value {
        ScalarValue::Boolean(b) => Ok(Some(b)),
        ScalarValue::Null => Ok(None),
        other => Err(OpalError::Evaluation(format!(
            "conjunction requires boolean operands, got {}",
            other.datatype()
        ))),
    }
}

impl fmt::Display for PhysicalScalarExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(expr) => write!(f, "#{}", expr.column),
            Self::Literal(expr) => match &expr.literal {
                ScalarValue::Utf8(s) => write!(f, "'{s}'"),
                other => write!(f, "{other}"),
            },
            Self::Arith(expr) => write!(f, "{} {} {}", expr.left, expr.op, expr.right),
            Self::Comparison(expr) => write!(f, "{} {} {}", expr.left, expr.op, expr.right),
            Self::Conjunction(expr) => write!(f, "{} {} {}", expr.left, expr.op, expr.right),
            Self::Negate(expr) => match expr.op {
                NegateOperator::Negate => write!(f, "-{}", expr.expr),
                NegateOperator::Not => write!(f, "NOT {}", expr.expr),
            },
            Self::Cast(expr) => write!(f, "CAST({} AS {})", expr.expr, expr.to),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(value: impl Into<ScalarValue>) -> PhysicalScalarExpression {
        PhysicalScalarExpression::Literal(PhysicalLiteralExpr {
            literal: value.into(),
        })
    }

    fn null() -> PhysicalScalarExpression {
        PhysicalScalarExpression::Literal(PhysicalLiteralExpr {
            literal: ScalarValue::Null,
        })
    }

    fn cmp(
        op: ComparisonOperator,
        left: PhysicalScalarExpression,
        right: PhysicalScalarExpression,
    ) -> PhysicalScalarExpression {
        PhysicalScalarExpression::Comparison(PhysicalComparisonExpr {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    #[test]
    fn column_eval() {
        let row = Row::from_iter([100, 10]);
        let expr = PhysicalScalarExpression::Column(PhysicalColumnExpr { column: 1 });
        assert_eq!(ScalarValue::Int32(10), expr.eval(&row).unwrap());
    }

    #[test]
    fn comparison_null_propagates() {
        let expr = cmp(ComparisonOperator::Eq, lit(1i32), null());
        assert_eq!(ScalarValue::Null, expr.eval(&Row::empty()).unwrap());
        assert!(!expr.eval_predicate(&Row::empty()).unwrap());
    }

    #[test]
    fn three_valued_and() {
        // NULL AND false = false
        let expr = PhysicalScalarExpression::Conjunction(PhysicalConjunctionExpr {
            op: ConjunctionOperator::And,
            left: Box::new(null()),
            right: Box::new(lit(false)),
        });
        assert_eq!(ScalarValue::Boolean(false), expr.eval(&Row::empty()).unwrap());

        // NULL AND true = NULL
        let expr = PhysicalScalarExpression::Conjunction(PhysicalConjunctionExpr {
            op: ConjunctionOperator::And,
            left: Box::new(null()),
            right: Box::new(lit(true)),
        });
        assert_eq!(ScalarValue::Null, expr.eval(&Row::empty()).unwrap());
    }

    #[test]
    fn three_valued_or() {
        // NULL OR true = true
        let expr = PhysicalScalarExpression::Conjunction(PhysicalConjunctionExpr {
            op: ConjunctionOperator::Or,
            left: Box::new(null()),
            right: Box::new(lit(true)),
        });
        assert_eq!(ScalarValue::Boolean(true), expr.eval(&Row::empty()).unwrap());
    }

    #[test]
    fn arith_null_propagates() {
        let expr = PhysicalScalarExpression::Arith(PhysicalArithExpr {
            op: ArithOperator::Add,
            left: Box::new(lit(1i64)),
            right: Box::new(null()),
        });
        assert_eq!(ScalarValue::Null, expr.eval(&Row::empty()).unwrap());
    }

    #[test]
    fn concat_eval() {
        let expr = PhysicalScalarExpression::Arith(PhysicalArithExpr {
            op: ArithOperator::Concat,
            left: Box::new(lit("Alexandre")),
            right: Box::new(lit(" Dumas")),
        });
        assert_eq!(
            ScalarValue::from("Alexandre Dumas"),
            expr.eval(&Row::empty()).unwrap()
        );
    }
}
