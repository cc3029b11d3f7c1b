use opal_error::{OpalError, Result};
use opal_parser::ast;

use crate::expr::{
    ArithExpr, ArithOperator, CastExpr, ColumnExpr, ComparisonExpr, ComparisonOperator,
    ConjunctionExpr, ConjunctionOperator, Expression, LiteralExpr, NegateExpr, NegateOperator,
};
use crate::types::datatype::DataType;
use crate::types::scalar::ScalarValue;

use super::bind_context::BindScope;

/// Binds scalar expressions against the columns in scope.
///
/// Type checking happens here: operands are checked against a fixed
/// promotion table and casts are inserted so that evaluation always sees
/// matching operand types.
#[derive(Debug)]
pub struct ExpressionBinder<'a> {
    scope: &'a BindScope,
    pub case_sensitive: bool,
}

impl<'a> ExpressionBinder<'a> {
    pub fn new(scope: &'a BindScope, case_sensitive: bool) -> Self {
        ExpressionBinder {
            scope,
            case_sensitive,
        }
    }

    pub fn bind(&self, expr: &ast::Expr) -> Result<Expression> {
        match expr {
            ast::Expr::Ident(ident) => {
                let (column, datatype) = self.scope.resolve(None, ident, self.case_sensitive)?;
                Ok(Expression::Column(ColumnExpr { column, datatype }))
            }
            ast::Expr::CompoundIdent(idents) => match idents.as_slice() {
                [table, column] => {
                    let (column, datatype) =
                        self.scope
                            .resolve(Some(table), column, self.case_sensitive)?;
                    Ok(Expression::Column(ColumnExpr { column, datatype }))
                }
                _ => Err(OpalError::UnknownColumn(
                    idents
                        .iter()
                        .map(|i| i.value.as_str())
                        .collect::<Vec<_>>()
                        .join("."),
                )),
            },
            ast::Expr::Literal(literal) => Ok(Expression::Literal(LiteralExpr {
                literal: bind_literal(literal)?,
            })),
            ast::Expr::UnaryExpr { op, expr } => self.bind_unary(*op, expr),
            ast::Expr::BinaryExpr { left, op, right } => self.bind_binary(left, *op, right),
            ast::Expr::Nested(expr) => self.bind(expr),
        }
    }

    fn bind_unary(&self, op: ast::UnaryOperator, expr: &ast::Expr) -> Result<Expression> {
        let expr = self.bind(expr)?;
        match op {
            ast::UnaryOperator::Minus => {
                let datatype = expr.datatype();
                if !datatype.is_numeric() && datatype != DataType::Null {
                    return Err(OpalError::type_mismatch(format!(
                        "cannot negate value of type {datatype}"
                    )));
                }
                Ok(Expression::Negate(NegateExpr {
                    op: NegateOperator::Negate,
                    expr: Box::new(expr),
                }))
            }
            ast::UnaryOperator::Not => {
                let datatype = expr.datatype();
                if datatype != DataType::Boolean && datatype != DataType::Null {
                    return Err(OpalError::type_mismatch(format!(
                        "NOT requires a boolean operand, got {datatype}"
                    )));
                }
                Ok(Expression::Negate(NegateExpr {
                    op: NegateOperator::Not,
                    expr: Box::new(expr),
                }))
            }
        }
    }

    fn bind_binary(
        &self,
        left: &ast::Expr,
        op: ast::BinaryOperator,
        right: &ast::Expr,
    ) -> Result<Expression> {
        let left = self.bind(left)?;
        let right = self.bind(right)?;

        match op {
            ast::BinaryOperator::Plus
            | ast::BinaryOperator::Minus
            | ast::BinaryOperator::Multiply
            | ast::BinaryOperator::Divide
            | ast::BinaryOperator::Modulo => {
                let arith_op = match op {
                    ast::BinaryOperator::Plus => ArithOperator::Add,
                    ast::BinaryOperator::Minus => ArithOperator::Sub,
                    ast::BinaryOperator::Multiply => ArithOperator::Mul,
                    ast::BinaryOperator::Divide => ArithOperator::Div,
                    _ => ArithOperator::Mod,
                };
                let common = self.common_operand_type(&left, &right, &format!("{arith_op}"))?;
                if common != DataType::Null && !common.is_numeric() {
                    return Err(OpalError::type_mismatch(format!(
                        "'{arith_op}' requires numeric operands, got {} and {}",
                        left.datatype(),
                        right.datatype()
                    )));
                }
                Ok(Expression::Arith(ArithExpr {
                    op: arith_op,
                    left: Box::new(cast_to(left, common)),
                    right: Box::new(cast_to(right, common)),
                }))
            }
            ast::BinaryOperator::StringConcat => {
                for side in [&left, &right] {
                    let datatype = side.datatype();
                    if datatype != DataType::Utf8 && datatype != DataType::Null {
                        return Err(OpalError::type_mismatch(format!(
                            "'||' requires string operands, got {datatype}"
                        )));
                    }
                }
                Ok(Expression::Arith(ArithExpr {
                    op: ArithOperator::Concat,
                    left: Box::new(left),
                    right: Box::new(right),
                }))
            }
            ast::BinaryOperator::Eq
            | ast::BinaryOperator::NotEq
            | ast::BinaryOperator::Lt
            | ast::BinaryOperator::LtEq
            | ast::BinaryOperator::Gt
            | ast::BinaryOperator::GtEq => {
                let cmp_op = match op {
                    ast::BinaryOperator::Eq => ComparisonOperator::Eq,
                    ast::BinaryOperator::NotEq => ComparisonOperator::NotEq,
                    ast::BinaryOperator::Lt => ComparisonOperator::Lt,
                    ast::BinaryOperator::LtEq => ComparisonOperator::LtEq,
                    ast::BinaryOperator::Gt => ComparisonOperator::Gt,
                    _ => ComparisonOperator::GtEq,
                };
                let common = self.common_operand_type(&left, &right, &format!("{cmp_op}"))?;
                Ok(Expression::Comparison(ComparisonExpr {
                    op: cmp_op,
                    left: Box::new(cast_to(left, common)),
                    right: Box::new(cast_to(right, common)),
                }))
            }
            ast::BinaryOperator::And | ast::BinaryOperator::Or => {
                for side in [&left, &right] {
                    let datatype = side.datatype();
                    if datatype != DataType::Boolean && datatype != DataType::Null {
                        return Err(OpalError::type_mismatch(format!(
                            "AND/OR require boolean operands, got {datatype}"
                        )));
                    }
                }
                let op = match op {
                    ast::BinaryOperator::And => ConjunctionOperator::And,
                    _ => ConjunctionOperator::Or,
                };
                Ok(Expression::Conjunction(ConjunctionExpr {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                }))
            }
        }
    }

    fn common_operand_type(
        &self,
        left: &Expression,
        right: &Expression,
        op: &str,
    ) -> Result<DataType> {
        DataType::common_type(left.datatype(), right.datatype()).ok_or_else(|| {
            OpalError::type_mismatch(format!(
                "no common type for '{op}': {} and {}",
                left.datatype(),
                right.datatype()
            ))
        })
    }
}

/// Wrap an expression in a cast when its type differs from the target.
///
/// Null-typed expressions are left alone, nulls evaluate to null under any
/// type.
fn cast_to(expr: Expression, to: DataType) -> Expression {
    let datatype = expr.datatype();
    if datatype == to || datatype == DataType::Null {
        return expr;
    }
    Expression::Cast(CastExpr {
        to,
        expr: Box::new(expr),
    })
}

fn bind_literal(literal: &ast::Literal) -> Result<ScalarValue> {
    Ok(match literal {
        ast::Literal::Number(s) => {
            if let Ok(v) = s.parse::<i64>() {
                ScalarValue::Int64(v)
            } else if let Ok(v) = s.parse::<f64>() {
                ScalarValue::Float64(v)
            } else {
                return Err(OpalError::type_mismatch(format!(
                    "invalid number literal: {s}"
                )));
            }
        }
        ast::Literal::SingleQuotedString(s) => ScalarValue::Utf8(s.clone()),
        ast::Literal::Boolean(b) => ScalarValue::Boolean(*b),
        ast::Literal::Null => ScalarValue::Null,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::field::{Field, Schema};
    use opal_parser::ast::AstParseable;
    use opal_parser::parser::Parser;
    use opal_parser::tokens::Tokenizer;

    fn bind(sql_expr: &str, scope: &BindScope) -> Result<Expression> {
        let toks = Tokenizer::new(sql_expr).tokenize().unwrap();
        let mut parser = Parser::with_tokens(toks);
        let expr = ast::Expr::parse(&mut parser).unwrap();
        ExpressionBinder::new(scope, true).bind(&expr)
    }

    fn scope() -> BindScope {
        let mut scope = BindScope::empty();
        scope.append_table(
            "b",
            &Schema::new([
                Field::new("id", DataType::Int32, false),
                Field::new("year", DataType::Int32, true),
                Field::new("title", DataType::Utf8, true),
            ]),
        );
        scope
    }

    #[test]
    fn comparison_promotes_with_cast() {
        let scope = scope();
        // Int32 column compared against Int64 literal, column side gets cast.
        let expr = bind("year > 1830", &scope).unwrap();
        match expr {
            Expression::Comparison(cmp) => {
                assert!(matches!(*cmp.left, Expression::Cast(ref c) if c.to == DataType::Int64));
                assert_eq!(DataType::Int64, cmp.right.datatype());
            }
            other => panic!("unexpected expression: {other:?}"),
        }
    }

    #[test]
    fn concat_requires_strings() {
        let scope = scope();
        let err = bind("title || id", &scope).unwrap_err();
        assert!(matches!(err, OpalError::TypeMismatch { .. }));
    }

    #[test]
    fn arith_requires_numeric() {
        let scope = scope();
        let err = bind("title + 1", &scope).unwrap_err();
        assert!(matches!(err, OpalError::TypeMismatch { .. }));
    }

    #[test]
    fn and_requires_booleans() {
        let scope = scope();
        let err = bind("id AND true", &scope).unwrap_err();
        assert!(matches!(err, OpalError::TypeMismatch { .. }));
    }

    #[test]
    fn comparison_has_boolean_type() {
        let scope = scope();
        let expr = bind("id = 1", &scope).unwrap();
        assert_eq!(DataType::Boolean, expr.datatype());
    }

    #[test]
    fn float_literal() {
        let scope = scope();
        let expr = bind("1.5", &scope).unwrap();
        assert_eq!(DataType::Float64, expr.datatype());
    }
}
