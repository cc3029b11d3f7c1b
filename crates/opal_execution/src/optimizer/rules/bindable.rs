//! Implementation rules producing operators under the bindable convention.

use opal_error::Result;

use crate::expr::{split_conjunction, ComparisonOperator, Expression};
use crate::optimizer::memo::{LogicalExpr, Memo, PhysicalExpr, RelExpr, RelNode};
use crate::optimizer::rule::{OptimizerRule, RuleChild, RuleKind, RuleOutput};

fn output(expr: PhysicalExpr, node: &RelNode) -> RuleOutput {
    RuleOutput {
        expr: RelExpr::Physical(expr),
        children: node.children.iter().copied().map(RuleChild::Group).collect(),
    }
}

#[derive(Debug)]
pub struct BindableScanRule;

impl OptimizerRule for BindableScanRule {
    fn name(&self) -> &'static str {
        "BindableScan"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Implementation
    }

    fn matches(&self, node: &RelNode, _memo: &Memo) -> bool {
        matches!(node.expr, RelExpr::Logical(LogicalExpr::Scan(_)))
    }

    fn apply(&self, node: &RelNode, _memo: &Memo) -> Result<Vec<RuleOutput>> {
        match &node.expr {
            RelExpr::Logical(LogicalExpr::Scan(scan)) => {
                Ok(vec![output(PhysicalExpr::Scan(scan.clone()), node)])
            }
            _ => Ok(Vec::new()),
        }
    }
}

#[derive(Debug)]
pub struct BindableFilterRule;

impl OptimizerRule for BindableFilterRule {
    fn name(&self) -> &'static str {
        "BindableFilter"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Implementation
    }

    fn matches(&self, node: &RelNode, _memo: &Memo) -> bool {
        matches!(node.expr, RelExpr::Logical(LogicalExpr::Filter { .. }))
    }

    fn apply(&self, node: &RelNode, _memo: &Memo) -> Result<Vec<RuleOutput>> {
        match &node.expr {
            RelExpr::Logical(LogicalExpr::Filter { predicate }) => Ok(vec![output(
                PhysicalExpr::Filter {
                    predicate: predicate.clone(),
                },
                node,
            )]),
            _ => Ok(Vec::new()),
        }
    }
}

#[derive(Debug)]
pub struct BindableProjectRule;

impl OptimizerRule for BindableProjectRule {
    fn name(&self) -> &'static str {
        "BindableProject"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Implementation
    }

    fn matches(&self, node: &RelNode, _memo: &Memo) -> bool {
        matches!(node.expr, RelExpr::Logical(LogicalExpr::Project { .. }))
    }

    fn apply(&self, node: &RelNode, _memo: &Memo) -> Result<Vec<RuleOutput>> {
        match &node.expr {
            RelExpr::Logical(LogicalExpr::Project { exprs, names }) => Ok(vec![output(
                PhysicalExpr::Project {
                    exprs: exprs.clone(),
                    names: names.clone(),
                },
                node,
            )]),
            _ => Ok(Vec::new()),
        }
    }
}

/// Implements joins as nested loops, plus a hash join alternative when the
/// condition is entirely equi-comparisons between the two sides. The cost
/// model picks between them.
#[derive(Debug)]
pub struct BindableJoinRule;

impl BindableJoinRule {
    /// Split an equi-join condition into per-side key expressions.
    ///
    /// Returns None unless every conjunct is an equality with one side's
    /// columns entirely in the left input and the other side's entirely in
    /// the right. Right-side keys are rebased to the right row.
    fn extract_equi_keys(
        condition: &Expression,
        left_arity: usize,
    ) -> Option<(Vec<Expression>, Vec<Expression>)> {
        let mut conjuncts = Vec::new();
        split_conjunction(condition.clone(), &mut conjuncts);

        let mut left_keys = Vec::new();
        let mut right_keys = Vec::new();

        for conjunct in conjuncts {
            let cmp = match conjunct {
                Expression::Comparison(cmp) if cmp.op == ComparisonOperator::Eq => cmp,
                _ => return None,
            };

            let left_bounds = cmp.left.column_bounds()?;
            let right_bounds = cmp.right.column_bounds()?;

            if left_bounds.1 < left_arity && right_bounds.0 >= left_arity {
                left_keys.push(*cmp.left);
                right_keys.push(cmp.right.rebase_columns(left_arity));
            } else if right_bounds.1 < left_arity && left_bounds.0 >= left_arity {
                left_keys.push(*cmp.right);
                right_keys.push(cmp.left.rebase_columns(left_arity));
            } else {
                return None;
            }
        }

        Some((left_keys, right_keys))
    }
}

impl OptimizerRule for BindableJoinRule {
    fn name(&self) -> &'static str {
        "BindableJoin"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Implementation
    }

    fn matches(&self, node: &RelNode, _memo: &Memo) -> bool {
        matches!(
            node.expr,
            RelExpr::Logical(LogicalExpr::Join { .. }) | RelExpr::Logical(LogicalExpr::CrossJoin)
        )
    }

    fn apply(&self, node: &RelNode, memo: &Memo) -> Result<Vec<RuleOutput>> {
        match &node.expr {
            RelExpr::Logical(LogicalExpr::Join {
                join_type,
                condition,
            }) => {
                let mut outputs = vec![output(
                    PhysicalExpr::NestedLoopJoin {
                        join_type: *join_type,
                        condition: Some(condition.clone()),
                    },
                    node,
                )];

                let left_arity = match node.children.first() {
                    Some(left) => memo.group(*left).schema.num_columns(),
                    None => return Ok(outputs),
                };
                if let Some((left_keys, right_keys)) =
                    Self::extract_equi_keys(condition, left_arity)
                {
                    outputs.push(output(
                        PhysicalExpr::HashJoin {
                            join_type: *join_type,
                            left_keys,
                            right_keys,
                        },
                        node,
                    ));
                }

                Ok(outputs)
            }
            RelExpr::Logical(LogicalExpr::CrossJoin) => Ok(vec![output(
                PhysicalExpr::NestedLoopJoin {
                    join_type: crate::logical::operator::JoinType::Inner,
                    condition: None,
                },
                node,
            )]),
            _ => Ok(Vec::new()),
        }
    }
}

#[derive(Debug)]
pub struct BindableSortRule;

impl OptimizerRule for BindableSortRule {
    fn name(&self) -> &'static str {
        "BindableSort"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Implementation
    }

    fn matches(&self, node: &RelNode, _memo: &Memo) -> bool {
        matches!(node.expr, RelExpr::Logical(LogicalExpr::Sort { .. }))
    }

    fn apply(&self, node: &RelNode, _memo: &Memo) -> Result<Vec<RuleOutput>> {
        match &node.expr {
            RelExpr::Logical(LogicalExpr::Sort { keys }) => Ok(vec![output(
                PhysicalExpr::Sort { keys: keys.clone() },
                node,
            )]),
            _ => Ok(Vec::new()),
        }
    }
}

#[derive(Debug)]
pub struct BindableLimitRule;

impl OptimizerRule for BindableLimitRule {
    fn name(&self) -> &'static str {
        "BindableLimit"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Implementation
    }

    fn matches(&self, node: &RelNode, _memo: &Memo) -> bool {
        matches!(node.expr, RelExpr::Logical(LogicalExpr::Limit { .. }))
    }

    fn apply(&self, node: &RelNode, _memo: &Memo) -> Result<Vec<RuleOutput>> {
        match &node.expr {
            RelExpr::Logical(LogicalExpr::Limit { limit, offset }) => Ok(vec![output(
                PhysicalExpr::Limit {
                    limit: *limit,
                    offset: *offset,
                },
                node,
            )]),
            _ => Ok(Vec::new()),
        }
    }
}

#[derive(Debug)]
pub struct BindableEmptyRule;

impl OptimizerRule for BindableEmptyRule {
    fn name(&self) -> &'static str {
        "BindableEmpty"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Implementation
    }

    fn matches(&self, node: &RelNode, _memo: &Memo) -> bool {
        matches!(node.expr, RelExpr::Logical(LogicalExpr::Empty))
    }

    fn apply(&self, node: &RelNode, _memo: &Memo) -> Result<Vec<RuleOutput>> {
        Ok(vec![output(PhysicalExpr::Empty, node)])
    }
}
