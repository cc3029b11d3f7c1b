use opal_error::Result;

use crate::expr::{conjunction_from, split_conjunction, Expression};
use crate::logical::operator::JoinType;
use crate::optimizer::memo::{ExprId, GroupId, LogicalExpr, Memo, RelExpr, RelNode};
use crate::optimizer::rule::{NewExpr, OptimizerRule, RuleChild, RuleKind, RuleOutput};

/// Pushes filter conjuncts beneath a join when they only reference one side.
///
/// `Filter(Join(L, R))` becomes a join over filtered inputs, with any
/// conjunct touching both sides left in a residual filter above the join.
/// For a left outer join only left-side conjuncts move: filtering the right
/// input below the join would resurrect rows the filter above would have
/// removed after null padding.
#[derive(Debug)]
pub struct FilterIntoJoinRule;

impl FilterIntoJoinRule {
    /// Find a join member of the filter's child group.
    fn find_join(node: &RelNode, memo: &Memo) -> Option<(ExprId, GroupId)> {
        let child = *node.children.first()?;
        memo.group(child)
            .exprs
            .iter()
            .find(|id| {
                matches!(
                    memo.node(**id).expr,
                    RelExpr::Logical(LogicalExpr::Join { .. })
                        | RelExpr::Logical(LogicalExpr::CrossJoin)
                )
            })
            .map(|id| (*id, child))
    }
}

impl OptimizerRule for FilterIntoJoinRule {
    fn name(&self) -> &'static str {
        "FilterIntoJoin"
    }

    fn kind(&self) -> RuleKind {
        RuleKind::Transformation
    }

    fn matches(&self, node: &RelNode, memo: &Memo) -> bool {
        matches!(node.expr, RelExpr::Logical(LogicalExpr::Filter { .. }))
            && Self::find_join(node, memo).is_some()
    }

    fn apply(&self, node: &RelNode, memo: &Memo) -> Result<Vec<RuleOutput>> {
        let predicate = match &node.expr {
            RelExpr::Logical(LogicalExpr::Filter { predicate }) => predicate.clone(),
            _ => return Ok(Vec::new()),
        };
        let (join_id, _) = match Self::find_join(node, memo) {
            Some(found) => found,
            None => return Ok(Vec::new()),
        };

        let join_node = memo.node(join_id);
        let (left_group, right_group) = match join_node.children.as_slice() {
            [left, right] => (*left, *right),
            _ => return Ok(Vec::new()),
        };
        let left_arity = memo.group(left_group).schema.num_columns();

        let left_outer = matches!(
            join_node.expr,
            RelExpr::Logical(LogicalExpr::Join {
                join_type: JoinType::Left,
                ..
            })
        );

        let mut conjuncts = Vec::new();
        split_conjunction(predicate, &mut conjuncts);

        let mut left_pushed = Vec::new();
        let mut right_pushed = Vec::new();
        let mut residual = Vec::new();

        for conjunct in conjuncts {
            match conjunct.column_bounds() {
                Some((_, max)) if max < left_arity => left_pushed.push(conjunct),
                Some((min, _)) if min >= left_arity && !left_outer => {
                    right_pushed.push(conjunct.rebase_columns(left_arity))
                }
                _ => residual.push(conjunct),
            }
        }

        if left_pushed.is_empty() && right_pushed.is_empty() {
            return Ok(Vec::new());
        }

        let filtered = |group: GroupId, pushed: Vec<Expression>| match conjunction_from(pushed) {
            Some(predicate) => RuleChild::New(Box::new(NewExpr {
                expr: RelExpr::Logical(LogicalExpr::Filter { predicate }),
                children: vec![RuleChild::Group(group)],
            })),
            None => RuleChild::Group(group),
        };

        let join = NewExpr {
            expr: memo.node(join_id).expr.clone(),
            children: vec![
                filtered(left_group, left_pushed),
                filtered(right_group, right_pushed),
            ],
        };

        // Any conjunct touching both sides stays in a filter above the join.
        let output = match conjunction_from(residual) {
            Some(predicate) => RuleOutput {
                expr: RelExpr::Logical(LogicalExpr::Filter { predicate }),
                children: vec![RuleChild::New(Box::new(join))],
            },
            None => RuleOutput {
                expr: join.expr,
                children: join.children,
            },
        };

        Ok(vec![output])
    }
}
