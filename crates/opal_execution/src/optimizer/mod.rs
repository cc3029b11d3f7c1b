//! Cost-based plan optimization.
//!
//! The optimizer copies the logical plan into a memo of equivalence classes,
//! expands the space with transformation rules, implements each class with
//! physical alternatives, and extracts the cheapest plan reaching the target
//! convention.
pub mod cost;
pub mod memo;
pub mod rule;
pub mod rules;

use std::fmt;

use opal_error::{OpalError, Result};
use tracing::{debug, trace};

use crate::expr::physical::planner::PhysicalExpressionPlanner;
use crate::expr::{split_conjunction, ComparisonOperator, Expression};
use crate::logical::operator::LogicalOperator;
use crate::physical::plans::{
    PhysicalEmpty, PhysicalFilter, PhysicalHashJoin, PhysicalLimit, PhysicalNestedLoopJoin,
    PhysicalOperator, PhysicalProject, PhysicalScan, PhysicalSort,
};

use cost::{Cost, CostConfig};
use memo::{ExprId, GroupId, LogicalExpr, Memo, PhysicalExpr, RelExpr, RelNode, ScanExpr, Winner};
use rule::{NewExpr, OptimizerRule, RuleChild, RuleKind, RuleSet};

/// Tag marking which execution strategy a physical operator targets.
///
/// Operators under different conventions cannot be combined; the optimizer
/// only selects plans whose entire tree reaches the target convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Convention {
    /// Directly interpretable operators bound to row streams.
    Bindable,
}

impl fmt::Display for Convention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bindable => write!(f, "BINDABLE"),
        }
    }
}

#[derive(Debug, Default)]
pub struct Optimizer {
    pub config: CostConfig,
}

impl Optimizer {
    pub fn new(config: CostConfig) -> Self {
        Optimizer { config }
    }

    /// Run a logical plan through the rule set, returning the lowest-cost
    /// physical plan under the target convention.
    pub fn optimize(
        &self,
        plan: LogicalOperator,
        rules: &RuleSet,
        target: Convention,
    ) -> Result<PhysicalOperator> {
        let mut memo = Memo::new();
        let root = memo.insert_plan(plan)?;

        self.optimize_group(&mut memo, rules, root, target)?;

        debug!(groups = memo.num_groups(), "optimization finished");

        self.extract(&memo, root, target)
    }

    fn optimize_group(
        &self,
        memo: &mut Memo,
        rules: &RuleSet,
        group_id: GroupId,
        target: Convention,
    ) -> Result<()> {
        if memo.group(group_id).best.contains_key(&target) {
            return Ok(());
        }
        self.explore_group(memo, rules, group_id)?;
        self.implement_group(memo, rules, group_id, target)
    }

    /// Apply transformation rules until no new alternative appears.
    ///
    /// Iterates the group's expressions by index since rule applications
    /// append new members; per-(expression, rule) marks make the loop reach
    /// a fixed point.
    fn explore_group(&self, memo: &mut Memo, rules: &RuleSet, group_id: GroupId) -> Result<()> {
        if memo.group(group_id).explored {
            return Ok(());
        }
        memo.group_mut(group_id).explored = true;

        let mut idx = 0;
        while idx < memo.group(group_id).exprs.len() {
            let expr_id = memo.group(group_id).exprs[idx];
            idx += 1;

            // Explore inputs first so alternatives there are visible to
            // rules matching through child groups.
            let children = memo.node(expr_id).children.clone();
            for child in children {
                self.explore_group(memo, rules, child)?;
            }

            for rule in rules.rules(RuleKind::Transformation) {
                self.fire_rule(memo, rule.as_ref(), expr_id, group_id)?;
            }
        }

        Ok(())
    }

    /// Apply a single rule to an expression, adding any outputs to the
    /// expression's group.
    fn fire_rule(
        &self,
        memo: &mut Memo,
        rule: &dyn OptimizerRule,
        expr_id: ExprId,
        group_id: GroupId,
    ) -> Result<Vec<ExprId>> {
        if memo.rule_applied(expr_id, rule.name()) {
            return Ok(Vec::new());
        }
        let node = memo.node(expr_id).clone();
        if !rule.matches(&node, memo) {
            return Ok(Vec::new());
        }

        trace!(rule = rule.name(), expr = %expr_id, "applying rule");
        let outputs = rule.apply(&node, memo)?;
        memo.mark_rule_applied(expr_id, rule.name());

        let mut added = Vec::with_capacity(outputs.len());
        for out in outputs {
            let children = out
                .children
                .into_iter()
                .map(|child| self.materialize_child(memo, child))
                .collect::<Result<Vec<_>>>()?;
            added.push(memo.add_expr(
                group_id,
                RelNode {
                    expr: out.expr,
                    children,
                },
            ));
        }
        Ok(added)
    }

    /// Place a rule-produced sub-expression into the memo, creating groups
    /// for new children bottom-up.
    fn materialize_child(&self, memo: &mut Memo, child: RuleChild) -> Result<GroupId> {
        match child {
            RuleChild::Group(group) => Ok(group),
            RuleChild::New(new) => {
                let NewExpr { expr, children } = *new;
                let children = children
                    .into_iter()
                    .map(|child| self.materialize_child(memo, child))
                    .collect::<Result<Vec<_>>>()?;

                let child_schemas: Vec<_> =
                    children.iter().map(|id| &memo.group(*id).schema).collect();
                let schema = match &expr {
                    RelExpr::Logical(logical) => logical.derive_schema(&child_schemas)?,
                    RelExpr::Physical(_) => {
                        return Err(OpalError::Internal(
                            "transformation rules must produce logical expressions".to_string(),
                        ))
                    }
                };

                let group = memo.add_group(schema);
                memo.add_expr(group, RelNode { expr, children });
                Ok(group)
            }
        }
    }

    /// Implement every logical member of the group and record the cheapest
    /// physical alternative per convention.
    fn implement_group(
        &self,
        memo: &mut Memo,
        rules: &RuleSet,
        group_id: GroupId,
        target: Convention,
    ) -> Result<()> {
        self.derive_row_estimate(memo, group_id)?;

        let mut idx = 0;
        while idx < memo.group(group_id).exprs.len() {
            let expr_id = memo.group(group_id).exprs[idx];
            idx += 1;

            if !memo.node(expr_id).expr.is_logical() {
                continue;
            }

            for rule in rules.rules(RuleKind::Implementation) {
                let added = self.fire_rule(memo, rule.as_ref(), expr_id, group_id)?;

                for phys_id in added {
                    self.cost_and_record(memo, rules, phys_id, group_id, target)?;
                }
            }
        }

        Ok(())
    }

    /// Cost a physical alternative and record it as the group winner if it
    /// beats the current best.
    fn cost_and_record(
        &self,
        memo: &mut Memo,
        rules: &RuleSet,
        phys_id: ExprId,
        group_id: GroupId,
        target: Convention,
    ) -> Result<()> {
        let node = memo.node(phys_id).clone();
        let phys = match &node.expr {
            RelExpr::Physical(phys) => phys.clone(),
            _ => return Ok(()),
        };
        if phys.convention() != target {
            return Ok(());
        }

        // All inputs must themselves reach the target convention.
        let mut children_cost = 0.0;
        let mut child_rows = Vec::with_capacity(node.children.len());
        for child in &node.children {
            self.optimize_group(memo, rules, *child, target)?;
            match memo.group(*child).best.get(&target) {
                Some(winner) => {
                    children_cost += winner.cost.value;
                    child_rows.push(winner.cost.rows);
                }
                None => return Ok(()), // Infeasible alternative.
            }
        }

        let rows = memo
            .group(group_id)
            .row_estimate
            .unwrap_or(self.config.default_scan_rows);
        let cost = Cost::new(rows, children_cost + self.local_cost(&phys, &child_rows, rows));

        let replace = match memo.group(group_id).best.get(&target) {
            None => true,
            Some(current) => {
                let current_pref = match &memo.node(current.expr).expr {
                    RelExpr::Physical(p) => p.preference(),
                    _ => u8::MAX,
                };
                better(
                    (cost, phys.preference()),
                    (current.cost, current_pref),
                )
            }
        };

        if replace {
            trace!(group = %group_id, expr = %phys_id, %cost, "new best plan");
            memo.group_mut(group_id).best.insert(
                target,
                Winner {
                    expr: phys_id,
                    cost,
                },
            );
        }

        Ok(())
    }

    /// Per-operator cost, proportional to rows processed.
    fn local_cost(&self, phys: &PhysicalExpr, child_rows: &[f64], output_rows: f64) -> f64 {
        let child = |idx: usize| child_rows.get(idx).copied().unwrap_or(0.0);
        match phys {
            PhysicalExpr::Scan(scan) => scan
                .cardinality
                .map(|c| c as f64)
                .unwrap_or(self.config.default_scan_rows),
            PhysicalExpr::Filter { .. } => child(0),
            PhysicalExpr::Project { .. } => child(0),
            // Every left row scans every right row.
            PhysicalExpr::NestedLoopJoin { .. } => child(0) * child(1),
            // Build on the right input, probe with the left.
            PhysicalExpr::HashJoin { .. } => child(0) + 2.0 * child(1),
            PhysicalExpr::Sort { .. } => {
                let rows = child(0).max(1.0);
                rows * rows.log2().max(1.0)
            }
            PhysicalExpr::Limit { .. } => output_rows,
            PhysicalExpr::Empty => 1.0,
        }
    }

    /// Estimate output cardinality for a group from its first logical
    /// member, recursing into child groups.
    fn derive_row_estimate(&self, memo: &mut Memo, group_id: GroupId) -> Result<f64> {
        if let Some(rows) = memo.group(group_id).row_estimate {
            return Ok(rows);
        }

        let expr_id = match memo.group(group_id).exprs.first() {
            Some(id) => *id,
            None => return Ok(self.config.default_scan_rows),
        };
        let node = memo.node(expr_id).clone();

        let rows = match &node.expr {
            RelExpr::Logical(logical) => match logical {
                LogicalExpr::Scan(scan) => scan
                    .cardinality
                    .map(|c| c as f64)
                    .unwrap_or(self.config.default_scan_rows),
                LogicalExpr::Filter { predicate } => {
                    let input = self.derive_row_estimate(memo, node.children[0])?;
                    input * self.selectivity(predicate)
                }
                LogicalExpr::Project { .. } | LogicalExpr::Sort { .. } => {
                    self.derive_row_estimate(memo, node.children[0])?
                }
                LogicalExpr::Join { .. } => {
                    let left = self.derive_row_estimate(memo, node.children[0])?;
                    let right = self.derive_row_estimate(memo, node.children[1])?;
                    (left * right * self.config.join_selectivity).max(1.0)
                }
                LogicalExpr::CrossJoin => {
                    let left = self.derive_row_estimate(memo, node.children[0])?;
                    let right = self.derive_row_estimate(memo, node.children[1])?;
                    left * right
                }
                LogicalExpr::Limit { limit, .. } => {
                    let input = self.derive_row_estimate(memo, node.children[0])?;
                    match limit {
                        Some(limit) => input.min(*limit as f64),
                        None => input,
                    }
                }
                LogicalExpr::Empty => 1.0,
            },
            RelExpr::Physical(_) => {
                return Err(OpalError::Internal(
                    "row estimation expects a logical expression".to_string(),
                ))
            }
        };

        memo.group_mut(group_id).row_estimate = Some(rows);
        Ok(rows)
    }

    /// Estimated fraction of rows surviving a predicate.
    fn selectivity(&self, predicate: &Expression) -> f64 {
        let mut conjuncts = Vec::new();
        split_conjunction(predicate.clone(), &mut conjuncts);

        conjuncts
            .iter()
            .map(|conjunct| match conjunct {
                Expression::Comparison(cmp) if cmp.op == ComparisonOperator::Eq => {
                    self.config.equality_selectivity
                }
                Expression::Comparison(_) => self.config.range_selectivity,
                _ => self.config.default_selectivity,
            })
            .product()
    }

    /// Build the owned physical plan tree from the group winners.
    fn extract(
        &self,
        memo: &Memo,
        group_id: GroupId,
        target: Convention,
    ) -> Result<PhysicalOperator> {
        let group = memo.group(group_id);
        let winner = group.best.get(&target).ok_or_else(|| OpalError::NoPlanFound {
            convention: target.to_string(),
        })?;

        let node = memo.node(winner.expr);
        let mut children = node
            .children
            .iter()
            .map(|child| self.extract(memo, *child, target))
            .collect::<Result<Vec<_>>>()?;

        let planner = PhysicalExpressionPlanner;
        let schema = group.schema.clone();
        let cost = winner.cost;

        let phys = match &node.expr {
            RelExpr::Physical(phys) => phys,
            _ => {
                return Err(OpalError::Internal(
                    "group winner is not a physical expression".to_string(),
                ))
            }
        };

        let mut next_child = || -> Result<Box<PhysicalOperator>> {
            if children.is_empty() {
                return Err(OpalError::Internal(
                    "physical expression missing child".to_string(),
                ));
            }
            Ok(Box::new(children.remove(0)))
        };

        Ok(match phys {
            PhysicalExpr::Scan(ScanExpr { schema: catalog_schema, table, .. }) => {
                PhysicalOperator::Scan(PhysicalScan {
                    catalog_schema: catalog_schema.clone(),
                    table: table.clone(),
                    schema,
                    cost,
                })
            }
            PhysicalExpr::Filter { predicate } => PhysicalOperator::Filter(PhysicalFilter {
                predicate: planner.plan(predicate),
                input: next_child()?,
                schema,
                cost,
            }),
            PhysicalExpr::Project { exprs, .. } => PhysicalOperator::Project(PhysicalProject {
                exprs: planner.plan_many(exprs),
                input: next_child()?,
                schema,
                cost,
            }),
            PhysicalExpr::NestedLoopJoin {
                join_type,
                condition,
            } => PhysicalOperator::NestedLoopJoin(PhysicalNestedLoopJoin {
                join_type: *join_type,
                condition: condition.as_ref().map(|c| planner.plan(c)),
                left: next_child()?,
                right: next_child()?,
                schema,
                cost,
            }),
            PhysicalExpr::HashJoin {
                join_type,
                left_keys,
                right_keys,
            } => PhysicalOperator::HashJoin(PhysicalHashJoin {
                join_type: *join_type,
                left_keys: planner.plan_many(left_keys),
                right_keys: planner.plan_many(right_keys),
                left: next_child()?,
                right: next_child()?,
                schema,
                cost,
            }),
            PhysicalExpr::Sort { keys } => PhysicalOperator::Sort(PhysicalSort {
                keys: keys.clone(),
                input: next_child()?,
                schema,
                cost,
            }),
            PhysicalExpr::Limit { limit, offset } => PhysicalOperator::Limit(PhysicalLimit {
                limit: *limit,
                offset: *offset,
                input: next_child()?,
                schema,
                cost,
            }),
            PhysicalExpr::Empty => PhysicalOperator::Empty(PhysicalEmpty { schema, cost }),
        })
    }
}

/// Whether a new alternative beats the current winner.
///
/// Lower cost wins; ties break on estimated rows, then the operator's
/// intrinsic preference rank, then first discovered.
fn better(new: (Cost, u8), current: (Cost, u8)) -> bool {
    const EPS: f64 = 1e-9;
    let (new_cost, new_pref) = new;
    let (cur_cost, cur_pref) = current;

    if new_cost.value < cur_cost.value - EPS {
        return true;
    }
    if new_cost.value > cur_cost.value + EPS {
        return false;
    }
    if new_cost.rows < cur_cost.rows - EPS {
        return true;
    }
    if new_cost.rows > cur_cost.rows + EPS {
        return false;
    }
    new_pref < cur_pref
}
