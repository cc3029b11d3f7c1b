use std::fmt;

use ahash::{HashMap, HashMapExt, HashSet, HashSetExt};
use opal_error::{OpalError, Result};

use crate::expr::Expression;
use crate::logical::operator::{JoinType, LogicalOperator, OrderByExpr};
use crate::types::field::{Field, Schema};

use super::cost::Cost;
use super::Convention;

/// Identifier for an equivalence class of plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub usize);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G{}", self.0)
    }
}

/// Identifier for a single expression within the memo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExprId(pub usize);

impl fmt::Display for ExprId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

/// A scan's payload in the memo.
///
/// Carries everything later stages need so the memo never goes back to the
/// catalog: names for re-resolution at bind time, the row type, and the
/// cardinality hint for costing.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanExpr {
    pub schema: String,
    pub table: String,
    pub row_schema: Schema,
    pub cardinality: Option<usize>,
}

/// A logical operator stripped of its children.
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalExpr {
    Scan(ScanExpr),
    Filter {
        predicate: Expression,
    },
    Project {
        exprs: Vec<Expression>,
        names: Vec<String>,
    },
    Join {
        join_type: JoinType,
        condition: Expression,
    },
    CrossJoin,
    Sort {
        keys: Vec<OrderByExpr>,
    },
    Limit {
        limit: Option<usize>,
        offset: usize,
    },
    Empty,
}

impl LogicalExpr {
    /// Compute the row type this operator produces from its children's row
    /// types.
    pub fn derive_schema(&self, children: &[&Schema]) -> Result<Schema> {
        let child = |idx: usize| -> Result<&Schema> {
            children
                .get(idx)
                .copied()
                .ok_or_else(|| OpalError::Internal("missing child schema".to_string()))
        };

        Ok(match self {
            Self::Scan(scan) => scan.row_schema.clone(),
            Self::Filter { .. } => child(0)?.clone(),
            Self::Project { exprs, names } => {
                let input = child(0)?;
                let fields = exprs
                    .iter()
                    .zip(names)
                    .map(|(expr, name)| {
                        let nullable = match expr {
                            Expression::Column(col) => input
                                .fields
                                .get(col.column)
                                .map(|f| f.nullable)
                                .unwrap_or(true),
                            _ => true,
                        };
                        Field::new(name.clone(), expr.datatype(), nullable)
                    })
                    .collect::<Vec<_>>();
                Schema::new(fields)
            }
            Self::Join { join_type, .. } => Schema::merge(
                child(0)?,
                child(1)?,
                *join_type == JoinType::Left,
            ),
            Self::CrossJoin => Schema::merge(child(0)?, child(1)?, false),
            Self::Sort { .. } => child(0)?.clone(),
            Self::Limit { .. } => child(0)?.clone(),
            Self::Empty => Schema::empty(),
        })
    }
}

/// A physical operator stripped of its children, tagged with the convention
/// its implementation runs under.
#[derive(Debug, Clone, PartialEq)]
pub enum PhysicalExpr {
    Scan(ScanExpr),
    Filter {
        predicate: Expression,
    },
    Project {
        exprs: Vec<Expression>,
        names: Vec<String>,
    },
    NestedLoopJoin {
        join_type: JoinType,
        condition: Option<Expression>,
    },
    HashJoin {
        join_type: JoinType,
        /// Key expressions over the left input row.
        left_keys: Vec<Expression>,
        /// Key expressions over the right input row.
        right_keys: Vec<Expression>,
    },
    Sort {
        keys: Vec<OrderByExpr>,
    },
    Limit {
        limit: Option<usize>,
        offset: usize,
    },
    Empty,
}

impl PhysicalExpr {
    pub fn convention(&self) -> Convention {
        Convention::Bindable
    }

    /// Rank used as the final deterministic tie-breaker between equally
    /// costed alternatives. Lower is preferred.
    pub fn preference(&self) -> u8 {
        match self {
            Self::HashJoin { .. } => 0,
            Self::NestedLoopJoin { .. } => 1,
            _ => 0,
        }
    }
}

/// An operator in the search space.
#[derive(Debug, Clone, PartialEq)]
pub enum RelExpr {
    Logical(LogicalExpr),
    Physical(PhysicalExpr),
}

impl RelExpr {
    pub fn is_logical(&self) -> bool {
        matches!(self, RelExpr::Logical(_))
    }
}

/// An expression plus its children, which are equivalence classes rather
/// than concrete plans.
#[derive(Debug, Clone, PartialEq)]
pub struct RelNode {
    pub expr: RelExpr,
    pub children: Vec<GroupId>,
}

/// The cheapest known implementation of a group under some convention.
#[derive(Debug, Clone, Copy)]
pub struct Winner {
    pub expr: ExprId,
    pub cost: Cost,
}

/// An equivalence class: all plans known to produce the same rows.
#[derive(Debug)]
pub struct Group {
    pub exprs: Vec<ExprId>,
    /// Row type shared by every member. Rule applications must preserve it.
    pub schema: Schema,
    /// Estimated output cardinality, derived lazily during costing.
    pub row_estimate: Option<f64>,
    pub explored: bool,
    pub best: HashMap<Convention, Winner>,
}

/// The optimizer's working set: an index-addressed table of equivalence
/// classes.
///
/// Private to a single optimize call and discarded afterwards.
#[derive(Debug, Default)]
pub struct Memo {
    groups: Vec<Group>,
    nodes: Vec<RelNode>,
    /// (expression, rule name) pairs already applied, to reach a fixed
    /// point without reapplying rules.
    applied: HashSet<(usize, &'static str)>,
}

impl Memo {
    pub fn new() -> Self {
        Memo {
            groups: Vec::new(),
            nodes: Vec::new(),
            applied: HashSet::new(),
        }
    }

    /// Copy a logical plan into the memo, one group per operator.
    pub fn insert_plan(&mut self, plan: LogicalOperator) -> Result<GroupId> {
        let schema = plan.output_schema()?;

        let (expr, children) = match plan {
            LogicalOperator::Scan(scan) => (
                LogicalExpr::Scan(ScanExpr {
                    schema: scan.schema,
                    table: scan.source.name.clone(),
                    row_schema: scan.source.schema.clone(),
                    cardinality: scan.source.table.cardinality(),
                }),
                Vec::new(),
            ),
            LogicalOperator::Filter(filter) => (
                LogicalExpr::Filter {
                    predicate: filter.predicate,
                },
                vec![self.insert_plan(*filter.input)?],
            ),
            LogicalOperator::Projection(projection) => (
                LogicalExpr::Project {
                    exprs: projection.exprs,
                    names: projection.names,
                },
                vec![self.insert_plan(*projection.input)?],
            ),
            LogicalOperator::Join(join) => (
                LogicalExpr::Join {
                    join_type: join.join_type,
                    condition: join.condition,
                },
                vec![
                    self.insert_plan(*join.left)?,
                    self.insert_plan(*join.right)?,
                ],
            ),
            LogicalOperator::CrossJoin(join) => (
                LogicalExpr::CrossJoin,
                vec![
                    self.insert_plan(*join.left)?,
                    self.insert_plan(*join.right)?,
                ],
            ),
            LogicalOperator::Order(order) => (
                LogicalExpr::Sort { keys: order.exprs },
                vec![self.insert_plan(*order.input)?],
            ),
            LogicalOperator::Limit(limit) => (
                LogicalExpr::Limit {
                    limit: limit.limit,
                    offset: limit.offset,
                },
                vec![self.insert_plan(*limit.input)?],
            ),
            LogicalOperator::Empty => (LogicalExpr::Empty, Vec::new()),
        };

        let group = self.add_group(schema);
        self.add_expr(
            group,
            RelNode {
                expr: RelExpr::Logical(expr),
                children,
            },
        );
        Ok(group)
    }

    pub fn add_group(&mut self, schema: Schema) -> GroupId {
        let id = GroupId(self.groups.len());
        self.groups.push(Group {
            exprs: Vec::new(),
            schema,
            row_estimate: None,
            explored: false,
            best: HashMap::new(),
        });
        id
    }

    /// Add an expression to a group, deduplicating against existing members.
    pub fn add_expr(&mut self, group: GroupId, node: RelNode) -> ExprId {
        if let Some(existing) = self.groups[group.0]
            .exprs
            .iter()
            .find(|id| self.nodes[id.0] == node)
        {
            return *existing;
        }
        let id = ExprId(self.nodes.len());
        self.nodes.push(node);
        self.groups[group.0].exprs.push(id);
        id
    }

    pub fn group(&self, id: GroupId) -> &Group {
        &self.groups[id.0]
    }

    pub fn group_mut(&mut self, id: GroupId) -> &mut Group {
        &mut self.groups[id.0]
    }

    pub fn node(&self, id: ExprId) -> &RelNode {
        &self.nodes[id.0]
    }

    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn rule_applied(&self, expr: ExprId, rule: &'static str) -> bool {
        self.applied.contains(&(expr.0, rule))
    }

    pub fn mark_rule_applied(&mut self, expr: ExprId, rule: &'static str) {
        self.applied.insert((expr.0, rule));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::datatype::DataType;

    fn scan(table: &str) -> RelNode {
        RelNode {
            expr: RelExpr::Logical(LogicalExpr::Scan(ScanExpr {
                schema: "hr".to_string(),
                table: table.to_string(),
                row_schema: Schema::new([Field::new("id", DataType::Int32, false)]),
                cardinality: Some(3),
            })),
            children: Vec::new(),
        }
    }

    #[test]
    fn add_expr_dedups() {
        let mut memo = Memo::new();
        let group = memo.add_group(Schema::new([Field::new("id", DataType::Int32, false)]));

        let first = memo.add_expr(group, scan("employees"));
        let dup = memo.add_expr(group, scan("employees"));
        let other = memo.add_expr(group, scan("sales"));

        assert_eq!(first, dup);
        assert_ne!(first, other);
        assert_eq!(2, memo.group(group).exprs.len());
    }

    #[test]
    fn rule_marks() {
        let mut memo = Memo::new();
        let group = memo.add_group(Schema::empty());
        let expr = memo.add_expr(group, scan("employees"));

        assert!(!memo.rule_applied(expr, "TestRule"));
        memo.mark_rule_applied(expr, "TestRule");
        assert!(memo.rule_applied(expr, "TestRule"));
    }
}
