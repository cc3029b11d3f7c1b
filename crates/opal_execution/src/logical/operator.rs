use std::fmt;
use std::sync::Arc;

use opal_error::Result;

use crate::database::catalog::TableEntry;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::Expression;
use crate::types::field::{Field, Schema};

pub trait LogicalNode {
    /// Get the output row type of the operator, computed bottom-up.
    fn output_schema(&self) -> Result<Schema>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinType {
    Inner,
    Left,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inner => write!(f, "INNER"),
            Self::Left => write!(f, "LEFT"),
        }
    }
}

/// A sort key over the input's columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderByExpr {
    /// Column in the input row to order by.
    pub column: usize,
    pub desc: bool,
    pub nulls_first: bool,
}

impl fmt::Display for OrderByExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} NULLS {}",
            self.column,
            if self.desc { "DESC" } else { "ASC" },
            if self.nulls_first { "FIRST" } else { "LAST" },
        )
    }
}

#[derive(Debug, Clone)]
pub enum LogicalOperator {
    Projection(Projection),
    Filter(Filter),
    Order(Order),
    Join(Join),
    CrossJoin(CrossJoin),
    Limit(Limit),
    Scan(Scan),
    /// Operator that produces a single row with no columns.
    ///
    /// Used for queries without a FROM clause.
    Empty,
}

impl LogicalOperator {
    pub fn output_schema(&self) -> Result<Schema> {
        match self {
            Self::Projection(n) => n.output_schema(),
            Self::Filter(n) => n.output_schema(),
            Self::Order(n) => n.output_schema(),
            Self::Join(n) => n.output_schema(),
            Self::CrossJoin(n) => n.output_schema(),
            Self::Limit(n) => n.output_schema(),
            Self::Scan(n) => n.output_schema(),
            Self::Empty => Ok(Schema::empty()),
        }
    }

    pub fn children(&self) -> Vec<&LogicalOperator> {
        match self {
            Self::Projection(n) => vec![&n.input],
            Self::Filter(n) => vec![&n.input],
            Self::Order(n) => vec![&n.input],
            Self::Join(n) => vec![&n.left, &n.right],
            Self::CrossJoin(n) => vec![&n.left, &n.right],
            Self::Limit(n) => vec![&n.input],
            Self::Scan(_) | Self::Empty => Vec::new(),
        }
    }
}

impl Explainable for LogicalOperator {
    fn explain_entry(&self, conf: ExplainConfig) -> ExplainEntry {
        match self {
            Self::Projection(n) => n.explain_entry(conf),
            Self::Filter(n) => n.explain_entry(conf),
            Self::Order(n) => n.explain_entry(conf),
            Self::Join(n) => n.explain_entry(conf),
            Self::CrossJoin(n) => n.explain_entry(conf),
            Self::Limit(n) => n.explain_entry(conf),
            Self::Scan(n) => n.explain_entry(conf),
            Self::Empty => ExplainEntry::new("Empty"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Projection {
    pub exprs: Vec<Expression>,
    /// Output column names, same length as `exprs`.
    pub names: Vec<String>,
    pub input: Box<LogicalOperator>,
}

impl LogicalNode for Projection {
    fn output_schema(&self) -> Result<Schema> {
        let current = self.input.output_schema()?;
        let fields = self
            .exprs
            .iter()
            .zip(&self.names)
            .map(|(expr, name)| {
                let nullable = match expr {
                    Expression::Column(col) => current
                        .fields
                        .get(col.column)
                        .map(|f| f.nullable)
                        .unwrap_or(true),
                    _ => true,
                };
                Field::new(name.clone(), expr.datatype(), nullable)
            })
            .collect::<Vec<_>>();
        Ok(Schema::new(fields))
    }
}

impl Explainable for Projection {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("Projection").with_values("expressions", &self.exprs)
    }
}

#[derive(Debug, Clone)]
pub struct Filter {
    pub predicate: Expression,
    pub input: Box<LogicalOperator>,
}

impl LogicalNode for Filter {
    fn output_schema(&self) -> Result<Schema> {
        self.input.output_schema()
    }
}

impl Explainable for Filter {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("Filter").with_value("predicate", &self.predicate)
    }
}

#[derive(Debug, Clone)]
pub struct Order {
    pub exprs: Vec<OrderByExpr>,
    pub input: Box<LogicalOperator>,
}

impl LogicalNode for Order {
    fn output_schema(&self) -> Result<Schema> {
        self.input.output_schema()
    }
}

impl Explainable for Order {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("Order").with_values("expressions", &self.exprs)
    }
}

#[derive(Debug, Clone)]
pub struct Join {
    pub left: Box<LogicalOperator>,
    pub right: Box<LogicalOperator>,
    pub join_type: JoinType,
    /// Join condition bound against the concatenated left and right rows.
    pub condition: Expression,
}

impl LogicalNode for Join {
    fn output_schema(&self) -> Result<Schema> {
        let left = self.left.output_schema()?;
        let right = self.right.output_schema()?;
        Ok(Schema::merge(
            &left,
            &right,
            self.join_type == JoinType::Left,
        ))
    }
}

impl Explainable for Join {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("Join")
            .with_value("join_type", self.join_type)
            .with_value("condition", &self.condition)
    }
}

#[derive(Debug, Clone)]
pub struct CrossJoin {
    pub left: Box<LogicalOperator>,
    pub right: Box<LogicalOperator>,
}

impl LogicalNode for CrossJoin {
    fn output_schema(&self) -> Result<Schema> {
        let left = self.left.output_schema()?;
        let right = self.right.output_schema()?;
        Ok(Schema::merge(&left, &right, false))
    }
}

impl Explainable for CrossJoin {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("CrossJoin")
    }
}

#[derive(Debug, Clone)]
pub struct Limit {
    /// Max number of rows to emit. None when only an offset was given.
    pub limit: Option<usize>,
    pub offset: usize,
    pub input: Box<LogicalOperator>,
}

impl LogicalNode for Limit {
    fn output_schema(&self) -> Result<Schema> {
        self.input.output_schema()
    }
}

impl Explainable for Limit {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        let mut ent = ExplainEntry::new("Limit");
        if let Some(limit) = self.limit {
            ent = ent.with_value("limit", limit);
        }
        if self.offset > 0 {
            ent = ent.with_value("offset", self.offset);
        }
        ent
    }
}

/// Represents a scan of a catalog table.
#[derive(Debug, Clone)]
pub struct Scan {
    /// Name of the catalog schema the table was resolved in.
    pub schema: String,
    /// The resolved table.
    pub source: Arc<TableEntry>,
}

impl LogicalNode for Scan {
    fn output_schema(&self) -> Result<Schema> {
        Ok(self.source.schema.clone())
    }
}

impl Explainable for Scan {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("Scan").with_value("source", format!("{}.{}", self.schema, self.source.name))
    }
}
