pub mod empty;
pub mod filter;
pub mod hash_join;
pub mod limit;
pub mod nested_loop_join;
pub mod project;
pub mod scan;
pub mod sort;

pub use empty::PhysicalEmpty;
pub use filter::PhysicalFilter;
pub use hash_join::PhysicalHashJoin;
pub use limit::PhysicalLimit;
pub use nested_loop_join::PhysicalNestedLoopJoin;
pub use project::PhysicalProject;
pub use scan::PhysicalScan;
pub use sort::PhysicalSort;

use opal_error::Result;

use crate::database::table::RowStream;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::optimizer::cost::Cost;
use crate::optimizer::Convention;
use crate::types::field::Schema;

use super::DataContext;

/// A node in an executable plan.
///
/// Every node carries its output row type, the convention it runs under,
/// and the cost estimate the optimizer selected it at. `bind` recursively
/// binds children and returns a lazy, single-pass row stream; rebinding
/// restarts execution from scratch.
#[derive(Debug, Clone)]
pub enum PhysicalOperator {
    Scan(PhysicalScan),
    Filter(PhysicalFilter),
    Project(PhysicalProject),
    NestedLoopJoin(PhysicalNestedLoopJoin),
    HashJoin(PhysicalHashJoin),
    Sort(PhysicalSort),
    Limit(PhysicalLimit),
    Empty(PhysicalEmpty),
}

impl PhysicalOperator {
    pub fn bind(&self, ctx: &DataContext<'_>) -> Result<RowStream> {
        match self {
            Self::Scan(n) => n.bind(ctx),
            Self::Filter(n) => n.bind(ctx),
            Self::Project(n) => n.bind(ctx),
            Self::NestedLoopJoin(n) => n.bind(ctx),
            Self::HashJoin(n) => n.bind(ctx),
            Self::Sort(n) => n.bind(ctx),
            Self::Limit(n) => n.bind(ctx),
            Self::Empty(n) => n.bind(ctx),
        }
    }

    pub fn schema(&self) -> &Schema {
        match self {
            Self::Scan(n) => &n.schema,
            Self::Filter(n) => &n.schema,
            Self::Project(n) => &n.schema,
            Self::NestedLoopJoin(n) => &n.schema,
            Self::HashJoin(n) => &n.schema,
            Self::Sort(n) => &n.schema,
            Self::Limit(n) => &n.schema,
            Self::Empty(n) => &n.schema,
        }
    }

    pub fn cost(&self) -> Cost {
        match self {
            Self::Scan(n) => n.cost,
            Self::Filter(n) => n.cost,
            Self::Project(n) => n.cost,
            Self::NestedLoopJoin(n) => n.cost,
            Self::HashJoin(n) => n.cost,
            Self::Sort(n) => n.cost,
            Self::Limit(n) => n.cost,
            Self::Empty(n) => n.cost,
        }
    }

    pub fn convention(&self) -> Convention {
        Convention::Bindable
    }

    pub fn children(&self) -> Vec<&PhysicalOperator> {
        match self {
            Self::Scan(_) | Self::Empty(_) => Vec::new(),
            Self::Filter(n) => vec![&n.input],
            Self::Project(n) => vec![&n.input],
            Self::NestedLoopJoin(n) => vec![&n.left, &n.right],
            Self::HashJoin(n) => vec![&n.left, &n.right],
            Self::Sort(n) => vec![&n.input],
            Self::Limit(n) => vec![&n.input],
        }
    }
}

impl Explainable for PhysicalOperator {
    fn explain_entry(&self, conf: ExplainConfig) -> ExplainEntry {
        let ent = match self {
            Self::Scan(n) => n.explain_entry(conf),
            Self::Filter(n) => n.explain_entry(conf),
            Self::Project(n) => n.explain_entry(conf),
            Self::NestedLoopJoin(n) => n.explain_entry(conf),
            Self::HashJoin(n) => n.explain_entry(conf),
            Self::Sort(n) => n.explain_entry(conf),
            Self::Limit(n) => n.explain_entry(conf),
            Self::Empty(n) => n.explain_entry(conf),
        };
        if conf.verbose {
            ent.with_value("cost", self.cost())
        } else {
            ent
        }
    }
}
