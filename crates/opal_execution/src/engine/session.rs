use std::sync::Arc;

use opal_error::{OpalError, Result};
use opal_parser::parser;
use tracing::debug;

use crate::binder::{BindConfig, Binder};
use crate::database::catalog::Catalog;
use crate::database::table::RowStream;
use crate::optimizer::rule::RuleSet;
use crate::optimizer::{Convention, Optimizer};
use crate::physical::plans::PhysicalOperator;
use crate::physical::DataContext;
use crate::planner::QueryPlanner;
use crate::types::field::Schema;

/// Session options.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Whether unquoted identifiers match case sensitively.
    pub case_sensitive: bool,
    /// Schema searched first for unqualified table names.
    pub default_schema: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            case_sensitive: true,
            default_schema: None,
        }
    }
}

/// The result of executing a query: the output row type plus the row
/// stream.
pub struct QueryResult {
    pub schema: Schema,
    pub rows: RowStream,
}

/// Compiles and executes queries against a catalog.
///
/// The whole pipeline is synchronous and single-threaded: parse, bind,
/// plan, optimize, then pull rows. The catalog must stay read-only while
/// any compiled plan is in use.
#[derive(Debug)]
pub struct Session {
    catalog: Arc<Catalog>,
    config: SessionConfig,
    optimizer: Optimizer,
    rules: RuleSet,
}

impl Session {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_config(catalog, SessionConfig::default())
    }

    pub fn with_config(catalog: Arc<Catalog>, config: SessionConfig) -> Self {
        Session {
            catalog,
            config,
            optimizer: Optimizer::default(),
            rules: RuleSet::standard(),
        }
    }

    /// Replace the rule set used for optimization.
    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Compile sql text into a physical plan.
    ///
    /// The text must contain exactly one SELECT statement. Any compilation
    /// error aborts before a single row is produced.
    pub fn compile(&self, sql: &str) -> Result<PhysicalOperator> {
        let mut statements = parser::parse(sql)?;
        let statement = match (statements.pop(), statements.is_empty()) {
            (Some(statement), true) => statement,
            (None, _) => {
                return Err(OpalError::syntax("empty sql statement", Default::default()))
            }
            _ => {
                return Err(OpalError::syntax(
                    "expected exactly one statement",
                    Default::default(),
                ))
            }
        };
        debug!("parsed statement");

        let bind_config = BindConfig {
            case_sensitive: self.config.case_sensitive,
            default_schema: self.config.default_schema.clone(),
        };
        let bound = Binder::new(&self.catalog, &bind_config).bind_statement(statement)?;

        let logical = QueryPlanner.plan_query(bound)?;

        let physical = self
            .optimizer
            .optimize(logical, &self.rules, Convention::Bindable)?;
        debug!(cost = %physical.cost(), "selected physical plan");

        Ok(physical)
    }

    /// Bind a compiled plan to the session catalog, producing a lazy row
    /// stream.
    ///
    /// Each call is independent: binding the same plan again re-executes it
    /// from scratch.
    pub fn bind(&self, plan: &PhysicalOperator) -> Result<RowStream> {
        let ctx = DataContext::new(&self.catalog);
        plan.bind(&ctx)
    }

    /// Compile and execute in one step.
    pub fn query(&self, sql: &str) -> Result<QueryResult> {
        let plan = self.compile(sql)?;
        let rows = self.bind(&plan)?;
        Ok(QueryResult {
            schema: plan.schema().clone(),
            rows,
        })
    }
}
