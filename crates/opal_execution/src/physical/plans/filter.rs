use opal_error::Result;

use crate::database::table::RowStream;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::physical::PhysicalScalarExpression;
use crate::optimizer::cost::Cost;
use crate::physical::DataContext;
use crate::types::field::Schema;

use super::PhysicalOperator;

/// Emits only rows whose predicate evaluates to true.
///
/// Null predicate results count as not-true and exclude the row.
#[derive(Debug, Clone)]
pub struct PhysicalFilter {
    pub predicate: PhysicalScalarExpression,
    pub input: Box<PhysicalOperator>,
    pub schema: Schema,
    pub cost: Cost,
}

impl PhysicalFilter {
    pub fn bind(&self, ctx: &DataContext<'_>) -> Result<RowStream> {
        let input = self.input.bind(ctx)?;
        let predicate = self.predicate.clone();

        Ok(Box::new(input.filter_map(move |row| match row {
            Ok(row) => match predicate.eval_predicate(&row) {
                Ok(true) => Some(Ok(row)),
                Ok(false) => None,
                Err(err) => Some(Err(err)),
            },
            Err(err) => Some(Err(err)),
        })))
    }
}

impl Explainable for PhysicalFilter {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("BindableFilter").with_value("predicate", &self.predicate)
    }
}
