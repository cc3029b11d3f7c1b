use opal_error::Result;

use crate::database::table::RowStream;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::physical::PhysicalScalarExpression;
use crate::optimizer::cost::Cost;
use crate::physical::DataContext;
use crate::types::field::Schema;
use crate::types::row::Row;

use super::PhysicalOperator;

/// Maps each input row through the expression list.
#[derive(Debug, Clone)]
pub struct PhysicalProject {
    pub exprs: Vec<PhysicalScalarExpression>,
    pub input: Box<PhysicalOperator>,
    pub schema: Schema,
    pub cost: Cost,
}

impl PhysicalProject {
    pub fn bind(&self, ctx: &DataContext<'_>) -> Result<RowStream> {
        let input = self.input.bind(ctx)?;
        let exprs = self.exprs.clone();

        Ok(Box::new(input.map(move |row| {
            let row = row?;
            let values = exprs
                .iter()
                .map(|expr| expr.eval(&row))
                .collect::<Result<Vec<_>>>()?;
            Ok(Row::new(values))
        })))
    }
}

impl Explainable for PhysicalProject {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("BindableProject").with_values("expressions", &self.exprs)
    }
}
