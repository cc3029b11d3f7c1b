use opal_error::Result;

use crate::database::table::RowStream;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::optimizer::cost::Cost;
use crate::physical::DataContext;
use crate::types::field::Schema;
use crate::types::row::Row;

/// Produces a single row with no columns.
///
/// Source for queries without a FROM clause.
#[derive(Debug, Clone)]
pub struct PhysicalEmpty {
    pub schema: Schema,
    pub cost: Cost,
}

impl PhysicalEmpty {
    pub fn bind(&self, _ctx: &DataContext<'_>) -> Result<RowStream> {
        Ok(Box::new(std::iter::once(Ok(Row::empty()))))
    }
}

impl Explainable for PhysicalEmpty {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("BindableEmpty")
    }
}
