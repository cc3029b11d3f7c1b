use opal_error::{OpalError, Result};

use crate::database::table::RowStream;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::optimizer::cost::Cost;
use crate::physical::DataContext;
use crate::types::field::Schema;

/// Full scan of a catalog table.
///
/// Table names were resolved during binding; at execution bind time they're
/// looked up again in the context's catalog, which delegates straight to the
/// table's row source.
#[derive(Debug, Clone)]
pub struct PhysicalScan {
    pub catalog_schema: String,
    pub table: String,
    pub schema: Schema,
    pub cost: Cost,
}

impl PhysicalScan {
    pub fn bind(&self, ctx: &DataContext<'_>) -> Result<RowStream> {
        let entry = ctx
            .catalog
            .schema(&self.catalog_schema)
            .and_then(|schema| schema.table(&self.table))
            .ok_or_else(|| {
                OpalError::UnknownTable(format!("{}.{}", self.catalog_schema, self.table))
            })?;
        entry.table.scan()
    }
}

impl Explainable for PhysicalScan {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("BindableScan")
            .with_value("source", format!("{}.{}", self.catalog_schema, self.table))
    }
}
