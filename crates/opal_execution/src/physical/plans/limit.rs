use opal_error::Result;

use crate::database::table::RowStream;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::optimizer::cost::Cost;
use crate::physical::DataContext;
use crate::types::field::Schema;

use super::PhysicalOperator;

/// Operator for LIMIT and OFFSET clauses.
///
/// Termination is cooperative: once the limit is reached the iterator
/// reports exhaustion and never pulls from its input again.
#[derive(Debug, Clone)]
pub struct PhysicalLimit {
    /// Max number of rows to emit. None when only an offset was given.
    pub limit: Option<usize>,
    /// Number of rows to skip before emitting any.
    pub offset: usize,
    pub input: Box<PhysicalOperator>,
    pub schema: Schema,
    pub cost: Cost,
}

impl PhysicalLimit {
    pub fn bind(&self, ctx: &DataContext<'_>) -> Result<RowStream> {
        let input = self.input.bind(ctx)?;
        let limit = self.limit;
        let offset = self.offset;

        // Errors must not be skipped by the offset, only successful rows
        // count against it.
        let mut remaining_offset = offset;
        let skipped = input.filter(move |row| {
            if row.is_err() || remaining_offset == 0 {
                return true;
            }
            remaining_offset -= 1;
            false
        });

        match limit {
            Some(limit) => Ok(Box::new(skipped.take(limit))),
            None => Ok(Box::new(skipped)),
        }
    }
}

impl Explainable for PhysicalLimit {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        let mut ent = ExplainEntry::new("BindableLimit");
        if let Some(limit) = self.limit {
            ent = ent.with_value("limit", limit);
        }
        if self.offset > 0 {
            ent = ent.with_value("offset", self.offset);
        }
        ent
    }
}
