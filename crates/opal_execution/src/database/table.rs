use std::fmt::Debug;
use std::sync::Arc;

use opal_error::Result;

use crate::types::row::Row;

/// A pull-based stream of rows.
///
/// Single-pass and non-restartable; producing a fresh stream requires going
/// back to whatever produced this one.
pub type RowStream = Box<dyn Iterator<Item = Result<Row>>>;

/// A table's capability to produce rows.
///
/// Implementations are provided by the host when building the catalog. The
/// engine only ever pulls; it never inspects the source beyond this trait.
pub trait DataTable: Debug + Send + Sync {
    /// Start a new scan over all rows of the table.
    ///
    /// Every call is an independent scan from the start.
    fn scan(&self) -> Result<RowStream>;

    /// Estimated number of rows, used for cost estimation only.
    fn cardinality(&self) -> Option<usize> {
        None
    }
}

/// A table backed by an in-memory list of rows.
#[derive(Debug)]
pub struct MemoryTable {
    rows: Arc<Vec<Row>>,
}

impl MemoryTable {
    pub fn new(rows: Vec<Row>) -> Self {
        MemoryTable {
            rows: Arc::new(rows),
        }
    }
}

impl DataTable for MemoryTable {
    fn scan(&self) -> Result<RowStream> {
        let rows = self.rows.clone();
        let mut idx = 0;
        Ok(Box::new(std::iter::from_fn(move || {
            let row = rows.get(idx)?.clone();
            idx += 1;
            Some(Ok(row))
        })))
    }

    fn cardinality(&self) -> Option<usize> {
        Some(self.rows.len())
    }
}
