use std::cmp::Ordering;

use opal_error::Result;

use crate::database::table::RowStream;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::logical::operator::OrderByExpr;
use crate::optimizer::cost::Cost;
use crate::physical::DataContext;
use crate::types::field::Schema;
use crate::types::row::Row;

use super::PhysicalOperator;

/// Materializes its input and emits it ordered by the key list.
///
/// The sort is stable: rows with equal keys keep the order their input
/// produced them in.
#[derive(Debug, Clone)]
pub struct PhysicalSort {
    pub keys: Vec<OrderByExpr>,
    pub input: Box<PhysicalOperator>,
    pub schema: Schema,
    pub cost: Cost,
}

impl PhysicalSort {
    pub fn bind(&self, ctx: &DataContext<'_>) -> Result<RowStream> {
        let input = self.input.bind(ctx)?;
        let keys = self.keys.clone();

        Ok(Box::new(SortIter {
            input: Some(input),
            keys,
            rows: Vec::<Row>::new().into_iter(),
        }))
    }
}

impl Explainable for PhysicalSort {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("BindableSort").with_values("expressions", &self.keys)
    }
}

/// Compare two rows on the key list.
fn compare_rows(left: &Row, right: &Row, keys: &[OrderByExpr]) -> Ordering {
    for key in keys {
        let a = left.0.get(key.column);
        let b = right.0.get(key.column);

        let (a, b) = match (a, b) {
            (Some(a), Some(b)) => (a, b),
            _ => continue,
        };

        let ord = match (a.is_null(), b.is_null()) {
            (true, true) => Ordering::Equal,
            (true, false) => {
                if key.nulls_first {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
            (false, true) => {
                if key.nulls_first {
                    Ordering::Greater
                } else {
                    Ordering::Less
                }
            }
            (false, false) => {
                let ord = a.compare(b).unwrap_or(Ordering::Equal);
                if key.desc {
                    ord.reverse()
                } else {
                    ord
                }
            }
        };

        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

struct SortIter {
    input: Option<RowStream>,
    keys: Vec<OrderByExpr>,
    rows: std::vec::IntoIter<Row>,
}

impl Iterator for SortIter {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(input) = self.input.take() {
            let mut rows = Vec::new();
            for row in input {
                match row {
                    Ok(row) => rows.push(row),
                    Err(err) => return Some(Err(err)),
                }
            }
            // Vec::sort_by is stable, preserving input order for equal keys.
            rows.sort_by(|a, b| compare_rows(a, b, &self.keys));
            self.rows = rows.into_iter();
        }

        self.rows.next().map(Ok)
    }
}
