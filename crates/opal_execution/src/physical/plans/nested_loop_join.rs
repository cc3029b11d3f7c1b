use opal_error::Result;

use crate::database::table::RowStream;
use crate::explain::explainable::{ExplainConfig, ExplainEntry, Explainable};
use crate::expr::physical::PhysicalScalarExpression;
use crate::logical::operator::JoinType;
use crate::optimizer::cost::Cost;
use crate::physical::DataContext;
use crate::types::field::Schema;
use crate::types::row::Row;
use crate::types::scalar::ScalarValue;

use super::PhysicalOperator;

/// Join that scans the full right input for every left row.
///
/// Works for any join condition (or none, for cross joins). The right input
/// is materialized on the first pull so it can be replayed per left row.
#[derive(Debug, Clone)]
pub struct PhysicalNestedLoopJoin {
    pub join_type: JoinType,
    /// Condition over the concatenated left and right rows. None means
    /// every pairing matches.
    pub condition: Option<PhysicalScalarExpression>,
    pub left: Box<PhysicalOperator>,
    pub right: Box<PhysicalOperator>,
    pub schema: Schema,
    pub cost: Cost,
}

impl PhysicalNestedLoopJoin {
    pub fn bind(&self, ctx: &DataContext<'_>) -> Result<RowStream> {
        let left = self.left.bind(ctx)?;
        let right = self.right.bind(ctx)?;

        Ok(Box::new(NestedLoopJoinIter {
            left,
            right: Some(right),
            right_rows: Vec::new(),
            condition: self.condition.clone(),
            join_type: self.join_type,
            right_arity: self.right.schema().num_columns(),
            current_left: None,
            right_idx: 0,
            current_matched: false,
        }))
    }
}

impl Explainable for PhysicalNestedLoopJoin {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        let mut ent =
            ExplainEntry::new("BindableNestedLoopJoin").with_value("join_type", self.join_type);
        if let Some(condition) = &self.condition {
            ent = ent.with_value("condition", condition);
        }
        ent
    }
}

struct NestedLoopJoinIter {
    left: RowStream,
    /// Unconsumed right input; taken and materialized on first pull.
    right: Option<RowStream>,
    right_rows: Vec<Row>,
    condition: Option<PhysicalScalarExpression>,
    join_type: JoinType,
    right_arity: usize,
    current_left: Option<Row>,
    right_idx: usize,
    current_matched: bool,
}

impl Iterator for NestedLoopJoinIter {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(right) = self.right.take() {
            for row in right {
                match row {
                    Ok(row) => self.right_rows.push(row),
                    Err(err) => return Some(Err(err)),
                }
            }
        }

        loop {
            if self.current_left.is_none() {
                match self.left.next() {
                    Some(Ok(row)) => {
                        self.current_left = Some(row);
                        self.right_idx = 0;
                        self.current_matched = false;
                    }
                    Some(Err(err)) => return Some(Err(err)),
                    None => return None,
                }
            }
            let left_row = self.current_left.clone().expect("left row set above");

            while self.right_idx < self.right_rows.len() {
                let right_row = &self.right_rows[self.right_idx];
                self.right_idx += 1;

                let combined = Row::concat(&left_row, right_row);
                let matched = match &self.condition {
                    Some(condition) => match condition.eval_predicate(&combined) {
                        Ok(matched) => matched,
                        Err(err) => return Some(Err(err)),
                    },
                    None => true,
                };
                if matched {
                    self.current_matched = true;
                    return Some(Ok(combined));
                }
            }

            // Right side exhausted for this left row.
            self.current_left = None;
            if self.join_type == JoinType::Left && !self.current_matched {
                let padding = Row::new(vec![ScalarValue::Null; self.right_arity]);
                return Some(Ok(Row::concat(&left_row, &padding)));
            }
        }
    }
}
