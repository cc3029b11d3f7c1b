use std::cmp::Ordering;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};

use ahash::{HashMap, HashMapExt};
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

/// Equi-join that builds a hash table on the right input and probes it with
/// left rows.
///
/// The binder casts both key sides to a common type, so key equality is
/// always same-type. Rows with a null key never match, per SQL equality.
#[derive(Debug, Clone)]
pub struct PhysicalHashJoin {
    pub join_type: JoinType,
    /// Key expressions over the left input row.
    pub left_keys: Vec<PhysicalScalarExpression>,
    /// Key expressions over the right input row.
    pub right_keys: Vec<PhysicalScalarExpression>,
    pub left: Box<PhysicalOperator>,
    pub right: Box<PhysicalOperator>,
    pub schema: Schema,
    pub cost: Cost,
}

impl PhysicalHashJoin {
    pub fn bind(&self, ctx: &DataContext<'_>) -> Result<RowStream> {
        let left = self.left.bind(ctx)?;
        let right = self.right.bind(ctx)?;

        Ok(Box::new(HashJoinIter {
            left,
            right: Some(right),
            table: HashMap::new(),
            left_keys: self.left_keys.clone(),
            right_keys: self.right_keys.clone(),
            join_type: self.join_type,
            right_arity: self.right.schema().num_columns(),
            pending: VecDeque::new(),
        }))
    }
}

impl Explainable for PhysicalHashJoin {
    fn explain_entry(&self, _conf: ExplainConfig) -> ExplainEntry {
        ExplainEntry::new("BindableHashJoin")
            .with_value("join_type", self.join_type)
            .with_values("left_keys", &self.left_keys)
            .with_values("right_keys", &self.right_keys)
    }
}

/// Join key with hashing consistent with total value equality.
///
/// Floats hash and compare by bit pattern via `total_cmp`, strings by
/// bytes. Null keys are filtered out before they ever become a `HashKey`.
#[derive(Debug)]
struct HashKey(Vec<ScalarValue>);

impl PartialEq for HashKey {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(&other.0)
                .all(|(a, b)| a.compare(b) == Some(Ordering::Equal))
    }
}

impl Eq for HashKey {}

impl Hash for HashKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for value in &self.0 {
            match value {
                ScalarValue::Null => state.write_u8(0),
                ScalarValue::Boolean(v) => {
                    state.write_u8(1);
                    v.hash(state);
                }
                ScalarValue::Int32(v) => {
                    state.write_u8(2);
                    v.hash(state);
                }
                ScalarValue::Int64(v) => {
                    state.write_u8(3);
                    v.hash(state);
                }
                ScalarValue::Float64(v) => {
                    state.write_u8(4);
                    v.to_bits().hash(state);
                }
                ScalarValue::Utf8(v) => {
                    state.write_u8(5);
                    v.hash(state);
                }
            }
        }
    }
}

/// Evaluate key expressions against a row. None if any key value is null.
fn eval_key(keys: &[PhysicalScalarExpression], row: &Row) -> Result<Option<HashKey>> {
    let mut values = Vec::with_capacity(keys.len());
    for key in keys {
        let value = key.eval(row)?;
        if value.is_null() {
            return Ok(None);
        }
        values.push(value);
    }
    Ok(Some(HashKey(values)))
}

struct HashJoinIter {
    left: RowStream,
    /// Unconsumed right input; drained into the hash table on first pull.
    right: Option<RowStream>,
    table: HashMap<HashKey, Vec<Row>>,
    left_keys: Vec<PhysicalScalarExpression>,
    right_keys: Vec<PhysicalScalarExpression>,
    join_type: JoinType,
    right_arity: usize,
    pending: VecDeque<Row>,
}

impl HashJoinIter {
    fn build(&mut self) -> Result<()> {
        if let Some(right) = self.right.take() {
            for row in right {
                let row = row?;
                if let Some(key) = eval_key(&self.right_keys, &row)? {
                    self.table.entry(key).or_default().push(row);
                }
            }
        }
        Ok(())
    }
}

impl Iterator for HashJoinIter {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Err(err) = self.build() {
            return Some(Err(err));
        }

        loop {
            if let Some(row) = self.pending.pop_front() {
                return Some(Ok(row));
            }

            let left_row = match self.left.next() {
                Some(Ok(row)) => row,
                Some(Err(err)) => return Some(Err(err)),
                None => return None,
            };

            let matches = match eval_key(&self.left_keys, &left_row) {
                Ok(Some(key)) => self.table.get(&key),
                Ok(None) => None,
                Err(err) => return Some(Err(err)),
            };

            match matches {
                Some(rows) => {
                    for right_row in rows {
                        self.pending.push_back(Row::concat(&left_row, right_row));
                    }
                }
                None => {
                    if self.join_type == JoinType::Left {
                        let padding = Row::new(vec![ScalarValue::Null; self.right_arity]);
                        self.pending.push_back(Row::concat(&left_row, &padding));
                    }
                }
            }
        }
    }
}
