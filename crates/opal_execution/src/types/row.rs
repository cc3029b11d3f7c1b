use opal_error::{OpalError, Result};

use super::scalar::ScalarValue;

/// An owned row of scalar values, in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row(pub Vec<ScalarValue>);

impl Row {
    pub fn new(values: Vec<ScalarValue>) -> Self {
        Row(values)
    }

    pub fn empty() -> Self {
        Row(Vec::new())
    }

    pub fn arity(&self) -> usize {
        self.0.len()
    }

    pub fn value(&self, idx: usize) -> Result<&ScalarValue> {
        self.0
            .get(idx)
            .ok_or_else(|| OpalError::Internal(format!("column index {idx} out of bounds")))
    }

    /// Concatenate two rows, e.g. when producing join output.
    pub fn concat(left: &Row, right: &Row) -> Row {
        let mut values = Vec::with_capacity(left.arity() + right.arity());
        values.extend(left.0.iter().cloned());
        values.extend(right.0.iter().cloned());
        Row(values)
    }
}

impl<V: Into<ScalarValue>> FromIterator<V> for Row {
    fn from_iter<T: IntoIterator<Item = V>>(iter: T) -> Self {
        Row(iter.into_iter().map(Into::into).collect())
    }
}
