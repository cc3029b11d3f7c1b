use std::fmt;

use crate::types::datatype::DataType;

/// Reference to a column in the input row, by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnExpr {
    /// Offset into the input row.
    pub column: usize,
    /// Resolved type of the referenced column.
    pub datatype: DataType,
}

impl fmt::Display for ColumnExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.column)
    }
}
