use std::fmt;

use serde::{Deserialize, Serialize};

/// Scalar data types supported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// Type of the NULL literal before it's been given a concrete type.
    /// Castable to every other type.
    Null,
    Boolean,
    Int32,
    Int64,
    Float64,
    Utf8,
}

impl DataType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, DataType::Int32 | DataType::Int64 | DataType::Float64)
    }

    /// Get the common type two operands promote to, if any.
    ///
    /// Numerics widen (Int32 < Int64 < Float64), equal types are returned
    /// as-is, and Null takes on the other side's type.
    pub fn common_type(left: DataType, right: DataType) -> Option<DataType> {
        if left == right {
            return Some(left);
        }
        match (left, right) {
            (DataType::Null, other) | (other, DataType::Null) => Some(other),
            (a, b) if a.is_numeric() && b.is_numeric() => {
                Some(std::cmp::max_by_key(a, b, |t| t.numeric_rank()))
            }
            _ => None,
        }
    }

    fn numeric_rank(&self) -> u8 {
        match self {
            DataType::Int32 => 1,
            DataType::Int64 => 2,
            DataType::Float64 => 3,
            _ => 0,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "Null"),
            Self::Boolean => write!(f, "Boolean"),
            Self::Int32 => write!(f, "Int32"),
            Self::Int64 => write!(f, "Int64"),
            Self::Float64 => write!(f, "Float64"),
            Self::Utf8 => write!(f, "Utf8"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_widening() {
        assert_eq!(
            Some(DataType::Int64),
            DataType::common_type(DataType::Int32, DataType::Int64)
        );
        assert_eq!(
            Some(DataType::Float64),
            DataType::common_type(DataType::Int64, DataType::Float64)
        );
        assert_eq!(
            Some(DataType::Int32),
            DataType::common_type(DataType::Int32, DataType::Int32)
        );
    }

    #[test]
    fn null_takes_other_side() {
        assert_eq!(
            Some(DataType::Utf8),
            DataType::common_type(DataType::Null, DataType::Utf8)
        );
    }

    #[test]
    fn no_common_type() {
        assert_eq!(None, DataType::common_type(DataType::Utf8, DataType::Int32));
        assert_eq!(
            None,
            DataType::common_type(DataType::Boolean, DataType::Float64)
        );
    }
}
