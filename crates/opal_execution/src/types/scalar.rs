use std::cmp::Ordering;
use std::fmt;

use opal_error::{OpalError, Result};
use serde::{Deserialize, Serialize};

use super::datatype::DataType;

/// A single scalar value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScalarValue {
    Null,
    Boolean(bool),
    Int32(i32),
    Int64(i64),
    Float64(f64),
    Utf8(String),
}

impl ScalarValue {
    pub fn datatype(&self) -> DataType {
        match self {
            ScalarValue::Null => DataType::Null,
            ScalarValue::Boolean(_) => DataType::Boolean,
            ScalarValue::Int32(_) => DataType::Int32,
            ScalarValue::Int64(_) => DataType::Int64,
            ScalarValue::Float64(_) => DataType::Float64,
            ScalarValue::Utf8(_) => DataType::Utf8,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// Cast a value to the given type.
    ///
    /// Only the casts the binder can produce are supported: numeric widening
    /// and null to anything.
    pub fn cast(self, to: DataType) -> Result<ScalarValue> {
        if self.datatype() == to {
            return Ok(self);
        }
        Ok(match (self, to) {
            (ScalarValue::Null, _) => ScalarValue::Null,
            (ScalarValue::Int32(v), DataType::Int64) => ScalarValue::Int64(v as i64),
            (ScalarValue::Int32(v), DataType::Float64) => ScalarValue::Float64(v as f64),
            (ScalarValue::Int64(v), DataType::Float64) => ScalarValue::Float64(v as f64),
            (other, to) => {
                return Err(OpalError::Evaluation(format!(
                    "cannot cast {} to {to}",
                    other.datatype()
                )))
            }
        })
    }

    /// Compare two values of the same type.
    ///
    /// Returns None for nulls and for mismatched types; callers decide what
    /// null comparisons mean (predicates treat them as not-true, sorting
    /// orders them explicitly).
    pub fn compare(&self, other: &ScalarValue) -> Option<Ordering> {
        match (self, other) {
            (ScalarValue::Boolean(a), ScalarValue::Boolean(b)) => Some(a.cmp(b)),
            (ScalarValue::Int32(a), ScalarValue::Int32(b)) => Some(a.cmp(b)),
            (ScalarValue::Int64(a), ScalarValue::Int64(b)) => Some(a.cmp(b)),
            (ScalarValue::Float64(a), ScalarValue::Float64(b)) => Some(a.total_cmp(b)),
            (ScalarValue::Utf8(a), ScalarValue::Utf8(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn checked_add(&self, other: &ScalarValue) -> Result<ScalarValue> {
        match (self, other) {
            (ScalarValue::Int32(a), ScalarValue::Int32(b)) => a
                .checked_add(*b)
                .map(ScalarValue::Int32)
                .ok_or_else(|| overflow("+")),
            (ScalarValue::Int64(a), ScalarValue::Int64(b)) => a
                .checked_add(*b)
                .map(ScalarValue::Int64)
                .ok_or_else(|| overflow("+")),
            (ScalarValue::Float64(a), ScalarValue::Float64(b)) => Ok(ScalarValue::Float64(a + b)),
            (a, b) => Err(unsupported("+", a, b)),
        }
    }

    pub fn checked_sub(&self, other: &ScalarValue) -> Result<ScalarValue> {
        match (self, other) {
            (ScalarValue::Int32(a), ScalarValue::Int32(b)) => a
                .checked_sub(*b)
                .map(ScalarValue::Int32)
                .ok_or_else(|| overflow("-")),
            (ScalarValue::Int64(a), ScalarValue::Int64(b)) => a
                .checked_sub(*b)
                .map(ScalarValue::Int64)
                .ok_or_else(|| overflow("-")),
            (ScalarValue::Float64(a), ScalarValue::Float64(b)) => Ok(ScalarValue::Float64(a - b)),
            (a, b) => Err(unsupported("-", a, b)),
        }
    }

    pub fn checked_mul(&self, other: &ScalarValue) -> Result<ScalarValue> {
        match (self, other) {
            (ScalarValue::Int32(a), ScalarValue::Int32(b)) => a
                .checked_mul(*b)
                .map(ScalarValue::Int32)
                .ok_or_else(|| overflow("*")),
            (ScalarValue::Int64(a), ScalarValue::Int64(b)) => a
                .checked_mul(*b)
                .map(ScalarValue::Int64)
                .ok_or_else(|| overflow("*")),
            (ScalarValue::Float64(a), ScalarValue::Float64(b)) => Ok(ScalarValue::Float64(a * b)),
            (a, b) => Err(unsupported("*", a, b)),
        }
    }

    pub fn checked_div(&self, other: &ScalarValue) -> Result<ScalarValue> {
        match (self, other) {
            (ScalarValue::Int32(a), ScalarValue::Int32(b)) => a
                .checked_div(*b)
                .map(ScalarValue::Int32)
                .ok_or_else(|| division("/")),
            (ScalarValue::Int64(a), ScalarValue::Int64(b)) => a
                .checked_div(*b)
                .map(ScalarValue::Int64)
                .ok_or_else(|| division("/")),
            (ScalarValue::Float64(a), ScalarValue::Float64(b)) => Ok(ScalarValue::Float64(a / b)),
            (a, b) => Err(unsupported("/", a, b)),
        }
    }

    pub fn checked_rem(&self, other: &ScalarValue) -> Result<ScalarValue> {
        match (self, other) {
            (ScalarValue::Int32(a), ScalarValue::Int32(b)) => a
                .checked_rem(*b)
                .map(ScalarValue::Int32)
                .ok_or_else(|| division("%")),
            (ScalarValue::Int64(a), ScalarValue::Int64(b)) => a
                .checked_rem(*b)
                .map(ScalarValue::Int64)
                .ok_or_else(|| division("%")),
            (ScalarValue::Float64(a), ScalarValue::Float64(b)) => Ok(ScalarValue::Float64(a % b)),
            (a, b) => Err(unsupported("%", a, b)),
        }
    }

    pub fn concat(&self, other: &ScalarValue) -> Result<ScalarValue> {
        match (self, other) {
            (ScalarValue::Utf8(a), ScalarValue::Utf8(b)) => {
                let mut out = String::with_capacity(a.len() + b.len());
                out.push_str(a);
                out.push_str(b);
                Ok(ScalarValue::Utf8(out))
            }
            (a, b) => Err(unsupported("||", a, b)),
        }
    }
}

fn overflow(op: &str) -> OpalError {
    OpalError::Evaluation(format!("integer overflow evaluating '{op}'"))
}

fn division(op: &str) -> OpalError {
    OpalError::Evaluation(format!("division by zero evaluating '{op}'"))
}

fn unsupported(op: &str, left: &ScalarValue, right: &ScalarValue) -> OpalError {
    OpalError::Evaluation(format!(
        "unsupported operand types for '{op}': {} and {}",
        left.datatype(),
        right.datatype()
    ))
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Null => write!(f, "NULL"),
            ScalarValue::Boolean(v) => write!(f, "{v}"),
            ScalarValue::Int32(v) => write!(f, "{v}"),
            ScalarValue::Int64(v) => write!(f, "{v}"),
            ScalarValue::Float64(v) => write!(f, "{v}"),
            ScalarValue::Utf8(v) => write!(f, "{v}"),
        }
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Boolean(value)
    }
}

impl From<i32> for ScalarValue {
    fn from(value: i32) -> Self {
        ScalarValue::Int32(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Int64(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Float64(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::Utf8(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::Utf8(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_overflow_errors() {
        let err = ScalarValue::Int32(i32::MAX)
            .checked_add(&ScalarValue::Int32(1))
            .unwrap_err();
        assert!(matches!(err, OpalError::Evaluation(_)));
    }

    #[test]
    fn div_by_zero_errors() {
        let err = ScalarValue::Int64(1)
            .checked_div(&ScalarValue::Int64(0))
            .unwrap_err();
        assert!(matches!(err, OpalError::Evaluation(_)));
    }

    #[test]
    fn concat_strings() {
        let got = ScalarValue::from("Victor")
            .concat(&ScalarValue::from(" Hugo"))
            .unwrap();
        assert_eq!(ScalarValue::from("Victor Hugo"), got);
    }

    #[test]
    fn cast_widens() {
        assert_eq!(
            ScalarValue::Int64(3),
            ScalarValue::Int32(3).cast(DataType::Int64).unwrap()
        );
        assert_eq!(
            ScalarValue::Float64(3.0),
            ScalarValue::Int64(3).cast(DataType::Float64).unwrap()
        );
        assert_eq!(ScalarValue::Null, ScalarValue::Null.cast(DataType::Utf8).unwrap());
    }

    #[test]
    fn compare_nulls_is_none() {
        assert_eq!(None, ScalarValue::Null.compare(&ScalarValue::Int32(1)));
    }
}
