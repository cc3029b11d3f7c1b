use serde::{Deserialize, Serialize};

use super::datatype::DataType;

/// A named column in a row type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub datatype: DataType,
    pub nullable: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, datatype: DataType, nullable: bool) -> Self {
        Field {
            name: name.into(),
            datatype,
            nullable,
        }
    }
}

/// An ordered row type.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
}

impl Schema {
    pub fn new(fields: impl IntoIterator<Item = Field>) -> Self {
        Schema {
            fields: fields.into_iter().collect(),
        }
    }

    pub fn empty() -> Self {
        Schema { fields: Vec::new() }
    }

    pub fn num_columns(&self) -> usize {
        self.fields.len()
    }

    /// Concatenate two row types, e.g. for the output of a join.
    ///
    /// `nullable_right` forces the right side's fields nullable, as required
    /// for the padded side of a left outer join.
    pub fn merge(left: &Schema, right: &Schema, nullable_right: bool) -> Schema {
        let mut fields = left.fields.clone();
        fields.extend(right.fields.iter().cloned().map(|mut field| {
            if nullable_right {
                field.nullable = true;
            }
            field
        }));
        Schema { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_marks_right_nullable() {
        let left = Schema::new([Field::new("a", DataType::Int32, false)]);
        let right = Schema::new([Field::new("b", DataType::Utf8, false)]);

        let merged = Schema::merge(&left, &right, true);
        assert_eq!(2, merged.num_columns());
        assert!(!merged.fields[0].nullable);
        assert!(merged.fields[1].nullable);
    }
}
