use opal_error::{OpalError, Result};
use opal_parser::ast::Ident;

use crate::types::datatype::DataType;
use crate::types::field::Schema;

/// Whether a stored name matches a referencing identifier.
///
/// Quoted identifiers always match exactly; unquoted identifiers follow the
/// session's case sensitivity.
pub fn name_matches(stored: &str, ident: &Ident, case_sensitive: bool) -> bool {
    if ident.quoted || case_sensitive {
        stored == ident.value
    } else {
        stored.eq_ignore_ascii_case(&ident.value)
    }
}

/// A column visible to expressions, part of the flat row produced by the
/// FROM clause.
#[derive(Debug, Clone)]
pub struct ScopeColumn {
    /// Alias of the table this column came from.
    pub table_alias: String,
    pub name: String,
    pub datatype: DataType,
}

/// Columns in scope while binding a query, in FROM-clause order.
///
/// Column references resolve to flat offsets into this list, which is also
/// the layout of the row the join tree produces.
#[derive(Debug, Default)]
pub struct BindScope {
    pub columns: Vec<ScopeColumn>,
}

impl BindScope {
    pub fn empty() -> Self {
        BindScope::default()
    }

    /// Append all columns of a table to the scope.
    pub fn append_table(&mut self, alias: &str, schema: &Schema) {
        for field in &schema.fields {
            self.columns.push(ScopeColumn {
                table_alias: alias.to_string(),
                name: field.name.clone(),
                datatype: field.datatype,
            });
        }
    }

    /// Resolve a column reference to its offset and type.
    ///
    /// Unqualified references must be unambiguous across every table in
    /// scope.
    pub fn resolve(
        &self,
        table: Option<&Ident>,
        column: &Ident,
        case_sensitive: bool,
    ) -> Result<(usize, DataType)> {
        match table {
            Some(table) => {
                let mut table_found = false;
                for (idx, col) in self.columns.iter().enumerate() {
                    if !name_matches(&col.table_alias, table, case_sensitive) {
                        continue;
                    }
                    table_found = true;
                    if name_matches(&col.name, column, case_sensitive) {
                        return Ok((idx, col.datatype));
                    }
                }
                if table_found {
                    Err(OpalError::UnknownColumn(format!(
                        "{}.{}",
                        table.value, column.value
                    )))
                } else {
                    Err(OpalError::UnknownTable(table.value.clone()))
                }
            }
            None => {
                let mut found: Option<(usize, DataType)> = None;
                for (idx, col) in self.columns.iter().enumerate() {
                    if !name_matches(&col.name, column, case_sensitive) {
                        continue;
                    }
                    if found.is_some() {
                        return Err(OpalError::AmbiguousColumn(column.value.clone()));
                    }
                    found = Some((idx, col.datatype));
                }
                found.ok_or_else(|| OpalError::UnknownColumn(column.value.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::field::Field;

    fn scope() -> BindScope {
        let mut scope = BindScope::empty();
        scope.append_table(
            "b",
            &Schema::new([
                Field::new("id", DataType::Int32, false),
                Field::new("title", DataType::Utf8, true),
            ]),
        );
        scope.append_table(
            "a",
            &Schema::new([
                Field::new("id", DataType::Int32, false),
                Field::new("firstname", DataType::Utf8, true),
            ]),
        );
        scope
    }

    #[test]
    fn qualified_resolves_past_duplicate_names() {
        let scope = scope();
        let (idx, datatype) = scope
            .resolve(
                Some(&Ident::from_string("a")),
                &Ident::from_string("id"),
                true,
            )
            .unwrap();
        assert_eq!(2, idx);
        assert_eq!(DataType::Int32, datatype);
    }

    #[test]
    fn unqualified_ambiguous() {
        let scope = scope();
        let err = scope
            .resolve(None, &Ident::from_string("id"), true)
            .unwrap_err();
        assert!(matches!(err, OpalError::AmbiguousColumn(_)));
    }

    #[test]
    fn unqualified_unique() {
        let scope = scope();
        let (idx, _) = scope
            .resolve(None, &Ident::from_string("title"), true)
            .unwrap();
        assert_eq!(1, idx);
    }

    #[test]
    fn unknown_column() {
        let scope = scope();
        let err = scope
            .resolve(None, &Ident::from_string("nosuchcol"), true)
            .unwrap_err();
        assert!(matches!(err, OpalError::UnknownColumn(_)));
    }

    #[test]
    fn case_insensitive_match() {
        let scope = scope();
        let (idx, _) = scope
            .resolve(
                Some(&Ident::from_string("B")),
                &Ident::from_string("TITLE"),
                false,
            )
            .unwrap();
        assert_eq!(1, idx);
    }

    #[test]
    fn quoted_always_exact() {
        let scope = scope();
        let quoted_upper = Ident {
            value: "TITLE".to_string(),
            quoted: true,
        };
        // Case insensitivity doesn't apply to quoted identifiers.
        scope.resolve(None, &quoted_upper, false).unwrap_err();
    }
}
