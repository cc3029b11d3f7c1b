use std::sync::Arc;

use indexmap::IndexMap;
use opal_error::{OpalError, Result};

use crate::types::field::Schema;

use super::table::DataTable;

/// A table registered in the catalog: its row type plus its row source.
#[derive(Debug)]
pub struct TableEntry {
    pub name: String,
    pub schema: Schema,
    pub table: Arc<dyn DataTable>,
}

/// A named collection of tables.
///
/// Tables keep their insertion order, which makes unqualified resolution and
/// explain output deterministic.
#[derive(Debug, Default)]
pub struct SchemaEntry {
    pub name: String,
    tables: IndexMap<String, Arc<TableEntry>>,
}

impl SchemaEntry {
    pub fn table(&self, name: &str) -> Option<&Arc<TableEntry>> {
        self.tables.get(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &Arc<TableEntry>> {
        self.tables.values()
    }
}

/// The catalog consulted during binding and execution.
///
/// Built once by the host, then read-only for the lifetime of any query
/// compiled against it. The engine never populates this itself.
#[derive(Debug, Default)]
pub struct Catalog {
    schemas: IndexMap<String, SchemaEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog::default()
    }

    pub fn create_schema(&mut self, name: impl Into<String>) -> Result<()> {
        let name = name.into();
        if self.schemas.contains_key(&name) {
            return Err(OpalError::Internal(format!(
                "schema '{name}' already exists"
            )));
        }
        self.schemas.insert(
            name.clone(),
            SchemaEntry {
                name,
                tables: IndexMap::new(),
            },
        );
        Ok(())
    }

    pub fn create_table(
        &mut self,
        schema: &str,
        name: impl Into<String>,
        table_schema: Schema,
        table: Arc<dyn DataTable>,
    ) -> Result<()> {
        let name = name.into();
        let entry = self
            .schemas
            .get_mut(schema)
            .ok_or_else(|| OpalError::Internal(format!("schema '{schema}' does not exist")))?;
        if entry.tables.contains_key(&name) {
            return Err(OpalError::Internal(format!(
                "table '{name}' already exists in schema '{schema}'"
            )));
        }
        entry.tables.insert(
            name.clone(),
            Arc::new(TableEntry {
                name,
                schema: table_schema,
                table,
            }),
        );
        Ok(())
    }

    pub fn schema(&self, name: &str) -> Option<&SchemaEntry> {
        self.schemas.get(name)
    }

    pub fn schemas(&self) -> impl Iterator<Item = &SchemaEntry> {
        self.schemas.values()
    }
}
