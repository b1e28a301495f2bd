//! The output of one tool invocation

use std::collections::HashSet;

use crate::error::{CoreError, Result};
use crate::table::Table;

/// An ordered collection of [`Table`]s; declaration order is display order.
#[derive(Debug, Default)]
pub struct ToolResult {
    tables: Vec<Table>,
}

impl ToolResult {
    /// Collect tables into a result, rejecting repeated table names
    pub fn new(tables: impl IntoIterator<Item = Table>) -> Result<Self> {
        let tables: Vec<Table> = tables.into_iter().collect();
        let mut seen = HashSet::with_capacity(tables.len());
        for table in &tables {
            if !seen.insert(table.name()) {
                return Err(CoreError::DuplicateTableName {
                    name: table.name().to_string(),
                });
            }
        }
        Ok(Self { tables })
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name() == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Table> {
        self.tables.iter()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl<'a> IntoIterator for &'a ToolResult {
    type Item = &'a Table;
    type IntoIter = std::slice::Iter<'a, Table>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.iter()
    }
}
