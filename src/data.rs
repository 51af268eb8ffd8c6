//! Row sources a report can iterate over.
//!
//! Three bindings are supported: a SQL query run through a registered
//! [`SqlProvider`], an in-memory [`TableModel`], and an external
//! [`TreeModel`] addressed through a name to column-index map. All of them are
//! walked through the same [`RowCursor`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::error::Error;

/// Rows of string values under named columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableModel {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TableModel {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        TableModel {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Short rows are padded with empty strings, long rows truncated.
    pub fn push_row<S: Into<String>>(&mut self, row: impl IntoIterator<Item = S>) {
        let mut row: Vec<String> = row.into_iter().map(Into::into).collect();
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    pub fn with_row<S: Into<String>>(mut self, row: impl IntoIterator<Item = S>) -> Self {
        self.push_row(row);
        self
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn value(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    pub fn value_by_name(&self, row: usize, name: &str) -> Option<&str> {
        self.value(row, self.column_index(name)?)
    }

    /// Load `{"columns": [...], "rows": [[...], ...]}` or an array of flat
    /// objects (columns are the union of keys).
    pub fn from_json(json: &str) -> Result<TableModel, Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum JsonTable {
            Grid {
                columns: Vec<String>,
                rows: Vec<Vec<Value>>,
            },
            Records(Vec<serde_json::Map<String, Value>>),
        }

        fn cell(value: &Value) -> String {
            match value {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }
        }

        let table = match serde_json::from_str::<JsonTable>(json)? {
            JsonTable::Grid { columns, rows } => {
                let mut table = TableModel::new(columns);
                for row in &rows {
                    table.push_row(row.iter().map(cell));
                }
                table
            }
            JsonTable::Records(records) => {
                let mut columns: Vec<String> = Vec::new();
                for record in &records {
                    for key in record.keys() {
                        if !columns.contains(key) {
                            columns.push(key.clone());
                        }
                    }
                }
                let mut table = TableModel::new(columns.clone());
                for record in &records {
                    table.push_row(
                        columns
                            .iter()
                            .map(|c| record.get(c).map(cell).unwrap_or_default()),
                    );
                }
                table
            }
        };
        Ok(table)
    }
}

/// Opaque row handle of a [`TreeModel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TreeIter(pub u64);

/// An externally owned, list-shaped model walked row by row.
pub trait TreeModel: Send + Sync {
    fn iter_first(&self) -> Option<TreeIter>;
    fn iter_next(&self, iter: TreeIter) -> Option<TreeIter>;
    fn value(&self, iter: TreeIter, column: usize) -> Option<String>;
    fn n_rows(&self) -> Option<usize> {
        None
    }
}

impl TreeModel for TableModel {
    fn iter_first(&self) -> Option<TreeIter> {
        (!self.rows.is_empty()).then_some(TreeIter(0))
    }

    fn iter_next(&self, iter: TreeIter) -> Option<TreeIter> {
        let next = iter.0 + 1;
        ((next as usize) < self.rows.len()).then_some(TreeIter(next))
    }

    fn value(&self, iter: TreeIter, column: usize) -> Option<String> {
        TableModel::value(self, iter.0 as usize, column).map(str::to_string)
    }

    fn n_rows(&self) -> Option<usize> {
        Some(self.rows.len())
    }
}

#[derive(Clone)]
pub struct TreeSource {
    pub model: Arc<dyn TreeModel>,
    pub columns: HashMap<String, usize>,
}

impl fmt::Debug for TreeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TreeSource")
            .field("columns", &self.columns)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SqlSource {
    pub provider: String,
    pub connection_string: String,
    pub sql: String,
}

/// Executes a query and materialises the whole result set.
pub trait SqlProvider {
    fn execute(&self, connection_string: &str, sql: &str) -> Result<TableModel, Error>;
}

impl<F> SqlProvider for F
where
    F: Fn(&str, &str) -> Result<TableModel, Error>,
{
    fn execute(&self, connection_string: &str, sql: &str) -> Result<TableModel, Error> {
        self(connection_string, sql)
    }
}

#[derive(Clone, Debug)]
pub enum DataSource {
    Sql(SqlSource),
    Table(TableModel),
    Tree(TreeSource),
}

/// The active data model and row, handed to field-request handlers.
#[derive(Clone, Copy)]
pub enum DataContext<'a> {
    None,
    Table { model: &'a TableModel, row: usize },
    Tree { model: &'a dyn TreeModel, iter: TreeIter },
}

impl fmt::Debug for DataContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataContext::None => write!(f, "None"),
            DataContext::Table { row, .. } => write!(f, "Table {{ row: {row} }}"),
            DataContext::Tree { iter, .. } => write!(f, "Tree {{ iter: {iter:?} }}"),
        }
    }
}

enum Position<'a> {
    Table {
        model: &'a TableModel,
        row: Option<usize>,
    },
    Tree {
        source: &'a TreeSource,
        iter: Option<TreeIter>,
    },
}

/// Forward-only cursor. Once exhausted it stays on the last row, so the
/// final row is still available to trailing sections.
pub struct RowCursor<'a> {
    pos: Position<'a>,
}

impl<'a> RowCursor<'a> {
    pub fn over_table(model: &'a TableModel) -> Self {
        RowCursor {
            pos: Position::Table { model, row: None },
        }
    }

    pub fn over_tree(source: &'a TreeSource) -> Self {
        RowCursor {
            pos: Position::Tree { source, iter: None },
        }
    }

    pub fn row_count(&self) -> Option<usize> {
        match &self.pos {
            Position::Table { model, .. } => Some(model.row_count()),
            Position::Tree { source, .. } => source.model.n_rows(),
        }
    }

    pub fn advance(&mut self) -> bool {
        match &mut self.pos {
            Position::Table { model, row } => {
                let next = row.map_or(0, |r| r + 1);
                if next < model.row_count() {
                    *row = Some(next);
                    true
                } else {
                    false
                }
            }
            Position::Tree { source, iter } => {
                let next = match iter {
                    None => source.model.iter_first(),
                    Some(it) => source.model.iter_next(*it),
                };
                match next {
                    Some(it) => {
                        *iter = Some(it);
                        true
                    }
                    None => false,
                }
            }
        }
    }

    /// `None` for unknown names or failed lookups.
    pub fn field(&self, name: &str) -> Option<String> {
        match &self.pos {
            Position::Table { model, row } => {
                model.value_by_name((*row)?, name).map(str::to_string)
            }
            Position::Tree { source, iter } => {
                let column = *source.columns.get(name)?;
                source.model.value((*iter)?, column)
            }
        }
    }

    pub fn context(&self) -> DataContext<'a> {
        match self.pos {
            Position::Table {
                model,
                row: Some(row),
            } => DataContext::Table { model, row },
            Position::Tree {
                source,
                iter: Some(iter),
            } => DataContext::Tree {
                model: source.model.as_ref(),
                iter,
            },
            _ => DataContext::None,
        }
    }
}
