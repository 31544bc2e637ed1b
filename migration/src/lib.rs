//! Schema migrations for the trade journal file.
//!
//! Migrations operate on a [`RawTable`] (header row plus string cells) before
//! any typed parsing happens, so older files stay loadable as the layout
//! evolves. The schema version of a file is the number of migrations that
//! have been applied to it.

use thiserror::Error;

mod m20240301_000001_rename_confirmation_column;
mod m20240315_000001_add_trade_ids;

/// Migration errors
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("file schema version {found} is newer than the latest known version {latest}")]
    UnsupportedVersion { found: u32, latest: u32 },

    #[error("migration {name} failed: {reason}")]
    Step { name: String, reason: String },
}

/// Untyped view of a tabular file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let mut table = Self { headers, rows };
        table.pad_rows();
        table
    }

    /// Index of the column with the given header
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Cell value, empty for short rows
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Rename a column. Returns false when `from` does not exist.
    pub fn rename_column(&mut self, from: &str, to: &str) -> bool {
        match self.column(from) {
            Some(idx) => {
                self.headers[idx] = to.to_string();
                true
            }
            None => false,
        }
    }

    /// Insert a column at `index`, filling each row from `fill(row_index)`.
    pub fn insert_column<F>(&mut self, index: usize, name: &str, mut fill: F)
    where
        F: FnMut(usize) -> String,
    {
        let index = index.min(self.headers.len());
        self.headers.insert(index, name.to_string());
        for (i, row) in self.rows.iter_mut().enumerate() {
            row.insert(index, fill(i));
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn pad_rows(&mut self) {
        let width = self.headers.len();
        for row in &mut self.rows {
            if row.len() < width {
                row.resize(width, String::new());
            }
        }
    }
}

/// A single schema migration step
pub trait MigrationTrait {
    fn name(&self) -> &'static str;

    fn up(&self, table: &mut RawTable) -> Result<(), MigrationError>;
}

pub struct Migrator;

impl Migrator {
    /// All migrations in the order they must run
    pub fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_rename_confirmation_column::Migration),
            Box::new(m20240315_000001_add_trade_ids::Migration),
        ]
    }

    pub fn latest_version() -> u32 {
        Self::migrations().len() as u32
    }

    /// Bring `table` from `version` up to the latest schema.
    ///
    /// Returns the names of the migrations that ran, in order. An empty list
    /// means the table was already current.
    pub fn run(table: &mut RawTable, version: u32) -> Result<Vec<&'static str>, MigrationError> {
        let latest = Self::latest_version();
        if version > latest {
            return Err(MigrationError::UnsupportedVersion { found: version, latest });
        }

        let mut applied = Vec::new();
        for migration in Self::migrations().into_iter().skip(version as usize) {
            migration.up(table)?;
            tracing::info!("Applied schema migration {}", migration.name());
            applied.push(migration.name());
        }
        Ok(applied)
    }
}
