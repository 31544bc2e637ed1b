//! Trade repository: the only mutation surface for trade records.
//!
//! Every operation loads the full collection, changes it in memory and saves
//! the full collection back. There is no locking; when two processes
//! interleave, the later save wins.

use crate::error::{JournalError, Result};
use crate::models::{TradeFields, TradeId, TradeRecord, TradeUpdate};
use crate::store::{CsvStore, RecordStore};

pub struct TradeRepository<S = CsvStore> {
    store: S,
}

impl<S: RecordStore> TradeRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Store a new trade under a fresh identifier
    pub fn create(&self, fields: TradeFields) -> Result<TradeRecord> {
        let mut records = self.store.load()?;

        let mut id = TradeId::generate();
        while records.iter().any(|r| r.id() == &id) {
            id = TradeId::generate();
        }
        let record = TradeRecord::from_fields(id, fields);
        records.push(record.clone());
        self.store.save(&records)?;

        tracing::info!(
            "Created trade {} ({} {}, {:?})",
            record.id(),
            record.code,
            record.name,
            record.state()
        );
        Ok(record)
    }

    /// Apply `update` to the trade with `id` and recompute its P&L
    pub fn update(&self, id: &TradeId, update: TradeUpdate) -> Result<TradeRecord> {
        let mut records = self.store.load()?;
        let record = records
            .iter_mut()
            .find(|r| r.id() == id)
            .ok_or_else(|| JournalError::NotFound(id.clone()))?;

        update.apply_to(record);
        let updated = record.clone();
        self.store.save(&records)?;

        tracing::info!("Updated trade {} ({:?}, pnl {:?})", updated.id(), updated.state(), updated.pnl());
        Ok(updated)
    }

    /// Permanently remove the trade with `id`
    pub fn delete(&self, id: &TradeId) -> Result<TradeRecord> {
        let mut records = self.store.load()?;
        let index = records
            .iter()
            .position(|r| r.id() == id)
            .ok_or_else(|| JournalError::NotFound(id.clone()))?;

        let removed = records.remove(index);
        self.store.save(&records)?;

        tracing::info!("Deleted trade {} ({})", removed.id(), removed.code);
        Ok(removed)
    }

    /// All trades in stored order
    pub fn list(&self) -> Result<Vec<TradeRecord>> {
        Ok(self.store.load()?)
    }

    pub fn get(&self, id: &TradeId) -> Result<TradeRecord> {
        self.store
            .load()?
            .into_iter()
            .find(|r| r.id() == id)
            .ok_or_else(|| JournalError::NotFound(id.clone()))
    }
}
