use std::collections::BTreeMap;

use crate::schema::Record;
use crate::{Store, StoreError};

/// Keeps records in memory. Used by tests and for dry runs.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<Record, Vec<u8>>,
}

impl MemoryStore {
    #[must_use]
    pub fn contains(&self, record: Record) -> bool {
        self.records.contains_key(&record)
    }
}

impl Store for MemoryStore {
    fn read(&self, record: Record) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.records.get(&record).cloned())
    }

    fn write(&mut self, record: Record, bytes: &[u8]) -> Result<(), StoreError> {
        self.records.insert(record, bytes.to_vec());
        Ok(())
    }

    fn remove(&mut self, record: Record) -> Result<(), StoreError> {
        self.records.remove(&record);
        Ok(())
    }
}
