pub mod error;
mod file;
mod memory;
pub mod models;
pub mod schema;

pub use error::StoreError;
pub use file::FileStore;
pub use memory::MemoryStore;
use schema::Record;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

/// A key-value store holding one document per [`Record`].
///
/// Callers serialize access themselves, the store only has to make each single
/// write atomic.
pub trait Store {
    /// `Ok(None)` if the record was never written or has been removed.
    fn read(&self, record: Record) -> Result<Option<Vec<u8>>, StoreError>;

    fn write(&mut self, record: Record, bytes: &[u8]) -> Result<(), StoreError>;

    /// Removing a missing record is not an error.
    fn remove(&mut self, record: Record) -> Result<(), StoreError>;
}

/// Typed access on top of [`Store`].
pub trait StoreExt: Store {
    /// Missing or malformed records are the empty default.
    fn load<T: DeserializeOwned + Default>(&self, record: Record) -> Result<T, StoreError> {
        Ok(self.load_optional(record)?.unwrap_or_default())
    }

    /// Like [`StoreExt::load`] but keeps "absent" distinguishable from "empty".
    fn load_optional<T: DeserializeOwned>(&self, record: Record) -> Result<Option<T>, StoreError> {
        let Some(bytes) = self.read(record)? else {
            return Ok(None);
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(Some(value)),
            Err(err) => {
                warn!("ignoring malformed {} record: {err}", record.name());
                Ok(None)
            }
        }
    }

    fn save<T: Serialize>(&mut self, record: Record, value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Json {
            record: record.name(),
            source,
        })?;
        self.write(record, &bytes)
    }
}

impl<S: Store + ?Sized> StoreExt for S {}

#[cfg(test)]
mod tests {
    use super::models::{Candidate, Selection, SignupSet};
    use super::*;

    #[test]
    fn typed_records_round_trip_through_memory() {
        let mut store = MemoryStore::default();
        let signups = SignupSet {
            signups: vec![Candidate::new("Ana", "Novak", "ana@example.org")],
        };
        store.save(Record::Signups, &signups).unwrap();
        assert_eq!(store.load::<SignupSet>(Record::Signups).unwrap(), signups);
        assert_eq!(
            store.load_optional::<Selection>(Record::Selection).unwrap(),
            None
        );
    }

    #[test]
    fn malformed_record_loads_as_default() {
        let mut store = MemoryStore::default();
        store.write(Record::Selection, b"chosen: [yaml?").unwrap();
        assert_eq!(
            store.load::<Selection>(Record::Selection).unwrap(),
            Selection::default()
        );
        assert_eq!(
            store.load_optional::<Selection>(Record::Selection).unwrap(),
            None
        );
    }
}
