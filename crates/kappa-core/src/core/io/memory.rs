use super::record::KappaRecord;
use super::traits::{KappaStore, PersistenceError, StoreKey};
use std::collections::HashMap;

/// Keeps records in process, keyed by [`StoreKey::file_stem`].
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: HashMap<String, KappaRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn remove(&mut self, key: &StoreKey) -> Option<KappaRecord> {
        self.records.remove(&key.file_stem())
    }
}

impl KappaStore for MemoryStore {
    fn read_record(&self, key: &StoreKey) -> Result<Option<KappaRecord>, PersistenceError> {
        Ok(self.records.get(&key.file_stem()).cloned())
    }

    fn write(
        &mut self,
        record: &KappaRecord,
        label: Option<&str>,
    ) -> Result<(), PersistenceError> {
        self.records
            .insert(record.key(label).file_stem(), record.clone());
        Ok(())
    }
}
