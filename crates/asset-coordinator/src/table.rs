use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLock;

use crate::record::{AssetRecord, StoredAsset};

/// Name to record map. Records are created once and never removed.
#[derive(Debug, Default)]
pub(crate) struct AssetTable {
    records: RwLock<HashMap<String, AssetRecord>>,
}

impl AssetTable {
    /// Creates an empty record for `name` if none exists. Returns whether a
    /// record was created.
    pub fn ensure(&self, name: &str) -> bool {
        if self.records.read().contains_key(name) {
            return false;
        }
        let mut records = self.records.write();
        if records.contains_key(name) {
            return false;
        }
        records.insert(name.to_string(), AssetRecord::default());
        true
    }

    pub fn store<A: StoredAsset>(&self, name: &str, ticket: u64, value: Arc<A>) -> bool {
        self.records
            .write()
            .entry(name.to_string())
            .or_default()
            .store(ticket, value)
    }

    pub fn get(&self, name: &str) -> Option<AssetRecord> {
        self.records.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.read().contains_key(name)
    }

    /// Names in lexical order.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.records.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }
}
