use std::collections::HashMap;

use super::{normalize_path, Fetch, FetchError, SourceUri};

/// Serves sources from an in-memory map.
///
/// Paths are keyed by their normalized `/`-separated form, URLs by the full
/// URL string.
#[derive(Debug, Clone, Default)]
pub struct MemoryFetcher {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<K: AsRef<str>, D: Into<Vec<u8>>>(&mut self, key: K, data: D) {
        self.files.insert(Self::key_of(key.as_ref()), data.into());
    }

    pub fn with<K: AsRef<str>, D: Into<Vec<u8>>>(mut self, key: K, data: D) -> Self {
        self.insert(key, data);
        self
    }

    pub fn contains(&self, key: &str) -> bool {
        self.files.contains_key(&Self::key_of(key))
    }

    fn key_of(key: &str) -> String {
        match SourceUri::parse(key) {
            Ok(uri) => Self::uri_key(&uri).unwrap_or_else(|| key.to_string()),
            Err(_) => key.to_string(),
        }
    }

    fn uri_key(uri: &SourceUri) -> Option<String> {
        match uri {
            SourceUri::Path(path) => Some(normalize_path(path)),
            SourceUri::Http(url) => Some(url.clone()),
            SourceUri::Data { .. } => None,
        }
    }
}

impl Fetch for MemoryFetcher {
    async fn fetch(&self, uri: &SourceUri) -> Result<Vec<u8>, FetchError> {
        if let SourceUri::Data { data, .. } = uri {
            return Ok(data.clone());
        }
        let key = Self::uri_key(uri).unwrap_or_default();
        self.files
            .get(&key)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(uri.to_string()))
    }
}
