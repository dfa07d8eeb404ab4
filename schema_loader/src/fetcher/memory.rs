//! In-memory Schema Source

use crate::fetcher::{FetchError, FetchResult, SchemaSource};
use std::collections::HashMap;
use std::sync::Mutex;

/* Programs registered by name; used for embedding and tests */
#[derive(Default)]
pub struct MemorySource {
    programs: Mutex<HashMap<String, String>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, endpoint: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(endpoint, content);
        self
    }

    /* Register or replace an endpoint's program */
    pub fn insert(&self, endpoint: impl Into<String>, content: impl Into<String>) {
        if let Ok(mut programs) = self.programs.lock() {
            programs.insert(endpoint.into(), content.into());
        }
    }

    pub fn remove(&self, endpoint: &str) {
        if let Ok(mut programs) = self.programs.lock() {
            programs.remove(endpoint);
        }
    }
}

impl SchemaSource for MemorySource {
    async fn fetch(&self, endpoint: &str) -> Result<FetchResult, FetchError> {
        let content = self
            .programs
            .lock()
            .ok()
            .and_then(|programs| programs.get(endpoint).cloned())
            .ok_or_else(|| FetchError::NotFound(endpoint.to_string()))?;

        Ok(FetchResult {
            content,
            location: format!("memory:{}", endpoint),
        })
    }
}
