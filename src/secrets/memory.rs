// SPDX-License-Identifier: AGPL-3.0-or-later
//! Process-local secret store used for dry runs and tests

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::SecretStore;
use crate::error::{BridgeError, Result};

#[derive(Debug, Default)]
pub struct InMemorySecretStore {
    parameters: Mutex<BTreeMap<String, String>>,
    writes: Mutex<usize>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with existing parameters
    pub fn with_parameters<I, K, V>(parameters: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let parameters = parameters
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            parameters: Mutex::new(parameters),
            writes: Mutex::new(0),
        }
    }

    /// Copy of every stored parameter
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.lock_parameters().clone()
    }

    /// Number of successful `put` calls
    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_parameters(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.parameters.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn get(&self, name: &str) -> Result<Option<String>> {
        Ok(self.lock_parameters().get(name).cloned())
    }

    async fn put(&self, name: &str, value: &str, overwrite: bool) -> Result<()> {
        let mut parameters = self.lock_parameters();
        if !overwrite && parameters.contains_key(name) {
            return Err(BridgeError::secret_store(name, "parameter already exists"));
        }
        parameters.insert(name.to_string(), value.to_string());
        *self.writes.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.lock_parameters().remove(name);
        Ok(())
    }
}
