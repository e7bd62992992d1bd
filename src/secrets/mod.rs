// SPDX-License-Identifier: AGPL-3.0-or-later
//! Secret store access
//!
//! Identity material lives in named string parameters. A lookup has three
//! outcomes: `Ok(Some(value))`, `Ok(None)` when the parameter does not
//! exist, and `Err(_)` for everything else (transport, permissions). Only
//! `Ok(None)` may be read as "absent" by callers.

mod memory;
mod ssm;

pub use memory::InMemorySecretStore;
pub use ssm::SsmSecretStore;

use async_trait::async_trait;

use crate::error::Result;

/// Named-parameter secret storage
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch a parameter, `Ok(None)` if it does not exist
    async fn get(&self, name: &str) -> Result<Option<String>>;

    /// Write a parameter, replacing an existing value when `overwrite` is set
    async fn put(&self, name: &str, value: &str, overwrite: bool) -> Result<()>;

    /// Remove a parameter. Removing a missing parameter succeeds.
    async fn delete(&self, name: &str) -> Result<()>;
}
