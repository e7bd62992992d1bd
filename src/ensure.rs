// SPDX-License-Identifier: AGPL-3.0-or-later
//! Ensure that an identity exists in the secret store
//!
//! The stored identity is reused when every one of its parameters is
//! present and no reset was requested. Otherwise a fresh identity is
//! issued and every parameter is overwritten, including ones that were
//! already present. An interrupted overwrite leaves the identity
//! incomplete, so the next run issues again.

use std::future::Future;
use tracing::{debug, info};

use crate::error::{BridgeError, Result};
use crate::identity::StoredIdentity;
use crate::secrets::SecretStore;

/// How an identity was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnsureOutcome {
    /// Every parameter was already stored; nothing was written
    Existing,
    /// A new identity was issued and persisted
    Issued,
}

/// Identity returned by [`ensure`]
#[derive(Debug, Clone)]
pub struct Ensured<T> {
    pub identity: T,
    pub outcome: EnsureOutcome,
}

/// Read every parameter of an identity. Lookup errors propagate; only a
/// missing parameter yields `None`.
pub async fn lookup<S>(store: &S, names: &[&str]) -> Result<Vec<Option<String>>>
where
    S: SecretStore + ?Sized,
{
    let mut values = Vec::with_capacity(names.len());
    for name in names {
        let value = store.get(name).await?;
        debug!(parameter = %name, present = value.is_some(), "Looked up parameter");
        values.push(value);
    }
    Ok(values)
}

/// Rebuild the identity if every field is present.
pub fn complete<T: StoredIdentity>(values: Vec<Option<String>>) -> Option<T> {
    let values: Option<Vec<String>> = values.into_iter().collect();
    values.and_then(T::from_values)
}

/// Overwrite every parameter of the identity.
///
/// The first parameter is deleted before any write and put back last. Until
/// that final write succeeds the stored identity is incomplete, so a failure
/// part way through can never leave old and new fields side by side.
pub async fn persist<S, T>(store: &S, names: &[&str], identity: &T) -> Result<()>
where
    S: SecretStore + ?Sized,
    T: StoredIdentity,
{
    let values = identity.values();
    let (Some((first_name, rest_names)), Some((first_value, rest_values))) =
        (names.split_first(), values.split_first())
    else {
        return Ok(());
    };

    store.delete(first_name).await?;
    for (name, value) in rest_names.iter().zip(rest_values) {
        store.put(name, value, true).await?;
    }
    store.put(first_name, first_value, true).await
}

/// Return the stored identity, or issue and persist a new one.
///
/// `issue` is only invoked when the stored identity is incomplete or
/// `reset` is set. `label` names the identity in log output.
pub async fn ensure<S, T, F, Fut>(
    store: &S,
    label: &str,
    names: &[&str],
    reset: bool,
    issue: F,
) -> Result<Ensured<T>>
where
    S: SecretStore + ?Sized,
    T: StoredIdentity,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    if names.len() != T::FIELDS {
        return Err(BridgeError::InvalidConfig {
            message: format!(
                "{} identity needs {} parameters, got {}",
                label,
                T::FIELDS,
                names.len()
            ),
        });
    }

    let existing = complete::<T>(lookup(store, names).await?);

    match existing {
        Some(identity) if !reset => {
            info!(
                identity = %label,
                parameters = %names.join(", "),
                "Existing credentials present"
            );
            Ok(Ensured {
                identity,
                outcome: EnsureOutcome::Existing,
            })
        }
        existing => {
            if existing.is_some() {
                info!(identity = %label, "Reset requested, regenerating credentials");
            } else {
                info!(identity = %label, "Credentials incomplete, generating new ones");
            }

            let identity = issue().await?;
            persist(store, names, &identity).await?;
            info!(
                identity = %label,
                parameters = %names.join(", "),
                "Saved new credentials"
            );
            Ok(Ensured {
                identity,
                outcome: EnsureOutcome::Issued,
            })
        }
    }
}
