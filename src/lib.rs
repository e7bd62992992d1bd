// SPDX-License-Identifier: AGPL-3.0-or-later
//! bridge-init: bootstrap for an nRF Cloud to AWS IoT MQTT bridge
//!
//! Establishes the two mutual-TLS identities the bridge needs and records
//! the derived settings for the deployment layer.
//!
//! # Features
//!
//! * **Idempotent credentials:** identities already in the secret store are
//!   reused untouched; incomplete ones are reissued as a whole
//! * **Strict lookups:** only a genuine "parameter not found" triggers
//!   issuance, every other secret store failure aborts the run
//! * **Non-destructive context:** the context document is merged key by key,
//!   unrelated entries survive

pub mod authority;
pub mod bootstrap;
pub mod config;
pub mod context;
pub mod ensure;
pub mod error;
pub mod identity;
pub mod remote;
pub mod secrets;

pub use bootstrap::{BootstrapReport, BootstrapSettings, Bootstrapper, CliInput, ContextFields};
pub use config::Config;
pub use error::{BridgeError, Result};
