// SPDX-License-Identifier: AGPL-3.0-or-later
//! Configuration management for bridge-init

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{BridgeError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path of the persisted context document
    #[serde(default = "default_context_file")]
    pub context_file: PathBuf,

    /// Secret parameter names for both identities
    #[serde(default)]
    pub parameters: ParameterNames,

    /// Remote account API settings
    #[serde(default)]
    pub remote: RemoteConfig,

    /// Local identity authority settings
    #[serde(default)]
    pub local: LocalConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Names of the secret parameters holding the identity material
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterNames {
    /// Remote device certificate
    #[serde(default = "default_remote_cert")]
    pub remote_cert: String,

    /// Remote device private key
    #[serde(default = "default_remote_key")]
    pub remote_key: String,

    /// Remote device client id
    #[serde(default = "default_remote_client_id")]
    pub remote_client_id: String,

    /// Local broker client certificate
    #[serde(default = "default_local_cert")]
    pub local_cert: String,

    /// Local broker client private key
    #[serde(default = "default_local_key")]
    pub local_key: String,
}

/// How the remote API issues device credentials
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssuanceVariant {
    /// `POST /v1/devices/mqtt-team`, returns its own client id
    #[default]
    MqttTeam,
    /// `POST /v1/account/certificates`, client id derived from the tenant
    AccountCertificates,
}

/// Remote account API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Which issuance endpoint the deployment uses
    #[serde(default)]
    pub issuance: IssuanceVariant,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// Local identity authority configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Endpoint type passed to `DescribeEndpoint`
    #[serde(default = "default_endpoint_type")]
    pub endpoint_type: String,

    /// Prefix for generated authorization policy names
    #[serde(default = "default_policy_prefix")]
    pub policy_prefix: String,

    /// AWS region override (falls back to the default provider chain)
    #[serde(default)]
    pub region: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for ParameterNames {
    fn default() -> Self {
        Self {
            remote_cert: default_remote_cert(),
            remote_key: default_remote_key(),
            remote_client_id: default_remote_client_id(),
            local_cert: default_local_cert(),
            local_key: default_local_key(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            issuance: IssuanceVariant::default(),
            timeout_secs: default_timeout(),
        }
    }
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            endpoint_type: default_endpoint_type(),
            policy_prefix: default_policy_prefix(),
            region: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            context_file: default_context_file(),
            parameters: ParameterNames::default(),
            remote: RemoteConfig::default(),
            local: LocalConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl ParameterNames {
    /// Remote device parameters in storage order: certificate, key, client id
    pub fn remote(&self) -> [&str; 3] {
        [
            self.remote_cert.as_str(),
            self.remote_key.as_str(),
            self.remote_client_id.as_str(),
        ]
    }

    /// Local client parameters in storage order: certificate, key
    pub fn local(&self) -> [&str; 2] {
        [self.local_cert.as_str(), self.local_key.as_str()]
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// The parsed and validated configuration or an error
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(BridgeError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;

        config.validate()?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.context_file.as_os_str().is_empty() {
            return Err(invalid("context_file cannot be empty"));
        }

        let names = self
            .parameters
            .remote()
            .into_iter()
            .chain(self.parameters.local());
        let mut seen = HashSet::new();
        for name in names {
            if name.trim().is_empty() {
                return Err(invalid("secret parameter names cannot be empty"));
            }
            // Two identities sharing a parameter would overwrite each other.
            if !seen.insert(name) {
                return Err(invalid(format!(
                    "secret parameter '{}' is used more than once",
                    name
                )));
            }
        }

        if self.remote.timeout_secs == 0 {
            return Err(invalid("remote.timeout_secs must be greater than zero"));
        }

        if self.local.endpoint_type.is_empty() {
            return Err(invalid("local.endpoint_type cannot be empty"));
        }

        if self.local.policy_prefix.is_empty() {
            return Err(invalid("local.policy_prefix cannot be empty"));
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> BridgeError {
    BridgeError::InvalidConfig {
        message: message.into(),
    }
}

// Default value functions

fn default_context_file() -> PathBuf {
    PathBuf::from("cdk.context.json")
}

fn default_remote_cert() -> String {
    "NrfCloudClientCert".to_string()
}

fn default_remote_key() -> String {
    "NrfCloudClientKey".to_string()
}

fn default_remote_client_id() -> String {
    "NrfCloudMqttTeamDeviceId".to_string()
}

fn default_local_cert() -> String {
    "LocalIotClientCert".to_string()
}

fn default_local_key() -> String {
    "LocalIotClientKey".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_endpoint_type() -> String {
    "iot:Data-ATS".to_string()
}

fn default_policy_prefix() -> String {
    "nrfcloud-mqtt-bridge-policy".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}
