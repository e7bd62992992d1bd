// SPDX-License-Identifier: AGPL-3.0-or-later
//! Provisioning run
//!
//! Steps run strictly in order and the first failure aborts the run:
//! check context, fetch account info, fetch broker endpoint, ensure the
//! remote identity, ensure the local identity, merge the context. Nothing
//! completed before a failure is rolled back; a rerun without reset picks
//! up whatever identities were already stored.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

use crate::authority::{self, IdentityAuthority};
use crate::config::{Config, ParameterNames};
use crate::context::{ContextDocument, ContextStore};
use crate::ensure::{ensure, EnsureOutcome, Ensured};
use crate::error::Result;
use crate::identity::{LocalIdentity, RemoteDeviceIdentity};
use crate::remote::{AccountApi, AccountInfo};
use crate::secrets::SecretStore;

/// Arguments of a single invocation
#[derive(Clone)]
pub struct CliInput {
    /// Bearer token for the remote API
    pub api_key: String,
    /// Remote API base URL
    pub endpoint: String,
    /// Regenerate both identities even if they are stored
    pub reset: bool,
}

impl fmt::Debug for CliInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CliInput")
            .field("api_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("reset", &self.reset)
            .finish()
    }
}

/// Values written into the context document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextFields {
    #[serde(rename = "mqttTeamDeviceCertSSMParam")]
    pub remote_cert_param: String,
    #[serde(rename = "mqttTeamDeviceKeySSMParam")]
    pub remote_key_param: String,
    #[serde(rename = "mqttTeamDeviceClientId")]
    pub remote_client_id: String,
    #[serde(rename = "localIotClientCertSSMParam")]
    pub local_cert_param: String,
    #[serde(rename = "localIotClientKeySSMParam")]
    pub local_key_param: String,
    #[serde(rename = "mqttEndpoint")]
    pub local_mqtt_endpoint: String,
    #[serde(rename = "mqttTopicPrefix")]
    pub mqtt_topic_prefix: String,
    #[serde(rename = "nrfCloudMqttEndpoint")]
    pub remote_mqtt_endpoint: String,
}

impl ContextFields {
    /// Document keys and values, keyed by the serialized field names
    pub fn entries(&self) -> Result<BTreeMap<String, String>> {
        Ok(serde_json::from_value(serde_json::to_value(self)?)?)
    }
}

/// Everything a completed run produced
#[derive(Debug, Clone)]
pub struct BootstrapReport {
    pub account: AccountInfo,
    pub remote: EnsureOutcome,
    pub local: EnsureOutcome,
    pub fields: ContextFields,
    /// The full document as written
    pub document: ContextDocument,
}

/// Settings the run needs beyond its collaborators
#[derive(Debug, Clone)]
pub struct BootstrapSettings {
    pub parameters: ParameterNames,
    pub endpoint_type: String,
    pub policy_prefix: String,
}

impl From<&Config> for BootstrapSettings {
    fn from(config: &Config) -> Self {
        Self {
            parameters: config.parameters.clone(),
            endpoint_type: config.local.endpoint_type.clone(),
            policy_prefix: config.local.policy_prefix.clone(),
        }
    }
}

/// Sequences a provisioning run over injected collaborators
pub struct Bootstrapper<'a> {
    secrets: &'a dyn SecretStore,
    account: &'a dyn AccountApi,
    authority: &'a dyn IdentityAuthority,
    context: ContextStore,
    settings: BootstrapSettings,
}

impl<'a> Bootstrapper<'a> {
    pub fn new(
        secrets: &'a dyn SecretStore,
        account: &'a dyn AccountApi,
        authority: &'a dyn IdentityAuthority,
        context: ContextStore,
        settings: BootstrapSettings,
    ) -> Self {
        Self {
            secrets,
            account,
            authority,
            context,
            settings,
        }
    }

    /// Run every step once
    pub async fn run(&self, reset: bool) -> Result<BootstrapReport> {
        info!(context = %self.context.path().display(), "Verifying context file");
        self.context.load().await?;

        let account = self.account.fetch_account_info().await?;
        info!(
            mqtt_endpoint = %account.mqtt_endpoint,
            topic_prefix = %account.mqtt_topic_prefix,
            tenant = %account.tenant_id,
            "Retrieved account info"
        );

        let broker_endpoint = self
            .authority
            .describe_endpoint(&self.settings.endpoint_type)
            .await?;
        info!(endpoint = %broker_endpoint, "Local broker endpoint");

        let remote = self.ensure_remote(&account, reset).await?;
        let local = self.ensure_local(reset).await?;

        let parameters = &self.settings.parameters;
        let fields = ContextFields {
            remote_cert_param: parameters.remote_cert.clone(),
            remote_key_param: parameters.remote_key.clone(),
            remote_client_id: remote.identity.client_id.clone(),
            local_cert_param: parameters.local_cert.clone(),
            local_key_param: parameters.local_key.clone(),
            local_mqtt_endpoint: broker_endpoint,
            mqtt_topic_prefix: account.mqtt_topic_prefix.clone(),
            remote_mqtt_endpoint: account.mqtt_endpoint.clone(),
        };

        let document = self.context.merge(&fields.entries()?).await?;

        Ok(BootstrapReport {
            account,
            remote: remote.outcome,
            local: local.outcome,
            fields,
            document,
        })
    }

    async fn ensure_remote(
        &self,
        account: &AccountInfo,
        reset: bool,
    ) -> Result<Ensured<RemoteDeviceIdentity>> {
        let names = self.settings.parameters.remote();
        ensure(self.secrets, "remote device", &names, reset, || {
            self.account.issue_device_identity(account)
        })
        .await
    }

    async fn ensure_local(&self, reset: bool) -> Result<Ensured<LocalIdentity>> {
        let names = self.settings.parameters.local();
        ensure(self.secrets, "local client", &names, reset, || {
            authority::issue_local_identity(self.authority, &self.settings.policy_prefix)
        })
        .await
    }
}
