// SPDX-License-Identifier: AGPL-3.0-or-later
//! Remote account API client
//!
//! Fetches account metadata and issues device credentials for the remote
//! MQTT broker. Every issuance call mints a brand new identity on the
//! remote side, so callers must only issue once they know the stored
//! identity is unusable.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::IssuanceVariant;
use crate::error::{BridgeError, Result};
use crate::identity::{CertificateCredentials, RemoteDeviceIdentity};

/// Default API base URL
pub const DEFAULT_ENDPOINT: &str = "https://api.nrfcloud.com";

/// Account metadata, fetched fresh on every run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    /// Remote MQTT broker host
    pub mqtt_endpoint: String,
    /// Topic prefix assigned to the tenant, e.g. `prod/<tenant>/`
    pub mqtt_topic_prefix: String,
    /// Second segment of the topic prefix
    pub tenant_id: String,
    /// Client id of the account-level device, `account-<tenant>`
    pub device_client_id: String,
}

impl AccountInfo {
    /// Derive tenant fields from the raw account response
    pub fn new(mqtt_endpoint: String, mqtt_topic_prefix: String) -> Result<Self> {
        let tenant_id = mqtt_topic_prefix
            .split('/')
            .nth(1)
            .filter(|segment| !segment.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| {
                BridgeError::remote(
                    "get account",
                    format!("topic prefix '{}' has no tenant segment", mqtt_topic_prefix),
                )
            })?;

        Ok(Self {
            device_client_id: format!("account-{}", tenant_id),
            mqtt_endpoint,
            mqtt_topic_prefix,
            tenant_id,
        })
    }
}

/// Operations the bootstrap needs from the remote account API
#[async_trait]
pub trait AccountApi: Send + Sync {
    /// `GET /v1/account`
    async fn fetch_account_info(&self) -> Result<AccountInfo>;

    /// Mint a new device identity. Not idempotent.
    async fn issue_device_identity(&self, account: &AccountInfo) -> Result<RemoteDeviceIdentity>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    mqtt_endpoint: String,
    mqtt_topic_prefix: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MqttTeamDeviceResponse {
    client_id: String,
    #[serde(flatten)]
    credentials: CertificateCredentials,
}

/// Bearer-authenticated HTTP client for the remote account API
#[derive(Clone)]
pub struct HttpAccountClient {
    client: Client,
    endpoint: String,
    api_key: String,
    issuance: IssuanceVariant,
}

impl fmt::Debug for HttpAccountClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpAccountClient")
            .field("endpoint", &self.endpoint)
            .field("issuance", &self.issuance)
            .finish_non_exhaustive()
    }
}

impl HttpAccountClient {
    /// Create a client for the given API base URL
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BridgeError::remote("build client", e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            issuance: IssuanceVariant::default(),
        })
    }

    /// Select the device issuance endpoint
    #[must_use]
    pub fn with_issuance(mut self, issuance: IssuanceVariant) -> Self {
        self.issuance = issuance;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    async fn decode<T: DeserializeOwned>(operation: &str, response: Response) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BridgeError::remote(
                operation,
                format!("HTTP {}: {}", status, body.trim()),
            ));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| BridgeError::remote(operation, format!("invalid response body: {}", e)))
    }
}

#[async_trait]
impl AccountApi for HttpAccountClient {
    async fn fetch_account_info(&self) -> Result<AccountInfo> {
        const OPERATION: &str = "get account";
        debug!(endpoint = %self.endpoint, "Fetching account info");

        let response = self
            .client
            .get(self.url("/v1/account"))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| BridgeError::remote(OPERATION, e.to_string()))?;

        let body: AccountResponse = Self::decode(OPERATION, response).await?;
        AccountInfo::new(body.mqtt_endpoint, body.mqtt_topic_prefix)
    }

    async fn issue_device_identity(&self, account: &AccountInfo) -> Result<RemoteDeviceIdentity> {
        let (operation, path) = match self.issuance {
            IssuanceVariant::MqttTeam => ("create mqtt team device", "/v1/devices/mqtt-team"),
            IssuanceVariant::AccountCertificates => {
                ("create account certificate", "/v1/account/certificates")
            }
        };
        info!(
            endpoint = %self.endpoint,
            issuance = ?self.issuance,
            "Requesting new device credentials"
        );

        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| BridgeError::remote(operation, e.to_string()))?;

        let identity = match self.issuance {
            IssuanceVariant::MqttTeam => {
                let body: MqttTeamDeviceResponse = Self::decode(operation, response).await?;
                RemoteDeviceIdentity {
                    credentials: body.credentials,
                    client_id: body.client_id,
                }
            }
            IssuanceVariant::AccountCertificates => RemoteDeviceIdentity {
                credentials: Self::decode(operation, response).await?,
                client_id: account.device_client_id.clone(),
            },
        };

        debug!(client_id = %identity.client_id, "Device credentials issued");
        Ok(identity)
    }
}
