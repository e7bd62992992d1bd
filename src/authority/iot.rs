// SPDX-License-Identifier: AGPL-3.0-or-later
//! AWS IoT Core control plane

use async_trait::async_trait;
use aws_sdk_iot::error::DisplayErrorContext;
use aws_sdk_iot::Client;
use tracing::debug;

use super::{IdentityAuthority, IssuedCertificate};
use crate::error::{BridgeError, Result};

#[derive(Debug, Clone)]
pub struct IotIdentityAuthority {
    client: Client,
}

impl IotIdentityAuthority {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_conf(config: &aws_types::SdkConfig) -> Self {
        Self::new(Client::new(config))
    }
}

fn missing(operation: &str, field: &str) -> BridgeError {
    BridgeError::control_plane(operation, format!("response is missing {}", field))
}

#[async_trait]
impl IdentityAuthority for IotIdentityAuthority {
    async fn describe_endpoint(&self, endpoint_type: &str) -> Result<String> {
        const OPERATION: &str = "describe endpoint";
        let output = self
            .client
            .describe_endpoint()
            .endpoint_type(endpoint_type)
            .send()
            .await
            .map_err(|e| BridgeError::control_plane(OPERATION, DisplayErrorContext(&e).to_string()))?;

        output
            .endpoint_address()
            .map(str::to_owned)
            .ok_or_else(|| missing(OPERATION, "endpointAddress"))
    }

    async fn create_policy(&self, name: &str, document: &str) -> Result<()> {
        self.client
            .create_policy()
            .policy_name(name)
            .policy_document(document)
            .send()
            .await
            .map_err(|e| {
                BridgeError::control_plane("create policy", DisplayErrorContext(&e).to_string())
            })?;
        debug!(policy = %name, "Policy created");
        Ok(())
    }

    async fn create_keys_and_certificate(&self) -> Result<IssuedCertificate> {
        const OPERATION: &str = "create keys and certificate";
        let output = self
            .client
            .create_keys_and_certificate()
            .set_as_active(true)
            .send()
            .await
            .map_err(|e| BridgeError::control_plane(OPERATION, DisplayErrorContext(&e).to_string()))?;

        let certificate_arn = output
            .certificate_arn()
            .ok_or_else(|| missing(OPERATION, "certificateArn"))?;
        let certificate_pem = output
            .certificate_pem()
            .ok_or_else(|| missing(OPERATION, "certificatePem"))?;
        let private_key = output
            .key_pair()
            .and_then(|pair| pair.private_key())
            .ok_or_else(|| missing(OPERATION, "keyPair.PrivateKey"))?;

        Ok(IssuedCertificate {
            certificate_arn: certificate_arn.to_string(),
            certificate_pem: certificate_pem.to_string(),
            private_key: private_key.to_string(),
        })
    }

    async fn attach_policy(&self, policy_name: &str, target: &str) -> Result<()> {
        self.client
            .attach_policy()
            .policy_name(policy_name)
            .target(target)
            .send()
            .await
            .map_err(|e| {
                BridgeError::control_plane("attach policy", DisplayErrorContext(&e).to_string())
            })?;
        Ok(())
    }
}
