// SPDX-License-Identifier: AGPL-3.0-or-later
//! AWS Systems Manager Parameter Store backend

use async_trait::async_trait;
use aws_sdk_ssm::error::{DisplayErrorContext, SdkError};
use aws_sdk_ssm::operation::delete_parameter::DeleteParameterError;
use aws_sdk_ssm::operation::get_parameter::GetParameterError;
use aws_sdk_ssm::types::ParameterType;
use aws_sdk_ssm::Client;
use tracing::debug;

use super::SecretStore;
use crate::error::{BridgeError, Result};

/// Parameters are stored as plain `String` parameters.
#[derive(Debug, Clone)]
pub struct SsmSecretStore {
    client: Client,
}

impl SsmSecretStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_conf(config: &aws_types::SdkConfig) -> Self {
        Self::new(Client::new(config))
    }
}

#[async_trait]
impl SecretStore for SsmSecretStore {
    async fn get(&self, name: &str) -> Result<Option<String>> {
        match self.client.get_parameter().name(name).send().await {
            Ok(output) => Ok(output
                .parameter()
                .and_then(|parameter| parameter.value())
                .map(str::to_owned)),
            Err(err) if is_not_found(&err) => {
                debug!(parameter = %name, "Parameter not found");
                Ok(None)
            }
            Err(err) => Err(BridgeError::secret_store(
                name,
                format!("get_parameter failed: {}", DisplayErrorContext(&err)),
            )),
        }
    }

    async fn put(&self, name: &str, value: &str, overwrite: bool) -> Result<()> {
        self.client
            .put_parameter()
            .name(name)
            .value(value)
            .r#type(ParameterType::String)
            .overwrite(overwrite)
            .send()
            .await
            .map_err(|err| {
                BridgeError::secret_store(
                    name,
                    format!("put_parameter failed: {}", DisplayErrorContext(&err)),
                )
            })?;
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        match self.client.delete_parameter().name(name).send().await {
            Ok(_) => Ok(()),
            Err(err) if is_delete_not_found(&err) => Ok(()),
            Err(err) => Err(BridgeError::secret_store(
                name,
                format!("delete_parameter failed: {}", DisplayErrorContext(&err)),
            )),
        }
    }
}

/// Only the `ParameterNotFound` service error means "absent". Throttling,
/// access denied, timeouts and dispatch failures are real errors.
fn is_not_found<R>(err: &SdkError<GetParameterError, R>) -> bool {
    err.as_service_error()
        .is_some_and(GetParameterError::is_parameter_not_found)
}

fn is_delete_not_found<R>(err: &SdkError<DeleteParameterError, R>) -> bool {
    err.as_service_error()
        .is_some_and(DeleteParameterError::is_parameter_not_found)
}
