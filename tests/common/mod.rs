// SPDX-License-Identifier: AGPL-3.0-or-later
//! In-memory collaborators for provisioning tests

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use bridge_init::authority::{IdentityAuthority, IssuedCertificate};
use bridge_init::identity::{CertificateCredentials, RemoteDeviceIdentity};
use bridge_init::remote::{AccountApi, AccountInfo};
use bridge_init::secrets::SecretStore;
use bridge_init::{BridgeError, Result};

pub const TOPIC_PREFIX: &str = "prod/tenant-1234/";
pub const REMOTE_MQTT: &str = "mqtt.nrfcloud.example";
pub const LOCAL_MQTT: &str = "abc-ats.iot.eu-west-1.amazonaws.com";

/// Remote account API that counts issuance calls
pub struct FakeAccountApi {
    issued: AtomicUsize,
    fail_issue: bool,
}

impl FakeAccountApi {
    pub fn new() -> Self {
        Self {
            issued: AtomicUsize::new(0),
            fail_issue: false,
        }
    }

    pub fn failing_issue() -> Self {
        Self {
            fail_issue: true,
            ..Self::new()
        }
    }

    pub fn issue_count(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AccountApi for FakeAccountApi {
    async fn fetch_account_info(&self) -> Result<AccountInfo> {
        AccountInfo::new(REMOTE_MQTT.to_string(), TOPIC_PREFIX.to_string())
    }

    async fn issue_device_identity(&self, account: &AccountInfo) -> Result<RemoteDeviceIdentity> {
        if self.fail_issue {
            return Err(BridgeError::RemoteApi {
                operation: "create mqtt team device".to_string(),
                message: "HTTP 500".to_string(),
            });
        }
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(RemoteDeviceIdentity {
            credentials: CertificateCredentials {
                client_cert: format!("remote-cert-{}", n),
                private_key: format!("remote-key-{}", n),
            },
            client_id: format!("{}-{}", account.device_client_id, n),
        })
    }
}

/// Local identity authority that counts certificates and policies
pub struct FakeAuthority {
    issued: AtomicUsize,
    policies: Mutex<Vec<String>>,
    fail_certificate: bool,
}

impl FakeAuthority {
    pub fn new() -> Self {
        Self {
            issued: AtomicUsize::new(0),
            policies: Mutex::new(Vec::new()),
            fail_certificate: false,
        }
    }

    pub fn failing_certificate() -> Self {
        Self {
            fail_certificate: true,
            ..Self::new()
        }
    }

    pub fn issue_count(&self) -> usize {
        self.issued.load(Ordering::SeqCst)
    }

    pub fn policies(&self) -> Vec<String> {
        self.policies.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentityAuthority for FakeAuthority {
    async fn describe_endpoint(&self, endpoint_type: &str) -> Result<String> {
        assert_eq!(endpoint_type, "iot:Data-ATS");
        Ok(LOCAL_MQTT.to_string())
    }

    async fn create_policy(&self, name: &str, _document: &str) -> Result<()> {
        self.policies.lock().unwrap().push(name.to_string());
        Ok(())
    }

    async fn create_keys_and_certificate(&self) -> Result<IssuedCertificate> {
        if self.fail_certificate {
            return Err(BridgeError::ControlPlane {
                operation: "create keys and certificate".to_string(),
                message: "AccessDenied".to_string(),
            });
        }
        let n = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(IssuedCertificate {
            certificate_arn: format!("arn:aws:iot:cert/{}", n),
            certificate_pem: format!("local-cert-{}", n),
            private_key: format!("local-key-{}", n),
        })
    }

    async fn attach_policy(&self, _policy_name: &str, _target: &str) -> Result<()> {
        Ok(())
    }
}

/// Secret store whose lookups fail as if permission were denied
pub struct DeniedSecretStore;

#[async_trait]
impl SecretStore for DeniedSecretStore {
    async fn get(&self, name: &str) -> Result<Option<String>> {
        Err(BridgeError::SecretStore {
            parameter: name.to_string(),
            message: "AccessDeniedException".to_string(),
        })
    }

    async fn put(&self, name: &str, _value: &str, _overwrite: bool) -> Result<()> {
        Err(BridgeError::SecretStore {
            parameter: name.to_string(),
            message: "AccessDeniedException".to_string(),
        })
    }

    async fn delete(&self, name: &str) -> Result<()> {
        Err(BridgeError::SecretStore {
            parameter: name.to_string(),
            message: "AccessDeniedException".to_string(),
        })
    }
}

/// Stored parameters of a complete local identity
pub fn complete_local() -> [(&'static str, &'static str); 2] {
    [
        ("LocalIotClientCert", "stored-local-cert"),
        ("LocalIotClientKey", "stored-local-key"),
    ]
}

/// Stored parameters of a complete remote identity
pub fn complete_remote() -> [(&'static str, &'static str); 3] {
    [
        ("NrfCloudClientCert", "stored-remote-cert"),
        ("NrfCloudClientKey", "stored-remote-key"),
        ("NrfCloudMqttTeamDeviceId", "stored-client"),
    ]
}
