// SPDX-License-Identifier: AGPL-3.0-or-later
//! Local identity authority
//!
//! Control-plane access to the local broker: endpoint discovery and
//! minting of client certificates bound to an authorization policy.

mod iot;

pub use iot::IotIdentityAuthority;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::error::Result;
use crate::identity::{CertificateCredentials, LocalIdentity};

/// Key pair and certificate returned by the authority
#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    /// Identifier used as the policy attachment target
    pub certificate_arn: String,
    pub certificate_pem: String,
    pub private_key: String,
}

/// Control-plane operations of the local broker
#[async_trait]
pub trait IdentityAuthority: Send + Sync {
    /// Broker data endpoint address for the given endpoint type
    async fn describe_endpoint(&self, endpoint_type: &str) -> Result<String>;

    /// Create a named authorization policy
    async fn create_policy(&self, name: &str, document: &str) -> Result<()>;

    /// Mint an active key pair and certificate
    async fn create_keys_and_certificate(&self) -> Result<IssuedCertificate>;

    /// Attach a policy to a certificate
    async fn attach_policy(&self, policy_name: &str, target: &str) -> Result<()>;
}

/// Policy granting every broker action on every resource.
pub fn bridge_policy_document() -> String {
    json!({
        "Version": "2012-10-17",
        "Statement": [{
            "Effect": "Allow",
            "Action": "iot:*",
            "Resource": "*"
        }]
    })
    .to_string()
}

/// Unique policy name under the given prefix
pub fn policy_name(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

/// Issue a fresh local broker identity.
///
/// Creates a new policy on every call; earlier policies are left in place.
pub async fn issue_local_identity<A>(authority: &A, policy_prefix: &str) -> Result<LocalIdentity>
where
    A: IdentityAuthority + ?Sized,
{
    let policy = policy_name(policy_prefix);
    info!(policy = %policy, "Creating local broker policy");
    authority
        .create_policy(&policy, &bridge_policy_document())
        .await?;

    let issued = authority.create_keys_and_certificate().await?;
    authority
        .attach_policy(&policy, &issued.certificate_arn)
        .await?;
    info!(policy = %policy, certificate = %issued.certificate_arn, "Attached policy to certificate");

    Ok(LocalIdentity {
        credentials: CertificateCredentials {
            client_cert: issued.certificate_pem,
            private_key: issued.private_key,
        },
    })
}
