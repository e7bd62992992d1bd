// SPDX-License-Identifier: AGPL-3.0-or-later
//! Identity material exchanged between the issuers and the secret store

use serde::{Deserialize, Serialize};

/// A certificate and its private key, always handled as one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateCredentials {
    /// PEM encoded client certificate
    pub client_cert: String,
    /// PEM encoded private key
    pub private_key: String,
}

/// Identity of the bridge on the remote MQTT broker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteDeviceIdentity {
    pub credentials: CertificateCredentials,
    pub client_id: String,
}

/// Identity of the bridge on the local broker.
///
/// The policy attachment is a side effect of issuance and is not stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalIdentity {
    pub credentials: CertificateCredentials,
}

/// An identity that is persisted as a fixed set of secret parameters.
///
/// `into_values` and `from_values` agree on field order; the parameter
/// names handed to the ensurer must follow the same order.
pub trait StoredIdentity: Sized {
    /// Number of secret parameters backing the identity
    const FIELDS: usize;

    /// Rebuild the identity from stored values. Returns `None` if the
    /// number of values does not match [`Self::FIELDS`].
    fn from_values(values: Vec<String>) -> Option<Self>;

    /// Values to persist, in storage order
    fn values(&self) -> Vec<&str>;
}

impl StoredIdentity for RemoteDeviceIdentity {
    const FIELDS: usize = 3;

    fn from_values(values: Vec<String>) -> Option<Self> {
        let [client_cert, private_key, client_id]: [String; 3] = values.try_into().ok()?;
        Some(Self {
            credentials: CertificateCredentials {
                client_cert,
                private_key,
            },
            client_id,
        })
    }

    fn values(&self) -> Vec<&str> {
        vec![
            self.credentials.client_cert.as_str(),
            self.credentials.private_key.as_str(),
            self.client_id.as_str(),
        ]
    }
}

impl StoredIdentity for LocalIdentity {
    const FIELDS: usize = 2;

    fn from_values(values: Vec<String>) -> Option<Self> {
        let [client_cert, private_key]: [String; 2] = values.try_into().ok()?;
        Some(Self {
            credentials: CertificateCredentials {
                client_cert,
                private_key,
            },
        })
    }

    fn values(&self) -> Vec<&str> {
        vec![
            self.credentials.client_cert.as_str(),
            self.credentials.private_key.as_str(),
        ]
    }
}
