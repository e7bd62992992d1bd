// SPDX-License-Identifier: AGPL-3.0-or-later
//! End-to-end provisioning runs against in-memory collaborators

mod common;

use std::path::Path;

use bridge_init::context::ContextStore;
use bridge_init::ensure::EnsureOutcome;
use bridge_init::secrets::{InMemorySecretStore, SecretStore};
use bridge_init::{BootstrapSettings, Bootstrapper, BridgeError, Config};
use common::*;
use tempfile::tempdir;

fn bootstrapper<'a>(
    secrets: &'a dyn SecretStore,
    account: &'a FakeAccountApi,
    authority: &'a FakeAuthority,
    context: &Path,
) -> Bootstrapper<'a> {
    Bootstrapper::new(
        secrets,
        account,
        authority,
        ContextStore::new(context),
        BootstrapSettings::from(&Config::default()),
    )
}

fn read_context(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

/// Empty store: both identities are issued and the context is written
#[tokio::test]
async fn test_first_run_issues_both_identities() {
    let dir = tempdir().unwrap();
    let context = dir.path().join("cdk.context.json");
    let secrets = InMemorySecretStore::new();
    let account = FakeAccountApi::new();
    let authority = FakeAuthority::new();

    let report = bootstrapper(&secrets, &account, &authority, &context)
        .run(false)
        .await
        .unwrap();

    assert_eq!(report.remote, EnsureOutcome::Issued);
    assert_eq!(report.local, EnsureOutcome::Issued);
    assert_eq!(account.issue_count() + authority.issue_count(), 2);
    assert_eq!(authority.policies().len(), 1);

    let stored = secrets.snapshot();
    assert_eq!(stored.len(), 5);
    assert_eq!(stored["NrfCloudClientCert"], "remote-cert-1");
    assert_eq!(stored["NrfCloudMqttTeamDeviceId"], "account-tenant-1234-1");
    assert_eq!(stored["LocalIotClientKey"], "local-key-1");

    let document = read_context(&context);
    assert_eq!(document["mqttEndpoint"], LOCAL_MQTT);
    assert_eq!(document["nrfCloudMqttEndpoint"], REMOTE_MQTT);
    assert_eq!(document["mqttTopicPrefix"], TOPIC_PREFIX);
    assert_eq!(document["mqttTeamDeviceCertSSMParam"], "NrfCloudClientCert");
    assert_eq!(document["mqttTeamDeviceKeySSMParam"], "NrfCloudClientKey");
    assert_eq!(document["mqttTeamDeviceClientId"], "account-tenant-1234-1");
    assert_eq!(document["localIotClientCertSSMParam"], "LocalIotClientCert");
    assert_eq!(document["localIotClientKeySSMParam"], "LocalIotClientKey");
    assert_eq!(document.as_object().unwrap().len(), 8);
}

/// Complete identities are reused and the store is not touched
#[tokio::test]
async fn test_rerun_without_reset_is_idempotent() {
    let dir = tempdir().unwrap();
    let context = dir.path().join("cdk.context.json");
    let secrets = InMemorySecretStore::with_parameters(
        complete_remote().into_iter().chain(complete_local()),
    );
    let before = secrets.snapshot();
    let account = FakeAccountApi::new();
    let authority = FakeAuthority::new();

    for _ in 0..2 {
        let report = bootstrapper(&secrets, &account, &authority, &context)
            .run(false)
            .await
            .unwrap();
        assert_eq!(report.remote, EnsureOutcome::Existing);
        assert_eq!(report.local, EnsureOutcome::Existing);
        assert_eq!(report.fields.remote_client_id, "stored-client");
    }

    assert_eq!(secrets.snapshot(), before);
    assert_eq!(secrets.write_count(), 0);
    assert_eq!(account.issue_count(), 0);
    assert_eq!(authority.issue_count(), 0);
    assert!(authority.policies().is_empty());
}

/// A second run after a fresh bootstrap writes nothing new
#[tokio::test]
async fn test_second_run_reuses_first_run_identities() {
    let dir = tempdir().unwrap();
    let context = dir.path().join("cdk.context.json");
    let secrets = InMemorySecretStore::new();
    let account = FakeAccountApi::new();
    let authority = FakeAuthority::new();

    bootstrapper(&secrets, &account, &authority, &context)
        .run(false)
        .await
        .unwrap();
    let after_first = secrets.snapshot();
    let writes = secrets.write_count();

    bootstrapper(&secrets, &account, &authority, &context)
        .run(false)
        .await
        .unwrap();

    assert_eq!(secrets.snapshot(), after_first);
    assert_eq!(secrets.write_count(), writes);
    assert_eq!(account.issue_count(), 1);
    assert_eq!(authority.issue_count(), 1);
}

/// Reset regenerates both identities exactly once
#[tokio::test]
async fn test_reset_regenerates_both_identities() {
    let dir = tempdir().unwrap();
    let context = dir.path().join("cdk.context.json");
    let secrets = InMemorySecretStore::with_parameters(
        complete_remote().into_iter().chain(complete_local()),
    );
    let account = FakeAccountApi::new();
    let authority = FakeAuthority::new();

    let report = bootstrapper(&secrets, &account, &authority, &context)
        .run(true)
        .await
        .unwrap();

    assert_eq!(report.remote, EnsureOutcome::Issued);
    assert_eq!(report.local, EnsureOutcome::Issued);
    assert_eq!(account.issue_count(), 1);
    assert_eq!(authority.issue_count(), 1);

    let stored = secrets.snapshot();
    assert_ne!(stored["NrfCloudClientCert"], "stored-remote-cert");
    assert_eq!(stored["NrfCloudClientCert"], "remote-cert-1");
    assert_eq!(stored["LocalIotClientCert"], "local-cert-1");
}

/// A certificate without its key counts as absent
#[tokio::test]
async fn test_partial_remote_identity_is_reissued() {
    let dir = tempdir().unwrap();
    let context = dir.path().join("cdk.context.json");
    let secrets = InMemorySecretStore::with_parameters(
        [("NrfCloudClientCert", "orphan-cert")]
            .into_iter()
            .chain(complete_local()),
    );
    let account = FakeAccountApi::new();
    let authority = FakeAuthority::new();

    let report = bootstrapper(&secrets, &account, &authority, &context)
        .run(false)
        .await
        .unwrap();

    assert_eq!(report.remote, EnsureOutcome::Issued);
    assert_eq!(report.local, EnsureOutcome::Existing);
    assert_eq!(secrets.write_count(), 3);

    let stored = secrets.snapshot();
    assert_eq!(stored["NrfCloudClientCert"], "remote-cert-1");
    assert_eq!(stored["NrfCloudClientKey"], "remote-key-1");
    assert_eq!(stored["NrfCloudMqttTeamDeviceId"], "account-tenant-1234-1");
}

/// Only the remote identity is missing: the local authority is never called
#[tokio::test]
async fn test_complete_local_identity_skips_authority() {
    let dir = tempdir().unwrap();
    let context = dir.path().join("cdk.context.json");
    let secrets = InMemorySecretStore::with_parameters(complete_local());
    let account = FakeAccountApi::new();
    let authority = FakeAuthority::new();

    let report = bootstrapper(&secrets, &account, &authority, &context)
        .run(false)
        .await
        .unwrap();

    assert_eq!(report.remote, EnsureOutcome::Issued);
    assert_eq!(report.local, EnsureOutcome::Existing);
    assert_eq!(account.issue_count(), 1);
    assert_eq!(authority.issue_count(), 0);
    assert!(authority.policies().is_empty());
    assert_eq!(secrets.snapshot()["LocalIotClientCert"], "stored-local-cert");
}

/// A failing lookup aborts instead of looking like an absent credential
#[tokio::test]
async fn test_lookup_error_aborts_without_issuing() {
    let dir = tempdir().unwrap();
    let context = dir.path().join("cdk.context.json");
    let account = FakeAccountApi::new();
    let authority = FakeAuthority::new();

    let result = bootstrapper(&DeniedSecretStore, &account, &authority, &context)
        .run(false)
        .await;

    assert!(matches!(result, Err(BridgeError::SecretStore { .. })));
    assert_eq!(account.issue_count(), 0);
    assert_eq!(authority.issue_count(), 0);
    assert!(!context.exists());
}

/// A malformed context file fails the run before anything is issued
#[tokio::test]
async fn test_malformed_context_fails_before_issuing() {
    let dir = tempdir().unwrap();
    let context = dir.path().join("cdk.context.json");
    std::fs::write(&context, "not json at all").unwrap();
    let secrets = InMemorySecretStore::new();
    let account = FakeAccountApi::new();
    let authority = FakeAuthority::new();

    let result = bootstrapper(&secrets, &account, &authority, &context)
        .run(false)
        .await;

    assert!(matches!(result, Err(BridgeError::ContextParse { .. })));
    assert_eq!(account.issue_count(), 0);
    assert_eq!(secrets.write_count(), 0);
    assert_eq!(std::fs::read_to_string(&context).unwrap(), "not json at all");
}

/// A local failure leaves the new remote identity stored and the context
/// unwritten; the next run picks the remote identity up as complete
#[tokio::test]
async fn test_local_failure_is_safe_to_rerun() {
    let dir = tempdir().unwrap();
    let context = dir.path().join("cdk.context.json");
    let secrets = InMemorySecretStore::new();
    let account = FakeAccountApi::new();
    let broken = FakeAuthority::failing_certificate();

    let result = bootstrapper(&secrets, &account, &broken, &context)
        .run(false)
        .await;
    assert!(matches!(result, Err(BridgeError::ControlPlane { .. })));
    assert!(!context.exists());
    assert_eq!(secrets.snapshot().len(), 3);
    // The policy created before the failure is not cleaned up.
    assert_eq!(broken.policies().len(), 1);

    let authority = FakeAuthority::new();
    let report = bootstrapper(&secrets, &account, &authority, &context)
        .run(false)
        .await
        .unwrap();
    assert_eq!(report.remote, EnsureOutcome::Existing);
    assert_eq!(report.local, EnsureOutcome::Issued);
    assert_eq!(account.issue_count(), 1);
    assert!(context.exists());
}

/// A failed remote issuance persists nothing
#[tokio::test]
async fn test_remote_issue_failure_persists_nothing() {
    let dir = tempdir().unwrap();
    let context = dir.path().join("cdk.context.json");
    let secrets = InMemorySecretStore::new();
    let account = FakeAccountApi::failing_issue();
    let authority = FakeAuthority::new();

    let result = bootstrapper(&secrets, &account, &authority, &context)
        .run(false)
        .await;

    assert!(matches!(result, Err(BridgeError::RemoteApi { .. })));
    assert_eq!(secrets.write_count(), 0);
    assert_eq!(authority.issue_count(), 0);
}

/// Prior context entries the run does not produce survive the merge
#[tokio::test]
async fn test_existing_context_entries_survive() {
    let dir = tempdir().unwrap();
    let context = dir.path().join("cdk.context.json");
    std::fs::write(
        &context,
        r#"{"acknowledged-issue-numbers": [19836], "mqttEndpoint": "stale", "other": "kept"}"#,
    )
    .unwrap();
    let secrets = InMemorySecretStore::new();
    let account = FakeAccountApi::new();
    let authority = FakeAuthority::new();

    let report = bootstrapper(&secrets, &account, &authority, &context)
        .run(false)
        .await
        .unwrap();

    let document = read_context(&context);
    assert_eq!(document["other"], "kept");
    assert_eq!(document["acknowledged-issue-numbers"][0], 19836);
    assert_eq!(document["mqttEndpoint"], LOCAL_MQTT);
    assert_eq!(document.as_object().unwrap().len(), 10);
    assert_eq!(report.document.len(), 10);
}
