// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{annotations, labels, LABEL_NAME_MAX_LEN};
use crate::error::{Result, SecretSyncError};
use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;

/// Sync conventions carried by a Secret's labels and annotations
pub trait SyncedSecret {
    /// Whether the secret carries the sync-enabled marker label
    fn is_sync_enabled(&self) -> bool;

    /// Fingerprint recorded by the last rollout, if any
    fn recorded_fingerprint(&self) -> Option<&str>;

    /// Fingerprint whose rollout is still outstanding, if any
    fn pending_rollout(&self) -> Option<&str>;

    /// Label key that deployments carry to depend on this secret
    fn dependency_label(&self) -> Result<String>;
}

impl SyncedSecret for Secret {
    fn is_sync_enabled(&self) -> bool {
        self.labels().contains_key(labels::SYNC_ENABLED)
    }

    fn recorded_fingerprint(&self) -> Option<&str> {
        non_empty_annotation(self, annotations::FINGERPRINT)
    }

    fn pending_rollout(&self) -> Option<&str> {
        non_empty_annotation(self, annotations::ROLLOUT_PENDING)
    }

    fn dependency_label(&self) -> Result<String> {
        dependency_label(&self.name_any())
    }
}

fn non_empty_annotation<'a>(secret: &'a Secret, key: &str) -> Option<&'a str> {
    secret
        .annotations()
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty())
}

/// Build the dependency label key for a secret name
pub fn dependency_label(secret_name: &str) -> Result<String> {
    if secret_name.is_empty() || secret_name.len() > LABEL_NAME_MAX_LEN {
        return Err(SecretSyncError::InvalidDependencyLabel(format!(
            "secret name '{}' does not fit in a label key (1-{} characters)",
            secret_name, LABEL_NAME_MAX_LEN
        )));
    }
    let label = format!("{}/{}", labels::DEPENDENCY_PREFIX, secret_name);
    // The sync marker key is reserved
    if label == labels::SYNC_ENABLED {
        return Err(SecretSyncError::InvalidDependencyLabel(format!(
            "secret name '{}' collides with the sync marker label {}",
            secret_name,
            labels::SYNC_ENABLED
        )));
    }
    Ok(label)
}
