// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SecretSyncError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("Update conflict on {0}")]
    Conflict(String),

    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Failed to serialize secret data: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid dependency label: {0}")]
    InvalidDependencyLabel(String),

    #[error("Rollout of secret {secret} incomplete: {failed} of {total} deployments failed")]
    PropagationIncomplete {
        secret: String,
        failed: usize,
        total: usize,
    },
}

pub type Result<T> = std::result::Result<T, SecretSyncError>;
