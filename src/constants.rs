// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Label keys shared with secret owners and deployment owners
pub mod labels {
    /// Marks a secret as sync-enabled; only its presence matters
    pub const SYNC_ENABLED: &str = "sso.gable.dev/secret";
    /// Prefix of the per-secret dependency label, `sso.gable.dev/<secret-name>`
    pub const DEPENDENCY_PREFIX: &str = "sso.gable.dev";
    /// Bumped on a deployment and its pod template to force a rollout
    pub const RESTART_MARKER: &str = "updatedSecretAt";
}

/// Annotation keys written on sync-enabled secrets
pub mod annotations {
    /// Fingerprint of the secret data as of the last rollout
    pub const FINGERPRINT: &str = "hashedData";
    /// Fingerprint whose rollout has not yet reached every deployment
    pub const ROLLOUT_PENDING: &str = "sso.gable.dev/rollout-pending";
}

/// Maximum length of the name part of a label key
pub const LABEL_NAME_MAX_LEN: usize = 63;

/// Configuration defaults
pub mod defaults {
    pub const ERROR_REQUEUE_SECS: u64 = 60;
    pub const UPDATE_ATTEMPTS: u32 = 5;
    pub const RECONCILE_CONCURRENCY: u16 = 4;
}
