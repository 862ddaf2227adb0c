// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! One reconciliation cycle for a sync-enabled secret.
//!
//! The cycle keeps no state of its own: every decision is derived from the
//! stored secret. A changed fingerprint is recorded together with a pending
//! rollout marker before any deployment is touched, and the marker is only
//! cleared once every dependent has been restarted. A crash or partial failure
//! therefore leaves the marker in place and the next cycle repeats the rollout.

use crate::config::Config;
use crate::constants::annotations;
use crate::error::Result;
use crate::kubernetes::{update_with_retry, ObjectStore};
use crate::sync::fingerprint::detect;
use crate::sync::rollout::{propagate, PropagationReport};
use crate::types::{ObjectKey, SyncedSecret};
use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use tracing::{debug, info, instrument, warn};

/// What a reconciliation cycle did
#[derive(Debug)]
pub enum SyncOutcome {
    /// The secret no longer exists
    Missing,
    /// The secret does not carry the sync-enabled label
    NotEnabled,
    /// Data matches the recorded fingerprint and no rollout is pending
    Unchanged,
    /// Dependent deployments were restarted
    Propagated(PropagationReport),
}

/// Runs reconciliation cycles against an object store
pub struct SyncManager<S> {
    store: S,
    config: Config,
}

impl<S: ObjectStore> SyncManager<S> {
    pub fn new(store: S, config: Config) -> Self {
        Self { store, config }
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reconcile the secret identified by `key`. Safe to call repeatedly and concurrently.
    #[instrument(skip(self, key), fields(secret = %key))]
    pub async fn reconcile(&self, key: &ObjectKey) -> Result<SyncOutcome> {
        let Some(secret) = self.store.get::<Secret>(&key.namespace, &key.name).await? else {
            debug!("Secret no longer exists, nothing to do");
            return Ok(SyncOutcome::Missing);
        };

        if !secret.is_sync_enabled() {
            debug!("Secret is not sync-enabled, skipping");
            return Ok(SyncOutcome::NotEnabled);
        }

        // Fail before recording anything if dependents cannot be addressed
        secret.dependency_label()?;

        let detection = detect(&secret)?;

        let rollout = if detection.changed {
            info!(
                "Secret data changed (fingerprint {:?} -> {}), recording new fingerprint",
                secret.recorded_fingerprint(),
                detection.fingerprint
            );
            match self.record_fingerprint(key, &detection.fingerprint).await? {
                Some(_) => detection.fingerprint,
                None => {
                    debug!("Secret disappeared while recording fingerprint");
                    return Ok(SyncOutcome::Missing);
                }
            }
        } else if let Some(pending) = secret.pending_rollout() {
            warn!("Resuming incomplete rollout of fingerprint {}", pending);
            pending.to_string()
        } else {
            debug!("Secret data unchanged");
            return Ok(SyncOutcome::Unchanged);
        };

        let report = propagate(&self.store, &secret, self.config.update_attempts).await?;

        if report.is_complete() {
            self.clear_pending_rollout(key, &rollout).await?;
            info!(
                "Rollout complete, restarted {} deployments",
                report.updated_count()
            );
        } else {
            warn!(
                "Rollout incomplete: {} of {} deployments failed",
                report.failures.len(),
                report.total()
            );
        }

        Ok(SyncOutcome::Propagated(report))
    }

    /// Record the fingerprint and mark its rollout as pending in a single update
    async fn record_fingerprint(&self, key: &ObjectKey, fingerprint: &str) -> Result<Option<Secret>> {
        update_with_retry(
            &self.store,
            &key.namespace,
            &key.name,
            self.config.update_attempts,
            |s: &mut Secret| {
                let recorded = s.annotations_mut();
                recorded.insert(annotations::FINGERPRINT.to_string(), fingerprint.to_string());
                recorded.insert(
                    annotations::ROLLOUT_PENDING.to_string(),
                    fingerprint.to_string(),
                );
            },
        )
        .await
    }

    /// Clear the pending marker, unless another cycle has since replaced it
    async fn clear_pending_rollout(&self, key: &ObjectKey, rollout: &str) -> Result<()> {
        update_with_retry(
            &self.store,
            &key.namespace,
            &key.name,
            self.config.update_attempts,
            |s: &mut Secret| {
                if s.pending_rollout() == Some(rollout) {
                    s.annotations_mut().remove(annotations::ROLLOUT_PENDING);
                }
            },
        )
        .await?;
        Ok(())
    }
}
