// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Secret reconciler - watches sync-enabled Secrets and runs a sync cycle for each change.

use crate::config::Config;
use crate::constants::labels;
use crate::error::{Result, SecretSyncError};
use crate::kubernetes::ObjectStore;
use crate::sync::{SyncManager, SyncOutcome};
use crate::types::ObjectKey;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Secret;
use kube::{
    runtime::{
        controller::{Action, Config as ControllerConfig},
        Controller,
    },
    Api, Client,
};
use kube_runtime::watcher::Config as WatcherConfig;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct SecretReconciler<S> {
    client: Client,
    manager: SyncManager<S>,
    config: Config,
}

impl<S: ObjectStore + 'static> SecretReconciler<S> {
    pub fn new(client: Client, store: S, config: Config) -> Self {
        Self {
            client,
            manager: SyncManager::new(store, config.clone()),
            config,
        }
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let secrets: Api<Secret> = match &self.config.watch_namespace {
            Some(namespace) => Api::namespaced(self.client.clone(), namespace),
            None => Api::all(self.client.clone()),
        };
        let watcher_config = WatcherConfig::default().labels(labels::SYNC_ENABLED);
        let controller_config =
            ControllerConfig::default().concurrency(self.config.reconcile_concurrency);
        let context = Arc::new(self);

        Controller::new(secrets, watcher_config)
            .with_config(controller_config)
            .shutdown_on_signal()
            .run(reconcile::<S>, error_policy::<S>, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled secret: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }
}

async fn reconcile<S: ObjectStore>(
    secret: Arc<Secret>,
    ctx: Arc<SecretReconciler<S>>,
) -> Result<Action> {
    let key = ObjectKey::of(secret.as_ref());

    debug!("Reconciling secret: {}", key);

    match ctx.manager.reconcile(&key).await? {
        SyncOutcome::Propagated(report) => {
            // Failed dependents are retried through the error policy
            let report = report.into_result()?;
            info!(
                "Secret {} rolled out to {} deployments",
                key,
                report.updated_count()
            );
        }
        outcome => debug!("Secret {}: {:?}", key, outcome),
    }

    Ok(Action::await_change())
}

fn error_policy<S>(
    _secret: Arc<Secret>,
    error: &SecretSyncError,
    ctx: Arc<SecretReconciler<S>>,
) -> Action {
    match error {
        // Fixed only by renaming the secret
        SecretSyncError::InvalidDependencyLabel(_) => {
            warn!("Not reconciling secret: {}", error);
            Action::await_change()
        }
        _ => {
            error!("Reconciliation error: {}", error);
            Action::requeue(ctx.config.error_requeue)
        }
    }
}
