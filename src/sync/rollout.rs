// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Rolling out a changed secret to the deployments that depend on it

use crate::constants::labels;
use crate::error::{Result, SecretSyncError};
use crate::kubernetes::{update_with_retry, ObjectStore};
use crate::types::{ObjectKey, SyncedSecret};
use chrono::Utc;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Secret;
use kube::ResourceExt;
use tracing::{error, info, instrument};

/// Outcome of bumping the restart marker on every dependent deployment
#[derive(Debug)]
pub struct PropagationReport {
    pub secret: ObjectKey,
    pub updated: Vec<ObjectKey>,
    pub failures: Vec<(ObjectKey, SecretSyncError)>,
}

impl PropagationReport {
    pub fn updated_count(&self) -> usize {
        self.updated.len()
    }

    pub fn total(&self) -> usize {
        self.updated.len() + self.failures.len()
    }

    /// True when no deployment failed
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Turn a report with failures into a `PropagationIncomplete` error
    pub fn into_result(self) -> Result<Self> {
        if self.is_complete() {
            Ok(self)
        } else {
            Err(SecretSyncError::PropagationIncomplete {
                secret: self.secret.to_string(),
                failed: self.failures.len(),
                total: self.total(),
            })
        }
    }
}

/// Next restart marker: the current time in nanoseconds, forced past any previous marker
pub fn next_restart_marker<'a>(previous: impl IntoIterator<Item = Option<&'a str>>) -> String {
    let now = Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX);
    previous
        .into_iter()
        .flatten()
        .filter_map(|v| v.parse::<i64>().ok())
        .map(|v| v.saturating_add(1))
        .fold(now, i64::max)
        .to_string()
}

/// Set a fresh restart marker on the deployment and its pod template, returning it
pub fn apply_restart_marker(deployment: &mut Deployment) -> String {
    let template_labels = deployment
        .spec
        .as_ref()
        .and_then(|s| s.template.metadata.as_ref())
        .and_then(|m| m.labels.as_ref());

    let marker = next_restart_marker([
        deployment.labels().get(labels::RESTART_MARKER).map(String::as_str),
        template_labels
            .and_then(|l| l.get(labels::RESTART_MARKER))
            .map(String::as_str),
    ]);

    deployment
        .labels_mut()
        .insert(labels::RESTART_MARKER.to_string(), marker.clone());

    if let Some(spec) = deployment.spec.as_mut() {
        spec.template
            .metadata
            .get_or_insert_with(Default::default)
            .labels
            .get_or_insert_with(Default::default)
            .insert(labels::RESTART_MARKER.to_string(), marker.clone());
    }

    marker
}

/// Restart every deployment in the secret's namespace that carries its dependency label.
///
/// Each deployment is re-read and updated on its own; a failure is recorded in
/// the report and the remaining deployments are still processed. Only a failure
/// to list the dependents is returned as an error.
#[instrument(skip(store, secret), fields(secret = %ObjectKey::of(secret)))]
pub async fn propagate<S>(store: &S, secret: &Secret, attempts: u32) -> Result<PropagationReport>
where
    S: ObjectStore + ?Sized,
{
    let key = ObjectKey::of(secret);
    let dependency_label = secret.dependency_label()?;

    let dependents: Vec<Deployment> = store.list(&key.namespace, &dependency_label).await?;

    info!(
        "Found {} deployments labelled {}",
        dependents.len(),
        dependency_label
    );

    let mut report = PropagationReport {
        secret: key,
        updated: Vec::new(),
        failures: Vec::new(),
    };

    for deployment in dependents {
        let target = ObjectKey::of(&deployment);
        let mut marker = String::new();

        let result = update_with_retry(
            store,
            &target.namespace,
            &target.name,
            attempts,
            |d: &mut Deployment| marker = apply_restart_marker(d),
        )
        .await;

        match result {
            Ok(Some(_)) => {
                info!("Restarted deployment {} ({}={})", target, labels::RESTART_MARKER, marker);
                report.updated.push(target);
            }
            Ok(None) => {
                error!("Deployment {} disappeared before it could be restarted", target);
                let err = SecretSyncError::NotFound(format!("Deployment {}", target));
                report.failures.push((target, err));
            }
            Err(e) => {
                error!("Failed to restart deployment {}: {}", target, e);
                report.failures.push((target, e));
            }
        }
    }

    Ok(report)
}
