// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::Result;
use kube::Client;
use tracing::{info, warn};

use secret_sync::config::Config;
use secret_sync::kubernetes::KubeStore;
use secret_sync::reconcilers::SecretReconciler;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting secret-sync operator");

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Configuration loaded: watch_namespace={}, error_requeue={:?}, update_attempts={}, concurrency={}",
        config.watch_namespace.as_deref().unwrap_or("<all>"),
        config.error_requeue,
        config.update_attempts,
        config.reconcile_concurrency
    );

    // Create Kubernetes client
    let client = Client::try_default().await?;
    info!("Connected to Kubernetes cluster");

    let store = KubeStore::new(client.clone());
    let secret_reconciler = SecretReconciler::new(client, store, config);

    info!("Starting secret reconciler...");
    secret_reconciler.run().await?;

    warn!("Secret reconciler stopped");
    Ok(())
}
