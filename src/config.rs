// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::defaults;
use anyhow::{bail, Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Only watch secrets in this namespace; all namespaces when unset
    pub watch_namespace: Option<String>,
    /// Delay before a failed reconciliation is retried
    pub error_requeue: Duration,
    /// Total attempts for a conditional update before a conflict is reported
    pub update_attempts: u32,
    /// Number of secrets reconciled concurrently, 0 means unbounded
    pub reconcile_concurrency: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            watch_namespace: None,
            error_requeue: Duration::from_secs(defaults::ERROR_REQUEUE_SECS),
            update_attempts: defaults::UPDATE_ATTEMPTS,
            reconcile_concurrency: defaults::RECONCILE_CONCURRENCY,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let watch_namespace = lookup("WATCH_NAMESPACE").filter(|ns| !ns.trim().is_empty());

        let error_requeue_secs =
            parse_or(&lookup, "ERROR_REQUEUE_SECS", defaults::ERROR_REQUEUE_SECS)?;
        let update_attempts = parse_or(&lookup, "UPDATE_ATTEMPTS", defaults::UPDATE_ATTEMPTS)?;
        if update_attempts == 0 {
            bail!("UPDATE_ATTEMPTS must be at least 1");
        }
        let reconcile_concurrency = parse_or(
            &lookup,
            "RECONCILE_CONCURRENCY",
            defaults::RECONCILE_CONCURRENCY,
        )?;

        Ok(Config {
            watch_namespace,
            error_requeue: Duration::from_secs(error_requeue_secs),
            update_attempts,
            reconcile_concurrency,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} environment variable is not a valid number: {}", key, raw)),
        None => Ok(default),
    }
}
