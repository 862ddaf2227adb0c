// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Object store seam between the sync logic and the Kubernetes API

use crate::error::{Result, SecretSyncError};
use crate::types::ObjectKey;
use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use kube::{
    api::{ListParams, PostParams},
    Api, Client, Resource,
};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt::Debug;
use tracing::{debug, instrument};

/// Namespaced resources the store can read and write
pub trait StoreResource:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
}

impl<K> StoreResource for K where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static
{
}

/// Namespaced object store with optimistic concurrency on writes
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch an object, `None` when it does not exist
    async fn get<K: StoreResource>(&self, namespace: &str, name: &str) -> Result<Option<K>>;

    /// List objects in a namespace that carry the given label key, whatever its value
    async fn list<K: StoreResource>(&self, namespace: &str, with_label: &str) -> Result<Vec<K>>;

    /// Write an object back, failing with `Conflict` if its resource version is stale
    async fn replace<K: StoreResource>(&self, object: &K) -> Result<K>;
}

/// Object store backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api<K: StoreResource>(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    async fn get<K: StoreResource>(&self, namespace: &str, name: &str) -> Result<Option<K>> {
        Ok(self.api::<K>(namespace).get_opt(name).await?)
    }

    async fn list<K: StoreResource>(&self, namespace: &str, with_label: &str) -> Result<Vec<K>> {
        let lp = ListParams::default().labels(with_label);
        Ok(self.api::<K>(namespace).list(&lp).await?.items)
    }

    async fn replace<K: StoreResource>(&self, object: &K) -> Result<K> {
        let key = ObjectKey::of(object);

        match self
            .api::<K>(&key.namespace)
            .replace(&key.name, &PostParams::default(), object)
            .await
        {
            Ok(updated) => Ok(updated),
            Err(kube::Error::Api(err)) if err.code == 409 => Err(SecretSyncError::Conflict(
                format!("{} {}: {}", K::kind(&()), key, err.message),
            )),
            Err(kube::Error::Api(err)) if err.code == 404 => Err(SecretSyncError::NotFound(
                format!("{} {}", K::kind(&()), key),
            )),
            Err(e) => Err(e.into()),
        }
    }
}

/// Read the current object, apply `mutate` and write it back, re-reading on conflict.
///
/// Returns `None` if the object no longer exists. A conflict on the last of
/// `attempts` tries is returned to the caller.
#[instrument(skip(store, mutate), fields(kind = %K::kind(&())))]
pub async fn update_with_retry<S, K, F>(
    store: &S,
    namespace: &str,
    name: &str,
    attempts: u32,
    mut mutate: F,
) -> Result<Option<K>>
where
    S: ObjectStore + ?Sized,
    K: StoreResource,
    F: FnMut(&mut K) + Send,
{
    let mut attempt = 1;
    loop {
        let Some(mut object) = store.get::<K>(namespace, name).await? else {
            return Ok(None);
        };

        mutate(&mut object);

        match store.replace(&object).await {
            Ok(updated) => return Ok(Some(updated)),
            Err(SecretSyncError::Conflict(msg)) if attempt < attempts => {
                debug!("Conflict on attempt {}/{}: {}, retrying", attempt, attempts, msg);
                attempt += 1;
            }
            Err(SecretSyncError::NotFound(_)) => return Ok(None),
            Err(e) => return Err(e),
        }
    }
}
