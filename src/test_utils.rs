// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: an HTTP mock for the Kubernetes API and an in-memory object store.

use crate::error::{Result, SecretSyncError};
use crate::kubernetes::{ObjectStore, StoreResource};
use crate::types::ObjectKey;
use async_trait::async_trait;
use http::{Request, Response};
use kube::client::Body;
use kube::core::ErrorResponse;
use kube::{Client, ResourceExt};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Add a response for GET requests matching the exact path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    /// Add a response for PUT requests matching the exact path
    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PUT", path, status, body)
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), (status, body.to_string()));
        self
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        self.responses
            .lock()
            .unwrap()
            .get(&(method.to_string(), path.to_string()))
            .cloned()
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        let (status, body) = self
            .find_response(&method, &path)
            .unwrap_or_else(|| (404, not_found_json("object", &path)));

        Box::pin(async move {
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} \"{}\" not found", resource, name),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}

type StoreKey = (String, String, String);

/// When an object injected with `delete_after_*` disappears from the store
#[derive(Clone, Copy, PartialEq, Eq)]
enum Vanish {
    AfterList,
    AfterGet,
}

#[derive(Default)]
struct StoreState {
    objects: BTreeMap<StoreKey, serde_json::Value>,
    revision: u64,
    forced_conflicts: HashMap<StoreKey, u32>,
    failing: HashSet<StoreKey>,
    replaces: HashMap<StoreKey, usize>,
    vanishing: HashMap<StoreKey, Vanish>,
}

/// In-memory object store with resource versions and fault injection.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

fn store_key<K: StoreResource>(namespace: &str, name: &str) -> StoreKey {
    (
        K::kind(&()).to_string(),
        namespace.to_string(),
        name.to_string(),
    )
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an object as an external actor would, assigning a fresh resource version
    pub fn insert<K: StoreResource>(&self, mut object: K) {
        let key = ObjectKey::of(&object);
        let mut state = self.state.lock().unwrap();
        state.revision += 1;
        object.meta_mut().resource_version = Some(state.revision.to_string());
        state.objects.insert(
            store_key::<K>(&key.namespace, &key.name),
            serde_json::to_value(&object).unwrap(),
        );
    }

    /// Read an object back, panicking if it is missing
    pub fn fetch<K: StoreResource>(&self, namespace: &str, name: &str) -> K {
        let state = self.state.lock().unwrap();
        let value = state
            .objects
            .get(&store_key::<K>(namespace, name))
            .unwrap_or_else(|| panic!("{} {}/{} not in store", K::kind(&()), namespace, name));
        serde_json::from_value(value.clone()).unwrap()
    }

    /// Modify an object out-of-band, bumping its resource version
    pub fn modify<K: StoreResource>(&self, namespace: &str, name: &str, f: impl FnOnce(&mut K)) {
        let mut object = self.fetch::<K>(namespace, name);
        f(&mut object);
        self.insert(object);
    }

    /// Remove an object
    pub fn delete<K: StoreResource>(&self, namespace: &str, name: &str) {
        self.state
            .lock()
            .unwrap()
            .objects
            .remove(&store_key::<K>(namespace, name));
    }

    /// Make the next `count` replaces of the named object fail with a conflict
    pub fn conflict_next_replaces<K: StoreResource>(&self, name: &str, count: u32) {
        self.state
            .lock()
            .unwrap()
            .forced_conflicts
            .insert(store_key::<K>("default", name), count);
    }

    /// Make every replace of the named object fail with a server error
    pub fn fail_replaces<K: StoreResource>(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .failing
            .insert(store_key::<K>("default", name));
    }

    /// Undo `fail_replaces`
    pub fn heal<K: StoreResource>(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .failing
            .remove(&store_key::<K>("default", name));
    }

    /// Delete the named object as soon as a list has returned it
    pub fn delete_after_list<K: StoreResource>(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .vanishing
            .insert(store_key::<K>("default", name), Vanish::AfterList);
    }

    /// Delete the named object as soon as a get has returned it
    pub fn delete_after_get<K: StoreResource>(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .vanishing
            .insert(store_key::<K>("default", name), Vanish::AfterGet);
    }

    /// Number of successful replaces of the named object
    pub fn replace_count<K: StoreResource>(&self, name: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .replaces
            .get(&store_key::<K>("default", name))
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl ObjectStore for InMemoryStore {
    async fn get<K: StoreResource>(&self, namespace: &str, name: &str) -> Result<Option<K>> {
        let skey = store_key::<K>(namespace, name);
        let mut state = self.state.lock().unwrap();
        let Some(value) = state.objects.get(&skey) else {
            return Ok(None);
        };
        let object: K = serde_json::from_value(value.clone())?;
        if state.vanishing.get(&skey) == Some(&Vanish::AfterGet) {
            state.vanishing.remove(&skey);
            state.objects.remove(&skey);
        }
        Ok(Some(object))
    }

    async fn list<K: StoreResource>(&self, namespace: &str, with_label: &str) -> Result<Vec<K>> {
        let kind = K::kind(&()).to_string();
        let mut state = self.state.lock().unwrap();
        let mut items = Vec::new();
        let mut listed = Vec::new();
        for (skey, value) in &state.objects {
            let (k, ns, _) = skey;
            if *k != kind || ns != namespace {
                continue;
            }
            let object: K = serde_json::from_value(value.clone())?;
            if object.labels().contains_key(with_label) {
                items.push(object);
                listed.push(skey.clone());
            }
        }
        for skey in listed {
            if state.vanishing.get(&skey) == Some(&Vanish::AfterList) {
                state.vanishing.remove(&skey);
                state.objects.remove(&skey);
            }
        }
        Ok(items)
    }

    async fn replace<K: StoreResource>(&self, object: &K) -> Result<K> {
        let key = ObjectKey::of(object);
        let skey = store_key::<K>(&key.namespace, &key.name);
        let mut state = self.state.lock().unwrap();

        if state.failing.contains(&skey) {
            return Err(SecretSyncError::KubeError(kube::Error::Api(ErrorResponse {
                status: "Failure".to_string(),
                message: "etcdserver: request timed out".to_string(),
                reason: "InternalError".to_string(),
                code: 500,
            })));
        }

        if let Some(remaining) = state.forced_conflicts.get_mut(&skey) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(SecretSyncError::Conflict(format!("{} (injected)", key)));
            }
        }

        let Some(current) = state.objects.get(&skey) else {
            return Err(SecretSyncError::NotFound(key.to_string()));
        };
        let current_version = current["metadata"]["resourceVersion"].as_str().map(str::to_string);
        if current_version != object.resource_version() {
            return Err(SecretSyncError::Conflict(format!(
                "{}: stored version {:?}, got {:?}",
                key,
                current_version,
                object.resource_version()
            )));
        }

        state.revision += 1;
        let mut updated = object.clone();
        updated.meta_mut().resource_version = Some(state.revision.to_string());
        state
            .objects
            .insert(skey.clone(), serde_json::to_value(&updated)?);
        *state.replaces.entry(skey).or_default() += 1;
        Ok(updated)
    }
}
