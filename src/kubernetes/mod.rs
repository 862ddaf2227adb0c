// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Kubernetes object store access.

pub mod store;

pub use store::{update_with_retry, KubeStore, ObjectStore, StoreResource};
