// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Change detection and rollout of secrets to dependent deployments.

pub mod fingerprint;
pub mod manager;
pub mod rollout;

pub use fingerprint::{detect, fingerprint, Detection};
pub use manager::{SyncManager, SyncOutcome};
pub use rollout::{propagate, PropagationReport};
