// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Typed views over the label and annotation conventions on Secrets and Deployments.

pub mod key;
pub mod secret;

pub use key::ObjectKey;
pub use secret::SyncedSecret;
