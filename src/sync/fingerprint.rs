// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Change detection for secret data.
//!
//! The fingerprint is a 32-bit FNV-1a hash over the JSON encoding of the
//! secret's `data` map, printed in decimal. `data` is a `BTreeMap`, so keys
//! serialize in sorted order and the encoding is canonical. The format matches
//! the `hashedData` annotations already present on synced secrets.

use crate::error::Result;
use crate::types::SyncedSecret;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::ByteString;
use std::collections::BTreeMap;

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Result of comparing a secret's data against its recorded fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub changed: bool,
    pub fingerprint: String,
}

/// Fingerprint secret data, `None` and empty data being distinct
pub fn fingerprint(data: Option<&BTreeMap<String, ByteString>>) -> Result<String> {
    let encoded = serde_json::to_vec(&data)?;
    Ok(fnv1a_32(&encoded).to_string())
}

/// Compare the secret's current data with the fingerprint recorded on it.
///
/// A secret without a recorded fingerprint is always reported as changed.
pub fn detect(secret: &Secret) -> Result<Detection> {
    let fingerprint = fingerprint(secret.data.as_ref())?;
    let changed = secret.recorded_fingerprint() != Some(fingerprint.as_str());
    Ok(Detection {
        changed,
        fingerprint,
    })
}

fn fnv1a_32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, b| {
        (hash ^ u32::from(*b)).wrapping_mul(FNV_PRIME)
    })
}
