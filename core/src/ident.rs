//! Short document identifiers.
//!
//! A path is hashed with CRC-32 and the checksum is written in base 62,
//! most significant digit first. Ids are only as unique as the checksum, so
//! [`IdentifierMap::assign`] refuses to let two paths share one.

use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

const BASE62: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Checksum over a path's UTF-8 bytes.
pub type Checksum = fn(&[u8]) -> u32;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShortId(String);

impl ShortId {
    pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ShortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

/// Base-62 rendering without padding. Zero is `"0"`.
pub fn encode_base62(mut n: u32) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE62[(n % 62) as usize]);
        n /= 62;
    }
    digits.reverse();
    // BASE62 is ASCII
    String::from_utf8(digits).unwrap_or_default()
}

/// ShortId -> canonical path, filled in as documents are visited.
#[derive(Debug, Clone)]
pub struct IdentifierMap {
    checksum: Checksum,
    ids: BTreeMap<ShortId, String>,
}

impl Default for IdentifierMap {
    fn default() -> Self { Self::with_checksum(crc32fast::hash) }
}

impl IdentifierMap {
    pub fn new() -> Self { Self::default() }

    pub fn with_checksum(checksum: Checksum) -> Self {
        Self { checksum, ids: BTreeMap::new() }
    }

    /// Id for `path` without recording it.
    pub fn short_id(&self, path: &str) -> ShortId {
        ShortId(encode_base62((self.checksum)(path.as_bytes())))
    }

    /// Record `path` and return its id. Assigning the same path twice is a
    /// no-op; a different path on an existing id is an error and leaves the
    /// map unchanged.
    pub fn assign(&mut self, path: &str) -> Result<ShortId> {
        let id = self.short_id(path);
        match self.ids.get(&id) {
            Some(existing) if existing != path => Err(IndexError::IdentifierCollision {
                id,
                existing: existing.clone(),
                incoming: path.to_string(),
            }),
            Some(_) => Ok(id),
            None => {
                self.ids.insert(id.clone(), path.to_string());
                Ok(id)
            }
        }
    }

    pub fn resolve(&self, id: &ShortId) -> Option<&str> {
        self.ids.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize { self.ids.len() }

    pub fn is_empty(&self) -> bool { self.ids.is_empty() }

    pub fn into_inner(self) -> BTreeMap<ShortId, String> { self.ids }
}
