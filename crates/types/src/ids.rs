//! Stable element identities.
//!
//! An id is a hash of a caller-supplied name, optionally mixed with an index,
//! so the same declaration maps to the same id on every frame. Persistent
//! state such as scroll offsets and hit-test boxes is keyed by `id`.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Seed used for ids created directly from user strings.
pub const DEFAULT_SEED: u32 = 0;

/// Name hashed to produce the id of the implicit root container.
pub const ROOT_CONTAINER_NAME: &str = "Trellis__RootContainer";

/// Identity of an element.
///
/// Equality and hashing only consider the numeric `id`; `name` is carried for
/// diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct ElementId {
    pub id: u32,
    pub offset: u32,
    pub base_id: u32,
    pub name: Arc<str>,
}

impl ElementId {
    /// Hashes `name` into a new id.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        let name = name.into();
        hash_string(name, DEFAULT_SEED)
    }

    /// Hashes `name` mixed with `index`, for elements produced in a loop.
    /// `base_id` stays the hash of the bare name.
    pub fn indexed(name: impl Into<Arc<str>>, index: u32) -> Self {
        hash_string_with_offset(name.into(), index, DEFAULT_SEED)
    }

    /// Id of the implicit root container that wraps every frame.
    pub fn root() -> Self {
        Self::new(ROOT_CONTAINER_NAME)
    }

    /// An id derived from a parent id and a sibling position. Used for
    /// anonymous containers and text elements.
    pub fn child_of(parent: u32, index: u32) -> Self {
        hash_number(index, parent)
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }
}

impl PartialEq for ElementId {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ElementId {}

impl Hash for ElementId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl From<&str> for ElementId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ElementId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "#{}", self.id)
        } else if self.offset != 0 {
            write!(f, "{}[{}]", self.name, self.offset)
        } else {
            write!(f, "{}", self.name)
        }
    }
}

impl<'de> Deserialize<'de> for ElementId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum IdDef {
            Name(String),
            Indexed { name: String, index: u32 },
        }

        Ok(match IdDef::deserialize(deserializer)? {
            IdDef::Name(name) => ElementId::new(name),
            IdDef::Indexed { name, index } => ElementId::indexed(name, index),
        })
    }
}

#[inline]
fn mix(hash: u32, value: u32) -> u32 {
    let mut hash = hash.wrapping_add(value);
    hash = hash.wrapping_add(hash << 10);
    hash ^ (hash >> 6)
}

#[inline]
fn finish(mut hash: u32) -> u32 {
    hash = hash.wrapping_add(hash << 3);
    hash ^= hash >> 11;
    hash.wrapping_add(hash << 15)
}

fn hash_bytes(bytes: &[u8], seed: u32) -> u32 {
    bytes.iter().fold(seed, |hash, &b| mix(hash, u32::from(b)))
}

/// One-at-a-time hash of a string. The result is offset by one so that zero
/// never names a real element.
pub fn hash_string(name: Arc<str>, seed: u32) -> ElementId {
    let id = finish(hash_bytes(name.as_bytes(), seed)).wrapping_add(1);
    ElementId {
        id,
        offset: 0,
        base_id: id,
        name,
    }
}

pub fn hash_string_with_offset(name: Arc<str>, offset: u32, seed: u32) -> ElementId {
    let base = hash_bytes(name.as_bytes(), seed);
    let hash = mix(base, offset);
    ElementId {
        id: finish(hash).wrapping_add(1),
        offset,
        base_id: finish(base).wrapping_add(1),
        name,
    }
}

pub fn hash_number(offset: u32, seed: u32) -> ElementId {
    ElementId {
        id: hash_child(offset, seed),
        offset,
        base_id: seed,
        name: Arc::from(""),
    }
}

/// The numeric part of [`hash_number`], without building an [`ElementId`].
pub fn hash_child(offset: u32, seed: u32) -> u32 {
    finish(mix(seed, offset.wrapping_add(48))).wrapping_add(1)
}

/// Hash of arbitrary text content, used to key measurement caches.
pub fn hash_text(text: &str, seed: u32) -> u32 {
    finish(hash_bytes(text.as_bytes(), seed)).wrapping_add(1)
}
