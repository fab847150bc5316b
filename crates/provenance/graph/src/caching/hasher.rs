//! Canonical, type-tagged encoding of hashable node content.
//!
//! Every value is written as a one-byte tag followed by its payload.
//! Integers and floats carry different tags, so `1` and `1.0` never
//! collide. Map entries are written in key order, so insertion order never
//! matters. Strings, lists and maps are length-prefixed, which keeps
//! adjacent values from running into each other.

use crate::error::HashingError;
use provenance_types::ContentHash;
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// Version of the encoding; bumping it invalidates every stored hash.
pub const HASH_SCHEME: &str = "provenance-content-hash/1";

const TAG_NULL: u8 = 0x00;
const TAG_FALSE: u8 = 0x01;
const TAG_TRUE: u8 = 0x02;
const TAG_INT: u8 = 0x03;
const TAG_FLOAT: u8 = 0x04;
const TAG_STRING: u8 = 0x05;
const TAG_LIST: u8 = 0x06;
const TAG_MAP: u8 = 0x07;

/// Incremental BLAKE3 hasher over the canonical encoding.
pub(crate) struct CanonicalHasher {
    hasher: blake3::Hasher,
}

impl CanonicalHasher {
    pub fn new() -> Self {
        let mut hasher = Self {
            hasher: blake3::Hasher::new(),
        };
        hasher.string(HASH_SCHEME);
        hasher
    }

    fn tag(&mut self, tag: u8) {
        self.hasher.update(&[tag]);
    }

    fn length(&mut self, len: usize) {
        self.hasher.update(&(len as u64).to_le_bytes());
    }

    pub fn null(&mut self) {
        self.tag(TAG_NULL);
    }

    pub fn string(&mut self, s: &str) {
        self.tag(TAG_STRING);
        self.length(s.len());
        self.hasher.update(s.as_bytes());
    }

    pub fn map_header(&mut self, len: usize) {
        self.tag(TAG_MAP);
        self.length(len);
    }

    fn number(&mut self, path: &str, n: &Number) -> Result<(), HashingError> {
        if let Some(i) = n.as_i64() {
            self.tag(TAG_INT);
            self.hasher.update(&i128::from(i).to_le_bytes());
        } else if let Some(u) = n.as_u64() {
            self.tag(TAG_INT);
            self.hasher.update(&i128::from(u).to_le_bytes());
        } else {
            let f = n.as_f64().unwrap_or(f64::NAN);
            if !f.is_finite() {
                return Err(HashingError::NonFinite {
                    path: path.to_string(),
                });
            }
            // -0.0 and 0.0 compare equal and must hash equal.
            let f = if f == 0.0 { 0.0 } else { f };
            self.tag(TAG_FLOAT);
            self.hasher.update(&f.to_bits().to_le_bytes());
        }
        Ok(())
    }

    pub fn value(&mut self, path: &str, value: &Value) -> Result<(), HashingError> {
        match value {
            Value::Null => self.null(),
            Value::Bool(false) => self.tag(TAG_FALSE),
            Value::Bool(true) => self.tag(TAG_TRUE),
            Value::Number(n) => self.number(path, n)?,
            Value::String(s) => self.string(s),
            Value::Array(items) => {
                self.tag(TAG_LIST);
                self.length(items.len());
                for (i, item) in items.iter().enumerate() {
                    self.value(&format!("{}[{}]", path, i), item)?;
                }
            }
            Value::Object(map) => {
                let mut entries: Vec<(&String, &Value)> = map.iter().collect();
                entries.sort_by(|a, b| a.0.cmp(b.0));
                self.map_header(entries.len());
                for (key, item) in entries {
                    self.string(key);
                    self.value(&format!("{}.{}", path, key), item)?;
                }
            }
        }
        Ok(())
    }

    pub fn finish(&self) -> ContentHash {
        ContentHash::from_hasher(&self.hasher)
    }
}

/// Hash of a single JSON value under the canonical encoding.
pub fn hash_value(value: &Value) -> Result<ContentHash, HashingError> {
    let mut hasher = CanonicalHasher::new();
    hasher.value("", value)?;
    Ok(hasher.finish())
}

/// The hashable content of one node.
#[derive(Debug)]
pub(crate) struct HashObject<'a> {
    pub type_string: &'a str,
    pub process_type: Option<&'a str>,
    /// Attributes left after dropping hash-ignored keys, in key order.
    pub attributes: Vec<(&'a str, &'a Value)>,
    /// Repository path to BLAKE3 hex digest of the content.
    pub repository: BTreeMap<&'a str, String>,
    /// Input link label to input hash; `None` for data nodes.
    pub inputs: Option<BTreeMap<String, ContentHash>>,
}

impl HashObject<'_> {
    pub fn digest(&self) -> Result<ContentHash, HashingError> {
        let mut hasher = CanonicalHasher::new();

        hasher.string("type_string");
        hasher.string(self.type_string);

        hasher.string("process_type");
        match self.process_type {
            Some(process_type) => hasher.string(process_type),
            None => hasher.null(),
        }

        let mut attributes = self.attributes.clone();
        attributes.sort_by(|a, b| a.0.cmp(b.0));
        hasher.string("attributes");
        hasher.map_header(attributes.len());
        for (key, value) in attributes {
            hasher.string(key);
            hasher.value(key, value)?;
        }

        hasher.string("repository");
        hasher.map_header(self.repository.len());
        for (path, digest) in &self.repository {
            hasher.string(path);
            hasher.string(digest);
        }

        hasher.string("inputs");
        match &self.inputs {
            Some(inputs) => {
                hasher.map_header(inputs.len());
                for (label, hash) in inputs {
                    hasher.string(label);
                    hasher.string(&hash.to_hex());
                }
            }
            None => hasher.null(),
        }

        Ok(hasher.finish())
    }
}
