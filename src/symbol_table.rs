//! Name → definition lookup table used to resolve nested struct references
//!
//! A string-keyed hash map with chained buckets. Insertion is
//! reject-on-duplicate: an existing entry is never overwritten, and the
//! rejected key is handed back to the caller. The bucket array starts at
//! [`DEFAULT_BUCKETS`] and doubles whenever the load factor reaches 3/4,
//! rehashing every entry, so lookups stay cheap as the table fills. Keys are
//! hashed with [`FxHasher`].
//!
//! Each parse session owns its own table; nothing here is shared or global,
//! so independent parses can run concurrently without coordination.

use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Default number of buckets for a new table.
pub const DEFAULT_BUCKETS: usize = 128;

/// Returned by [`SymbolTable::insert`] when the key is already present.
/// Carries the rejected key back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("duplicate symbol '{0}'")]
pub struct DuplicateKey(pub String);

#[derive(Debug, Clone)]
struct Entry<V> {
    key: String,
    value: V,
    next: Option<Box<Entry<V>>>,
}

/// String-keyed hash map with chained buckets and reject-on-duplicate insert.
#[derive(Debug, Clone)]
pub struct SymbolTable<V> {
    buckets: Vec<Option<Box<Entry<V>>>>,
    len: usize,
}

impl<V> SymbolTable<V> {
    /// Create a table with [`DEFAULT_BUCKETS`] buckets.
    pub fn new() -> Self {
        Self::with_buckets(DEFAULT_BUCKETS)
    }

    /// Create a table with a specific initial bucket count (minimum 1).
    pub fn with_buckets(buckets: usize) -> Self {
        Self {
            buckets: (0..buckets.max(1)).map(|_| None).collect(),
            len: 0,
        }
    }

    /// Number of entries in the table.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current size of the bucket array.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Insert a new entry. Fails with [`DuplicateKey`] when the key is
    /// already present; the existing entry is left untouched.
    pub fn insert(&mut self, key: String, value: V) -> Result<(), DuplicateKey> {
        if self.contains_key(&key) {
            return Err(DuplicateKey(key));
        }
        if (self.len + 1) * 4 > self.buckets.len() * 3 {
            self.grow();
        }

        let index = bucket_index(&key, self.buckets.len());
        let entry = Box::new(Entry {
            key,
            value,
            next: self.buckets[index].take(),
        });
        self.buckets[index] = Some(entry);
        self.len += 1;
        Ok(())
    }

    /// Look up a value by key, walking the bucket's chain.
    pub fn get(&self, key: &str) -> Option<&V> {
        let index = bucket_index(key, self.buckets.len());
        let mut entry = self.buckets[index].as_deref();
        while let Some(e) = entry {
            if e.key == key {
                return Some(&e.value);
            }
            entry = e.next.as_deref();
        }
        None
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Double the bucket array and rehash every entry into it.
    fn grow(&mut self) {
        let new_count = self.buckets.len() * 2;
        let old = std::mem::replace(
            &mut self.buckets,
            (0..new_count).map(|_| None).collect(),
        );
        for mut slot in old {
            while let Some(mut entry) = slot {
                slot = entry.next.take();
                let index = bucket_index(&entry.key, new_count);
                entry.next = self.buckets[index].take();
                self.buckets[index] = Some(entry);
            }
        }
    }
}

impl<V> Default for SymbolTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

fn bucket_index(key: &str, bucket_count: usize) -> usize {
    let mut hasher = FxHasher::default();
    key.hash(&mut hasher);
    (hasher.finish() as usize) % bucket_count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut table = SymbolTable::new();
        table.insert("Point".to_string(), 0).unwrap();
        table.insert("Line".to_string(), 1).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.get("Point"), Some(&0));
        assert_eq!(table.get("Line"), Some(&1));
        assert_eq!(table.get("Circle"), None);
        assert!(table.contains_key("Point"));
        assert!(!table.contains_key("point"));
    }

    #[test]
    fn test_duplicate_insert_rejected() {
        let mut table = SymbolTable::new();
        table.insert("Point".to_string(), 0).unwrap();

        let err = table.insert("Point".to_string(), 7).unwrap_err();
        assert_eq!(err, DuplicateKey("Point".to_string()));

        // first entry survives
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("Point"), Some(&0));
    }

    #[test]
    fn test_grows_when_load_factor_exceeded() {
        let mut table = SymbolTable::with_buckets(4);
        assert_eq!(table.bucket_count(), 4);

        for i in 0..32 {
            table.insert(format!("key_{}", i), i).unwrap();
        }

        assert!(table.bucket_count() > 4);
        assert_eq!(table.len(), 32);
        for i in 0..32 {
            assert_eq!(table.get(&format!("key_{}", i)), Some(&i));
        }
    }

    #[test]
    fn test_lookup_survives_collisions() {
        // enough entries that many buckets hold multi-entry chains
        let mut table = SymbolTable::with_buckets(1);
        for i in 0..200 {
            table.insert(format!("struct_{}", i), i).unwrap();
        }

        assert_eq!(table.len(), 200);
        for i in 0..200 {
            assert_eq!(table.get(&format!("struct_{}", i)), Some(&i));
        }
        assert_eq!(table.get("struct_200"), None);
    }

    #[test]
    fn test_zero_bucket_request_clamped() {
        let mut table = SymbolTable::with_buckets(0);
        assert_eq!(table.bucket_count(), 1);
        table.insert("A".to_string(), ()).unwrap();
        assert_eq!(table.get("A"), Some(&()));
    }
}
