//! Key-value staging for atomic scopes.
//!
//! Backends expose a read-only [`KvRead`] view of committed data. An
//! [`Overlay`] layers the writes of one scope on top of it, so reads inside the
//! scope see those writes, and hands the final write set back to the backend
//! to apply in one step.

use crate::error::Result;
use std::collections::BTreeMap;

/// Read access to ordered string-keyed bytes.
pub trait KvRead {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Entries whose key starts with `prefix`, ascending by key.
    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>>;
}

/// Read-write access.
pub trait Kv: KvRead {
    fn put(&mut self, key: String, value: Vec<u8>);
    fn delete(&mut self, key: String);
}

/// A staged mutation of one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Write {
    Put(Vec<u8>),
    Delete,
}

/// Writes of one scope over a committed base.
pub struct Overlay<'a, B: KvRead + ?Sized> {
    base: &'a B,
    staged: BTreeMap<String, Write>,
}

impl<'a, B: KvRead + ?Sized> Overlay<'a, B> {
    pub fn new(base: &'a B) -> Self {
        Self {
            base,
            staged: BTreeMap::new(),
        }
    }

    /// The final write set, ordered by key.
    pub fn into_writes(self) -> BTreeMap<String, Write> {
        self.staged
    }
}

impl<B: KvRead + ?Sized> KvRead for Overlay<'_, B> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        match self.staged.get(key) {
            Some(Write::Put(value)) => Ok(Some(value.clone())),
            Some(Write::Delete) => Ok(None),
            None => self.base.get(key),
        }
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>> {
        let mut merged: BTreeMap<String, Vec<u8>> =
            self.base.scan_prefix(prefix)?.into_iter().collect();
        let staged = self
            .staged
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix));
        for (key, write) in staged {
            match write {
                Write::Put(value) => {
                    merged.insert(key.clone(), value.clone());
                }
                Write::Delete => {
                    merged.remove(key);
                }
            }
        }
        Ok(merged.into_iter().collect())
    }
}

impl<B: KvRead + ?Sized> Kv for Overlay<'_, B> {
    fn put(&mut self, key: String, value: Vec<u8>) {
        self.staged.insert(key, Write::Put(value));
    }

    fn delete(&mut self, key: String) {
        self.staged.insert(key, Write::Delete);
    }
}

impl KvRead for BTreeMap<String, Vec<u8>> {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(BTreeMap::get(self, key).cloned())
    }

    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>> {
        Ok(self
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

/// Apply a write set to an in-memory map.
pub(crate) fn apply_writes(target: &mut BTreeMap<String, Vec<u8>>, writes: BTreeMap<String, Write>) {
    for (key, write) in writes {
        match write {
            Write::Put(value) => {
                target.insert(key, value);
            }
            Write::Delete => {
                target.remove(&key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> BTreeMap<String, Vec<u8>> {
        let mut map = BTreeMap::new();
        map.insert("a:1".to_string(), b"one".to_vec());
        map.insert("a:2".to_string(), b"two".to_vec());
        map.insert("b:1".to_string(), b"other".to_vec());
        map
    }

    #[test]
    fn reads_see_staged_writes() {
        let base = base();
        let mut overlay = Overlay::new(&base);
        overlay.put("a:3".into(), b"three".to_vec());
        overlay.delete("a:1".into());

        assert_eq!(overlay.get("a:1").unwrap(), None);
        assert_eq!(overlay.get("a:3").unwrap(), Some(b"three".to_vec()));
        assert_eq!(overlay.get("b:1").unwrap(), Some(b"other".to_vec()));

        let keys: Vec<_> = overlay
            .scan_prefix("a:")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec!["a:2", "a:3"]);

        // base untouched until applied
        assert_eq!(base.len(), 3);
    }

    #[test]
    fn apply_commits_all_writes() {
        let mut target = base();
        let writes = {
            let mut overlay = Overlay::new(&target);
            overlay.put("a:2".into(), b"TWO".to_vec());
            overlay.delete("b:1".into());
            overlay.into_writes()
        };
        apply_writes(&mut target, writes);
        assert_eq!(target.get("a:2"), Some(&b"TWO".to_vec()));
        assert!(!target.contains_key("b:1"));
    }
}
