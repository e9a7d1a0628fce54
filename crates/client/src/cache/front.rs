//! Cache-aside orchestration around the vault calls.
//!
//! Writes warm the cache after the vault accepted them, reads are answered
//! from the cache first and only the misses go to the vault. No lock is held
//! across a vault round trip, so two readers may fetch the same missing vid.

use std::sync::Arc;

use common::VaultError;
use tracing::{debug, warn};

use super::KvStore;

/// Result of splitting requested vids into cached and uncached ones.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Partition {
    /// `(vid, plaintext)` served from the cache.
    pub hits: Vec<(String, String)>,
    /// Vids that must be fetched, in request order without duplicates.
    pub misses: Vec<String>,
}

/// Cache front over a caller-supplied [`KvStore`].
#[derive(Clone)]
pub struct CacheFront {
    store: Arc<dyn KvStore>,
}

impl std::fmt::Debug for CacheFront {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheFront").finish_non_exhaustive()
    }
}

impl CacheFront {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Remember `plaintext` for `vid`, replacing any earlier value.
    ///
    /// Called after a successful remote write. A store failure is logged and
    /// swallowed since the vault already holds the data.
    pub fn remember(&self, vid: &str, plaintext: &str) {
        if let Err(e) = self.store.set(vid, plaintext.as_bytes()) {
            warn!(error = %e, "failed to update local cache");
        }
    }

    /// Split `vids` into cache hits and misses.
    ///
    /// Unreadable cache entries count as misses.
    pub fn partition(&self, vids: &[String]) -> Partition {
        let mut out = Partition::default();
        for vid in vids {
            if out.hits.iter().any(|(v, _)| v == vid) || out.misses.contains(vid) {
                continue;
            }
            match self.store.get(vid) {
                Ok(Some(bytes)) if !bytes.is_empty() => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => out.hits.push((vid.clone(), text)),
                    Err(_) => {
                        warn!("cached entry is not valid UTF-8, refetching");
                        out.misses.push(vid.clone());
                    }
                },
                Ok(_) => out.misses.push(vid.clone()),
                Err(e) => {
                    warn!(error = %e, "cache read failed, refetching");
                    out.misses.push(vid.clone());
                }
            }
        }
        debug!(
            hits = out.hits.len(),
            misses = out.misses.len(),
            "cache lookup"
        );
        out
    }

    /// Clear the given vids, or every cached entry when `vids` is `None`.
    /// Returns the number of entries that were present and got cleared.
    ///
    /// # Errors
    ///
    /// Propagates the first store failure.
    pub fn wipe(&self, vids: Option<&[String]>) -> Result<usize, VaultError> {
        let Some(vids) = vids else {
            let keys = self.store.list("*")?;
            for key in &keys {
                self.store.set(key, &[])?;
            }
            debug!(count = keys.len(), "wiped local cache");
            return Ok(keys.len());
        };

        let mut cleared = 0;
        let mut seen: Vec<&String> = Vec::with_capacity(vids.len());
        for vid in vids {
            if seen.contains(&vid) {
                continue;
            }
            seen.push(vid);
            // an unreadable entry is still cleared, just not counted
            let present = matches!(self.store.get(vid), Ok(Some(b)) if !b.is_empty());
            self.store.set(vid, &[])?;
            if present {
                cleared += 1;
            }
        }
        debug!(count = cleared, "wiped local cache");
        Ok(cleared)
    }

    /// Number of cached entries.
    ///
    /// # Errors
    ///
    /// Propagates a store failure.
    pub fn len(&self) -> Result<usize, VaultError> {
        Ok(self.store.list("*")?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{MemoryStore, MockKvStore, StoreError};
    use bytes::Bytes;

    fn vids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn partition_splits_hits_and_misses() {
        let front = CacheFront::new(Arc::new(MemoryStore::new()));
        front.remember("v1", "Jane");
        let p = front.partition(&vids(&["v1", "v2", "v2"]));
        assert_eq!(p.hits, vec![("v1".to_string(), "Jane".to_string())]);
        assert_eq!(p.misses, vids(&["v2"]));
    }

    #[test]
    fn wipe_all_and_some() {
        let front = CacheFront::new(Arc::new(MemoryStore::new()));
        front.remember("v1", "a");
        front.remember("v2", "b");
        front.remember("v3", "c");
        assert_eq!(front.len().unwrap(), 3);
        assert_eq!(front.wipe(Some(&vids(&["v2"]))).unwrap(), 1);
        assert_eq!(front.len().unwrap(), 2);
        // absent and repeated vids are not counted
        assert_eq!(front.wipe(Some(&vids(&["v2", "v9", "v3", "v3"]))).unwrap(), 1);
        assert_eq!(front.len().unwrap(), 1);
        assert_eq!(front.wipe(None).unwrap(), 1);
        assert_eq!(front.len().unwrap(), 0);
    }

    #[test]
    fn read_failure_is_a_miss() {
        let mut store = MockKvStore::new();
        store
            .expect_get()
            .returning(|_| Err(StoreError::Unavailable("down".into())));
        let front = CacheFront::new(Arc::new(store));
        let p = front.partition(&vids(&["v1"]));
        assert!(p.hits.is_empty());
        assert_eq!(p.misses, vids(&["v1"]));
    }

    #[test]
    fn non_utf8_entry_is_a_miss() {
        let mut store = MockKvStore::new();
        store
            .expect_get()
            .returning(|_| Ok(Some(Bytes::from_static(&[0xff, 0xfe]))));
        let front = CacheFront::new(Arc::new(store));
        assert_eq!(front.partition(&vids(&["v1"])).misses, vids(&["v1"]));
    }

    #[test]
    fn write_failure_is_swallowed() {
        let mut store = MockKvStore::new();
        store
            .expect_set()
            .times(1)
            .returning(|_, _| Err(StoreError::Unavailable("full".into())));
        let front = CacheFront::new(Arc::new(store));
        front.remember("v1", "Jane");
    }

    #[test]
    fn wipe_clears_unreadable_entry_without_counting_it() {
        let mut store = MockKvStore::new();
        store
            .expect_get()
            .returning(|_| Err(StoreError::Unavailable("down".into())));
        store.expect_set().times(1).returning(|_, _| Ok(()));
        let front = CacheFront::new(Arc::new(store));
        assert_eq!(front.wipe(Some(&vids(&["v1"]))).unwrap(), 0);
    }

    #[test]
    fn wipe_propagates_list_failure() {
        let mut store = MockKvStore::new();
        store
            .expect_list()
            .returning(|_| Err(StoreError::Unavailable("down".into())));
        let front = CacheFront::new(Arc::new(store));
        assert!(matches!(
            front.wipe(None),
            Err(VaultError::GeneralFailure(_))
        ));
    }
}
