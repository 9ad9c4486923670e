use crate::cache::{CacheBackend, Connect};
use crate::error::TriplexError;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct Store {
    sets: FxHashMap<String, FxHashSet<String>>,
    hashes: FxHashMap<String, FxHashMap<String, String>>,
    lists: FxHashMap<String, Vec<String>>,
    offline: bool,
}

#[derive(bincode::Encode, bincode::Decode)]
struct Snapshot {
    sets: Vec<(String, Vec<String>)>,
    hashes: Vec<(String, Vec<(String, String)>)>,
    lists: Vec<(String, Vec<String>)>,
}

/// In-process store. Clones are handles onto the same data, so each worker
/// can hold its own "connection" while every primitive runs under one lock.
#[derive(Clone, Default)]
pub struct MemoryCache {
    store: Arc<Mutex<Store>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Store>, TriplexError> {
        let guard = self
            .store
            .lock()
            .map_err(|_| TriplexError::Cache("memory cache lock poisoned".to_string()))?;
        if guard.offline {
            return Err(TriplexError::Cache("memory cache is offline".to_string()));
        }
        Ok(guard)
    }

    /// Simulates losing the store: every handle fails until brought back.
    pub fn set_offline(&self, offline: bool) {
        let mut guard = match self.store.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.offline = offline;
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), TriplexError> {
        let snapshot = {
            let store = self.lock()?;
            Snapshot {
                sets: store
                    .sets
                    .iter()
                    .map(|(k, v)| (k.clone(), v.iter().cloned().collect()))
                    .collect(),
                hashes: store
                    .hashes
                    .iter()
                    .map(|(k, v)| (k.clone(), v.iter().map(|(f, x)| (f.clone(), x.clone())).collect()))
                    .collect(),
                lists: store.lists.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            }
        };
        let bytes = bincode::encode_to_vec(&snapshot, bincode::config::standard())?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub fn load_from_path(path: &Path) -> Result<Self, TriplexError> {
        let data = std::fs::read(path)?;
        let (snapshot, _): (Snapshot, usize) =
            bincode::decode_from_slice(&data, bincode::config::standard())?;
        let store = Store {
            sets: snapshot
                .sets
                .into_iter()
                .map(|(k, v)| (k, v.into_iter().collect()))
                .collect(),
            hashes: snapshot
                .hashes
                .into_iter()
                .map(|(k, v)| (k, v.into_iter().collect()))
                .collect(),
            lists: snapshot.lists.into_iter().collect(),
            offline: false,
        };
        Ok(Self { store: Arc::new(Mutex::new(store)) })
    }
}

impl CacheBackend for MemoryCache {
    fn ping(&mut self) -> Result<(), TriplexError> {
        self.lock().map(|_| ())
    }

    fn sadd(&mut self, key: &str, member: &str) -> Result<bool, TriplexError> {
        let mut store = self.lock()?;
        Ok(store.sets.entry(key.to_string()).or_default().insert(member.to_string()))
    }

    fn spop(&mut self, key: &str) -> Result<Option<String>, TriplexError> {
        let mut store = self.lock()?;
        let Some(set) = store.sets.get_mut(key) else {
            return Ok(None);
        };
        let member = set.iter().next().cloned();
        if let Some(m) = &member {
            set.remove(m);
        }
        if set.is_empty() {
            store.sets.remove(key);
        }
        Ok(member)
    }

    fn smembers(&mut self, key: &str) -> Result<Vec<String>, TriplexError> {
        let store = self.lock()?;
        Ok(store
            .sets
            .get(key)
            .map(|s| s.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn scard(&mut self, key: &str) -> Result<usize, TriplexError> {
        let store = self.lock()?;
        Ok(store.sets.get(key).map_or(0, |s| s.len()))
    }

    fn hset_all(&mut self, key: &str, fields: &[(&str, &str)]) -> Result<(), TriplexError> {
        let mut store = self.lock()?;
        let hash = store.hashes.entry(key.to_string()).or_default();
        for (name, value) in fields {
            hash.insert(name.to_string(), value.to_string());
        }
        Ok(())
    }

    fn hget(&mut self, key: &str, field: &str) -> Result<Option<String>, TriplexError> {
        let store = self.lock()?;
        Ok(store.hashes.get(key).and_then(|h| h.get(field)).cloned())
    }

    fn rpush(&mut self, key: &str, value: &str) -> Result<(), TriplexError> {
        let mut store = self.lock()?;
        store.lists.entry(key.to_string()).or_default().push(value.to_string());
        Ok(())
    }

    fn lrange(&mut self, key: &str) -> Result<Vec<String>, TriplexError> {
        let store = self.lock()?;
        Ok(store.lists.get(key).cloned().unwrap_or_default())
    }
}

impl Connect for MemoryCache {
    type Conn = MemoryCache;

    fn connect(&self) -> Result<MemoryCache, TriplexError> {
        let mut conn = self.clone();
        conn.ping()?;
        Ok(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_spop_drains_set() {
        let mut cache = MemoryCache::new();
        cache.sadd("q", "a").unwrap();
        cache.sadd("q", "b").unwrap();
        let mut popped = HashSet::new();
        while let Some(m) = cache.spop("q").unwrap() {
            popped.insert(m);
        }
        assert_eq!(popped, HashSet::from(["a".to_string(), "b".to_string()]));
        assert_eq!(cache.scard("q").unwrap(), 0);
    }

    #[test]
    fn test_spop_missing_key_is_none() {
        let mut cache = MemoryCache::new();
        assert_eq!(cache.spop("nothing").unwrap(), None);
    }

    #[test]
    fn test_sadd_reports_new_membership() {
        let mut cache = MemoryCache::new();
        assert!(cache.sadd("s", "x").unwrap());
        assert!(!cache.sadd("s", "x").unwrap());
    }

    #[test]
    fn test_concurrent_spop_is_exclusive() {
        let mut cache = MemoryCache::new();
        for i in 0..1000 {
            cache.sadd("q", &format!("t{}", i)).unwrap();
        }
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let mut conn = cache.connect().unwrap();
                std::thread::spawn(move || {
                    let mut got = Vec::new();
                    while let Some(m) = conn.spop("q").unwrap() {
                        got.push(m);
                    }
                    got
                })
            })
            .collect();
        let mut all = Vec::new();
        for h in handles {
            all.extend(h.join().unwrap());
        }
        let distinct: HashSet<_> = all.iter().cloned().collect();
        assert_eq!(all.len(), 1000);
        assert_eq!(distinct.len(), 1000);
    }

    #[test]
    fn test_offline_fails_every_primitive() {
        let mut cache = MemoryCache::new();
        cache.set_offline(true);
        assert!(cache.ping().unwrap_err().is_cache_failure());
        assert!(cache.spop("q").is_err());
        assert!(cache.connect().is_err());
        cache.set_offline(false);
        assert!(cache.ping().is_ok());
    }

    #[test]
    fn test_snapshot_round_trip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("cache.bin");
        let mut cache = MemoryCache::new();
        cache.sadd("set", "m").unwrap();
        cache.hset_all("hash", &[("gene_start", "100")]).unwrap();
        cache.rpush("list", "a").unwrap();
        cache.rpush("list", "a").unwrap();
        cache.save_to_path(&path).unwrap();

        let mut loaded = MemoryCache::load_from_path(&path).unwrap();
        assert_eq!(loaded.smembers("set").unwrap(), vec!["m"]);
        assert_eq!(loaded.hget("hash", "gene_start").unwrap(), Some("100".to_string()));
        assert_eq!(loaded.lrange("list").unwrap(), vec!["a", "a"]);
    }
}
