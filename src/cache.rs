use crate::duplex::Duplex;
use crate::error::TriplexError;
use crate::namespace::Namespace;

pub const QUALIFYING_SUFFIX: &str = "with_mirna_pair_in_allowed_binding_range";

/// Raw store primitives. Each call is atomic on its own; nothing spans calls.
pub trait CacheBackend {
    fn ping(&mut self) -> Result<(), TriplexError>;
    /// Returns true when `member` was not yet in the set.
    fn sadd(&mut self, key: &str, member: &str) -> Result<bool, TriplexError>;
    /// Removes and returns one arbitrary member, or `None` if the set is empty.
    fn spop(&mut self, key: &str) -> Result<Option<String>, TriplexError>;
    fn smembers(&mut self, key: &str) -> Result<Vec<String>, TriplexError>;
    fn scard(&mut self, key: &str) -> Result<usize, TriplexError>;
    fn hset_all(&mut self, key: &str, fields: &[(&str, &str)]) -> Result<(), TriplexError>;
    fn hget(&mut self, key: &str, field: &str) -> Result<Option<String>, TriplexError>;
    fn rpush(&mut self, key: &str, value: &str) -> Result<(), TriplexError>;
    fn lrange(&mut self, key: &str) -> Result<Vec<String>, TriplexError>;
}

/// Opens independent connections to one store, one per worker.
pub trait Connect: Sync {
    type Conn: CacheBackend + Send;
    fn connect(&self) -> Result<Self::Conn, TriplexError>;
}

/// Key layout shared with existing deployments.
pub mod keys {
    use super::QUALIFYING_SUFFIX;

    pub fn pending_targets(ns: &str) -> String {
        format!("{}:targets", ns)
    }

    pub fn target(ns: &str, transcript_id: &str) -> String {
        format!("{}:target:{}", ns, transcript_id)
    }

    pub fn target_duplexes(target_key: &str) -> String {
        format!("{}:duplexes", target_key)
    }

    pub fn duplex(ns: &str, line: usize) -> String {
        format!("{}:duplex:line{}", ns, line)
    }

    pub fn qualifying_targets(ns: &str) -> String {
        format!("{}:targets:{}", ns, QUALIFYING_SUFFIX)
    }

    pub fn qualifying_duplexes(target_key: &str) -> String {
        format!("{}:{}", target_key, QUALIFYING_SUFFIX)
    }
}

/// Namespace-aware cache client. Targets and duplexes are passed around as
/// their full cache keys.
pub struct NamespaceCache<B: CacheBackend> {
    namespace: Namespace,
    ns_key: String,
    backend: B,
}

impl<B: CacheBackend> NamespaceCache<B> {
    pub fn new(namespace: Namespace, backend: B) -> Self {
        let ns_key = namespace.key();
        Self { namespace, ns_key, backend }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub fn ping(&mut self) -> Result<(), TriplexError> {
        self.backend.ping()
    }

    pub fn duplex_key(&self, line: usize) -> String {
        keys::duplex(&self.ns_key, line)
    }

    pub fn target_key(&self, transcript_id: &str) -> String {
        keys::target(&self.ns_key, transcript_id)
    }

    pub fn put_duplex(&mut self, duplex_key: &str, duplex: &Duplex) -> Result<(), TriplexError> {
        self.backend.hset_all(duplex_key, &duplex.fields())
    }

    pub fn add_to_target_set(&mut self, target_key: &str, duplex_key: &str) -> Result<(), TriplexError> {
        self.backend.sadd(&keys::target_duplexes(target_key), duplex_key)?;
        Ok(())
    }

    pub fn add_pending_target(&mut self, target_key: &str) -> Result<(), TriplexError> {
        self.backend.sadd(&keys::pending_targets(&self.ns_key), target_key)?;
        Ok(())
    }

    /// Pops one pending target. Exactly one caller ever receives a given target.
    pub fn claim_target(&mut self) -> Result<Option<String>, TriplexError> {
        self.backend.spop(&keys::pending_targets(&self.ns_key))
    }

    pub fn duplex_set(&mut self, target_key: &str) -> Result<Vec<String>, TriplexError> {
        self.backend.smembers(&keys::target_duplexes(target_key))
    }

    pub fn field(&mut self, duplex_key: &str, name: &str) -> Result<Option<String>, TriplexError> {
        self.backend.hget(duplex_key, name)
    }

    pub fn mark_qualifying_target(&mut self, target_key: &str) -> Result<(), TriplexError> {
        self.backend.sadd(&keys::qualifying_targets(&self.ns_key), target_key)?;
        Ok(())
    }

    pub fn append_qualifying_duplex(&mut self, target_key: &str, duplex_key: &str) -> Result<(), TriplexError> {
        self.backend.rpush(&keys::qualifying_duplexes(target_key), duplex_key)
    }

    pub fn pending_count(&mut self) -> Result<usize, TriplexError> {
        self.backend.scard(&keys::pending_targets(&self.ns_key))
    }

    pub fn qualifying_targets(&mut self) -> Result<Vec<String>, TriplexError> {
        self.backend.smembers(&keys::qualifying_targets(&self.ns_key))
    }

    pub fn qualifying_count(&mut self) -> Result<usize, TriplexError> {
        self.backend.scard(&keys::qualifying_targets(&self.ns_key))
    }

    pub fn qualifying_duplexes(&mut self, target_key: &str) -> Result<Vec<String>, TriplexError> {
        self.backend.lrange(&keys::qualifying_duplexes(target_key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_cache::MemoryCache;

    const NS: &str = "microrna.org:aug.2010:hsa:hg19";

    fn client() -> NamespaceCache<MemoryCache> {
        NamespaceCache::new(Namespace::resolve(NS).unwrap(), MemoryCache::new())
    }

    #[test]
    fn test_key_layout() {
        let target = keys::target(NS, "NM_006216");
        assert_eq!(target, "microrna.org:aug.2010:hsa:hg19:target:NM_006216");
        assert_eq!(keys::pending_targets(NS), "microrna.org:aug.2010:hsa:hg19:targets");
        assert_eq!(
            keys::target_duplexes(&target),
            "microrna.org:aug.2010:hsa:hg19:target:NM_006216:duplexes"
        );
        assert_eq!(keys::duplex(NS, 42), "microrna.org:aug.2010:hsa:hg19:duplex:line42");
        assert_eq!(
            keys::qualifying_targets(NS),
            "microrna.org:aug.2010:hsa:hg19:targets:with_mirna_pair_in_allowed_binding_range"
        );
        assert_eq!(
            keys::qualifying_duplexes(&target),
            "microrna.org:aug.2010:hsa:hg19:target:NM_006216:with_mirna_pair_in_allowed_binding_range"
        );
    }

    #[test]
    fn test_pending_targets_collapse_duplicates() {
        let mut cache = client();
        let target = cache.target_key("NM_1");
        cache.add_pending_target(&target).unwrap();
        cache.add_pending_target(&target).unwrap();
        assert_eq!(cache.pending_count().unwrap(), 1);
        assert_eq!(cache.claim_target().unwrap(), Some(target));
        assert_eq!(cache.claim_target().unwrap(), None);
    }

    #[test]
    fn test_target_set_collapses_duplicates() {
        let mut cache = client();
        let target = cache.target_key("NM_1");
        let duplex = cache.duplex_key(3);
        cache.add_to_target_set(&target, &duplex).unwrap();
        cache.add_to_target_set(&target, &duplex).unwrap();
        assert_eq!(cache.duplex_set(&target).unwrap(), vec![duplex]);
    }

    #[test]
    fn test_qualifying_list_keeps_repetition() {
        let mut cache = client();
        let target = cache.target_key("NM_1");
        cache.mark_qualifying_target(&target).unwrap();
        cache.mark_qualifying_target(&target).unwrap();
        cache.append_qualifying_duplex(&target, "a").unwrap();
        cache.append_qualifying_duplex(&target, "a").unwrap();
        assert_eq!(cache.qualifying_count().unwrap(), 1);
        assert_eq!(cache.qualifying_duplexes(&target).unwrap(), vec!["a", "a"]);
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let store = MemoryCache::new();
        let mut human = NamespaceCache::new(Namespace::resolve("1").unwrap(), store.clone());
        let mut mouse = NamespaceCache::new(Namespace::resolve("2").unwrap(), store);
        let target = human.target_key("NM_1");
        human.add_pending_target(&target).unwrap();
        assert_eq!(mouse.pending_count().unwrap(), 0);
        assert_eq!(mouse.claim_target().unwrap(), None);
        assert_eq!(human.pending_count().unwrap(), 1);
    }
}
