//! KvStore — redb-backed key/value persistence.
//!
//! One table holds every namespace; keys are stored as
//! `{namespace}/{key}` so namespace-wide operations are prefix scans.

use std::path::Path;
use std::sync::Arc;

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use tracing::debug;

use crate::error::{KvError, KvResult};

const KV: TableDefinition<&str, &str> = TableDefinition::new("kv");

/// Convert any `Display` error into a `KvError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| KvError::$variant(e.to_string())
    };
}

/// Thread-safe key/value store backed by redb.
#[derive(Clone)]
pub struct KvStore {
    db: Arc<Database>,
}

impl KvStore {
    /// Open (or create) a persistent store at the given path.
    pub fn open(path: &Path) -> KvResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_table()?;
        debug!(?path, "kv store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory store (for testing).
    pub fn open_in_memory() -> KvResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_table()?;
        debug!("in-memory kv store opened");
        Ok(store)
    }

    /// Scope all operations to one namespace.
    pub fn namespace(&self, name: &str) -> KvNamespace {
        KvNamespace {
            db: self.db.clone(),
            prefix: format!("{name}/"),
        }
    }

    fn ensure_table(&self) -> KvResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(KV).map_err(map_err!(Table))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }
}

/// A namespace-scoped view of the store.
///
/// The async signatures are the host-call contract; operations on the
/// embedded database complete without suspension.
#[derive(Clone)]
pub struct KvNamespace {
    db: Arc<Database>,
    prefix: String,
}

impl KvNamespace {
    fn table_key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }

    /// Insert or overwrite a value.
    pub async fn set(&self, key: &str, value: &str) -> KvResult<()> {
        let table_key = self.table_key(key);
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(KV).map_err(map_err!(Table))?;
            table
                .insert(table_key.as_str(), value)
                .map_err(map_err!(Write))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(key = %table_key, "kv set");
        Ok(())
    }

    /// Look up a value; `None` when the key is absent.
    pub async fn get(&self, key: &str) -> KvResult<Option<String>> {
        let table_key = self.table_key(key);
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(KV).map_err(map_err!(Table))?;
        match table.get(table_key.as_str()).map_err(map_err!(Read))? {
            Some(guard) => Ok(Some(guard.value().to_string())),
            None => Ok(None),
        }
    }

    /// Remove a key. Returns true if it existed.
    pub async fn delete(&self, key: &str) -> KvResult<bool> {
        let table_key = self.table_key(key);
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let existed;
        {
            let mut table = txn.open_table(KV).map_err(map_err!(Table))?;
            existed = table
                .remove(table_key.as_str())
                .map_err(map_err!(Write))?
                .is_some();
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(key = %table_key, existed, "kv delete");
        Ok(existed)
    }

    /// Remove every key in the namespace. Returns the number removed.
    pub async fn clear(&self) -> KvResult<u64> {
        let keys = self.scan(|key, _| key)?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let mut removed = 0;
        {
            let mut table = txn.open_table(KV).map_err(map_err!(Table))?;
            for key in &keys {
                let full = self.table_key(key);
                if table.remove(full.as_str()).map_err(map_err!(Write))?.is_some() {
                    removed += 1;
                }
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(namespace = %self.prefix, removed, "kv cleared");
        Ok(removed)
    }

    /// All keys in the namespace, in lexicographic order.
    pub async fn keys(&self) -> KvResult<Vec<String>> {
        self.scan(|key, _| key)
    }

    /// All values in the namespace, in key order.
    pub async fn values(&self) -> KvResult<Vec<String>> {
        self.scan(|_, value| value)
    }

    /// All key/value pairs in the namespace, in key order.
    pub async fn entries(&self) -> KvResult<Vec<(String, String)>> {
        self.scan(|key, value| (key, value))
    }

    /// Prefix scan over the namespace, mapping each entry. Keys are
    /// returned with the namespace prefix stripped.
    fn scan<T>(&self, f: impl Fn(String, String) -> T) -> KvResult<Vec<T>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(KV).map_err(map_err!(Table))?;
        let mut results = Vec::new();
        for entry in table.range(self.prefix.as_str()..).map_err(map_err!(Read))? {
            let (key, value) = entry.map_err(map_err!(Read))?;
            let Some(bare) = key.value().strip_prefix(&self.prefix) else {
                break; // past the namespace
            };
            results.push(f(bare.to_string(), value.value().to_string()));
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(name: &str) -> KvNamespace {
        KvStore::open_in_memory().unwrap().namespace(name)
    }

    #[tokio::test]
    async fn set_get_roundtrip() {
        let kv = ns("app");
        kv.set("greeting", "hello").await.unwrap();
        assert_eq!(kv.get("greeting").await.unwrap().as_deref(), Some("hello"));
        assert_eq!(kv.get("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn set_overwrites() {
        let kv = ns("app");
        kv.set("k", "v1").await.unwrap();
        kv.set("k", "v2").await.unwrap();
        assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("v2"));
    }

    #[tokio::test]
    async fn delete_reports_existence() {
        let kv = ns("app");
        kv.set("k", "v").await.unwrap();
        assert!(kv.delete("k").await.unwrap());
        assert!(!kv.delete("k").await.unwrap());
        assert_eq!(kv.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn keys_values_entries_in_key_order() {
        let kv = ns("app");
        kv.set("b", "2").await.unwrap();
        kv.set("a", "1").await.unwrap();
        kv.set("c", "3").await.unwrap();

        assert_eq!(kv.keys().await.unwrap(), vec!["a", "b", "c"]);
        assert_eq!(kv.values().await.unwrap(), vec!["1", "2", "3"]);
        assert_eq!(
            kv.entries().await.unwrap(),
            vec![
                ("a".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
                ("c".to_string(), "3".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn namespaces_are_isolated() {
        let store = KvStore::open_in_memory().unwrap();
        let a = store.namespace("a");
        let b = store.namespace("b");

        a.set("k", "from-a").await.unwrap();
        b.set("k", "from-b").await.unwrap();

        assert_eq!(a.get("k").await.unwrap().as_deref(), Some("from-a"));
        assert_eq!(b.get("k").await.unwrap().as_deref(), Some("from-b"));

        assert_eq!(a.clear().await.unwrap(), 1);
        assert_eq!(a.get("k").await.unwrap(), None);
        assert_eq!(b.get("k").await.unwrap().as_deref(), Some("from-b"));
    }

    #[tokio::test]
    async fn clear_empties_only_the_namespace() {
        let kv = ns("app");
        kv.set("x", "1").await.unwrap();
        kv.set("y", "2").await.unwrap();
        assert_eq!(kv.clear().await.unwrap(), 2);
        assert!(kv.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn persistent_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.redb");
        {
            let kv = KvStore::open(&path).unwrap().namespace("app");
            kv.set("k", "v").await.unwrap();
        }
        let kv = KvStore::open(&path).unwrap().namespace("app");
        assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("v"));
    }
}
