//! Named cache stores.
//!
//! A store is a namespace of entries. The agent keeps one store per cache
//! version and deletes every other store on activation; deleting a store
//! drops all of its entries with it.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// Handle to a single named store.
#[derive(Clone, Debug)]
pub struct CacheStore {
    pub(crate) db: CacheDb,
    pub(crate) name: String,
}

/// Summary of a store for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StoreInfo {
    pub name: String,
    pub created_at: String,
    pub entries: u64,
}

impl CacheStore {
    /// Name of the store.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl CacheDb {
    /// Open a store by name, creating it if absent.
    pub async fn open_store(&self, name: &str) -> Result<CacheStore, Error> {
        let owned = name.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO cache_stores (name, created_at) VALUES (?1, ?2)",
                    params![owned, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(CacheStore { db: self.clone(), name: name.to_string() })
    }

    /// Handle to a store without creating it.
    ///
    /// Lookups on a store that does not exist find nothing; use
    /// [`CacheDb::open_store`] before writing.
    pub fn store(&self, name: &str) -> CacheStore {
        CacheStore { db: self.clone(), name: name.to_string() }
    }

    /// Check whether a store with this name exists.
    pub async fn has_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM cache_stores WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Names of all stores, oldest first.
    pub async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM cache_stores ORDER BY created_at ASC, name ASC")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// All stores with their entry counts, oldest first.
    pub async fn stores(&self) -> Result<Vec<StoreInfo>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<StoreInfo>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT s.name, s.created_at, COUNT(e.key_hash)
                     FROM cache_stores s
                     LEFT JOIN cache_entries e ON e.store = s.name
                     GROUP BY s.name, s.created_at
                     ORDER BY s.created_at ASC, s.name ASC",
                )?;
                let stores = stmt
                    .query_map([], |row| {
                        Ok(StoreInfo {
                            name: row.get(0)?,
                            created_at: row.get(1)?,
                            entries: row.get::<_, i64>(2)? as u64,
                        })
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(stores)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a store and every entry in it.
    ///
    /// Returns false if no store had that name.
    pub async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM cache_stores WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_store_is_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("v1").await.unwrap();
        db.open_store("v1").await.unwrap();

        assert_eq!(db.store_names().await.unwrap(), vec!["v1".to_string()]);
        assert!(db.has_store("v1").await.unwrap());
        assert!(!db.has_store("v2").await.unwrap());
    }

    #[tokio::test]
    async fn test_store_handle_does_not_create() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let handle = db.store("ghost");
        assert_eq!(handle.name(), "ghost");
        assert!(handle.match_request(&crate::RequestKey::get("https://example.com/")).await.unwrap().is_none());
        assert!(db.store_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("v0").await.unwrap();
        db.open_store("current").await.unwrap();

        assert!(db.delete_store("v0").await.unwrap());
        assert!(!db.delete_store("v0").await.unwrap());
        assert_eq!(db.store_names().await.unwrap(), vec!["current".to_string()]);
    }

    #[tokio::test]
    async fn test_stores_counts_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store = db.open_store("v1").await.unwrap();
        db.open_store("empty").await.unwrap();

        let key = crate::RequestKey::get("https://example.com/app.js");
        store
            .put(&key, &crate::StoredResponse::new(&key.url, 200, Vec::new(), b"x".to_vec()))
            .await
            .unwrap();

        let stores = db.stores().await.unwrap();
        let v1 = stores.iter().find(|s| s.name == "v1").unwrap();
        let empty = stores.iter().find(|s| s.name == "empty").unwrap();
        assert_eq!(v1.entries, 1);
        assert_eq!(empty.entries, 0);
    }
}
