//! Entry operations within a store.
//!
//! An entry is a full response snapshot (status, headers, body) keyed by
//! request identity. Writes replace by key; entries are never merged.

use super::hash::RequestKey;
use super::stores::CacheStore;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A cached response snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredResponse {
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl StoredResponse {
    /// Create a snapshot stamped with the current time.
    pub fn new(url: impl Into<String>, status: u16, headers: Vec<(String, String)>, body: Vec<u8>) -> Self {
        Self { url: url.into(), status, headers, body, stored_at: chrono::Utc::now().to_rfc3339() }
    }
}

struct EntryRow {
    url: String,
    status: u16,
    headers_json: String,
    body: Vec<u8>,
    stored_at: String,
}

impl EntryRow {
    fn decode(self) -> Result<StoredResponse, Error> {
        let headers = serde_json::from_str(&self.headers_json)
            .map_err(|e| Error::CorruptEntry(format!("{}: {e}", self.url)))?;
        Ok(StoredResponse { url: self.url, status: self.status, headers, body: self.body, stored_at: self.stored_at })
    }
}

impl CacheStore {
    /// Insert or replace the entry for a request.
    pub async fn put(&self, key: &RequestKey, response: &StoredResponse) -> Result<(), Error> {
        let store = self.name.clone();
        let key_hash = key.hash();
        let method = key.method.clone();
        let url = key.url.clone();
        let status = response.status;
        let headers_json = serde_json::to_string(&response.headers)
            .map_err(|e| Error::CorruptEntry(format!("{url}: {e}")))?;
        let body = response.body.clone();
        let stored_at = response.stored_at.clone();

        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO cache_entries (store, key_hash, method, url, status, headers_json, body, stored_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    ON CONFLICT(store, key_hash) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![store, key_hash, method, url, status, headers_json, body, stored_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Look up the entry for a request.
    ///
    /// Returns None if the store has no entry for it.
    pub async fn match_request(&self, key: &RequestKey) -> Result<Option<StoredResponse>, Error> {
        let store = self.name.clone();
        let key_hash = key.hash();
        let row = self
            .db
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT url, status, headers_json, body, stored_at
                    FROM cache_entries WHERE store = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![store, key_hash], |row| {
                    Ok(EntryRow {
                        url: row.get(0)?,
                        status: row.get(1)?,
                        headers_json: row.get(2)?,
                        body: row.get(3)?,
                        stored_at: row.get(4)?,
                    })
                });

                match result {
                    Ok(r) => Ok(Some(r)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(EntryRow::decode).transpose()
    }

    /// Request keys of every entry, ordered by URL.
    pub async fn keys(&self) -> Result<Vec<RequestKey>, Error> {
        let store = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<RequestKey>, Error> {
                let mut stmt =
                    conn.prepare("SELECT method, url FROM cache_entries WHERE store = ?1 ORDER BY url ASC, method ASC")?;
                let keys = stmt
                    .query_map(params![store], |row| Ok(RequestKey { method: row.get(0)?, url: row.get(1)? }))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(any(test, feature = "testing"))]
impl CacheStore {
    /// Write an entry whose headers column is not valid JSON.
    pub async fn put_undecodable(&self, key: &RequestKey) -> Result<(), Error> {
        let (store, key_hash, method, url) = (self.name.clone(), key.hash(), key.method.clone(), key.url.clone());
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR REPLACE INTO cache_entries (store, key_hash, method, url, status, headers_json, body, stored_at)
                    VALUES (?1, ?2, ?3, ?4, 200, '{not json', x'00', '')",
                    params![store, key_hash, method, url],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}
