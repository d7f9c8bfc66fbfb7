//! Partitioned response entry operations.
//!
//! Entries live in named cache partitions. The proxy uses two of them:
//! a precache partition populated wholesale at install, and a runtime
//! partition that grows opportunistically. Partition names double as
//! version identifiers, so invalidation is a rename plus a
//! [`StoreDb::retain_partitions`] sweep at activation.

use super::connection::StoreDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A stored response snapshot.
///
/// An immutable copy of a successful upstream response at the time it
/// was fetched, keyed by its request descriptor (method + URL).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredResponse {
    pub key: String,
    pub method: String,
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers_json: Option<String>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

const ENTRY_COLUMNS: &str = "cache_name, key, method, url, status, content_type, headers_json, body, stored_at";

fn row_to_response(row: &rusqlite::Row<'_>) -> Result<StoredResponse, rusqlite::Error> {
    let status_raw: i64 = row.get(4)?;
    let status =
        u16::try_from(status_raw).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(4, status_raw))?;
    Ok(StoredResponse {
        key: row.get(1)?,
        method: row.get(2)?,
        url: row.get(3)?,
        status,
        content_type: row.get(5)?,
        headers_json: row.get(6)?,
        body: row.get(7)?,
        stored_at: row.get(8)?,
    })
}

impl StoreDb {
    /// Insert or update an entry in the named partition.
    ///
    /// Uses UPSERT semantics on (partition, key): last write wins.
    /// Stored values for one key are expected to be equivalent, so the
    /// race between concurrent identical fetches is harmless.
    pub async fn put(&self, partition: &str, response: &StoredResponse) -> Result<(), Error> {
        let partition = partition.to_string();
        let response = response.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO entries (
                        cache_name, key, method, url, status,
                        content_type, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    ON CONFLICT(cache_name, key) DO UPDATE SET
                        method = excluded.method,
                        url = excluded.url,
                        status = excluded.status,
                        content_type = excluded.content_type,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        &partition,
                        &response.key,
                        &response.method,
                        &response.url,
                        response.status as i64,
                        &response.content_type,
                        &response.headers_json,
                        &response.body,
                        &response.stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get an entry by key from one partition.
    ///
    /// Returns None if the partition has no entry under that key.
    pub async fn get(&self, partition: &str, key: &str) -> Result<Option<StoredResponse>, Error> {
        let partition = partition.to_string();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<StoredResponse>, Error> {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {ENTRY_COLUMNS} FROM entries WHERE cache_name = ?1 AND key = ?2"
                ))?;

                let result = stmt.query_row(params![partition, key], row_to_response);

                match result {
                    Ok(entry) => Ok(Some(entry)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Get an entry by key, consulting partitions in the given order.
    ///
    /// The first partition containing the key wins; its name is
    /// returned alongside the entry. The proxy passes the precache
    /// first so it shadows the runtime partition on key collision.
    pub async fn get_first(&self, partitions: &[&str], key: &str) -> Result<Option<(String, StoredResponse)>, Error> {
        for partition in partitions {
            if let Some(entry) = self.get(partition, key).await? {
                return Ok(Some((partition.to_string(), entry)));
            }
        }
        Ok(None)
    }

    /// Check whether a partition holds an entry under the given key.
    pub async fn contains(&self, partition: &str, key: &str) -> Result<bool, Error> {
        let partition = partition.to_string();
        let key = key.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn
                    .query_row(
                        "SELECT EXISTS(SELECT 1 FROM entries WHERE cache_name = ?1 AND key = ?2)",
                        params![partition, key],
                        |row| row.get(0),
                    )
                    .map_err(Error::from)?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries in a partition.
    pub async fn entry_count(&self, partition: &str) -> Result<u64, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries WHERE cache_name = ?1",
                    params![partition],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// URLs of all entries in a partition, for diagnostics.
    pub async fn entry_urls(&self, partition: &str) -> Result<Vec<String>, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT url FROM entries WHERE cache_name = ?1 ORDER BY url")?;
                let urls = stmt
                    .query_map(params![partition], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(urls)
            })
            .await
            .map_err(Error::from)
    }

    /// Names of all partitions currently present in the store.
    pub async fn list_partitions(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT DISTINCT cache_name FROM entries ORDER BY cache_name")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every entry in a partition.
    ///
    /// Returns the number of deleted entries.
    pub async fn delete_partition(&self, partition: &str) -> Result<u64, Error> {
        let partition = partition.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM entries WHERE cache_name = ?1", params![partition])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every partition whose name is not in `keep`.
    ///
    /// Returns the names of the deleted partitions. This is the
    /// activation sweep: partitions from superseded versions are
    /// garbage-collected while the current precache and runtime
    /// partitions survive.
    pub async fn retain_partitions(&self, keep: &[&str]) -> Result<Vec<String>, Error> {
        let mut deleted = Vec::new();
        for name in self.list_partitions().await? {
            if !keep.contains(&name.as_str()) {
                self.delete_partition(&name).await?;
                deleted.push(name);
            }
        }
        Ok(deleted)
    }
}
