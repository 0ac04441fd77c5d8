//! Cache generation and entry operations.
//!
//! A generation is a named set of `RequestKey -> CapturedResponse` entries.
//! Entries are overwritten in place on `put` (last write wins) and live until
//! their generation is deleted; nothing expires on its own.

use super::connection::CacheDb;
use super::hash::body_digest;
use super::key::RequestKey;
use super::response::CapturedResponse;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, Connection, OptionalExtension};

/// Summary of one generation.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct GenerationInfo {
    pub name: String,
    pub manifest_digest: Option<String>,
    pub created_at: String,
    pub entries: u64,
}

/// A stored entry with its bookkeeping columns.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub key: RequestKey,
    pub url: String,
    pub response: CapturedResponse,
    pub body_sha256: String,
    pub stored_at: String,
}

/// Handle to a single named generation.
///
/// Cheap to clone; all handles share the database connection.
#[derive(Clone, Debug)]
pub struct Generation {
    db: CacheDb,
    name: String,
}

fn ensure_generation(conn: &Connection, name: &str, manifest_digest: Option<&str>) -> Result<(), Error> {
    conn.execute(
        "INSERT OR IGNORE INTO generations (name, manifest_digest, created_at) VALUES (?1, ?2, ?3)",
        params![name, manifest_digest, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

fn upsert_entry(
    conn: &Connection, generation: &str, key: &RequestKey, url: &str, response: &CapturedResponse,
) -> Result<(), Error> {
    let headers_json = serde_json::to_string(&response.headers)?;
    conn.execute(
        "INSERT INTO entries (
            generation, request_key, url, status, headers_json, body, body_sha256, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(generation, request_key) DO UPDATE SET
            url = excluded.url,
            status = excluded.status,
            headers_json = excluded.headers_json,
            body = excluded.body,
            body_sha256 = excluded.body_sha256,
            stored_at = excluded.stored_at",
        params![
            generation,
            key.as_str(),
            url,
            i64::from(response.status),
            headers_json,
            response.body.as_ref(),
            body_digest(&response.body),
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Open (creating if absent) the generation with the given name.
    pub async fn open_generation(&self, name: &str) -> Result<Generation, Error> {
        let owned = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> { ensure_generation(conn, &owned, None) })
            .await
            .map_err(Error::from)?;

        Ok(Generation { db: self.clone(), name: name.to_string() })
    }

    /// Handle to a generation without creating it.
    ///
    /// Reads on a generation that doesn't exist yet miss; the first `put`
    /// creates it.
    pub fn generation(&self, name: &str) -> Generation {
        Generation { db: self.clone(), name: name.to_string() }
    }

    /// Populate a generation with every entry in one transaction.
    ///
    /// Either the generation row and all entries are written, or nothing is.
    pub async fn install_generation(
        &self, name: &str, manifest_digest: &str, entries: Vec<(RequestKey, String, CapturedResponse)>,
    ) -> Result<Generation, Error> {
        let owned = name.to_string();
        let digest = manifest_digest.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_generation(&tx, &owned, Some(&digest))?;
                tx.execute(
                    "UPDATE generations SET manifest_digest = ?2 WHERE name = ?1",
                    params![&owned, &digest],
                )?;
                for (key, url, response) in &entries {
                    upsert_entry(&tx, &owned, key, url, response)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        Ok(Generation { db: self.clone(), name: name.to_string() })
    }

    /// Names of every generation, oldest first.
    pub async fn list_generations(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM generations ORDER BY created_at ASC, name ASC")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Generation summaries with entry counts, oldest first.
    pub async fn generation_infos(&self) -> Result<Vec<GenerationInfo>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<GenerationInfo>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT g.name, g.manifest_digest, g.created_at,
                        (SELECT COUNT(*) FROM entries e WHERE e.generation = g.name)
                    FROM generations g ORDER BY g.created_at ASC, g.name ASC",
                )?;
                let infos = stmt
                    .query_map([], |row| {
                        Ok(GenerationInfo {
                            name: row.get(0)?,
                            manifest_digest: row.get(1)?,
                            created_at: row.get(2)?,
                            entries: row.get::<_, i64>(3)? as u64,
                        })
                    })?
                    .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                Ok(infos)
            })
            .await
            .map_err(Error::from)
    }

    /// Whether a generation with this name exists.
    pub async fn generation_exists(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM generations WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    /// Manifest digest recorded when the generation was installed.
    pub async fn manifest_digest(&self, name: &str) -> Result<Option<String>, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let digest = conn
                    .query_row(
                        "SELECT manifest_digest FROM generations WHERE name = ?1",
                        params![name],
                        |row| row.get::<_, Option<String>>(0),
                    )
                    .optional()?;
                Ok(digest.flatten())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete a generation and all of its entries.
    ///
    /// Returns false if no such generation existed.
    pub async fn delete_generation(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM generations WHERE name = ?1", params![name])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }
}

impl Generation {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up the response stored under `key`.
    ///
    /// Returns None if the key isn't in this generation.
    pub async fn match_key(&self, key: &RequestKey) -> Result<Option<CapturedResponse>, Error> {
        Ok(self.entry(key).await?.map(|entry| entry.response))
    }

    /// Look up the full stored entry under `key`.
    pub async fn entry(&self, key: &RequestKey) -> Result<Option<StoredEntry>, Error> {
        let name = self.name.clone();
        let key = key.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Option<StoredEntry>, Error> {
                let row = conn
                    .query_row(
                        "SELECT url, status, headers_json, body, body_sha256, stored_at
                        FROM entries WHERE generation = ?1 AND request_key = ?2",
                        params![&name, key.as_str()],
                        |row| {
                            Ok((
                                row.get::<_, String>(0)?,
                                row.get::<_, i64>(1)?,
                                row.get::<_, String>(2)?,
                                row.get::<_, Vec<u8>>(3)?,
                                row.get::<_, String>(4)?,
                                row.get::<_, String>(5)?,
                            ))
                        },
                    )
                    .optional()?;

                let Some((url, status, headers_json, body, body_sha256, stored_at)) = row else {
                    return Ok(None);
                };

                let status =
                    u16::try_from(status).map_err(|_| Error::CorruptEntry(format!("status {status} out of range")))?;
                let headers: Vec<(String, String)> = serde_json::from_str(&headers_json)?;

                Ok(Some(StoredEntry {
                    key,
                    url,
                    response: CapturedResponse::new(status, headers, body),
                    body_sha256,
                    stored_at,
                }))
            })
            .await
            .map_err(Error::from)
    }

    /// Store `response` under `key`, overwriting any existing entry.
    pub async fn put(&self, key: &RequestKey, url: &str, response: &CapturedResponse) -> Result<(), Error> {
        let name = self.name.clone();
        let key = key.clone();
        let url = url.to_string();
        let response = response.clone();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_generation(&tx, &name, None)?;
                upsert_entry(&tx, &name, &key, &url, &response)?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Remove the entry under `key`.
    ///
    /// Returns false if there was nothing to remove.
    pub async fn delete(&self, key: &RequestKey) -> Result<bool, Error> {
        let name = self.name.clone();
        let key = key.clone();
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute(
                    "DELETE FROM entries WHERE generation = ?1 AND request_key = ?2",
                    params![name, key.as_str()],
                )?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Every key stored in this generation, sorted.
    pub async fn keys(&self) -> Result<Vec<RequestKey>, Error> {
        let name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt =
                    conn.prepare("SELECT request_key FROM entries WHERE generation = ?1 ORDER BY request_key")?;
                let keys = stmt
                    .query_map(params![name], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, rusqlite::Error>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
            .map(|keys| keys.into_iter().map(RequestKey::from_stored).collect())
    }
}
