//! Generation and entry operations on the SQLite cache.

use async_trait::async_trait;
use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, Connection, OptionalExtension};
use url::Url;

use super::connection::CacheDb;
use super::{CacheKey, CacheStore};
use crate::{Error, Response};

/// A response row ready to be written, with headers already encoded.
struct EncodedEntry {
    key_hash: String,
    method: String,
    url: String,
    status: u16,
    headers_json: String,
    body: Vec<u8>,
}

impl EncodedEntry {
    fn encode(key: &CacheKey, response: &Response) -> Result<Self, Error> {
        let headers_json =
            serde_json::to_string(&response.headers).map_err(|e| Error::CorruptEntry(format!("{key}: {e}")))?;
        Ok(Self {
            key_hash: key.hash(),
            method: key.method().to_string(),
            url: key.url().to_string(),
            status: response.status,
            headers_json,
            body: response.body.to_vec(),
        })
    }
}

/// Return the id of `name`, inserting the generation if it is new.
fn ensure_generation(conn: &Connection, name: &str) -> Result<i64, rusqlite::Error> {
    conn.execute(
        "INSERT INTO generations (name, created_at) VALUES (?1, ?2)
         ON CONFLICT(name) DO NOTHING",
        params![name, chrono::Utc::now().to_rfc3339()],
    )?;
    conn.query_row("SELECT id FROM generations WHERE name = ?1", params![name], |row| row.get(0))
}

fn insert_entry(conn: &Connection, generation_id: i64, entry: &EncodedEntry) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT INTO entries (generation_id, key_hash, method, url, status, headers_json, body, stored_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(generation_id, key_hash) DO UPDATE SET
            status = excluded.status,
            headers_json = excluded.headers_json,
            body = excluded.body,
            stored_at = excluded.stored_at",
        params![
            generation_id,
            &entry.key_hash,
            &entry.method,
            &entry.url,
            entry.status,
            &entry.headers_json,
            &entry.body,
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Number of entries stored in `generation`.
    pub async fn entry_count(&self, generation: &str) -> Result<u64, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM entries e
                     JOIN generations g ON g.id = e.generation_id
                     WHERE g.name = ?1",
                    params![generation],
                    |row| row.get(0),
                )?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl CacheStore for CacheDb {
    async fn open(&self, generation: &str) -> Result<(), Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                ensure_generation(conn, &generation)?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn match_request(&self, key: &CacheKey) -> Result<Option<Response>, Error> {
        let key_hash = key.hash();
        let label = key.to_string();
        self.conn
            .call(move |conn| -> Result<Option<Response>, Error> {
                let row = conn
                    .query_row(
                        "SELECT e.status, e.headers_json, e.body FROM entries e
                         JOIN generations g ON g.id = e.generation_id
                         WHERE e.key_hash = ?1
                         ORDER BY g.id ASC
                         LIMIT 1",
                        params![key_hash],
                        |row| Ok((row.get::<_, u16>(0)?, row.get::<_, String>(1)?, row.get::<_, Vec<u8>>(2)?)),
                    )
                    .optional()?;

                let Some((status, headers_json, body)) = row else {
                    return Ok(None);
                };

                let headers: Vec<(String, String)> =
                    serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(format!("{label}: {e}")))?;

                Ok(Some(Response { status, headers, body: Bytes::from(body) }))
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, generation: &str, key: CacheKey, response: Response) -> Result<(), Error> {
        self.put_all(generation, vec![(key, response)]).await
    }

    async fn put_all(&self, generation: &str, entries: Vec<(CacheKey, Response)>) -> Result<(), Error> {
        let generation = generation.to_string();
        let encoded = entries
            .iter()
            .map(|(key, response)| EncodedEntry::encode(key, response))
            .collect::<Result<Vec<_>, _>>()?;

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                let generation_id = ensure_generation(&tx, &generation)?;
                for entry in &encoded {
                    insert_entry(&tx, generation_id, entry)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, generation: &str) -> Result<bool, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let deleted = conn.execute("DELETE FROM generations WHERE name = ?1", params![generation])?;
                Ok(deleted > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM generations ORDER BY id ASC")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn entries(&self, generation: &str) -> Result<Vec<CacheKey>, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<CacheKey>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT e.method, e.url FROM entries e
                     JOIN generations g ON g.id = e.generation_id
                     WHERE g.name = ?1
                     ORDER BY e.rowid ASC",
                )?;
                let rows = stmt
                    .query_map(params![generation], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                    .collect::<Result<Vec<_>, _>>()?;

                rows.into_iter()
                    .map(|(method, url)| {
                        let url = Url::parse(&url).map_err(|e| Error::CorruptEntry(format!("{url}: {e}")))?;
                        Ok(CacheKey::new(&method, url))
                    })
                    .collect()
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(path: &str) -> CacheKey {
        CacheKey::get(Url::parse(&format!("https://example.com{path}")).unwrap())
    }

    fn response(body: &'static str) -> Response {
        Response::new(200, body).with_header("content-type", "text/plain")
    }

    #[tokio::test]
    async fn test_put_and_match() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("v1", key("/a"), response("alpha")).await.unwrap();

        let found = db.match_request(&key("/a")).await.unwrap().unwrap();
        assert_eq!(found, response("alpha"));
    }

    #[tokio::test]
    async fn test_match_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.match_request(&key("/nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites_same_key() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("v1", key("/a"), response("old")).await.unwrap();
        db.put("v1", key("/a"), response("new")).await.unwrap();

        let found = db.match_request(&key("/a")).await.unwrap().unwrap();
        assert_eq!(found.body, Bytes::from_static(b"new"));
        assert_eq!(db.entry_count("v1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_match_prefers_oldest_generation() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("v1", key("/a"), response("from-v1")).await.unwrap();
        db.put("v2", key("/a"), response("from-v2")).await.unwrap();

        let found = db.match_request(&key("/a")).await.unwrap().unwrap();
        assert_eq!(found.body, Bytes::from_static(b"from-v1"));
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open("v1").await.unwrap();
        db.open("v1").await.unwrap();
        assert_eq!(db.keys().await.unwrap(), vec!["v1".to_string()]);
    }

    #[tokio::test]
    async fn test_keys_in_creation_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open("b").await.unwrap();
        db.open("a").await.unwrap();
        db.open("c").await.unwrap();
        assert_eq!(db.keys().await.unwrap(), vec!["b", "a", "c"]);
    }

    #[tokio::test]
    async fn test_delete_cascades_entries() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("v1", key("/a"), response("alpha")).await.unwrap();
        db.put("v2", key("/b"), response("beta")).await.unwrap();

        assert!(db.delete("v1").await.unwrap());
        assert!(!db.delete("v1").await.unwrap());

        assert!(db.match_request(&key("/a")).await.unwrap().is_none());
        assert!(db.match_request(&key("/b")).await.unwrap().is_some());
        assert_eq!(db.entry_count("v1").await.unwrap(), 0);
        assert_eq!(db.keys().await.unwrap(), vec!["v2".to_string()]);
    }

    #[tokio::test]
    async fn test_put_all_and_entries_order() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put_all("v1", vec![(key("/one"), response("1")), (key("/two"), response("2"))])
            .await
            .unwrap();

        let keys = db.entries("v1").await.unwrap();
        assert_eq!(keys, vec![key("/one"), key("/two")]);
        assert!(db.entries("missing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_body_bytes_preserved() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let png = Response::new(200, vec![0x89, b'P', b'N', b'G', 0x00, 0xff]).with_header("content-type", "image/png");
        db.put("v1", key("/icon.png"), png.clone()).await.unwrap();

        let found = db.match_request(&key("/icon.png")).await.unwrap().unwrap();
        assert_eq!(found, png);
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.sqlite");

        {
            let db = CacheDb::open(&path).await.unwrap();
            db.put("v1", key("/a"), response("alpha")).await.unwrap();
        }

        let db = CacheDb::open(&path).await.unwrap();
        assert!(db.match_request(&key("/a")).await.unwrap().is_some());
        assert_eq!(db.keys().await.unwrap(), vec!["v1".to_string()]);
    }
}
