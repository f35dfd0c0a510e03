/// Key-value entries in Redis or a PostgreSQL table.
///
/// The backend follows the connection URL's scheme: `redis://` and
/// `rediss://` use plain GET/SET, anything else is a PostgreSQL connection
/// string. The PostgreSQL table is expected to look like:
///
/// ```sql
/// CREATE TABLE kv_store (key TEXT PRIMARY KEY, value BYTEA NOT NULL);
/// ```

use postgres::{Client, NoTls};
use redis::Commands;
use tracing::debug;

use crate::error::SourceError;

pub fn fetch(database_url: &str, key: &str) -> Result<Vec<u8>, SourceError> {
    debug!(key, "reading key-value entry");
    if is_redis(database_url) {
        redis_fetch(database_url, key)
    } else {
        pg_fetch(database_url, key)
    }
}

pub fn write(database_url: &str, key: &str, value: &[u8]) -> Result<(), SourceError> {
    debug!(key, bytes = value.len(), "writing key-value entry");
    if is_redis(database_url) {
        redis_write(database_url, key, value)
    } else {
        pg_write(database_url, key, value)
    }
}

fn is_redis(database_url: &str) -> bool {
    let url = database_url.trim_start().to_ascii_lowercase();
    url.starts_with("redis://") || url.starts_with("rediss://")
}

fn redis_fetch(url: &str, key: &str) -> Result<Vec<u8>, SourceError> {
    let mut con = redis::Client::open(url)?.get_connection()?;
    let value: Option<Vec<u8>> = con.get(key)?;
    value.ok_or_else(|| SourceError::KeyNotFound(key.to_string()))
}

fn redis_write(url: &str, key: &str, value: &[u8]) -> Result<(), SourceError> {
    let mut con = redis::Client::open(url)?.get_connection()?;
    con.set::<_, _, ()>(key, value)?;
    Ok(())
}

fn pg_fetch(database_url: &str, key: &str) -> Result<Vec<u8>, SourceError> {
    let mut client = Client::connect(database_url, NoTls)?;

    let row = client
        .query_opt("SELECT value FROM kv_store WHERE key = $1", &[&key])?
        .ok_or_else(|| SourceError::KeyNotFound(key.to_string()))?;

    Ok(row.get(0))
}

fn pg_write(database_url: &str, key: &str, value: &[u8]) -> Result<(), SourceError> {
    let mut client = Client::connect(database_url, NoTls)?;

    client.execute(
        "INSERT INTO kv_store (key, value) VALUES ($1, $2)
         ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
        &[&key, &value],
    )?;
    Ok(())
}
