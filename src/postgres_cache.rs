use crate::cache::{CacheBackend, Connect};
use crate::error::TriplexError;
use postgres::{Client, NoTls};
use tracing::debug;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS triplexer_sets (
        key TEXT NOT NULL,
        member TEXT NOT NULL,
        PRIMARY KEY (key, member)
    );
    CREATE TABLE IF NOT EXISTS triplexer_hashes (
        key TEXT NOT NULL,
        field TEXT NOT NULL,
        value TEXT NOT NULL,
        PRIMARY KEY (key, field)
    );
    CREATE TABLE IF NOT EXISTS triplexer_lists (
        id BIGSERIAL PRIMARY KEY,
        key TEXT NOT NULL,
        value TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS triplexer_lists_key_idx ON triplexer_lists (key, id);
";

/// Claims are a single DELETE over a row locked with SKIP LOCKED, so two
/// sessions never receive the same member.
const CLAIM: &str = "
    DELETE FROM triplexer_sets
    WHERE (key, member) IN (
        SELECT key, member FROM triplexer_sets
        WHERE key = $1
        LIMIT 1
        FOR UPDATE SKIP LOCKED
    )
    RETURNING member
";

pub struct PostgresCache {
    client: Client,
}

impl PostgresCache {
    pub fn connect(url: &str) -> Result<Self, TriplexError> {
        let mut client = Client::connect(url, NoTls)?;
        client.batch_execute(SCHEMA)?;
        debug!("connected to postgres cache and ensured schema");
        Ok(Self { client })
    }
}

impl CacheBackend for PostgresCache {
    fn ping(&mut self) -> Result<(), TriplexError> {
        self.client.batch_execute("SELECT 1")?;
        Ok(())
    }

    fn sadd(&mut self, key: &str, member: &str) -> Result<bool, TriplexError> {
        let inserted = self.client.execute(
            "INSERT INTO triplexer_sets (key, member) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            &[&key, &member],
        )?;
        Ok(inserted == 1)
    }

    fn spop(&mut self, key: &str) -> Result<Option<String>, TriplexError> {
        let row = self.client.query_opt(CLAIM, &[&key])?;
        Ok(row.map(|r| r.get::<_, String>(0)))
    }

    fn smembers(&mut self, key: &str) -> Result<Vec<String>, TriplexError> {
        let rows = self
            .client
            .query("SELECT member FROM triplexer_sets WHERE key = $1", &[&key])?;
        Ok(rows.iter().map(|r| r.get::<_, String>(0)).collect())
    }

    fn scard(&mut self, key: &str) -> Result<usize, TriplexError> {
        let row = self
            .client
            .query_one("SELECT COUNT(*) FROM triplexer_sets WHERE key = $1", &[&key])?;
        let count: i64 = row.get(0);
        Ok(count as usize)
    }

    fn hset_all(&mut self, key: &str, fields: &[(&str, &str)]) -> Result<(), TriplexError> {
        let mut tx = self.client.transaction()?;
        let stmt = tx.prepare(
            "INSERT INTO triplexer_hashes (key, field, value) VALUES ($1, $2, $3)
             ON CONFLICT (key, field) DO UPDATE SET value = EXCLUDED.value",
        )?;
        for (field, value) in fields {
            tx.execute(&stmt, &[&key, field, value])?;
        }
        tx.commit()?;
        Ok(())
    }

    fn hget(&mut self, key: &str, field: &str) -> Result<Option<String>, TriplexError> {
        let row = self.client.query_opt(
            "SELECT value FROM triplexer_hashes WHERE key = $1 AND field = $2",
            &[&key, &field],
        )?;
        Ok(row.map(|r| r.get::<_, String>(0)))
    }

    fn rpush(&mut self, key: &str, value: &str) -> Result<(), TriplexError> {
        self.client.execute(
            "INSERT INTO triplexer_lists (key, value) VALUES ($1, $2)",
            &[&key, &value],
        )?;
        Ok(())
    }

    fn lrange(&mut self, key: &str) -> Result<Vec<String>, TriplexError> {
        let rows = self.client.query(
            "SELECT value FROM triplexer_lists WHERE key = $1 ORDER BY id",
            &[&key],
        )?;
        Ok(rows.iter().map(|r| r.get::<_, String>(0)).collect())
    }
}

/// Connection string for a shared PostgreSQL store.
#[derive(Debug, Clone)]
pub struct PostgresEndpoint {
    pub url: String,
}

impl Connect for PostgresEndpoint {
    type Conn = PostgresCache;

    fn connect(&self) -> Result<PostgresCache, TriplexError> {
        PostgresCache::connect(&self.url)
    }
}
