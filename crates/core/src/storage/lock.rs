use anyhow::Context;
use sqlx::Connection;

// Advisory locks are scoped to the Postgres session, so lock and unlock must run on the same
// connection. The guard detaches that connection from the pool; dropping it closes the session
// and with it the lock.
const LOCK_NAMESPACE: i64 = 0x4E55_5452_4957; // "NUTRIW"
const CATALOG_SYNC_KEY: i64 = 1;

fn catalog_sync_lock_key() -> i64 {
    LOCK_NAMESPACE ^ CATALOG_SYNC_KEY
}

/// Held advisory lock guarding catalog syncs.
#[derive(Debug)]
pub struct CatalogSyncLock {
    conn: sqlx::PgConnection,
    key: i64,
}

impl CatalogSyncLock {
    /// Returns `None` when another session holds the lock.
    pub async fn try_acquire(pool: &sqlx::PgPool) -> anyhow::Result<Option<Self>> {
        let key = catalog_sync_lock_key();
        let mut conn = pool
            .acquire()
            .await
            .context("failed to acquire connection for advisory lock")?
            .detach();

        let acquired: (bool,) = sqlx::query_as("SELECT pg_try_advisory_lock($1)")
            .persistent(false)
            .bind(key)
            .fetch_one(&mut conn)
            .await
            .with_context(|| format!("failed to acquire advisory lock (key={key})"))?;

        if !acquired.0 {
            if let Err(err) = conn.close().await {
                tracing::debug!(error = %err, "closing lock connection failed");
            }
            return Ok(None);
        }
        Ok(Some(Self { conn, key }))
    }

    /// Unlocks on the locking session, then closes it.
    pub async fn release(mut self) -> anyhow::Result<()> {
        let key = self.key;
        let released: (bool,) = sqlx::query_as("SELECT pg_advisory_unlock($1)")
            .persistent(false)
            .bind(key)
            .fetch_one(&mut self.conn)
            .await
            .with_context(|| format!("failed to release advisory lock (key={key})"))?;

        if let Err(err) = self.conn.close().await {
            tracing::debug!(error = %err, "closing lock connection failed");
        }
        ensure_unlocked(released.0, key)
    }
}

fn ensure_unlocked(released: bool, key: i64) -> anyhow::Result<()> {
    anyhow::ensure!(
        released,
        "advisory lock was not held by this session (key={key})"
    );
    Ok(())
}
