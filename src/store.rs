use async_trait::async_trait;
use std::sync::Arc;

use deadpool::managed::QueueMode;
use deadpool_redis::{Config as DeadpoolConfig, Pool, PoolConfig, Runtime, Timeouts};
use redis::AsyncCommands;

use crate::config::Config;
use crate::error::{Result, SourcingError};
use crate::session::SessionContext;

#[cfg(test)]
use mockall::automock;

/// Redis connection manager
#[derive(Clone)]
pub struct RedisManager {
    pool: Arc<Pool>,
    session_ttl_seconds: i64,
}

impl RedisManager {
    /// Create a new Redis manager with configuration
    pub async fn new_with_config(config: &Config) -> Result<Self> {
        let redis_url = config.get_redis_url();

        tracing::info!(
            "Connecting to Redis at {}:{} (db: {})",
            config.redis.host,
            config.redis.port,
            config.redis.database
        );

        let mut cfg = DeadpoolConfig::from_url(&redis_url);
        cfg.pool = Some(PoolConfig {
            max_size: config.redis.pool.max_size,
            timeouts: Timeouts {
                wait: Some(config.get_pool_timeout()),
                create: Some(config.get_pool_create_timeout()),
                recycle: Some(config.get_pool_recycle_timeout()),
            },
            queue_mode: QueueMode::Fifo,
        });

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1))
            .map_err(|e| SourcingError::PoolCreation(e.to_string()))?;

        // Test the connection
        let mut conn = pool.get().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        tracing::info!("Redis connection established");

        Ok(Self {
            pool: Arc::new(pool),
            session_ttl_seconds: config.redis.session_ttl_seconds,
        })
    }

    pub async fn get_connection(&self) -> Result<deadpool_redis::Connection> {
        Ok(self.pool.get().await?)
    }

    /// Store a JSON-serialized value under a key with the session TTL
    pub async fn set_json<T: serde::Serialize + Send + Sync>(
        &self,
        key: &str,
        value: &T,
    ) -> Result<()> {
        let mut conn = self.get_connection().await?;
        let json = serde_json::to_string(value)?;
        conn.set_ex::<_, _, ()>(key, json, self.session_ttl_seconds as u64)
            .await?;
        Ok(())
    }

    /// Load and deserialize a JSON value, or None when the key is absent
    pub async fn get_json<T: serde::de::DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.get_connection().await?;
        let raw: Option<String> = conn.get(key).await?;
        match raw {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    pub async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.get_connection().await?;
        Ok(conn.exists(key).await?)
    }
}

/// Load/save adapter for session state. The rest of the crate only ever sees
/// this trait, so tests run against an in-memory mock.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync + 'static {
    async fn load(&self, session_id: &str) -> Result<Option<SessionContext>>;
    async fn save(&self, session: &SessionContext) -> Result<()>;
}

pub struct RedisSessionRepository {
    redis: Arc<RedisManager>,
}

impl RedisSessionRepository {
    pub fn new(redis: Arc<RedisManager>) -> Self {
        Self { redis }
    }

    fn key(session_id: &str) -> String {
        format!("session:{session_id}")
    }
}

#[async_trait]
impl SessionRepository for RedisSessionRepository {
    async fn load(&self, session_id: &str) -> Result<Option<SessionContext>> {
        self.redis.get_json(&Self::key(session_id)).await
    }

    async fn save(&self, session: &SessionContext) -> Result<()> {
        self.redis.set_json(&Self::key(session.session_id.as_str()), session).await
    }
}
