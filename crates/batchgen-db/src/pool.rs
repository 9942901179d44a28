use std::time::Duration;

use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;

/// Errors that can occur while building the pool or checking out a
/// connection from it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("failed to get connection from pool: {message}")]
    Checkout { message: String },
    #[error("failed to build connection pool: {message}")]
    Build { message: String },
}

impl PoolError {
    pub fn checkout(message: impl Into<String>) -> Self {
        Self::Checkout { message: message.into() }
    }

    pub fn build(message: impl Into<String>) -> Self {
        Self::Build { message: message.into() }
    }
}

/// Configuration for the destination database's connection pool.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    database_url: String,
    max_size: u32,
    min_idle: Option<u32>,
    connection_timeout: Duration,
}

impl PoolConfig {
    /// Defaults: `max_size` 10, `min_idle` 2, `connection_timeout` 30s.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: 10,
            min_idle: Some(2),
            connection_timeout: Duration::from_secs(30),
        }
    }

    pub fn with_max_size(mut self, max_size: u32) -> Self {
        assert!(max_size > 0, "max_size must be greater than 0");
        if let Some(min_idle) = self.min_idle {
            assert!(
                min_idle <= max_size,
                "min_idle ({min_idle}) must not exceed max_size ({max_size}); \
                 set min_idle first if lowering max_size"
            );
        }
        self.max_size = max_size;
        self
    }

    pub fn with_min_idle(mut self, min_idle: Option<u32>) -> Self {
        if let Some(min_idle) = min_idle {
            assert!(min_idle <= self.max_size, "min_idle ({min_idle}) must not exceed max_size ({})", self.max_size);
        }
        self.min_idle = min_idle;
        self
    }

    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }
}

/// Async connection pool for the destination PostgreSQL database.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    pub async fn new(config: PoolConfig) -> Result<Self, PoolError> {
        if config.max_size == 0 {
            return Err(PoolError::build("max_size must be greater than 0"));
        }
        if let Some(min_idle) = config.min_idle {
            if min_idle > config.max_size {
                return Err(PoolError::build(format!(
                    "min_idle ({min_idle}) must not exceed max_size ({})",
                    config.max_size
                )));
            }
        }

        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.database_url);
        let pool = Pool::builder()
            .max_size(config.max_size)
            .min_idle(config.min_idle)
            .connection_timeout(config.connection_timeout)
            .build(manager)
            .await
            .map_err(|err| PoolError::build(err.to_string()))?;

        Ok(Self { inner: pool })
    }

    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner.get().await.map_err(|err| PoolError::checkout(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_config_default_values() {
        let config = PoolConfig::new("postgres://localhost/test");
        assert_eq!(config.database_url(), "postgres://localhost/test");
        assert_eq!(config.max_size, 10);
        assert_eq!(config.min_idle, Some(2));
        assert_eq!(config.connection_timeout, Duration::from_secs(30));
    }

    #[rstest]
    fn pool_config_builder_pattern() {
        let config = PoolConfig::new("postgres://localhost/test")
            .with_max_size(20)
            .with_min_idle(Some(5))
            .with_connection_timeout(Duration::from_secs(60));
        assert_eq!(config.max_size, 20);
        assert_eq!(config.min_idle, Some(5));
        assert_eq!(config.connection_timeout, Duration::from_secs(60));
    }

    #[rstest]
    #[should_panic(expected = "max_size must be greater than 0")]
    fn pool_config_rejects_zero_max_size() {
        let _ = PoolConfig::new("postgres://localhost/test").with_max_size(0);
    }

    #[rstest]
    #[should_panic(expected = "must not exceed max_size")]
    fn pool_config_rejects_min_idle_exceeding_max_size() {
        let _ = PoolConfig::new("postgres://localhost/test").with_min_idle(Some(11));
    }

    #[tokio::test]
    async fn db_pool_new_rejects_zero_max_size() {
        let config = PoolConfig { database_url: "postgres://localhost/test".to_owned(), max_size: 0, min_idle: None, connection_timeout: Duration::from_secs(30) };
        let err = DbPool::new(config).await.unwrap_err();
        assert!(matches!(err, PoolError::Build { .. }));
        assert!(err.to_string().contains("max_size must be greater than 0"));
    }

    #[tokio::test]
    async fn db_pool_new_rejects_min_idle_exceeding_max_size() {
        let config = PoolConfig { database_url: "postgres://localhost/test".to_owned(), max_size: 1, min_idle: Some(2), connection_timeout: Duration::from_secs(30) };
        let err = DbPool::new(config).await.unwrap_err();
        assert!(err.to_string().contains("min_idle (2) must not exceed max_size (1)"));
    }
}
