//! Work queue of submission ids
//!
//! The intake side pushes a submission id after creating a `Pending`
//! record; each worker blocks on a pop bounded by a short wait so it can
//! notice shutdown between pops. Redis `BLPOP` is atomic, so two workers
//! never claim the same id.

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use secrecy::ExposeSecret;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tracing::{debug, info};

use crate::config::QueueConfig;
use crate::error::{Error, Result};

/// Blocking FIFO of opaque submission-id tokens
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Wait up to `wait` for a token and remove it; `None` when the wait lapses
    async fn pop(&self, wait: Duration) -> Result<Option<String>>;

    /// Append a token
    async fn push(&self, token: &str) -> Result<()>;
}

/// Redis list queue
#[derive(Clone)]
pub struct RedisQueue {
    connection: ConnectionManager,
    name: String,
}

impl RedisQueue {
    /// Connect using the queue section of the configuration
    pub async fn connect(config: &QueueConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.expose_secret())
            .map_err(|e| Error::Queue(format!("Invalid Redis URL: {}", e)))?;
        let connection = client.get_connection_manager().await?;

        info!(queue = %config.name, "Connected to Redis");
        Ok(RedisQueue {
            connection,
            name: config.name.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of tokens waiting
    pub async fn len(&self) -> Result<usize> {
        let mut connection = self.connection.clone();
        let len: usize = connection.llen(&self.name).await?;
        Ok(len)
    }
}

#[async_trait]
impl JobQueue for RedisQueue {
    async fn pop(&self, wait: Duration) -> Result<Option<String>> {
        let mut connection = self.connection.clone();
        let popped: Option<(String, String)> = connection.blpop(&self.name, wait.as_secs_f64()).await?;
        Ok(popped.map(|(_, token)| {
            debug!(queue = %self.name, token = %token, "Dequeued job");
            token
        }))
    }

    async fn push(&self, token: &str) -> Result<()> {
        let mut connection = self.connection.clone();
        let _: i64 = connection.rpush(&self.name, token).await?;
        debug!(queue = %self.name, token = %token, "Enqueued job");
        Ok(())
    }
}

/// In-process queue with the same blocking semantics
#[derive(Debug, Default)]
pub struct MemoryQueue {
    items: Mutex<VecDeque<String>>,
    available: Notify,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }
}

#[async_trait]
impl JobQueue for MemoryQueue {
    async fn pop(&self, wait: Duration) -> Result<Option<String>> {
        let next = async {
            loop {
                let notified = self.available.notified();
                if let Some(token) = self.items.lock().await.pop_front() {
                    return token;
                }
                notified.await;
            }
        };
        Ok(tokio::time::timeout(wait, next).await.ok())
    }

    async fn push(&self, token: &str) -> Result<()> {
        self.items.lock().await.push_back(token.to_string());
        self.available.notify_one();
        Ok(())
    }
}
