use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::client::{Client, Reply};
use crate::commands::get::Get;
use crate::commands::incr::Incr;
use crate::commands::Command;

pub const DEFAULT_KEY: &str = "total_analyses";

/// A usage counter kept in the store under a single key.
///
/// The counter is telemetry: neither operation ever fails, and a store that is missing, slow or
/// broken reads as zero.
#[derive(Debug, Clone)]
pub struct Counter {
    client: Client,
    key: String,
}

impl Counter {
    pub fn new(client: Client, key: impl Into<String>) -> Counter {
        Counter {
            client,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Bumps the counter by one. The outcome is only logged.
    pub async fn increment(&self) {
        let reply = self
            .client
            .execute(Command::Incr(Incr {
                key: self.key.clone(),
            }))
            .await;

        match reply {
            Reply::Integer(count) => info!(key = %self.key, count, "counter incremented"),
            reply => debug!(key = %self.key, ?reply, "counter not incremented"),
        }
    }

    /// Bumps the counter on a background task so the caller never waits for the store.
    pub fn spawn_increment(&self) -> JoinHandle<()> {
        let counter = self.clone();
        tokio::spawn(async move { counter.increment().await })
    }

    /// Reads the current count, or 0 if it cannot be read as a non-negative number.
    pub async fn read(&self) -> u64 {
        let reply = self
            .client
            .execute(Command::Get(Get {
                key: self.key.clone(),
            }))
            .await;

        let count = reply.as_integer().and_then(|n| u64::try_from(n).ok());
        if count.is_none() {
            debug!(key = %self.key, ?reply, "counter unreadable, reporting 0");
        }

        count.unwrap_or(0)
    }
}
