//! Blade Hash Builder - fluent async front end for the digest engine
//!
//! Usage: `Blade::hash().compute(data).await` or
//! `Blade::hash().on_result(handler).compute(data).await`.
//! The digest itself runs on a dedicated thread so executor threads never
//! block on compression or worker dispatch.

use crate::async_result::AsyncDigestResult;
use crate::config::BladeConfig;
use crate::digest::Blade;
use crate::pool::WorkerPool;
use crate::{BladeDigest, BladeError, Result};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::error;

/// Blade hash builder - initial state
#[derive(Debug, Clone, Default)]
pub struct BladeBuilder {
    config: BladeConfig,
    pool: Option<Arc<WorkerPool>>,
}

/// Blade builder with result handler
#[derive(Debug)]
pub struct BladeWithHandler<F> {
    builder: BladeBuilder,
    handler: F,
}

impl BladeBuilder {
    /// Create new Blade builder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration
    #[must_use]
    pub fn with_config(mut self, config: BladeConfig) -> Self {
        self.config = config;
        self
    }

    /// Run on a private pool instead of the process-wide one
    #[must_use]
    pub fn with_pool(mut self, pool: Arc<WorkerPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Always use the worker pool
    #[must_use]
    pub fn force_parallel(mut self) -> Self {
        self.config = self.config.force_parallel(true);
        self
    }

    /// Never use the worker pool
    #[must_use]
    pub fn block_parallel(mut self) -> Self {
        self.config = self.config.block_parallel(true);
        self
    }

    /// Set result handler for the digest computation
    #[must_use]
    pub fn on_result<F, T>(self, handler: F) -> BladeWithHandler<F>
    where
        F: FnOnce(Result<BladeDigest>) -> T,
    {
        BladeWithHandler {
            builder: self,
            handler,
        }
    }

    /// Compute the Blade digest of `data`
    pub fn compute<D: Into<Vec<u8>>>(self, data: D) -> AsyncDigestResult {
        let data = data.into();
        let engine = match self.pool {
            Some(pool) => Blade::with_pool(self.config, pool),
            None => Blade::new(self.config),
        };

        let (tx, rx) = oneshot::channel();
        let spawned = std::thread::Builder::new()
            .name("blade-digest".into())
            .spawn(move || {
                let _ = tx.send(engine.digest(&data));
            });

        match spawned {
            Ok(_) => AsyncDigestResult::new(rx),
            Err(e) => {
                error!(error = %e, "Failed to spawn digest thread");
                AsyncDigestResult::error(BladeError::worker(format!(
                    "failed to spawn digest thread: {e}"
                )))
            }
        }
    }
}

impl<F, T> BladeWithHandler<F>
where
    F: FnOnce(Result<BladeDigest>) -> T + Unpin,
{
    /// Compute the Blade digest of `data` and pass it to the handler
    pub async fn compute<D: Into<Vec<u8>>>(self, data: D) -> T {
        self.builder.compute(data).on_result(self.handler).await
    }
}

impl Blade {
    /// Fluent async entry point
    #[must_use]
    pub fn hash() -> BladeBuilder {
        BladeBuilder::new()
    }
}
