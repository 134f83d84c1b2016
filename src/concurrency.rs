//! Bounded worker pool for per-row enrichment.

use anyhow::{Context, Result};
use rayon::prelude::*;

/// A dedicated rayon pool. Work submitted through it never spills onto the
/// global pool, so the bound holds even when other code uses rayon.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    threads: usize,
}

impl WorkerPool {
    pub fn new(threads: usize) -> Result<Self> {
        let threads = threads.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("enrich-{i}"))
            .build()
            .context("building worker pool")?;
        Ok(Self { pool, threads })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Apply `f` to every item; results come back in input order.
    pub fn map<T, U, F>(&self, items: &[T], f: F) -> Vec<U>
    where
        T: Sync,
        U: Send,
        F: Fn(&T) -> U + Sync + Send,
    {
        self.pool.install(|| items.par_iter().map(|it| f(it)).collect())
    }

    /// Like `map`, but stops handing out new items once any call fails.
    /// Calls already running finish; their results are discarded and the
    /// first observed error is returned.
    pub fn try_map<T, U, F>(&self, items: &[T], f: F) -> Result<Vec<U>>
    where
        T: Sync,
        U: Send,
        F: Fn(&T) -> Result<U> + Sync + Send,
    {
        self.pool.install(|| items.par_iter().map(|it| f(it)).collect())
    }
}
