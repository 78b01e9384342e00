use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use super::Executor;
use super::builder::Builder;
use super::opts::Config;
use crate::error::Result;
use crate::query::Dialect;
use crate::session::Session;

struct EngineInner {
    primary:      Arc<dyn Executor>,
    replicas:     Vec<Arc<dyn Executor>>,
    next_replica: AtomicUsize,
    dialect:      Dialect,
}

/// Primary connection plus read replicas, shared by every session
///
/// Cloning is cheap; clones share the executors and the replica counter.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    pub fn new(primary: Arc<dyn Executor>, replicas: Vec<Arc<dyn Executor>>) -> Self {
        Self {
            inner: Arc::new(EngineInner {
                primary,
                replicas,
                next_replica: AtomicUsize::new(0),
                dialect: Dialect::default(),
            }),
        }
    }

    /// Opens every database named by `config`
    pub async fn from_config(config: &Config) -> Result<Self> {
        Builder::from(config.clone()).build().await
    }

    /// Dialect statements of this engine's sessions render for
    pub fn with_dialect(self, dialect: Dialect) -> Self {
        let inner = match Arc::try_unwrap(self.inner) {
            Ok(inner) => EngineInner { dialect, ..inner },
            Err(shared) => EngineInner {
                primary: shared.primary.clone(),
                replicas: shared.replicas.clone(),
                next_replica: AtomicUsize::new(shared.next_replica.load(Ordering::Relaxed)),
                dialect,
            },
        };
        Self { inner: Arc::new(inner) }
    }

    pub fn dialect(&self) -> Dialect {
        self.inner.dialect
    }

    pub fn primary(&self) -> &Arc<dyn Executor> {
        &self.inner.primary
    }

    /// Next replica in round-robin order, or the primary when there are none
    pub fn replica(&self) -> &Arc<dyn Executor> {
        let replicas = &self.inner.replicas;
        if replicas.is_empty() {
            return &self.inner.primary;
        }

        let idx = self.inner.next_replica.fetch_add(1, Ordering::Relaxed) % replicas.len();
        tracing::debug!(replica = idx, "Selected read replica");
        &replicas[idx]
    }

    pub fn replica_count(&self) -> usize {
        self.inner.replicas.len()
    }

    pub fn session(&self) -> Session {
        Session::new(self.clone())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("replicas", &self.inner.replicas.len())
            .field("dialect", &self.inner.dialect)
            .finish_non_exhaustive()
    }
}
