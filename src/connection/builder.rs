use std::sync::Arc;

use super::Executor;
use super::engine::Engine;
use super::opts::Config;
use crate::error::Result;
use crate::query::Dialect;

/// Fluent construction of an [`Engine`] over local turso databases
///
/// ```ignore
/// let engine = Builder::new_local("app.db").with_replica("replica.db").build().await?;
/// ```
pub struct Builder {
    pub(super) primary:     String,
    pub(super) replicas:    Vec<String>,
    pub(super) enable_mvcc: bool,
}

impl Builder {
    pub fn new_local(path: &str) -> Self {
        Self { primary: path.to_string(), replicas: Vec::new(), enable_mvcc: false }
    }

    pub fn with_replica(mut self, path: &str) -> Self {
        self.replicas.push(path.to_string());
        self
    }

    pub fn with_replicas<I, S>(mut self, paths: I) -> Self
    where I: IntoIterator<Item = S>, S: Into<String> {
        self.replicas.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn with_mvcc(mut self, mvcc: bool) -> Self {
        self.enable_mvcc = mvcc;
        self
    }

    pub async fn build(self) -> Result<Engine> {
        let config = Config::from(&self);
        config.validate()?;

        let primary = super::TursoExecutor::open(&config.primary, config.enable_mvcc).await?;

        let mut replicas: Vec<Arc<dyn Executor>> = Vec::with_capacity(config.replicas.len());
        for path in &config.replicas {
            replicas.push(Arc::new(super::TursoExecutor::open(path, config.enable_mvcc).await?));
        }

        Ok(Engine::new(Arc::new(primary), replicas).with_dialect(Dialect::Sqlite))
    }
}

impl From<Config> for Builder {
    fn from(config: Config) -> Self {
        Self { primary: config.primary, replicas: config.replicas, enable_mvcc: config.enable_mvcc }
    }
}
