//! Driver boundary, configuration and replica routing
//!
//! The session talks to databases only through [`Executor`], [`Cursor`] and
//! [`Transaction`]. [`TursoExecutor`] is the bundled
//! implementation; any other driver can be plugged into [`Engine::new`].

pub(crate) mod builder;
pub(crate) mod driver;
pub(crate) mod engine;
pub(crate) mod opts;

#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;

pub use self::builder::Builder;
pub use self::driver::TursoCursor;
pub use self::driver::TursoExecutor;
pub use self::driver::TursoTransaction;
pub use self::engine::Engine;
pub use self::opts::Config;
use crate::error::Result;
use crate::value::Value;

pub mod prelude {
    pub use super::Builder;
    pub use super::Config;
    pub use super::Cursor;
    pub use super::Engine;
    pub use super::Executor;
    pub use super::Transaction;
    pub use super::TursoExecutor;
}

/// Forward-only result set
#[async_trait]
pub trait Cursor: Send {
    /// Column names of the result set, in order
    fn columns(&self) -> Vec<String>;

    /// Advances to the next row; `false` once the rows are exhausted
    async fn next(&mut self) -> Result<bool>;

    /// Cells of the current row, one per column
    fn scan(&mut self) -> Result<Vec<Value>>;

    /// Releases the underlying rows; calling it again is a no-op
    fn close(&mut self);
}

/// Connection able to run parameterized SQL and open transactions
#[async_trait]
pub trait Executor: Send + Sync {
    async fn query(&self, sql: &str, params: Vec<Value>) -> Result<Box<dyn Cursor>>;

    /// Runs a statement and returns the number of affected rows
    async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<u64>;

    async fn begin(&self) -> Result<Box<dyn Transaction>>;
}

/// Open transaction; consumed by commit or rollback
#[async_trait]
pub trait Transaction: Send + Sync {
    async fn query(&self, sql: &str, params: Vec<Value>) -> Result<Box<dyn Cursor>>;

    async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<u64>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}
