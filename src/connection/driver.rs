use async_trait::async_trait;

use super::Cursor;
use super::Executor;
use super::Transaction;
use crate::error::Error;
use crate::error::Result;
use crate::value::Value;

fn to_params(params: Vec<Value>) -> Vec<turso::Value> {
    params.into_iter().map(turso::Value::from).collect()
}

/// Executor backed by a local turso database
///
/// Autocommit statements share one connection. Every transaction gets a
/// connection of its own from [`turso::Database::connect`].
#[derive(Clone)]
pub struct TursoExecutor {
    db:          turso::Database,
    inner:       turso::Connection,
    path:        String,
    enable_mvcc: bool,
}

impl TursoExecutor {
    fn new(db: turso::Database, inner: turso::Connection, path: &str, enable_mvcc: bool) -> Self {
        Self { db, inner, path: path.to_string(), enable_mvcc }
    }

    /// Opens `path` and connects to it
    pub async fn open(path: &str, enable_mvcc: bool) -> Result<Self> {
        let db = turso::Builder::new_local(path).with_mvcc(enable_mvcc).build().await?;
        let conn = db.connect()?;
        tracing::debug!(path, enable_mvcc, "Opened turso connection");
        Ok(Self::new(db, conn, path, enable_mvcc))
    }

    pub fn path(&self) -> &str {
        self.path.as_str()
    }

    pub fn is_mvcc_enabled(&self) -> bool {
        self.enable_mvcc
    }

    /// Runs several `;` separated statements without parameters
    pub async fn execute_batch(&self, sql: &str) -> Result<()> {
        tracing::trace!("SQL: {}", sql);
        Ok(self.inner.execute_batch(sql).await?)
    }

    pub fn last_insert_rowid(&self) -> i64 {
        self.inner.last_insert_rowid()
    }

    async fn run_query(conn: &turso::Connection, sql: &str, params: Vec<Value>) -> Result<Box<dyn Cursor>> {
        tracing::trace!("SQL: {} {:?}", sql, params);
        let mut stmt = conn.prepare(sql).await?;
        let columns = stmt.columns().iter().map(|column| column.name().to_string()).collect();
        let rows = stmt.query(to_params(params)).await?;
        Ok(Box::new(TursoCursor { columns, rows: Some(rows), current: None }))
    }

    async fn run_execute(conn: &turso::Connection, sql: &str, params: Vec<Value>) -> Result<u64> {
        tracing::trace!("SQL: {} {:?}", sql, params);
        Ok(conn.execute(sql, to_params(params)).await?)
    }
}

impl std::fmt::Debug for TursoExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TursoExecutor").field("path", &self.path).field("enable_mvcc", &self.enable_mvcc).finish()
    }
}

#[async_trait]
impl Executor for TursoExecutor {
    async fn query(&self, sql: &str, params: Vec<Value>) -> Result<Box<dyn Cursor>> {
        Self::run_query(&self.inner, sql, params).await
    }

    async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<u64> {
        Self::run_execute(&self.inner, sql, params).await
    }

    async fn begin(&self) -> Result<Box<dyn Transaction>> {
        let conn = self.db.connect()?;
        conn.execute("BEGIN", ()).await?;
        tracing::debug!(path = %self.path, "Transaction started");
        Ok(Box::new(TursoTransaction { inner: Some(conn) }))
    }
}

/// Transaction running on its own connection of a [`TursoExecutor`]
///
/// Dropping it without commit or rollback schedules a `ROLLBACK` on the
/// current tokio runtime and releases the connection.
pub struct TursoTransaction {
    inner: Option<turso::Connection>,
}

impl TursoTransaction {
    fn connection(&self) -> Result<&turso::Connection> {
        self.inner.as_ref().ok_or_else(|| Error::Query("transaction is already finished".to_string()))
    }

    async fn finish(&mut self, sql: &'static str) -> Result<()> {
        self.connection()?.execute(sql, ()).await?;
        self.inner = None;
        Ok(())
    }
}

impl std::fmt::Debug for TursoTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TursoTransaction").field("open", &self.inner.is_some()).finish()
    }
}

#[async_trait]
impl Transaction for TursoTransaction {
    async fn query(&self, sql: &str, params: Vec<Value>) -> Result<Box<dyn Cursor>> {
        TursoExecutor::run_query(self.connection()?, sql, params).await
    }

    async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<u64> {
        TursoExecutor::run_execute(self.connection()?, sql, params).await
    }

    async fn commit(mut self: Box<Self>) -> Result<()> {
        self.finish("COMMIT").await?;
        tracing::debug!("Transaction committed");
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<()> {
        self.finish("ROLLBACK").await?;
        tracing::debug!("Transaction rolled back");
        Ok(())
    }
}

impl Drop for TursoTransaction {
    fn drop(&mut self) {
        let Some(conn) = self.inner.take() else {
            return;
        };

        tracing::warn!("Transaction dropped without commit or rollback, rolling back");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(err) = conn.execute("ROLLBACK", ()).await {
                        tracing::error!(error = %err, "Rollback of dropped transaction failed");
                    }
                });
            }
            Err(_) => tracing::warn!("No tokio runtime, closing the transaction connection without ROLLBACK"),
        }
    }
}

/// Rows of a turso query
pub struct TursoCursor {
    columns: Vec<String>,
    rows:    Option<turso::Rows>,
    current: Option<turso::Row>,
}

#[async_trait]
impl Cursor for TursoCursor {
    fn columns(&self) -> Vec<String> {
        self.columns.clone()
    }

    async fn next(&mut self) -> Result<bool> {
        let Some(rows) = self.rows.as_mut() else {
            return Ok(false);
        };
        self.current = rows.next().await?;
        Ok(self.current.is_some())
    }

    fn scan(&mut self) -> Result<Vec<Value>> {
        let row = self.current.as_ref().ok_or_else(|| Error::Query("scan called without a current row".to_string()))?;
        (0..row.column_count()).map(|idx| Ok(Value::from(row.get_value(idx)?))).collect()
    }

    fn close(&mut self) {
        self.current = None;
        self.rows = None;
    }
}
