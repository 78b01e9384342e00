//! Sessions: statement building, execution and transactions
//!
//! ```ignore
//! let mut session = engine.session();
//!
//! let mut notes: Vec<Note> = Vec::new();
//! session.filter(Condition::eq("draft", false)).order_by("id DESC").limit(20).find_all(&mut notes).await?;
//!
//! session.transaction(|s| Box::pin(async move {
//!     s.insert(&Note { body: "hello".into(), ..Default::default() }).await?;
//!     Ok(())
//! })).await?;
//! ```

use std::future::Future;
use std::pin::Pin;

use crate::connection::Cursor;
use crate::connection::Engine;
use crate::connection::Transaction;
use crate::entity::Entity;
use crate::entity::ScanTarget;
use crate::entity::Shape;
use crate::error::Error;
use crate::error::Result;
use crate::query::Condition;
use crate::query::statement::Statement;
use crate::query::statement::StatementKind;
use crate::scanner::Scanner;
use crate::value::FromValue;
use crate::value::Value;

/// Future returned by the body of [`Session::transaction`]
pub type TransactionFuture<'s, R> = Pin<Box<dyn Future<Output = Result<R>> + Send + 's>>;

/// Unit of work over an [`Engine`]
///
/// Builder methods accumulate into one statement that the next executing call
/// consumes. Reads go to a replica unless [`use_primary`](Self::use_primary)
/// was called or a transaction is open; writes always go to the primary.
pub struct Session {
    engine:      Engine,
    statement:   Statement,
    use_primary: bool,
    tx:          Option<Box<dyn Transaction>>,
}

impl Session {
    pub fn new(engine: Engine) -> Self {
        let statement = Statement::new(engine.dialect());
        Self { engine, statement, use_primary: false, tx: None }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Routes reads of this session to the primary
    pub fn use_primary(&mut self) -> &mut Self {
        self.use_primary = true;
        self
    }

    pub fn in_transaction(&self) -> bool {
        self.tx.is_some()
    }

    pub fn select<I, S>(&mut self, columns: I) -> &mut Self
    where I: IntoIterator<Item = S>, S: Into<String> {
        self.statement.select(columns);
        self
    }

    pub fn from(&mut self, table: impl Into<String>) -> &mut Self {
        self.statement.from(table);
        self
    }

    pub fn columns<I, S>(&mut self, columns: I) -> &mut Self
    where I: IntoIterator<Item = S>, S: Into<String> {
        self.statement.columns(columns);
        self
    }

    pub fn filter(&mut self, condition: Condition) -> &mut Self {
        self.statement.filter(condition);
        self
    }

    pub fn order_by(&mut self, expr: impl Into<String>) -> &mut Self {
        self.statement.order_by(expr);
        self
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.statement.limit(limit);
        self
    }

    pub fn offset(&mut self, offset: u64) -> &mut Self {
        self.statement.offset(offset);
        self
    }

    /// Statement accumulated so far
    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    pub fn statement_mut(&mut self) -> &mut Statement {
        &mut self.statement
    }

    fn take_statement(&mut self) -> Statement {
        let fresh = Statement::new(self.statement.dialect());
        std::mem::replace(&mut self.statement, fresh)
    }

    /// Runs a read, through the transaction when one is open
    pub async fn query(&self, sql: &str, params: Vec<Value>) -> Result<Box<dyn Cursor>> {
        tracing::trace!("SQL: {} {:?}", sql, params);
        match &self.tx {
            Some(tx) => tx.query(sql, params).await,
            None if self.use_primary => self.engine.primary().query(sql, params).await,
            None => self.engine.replica().query(sql, params).await,
        }
    }

    /// Runs a write, through the transaction when one is open
    pub async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<u64> {
        tracing::trace!("SQL: {} {:?}", sql, params);
        match &self.tx {
            Some(tx) => tx.execute(sql, params).await,
            None => self.engine.primary().execute(sql, params).await,
        }
    }

    /// Fetches one row into `dest`
    ///
    /// Fails with [`Error::RecordNotFound`] when nothing matches.
    #[tracing::instrument(skip_all)]
    pub async fn find_one<T: ScanTarget + ?Sized>(&mut self, dest: &mut T) -> Result<()> {
        let mut statement = self.take_statement();
        let mut scanner = Scanner::bind(dest)?;
        if scanner.shape() != Shape::Struct {
            return Err(Error::ExpectStruct);
        }

        statement.default_kind(StatementKind::Select).limit(1);
        if statement.table().is_empty() {
            statement.from(scanner.table_name());
        }

        let (sql, params) = statement.to_sql()?;
        let cursor = self.query(&sql, params).await?;
        scanner.attach(cursor);
        scanner.convert().await
    }

    /// Fetches every matching row, replacing the contents of `dest`
    #[tracing::instrument(skip_all)]
    pub async fn find_all<T: ScanTarget + ?Sized>(&mut self, dest: &mut T) -> Result<()> {
        let mut statement = self.take_statement();
        let mut scanner = Scanner::bind(dest)?;
        if scanner.shape() != Shape::Sequence {
            return Err(Error::ExpectSlice);
        }

        statement.default_kind(StatementKind::Select);
        if statement.table().is_empty() {
            statement.from(scanner.table_name());
        }

        let (sql, params) = statement.to_sql()?;
        let cursor = self.query(&sql, params).await?;
        scanner.attach(cursor);
        scanner.convert().await
    }

    /// Counts rows matching the accumulated conditions
    ///
    /// The table must have been set with [`from`](Self::from).
    #[tracing::instrument(skip_all)]
    pub async fn count(&mut self) -> Result<i64> {
        let mut statement = self.take_statement();
        statement.default_kind(StatementKind::Select).columns(["count(*)"]);

        let (sql, params) = statement.to_sql()?;
        let mut cursor = self.query(&sql, params).await?;
        let result = read_count(cursor.as_mut()).await;
        cursor.close();
        result
    }

    /// Inserts every record of `dest` in one statement
    ///
    /// Read-only fields are left to the database.
    #[tracing::instrument(skip_all)]
    pub async fn insert<T: ScanTarget + ?Sized>(&mut self, dest: &T) -> Result<u64> {
        let table = self.take_statement().table().to_string();
        let scanner = Scanner::inspect(dest)?;
        let model = scanner.model();

        let fields: Vec<_> = model.writable_fields().collect();
        let mut statement = Statement::new(self.statement.dialect());
        statement.insert().from(resolve_table(table, scanner.table_name())).columns(fields.iter().map(|f| f.name()));
        for record in scanner.records() {
            statement.values(fields.iter().map(|f| record.field_value(f.position())));
        }

        let (sql, params) = statement.to_sql()?;
        self.execute(&sql, params).await
    }

    /// Updates every record of `dest` by primary key, one statement per record
    ///
    /// Returns the total number of affected rows.
    #[tracing::instrument(skip_all)]
    pub async fn update<T: ScanTarget + ?Sized>(&mut self, dest: &T) -> Result<u64> {
        let table = self.take_statement().table().to_string();
        let scanner = Scanner::inspect(dest)?;
        let model = scanner.model();
        let primary_key = model.require_primary_key()?;
        let table = resolve_table(table, scanner.table_name());

        let fields: Vec<_> = model.writable_fields().collect();
        let mut affected = 0;
        for record in scanner.records() {
            let mut statement = Statement::new(self.statement.dialect());
            statement
                .update()
                .from(table.clone())
                .columns(fields.iter().map(|f| f.name()))
                .values(fields.iter().map(|f| record.field_value(f.position())))
                .filter(Condition::eq(primary_key.name(), vec![record.field_value(primary_key.position())]));

            let (sql, params) = statement.to_sql()?;
            affected += self.execute(&sql, params).await?;
        }

        Ok(affected)
    }

    /// Deletes every record of `dest` by primary key in one statement
    #[tracing::instrument(skip_all)]
    pub async fn delete<T: ScanTarget + ?Sized>(&mut self, dest: &T) -> Result<u64> {
        let table = self.take_statement().table().to_string();
        let scanner = Scanner::inspect(dest)?;
        let model = scanner.model();
        let primary_key = model.require_primary_key()?;

        let keys: Vec<Value> =
            scanner.records().into_iter().map(|record| record.field_value(primary_key.position())).collect();

        let mut statement = Statement::new(self.statement.dialect());
        statement.delete().from(resolve_table(table, scanner.table_name())).filter(Condition::eq(primary_key.name(), keys));

        let (sql, params) = statement.to_sql()?;
        self.execute(&sql, params).await
    }

    /// Opens a transaction on the primary; later calls run inside it
    pub async fn begin(&mut self) -> Result<()> {
        if self.tx.is_some() {
            return Err(Error::Query("a transaction is already open on this session".to_string()));
        }
        self.tx = Some(self.engine.primary().begin().await?);
        tracing::debug!("Session transaction started");
        Ok(())
    }

    /// Commits the open transaction; a no-op when none is open
    pub async fn commit(&mut self) -> Result<()> {
        match self.tx.take() {
            Some(tx) => tx.commit().await,
            None => Ok(()),
        }
    }

    /// Rolls back the open transaction; a no-op when none is open
    pub async fn rollback(&mut self) -> Result<()> {
        match self.tx.take() {
            Some(tx) => tx.rollback().await,
            None => Ok(()),
        }
    }

    /// Runs `f` inside a transaction
    ///
    /// Commits when `f` succeeds and rolls back when it fails. A failed
    /// rollback is returned in place of the error from `f`, which is logged.
    pub async fn transaction<R, F>(&mut self, f: F) -> Result<R>
    where F: for<'s> FnOnce(&'s mut Session) -> TransactionFuture<'s, R> {
        self.begin().await?;

        match f(&mut *self).await {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback().await {
                    tracing::error!("Transaction body failed: {}", err);
                    return Err(rollback_err);
                }
                Err(err)
            }
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("statement", &self.statement)
            .field("use_primary", &self.use_primary)
            .field("in_transaction", &self.tx.is_some())
            .finish()
    }
}

fn resolve_table(explicit: String, model_table: &str) -> String {
    if explicit.is_empty() { model_table.to_string() } else { explicit }
}

async fn read_count(cursor: &mut dyn Cursor) -> Result<i64> {
    if !cursor.next().await? {
        return Ok(0);
    }
    let cells = cursor.scan()?;
    let Some(cell) = cells.first() else {
        return Ok(0);
    };
    Ok(i64::from_value(cell).map_err(|e| e.for_field("count(*)"))?.unwrap_or_default())
}
