use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use async_trait::async_trait;

use super::Cursor;
use super::Executor;
use super::Transaction;
use crate::error::Error;
use crate::error::Result;
use crate::value::Value;

#[derive(Default)]
struct MockState {
    statements:     Mutex<Vec<String>>,
    params:         Mutex<Vec<Vec<Value>>>,
    results:        Mutex<VecDeque<(Vec<String>, Vec<Vec<Value>>)>>,
    affected:       AtomicU64,
    fail_execute:   AtomicBool,
    fail_commit:    AtomicBool,
    closed_cursors: Arc<AtomicUsize>,
}

impl MockState {
    fn record(&self, sql: &str, params: Vec<Value>) {
        self.statements.lock().unwrap().push(sql.to_string());
        self.params.lock().unwrap().push(params);
    }

    fn query(&self, sql: &str, params: Vec<Value>) -> Result<Box<dyn Cursor>> {
        self.record(sql, params);
        let (columns, rows) = self.results.lock().unwrap().pop_front().unwrap_or_default();
        Ok(Box::new(MockCursor {
            columns,
            rows: rows.into(),
            current: None,
            closed: false,
            closed_cursors: self.closed_cursors.clone(),
        }))
    }

    fn execute(&self, sql: &str, params: Vec<Value>) -> Result<u64> {
        self.record(sql, params);
        if self.fail_execute.load(Ordering::SeqCst) {
            return Err(Error::Query(format!("execute failed: {sql}")));
        }
        Ok(self.affected.load(Ordering::SeqCst))
    }
}

/// In-memory executor recording every statement it receives
pub(crate) struct MockExecutor {
    name:  String,
    state: Arc<MockState>,
}

impl MockExecutor {
    pub(crate) fn named(name: &str) -> Self {
        let state = MockState { affected: AtomicU64::new(1), ..MockState::default() };
        Self { name: name.to_string(), state: Arc::new(state) }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    /// Queues a result set for the next query
    pub(crate) fn push_rows(&self, columns: &[&str], rows: Vec<Vec<Value>>) {
        let columns = columns.iter().map(|c| c.to_string()).collect();
        self.state.results.lock().unwrap().push_back((columns, rows));
    }

    pub(crate) fn set_affected(&self, affected: u64) {
        self.state.affected.store(affected, Ordering::SeqCst);
    }

    pub(crate) fn fail_execute(&self) {
        self.state.fail_execute.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fail_commit(&self) {
        self.state.fail_commit.store(true, Ordering::SeqCst);
    }

    pub(crate) fn statements(&self) -> Vec<String> {
        self.state.statements.lock().unwrap().clone()
    }

    pub(crate) fn params(&self) -> Vec<Vec<Value>> {
        self.state.params.lock().unwrap().clone()
    }

    pub(crate) fn closed_cursors(&self) -> usize {
        self.state.closed_cursors.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Executor for MockExecutor {
    async fn query(&self, sql: &str, params: Vec<Value>) -> Result<Box<dyn Cursor>> {
        self.state.query(sql, params)
    }

    async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<u64> {
        self.state.execute(sql, params)
    }

    async fn begin(&self) -> Result<Box<dyn Transaction>> {
        self.state.record("BEGIN", Vec::new());
        Ok(Box::new(MockTransaction { state: self.state.clone() }))
    }
}

pub(crate) struct MockTransaction {
    state: Arc<MockState>,
}

#[async_trait]
impl Transaction for MockTransaction {
    async fn query(&self, sql: &str, params: Vec<Value>) -> Result<Box<dyn Cursor>> {
        self.state.query(sql, params)
    }

    async fn execute(&self, sql: &str, params: Vec<Value>) -> Result<u64> {
        self.state.execute(sql, params)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.state.record("COMMIT", Vec::new());
        if self.state.fail_commit.load(Ordering::SeqCst) {
            return Err(Error::Query("commit failed".to_string()));
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.state.record("ROLLBACK", Vec::new());
        Ok(())
    }
}

pub(crate) struct MockCursor {
    columns:        Vec<String>,
    rows:           VecDeque<Vec<Value>>,
    current:        Option<Vec<Value>>,
    closed:         bool,
    closed_cursors: Arc<AtomicUsize>,
}

impl MockCursor {
    pub(crate) fn new(columns: &[&str], rows: Vec<Vec<Value>>) -> (Self, Arc<AtomicUsize>) {
        let closed_cursors = Arc::new(AtomicUsize::new(0));
        let cursor = Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows.into(),
            current: None,
            closed: false,
            closed_cursors: closed_cursors.clone(),
        };
        (cursor, closed_cursors)
    }
}

#[async_trait]
impl Cursor for MockCursor {
    fn columns(&self) -> Vec<String> {
        self.columns.clone()
    }

    async fn next(&mut self) -> Result<bool> {
        self.current = self.rows.pop_front();
        Ok(self.current.is_some())
    }

    fn scan(&mut self) -> Result<Vec<Value>> {
        self.current.clone().ok_or_else(|| Error::Query("no current row".to_string()))
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.closed_cursors.fetch_add(1, Ordering::SeqCst);
        }
    }
}
