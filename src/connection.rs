//! Logging connection proxy
//!
//! [`LogConnection`] wraps any [`Connection`] and forwards every call to it.
//! Opening, closing, commits, rollbacks and statement creation are logged.
//! Statements created through the proxy are themselves proxies that point
//! back at this connection, so everything executed through them is logged
//! too.

use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    api::{
        Connection, Holdability, PrepareOptions, SqlWarning, StatementOptions,
        TransactionIsolation,
    },
    config::LogConfig,
    sink::{LogRecord, LogSink, Operation, TracingSink},
    statement::{LogCallableStatement, LogPreparedStatement, LogStatement, StatementKind},
};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a connection sequence number
pub(crate) fn next_connection_id() -> u64 {
    NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed)
}

/// A connection proxy that logs what it forwards
///
/// Cloning is cheap and yields a handle to the same proxy; every statement
/// created through it holds such a handle.
///
/// # Example
///
/// ```ignore
/// use logdriver::{LogConnection, PreparedStatementExt};
/// use logdriver::api::{Connection, PrepareOptions, PreparedStatement};
///
/// let conn = LogConnection::new(driver_connection);
/// let mut stmt = conn
///     .prepare_statement("SELECT * FROM users WHERE id = ?", PrepareOptions::default())
///     .await?;
/// stmt.bind(1, 42)?;
/// // logs: executing PreparedStatement: 'SELECT * FROM users WHERE id = ?' with bind parameters: {1=42}
/// let rows = stmt.execute_query().await?;
/// ```
pub struct LogConnection<C> {
    shared: Arc<Shared<C>>,
}

struct Shared<C> {
    inner: C,
    id: u64,
    sink: Arc<dyn LogSink>,
    config: LogConfig,
}

impl<C> Clone for LogConnection<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C: Connection> LogConnection<C> {
    /// Wrap `inner`, logging through `tracing` with the default configuration
    pub fn new(inner: C) -> Self {
        Self::with_options(inner, Arc::new(TracingSink), LogConfig::default())
    }

    /// Wrap `inner`, logging to `sink`
    pub fn with_sink(inner: C, sink: Arc<dyn LogSink>) -> Self {
        Self::with_options(inner, sink, LogConfig::default())
    }

    /// Wrap `inner` with an explicit sink and configuration
    pub fn with_options(inner: C, sink: Arc<dyn LogSink>, config: LogConfig) -> Self {
        let id = next_connection_id();
        let conn = Self {
            shared: Arc::new(Shared {
                inner,
                id,
                sink,
                config,
            }),
        };
        conn.emit(Operation::Open, format!("Opening connection #{}", id));
        conn
    }
}

impl<C> LogConnection<C> {
    /// Sequence number identifying this proxy in log records
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// The wrapped connection
    pub fn inner(&self) -> &C {
        &self.shared.inner
    }

    pub fn config(&self) -> &LogConfig {
        &self.shared.config
    }

    pub fn sink(&self) -> &Arc<dyn LogSink> {
        &self.shared.sink
    }

    /// Check whether two handles refer to the same proxy
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }

    pub(crate) fn emit(&self, operation: Operation, message: impl Into<String>) {
        let record =
            LogRecord::new(operation, self.shared.id, message).with_level(self.shared.config.level);
        self.shared.sink.emit(&record);
    }
}

impl<C> std::fmt::Debug for LogConnection<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogConnection")
            .field("id", &self.shared.id)
            .field("config", &self.shared.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<C: Connection> Connection for LogConnection<C> {
    type Error = C::Error;
    type Statement = LogStatement<C>;
    type PreparedStatement = LogPreparedStatement<C>;
    type CallableStatement = LogCallableStatement<C>;
    type Savepoint = C::Savepoint;

    async fn create_statement(
        &self,
        options: StatementOptions,
    ) -> Result<Self::Statement, Self::Error> {
        self.emit(Operation::CreateStatement, "Creating a new statement");
        let inner = self.shared.inner.create_statement(options).await?;
        Ok(LogStatement::new(inner, self.clone(), StatementKind::Plain, None))
    }

    async fn prepare_statement(
        &self,
        sql: &str,
        options: PrepareOptions,
    ) -> Result<Self::PreparedStatement, Self::Error> {
        self.emit(Operation::PrepareStatement, format!("Preparing statement: {}", sql));
        let inner = self.shared.inner.prepare_statement(sql, options).await?;
        Ok(LogStatement::new(
            inner,
            self.clone(),
            StatementKind::Prepared,
            Some(sql.to_string()),
        ))
    }

    async fn prepare_call(
        &self,
        sql: &str,
        options: StatementOptions,
    ) -> Result<Self::CallableStatement, Self::Error> {
        self.emit(Operation::PrepareCall, format!("Preparing call: {}", sql));
        let inner = self.shared.inner.prepare_call(sql, options).await?;
        Ok(LogStatement::new(
            inner,
            self.clone(),
            StatementKind::Callable,
            Some(sql.to_string()),
        ))
    }

    async fn commit(&self) -> Result<(), Self::Error> {
        self.emit(Operation::Commit, format!("Committing connection #{}", self.id()));
        self.shared.inner.commit().await
    }

    async fn rollback(&self) -> Result<(), Self::Error> {
        self.emit(Operation::Rollback, format!("Rolling back connection #{}", self.id()));
        self.shared.inner.rollback().await
    }

    async fn set_savepoint(&self, name: Option<&str>) -> Result<Self::Savepoint, Self::Error> {
        self.shared.inner.set_savepoint(name).await
    }

    async fn rollback_to_savepoint(&self, savepoint: &Self::Savepoint) -> Result<(), Self::Error> {
        self.emit(
            Operation::Rollback,
            format!("Rolling back connection #{} to savepoint", self.id()),
        );
        self.shared.inner.rollback_to_savepoint(savepoint).await
    }

    async fn release_savepoint(&self, savepoint: &Self::Savepoint) -> Result<(), Self::Error> {
        self.shared.inner.release_savepoint(savepoint).await
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.emit(Operation::Close, format!("Closing connection #{}", self.id()));
        self.shared.inner.close().await
    }

    async fn is_valid(&self, timeout: Duration) -> Result<bool, Self::Error> {
        self.shared.inner.is_valid(timeout).await
    }

    forward_ref! { shared.inner =>
        fn native_sql(&self, sql: &str) -> String;
        fn auto_commit(&self) -> bool;
        fn set_auto_commit(&self, auto_commit: bool) -> ();
        fn is_closed(&self) -> bool;
        fn is_read_only(&self) -> bool;
        fn set_read_only(&self, read_only: bool) -> ();
        fn catalog(&self) -> Option<String>;
        fn set_catalog(&self, catalog: &str) -> ();
        fn transaction_isolation(&self) -> TransactionIsolation;
        fn set_transaction_isolation(&self, level: TransactionIsolation) -> ();
        fn holdability(&self) -> Holdability;
        fn set_holdability(&self, holdability: Holdability) -> ();
        fn warnings(&self) -> Vec<SqlWarning>;
        fn clear_warnings(&self) -> ();
        fn client_info(&self, name: &str) -> Option<String>;
        fn set_client_info(&self, name: &str, value: &str) -> ();
    }
}
