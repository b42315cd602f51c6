//! Logging statement proxy
//!
//! [`LogStatement`] wraps a driver statement of any flavor. Plain statements
//! log the SQL handed to each execution method; prepared and callable
//! statements (see `prepared`) also track their bindings so that the log
//! shows the values in effect when the statement ran.

use std::{fmt, time::Duration};

use async_trait::async_trait;

use crate::{
    api::{
        Concurrency, Connection, CurrentResult, FetchDirection, GeneratedKeys, Holdability,
        ResultSetType, SqlWarning, Statement,
    },
    connection::LogConnection,
    params::{ParameterSnapshot, ParameterTracker},
    render::RenderRequest,
    sink::Operation,
};

/// The flavor of a wrapped statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Plain,
    Prepared,
    Callable,
}

impl StatementKind {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Plain => "Statement",
            StatementKind::Prepared => "PreparedStatement",
            StatementKind::Callable => "CallableStatement",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A statement proxy that logs every execution
///
/// `S` is the wrapped driver statement; it defaults to the connection's plain
/// statement type. See [`LogPreparedStatement`] and [`LogCallableStatement`]
/// for the parameterized flavors.
pub struct LogStatement<C: Connection, S = <C as Connection>::Statement> {
    pub(crate) inner: S,
    pub(crate) connection: LogConnection<C>,
    pub(crate) kind: StatementKind,
    pub(crate) sql: Option<String>,
    pub(crate) params: ParameterTracker,
    /// Entries queued through this proxy since the last batch execution
    pub(crate) batch_len: usize,
}

/// A prepared statement proxy
pub type LogPreparedStatement<C> = LogStatement<C, <C as Connection>::PreparedStatement>;

/// A callable statement proxy
pub type LogCallableStatement<C> = LogStatement<C, <C as Connection>::CallableStatement>;

impl<C: Connection, S> LogStatement<C, S> {
    pub(crate) fn new(
        inner: S,
        connection: LogConnection<C>,
        kind: StatementKind,
        sql: Option<String>,
    ) -> Self {
        Self {
            inner,
            connection,
            kind,
            sql,
            params: ParameterTracker::new(),
            batch_len: 0,
        }
    }

    /// The connection proxy that created this statement
    pub fn connection(&self) -> &LogConnection<C> {
        &self.connection
    }

    /// The SQL this statement was prepared with, if any
    pub fn sql(&self) -> Option<&str> {
        self.sql.as_deref()
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    /// The bindings currently tracked
    pub fn parameters(&self) -> ParameterSnapshot {
        self.params.snapshot()
    }

    /// Number of batch entries queued through this proxy
    pub fn batch_len(&self) -> usize {
        self.batch_len
    }

    /// The wrapped statement
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Unwrap the driver statement
    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Render `sql` with the bindings in effect right now
    pub(crate) fn describe(&self, sql: &str) -> String {
        let config = self.connection.config();
        match self.kind {
            StatementKind::Plain => sql.to_string(),
            _ if !config.include_params => format!("'{}'", sql),
            _ => RenderRequest::new(sql, self.params.snapshot())
                .render(config.effective_render_mode())
                .to_string(),
        }
    }

    pub(crate) fn log_execution(&self, operation: Operation, sql: &str) {
        self.connection.emit(
            operation,
            format!("executing {}: {}", self.kind, self.describe(sql)),
        );
    }

    pub(crate) fn log_batch_entry(&self, sql: &str) {
        self.connection.emit(
            Operation::AddBatch,
            format!("adding to {} batch: {}", self.kind, self.describe(sql)),
        );
    }
}

impl<C: Connection, S> fmt::Debug for LogStatement<C, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogStatement")
            .field("kind", &self.kind)
            .field("connection", &self.connection.id())
            .field("sql", &self.sql)
            .field("params", &self.params)
            .field("batch_len", &self.batch_len)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<C, S> Statement for LogStatement<C, S>
where
    C: Connection,
    S: Statement,
{
    type Error = S::Error;
    type ResultSet = S::ResultSet;

    async fn execute_sql(&mut self, sql: &str) -> Result<bool, Self::Error> {
        self.log_execution(Operation::Execute, sql);
        self.inner.execute_sql(sql).await
    }

    async fn execute_sql_with_keys(
        &mut self,
        sql: &str,
        keys: GeneratedKeys,
    ) -> Result<bool, Self::Error> {
        self.log_execution(Operation::Execute, sql);
        self.inner.execute_sql_with_keys(sql, keys).await
    }

    async fn execute_query_sql(&mut self, sql: &str) -> Result<Self::ResultSet, Self::Error> {
        self.log_execution(Operation::ExecuteQuery, sql);
        self.inner.execute_query_sql(sql).await
    }

    async fn execute_update_sql(&mut self, sql: &str) -> Result<u64, Self::Error> {
        self.log_execution(Operation::ExecuteUpdate, sql);
        self.inner.execute_update_sql(sql).await
    }

    async fn execute_update_sql_with_keys(
        &mut self,
        sql: &str,
        keys: GeneratedKeys,
    ) -> Result<u64, Self::Error> {
        self.log_execution(Operation::ExecuteUpdate, sql);
        self.inner.execute_update_sql_with_keys(sql, keys).await
    }

    async fn add_batch_sql(&mut self, sql: &str) -> Result<(), Self::Error> {
        self.log_batch_entry(sql);
        self.inner.add_batch_sql(sql).await?;
        self.batch_len += 1;
        Ok(())
    }

    async fn execute_batch(&mut self) -> Result<Vec<i64>, Self::Error> {
        self.connection.emit(
            Operation::ExecuteBatch,
            format!("executing {} batch ({} entries)", self.kind, self.batch_len),
        );
        // The driver discards the batch whether or not it succeeds
        self.batch_len = 0;
        self.inner.execute_batch().await
    }

    fn clear_batch(&mut self) -> Result<(), Self::Error> {
        self.inner.clear_batch()?;
        self.batch_len = 0;
        Ok(())
    }

    async fn more_results(&mut self, current: CurrentResult) -> Result<bool, Self::Error> {
        self.inner.more_results(current).await
    }

    async fn generated_keys(&mut self) -> Result<Self::ResultSet, Self::Error> {
        self.inner.generated_keys().await
    }

    async fn cancel(&mut self) -> Result<(), Self::Error> {
        self.inner.cancel().await
    }

    async fn close(&mut self) -> Result<(), Self::Error> {
        self.inner.close().await
    }

    forward_ref! { inner =>
        fn update_count(&self) -> Option<u64>;
        fn is_closed(&self) -> bool;
        fn fetch_size(&self) -> u32;
        fn fetch_direction(&self) -> FetchDirection;
        fn max_rows(&self) -> u64;
        fn max_field_size(&self) -> u32;
        fn query_timeout(&self) -> Option<Duration>;
        fn result_set_type(&self) -> ResultSetType;
        fn result_set_concurrency(&self) -> Concurrency;
        fn result_set_holdability(&self) -> Holdability;
        fn warnings(&self) -> Vec<SqlWarning>;
        fn is_poolable(&self) -> bool;
        fn is_close_on_completion(&self) -> bool;
    }

    forward_mut! { inner =>
        fn result_set(&mut self) -> Option<Self::ResultSet>;
        fn set_fetch_size(&mut self, rows: u32) -> ();
        fn set_fetch_direction(&mut self, direction: FetchDirection) -> ();
        fn set_max_rows(&mut self, max: u64) -> ();
        fn set_max_field_size(&mut self, max: u32) -> ();
        fn set_query_timeout(&mut self, timeout: Option<Duration>) -> ();
        fn set_cursor_name(&mut self, name: &str) -> ();
        fn set_escape_processing(&mut self, enable: bool) -> ();
        fn clear_warnings(&mut self) -> ();
        fn set_poolable(&mut self, poolable: bool) -> ();
        fn close_on_completion(&mut self) -> ();
    }
}
