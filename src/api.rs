//! Capability traits for SQL database access
//!
//! These traits describe the surface a driver exposes: connections,
//! statements, prepared and callable statements, data sources and drivers.
//! The logging proxies implement the very same traits, so code written
//! against them accepts a proxy wherever it accepts the real thing.
//!
//! Operations that talk to the database are `async`; settings and cached
//! state are plain methods. Every trait carries the driver's own `Error`
//! type, which the proxies pass through untouched.

use std::{collections::HashMap, fmt, time::Duration};

use async_trait::async_trait;

use crate::{
    types::SqlType,
    value::{ParamStream, ParamValue},
};

/// Scrollability of result sets produced by a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultSetType {
    #[default]
    ForwardOnly,
    ScrollInsensitive,
    ScrollSensitive,
}

/// Whether result sets can be updated in place
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Concurrency {
    #[default]
    ReadOnly,
    Updatable,
}

/// What happens to open cursors on commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Holdability {
    HoldCursorsOverCommit,
    CloseCursorsAtCommit,
}

/// Transaction isolation levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionIsolation {
    None,
    ReadUncommitted,
    ReadCommitted,
    RepeatableRead,
    Serializable,
}

/// Row processing direction hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchDirection {
    #[default]
    Forward,
    Reverse,
    Unknown,
}

/// What to do with the current result when moving to the next one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CurrentResult {
    #[default]
    Close,
    Keep,
    CloseAll,
}

/// Which auto-generated keys an execution should make available
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GeneratedKeys {
    #[default]
    None,
    /// Let the driver pick the key columns
    Return,
    /// Key columns by 1-based index
    Columns(Vec<u32>),
    /// Key columns by name
    Named(Vec<String>),
}

/// Result set options for statement creation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatementOptions {
    pub result_set_type: ResultSetType,
    pub concurrency: Concurrency,
    /// `None` keeps the connection default
    pub holdability: Option<Holdability>,
}

impl StatementOptions {
    pub fn with_result_set_type(mut self, result_set_type: ResultSetType) -> Self {
        self.result_set_type = result_set_type;
        self
    }

    pub fn with_concurrency(mut self, concurrency: Concurrency) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_holdability(mut self, holdability: Holdability) -> Self {
        self.holdability = Some(holdability);
        self
    }
}

/// Options for preparing a statement
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PrepareOptions {
    pub statement: StatementOptions,
    pub generated_keys: GeneratedKeys,
}

impl PrepareOptions {
    pub fn with_statement_options(mut self, statement: StatementOptions) -> Self {
        self.statement = statement;
        self
    }

    pub fn with_generated_keys(mut self, keys: GeneratedKeys) -> Self {
        self.generated_keys = keys;
        self
    }
}

/// A warning reported by the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlWarning {
    pub message: String,
    pub sql_state: Option<String>,
    pub code: i32,
}

impl SqlWarning {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            sql_state: None,
            code: 0,
        }
    }
}

impl fmt::Display for SqlWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.sql_state {
            Some(state) => write!(f, "[{}] {}", state, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

/// Description of one statement parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterInfo {
    pub sql_type: SqlType,
    pub nullable: bool,
}

/// A SQL statement
#[async_trait]
pub trait Statement: Send {
    /// Driver error type
    type Error: Send;
    /// Driver result set type
    type ResultSet: Send;

    /// Execute `sql`; `true` when the first result is a result set
    async fn execute_sql(&mut self, sql: &str) -> Result<bool, Self::Error>;

    async fn execute_sql_with_keys(
        &mut self,
        sql: &str,
        keys: GeneratedKeys,
    ) -> Result<bool, Self::Error>;

    async fn execute_query_sql(&mut self, sql: &str) -> Result<Self::ResultSet, Self::Error>;

    /// Execute a data-modifying `sql`, returning the affected row count
    async fn execute_update_sql(&mut self, sql: &str) -> Result<u64, Self::Error>;

    async fn execute_update_sql_with_keys(
        &mut self,
        sql: &str,
        keys: GeneratedKeys,
    ) -> Result<u64, Self::Error>;

    async fn add_batch_sql(&mut self, sql: &str) -> Result<(), Self::Error>;

    /// Execute every queued entry; one count per entry
    async fn execute_batch(&mut self) -> Result<Vec<i64>, Self::Error>;

    fn clear_batch(&mut self) -> Result<(), Self::Error>;

    fn result_set(&mut self) -> Result<Option<Self::ResultSet>, Self::Error>;

    fn update_count(&self) -> Result<Option<u64>, Self::Error>;

    async fn more_results(&mut self, current: CurrentResult) -> Result<bool, Self::Error>;

    async fn generated_keys(&mut self) -> Result<Self::ResultSet, Self::Error>;

    async fn cancel(&mut self) -> Result<(), Self::Error>;

    async fn close(&mut self) -> Result<(), Self::Error>;

    fn is_closed(&self) -> Result<bool, Self::Error>;

    fn fetch_size(&self) -> Result<u32, Self::Error>;

    fn set_fetch_size(&mut self, rows: u32) -> Result<(), Self::Error>;

    fn fetch_direction(&self) -> Result<FetchDirection, Self::Error>;

    fn set_fetch_direction(&mut self, direction: FetchDirection) -> Result<(), Self::Error>;

    fn max_rows(&self) -> Result<u64, Self::Error>;

    fn set_max_rows(&mut self, max: u64) -> Result<(), Self::Error>;

    fn max_field_size(&self) -> Result<u32, Self::Error>;

    fn set_max_field_size(&mut self, max: u32) -> Result<(), Self::Error>;

    /// `None` means no timeout
    fn query_timeout(&self) -> Result<Option<Duration>, Self::Error>;

    fn set_query_timeout(&mut self, timeout: Option<Duration>) -> Result<(), Self::Error>;

    fn set_cursor_name(&mut self, name: &str) -> Result<(), Self::Error>;

    fn set_escape_processing(&mut self, enable: bool) -> Result<(), Self::Error>;

    fn result_set_type(&self) -> Result<ResultSetType, Self::Error>;

    fn result_set_concurrency(&self) -> Result<Concurrency, Self::Error>;

    fn result_set_holdability(&self) -> Result<Holdability, Self::Error>;

    fn warnings(&self) -> Result<Vec<SqlWarning>, Self::Error>;

    fn clear_warnings(&mut self) -> Result<(), Self::Error>;

    fn is_poolable(&self) -> Result<bool, Self::Error>;

    fn set_poolable(&mut self, poolable: bool) -> Result<(), Self::Error>;

    fn close_on_completion(&mut self) -> Result<(), Self::Error>;

    fn is_close_on_completion(&self) -> Result<bool, Self::Error>;
}

/// A statement compiled from SQL text with `?` placeholders
#[async_trait]
pub trait PreparedStatement: Statement {
    async fn execute(&mut self) -> Result<bool, Self::Error>;

    async fn execute_query(&mut self) -> Result<Self::ResultSet, Self::Error>;

    async fn execute_update(&mut self) -> Result<u64, Self::Error>;

    /// Queue the current bindings as a batch entry
    async fn add_batch(&mut self) -> Result<(), Self::Error>;

    /// Bind `value` at the 1-based `index`
    fn set_value(&mut self, index: u32, value: ParamValue) -> Result<(), Self::Error>;

    /// Bind a typed NULL at `index`
    fn set_null(&mut self, index: u32, sql_type: SqlType) -> Result<(), Self::Error>;

    /// Bind a stream at `index`; the statement takes ownership of the reader
    fn set_stream(&mut self, index: u32, stream: ParamStream) -> Result<(), Self::Error>;

    fn clear_parameters(&mut self) -> Result<(), Self::Error>;

    fn parameter_metadata(&self) -> Result<Vec<ParameterInfo>, Self::Error>;
}

/// A prepared call to a stored procedure
pub trait CallableStatement: PreparedStatement {
    fn register_out_parameter(&mut self, index: u32, sql_type: SqlType)
        -> Result<(), Self::Error>;

    /// Read an OUT parameter after execution
    fn out_value(&self, index: u32) -> Result<ParamValue, Self::Error>;

    /// Whether the last OUT parameter read was SQL NULL
    fn was_null(&self) -> Result<bool, Self::Error>;
}

/// Typed setters available on every prepared statement
pub trait PreparedStatementExt: PreparedStatement {
    fn bind(&mut self, index: u32, value: impl Into<ParamValue>) -> Result<(), Self::Error> {
        self.set_value(index, value.into())
    }

    fn set_i32(&mut self, index: u32, value: i32) -> Result<(), Self::Error> {
        self.set_value(index, ParamValue::from(value))
    }

    fn set_i64(&mut self, index: u32, value: i64) -> Result<(), Self::Error> {
        self.set_value(index, ParamValue::from(value))
    }

    fn set_f64(&mut self, index: u32, value: f64) -> Result<(), Self::Error> {
        self.set_value(index, ParamValue::from(value))
    }

    fn set_bool(&mut self, index: u32, value: bool) -> Result<(), Self::Error> {
        self.set_value(index, ParamValue::from(value))
    }

    fn set_string(&mut self, index: u32, value: impl Into<String>) -> Result<(), Self::Error> {
        self.set_value(index, ParamValue::Text(value.into()))
    }

    fn set_bytes(&mut self, index: u32, value: impl Into<Vec<u8>>) -> Result<(), Self::Error> {
        self.set_value(index, ParamValue::Binary(value.into()))
    }
}

impl<T: PreparedStatement + ?Sized> PreparedStatementExt for T {}

/// A session with a database
#[async_trait]
pub trait Connection: Send + Sync {
    /// Driver error type
    type Error: Send;
    type Statement: Statement<Error = Self::Error>;
    type PreparedStatement: PreparedStatement<Error = Self::Error>;
    type CallableStatement: CallableStatement<Error = Self::Error>;
    type Savepoint: Send + Sync;

    async fn create_statement(
        &self,
        options: StatementOptions,
    ) -> Result<Self::Statement, Self::Error>;

    async fn prepare_statement(
        &self,
        sql: &str,
        options: PrepareOptions,
    ) -> Result<Self::PreparedStatement, Self::Error>;

    async fn prepare_call(
        &self,
        sql: &str,
        options: StatementOptions,
    ) -> Result<Self::CallableStatement, Self::Error>;

    /// Translate `sql` into the database's native grammar
    fn native_sql(&self, sql: &str) -> Result<String, Self::Error>;

    fn auto_commit(&self) -> Result<bool, Self::Error>;

    fn set_auto_commit(&self, auto_commit: bool) -> Result<(), Self::Error>;

    async fn commit(&self) -> Result<(), Self::Error>;

    async fn rollback(&self) -> Result<(), Self::Error>;

    /// Create a savepoint, named when `name` is given
    async fn set_savepoint(&self, name: Option<&str>) -> Result<Self::Savepoint, Self::Error>;

    async fn rollback_to_savepoint(&self, savepoint: &Self::Savepoint) -> Result<(), Self::Error>;

    async fn release_savepoint(&self, savepoint: &Self::Savepoint) -> Result<(), Self::Error>;

    async fn close(&self) -> Result<(), Self::Error>;

    fn is_closed(&self) -> Result<bool, Self::Error>;

    async fn is_valid(&self, timeout: Duration) -> Result<bool, Self::Error>;

    fn is_read_only(&self) -> Result<bool, Self::Error>;

    fn set_read_only(&self, read_only: bool) -> Result<(), Self::Error>;

    fn catalog(&self) -> Result<Option<String>, Self::Error>;

    fn set_catalog(&self, catalog: &str) -> Result<(), Self::Error>;

    fn transaction_isolation(&self) -> Result<TransactionIsolation, Self::Error>;

    fn set_transaction_isolation(&self, level: TransactionIsolation) -> Result<(), Self::Error>;

    fn holdability(&self) -> Result<Holdability, Self::Error>;

    fn set_holdability(&self, holdability: Holdability) -> Result<(), Self::Error>;

    fn warnings(&self) -> Result<Vec<SqlWarning>, Self::Error>;

    fn clear_warnings(&self) -> Result<(), Self::Error>;

    fn client_info(&self, name: &str) -> Result<Option<String>, Self::Error>;

    fn set_client_info(&self, name: &str, value: &str) -> Result<(), Self::Error>;
}

/// A factory for connections to one database
#[async_trait]
pub trait DataSource: Send + Sync {
    type Error: Send;
    type Connection: Connection<Error = Self::Error>;

    async fn connection(&self) -> Result<Self::Connection, Self::Error>;

    async fn connection_with(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Self::Connection, Self::Error>;

    fn login_timeout(&self) -> Result<Option<Duration>, Self::Error>;

    fn set_login_timeout(&self, timeout: Option<Duration>) -> Result<(), Self::Error>;
}

/// Connection properties passed to a driver
pub type Properties = HashMap<String, String>;

/// Something that opens connections from URLs
///
/// A driver's error type may be richer than its connections' (for example to
/// report an unrecognized URL), so the two are not tied together.
#[async_trait]
pub trait Driver: Send + Sync {
    type Error: Send;
    type Connection: Connection;

    async fn connect(
        &self,
        url: &str,
        properties: &Properties,
    ) -> Result<Self::Connection, Self::Error>;
}
