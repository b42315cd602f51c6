//! In-memory driver used by the proxy tests
//!
//! Every database call is journaled in a shared [`MockState`]. A test can make
//! any call fail, and can ask the state to note how many records a sink held
//! at the moment each call arrived.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    io::Read,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;

use crate::{
    api::{
        CallableStatement, Concurrency, Connection, CurrentResult, DataSource, Driver,
        FetchDirection, GeneratedKeys, Holdability, ParameterInfo, PrepareOptions,
        PreparedStatement, Properties, ResultSetType, SqlWarning, Statement, StatementOptions,
        TransactionIsolation,
    },
    render::placeholder_count,
    sink::MemorySink,
    types::SqlType,
    value::{ParamStream, ParamValue},
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct MockError {
    message: String,
}

impl MockError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug)]
pub struct MockState {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    observer: Mutex<Option<Arc<MemorySink>>>,
    observed: Mutex<Vec<usize>>,
    streamed: Mutex<Vec<Vec<u8>>>,
    update_count: AtomicU64,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            calls: Mutex::default(),
            failing: Mutex::default(),
            observer: Mutex::default(),
            observed: Mutex::default(),
            streamed: Mutex::default(),
            update_count: AtomicU64::new(3),
        }
    }
}

impl MockState {
    /// Journal a call to `op`, failing if the test asked for it
    fn call(&self, op: &str, entry: impl Into<String>) -> Result<(), MockError> {
        self.calls.lock().unwrap().push(entry.into());
        if let Some(sink) = self.observer.lock().unwrap().as_ref() {
            self.observed.lock().unwrap().push(sink.len());
        }
        if self.failing.lock().unwrap().contains(op) {
            return Err(MockError::new(format!("{} failed", op)));
        }
        Ok(())
    }

    /// Fail a synchronous call without journaling it
    fn check(&self, op: &str) -> Result<(), MockError> {
        if self.failing.lock().unwrap().contains(op) {
            return Err(MockError::new(format!("{} failed", op)));
        }
        Ok(())
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn fail_on(&self, op: &str) {
        self.failing.lock().unwrap().insert(op.to_string());
    }

    /// Record the length of `sink` at every subsequent call
    pub fn observe(&self, sink: Arc<MemorySink>) {
        *self.observer.lock().unwrap() = Some(sink);
    }

    pub fn observed(&self) -> Vec<usize> {
        self.observed.lock().unwrap().clone()
    }

    /// Contents of every stream handed to a statement
    pub fn streamed(&self) -> Vec<Vec<u8>> {
        self.streamed.lock().unwrap().clone()
    }

    pub fn set_update_count(&self, count: u64) {
        self.update_count.store(count, Ordering::Relaxed);
    }

    fn update_count(&self) -> u64 {
        self.update_count.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResultSet {
    pub source: String,
}

impl MockResultSet {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockSavepoint {
    pub name: String,
}

#[derive(Debug)]
struct Settings {
    auto_commit: bool,
    read_only: bool,
    closed: bool,
    catalog: Option<String>,
    isolation: TransactionIsolation,
    holdability: Holdability,
    client_info: HashMap<String, String>,
    warnings: Vec<SqlWarning>,
    savepoints: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_commit: true,
            read_only: false,
            closed: false,
            catalog: None,
            isolation: TransactionIsolation::ReadCommitted,
            holdability: Holdability::HoldCursorsOverCommit,
            client_info: HashMap::new(),
            warnings: vec![SqlWarning::new("mock warning")],
            savepoints: 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct MockConnection {
    state: Arc<MockState>,
    settings: Mutex<Settings>,
}

impl MockConnection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: Arc<MockState>) -> Self {
        Self {
            state,
            settings: Mutex::default(),
        }
    }

    pub fn state(&self) -> Arc<MockState> {
        Arc::clone(&self.state)
    }

    fn statement(&self, options: StatementOptions, sql: Option<&str>) -> MockStatement {
        MockStatement::new(self.state(), options, sql.map(str::to_string))
    }
}

#[async_trait]
impl Connection for MockConnection {
    type Error = MockError;
    type Statement = MockStatement;
    type PreparedStatement = MockStatement;
    type CallableStatement = MockStatement;
    type Savepoint = MockSavepoint;

    async fn create_statement(&self, options: StatementOptions) -> Result<MockStatement, MockError> {
        self.state.call("create_statement", "create_statement")?;
        Ok(self.statement(options, None))
    }

    async fn prepare_statement(
        &self,
        sql: &str,
        options: PrepareOptions,
    ) -> Result<MockStatement, MockError> {
        self.state
            .call("prepare_statement", format!("prepare_statement({})", sql))?;
        Ok(self.statement(options.statement, Some(sql)))
    }

    async fn prepare_call(
        &self,
        sql: &str,
        options: StatementOptions,
    ) -> Result<MockStatement, MockError> {
        self.state.call("prepare_call", format!("prepare_call({})", sql))?;
        Ok(self.statement(options, Some(sql)))
    }

    fn native_sql(&self, sql: &str) -> Result<String, MockError> {
        self.state.check("native_sql")?;
        Ok(format!("/* native */ {}", sql))
    }

    fn auto_commit(&self) -> Result<bool, MockError> {
        Ok(self.settings.lock().unwrap().auto_commit)
    }

    fn set_auto_commit(&self, auto_commit: bool) -> Result<(), MockError> {
        self.state.check("set_auto_commit")?;
        self.settings.lock().unwrap().auto_commit = auto_commit;
        Ok(())
    }

    async fn commit(&self) -> Result<(), MockError> {
        self.state.call("commit", "commit")
    }

    async fn rollback(&self) -> Result<(), MockError> {
        self.state.call("rollback", "rollback")
    }

    async fn set_savepoint(&self, name: Option<&str>) -> Result<MockSavepoint, MockError> {
        let name = match name {
            Some(name) => name.to_string(),
            None => {
                let mut settings = self.settings.lock().unwrap();
                settings.savepoints += 1;
                format!("sp{}", settings.savepoints)
            }
        };
        self.state
            .call("set_savepoint", format!("set_savepoint({})", name))?;
        Ok(MockSavepoint { name })
    }

    async fn rollback_to_savepoint(&self, savepoint: &MockSavepoint) -> Result<(), MockError> {
        self.state.call(
            "rollback_to_savepoint",
            format!("rollback_to_savepoint({})", savepoint.name),
        )
    }

    async fn release_savepoint(&self, savepoint: &MockSavepoint) -> Result<(), MockError> {
        self.state.call(
            "release_savepoint",
            format!("release_savepoint({})", savepoint.name),
        )
    }

    async fn close(&self) -> Result<(), MockError> {
        self.state.call("close", "close")?;
        self.settings.lock().unwrap().closed = true;
        Ok(())
    }

    fn is_closed(&self) -> Result<bool, MockError> {
        Ok(self.settings.lock().unwrap().closed)
    }

    async fn is_valid(&self, _timeout: Duration) -> Result<bool, MockError> {
        Ok(!self.settings.lock().unwrap().closed)
    }

    fn is_read_only(&self) -> Result<bool, MockError> {
        Ok(self.settings.lock().unwrap().read_only)
    }

    fn set_read_only(&self, read_only: bool) -> Result<(), MockError> {
        self.state.check("set_read_only")?;
        self.settings.lock().unwrap().read_only = read_only;
        Ok(())
    }

    fn catalog(&self) -> Result<Option<String>, MockError> {
        Ok(self.settings.lock().unwrap().catalog.clone())
    }

    fn set_catalog(&self, catalog: &str) -> Result<(), MockError> {
        self.state.check("set_catalog")?;
        self.settings.lock().unwrap().catalog = Some(catalog.to_string());
        Ok(())
    }

    fn transaction_isolation(&self) -> Result<TransactionIsolation, MockError> {
        Ok(self.settings.lock().unwrap().isolation)
    }

    fn set_transaction_isolation(&self, level: TransactionIsolation) -> Result<(), MockError> {
        self.state.check("set_transaction_isolation")?;
        self.settings.lock().unwrap().isolation = level;
        Ok(())
    }

    fn holdability(&self) -> Result<Holdability, MockError> {
        Ok(self.settings.lock().unwrap().holdability)
    }

    fn set_holdability(&self, holdability: Holdability) -> Result<(), MockError> {
        self.state.check("set_holdability")?;
        self.settings.lock().unwrap().holdability = holdability;
        Ok(())
    }

    fn warnings(&self) -> Result<Vec<SqlWarning>, MockError> {
        Ok(self.settings.lock().unwrap().warnings.clone())
    }

    fn clear_warnings(&self) -> Result<(), MockError> {
        self.settings.lock().unwrap().warnings.clear();
        Ok(())
    }

    fn client_info(&self, name: &str) -> Result<Option<String>, MockError> {
        Ok(self.settings.lock().unwrap().client_info.get(name).cloned())
    }

    fn set_client_info(&self, name: &str, value: &str) -> Result<(), MockError> {
        self.settings
            .lock()
            .unwrap()
            .client_info
            .insert(name.to_string(), value.to_string());
        Ok(())
    }
}

/// Plain, prepared and callable statement in one
#[derive(Debug)]
pub struct MockStatement {
    state: Arc<MockState>,
    options: StatementOptions,
    sql: Option<String>,
    batch: Vec<String>,
    bound: BTreeMap<u32, ParamValue>,
    out: BTreeMap<u32, SqlType>,
    update_count: Option<u64>,
    closed: bool,
    fetch_size: u32,
    fetch_direction: FetchDirection,
    max_rows: u64,
    max_field_size: u32,
    query_timeout: Option<Duration>,
    poolable: bool,
    close_on_completion: bool,
    cursor_name: Option<String>,
    escape_processing: bool,
    warnings: Vec<SqlWarning>,
}

impl MockStatement {
    fn new(state: Arc<MockState>, options: StatementOptions, sql: Option<String>) -> Self {
        Self {
            state,
            options,
            sql,
            batch: Vec::new(),
            bound: BTreeMap::new(),
            out: BTreeMap::new(),
            update_count: None,
            closed: false,
            fetch_size: 0,
            fetch_direction: FetchDirection::Forward,
            max_rows: 0,
            max_field_size: 0,
            query_timeout: None,
            poolable: false,
            close_on_completion: false,
            cursor_name: None,
            escape_processing: true,
            warnings: vec![SqlWarning::new("statement warning")],
        }
    }

    pub fn cursor_name(&self) -> Option<&str> {
        self.cursor_name.as_deref()
    }

    pub fn escape_processing(&self) -> bool {
        self.escape_processing
    }

    fn prepared_sql(&self) -> String {
        self.sql.clone().unwrap_or_default()
    }

    fn update(&mut self) -> u64 {
        let count = self.state.update_count();
        self.update_count = Some(count);
        count
    }
}

#[async_trait]
impl Statement for MockStatement {
    type Error = MockError;
    type ResultSet = MockResultSet;

    async fn execute_sql(&mut self, sql: &str) -> Result<bool, MockError> {
        self.state.call("execute_sql", format!("execute_sql({})", sql))?;
        Ok(true)
    }

    async fn execute_sql_with_keys(
        &mut self,
        sql: &str,
        keys: GeneratedKeys,
    ) -> Result<bool, MockError> {
        self.state.call(
            "execute_sql_with_keys",
            format!("execute_sql_with_keys({}, {:?})", sql, keys),
        )?;
        Ok(false)
    }

    async fn execute_query_sql(&mut self, sql: &str) -> Result<MockResultSet, MockError> {
        self.state
            .call("execute_query_sql", format!("execute_query_sql({})", sql))?;
        Ok(MockResultSet::new(sql))
    }

    async fn execute_update_sql(&mut self, sql: &str) -> Result<u64, MockError> {
        self.state
            .call("execute_update_sql", format!("execute_update_sql({})", sql))?;
        Ok(self.update())
    }

    async fn execute_update_sql_with_keys(
        &mut self,
        sql: &str,
        keys: GeneratedKeys,
    ) -> Result<u64, MockError> {
        self.state.call(
            "execute_update_sql_with_keys",
            format!("execute_update_sql_with_keys({}, {:?})", sql, keys),
        )?;
        Ok(self.update())
    }

    async fn add_batch_sql(&mut self, sql: &str) -> Result<(), MockError> {
        self.state
            .call("add_batch_sql", format!("add_batch_sql({})", sql))?;
        self.batch.push(sql.to_string());
        Ok(())
    }

    async fn execute_batch(&mut self) -> Result<Vec<i64>, MockError> {
        self.state.call("execute_batch", "execute_batch")?;
        let counts = vec![1; self.batch.len()];
        self.batch.clear();
        Ok(counts)
    }

    fn clear_batch(&mut self) -> Result<(), MockError> {
        self.state.call("clear_batch", "clear_batch")?;
        self.batch.clear();
        Ok(())
    }

    fn result_set(&mut self) -> Result<Option<MockResultSet>, MockError> {
        Ok(None)
    }

    fn update_count(&self) -> Result<Option<u64>, MockError> {
        Ok(self.update_count)
    }

    async fn more_results(&mut self, _current: CurrentResult) -> Result<bool, MockError> {
        self.state.call("more_results", "more_results")?;
        Ok(false)
    }

    async fn generated_keys(&mut self) -> Result<MockResultSet, MockError> {
        self.state.call("generated_keys", "generated_keys")?;
        Ok(MockResultSet::new("generated keys"))
    }

    async fn cancel(&mut self) -> Result<(), MockError> {
        self.state.call("cancel", "cancel")
    }

    async fn close(&mut self) -> Result<(), MockError> {
        self.state.call("close_statement", "close_statement")?;
        self.closed = true;
        Ok(())
    }

    fn is_closed(&self) -> Result<bool, MockError> {
        Ok(self.closed)
    }

    fn fetch_size(&self) -> Result<u32, MockError> {
        Ok(self.fetch_size)
    }

    fn set_fetch_size(&mut self, rows: u32) -> Result<(), MockError> {
        self.state.check("set_fetch_size")?;
        self.fetch_size = rows;
        Ok(())
    }

    fn fetch_direction(&self) -> Result<FetchDirection, MockError> {
        Ok(self.fetch_direction)
    }

    fn set_fetch_direction(&mut self, direction: FetchDirection) -> Result<(), MockError> {
        self.fetch_direction = direction;
        Ok(())
    }

    fn max_rows(&self) -> Result<u64, MockError> {
        self.state.check("max_rows")?;
        Ok(self.max_rows)
    }

    fn set_max_rows(&mut self, max: u64) -> Result<(), MockError> {
        self.max_rows = max;
        Ok(())
    }

    fn max_field_size(&self) -> Result<u32, MockError> {
        Ok(self.max_field_size)
    }

    fn set_max_field_size(&mut self, max: u32) -> Result<(), MockError> {
        self.max_field_size = max;
        Ok(())
    }

    fn query_timeout(&self) -> Result<Option<Duration>, MockError> {
        Ok(self.query_timeout)
    }

    fn set_query_timeout(&mut self, timeout: Option<Duration>) -> Result<(), MockError> {
        self.query_timeout = timeout;
        Ok(())
    }

    fn set_cursor_name(&mut self, name: &str) -> Result<(), MockError> {
        self.cursor_name = Some(name.to_string());
        Ok(())
    }

    fn set_escape_processing(&mut self, enable: bool) -> Result<(), MockError> {
        self.escape_processing = enable;
        Ok(())
    }

    fn result_set_type(&self) -> Result<ResultSetType, MockError> {
        Ok(self.options.result_set_type)
    }

    fn result_set_concurrency(&self) -> Result<Concurrency, MockError> {
        Ok(self.options.concurrency)
    }

    fn result_set_holdability(&self) -> Result<Holdability, MockError> {
        Ok(self
            .options
            .holdability
            .unwrap_or(Holdability::HoldCursorsOverCommit))
    }

    fn warnings(&self) -> Result<Vec<SqlWarning>, MockError> {
        Ok(self.warnings.clone())
    }

    fn clear_warnings(&mut self) -> Result<(), MockError> {
        self.warnings.clear();
        Ok(())
    }

    fn is_poolable(&self) -> Result<bool, MockError> {
        Ok(self.poolable)
    }

    fn set_poolable(&mut self, poolable: bool) -> Result<(), MockError> {
        self.poolable = poolable;
        Ok(())
    }

    fn close_on_completion(&mut self) -> Result<(), MockError> {
        self.close_on_completion = true;
        Ok(())
    }

    fn is_close_on_completion(&self) -> Result<bool, MockError> {
        Ok(self.close_on_completion)
    }
}

#[async_trait]
impl PreparedStatement for MockStatement {
    async fn execute(&mut self) -> Result<bool, MockError> {
        self.state.call("execute", "execute")?;
        Ok(true)
    }

    async fn execute_query(&mut self) -> Result<MockResultSet, MockError> {
        self.state.call("execute_query", "execute_query")?;
        Ok(MockResultSet::new(self.prepared_sql()))
    }

    async fn execute_update(&mut self) -> Result<u64, MockError> {
        self.state.call("execute_update", "execute_update")?;
        Ok(self.update())
    }

    async fn add_batch(&mut self) -> Result<(), MockError> {
        self.state.call("add_batch", "add_batch")?;
        self.batch.push(self.prepared_sql());
        Ok(())
    }

    fn set_value(&mut self, index: u32, value: ParamValue) -> Result<(), MockError> {
        self.state
            .call("set_value", format!("set_value({}, {})", index, value))?;
        self.bound.insert(index, value);
        Ok(())
    }

    fn set_null(&mut self, index: u32, sql_type: SqlType) -> Result<(), MockError> {
        self.state
            .call("set_null", format!("set_null({}, {})", index, sql_type))?;
        self.bound.insert(index, ParamValue::Null);
        Ok(())
    }

    fn set_stream(&mut self, index: u32, stream: ParamStream) -> Result<(), MockError> {
        self.state
            .call("set_stream", format!("set_stream({})", index))?;
        let mut contents = Vec::new();
        stream
            .into_reader()
            .read_to_end(&mut contents)
            .map_err(|e| MockError::new(e.to_string()))?;
        self.state.streamed.lock().unwrap().push(contents);
        Ok(())
    }

    fn clear_parameters(&mut self) -> Result<(), MockError> {
        self.state.call("clear_parameters", "clear_parameters")?;
        self.bound.clear();
        Ok(())
    }

    fn parameter_metadata(&self) -> Result<Vec<ParameterInfo>, MockError> {
        let count = placeholder_count(self.sql.as_deref().unwrap_or_default());
        Ok((0..count)
            .map(|_| ParameterInfo {
                sql_type: SqlType::INTEGER,
                nullable: true,
            })
            .collect())
    }
}

impl CallableStatement for MockStatement {
    fn register_out_parameter(&mut self, index: u32, sql_type: SqlType) -> Result<(), MockError> {
        self.state.call(
            "register_out_parameter",
            format!("register_out_parameter({}, {})", index, sql_type),
        )?;
        self.out.insert(index, sql_type);
        Ok(())
    }

    fn out_value(&self, index: u32) -> Result<ParamValue, MockError> {
        if self.out.contains_key(&index) {
            Ok(ParamValue::Integer(i64::from(index)))
        } else {
            Err(MockError::new(format!("parameter {} is not an OUT parameter", index)))
        }
    }

    fn was_null(&self) -> Result<bool, MockError> {
        Ok(false)
    }
}

#[derive(Debug, Default)]
pub struct MockDataSource {
    state: Arc<MockState>,
    login_timeout: Mutex<Option<Duration>>,
}

impl MockDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Arc<MockState> {
        Arc::clone(&self.state)
    }
}

#[async_trait]
impl DataSource for MockDataSource {
    type Error = MockError;
    type Connection = MockConnection;

    async fn connection(&self) -> Result<MockConnection, MockError> {
        self.state.call("connection", "connection")?;
        Ok(MockConnection::with_state(self.state()))
    }

    async fn connection_with(
        &self,
        username: &str,
        _password: &str,
    ) -> Result<MockConnection, MockError> {
        self.state
            .call("connection", format!("connection_with({})", username))?;
        Ok(MockConnection::with_state(self.state()))
    }

    fn login_timeout(&self) -> Result<Option<Duration>, MockError> {
        Ok(*self.login_timeout.lock().unwrap())
    }

    fn set_login_timeout(&self, timeout: Option<Duration>) -> Result<(), MockError> {
        self.state.call("set_login_timeout", "set_login_timeout")?;
        *self.login_timeout.lock().unwrap() = timeout;
        Ok(())
    }
}

/// Accepts any URL starting with its prefix
#[derive(Debug)]
pub struct MockDriver {
    state: Arc<MockState>,
    prefix: String,
}

impl MockDriver {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            state: Arc::default(),
            prefix: prefix.into(),
        }
    }

    pub fn state(&self) -> Arc<MockState> {
        Arc::clone(&self.state)
    }
}

#[async_trait]
impl Driver for MockDriver {
    type Error = MockError;
    type Connection = MockConnection;

    async fn connect(
        &self,
        url: &str,
        properties: &Properties,
    ) -> Result<MockConnection, MockError> {
        let mut keys: Vec<&String> = properties.keys().collect();
        keys.sort();
        self.state
            .call("connect", format!("connect({}, {:?})", url, keys))?;
        if !url.starts_with(&self.prefix) {
            return Err(MockError::new(format!("unsupported url: {}", url)));
        }
        Ok(MockConnection::with_state(self.state()))
    }
}
