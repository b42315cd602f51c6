//! Log records and sinks
//!
//! Every tracked event becomes one [`LogRecord`] handed to a [`LogSink`].
//! The default sink forwards records to `tracing` under the `logdriver`
//! target; [`MemorySink`] keeps them for inspection in tests.
//!
//! # Fields
//!
//! Records emitted through [`TracingSink`] carry:
//! - `operation`: what was about to happen (`open`, `execute_query`, ...)
//! - `connection`: the sequence number of the owning connection proxy
//!
//! # Example
//!
//! ```
//! use logdriver::sink::{LogRecord, LogSink, MemorySink, Operation};
//!
//! let sink = MemorySink::new();
//! sink.emit(&LogRecord::new(Operation::Commit, 1, "Committing connection #1"));
//! assert_eq!(sink.messages(), vec!["Committing connection #1".to_string()]);
//! ```

use std::{fmt, sync::Mutex};

use tracing::Level;

/// The event a record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// A driver is resolving a URL to a connection
    Connect,
    /// A connection proxy was created
    Open,
    /// A connection is being closed
    Close,
    /// A transaction is being started
    Begin,
    /// A transaction is being committed
    Commit,
    /// A transaction (or savepoint) is being rolled back
    Rollback,
    /// A plain statement is being created
    CreateStatement,
    /// A prepared statement is being created
    PrepareStatement,
    /// A callable statement is being created
    PrepareCall,
    /// `execute` on a statement
    Execute,
    /// `execute_query` on a statement
    ExecuteQuery,
    /// `execute_update` on a statement
    ExecuteUpdate,
    /// An entry is being added to a batch
    AddBatch,
    /// A batch is being executed
    ExecuteBatch,
    /// An OUT parameter is being registered
    RegisterOutParameter,
    /// A data-source or driver setting is being changed
    Configure,
}

impl Operation {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Connect => "connect",
            Operation::Open => "open",
            Operation::Close => "close",
            Operation::Begin => "begin",
            Operation::Commit => "commit",
            Operation::Rollback => "rollback",
            Operation::CreateStatement => "create_statement",
            Operation::PrepareStatement => "prepare_statement",
            Operation::PrepareCall => "prepare_call",
            Operation::Execute => "execute",
            Operation::ExecuteQuery => "execute_query",
            Operation::ExecuteUpdate => "execute_update",
            Operation::AddBatch => "add_batch",
            Operation::ExecuteBatch => "execute_batch",
            Operation::RegisterOutParameter => "register_out_parameter",
            Operation::Configure => "configure",
        }
    }

    /// Check if the operation sends SQL to the database
    pub fn is_execution(&self) -> bool {
        matches!(
            self,
            Operation::Execute
                | Operation::ExecuteQuery
                | Operation::ExecuteUpdate
                | Operation::ExecuteBatch
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single log line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: Level,
    pub operation: Operation,
    /// Sequence number of the connection proxy, 0 when there is none
    pub connection: u64,
    pub message: String,
}

impl LogRecord {
    /// Create a debug-level record
    pub fn new(operation: Operation, connection: u64, message: impl Into<String>) -> Self {
        Self {
            level: Level::DEBUG,
            operation,
            connection,
            message: message.into(),
        }
    }

    /// Set the level
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }
}

/// Destination for log records
pub trait LogSink: Send + Sync {
    /// Emit a record
    fn emit(&self, record: &LogRecord);
}

/// Forwards records to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, record: &LogRecord) {
        let operation = record.operation.as_str();
        let connection = record.connection;
        let message = record.message.as_str();
        if record.level == Level::ERROR {
            tracing::error!(target: "logdriver", operation, connection, "{}", message);
        } else if record.level == Level::WARN {
            tracing::warn!(target: "logdriver", operation, connection, "{}", message);
        } else if record.level == Level::INFO {
            tracing::info!(target: "logdriver", operation, connection, "{}", message);
        } else if record.level == Level::DEBUG {
            tracing::debug!(target: "logdriver", operation, connection, "{}", message);
        } else {
            tracing::trace!(target: "logdriver", operation, connection, "{}", message);
        }
    }
}

/// Discards every record
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn emit(&self, _record: &LogRecord) {
        // No-op
    }
}

/// Keeps records in memory, for tests
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<LogRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all captured records
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Get the messages of all captured records
    pub fn messages(&self) -> Vec<String> {
        self.records()
            .into_iter()
            .map(|record| record.message)
            .collect()
    }

    /// Get the messages of records for one operation
    pub fn messages_for(&self, operation: Operation) -> Vec<String> {
        self.records()
            .into_iter()
            .filter(|record| record.operation == operation)
            .map(|record| record.message)
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut records) = self.records.lock() {
            records.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl LogSink for MemorySink {
    fn emit(&self, record: &LogRecord) {
        if let Ok(mut records) = self.records.lock() {
            records.push(record.clone());
        }
    }
}
