//! Diesel integration
//!
//! Diesel connections do not go through the capability traits, so they are
//! logged through diesel's own instrumentation hook instead. Install a
//! [`LogInstrumentation`] with [`instrument`] (or [`instrument_async`] for a
//! `diesel-async` connection) and connection setup, queries and transaction
//! boundaries go to the same sinks as the proxies.
//!
//! Queries are logged the way diesel renders them, with the bind values
//! listed after the SQL.

use std::sync::Arc;

use diesel::connection::{Instrumentation, InstrumentationEvent};
use tracing::Level;

use crate::{
    config::LogConfig,
    connection::next_connection_id,
    sink::{LogRecord, LogSink, Operation, TracingSink},
};

/// Diesel instrumentation writing to a [`LogSink`]
pub struct LogInstrumentation {
    id: u64,
    sink: Arc<dyn LogSink>,
    config: LogConfig,
}

impl LogInstrumentation {
    pub fn new() -> Self {
        Self::with_options(Arc::new(TracingSink), LogConfig::default())
    }

    pub fn with_sink(sink: Arc<dyn LogSink>) -> Self {
        Self::with_options(sink, LogConfig::default())
    }

    pub fn with_options(sink: Arc<dyn LogSink>, config: LogConfig) -> Self {
        Self {
            id: next_connection_id(),
            sink,
            config,
        }
    }

    /// Sequence number used in records
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Default for LogInstrumentation {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LogInstrumentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogInstrumentation")
            .field("id", &self.id)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Instrumentation for LogInstrumentation {
    fn on_connection_event(&mut self, event: InstrumentationEvent<'_>) {
        if let Some(record) = describe(self.id, &event) {
            let level = if record.level == Level::WARN {
                Level::WARN
            } else {
                self.config.level
            };
            self.sink.emit(&record.with_level(level));
        }
    }
}

/// Turn a diesel event into a record for connection `id`.
///
/// Successful completions produce nothing; failed ones produce a warning.
pub fn describe(id: u64, event: &InstrumentationEvent<'_>) -> Option<LogRecord> {
    use InstrumentationEvent::*;

    let record = match event {
        StartEstablishConnection { url, .. } => LogRecord::new(
            Operation::Open,
            id,
            format!("Opening connection #{}: {}", id, url),
        ),
        FinishEstablishConnection {
            error: Some(error), ..
        } => LogRecord::new(
            Operation::Open,
            id,
            format!("Failed to open connection #{}: {}", id, error),
        )
        .with_level(Level::WARN),
        CacheQuery { sql, .. } => {
            LogRecord::new(Operation::PrepareStatement, id, format!("Preparing statement: {}", sql))
        }
        StartQuery { query, .. } => {
            LogRecord::new(Operation::Execute, id, format!("executing query: {}", query))
        }
        FinishQuery {
            query,
            error: Some(error),
            ..
        } => LogRecord::new(
            Operation::Execute,
            id,
            format!("query failed: {} ({})", query, error),
        )
        .with_level(Level::WARN),
        BeginTransaction { depth, .. } => LogRecord::new(
            Operation::Begin,
            id,
            format!("Beginning transaction on connection #{} (depth {})", id, depth),
        ),
        CommitTransaction { depth, .. } if depth.get() == 1 => {
            LogRecord::new(Operation::Commit, id, format!("Committing connection #{}", id))
        }
        CommitTransaction { depth, .. } => LogRecord::new(
            Operation::Commit,
            id,
            format!("Releasing savepoint on connection #{} (depth {})", id, depth),
        ),
        RollbackTransaction { depth, .. } if depth.get() == 1 => {
            LogRecord::new(Operation::Rollback, id, format!("Rolling back connection #{}", id))
        }
        RollbackTransaction { depth, .. } => LogRecord::new(
            Operation::Rollback,
            id,
            format!(
                "Rolling back connection #{} to savepoint (depth {})",
                id, depth
            ),
        ),
        _ => return None,
    };
    Some(record)
}

/// Install `instrumentation` on a diesel connection
pub fn instrument<C: diesel::Connection>(conn: &mut C, instrumentation: LogInstrumentation) {
    conn.set_instrumentation(instrumentation);
}

/// Install `instrumentation` on a `diesel-async` connection
pub fn instrument_async<C: diesel_async::AsyncConnection>(
    conn: &mut C,
    instrumentation: LogInstrumentation,
) {
    conn.set_instrumentation(instrumentation);
}
