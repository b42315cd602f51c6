//! Logging data source
//!
//! Hands out [`LogConnection`]s in place of the connections of the wrapped
//! data source. Every connection shares the data source's sink and
//! configuration.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::{
    api::DataSource,
    config::LogConfig,
    connection::LogConnection,
    sink::{LogRecord, LogSink, Operation, TracingSink},
};

pub struct LogDataSource<D> {
    inner: D,
    sink: Arc<dyn LogSink>,
    config: LogConfig,
}

impl<D: DataSource> LogDataSource<D> {
    pub fn new(inner: D) -> Self {
        Self::with_options(inner, Arc::new(TracingSink), LogConfig::default())
    }

    pub fn with_sink(inner: D, sink: Arc<dyn LogSink>) -> Self {
        Self::with_options(inner, sink, LogConfig::default())
    }

    pub fn with_options(inner: D, sink: Arc<dyn LogSink>, config: LogConfig) -> Self {
        Self {
            inner,
            sink,
            config,
        }
    }

    /// The wrapped data source
    pub fn inner(&self) -> &D {
        &self.inner
    }

    fn wrap(&self, connection: D::Connection) -> LogConnection<D::Connection> {
        LogConnection::with_options(connection, Arc::clone(&self.sink), self.config.clone())
    }
}

impl<D> std::fmt::Debug for LogDataSource<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogDataSource")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<D: DataSource> DataSource for LogDataSource<D> {
    type Error = D::Error;
    type Connection = LogConnection<D::Connection>;

    async fn connection(&self) -> Result<Self::Connection, Self::Error> {
        let connection = self.inner.connection().await?;
        Ok(self.wrap(connection))
    }

    async fn connection_with(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Self::Connection, Self::Error> {
        let connection = self.inner.connection_with(username, password).await?;
        Ok(self.wrap(connection))
    }

    fn login_timeout(&self) -> Result<Option<Duration>, Self::Error> {
        self.inner.login_timeout()
    }

    fn set_login_timeout(&self, timeout: Option<Duration>) -> Result<(), Self::Error> {
        let message = match timeout {
            Some(timeout) => format!("Setting login timeout to {} seconds", timeout.as_secs()),
            None => "Clearing login timeout".to_string(),
        };
        let record = LogRecord::new(Operation::Configure, 0, message).with_level(self.config.level);
        self.sink.emit(&record);
        self.inner.set_login_timeout(timeout)
    }
}
