//! Logging driver registry
//!
//! A [`LogDriver`] holds named underlying drivers and accepts URLs of the
//! form `log:<driver-name>:<real-url>`. Connecting strips the prefix, hands
//! the real URL to the named driver and wraps the resulting connection in a
//! [`LogConnection`].
//!
//! # Example
//!
//! ```ignore
//! let mut driver = LogDriver::new();
//! driver.register("postgres", postgres_driver);
//! let conn = driver
//!     .connect("log:postgres:postgres://localhost/app", &Properties::new())
//!     .await?;
//! ```

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;

use crate::{
    api::{Driver, Properties},
    config::LogConfig,
    connection::LogConnection,
    sink::{LogRecord, LogSink, Operation, TracingSink},
};

/// Prefix of every URL the logging driver accepts
pub const URL_PREFIX: &str = "log:";

#[derive(Debug, thiserror::Error)]
pub enum DriverError<E> {
    #[error("not a logging url: {0}")]
    UnsupportedUrl(String),

    #[error("malformed logging url: {0}")]
    MalformedUrl(String),

    #[error("no driver registered as '{0}'")]
    UnknownDriver(String),

    /// The underlying driver failed; its error is returned as is
    #[error(transparent)]
    Connect(E),
}

/// A logging URL split into its parts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedUrl<'a> {
    /// Name the underlying driver is registered under
    pub driver: &'a str,
    /// The URL handed to the underlying driver
    pub url: &'a str,
}

impl<'a> ParsedUrl<'a> {
    /// Split `log:<driver-name>:<real-url>`
    pub fn parse<E>(url: &'a str) -> Result<Self, DriverError<E>> {
        let rest = url
            .strip_prefix(URL_PREFIX)
            .ok_or_else(|| DriverError::UnsupportedUrl(url.to_string()))?;
        match rest.split_once(':') {
            Some((driver, real)) if !driver.is_empty() && !real.is_empty() => Ok(Self {
                driver,
                url: real,
            }),
            _ => Err(DriverError::MalformedUrl(url.to_string())),
        }
    }
}

pub struct LogDriver<D> {
    drivers: HashMap<String, D>,
    sink: Arc<dyn LogSink>,
    config: LogConfig,
}

impl<D: Driver> LogDriver<D> {
    pub fn new() -> Self {
        Self::with_options(Arc::new(TracingSink), LogConfig::default())
    }

    pub fn with_sink(sink: Arc<dyn LogSink>) -> Self {
        Self::with_options(sink, LogConfig::default())
    }

    pub fn with_options(sink: Arc<dyn LogSink>, config: LogConfig) -> Self {
        Self {
            drivers: HashMap::new(),
            sink,
            config,
        }
    }

    /// Register `driver` under `name`, returning the driver it replaces
    pub fn register(&mut self, name: impl Into<String>, driver: D) -> Option<D> {
        self.drivers.insert(name.into(), driver)
    }

    pub fn deregister(&mut self, name: &str) -> Option<D> {
        self.drivers.remove(name)
    }

    pub fn driver(&self, name: &str) -> Option<&D> {
        self.drivers.get(name)
    }

    /// Check whether `url` is addressed to this driver
    pub fn accepts_url(&self, url: &str) -> bool {
        url.starts_with(URL_PREFIX)
    }

    pub fn parse_url<'a>(&self, url: &'a str) -> Result<ParsedUrl<'a>, DriverError<D::Error>> {
        ParsedUrl::parse(url)
    }

    fn emit(&self, message: String) {
        let record = LogRecord::new(Operation::Connect, 0, message).with_level(self.config.level);
        self.sink.emit(&record);
    }
}

impl<D: Driver> Default for LogDriver<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> std::fmt::Debug for LogDriver<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.drivers.keys().collect();
        names.sort();
        f.debug_struct("LogDriver")
            .field("drivers", &names)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<D: Driver> Driver for LogDriver<D> {
    type Error = DriverError<D::Error>;
    type Connection = LogConnection<D::Connection>;

    async fn connect(
        &self,
        url: &str,
        properties: &Properties,
    ) -> Result<Self::Connection, Self::Error> {
        let parsed = self.parse_url(url)?;
        let driver = self
            .drivers
            .get(parsed.driver)
            .ok_or_else(|| DriverError::UnknownDriver(parsed.driver.to_string()))?;

        self.emit(format!(
            "Connecting through driver '{}': {}",
            parsed.driver, parsed.url
        ));
        let connection = driver
            .connect(parsed.url, properties)
            .await
            .map_err(DriverError::Connect)?;

        Ok(LogConnection::with_options(
            connection,
            Arc::clone(&self.sink),
            self.config.clone(),
        ))
    }
}
