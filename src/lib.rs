//! # logdriver
//!
//! A transparent logging proxy for SQL connections and statements.
//!
//! Wrap a driver connection in a [`LogConnection`] and use it exactly as
//! before. Every statement it creates is wrapped too; executions are logged
//! together with the parameter values bound at that moment, either listed
//! after the SQL or substituted into it.
//!
//! ## Usage
//!
//! ```ignore
//! use logdriver::{LogConnection, PreparedStatementExt};
//! use logdriver::api::{Connection, PrepareOptions, PreparedStatement};
//!
//! let conn = LogConnection::new(driver_connection);
//! let mut stmt = conn
//!     .prepare_statement("UPDATE accounts SET balance = ? WHERE id = ?", PrepareOptions::default())
//!     .await?;
//! stmt.bind(1, 250)?;
//! stmt.bind(2, "acct-1")?;
//! stmt.execute_update().await?;
//! ```
//!
//! ## Render mode
//!
//! Bind values are listed after the SQL by default. Set
//! `LOGDRIVER_REPLACE_BIND_PARAMS=1` (or call [`set_render_mode`]) to have
//! them substituted into the SQL instead. A [`LogConfig`] can pin the mode
//! per connection.
//!
//! ## Diesel
//!
//! Diesel connections are logged through [`diesel_support::LogInstrumentation`].

#[macro_use]
mod forward;

pub mod api;
pub mod config;
pub mod connection;
pub mod datasource;
pub mod diesel_support;
pub mod driver;
pub mod params;
mod prepared;
pub mod render;
pub mod sink;
pub mod statement;
pub mod types;
pub mod value;

#[cfg(test)]
mod mock;

// Re-exports
pub use api::PreparedStatementExt;
pub use config::{render_mode, set_render_mode, BatchPolicy, LogConfig, RenderMode};
pub use connection::LogConnection;
pub use datasource::LogDataSource;
pub use diesel_support::LogInstrumentation;
pub use driver::{DriverError, LogDriver};
pub use sink::{LogSink, MemorySink, TracingSink};
pub use statement::{LogCallableStatement, LogPreparedStatement, LogStatement};
pub use types::SqlType;
pub use value::ParamValue;
