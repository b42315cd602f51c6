//! Configuration
//!
//! The render mode is a process-wide setting read every time a statement is
//! rendered, so it can be flipped between executions. It comes from
//! [`set_render_mode`] when set, otherwise from the
//! `LOGDRIVER_REPLACE_BIND_PARAMS` environment variable (`1` or `true`
//! selects substitution). A [`LogConfig`] can pin a mode for one connection.

use std::sync::atomic::{AtomicU8, Ordering};

/// Environment variable consulted when no mode has been set in-process
pub const REPLACE_BIND_PARAMS_ENV: &str = "LOGDRIVER_REPLACE_BIND_PARAMS";

/// How a prepared statement is rendered in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Original SQL followed by the parameter listing
    #[default]
    Listing,
    /// Placeholders replaced by the bound values
    Substitution,
}

impl RenderMode {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderMode::Listing => "listing",
            RenderMode::Substitution => "substitution",
        }
    }

    /// Interpret a `LOGDRIVER_REPLACE_BIND_PARAMS` value
    pub fn from_flag(value: &str) -> Self {
        match value.trim() {
            "1" | "true" => RenderMode::Substitution,
            _ => RenderMode::Listing,
        }
    }
}

const MODE_UNSET: u8 = 0;
const MODE_LISTING: u8 = 1;
const MODE_SUBSTITUTION: u8 = 2;

static RENDER_MODE: AtomicU8 = AtomicU8::new(MODE_UNSET);

/// Set the process-wide render mode. `None` falls back to the environment.
pub fn set_render_mode(mode: Option<RenderMode>) {
    let raw = match mode {
        None => MODE_UNSET,
        Some(RenderMode::Listing) => MODE_LISTING,
        Some(RenderMode::Substitution) => MODE_SUBSTITUTION,
    };
    RENDER_MODE.store(raw, Ordering::Relaxed);
}

/// Get the process-wide render mode as of now
pub fn render_mode() -> RenderMode {
    match RENDER_MODE.load(Ordering::Relaxed) {
        MODE_LISTING => RenderMode::Listing,
        MODE_SUBSTITUTION => RenderMode::Substitution,
        _ => std::env::var(REPLACE_BIND_PARAMS_ENV)
            .map(|v| RenderMode::from_flag(&v))
            .unwrap_or_default(),
    }
}

/// What happens to a prepared statement's bindings once a batch entry is added
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BatchPolicy {
    /// Keep the bindings; the next entry starts from the previous values
    #[default]
    Retain,
    /// Empty the tracker after each entry
    Clear,
}

/// Per-connection logging configuration
///
/// # Example
///
/// ```
/// use logdriver::{BatchPolicy, LogConfig, RenderMode};
///
/// let config = LogConfig::default()
///     .with_render_mode(RenderMode::Substitution)
///     .with_batch_policy(BatchPolicy::Clear);
/// assert_eq!(config.effective_render_mode(), RenderMode::Substitution);
/// ```
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Pinned render mode; `None` follows the process-wide setting
    pub render_mode: Option<RenderMode>,
    /// Whether parameter values appear in the log at all
    pub include_params: bool,
    /// Bindings behavior after `add_batch`
    pub batch_policy: BatchPolicy,
    /// Level used for every record
    pub level: tracing::Level,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            render_mode: None,
            include_params: true,
            batch_policy: BatchPolicy::Retain,
            level: tracing::Level::DEBUG,
        }
    }
}

impl LogConfig {
    /// Pin the render mode for connections using this configuration
    pub fn with_render_mode(mut self, mode: RenderMode) -> Self {
        self.render_mode = Some(mode);
        self
    }

    /// Set whether parameter values are logged
    pub fn with_params(mut self, include: bool) -> Self {
        self.include_params = include;
        self
    }

    /// Set the batch policy
    pub fn with_batch_policy(mut self, policy: BatchPolicy) -> Self {
        self.batch_policy = policy;
        self
    }

    /// Set the log level
    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.level = level;
        self
    }

    /// The mode to render with right now
    pub fn effective_render_mode(&self) -> RenderMode {
        self.render_mode.unwrap_or_else(render_mode)
    }
}
