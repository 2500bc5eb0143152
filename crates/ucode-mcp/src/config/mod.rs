//! Configuration loading and resolution.

use std::fmt;

use ucode_tools::DEFAULT_BASE_URL;

/// Port used by the HTTP transports when neither `--addr` nor `PORT` is set.
pub const DEFAULT_PORT: u16 = 3001;

/// How long shutdown waits for detached tool executions before aborting them.
pub const DEFAULT_DRAIN_TIMEOUT_SECS: u64 = 10;

/// How `tools/call` runs a tool. Fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExecutionPolicy {
    /// Await the tool and return its result (or its error).
    Sync,
    /// Start the tool in the background and answer `{"status":"started"}` at once.
    #[default]
    Detached,
}

impl fmt::Display for ExecutionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionPolicy::Sync => write!(f, "sync"),
            ExecutionPolicy::Detached => write!(f, "detached"),
        }
    }
}

/// Resolve the HTTP listen address.
pub fn resolve_http_addr(explicit: Option<&str>) -> String {
    if let Some(addr) = explicit {
        return addr.to_string();
    }

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(DEFAULT_PORT);

    format!("0.0.0.0:{port}")
}

/// Resolve the ucode API base URL.
pub fn resolve_base_url(explicit: Option<&str>) -> String {
    if let Some(url) = explicit {
        return url.to_string();
    }

    std::env::var("BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string())
}
