//! Server configuration
//!
//! Command-line flags parsed with clap. `Config::default()` yields the
//! same values as an empty command line.

use std::time::Duration;

use clap::Parser;

/// Simple IRC-style chat server
#[derive(Debug, Clone, Parser)]
#[command(name = "irc_server", version, about)]
pub struct Config {
    /// Host to listen on
    #[arg(long, default_value = "localhost")]
    pub host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 9000)]
    pub port: u16,

    /// Maximum number of simultaneous connections
    #[arg(long, default_value_t = 1024)]
    pub max_connections: usize,

    /// Disconnect clients that send nothing for this many seconds
    #[arg(long)]
    pub idle_timeout_secs: Option<u64>,

    /// Longest accepted input line, in bytes
    #[arg(long, default_value_t = 4096)]
    pub max_line_length: usize,
}

impl Config {
    /// `host:port` as passed to the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::parse_from(["irc_server"])
    }
}
