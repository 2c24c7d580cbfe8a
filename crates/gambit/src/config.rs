//! Server configuration and the command line that produces it.

use std::time::Duration;

use clap::Parser;

/// Default listen address.
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3001";

/// Default capacity of the coordinator's command queue.
pub const DEFAULT_COMMAND_BUFFER: usize = 256;

/// Default number of messages that may wait for one slow client.
pub const DEFAULT_OUTBOUND_BUFFER: usize = 64;

/// Settings for a [`GambitServer`](crate::GambitServer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,

    /// When set, the server pings every connection at half this interval
    /// and drops one that has sent nothing at all (pongs included) for
    /// this long. Quiet but connected clients are never dropped. `None`
    /// disables the check.
    pub liveness_timeout: Option<Duration>,

    /// Capacity of the coordinator command queue.
    pub command_buffer: usize,

    /// Per-connection queue of undelivered server messages. A client that
    /// lets it fill up is disconnected.
    pub outbound_buffer: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            liveness_timeout: None,
            command_buffer: DEFAULT_COMMAND_BUFFER,
            outbound_buffer: DEFAULT_OUTBOUND_BUFFER,
        }
    }
}

/// Command line of the `gambit-server` binary. Every flag can also be
/// given through the environment.
#[derive(Parser, Debug, Clone)]
#[command(name = "gambit-server")]
#[command(about = "Two-player chess session coordinator", long_about = None)]
#[command(version)]
pub struct ServerArgs {
    /// Address to listen on, e.g. 0.0.0.0:3001. Takes precedence over --port
    #[arg(long, env = "GAMBIT_BIND")]
    pub bind: Option<String>,

    /// Listen on 0.0.0.0:<PORT>
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Drop connections that answer no ping within this many seconds (0 disables)
    #[arg(long, env = "GAMBIT_LIVENESS_TIMEOUT_SECS", default_value_t = 0)]
    pub liveness_timeout_secs: u64,

    /// Coordinator command queue capacity
    #[arg(
        long,
        env = "GAMBIT_COMMAND_BUFFER",
        default_value_t = DEFAULT_COMMAND_BUFFER,
        value_parser = parse_capacity
    )]
    pub command_buffer: usize,

    /// Messages buffered per client before it is treated as gone
    #[arg(
        long,
        env = "GAMBIT_OUTBOUND_BUFFER",
        default_value_t = DEFAULT_OUTBOUND_BUFFER,
        value_parser = parse_capacity
    )]
    pub outbound_buffer: usize,
}

impl From<ServerArgs> for ServerConfig {
    fn from(args: ServerArgs) -> Self {
        let bind_addr = match (args.bind, args.port) {
            (Some(addr), _) => addr,
            (None, Some(port)) => format!("0.0.0.0:{port}"),
            (None, None) => DEFAULT_BIND_ADDR.to_string(),
        };
        Self {
            bind_addr,
            liveness_timeout: (args.liveness_timeout_secs > 0)
                .then(|| Duration::from_secs(args.liveness_timeout_secs)),
            command_buffer: args.command_buffer,
            outbound_buffer: args.outbound_buffer,
        }
    }
}

fn parse_capacity(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}
