use anyhow::bail;
use clap::Parser;
use jobs_tonic_core::types::{DEFAULT_LIST_LIMIT, DEFAULT_SERVER_ADDR};

/// Runtime configuration for the `jobs-tonic-server` binary.
///
/// All values are parsed from CLI arguments or environment variables (a
/// `.env` file is honored), with defaults matching the demo client.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "jobs-tonic-server",
    version,
    about = "A gRPC service for creating, reading, listing and deleting jobs"
)]
pub struct CliArgs {
    /// Address to listen on (TCP or Unix socket path; use --uds for Unix
    /// socket).
    ///
    /// Example: "0.0.0.0:50051" or "/tmp/jobs.sock"
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from(DEFAULT_SERVER_ADDR))]
    pub server_addr: String,

    /// Listen on a Unix socket instead of TCP. If set, `SERVER_ADDR` must be
    /// a file path.
    #[arg(short, long, default_value_t = false)]
    pub uds: bool,

    /// Number of jobs returned by `ListJobs` when the request's limit is zero
    /// or negative.
    ///
    /// Environment variable: `DEFAULT_LIST_LIMIT`
    #[arg(long, env = "DEFAULT_LIST_LIMIT", default_value_t = DEFAULT_LIST_LIMIT)]
    pub default_list_limit: usize,

    /// Capacity of the buffer between the list producer task and the gRPC
    /// response stream.
    ///
    /// Lower values apply backpressure sooner; higher values let the producer
    /// run further ahead of a slow client.
    ///
    /// Environment variable: `STREAM_BUFFER_SIZE`
    #[arg(long, env = "STREAM_BUFFER_SIZE", default_value_t = 8)]
    pub stream_buffer_size: usize,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_addr: String,
    pub uds: bool,
    pub default_list_limit: usize,
    pub stream_buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_addr: DEFAULT_SERVER_ADDR.to_string(),
            uds: false,
            default_list_limit: DEFAULT_LIST_LIMIT,
            stream_buffer_size: 8,
        }
    }
}

impl TryFrom<CliArgs> for ServerConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.server_addr.trim().is_empty() {
            bail!("SERVER_ADDR must not be empty");
        }

        if args.default_list_limit == 0 {
            bail!("DEFAULT_LIST_LIMIT must be greater than 0");
        }

        if args.default_list_limit > i32::MAX as usize {
            bail!(
                "DEFAULT_LIST_LIMIT ({}) exceeds the largest representable limit ({})",
                args.default_list_limit,
                i32::MAX
            );
        }

        // mpsc::channel panics on a zero capacity.
        if args.stream_buffer_size == 0 {
            bail!("STREAM_BUFFER_SIZE must be greater than 0");
        }

        Ok(Self {
            server_addr: args.server_addr,
            uds: args.uds,
            default_list_limit: args.default_list_limit,
            stream_buffer_size: args.stream_buffer_size,
        })
    }
}
