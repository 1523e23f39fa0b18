use anyhow::bail;
use clap::Parser;
use core::time::Duration;
use jobs_tonic_core::types::{DEFAULT_SERVER_URL, NewJob};

/// Runtime configuration for the `jobs-tonic-client` binary.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "jobs-tonic-client",
    version,
    about = "Creates, reads, lists and deletes a job against a jobs server"
)]
pub struct CliArgs {
    /// Server endpoint. Only plaintext `http://` is supported.
    ///
    /// Environment variable: `SERVER_URL`
    #[arg(long, env = "SERVER_URL", default_value_t = String::from(DEFAULT_SERVER_URL))]
    pub server_url: String,

    /// Deadline for the whole run, connection included.
    ///
    /// Environment variable: `CLIENT_TIMEOUT_SECS`
    #[arg(long, env = "CLIENT_TIMEOUT_SECS", default_value_t = 5)]
    pub timeout_secs: u64,

    /// Limit sent with `ListJobs`. Zero or negative asks for the server
    /// default.
    ///
    /// Environment variable: `LIST_LIMIT`
    #[arg(long, env = "LIST_LIMIT", default_value_t = 10, allow_negative_numbers = true)]
    pub list_limit: i32,

    /// Name of the demo job.
    #[arg(long, default_value_t = String::from("Human Response Coordinator"))]
    pub name: String,

    /// Description of the demo job.
    #[arg(long, default_value_t = String::from("Legacy"))]
    pub description: String,

    /// Status of the demo job.
    #[arg(long, default_value_t = String::from("You're number 1501 in the applicant pool"))]
    pub status: String,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub timeout: Duration,
    pub list_limit: i32,
    pub job: NewJob,
}

impl TryFrom<CliArgs> for ClientConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if !args.server_url.starts_with("http://") {
            bail!(
                "SERVER_URL ({}) must be a plaintext http:// endpoint",
                args.server_url
            );
        }

        if args.timeout_secs == 0 {
            bail!("CLIENT_TIMEOUT_SECS must be greater than 0");
        }

        Ok(Self {
            server_url: args.server_url,
            timeout: Duration::from_secs(args.timeout_secs),
            list_limit: args.list_limit,
            job: NewJob::new(args.name, args.description, args.status),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<ClientConfig> {
        let argv = std::iter::once("jobs-tonic-client").chain(args.iter().copied());
        ClientConfig::try_from(CliArgs::try_parse_from(argv)?)
    }

    #[test]
    fn defaults() {
        let config = parse(&[]).unwrap();
        assert_eq!(config.server_url, "http://127.0.0.1:50051");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.list_limit, 10);
        assert_eq!(config.job.name, "Human Response Coordinator");
        assert_eq!(config.job.description, "Legacy");
    }

    #[test]
    fn negative_list_limit_is_allowed() {
        assert_eq!(parse(&["--list-limit", "-1"]).unwrap().list_limit, -1);
    }

    #[test]
    fn rejects_tls_endpoints() {
        let err = parse(&["--server-url", "https://jobs.example.com"]).unwrap_err();
        assert!(err.to_string().contains("http://"));
    }

    #[test]
    fn rejects_zero_timeout() {
        assert!(parse(&["--timeout-secs", "0"]).is_err());
    }
}
