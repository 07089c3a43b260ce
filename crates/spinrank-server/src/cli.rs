//! Command-line and environment configuration.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use spinrank::prelude::*;

/// Command-line arguments. Each can also come from the environment where
/// noted.
#[derive(Parser, Debug, Clone)]
#[command(name = "spinrank-server", version)]
#[command(about = "Real-time party game server: spin the wheel, rank the prompts")]
pub struct Args {
    /// Address to listen on (e.g. 127.0.0.1:3001). Takes precedence over --port.
    #[arg(short, long, env = "SPINRANK_BIND", value_name = "ADDRESS")]
    pub bind: Option<String>,

    /// Port to listen on, on all interfaces.
    #[arg(short, long, env = "PORT", default_value_t = 3001)]
    pub port: u16,

    /// Browser origin allowed to connect. Repeat for several.
    #[arg(long = "allow-origin", value_name = "ORIGIN", default_value = "http://localhost:5173")]
    pub allow_origins: Vec<String>,

    /// Accept connections from any origin.
    #[arg(long)]
    pub any_origin: bool,

    /// Newline-separated prompt file.
    #[arg(long, value_name = "FILE", default_value = "scenarios.txt")]
    pub prompts: PathBuf,

    /// Log level (trace, debug, info, warn, error). RUST_LOG wins if set.
    #[arg(short, long, default_value = "info")]
    pub log_level: String,

    /// Output logs in JSON format.
    #[arg(long)]
    pub json_logs: bool,

    /// Drop peers that have not completed the WebSocket upgrade after this
    /// many seconds.
    #[arg(long, value_name = "SECS", default_value_t = 10)]
    pub handshake_timeout_secs: u64,

    /// Close connections that stay silent this many seconds.
    #[arg(long, value_name = "SECS")]
    pub idle_timeout_secs: Option<u64>,

    /// Reject spin results that are not on the wheel.
    #[arg(long)]
    pub enforce_wheel: bool,

    /// Seed room codes and prompt dealing, for reproducible sessions.
    #[arg(long)]
    pub seed: Option<u64>,
}

impl Args {
    pub fn bind_addr(&self) -> String {
        self.bind
            .clone()
            .unwrap_or_else(|| format!("0.0.0.0:{}", self.port))
    }

    pub fn origin_policy(&self) -> OriginPolicy {
        if self.any_origin {
            OriginPolicy::Any
        } else {
            OriginPolicy::allow(&self.allow_origins)
        }
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: self.bind_addr(),
            origins: self.origin_policy(),
            room: RoomConfig {
                enforce_wheel_values: self.enforce_wheel,
                ..RoomConfig::default()
            },
            handshake_timeout: Duration::from_secs(self.handshake_timeout_secs),
            idle_timeout: self.idle_timeout_secs.map(Duration::from_secs),
            seed: self.seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        let argv = std::iter::once("spinrank-server").chain(args.iter().copied());
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_bind_addr_from_port() {
        let mut args = parse(&["--port", "4000"]);
        // SPINRANK_BIND in the environment would otherwise take over.
        args.bind = None;
        assert_eq!(args.bind_addr(), "0.0.0.0:4000");
    }

    #[test]
    fn test_bind_addr_explicit_wins() {
        let args = parse(&["--bind", "127.0.0.1:9000", "--port", "4000"]);
        assert_eq!(args.bind_addr(), "127.0.0.1:9000");
    }

    #[test]
    fn test_origin_policy_default_allows_dev_client() {
        let policy = parse(&[]).origin_policy();
        assert!(policy.permits(Some("http://localhost:5173")));
        assert!(!policy.permits(Some("http://example.com")));
    }

    #[test]
    fn test_origin_policy_repeated_and_any() {
        let policy = parse(&[
            "--allow-origin",
            "https://a.test",
            "--allow-origin",
            "https://b.test",
        ])
        .origin_policy();
        assert!(policy.permits(Some("https://b.test")));
        assert!(!policy.permits(Some("http://localhost:5173")));

        assert_eq!(parse(&["--any-origin"]).origin_policy(), OriginPolicy::Any);
    }

    #[test]
    fn test_server_config_maps_flags() {
        let config = parse(&[
            "--idle-timeout-secs",
            "30",
            "--handshake-timeout-secs",
            "3",
            "--enforce-wheel",
            "--seed",
            "9",
        ])
        .server_config();
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.handshake_timeout, Duration::from_secs(3));
        assert!(config.room.enforce_wheel_values);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.room.default_rounds, 5);
    }

    #[test]
    fn test_server_config_default_handshake_timeout() {
        assert_eq!(parse(&[]).server_config().handshake_timeout, DEFAULT_HANDSHAKE_TIMEOUT);
    }
}
