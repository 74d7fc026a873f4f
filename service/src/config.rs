use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use std::error::Error as StdError;
use std::ffi::OsString;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
pub enum RustEnv {
    Development,
    Production,
    Staging,
}

#[derive(Debug, PartialEq, Eq)]
pub struct RustEnvParseError(String);

impl fmt::Display for RustEnvParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "unknown runtime environment '{}', expected development, staging or production",
            self.0
        )
    }
}

impl StdError for RustEnvParseError {}

impl FromStr for RustEnv {
    type Err = RustEnvParseError;
    fn from_str(level: &str) -> Result<RustEnv, Self::Err> {
        match level.to_lowercase().as_str() {
            "development" => Ok(RustEnv::Development),
            "production" => Ok(RustEnv::Production),
            "staging" => Ok(RustEnv::Staging),
            _ => Err(RustEnvParseError(level.to_string())),
        }
    }
}

impl fmt::Display for RustEnv {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RustEnv::Development => write!(f, "development"),
            RustEnv::Production => write!(f, "production"),
            RustEnv::Staging => write!(f, "staging"),
        }
    }
}

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that allowed to receive server responses.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:3000,https://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
    pub port: u16,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(short, long, env, default_value_t = LevelFilter::Info)]
    pub log_level_filter: LevelFilter,

    /// Set the Rust runtime environment to use.
    #[arg(short, long, env, default_value_t = RustEnv::Development)]
    pub runtime_env: RustEnv,

    /// Seconds of stream inactivity before a keep-alive comment is sent. 0 disables keep-alive.
    #[arg(long, env, default_value_t = 15)]
    pub stream_keep_alive_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    /// Build a config from an explicit argument list instead of the process arguments.
    pub fn from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Config::parse_from(args)
    }

    pub fn interface(&self) -> &str {
        self.interface.as_deref().unwrap_or("127.0.0.1")
    }

    /// `interface:port` to bind the listener to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.interface(), self.port)
    }

    pub fn stream_keep_alive(&self) -> Option<Duration> {
        (self.stream_keep_alive_secs > 0).then(|| Duration::from_secs(self.stream_keep_alive_secs))
    }

    pub fn runtime_env(&self) -> RustEnv {
        self.runtime_env.clone()
    }

    pub fn is_production(&self) -> bool {
        self.runtime_env() == RustEnv::Production
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_arguments() {
        let config = Config::from_args(["route_stream_rs"]);

        assert_eq!(config.bind_address(), "127.0.0.1:4000");
        assert_eq!(config.stream_keep_alive(), Some(Duration::from_secs(15)));
        assert_eq!(config.log_level_filter, LevelFilter::Info);
        assert!(!config.is_production());
    }

    #[test]
    fn arguments_override_defaults() {
        let config = Config::from_args([
            "route_stream_rs",
            "--port",
            "8080",
            "--log-level-filter",
            "debug",
            "--runtime-env",
            "PRODUCTION",
            "--stream-keep-alive-secs",
            "0",
            "--allowed-origins",
            "https://a.example,https://b.example",
        ]);

        assert_eq!(config.port, 8080);
        assert_eq!(config.log_level_filter, LevelFilter::Debug);
        assert!(config.is_production());
        assert_eq!(config.stream_keep_alive(), None);
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn runtime_env_parsing_is_case_insensitive() {
        assert_eq!("Staging".parse::<RustEnv>(), Ok(RustEnv::Staging));
        assert!("qa".parse::<RustEnv>().is_err());
    }
}
