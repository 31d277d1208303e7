//! Server configuration.
//!
//! Values come from three places, highest precedence first: command line
//! flags, an optional YAML file given with `--config`, built-in defaults.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;
use thiserror::Error;

use crate::http::connection::{ConnectionSettings, DEFAULT_IDLE_TIMEOUT, DEFAULT_RECV_SIZE};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);

/// Command line flags.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "fileserve", version)]
#[command(about = "Concurrent static file server", long_about = None)]
pub struct Cli {
    /// Enable debugging output
    #[arg(long)]
    pub verbose: bool,

    /// Base directory containing the website
    #[arg(long, value_name = "DIR")]
    pub base: Option<PathBuf>,

    /// Port number to listen on [default: 8080]
    #[arg(long)]
    pub port: Option<u16>,

    /// Address to bind [default: 0.0.0.0]
    #[arg(long)]
    pub host: Option<IpAddr>,

    /// Maximum number of bytes to receive at a time [default: 65536]
    #[arg(long, value_name = "BYTES")]
    pub recv: Option<usize>,

    /// Seconds a client may take to send a request [default: 30]
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// YAML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Contents of a YAML configuration file. Every key is optional.
///
/// ```yaml
/// base_dir: ./site
/// port: 8080
/// host: 127.0.0.1
/// recv_size: 65536
/// idle_timeout_secs: 30
/// verbose: false
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub base_dir: Option<PathBuf>,
    pub port: Option<u16>,
    pub host: Option<IpAddr>,
    pub recv_size: Option<usize>,
    pub idle_timeout_secs: Option<u64>,
    pub verbose: Option<bool>,
}

impl FileConfig {
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("base directory for the website needs to be specified (use --base)")]
    MissingBaseDir,

    #[error("base directory {0} does not exist")]
    BaseDirNotFound(PathBuf),

    #[error("base directory {0} is not a directory")]
    BaseDirNotDirectory(PathBuf),

    #[error("receive size must be greater than zero")]
    ZeroRecvSize,

    #[error("idle timeout must be greater than zero")]
    ZeroTimeout,

    #[error("unable to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Validated configuration the server runs with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_dir: PathBuf,
    pub host: IpAddr,
    pub port: u16,
    pub recv_size: usize,
    pub idle_timeout: Duration,
    pub verbose: bool,
}

impl Config {
    /// Builds the configuration from parsed flags, reading `--config` if given.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };

        Self::merge(cli, file)
    }

    /// Combines flags with file values, flags winning, then validates.
    pub fn merge(cli: &Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let base_dir = cli
            .base
            .clone()
            .or(file.base_dir)
            .ok_or(ConfigError::MissingBaseDir)?;

        let recv_size = cli.recv.or(file.recv_size).unwrap_or(DEFAULT_RECV_SIZE);
        if recv_size == 0 {
            return Err(ConfigError::ZeroRecvSize);
        }

        let idle_timeout = match cli.timeout.or(file.idle_timeout_secs) {
            Some(0) => return Err(ConfigError::ZeroTimeout),
            Some(secs) => Duration::from_secs(secs),
            None => DEFAULT_IDLE_TIMEOUT,
        };

        match std::fs::metadata(&base_dir) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(ConfigError::BaseDirNotDirectory(base_dir)),
            Err(_) => return Err(ConfigError::BaseDirNotFound(base_dir)),
        }

        Ok(Self {
            base_dir,
            host: cli.host.or(file.host).unwrap_or(DEFAULT_HOST),
            port: cli.port.or(file.port).unwrap_or(DEFAULT_PORT),
            recv_size,
            idle_timeout,
            verbose: cli.verbose || file.verbose.unwrap_or(false),
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            recv_size: self.recv_size,
            idle_timeout: self.idle_timeout,
        }
    }
}
