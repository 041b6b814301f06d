//! Command line and file configuration of the test clients.

use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use nfstest_common::config::NFS_PORT;

/// Default server when none is given.
pub const DEFAULT_SERVER: &str = "localhost";

/// Default export path mounted by the tests.
pub const DEFAULT_EXPORT: &str = "/";

/// Default machine name sent in AUTH_SYS credentials.
pub const DEFAULT_MACHINE_NAME: &str = "nfstest";

// uid/gid of the second, unprivileged user created by the environment
pub const SECOND_USER_ID: u32 = 1001;

const fn default_uid() -> u32 {
    0
}

const fn default_gid() -> u32 {
    0
}

const fn default_timeout_secs() -> u64 {
    10
}

fn default_server() -> String {
    DEFAULT_SERVER.to_owned()
}

fn default_export() -> String {
    DEFAULT_EXPORT.to_owned()
}

fn default_machine_name() -> String {
    DEFAULT_MACHINE_NAME.to_owned()
}

/// Security flavor of the primary test credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityFlavor {
    /// AUTH_NONE
    None,
    /// AUTH_SYS
    #[default]
    Sys,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => Self::Off,
            LogLevel::Error => Self::Error,
            LogLevel::Warn => Self::Warn,
            LogLevel::Info => Self::Info,
            LogLevel::Debug => Self::Debug,
            LogLevel::Trace => Self::Trace,
        }
    }
}

/// Connection and identity settings shared by every test client.
#[derive(Debug, Clone, clap::Args, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Server to test, either a host name or an NFS URL
    /// (`nfs://host:port/path`).
    #[clap(name = "server", long, default_value_t = default_server())]
    #[serde(default = "default_server")]
    pub server: String,

    /// NFS port. When not set the port mapper of the server is asked.
    #[clap(name = "port", long)]
    #[serde(default)]
    pub port: Option<u16>,

    /// Exported directory the tests work under.
    #[clap(name = "export", long, default_value_t = default_export())]
    #[serde(default = "default_export")]
    pub export: String,

    #[clap(name = "flavor", long, value_enum, default_value_t = SecurityFlavor::default())]
    #[serde(default)]
    pub flavor: SecurityFlavor,

    /// uid of the primary credential.
    #[clap(name = "uid", long, default_value_t = default_uid())]
    #[serde(default = "default_uid")]
    pub uid: u32,

    /// gid of the primary credential.
    #[clap(name = "gid", long, default_value_t = default_gid())]
    #[serde(default = "default_gid")]
    pub gid: u32,

    /// Machine name of AUTH_SYS credentials.
    #[clap(name = "machine-name", long, default_value_t = default_machine_name())]
    #[serde(default = "default_machine_name")]
    pub machine_name: String,

    /// Seconds to wait for each reply.
    #[clap(name = "timeout", long, default_value_t = default_timeout_secs())]
    #[serde(default = "default_timeout_secs")]
    pub timeout: u64,

    #[clap(name = "log-level", long, value_enum, default_value_t = LogLevel::default())]
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: default_server(),
            port: None,
            export: default_export(),
            flavor: SecurityFlavor::default(),
            uid: default_uid(),
            gid: default_gid(),
            machine_name: default_machine_name(),
            timeout: default_timeout_secs(),
            log_level: LogLevel::default(),
        }
    }
}

impl ClientConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    // Port to use for NFS when the port mapper is bypassed
    pub fn nfs_port(&self) -> u16 {
        self.port.unwrap_or(NFS_PORT)
    }

    // Identity of the second test user, always distinct from the primary one
    pub fn second_identity(&self) -> (u32, u32) {
        if self.uid == 0 {
            (SECOND_USER_ID, SECOND_USER_ID)
        } else {
            (self.uid.wrapping_add(1), self.gid.wrapping_add(1))
        }
    }
}
