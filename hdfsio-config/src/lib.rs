//! hdfsio Config - Pure configuration data structures
//!
//! This crate contains only data structures, no global state.
//! It is the shared configuration vocabulary of the hdfsio crates:
//! where the native client lives, how files are opened, and which
//! log targets exist.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable naming the native client installation root (required)
pub const HDFS_HOME_ENV: &str = "HADOOP_HDFS_HOME";

/// Environment variable naming the Kerberos ticket cache (optional)
pub const TICKET_CACHE_ENV: &str = "KERB_TICKET_CACHE_PATH";

/// Location of the native library relative to the installation root
pub const LIBRARY_SUBPATH: &str = "lib/native/libhdfs.so";

/// Where to find the native client and which credentials to use
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// Installation root, `None` when the environment does not provide one
    pub hdfs_home: Option<PathBuf>,
    /// Ticket cache applied to every connection request
    pub ticket_cache_path: Option<String>,
}

impl LibraryConfig {
    /// Snapshot the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a closure over a map)
    ///
    /// Empty values count as unset for the ticket cache, but an empty
    /// installation root is kept so that the failure names the bad path.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            hdfs_home: lookup(HDFS_HOME_ENV).map(PathBuf::from),
            ticket_cache_path: lookup(TICKET_CACHE_ENV).filter(|p| !p.is_empty()),
        }
    }

    /// Full path of the native library, if the installation root is known
    pub fn library_path(&self) -> Option<PathBuf> {
        self.hdfs_home.as_ref().map(|home| home.join(LIBRARY_SUBPATH))
    }
}

/// Parameters forwarded to every native open call
///
/// Zero means "use the native client default" for each field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenConfig {
    pub buffer_size: i32,
    pub replication: i16,
    pub block_size: i32,
}

/// Component enum for component-specific log targets
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogTarget {
    Loader,
    Router,
    File,
    Fs,
}

impl LogTarget {
    /// All targets, in dependency order
    pub const ALL: [LogTarget; 4] = [
        LogTarget::Loader,
        LogTarget::Router,
        LogTarget::File,
        LogTarget::Fs,
    ];

    /// Get the string name of the component
    pub fn as_str(&self) -> &'static str {
        match self {
            LogTarget::Loader => "loader",
            LogTarget::Router => "router",
            LogTarget::File => "file",
            LogTarget::Fs => "fs",
        }
    }

    /// Get the log target name for this component
    pub fn target(&self) -> String {
        format!("hdfsio::{}", self.as_str())
    }
}
