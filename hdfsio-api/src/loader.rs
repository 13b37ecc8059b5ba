//! Native client loader
//!
//! The process-wide loader is created on first use and never reloaded: a
//! failed load is cached and returned by every later connect.
//! Tests and tools can install their own loader before first use, or hand
//! an explicit `Arc<Loader>` to `HadoopFileSystem::with_loader`.

use hdfsio_config::{LibraryConfig, OpenConfig};
use hdfsio_core::{Result, Status};
use hdfsio_vfs::{HdfsClient, LibHdfs};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::info;

/// Loaded native client plus the settings applied to every connection
pub struct Loader {
    client: std::result::Result<Arc<dyn HdfsClient>, Status>,
    ticket_cache_path: Option<String>,
    open: OpenConfig,
}

impl Loader {
    /// Load `libhdfs.so` as described by `config`
    ///
    /// Never fails: a load error becomes the loader's terminal status.
    pub fn from_config(config: &LibraryConfig) -> Self {
        let client = match LibHdfs::load(config) {
            Ok(lib) => {
                info!(
                    target: "hdfsio::loader",
                    path = ?config.library_path(),
                    "libhdfs loaded"
                );
                Ok(Arc::new(lib) as Arc<dyn HdfsClient>)
            }
            Err(err) => {
                let status = Status::from(err);
                info!(target: "hdfsio::loader", status = %status, "libhdfs unavailable");
                Err(status)
            }
        };
        Self {
            client,
            ticket_cache_path: config.ticket_cache_path.clone(),
            open: OpenConfig::default(),
        }
    }

    /// Use an already constructed client
    pub fn with_client(client: Arc<dyn HdfsClient>) -> Self {
        Self {
            client: Ok(client),
            ticket_cache_path: None,
            open: OpenConfig::default(),
        }
    }

    /// A loader whose every connect fails with `status`
    ///
    /// An OK status is replaced by an INTERNAL error, since a loader
    /// without a client cannot succeed.
    pub fn failed(status: Status) -> Self {
        let status = if status.is_ok() {
            Status::internal("loader has no native client")
        } else {
            status
        };
        Self {
            client: Err(status),
            ticket_cache_path: None,
            open: OpenConfig::default(),
        }
    }

    pub fn with_ticket_cache_path(mut self, path: impl Into<String>) -> Self {
        self.ticket_cache_path = Some(path.into());
        self
    }

    pub fn with_open_config(mut self, open: OpenConfig) -> Self {
        self.open = open;
        self
    }

    /// OK when the client is usable, the cached load failure otherwise
    pub fn status(&self) -> Status {
        match &self.client {
            Ok(_) => Status::ok(),
            Err(status) => status.clone(),
        }
    }

    pub fn client(&self) -> Result<&Arc<dyn HdfsClient>> {
        self.client.as_ref().map_err(Clone::clone)
    }

    pub fn ticket_cache_path(&self) -> Option<&str> {
        self.ticket_cache_path.as_deref()
    }

    pub fn open_config(&self) -> &OpenConfig {
        &self.open
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("status", &self.status())
            .field("ticket_cache_path", &self.ticket_cache_path)
            .field("open", &self.open)
            .finish()
    }
}

// Global loader singleton
static GLOBAL_LOADER: OnceCell<Arc<Loader>> = OnceCell::new();

/// The process-wide loader, loading from the environment on first call
pub fn global() -> Arc<Loader> {
    GLOBAL_LOADER
        .get_or_init(|| Arc::new(Loader::from_config(&LibraryConfig::from_env())))
        .clone()
}

/// Install the process-wide loader
///
/// Only possible before first use; otherwise the rejected loader is
/// handed back.
pub fn install(loader: Loader) -> std::result::Result<(), Arc<Loader>> {
    GLOBAL_LOADER.set(Arc::new(loader))
}

/// Check if the global loader exists yet
pub fn is_initialized() -> bool {
    GLOBAL_LOADER.get().is_some()
}
