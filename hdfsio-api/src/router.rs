//! Connection routing: `file://` to the local filesystem, `hdfs://host` to a namenode

use crate::loader::Loader;
use hdfsio_core::errno::strerror;
use hdfsio_core::{parse_uri, Result, Status};
use hdfsio_vfs::{FsHandle, HdfsClient};
use std::ffi::CString;
use std::sync::Arc;
use tracing::debug;

/// Address schemes served by the native client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    File,
    Hdfs,
}

impl Scheme {
    pub fn parse(scheme: &str) -> Option<Scheme> {
        match scheme {
            "file" => Some(Scheme::File),
            "hdfs" => Some(Scheme::Hdfs),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::File => "file",
            Scheme::Hdfs => "hdfs",
        }
    }
}

/// A live connection, valid for one call chain
///
/// Not cached here: libhdfs keeps its own per-namenode connection cache,
/// so connecting again for every call is cheap.
#[derive(Clone)]
pub struct Connection {
    client: Arc<dyn HdfsClient>,
    fs: FsHandle,
}

impl Connection {
    pub fn client(&self) -> &dyn HdfsClient {
        self.client.as_ref()
    }

    pub fn handle(&self) -> FsHandle {
        self.fs
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection").field("fs", &self.fs).finish()
    }
}

/// Convert a path for the native boundary
pub(crate) fn c_path(path: &str) -> Result<CString> {
    CString::new(path).map_err(|_| {
        Status::invalid_argument(format!("{}: path contains a NUL byte", path.escape_debug()))
    })
}

/// Connect to the filesystem `uri` lives on
///
/// A failed loader short-circuits with its cached status before anything
/// else happens.
pub fn connect(loader: &Loader, uri: &str) -> Result<Connection> {
    let client = loader.client()?;
    let parsed = parse_uri(uri);
    let scheme = Scheme::parse(parsed.scheme).ok_or_else(|| {
        Status::invalid_argument(format!("{}: scheme must be file or hdfs", uri))
    })?;

    // everything that can fail is converted before the builder exists
    let name_node = match scheme {
        Scheme::File => None,
        Scheme::Hdfs => Some(c_path(parsed.host)?),
    };
    let ticket_cache = loader.ticket_cache_path().map(c_path).transpose()?;

    let builder = client
        .new_builder()
        .map_err(|errno| Status::not_found(strerror(errno)))?;
    client.builder_set_name_node(&builder, name_node.as_deref());
    if let Some(path) = &ticket_cache {
        client.builder_set_kerb_ticket_cache_path(&builder, path);
    }
    let fs = client
        .builder_connect(builder)
        .map_err(|errno| Status::not_found(strerror(errno)))?;

    debug!(
        target: "hdfsio::router",
        scheme = scheme.as_str(),
        host = parsed.host,
        "connected"
    );
    Ok(Connection {
        client: Arc::clone(client),
        fs,
    })
}

/// The part of `uri` handed to the native client: the path, without scheme or host
pub fn translate_name(uri: &str) -> &str {
    parse_uri(uri).path
}
