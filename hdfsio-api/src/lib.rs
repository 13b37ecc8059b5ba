//! hdfsio API - remote filesystem access layer
//!
//! Provides the public surface over the native HDFS client:
//! - Process-wide native client loader (`loader`)
//! - Scheme routing for `file://` and `hdfs://` addresses (`router`)
//! - File handles with retrying reads and all-or-nothing writes (`file`)
//! - The `HadoopFileSystem` facade (`fs`)
//!
//! For CLI convenience the facade can use a global loader.
//! For library use and tests, prefer `HadoopFileSystem::with_loader`.

pub mod error;
pub mod file;
pub mod fs;
pub mod loader;
pub mod router;

pub use error::{to_report, StatusReport};
pub use file::{RandomAccessFile, WritableFile};
pub use fs::HadoopFileSystem;
pub use loader::Loader;
pub use router::{connect, translate_name, Connection, Scheme};

// Re-export core types
pub use hdfsio_config;
pub use hdfsio_core::{Code, FileStatistics, Result, Status};
pub use hdfsio_vfs::{FileInfo, HdfsClient, MemoryClient, ObjectKind};
