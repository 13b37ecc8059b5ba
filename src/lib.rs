//! hdfsio - file:// and hdfs:// access through the native libhdfs client
//!
//! # Architecture
//!
//! ```text
//! hdfsio-config  - environment, open parameters, log targets
//! hdfsio-core    - Status, errno mapping, URI parsing (no IO)
//! hdfsio-vfs     - HdfsClient capability table, libhdfs binding, MemoryClient
//! hdfsio-api     - Loader singleton, router, file handles, HadoopFileSystem
//! hdfsio-cli     - the `hdfsio` binary
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use hdfsio_workspace::HadoopFileSystem;
//!
//! let fs = HadoopFileSystem::new();
//! for name in fs.get_children("hdfs://namenode:8020/data")? {
//!     println!("{}", name);
//! }
//! ```

// 重导出各层
pub use hdfsio_api as api;
pub use hdfsio_config as config;
pub use hdfsio_core as core;
pub use hdfsio_vfs as vfs;

// 重导出常用类型
pub use hdfsio_api::{
    loader, to_report, HadoopFileSystem, Loader, RandomAccessFile, StatusReport, WritableFile,
};
pub use hdfsio_config::{LibraryConfig, OpenConfig};
pub use hdfsio_core::{basename, dirname, parse_uri, Code, FileStatistics, Result, Status};
pub use hdfsio_vfs::{HdfsClient, MemoryClient, Op};
