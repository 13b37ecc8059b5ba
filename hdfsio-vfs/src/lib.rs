//! hdfsio native client layer
//!
//! The `HdfsClient` trait is the capability table of the native HDFS
//! client: one method per libhdfs entry point the upper layers call.
//! Two implementations exist:
//! - `LibHdfs`: `libhdfs.so` opened at runtime, every entry point bound by name
//! - `MemoryClient`: an in-memory backend with fault injection, for tests
//!
//! # Usage
//! ```rust,ignore
//! use hdfsio_vfs::{HdfsClient, MemoryClient};
//!
//! let client = MemoryClient::new();
//! let builder = client.new_builder().unwrap();
//! client.builder_set_name_node(&builder, None);
//! let fs = client.builder_connect(builder).unwrap();
//! assert!(client.exists(fs, c"/"));
//! ```

mod error;
mod libhdfs;
mod memory;
mod r#trait;

pub use error::LoadError;
pub use libhdfs::LibHdfs;
pub use memory::{MemoryClient, Op};
pub use r#trait::{
    BuilderHandle, Errno, FileHandle, FileInfo, FsHandle, HdfsClient, NativeResult, ObjectKind,
    OpenMode,
};
