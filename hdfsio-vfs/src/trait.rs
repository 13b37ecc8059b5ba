//! HdfsClient trait definition

use hdfsio_config::OpenConfig;
use std::ffi::{c_int, CStr};

/// OS error number reported by a failed native call
pub type Errno = i32;

/// Result of a native call: the value, or the errno read right after the call
///
/// `Err(0)` is possible: libhdfs returns null from some calls without
/// setting errno (listing an empty directory).
pub type NativeResult<T> = Result<T, Errno>;

/// Connection to one filesystem instance
///
/// Connections are cached by the native client and never disconnected
/// by hdfsio, so the handle is freely copyable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FsHandle(usize);

/// Open native file. Not `Clone`: `close_file` consumes it.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct FileHandle(usize);

/// Pending connection request. Consumed by `builder_connect`.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct BuilderHandle(usize);

macro_rules! raw_handle {
    ($($name:ident),*) => {
        $(
            impl $name {
                pub fn from_raw(raw: usize) -> Self {
                    $name(raw)
                }

                pub fn as_raw(&self) -> usize {
                    self.0
                }
            }
        )*
    };
}

raw_handle!(FsHandle, FileHandle, BuilderHandle);

/// How a file is opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Read-only
    Read,
    /// Write-only, create or truncate
    Write,
    /// Write-only, append to an existing file
    Append,
}

impl OpenMode {
    /// POSIX open flags understood by libhdfs
    pub fn flags(&self) -> c_int {
        match self {
            OpenMode::Read => libc::O_RDONLY,
            OpenMode::Write => libc::O_WRONLY,
            OpenMode::Append => libc::O_WRONLY | libc::O_APPEND,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    File,
    Directory,
}

/// One directory entry or path-info result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub kind: ObjectKind,
    /// Fully qualified name as reported by the backend
    pub name: String,
    /// Seconds since the epoch
    pub last_mod: i64,
    pub size: i64,
    pub replication: i16,
    pub block_size: i64,
    pub owner: String,
    pub group: String,
    pub permissions: i16,
    /// Seconds since the epoch
    pub last_access: i64,
}

impl FileInfo {
    pub fn is_directory(&self) -> bool {
        self.kind == ObjectKind::Directory
    }
}

/// Native HDFS client
///
/// One method per libhdfs entry point. Implementations must be usable from
/// many threads at once for independent connections and files; a single
/// `FileHandle` is never used concurrently.
///
/// # Implementations
/// - `LibHdfs`: the real client, loaded at runtime
/// - `MemoryClient`: in-memory backend for tests
pub trait HdfsClient: Send + Sync {
    /// Start a connection request (`hdfsNewBuilder`)
    fn new_builder(&self) -> NativeResult<BuilderHandle>;

    /// Select the namenode; `None` selects the local filesystem
    fn builder_set_name_node(&self, builder: &BuilderHandle, name_node: Option<&CStr>);

    /// Kerberos ticket cache used for the connection
    fn builder_set_kerb_ticket_cache_path(&self, builder: &BuilderHandle, path: &CStr);

    /// Connect, consuming the builder (`hdfsBuilderConnect`)
    fn builder_connect(&self, builder: BuilderHandle) -> NativeResult<FsHandle>;

    /// Open a file
    ///
    /// # Arguments
    /// * `fs` - Connection
    /// * `path` - Path within that connection's namespace
    /// * `mode` - Read, write (truncate) or append
    /// * `params` - Buffer size, replication and block size; zero means default
    fn open_file(
        &self,
        fs: FsHandle,
        path: &CStr,
        mode: OpenMode,
        params: &OpenConfig,
    ) -> NativeResult<FileHandle>;

    /// Close a file, consuming the handle
    fn close_file(&self, fs: FsHandle, file: FileHandle) -> NativeResult<()>;

    /// Positional read into `buf`
    ///
    /// # Returns
    /// Bytes read; `Ok(0)` at end of file
    fn pread(
        &self,
        fs: FsHandle,
        file: &FileHandle,
        position: i64,
        buf: &mut [u8],
    ) -> NativeResult<usize>;

    /// Write `data`, returning the number of bytes accepted
    fn write(&self, fs: FsHandle, file: &FileHandle, data: &[u8]) -> NativeResult<usize>;

    fn flush(&self, fs: FsHandle, file: &FileHandle) -> NativeResult<()>;

    /// Flush and wait for the data to reach the datanodes (`hdfsHSync`)
    fn hsync(&self, fs: FsHandle, file: &FileHandle) -> NativeResult<()>;

    /// Bytes readable without blocking
    fn available(&self, fs: FsHandle, file: &FileHandle) -> NativeResult<i32>;

    fn exists(&self, fs: FsHandle, path: &CStr) -> bool;

    /// List a directory. The native listing is freed before returning.
    ///
    /// # Returns
    /// The entries, or the errno of a null listing. An empty directory is
    /// reported by libhdfs as a null listing, typically with errno 0.
    fn list_directory(&self, fs: FsHandle, path: &CStr) -> NativeResult<Vec<FileInfo>>;

    fn delete(&self, fs: FsHandle, path: &CStr, recursive: bool) -> NativeResult<()>;

    /// Create a directory and any missing parents
    fn create_directory(&self, fs: FsHandle, path: &CStr) -> NativeResult<()>;

    fn get_path_info(&self, fs: FsHandle, path: &CStr) -> NativeResult<FileInfo>;

    fn rename(&self, fs: FsHandle, from: &CStr, to: &CStr) -> NativeResult<()>;

    /// Copy between two connections
    fn copy(&self, src_fs: FsHandle, src: &CStr, dst_fs: FsHandle, dst: &CStr)
        -> NativeResult<()>;

    /// Copy between two connections, then delete the source
    fn move_path(
        &self,
        src_fs: FsHandle,
        src: &CStr,
        dst_fs: FsHandle,
        dst: &CStr,
    ) -> NativeResult<()>;
}
