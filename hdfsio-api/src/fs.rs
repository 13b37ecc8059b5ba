//! Filesystem facade
//!
//! Stateless: every call connects (libhdfs caches connections), translates
//! the address to a native path, issues one native operation and maps a
//! failure through the errno table.

use crate::file::{RandomAccessFile, WritableFile};
use crate::loader::{self, Loader};
use crate::router::{self, c_path, translate_name, Connection};
use hdfsio_core::{basename, io_error, FileStatistics, Result, Status};
use hdfsio_vfs::{FileHandle, FileInfo, OpenMode};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
enum Transfer {
    Copy,
    Move,
}

/// POSIX-like access to `file://` and `hdfs://` addresses
#[derive(Debug, Clone, Default)]
pub struct HadoopFileSystem {
    // None means the process-wide loader
    loader: Option<Arc<Loader>>,
}

impl HadoopFileSystem {
    /// Facade over the process-wide loader
    pub fn new() -> Self {
        Self { loader: None }
    }

    /// Facade over an explicit loader, leaving global state untouched
    pub fn with_loader(loader: Arc<Loader>) -> Self {
        Self {
            loader: Some(loader),
        }
    }

    pub fn loader(&self) -> Arc<Loader> {
        match &self.loader {
            Some(loader) => Arc::clone(loader),
            None => loader::global(),
        }
    }

    fn connect(&self, uri: &str) -> Result<Connection> {
        router::connect(&self.loader(), uri)
    }

    fn open(&self, fname: &str, mode: OpenMode) -> Result<(Connection, FileHandle)> {
        debug!(target: "hdfsio::fs", path = fname, ?mode, "open");
        let loader = self.loader();
        let conn = router::connect(&loader, fname)?;
        let path = c_path(translate_name(fname))?;
        let file = conn
            .client()
            .open_file(conn.handle(), &path, mode, loader.open_config())
            .map_err(|errno| io_error(fname, errno))?;
        Ok((conn, file))
    }

    /// Open `fname` for positional reads
    pub fn new_random_access_file(&self, fname: &str) -> Result<RandomAccessFile> {
        let (conn, file) = self.open(fname, OpenMode::Read)?;
        Ok(RandomAccessFile::new(fname, conn, file))
    }

    /// Create or truncate `fname` for writing
    pub fn new_writable_file(&self, fname: &str) -> Result<WritableFile> {
        let (conn, file) = self.open(fname, OpenMode::Write)?;
        Ok(WritableFile::new(fname, conn, file))
    }

    /// Open an existing `fname` for appending
    pub fn new_appendable_file(&self, fname: &str) -> Result<WritableFile> {
        let (conn, file) = self.open(fname, OpenMode::Append)?;
        Ok(WritableFile::new(fname, conn, file))
    }

    /// `Ok(())` if `fname` exists, NOT_FOUND otherwise
    pub fn file_exists(&self, fname: &str) -> Result<()> {
        debug!(target: "hdfsio::fs", path = fname, "exists");
        let conn = self.connect(fname)?;
        let path = c_path(translate_name(fname))?;
        if conn.client().exists(conn.handle(), &path) {
            Ok(())
        } else {
            Err(Status::not_found(fname))
        }
    }

    /// Names of the entries of `dir`
    pub fn get_children(&self, dir: &str) -> Result<Vec<String>> {
        Ok(self
            .list_status(dir)?
            .iter()
            .map(|info| basename(&info.name).to_string())
            .collect())
    }

    /// Full entries of `dir`
    ///
    /// libhdfs returns null both for an empty directory and for a failed
    /// listing, so `dir` is stat'ed first: a null listing of a confirmed
    /// directory is an empty result.
    pub fn list_status(&self, dir: &str) -> Result<Vec<FileInfo>> {
        debug!(target: "hdfsio::fs", path = dir, "list");
        let conn = self.connect(dir)?;
        let stat = self.stat(dir)?;
        let path = c_path(translate_name(dir))?;
        match conn.client().list_directory(conn.handle(), &path) {
            Ok(entries) => Ok(entries),
            Err(errno) if stat.is_directory => {
                debug!(target: "hdfsio::fs", path = dir, errno, "null listing of a directory, assuming empty");
                Ok(Vec::new())
            }
            Err(errno) => Err(io_error(dir, errno)),
        }
    }

    pub fn delete_file(&self, fname: &str) -> Result<()> {
        debug!(target: "hdfsio::fs", path = fname, "delete file");
        let conn = self.connect(fname)?;
        let path = c_path(translate_name(fname))?;
        conn.client()
            .delete(conn.handle(), &path, false)
            .map_err(|errno| io_error(fname, errno))
    }

    /// Create `dir` and any missing parents
    pub fn create_dir(&self, dir: &str) -> Result<()> {
        debug!(target: "hdfsio::fs", path = dir, "create dir");
        let conn = self.connect(dir)?;
        let path = c_path(translate_name(dir))?;
        conn.client()
            .create_directory(conn.handle(), &path)
            .map_err(|errno| io_error(dir, errno))
    }

    /// Delete an empty directory
    ///
    /// A file created between the emptiness check and the delete is
    /// removed with the directory.
    pub fn delete_dir(&self, dir: &str) -> Result<()> {
        debug!(target: "hdfsio::fs", path = dir, "delete dir");
        let conn = self.connect(dir)?;
        let path = c_path(translate_name(dir))?;
        let entries = match conn.client().list_directory(conn.handle(), &path) {
            Ok(listing) => listing.len(),
            Err(0) => 0,
            Err(errno) => {
                // HDFS-8407: a failed listing may still be an empty directory
                debug!(target: "hdfsio::fs", path = dir, errno, "listing failed, checking with stat");
                self.stat(dir)?;
                0
            }
        };
        if entries > 0 {
            warn!(target: "hdfsio::fs", path = dir, entries, "refusing to delete a non-empty directory");
            return Err(Status::failed_precondition(
                "Cannot delete a non-empty directory.",
            ));
        }
        conn.client()
            .delete(conn.handle(), &path, true)
            .map_err(|errno| io_error(dir, errno))
    }

    pub fn get_file_size(&self, fname: &str) -> Result<u64> {
        Ok(self.stat(fname)?.length)
    }

    pub fn stat(&self, fname: &str) -> Result<FileStatistics> {
        debug!(target: "hdfsio::fs", path = fname, "stat");
        let conn = self.connect(fname)?;
        let path = c_path(translate_name(fname))?;
        let info = conn
            .client()
            .get_path_info(conn.handle(), &path)
            .map_err(|errno| io_error(fname, errno))?;
        Ok(FileStatistics::from_native(
            info.size,
            info.last_mod,
            info.is_directory(),
        ))
    }

    /// Rename `src` to `target`, replacing an existing `target`
    ///
    /// Not atomic: an existing target is deleted first.
    pub fn rename_file(&self, src: &str, target: &str) -> Result<()> {
        debug!(target: "hdfsio::fs", src, dst = target, "rename");
        let conn = self.connect(src)?;
        let src_path = c_path(translate_name(src))?;
        let target_path = c_path(translate_name(target))?;
        let client = conn.client();
        if client.exists(conn.handle(), &target_path) {
            client
                .delete(conn.handle(), &target_path, false)
                .map_err(|errno| io_error(target, errno))?;
        }
        client
            .rename(conn.handle(), &src_path, &target_path)
            .map_err(|errno| io_error(src, errno))
    }

    fn transfer(&self, src: &str, dst: &str, kind: Transfer) -> Result<()> {
        debug!(target: "hdfsio::fs", src, dst, ?kind, "transfer");
        let src_conn = self.connect(src)?;
        let dst_conn = self.connect(dst)?;
        let src_path = c_path(translate_name(src))?;
        let dst_path = c_path(translate_name(dst))?;
        let client = src_conn.client();
        let result = match kind {
            Transfer::Copy => client.copy(
                src_conn.handle(),
                &src_path,
                dst_conn.handle(),
                &dst_path,
            ),
            Transfer::Move => client.move_path(
                src_conn.handle(),
                &src_path,
                dst_conn.handle(),
                &dst_path,
            ),
        };
        result.map_err(|errno| io_error(format!("from {} to {}", src, dst), errno))
    }

    /// Copy a remote `src` to a local `dst`
    pub fn copy_to_local(&self, src: &str, dst: &str) -> Result<()> {
        self.transfer(src, dst, Transfer::Copy)
    }

    /// Copy a local `src` to a remote `dst`
    pub fn copy_to_remote(&self, src: &str, dst: &str) -> Result<()> {
        self.transfer(src, dst, Transfer::Copy)
    }

    pub fn move_to_local(&self, src: &str, dst: &str) -> Result<()> {
        self.transfer(src, dst, Transfer::Move)
    }

    pub fn move_to_remote(&self, src: &str, dst: &str) -> Result<()> {
        self.transfer(src, dst, Transfer::Move)
    }
}
