//! File handles
//!
//! Each handle owns exactly one native file and releases it once: on
//! `close`, or when dropped while still open.

use crate::router::Connection;
use hdfsio_core::{io_error, is_retryable, Result, Status};
use hdfsio_vfs::FileHandle;
use tracing::{trace, warn};

/// A file opened for positional reads
pub struct RandomAccessFile {
    name: String,
    conn: Connection,
    // Some until drop
    file: Option<FileHandle>,
}

impl RandomAccessFile {
    pub(crate) fn new(name: impl Into<String>, conn: Connection, file: FileHandle) -> Self {
        Self {
            name: name.into(),
            conn,
            file: Some(file),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self) -> Result<&FileHandle> {
        self.file
            .as_ref()
            .ok_or_else(|| Status::failed_precondition(format!("{}: file already closed", self.name)))
    }

    /// Read exactly `n` bytes at `offset` into the front of `scratch`
    ///
    /// Interrupted and would-block reads are retried. Reaching the end of
    /// the file before `n` bytes is an OUT_OF_RANGE error, never a short
    /// result.
    ///
    /// # Returns
    /// `&scratch[..n]`
    pub fn read<'a>(&self, offset: u64, n: usize, scratch: &'a mut [u8]) -> Result<&'a [u8]> {
        if n > scratch.len() {
            return Err(Status::invalid_argument(format!(
                "{}: cannot read {} bytes into a {} byte buffer",
                self.name,
                n,
                scratch.len()
            )));
        }
        let mut position = i64::try_from(offset).map_err(|_| {
            Status::invalid_argument(format!("{}: offset {} out of range", self.name, offset))
        })?;
        let file = self.handle()?;
        let client = self.conn.client();
        let fs = self.conn.handle();

        let mut filled = 0;
        while filled < n {
            match client.pread(fs, file, position, &mut scratch[filled..n]) {
                Ok(0) => return Err(Status::out_of_range("Read less bytes than requested")),
                Ok(r) => {
                    filled += r;
                    position += r as i64;
                    trace!(target: "hdfsio::file", name = %self.name, got = r, filled, n, "pread");
                }
                Err(errno) if is_retryable(errno) => {
                    trace!(target: "hdfsio::file", name = %self.name, errno, "pread retry");
                }
                Err(errno) => return Err(io_error(&self.name, errno)),
            }
        }
        Ok(&scratch[..n])
    }

    /// Bytes readable without blocking
    pub fn available(&self) -> Result<u64> {
        let file = self.handle()?;
        self.conn
            .client()
            .available(self.conn.handle(), file)
            .map(|n| n.max(0) as u64)
            .map_err(|errno| io_error(&self.name, errno))
    }
}

impl Drop for RandomAccessFile {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(errno) = self.conn.client().close_file(self.conn.handle(), file) {
                warn!(
                    target: "hdfsio::file",
                    name = %self.name,
                    status = %io_error(&self.name, errno),
                    "close on drop failed"
                );
            }
        }
    }
}

impl std::fmt::Debug for RandomAccessFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomAccessFile")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

struct OpenHandle {
    conn: Connection,
    file: FileHandle,
}

/// A file opened for writing or appending
///
/// `close` is explicit and idempotent. After it, every other operation
/// fails with FAILED_PRECONDITION.
pub struct WritableFile {
    name: String,
    // None once closed
    inner: Option<OpenHandle>,
}

impl WritableFile {
    pub(crate) fn new(name: impl Into<String>, conn: Connection, file: FileHandle) -> Self {
        Self {
            name: name.into(),
            inner: Some(OpenHandle { conn, file }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_none()
    }

    fn open(&self) -> Result<&OpenHandle> {
        self.inner
            .as_ref()
            .ok_or_else(|| Status::failed_precondition(format!("{}: file already closed", self.name)))
    }

    /// Write all of `data` with one native call
    ///
    /// A native write that accepts fewer bytes is DATA_LOSS; nothing is retried.
    pub fn append(&mut self, data: &[u8]) -> Result<()> {
        let handle = self.open()?;
        if i32::try_from(data.len()).is_err() {
            return Err(Status::invalid_argument(format!(
                "{}: {} bytes exceed a single native write",
                self.name,
                data.len()
            )));
        }
        let written = handle
            .conn
            .client()
            .write(handle.conn.handle(), &handle.file, data)
            .map_err(|errno| io_error(&self.name, errno))?;
        if written != data.len() {
            return Err(Status::data_loss(format!(
                "{}: wrote {} of {} bytes",
                self.name,
                written,
                data.len()
            )));
        }
        trace!(target: "hdfsio::file", name = %self.name, bytes = written, "append");
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        let handle = self.open()?;
        handle
            .conn
            .client()
            .flush(handle.conn.handle(), &handle.file)
            .map_err(|errno| io_error(&self.name, errno))
    }

    /// Flush and wait until the data is durable on the datanodes
    pub fn sync(&mut self) -> Result<()> {
        let handle = self.open()?;
        handle
            .conn
            .client()
            .hsync(handle.conn.handle(), &handle.file)
            .map_err(|errno| io_error(&self.name, errno))
    }

    /// Close the native file. The handle is released even if closing fails.
    ///
    /// Closing an already closed file is a no-op.
    pub fn close(&mut self) -> Result<()> {
        let Some(OpenHandle { conn, file }) = self.inner.take() else {
            return Ok(());
        };
        conn.client()
            .close_file(conn.handle(), file)
            .map_err(|errno| io_error(&self.name, errno))
    }
}

impl Drop for WritableFile {
    fn drop(&mut self) {
        if let Err(status) = self.close() {
            warn!(target: "hdfsio::file", name = %self.name, status = %status, "close on drop failed");
        }
    }
}

impl std::fmt::Debug for WritableFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WritableFile")
            .field("name", &self.name)
            .field("closed", &self.is_closed())
            .finish()
    }
}
