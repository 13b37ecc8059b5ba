//! `libhdfs.so` bound at runtime
//!
//! The library is opened with `dlopen` and every entry point is resolved by
//! name into a typed function pointer. A missing symbol fails the whole load.

use crate::error::LoadError;
use crate::r#trait::{
    BuilderHandle, Errno, FileHandle, FileInfo, FsHandle, HdfsClient, NativeResult, ObjectKind,
    OpenMode,
};
use hdfsio_config::{LibraryConfig, OpenConfig};
use libloading::Library;
use std::ffi::{c_char, c_int, c_short, c_void, CStr};
use std::io;
use std::path::Path;
use std::ptr;
use tracing::debug;

type RawFs = *mut c_void;
type RawFile = *mut c_void;
type RawBuilder = *mut c_void;

/// `hdfsFileInfo` from `hdfs.h`
#[repr(C)]
struct RawFileInfo {
    m_kind: c_int,
    m_name: *mut c_char,
    m_last_mod: libc::time_t,
    m_size: i64,
    m_replication: c_short,
    m_block_size: i64,
    m_owner: *mut c_char,
    m_group: *mut c_char,
    m_permissions: c_short,
    m_last_access: libc::time_t,
}

const KIND_DIRECTORY: c_int = b'D' as c_int;

struct Symbols {
    builder_connect: unsafe extern "C" fn(RawBuilder) -> RawFs,
    new_builder: unsafe extern "C" fn() -> RawBuilder,
    builder_set_name_node: unsafe extern "C" fn(RawBuilder, *const c_char),
    builder_set_kerb_ticket_cache_path: unsafe extern "C" fn(RawBuilder, *const c_char),
    close_file: unsafe extern "C" fn(RawFs, RawFile) -> c_int,
    pread: unsafe extern "C" fn(RawFs, RawFile, i64, *mut c_void, i32) -> i32,
    write: unsafe extern "C" fn(RawFs, RawFile, *const c_void, i32) -> i32,
    flush: unsafe extern "C" fn(RawFs, RawFile) -> c_int,
    hsync: unsafe extern "C" fn(RawFs, RawFile) -> c_int,
    open_file: unsafe extern "C" fn(RawFs, *const c_char, c_int, c_int, c_short, i32) -> RawFile,
    exists: unsafe extern "C" fn(RawFs, *const c_char) -> c_int,
    list_directory: unsafe extern "C" fn(RawFs, *const c_char, *mut c_int) -> *mut RawFileInfo,
    free_file_info: unsafe extern "C" fn(*mut RawFileInfo, c_int),
    delete: unsafe extern "C" fn(RawFs, *const c_char, c_int) -> c_int,
    create_directory: unsafe extern "C" fn(RawFs, *const c_char) -> c_int,
    get_path_info: unsafe extern "C" fn(RawFs, *const c_char) -> *mut RawFileInfo,
    rename: unsafe extern "C" fn(RawFs, *const c_char, *const c_char) -> c_int,
    available: unsafe extern "C" fn(RawFs, RawFile) -> c_int,
    copy: unsafe extern "C" fn(RawFs, *const c_char, RawFs, *const c_char) -> c_int,
    move_path: unsafe extern "C" fn(RawFs, *const c_char, RawFs, *const c_char) -> c_int,
}

/// Resolve `name` and reinterpret it as `T`
///
/// # Safety
/// `T` must be the exact function pointer type of the exported symbol.
unsafe fn bind<T: Copy>(library: &Library, name: &'static str) -> Result<T, LoadError> {
    let symbol = library
        .get::<T>(name.as_bytes())
        .map_err(|source| LoadError::Symbol { name, source })?;
    Ok(*symbol)
}

macro_rules! bind_symbols {
    ($library:expr; $($field:ident = $name:literal),* $(,)?) => {
        Symbols {
            $($field: bind($library, $name)?,)*
        }
    };
}

impl Symbols {
    /// # Safety
    /// `library` must be a libhdfs build matching the declared signatures.
    unsafe fn bind_all(library: &Library) -> Result<Self, LoadError> {
        Ok(bind_symbols! { library;
            builder_connect = "hdfsBuilderConnect",
            new_builder = "hdfsNewBuilder",
            builder_set_name_node = "hdfsBuilderSetNameNode",
            builder_set_kerb_ticket_cache_path = "hdfsBuilderSetKerbTicketCachePath",
            close_file = "hdfsCloseFile",
            pread = "hdfsPread",
            write = "hdfsWrite",
            flush = "hdfsFlush",
            hsync = "hdfsHSync",
            open_file = "hdfsOpenFile",
            exists = "hdfsExists",
            list_directory = "hdfsListDirectory",
            free_file_info = "hdfsFreeFileInfo",
            delete = "hdfsDelete",
            create_directory = "hdfsCreateDirectory",
            get_path_info = "hdfsGetPathInfo",
            rename = "hdfsRename",
            available = "hdfsAvailable",
            copy = "hdfsCopy",
            move_path = "hdfsMove",
        })
    }
}

fn last_errno() -> Errno {
    io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

fn check(rc: c_int) -> NativeResult<()> {
    if rc == 0 {
        Ok(())
    } else {
        Err(last_errno())
    }
}

fn raw_fs(fs: FsHandle) -> RawFs {
    fs.as_raw() as RawFs
}

fn raw_file(file: &FileHandle) -> RawFile {
    file.as_raw() as RawFile
}

/// # Safety
/// `ptr` is null or a valid NUL-terminated string.
unsafe fn owned_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

/// # Safety
/// Every string field of `raw` is null or valid.
unsafe fn file_info(raw: &RawFileInfo) -> FileInfo {
    FileInfo {
        kind: if raw.m_kind == KIND_DIRECTORY {
            ObjectKind::Directory
        } else {
            ObjectKind::File
        },
        name: owned_string(raw.m_name),
        last_mod: raw.m_last_mod as i64,
        size: raw.m_size,
        replication: raw.m_replication,
        block_size: raw.m_block_size,
        owner: owned_string(raw.m_owner),
        group: owned_string(raw.m_group),
        permissions: raw.m_permissions,
        last_access: raw.m_last_access as i64,
    }
}

/// The native client, loaded from `$HADOOP_HDFS_HOME/lib/native/libhdfs.so`
pub struct LibHdfs {
    syms: Symbols,
    // keeps the code behind `syms` mapped
    #[allow(dead_code)]
    library: Library,
}

impl LibHdfs {
    /// Load the library named by `config`
    pub fn load(config: &LibraryConfig) -> Result<Self, LoadError> {
        let path = config.library_path().ok_or_else(LoadError::missing_home)?;
        Self::open(&path)
    }

    /// Load the library at an explicit path
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        // SAFETY: opening libhdfs runs no initialisers with preconditions on us
        let library = unsafe { Library::new(path) }.map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        // SAFETY: the declared signatures follow hdfs.h
        let syms = unsafe { Symbols::bind_all(&library)? };
        debug!(target: "hdfsio::loader", path = %path.display(), "bound libhdfs entry points");
        Ok(Self { syms, library })
    }
}

impl std::fmt::Debug for LibHdfs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibHdfs").finish_non_exhaustive()
    }
}

impl HdfsClient for LibHdfs {
    fn new_builder(&self) -> NativeResult<BuilderHandle> {
        let raw = unsafe { (self.syms.new_builder)() };
        if raw.is_null() {
            return Err(last_errno());
        }
        Ok(BuilderHandle::from_raw(raw as usize))
    }

    fn builder_set_name_node(&self, builder: &BuilderHandle, name_node: Option<&CStr>) {
        let nn = name_node.map_or(ptr::null(), CStr::as_ptr);
        unsafe { (self.syms.builder_set_name_node)(builder.as_raw() as RawBuilder, nn) }
    }

    fn builder_set_kerb_ticket_cache_path(&self, builder: &BuilderHandle, path: &CStr) {
        unsafe {
            (self.syms.builder_set_kerb_ticket_cache_path)(
                builder.as_raw() as RawBuilder,
                path.as_ptr(),
            )
        }
    }

    fn builder_connect(&self, builder: BuilderHandle) -> NativeResult<FsHandle> {
        // hdfsBuilderConnect frees the builder whether or not it succeeds
        let raw = unsafe { (self.syms.builder_connect)(builder.as_raw() as RawBuilder) };
        if raw.is_null() {
            return Err(last_errno());
        }
        Ok(FsHandle::from_raw(raw as usize))
    }

    fn open_file(
        &self,
        fs: FsHandle,
        path: &CStr,
        mode: OpenMode,
        params: &OpenConfig,
    ) -> NativeResult<FileHandle> {
        let raw = unsafe {
            (self.syms.open_file)(
                raw_fs(fs),
                path.as_ptr(),
                mode.flags(),
                params.buffer_size,
                params.replication,
                params.block_size,
            )
        };
        if raw.is_null() {
            return Err(last_errno());
        }
        Ok(FileHandle::from_raw(raw as usize))
    }

    fn close_file(&self, fs: FsHandle, file: FileHandle) -> NativeResult<()> {
        check(unsafe { (self.syms.close_file)(raw_fs(fs), raw_file(&file)) })
    }

    fn pread(
        &self,
        fs: FsHandle,
        file: &FileHandle,
        position: i64,
        buf: &mut [u8],
    ) -> NativeResult<usize> {
        // longer buffers are filled over several calls by the caller's loop
        let len = buf.len().min(i32::MAX as usize) as i32;
        let r = unsafe {
            (self.syms.pread)(
                raw_fs(fs),
                raw_file(file),
                position,
                buf.as_mut_ptr().cast(),
                len,
            )
        };
        if r < 0 {
            return Err(last_errno());
        }
        Ok(r as usize)
    }

    fn write(&self, fs: FsHandle, file: &FileHandle, data: &[u8]) -> NativeResult<usize> {
        let len = i32::try_from(data.len()).map_err(|_| libc::EINVAL)?;
        let r = unsafe { (self.syms.write)(raw_fs(fs), raw_file(file), data.as_ptr().cast(), len) };
        if r < 0 {
            return Err(last_errno());
        }
        Ok(r as usize)
    }

    fn flush(&self, fs: FsHandle, file: &FileHandle) -> NativeResult<()> {
        check(unsafe { (self.syms.flush)(raw_fs(fs), raw_file(file)) })
    }

    fn hsync(&self, fs: FsHandle, file: &FileHandle) -> NativeResult<()> {
        check(unsafe { (self.syms.hsync)(raw_fs(fs), raw_file(file)) })
    }

    fn available(&self, fs: FsHandle, file: &FileHandle) -> NativeResult<i32> {
        let r = unsafe { (self.syms.available)(raw_fs(fs), raw_file(file)) };
        if r < 0 {
            return Err(last_errno());
        }
        Ok(r)
    }

    fn exists(&self, fs: FsHandle, path: &CStr) -> bool {
        unsafe { (self.syms.exists)(raw_fs(fs), path.as_ptr()) == 0 }
    }

    fn list_directory(&self, fs: FsHandle, path: &CStr) -> NativeResult<Vec<FileInfo>> {
        let mut entries: c_int = 0;
        let raw = unsafe { (self.syms.list_directory)(raw_fs(fs), path.as_ptr(), &mut entries) };
        if raw.is_null() {
            return Err(last_errno());
        }
        let count = usize::try_from(entries).unwrap_or(0);
        let infos = unsafe {
            let listing = std::slice::from_raw_parts(raw, count);
            let infos = listing.iter().map(|info| file_info(info)).collect();
            (self.syms.free_file_info)(raw, entries);
            infos
        };
        Ok(infos)
    }

    fn delete(&self, fs: FsHandle, path: &CStr, recursive: bool) -> NativeResult<()> {
        check(unsafe { (self.syms.delete)(raw_fs(fs), path.as_ptr(), c_int::from(recursive)) })
    }

    fn create_directory(&self, fs: FsHandle, path: &CStr) -> NativeResult<()> {
        check(unsafe { (self.syms.create_directory)(raw_fs(fs), path.as_ptr()) })
    }

    fn get_path_info(&self, fs: FsHandle, path: &CStr) -> NativeResult<FileInfo> {
        let raw = unsafe { (self.syms.get_path_info)(raw_fs(fs), path.as_ptr()) };
        if raw.is_null() {
            return Err(last_errno());
        }
        let info = unsafe {
            let info = file_info(&*raw);
            (self.syms.free_file_info)(raw, 1);
            info
        };
        Ok(info)
    }

    fn rename(&self, fs: FsHandle, from: &CStr, to: &CStr) -> NativeResult<()> {
        check(unsafe { (self.syms.rename)(raw_fs(fs), from.as_ptr(), to.as_ptr()) })
    }

    fn copy(
        &self,
        src_fs: FsHandle,
        src: &CStr,
        dst_fs: FsHandle,
        dst: &CStr,
    ) -> NativeResult<()> {
        check(unsafe {
            (self.syms.copy)(raw_fs(src_fs), src.as_ptr(), raw_fs(dst_fs), dst.as_ptr())
        })
    }

    fn move_path(
        &self,
        src_fs: FsHandle,
        src: &CStr,
        dst_fs: FsHandle,
        dst: &CStr,
    ) -> NativeResult<()> {
        check(unsafe {
            (self.syms.move_path)(raw_fs(src_fs), src.as_ptr(), raw_fs(dst_fs), dst.as_ptr())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hdfsio_core::{Code, Status};
    use std::ffi::CString;
    use std::path::PathBuf;

    #[test]
    fn test_load_without_home() {
        let err = LibHdfs::load(&LibraryConfig::default()).unwrap_err();
        assert!(matches!(err, LoadError::MissingEnv { var: "HADOOP_HDFS_HOME" }));
    }

    #[test]
    fn test_load_missing_library() {
        let config = LibraryConfig {
            hdfs_home: Some(PathBuf::from("/nonexistent/hdfsio-test-home")),
            ticket_cache_path: None,
        };
        let err = LibHdfs::load(&config).unwrap_err();
        match &err {
            LoadError::Open { path, .. } => {
                assert!(path.ends_with("lib/native/libhdfs.so"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        let status: Status = err.into();
        assert_eq!(status.code(), Code::NotFound);
        assert!(!status.message().is_empty());
    }

    #[test]
    fn test_file_info_conversion() {
        let name = CString::new("hdfs://nn:8020/data/part-0").unwrap();
        let owner = CString::new("hdfs").unwrap();
        let raw = RawFileInfo {
            m_kind: KIND_DIRECTORY,
            m_name: name.as_ptr() as *mut c_char,
            m_last_mod: 1_700_000_000,
            m_size: 0,
            m_replication: 3,
            m_block_size: 134_217_728,
            m_owner: owner.as_ptr() as *mut c_char,
            m_group: ptr::null_mut(),
            m_permissions: 0o755,
            m_last_access: 1_700_000_100,
        };
        let info = unsafe { file_info(&raw) };
        assert!(info.is_directory());
        assert_eq!(info.name, "hdfs://nn:8020/data/part-0");
        assert_eq!(info.owner, "hdfs");
        assert_eq!(info.group, "");
        assert_eq!(info.replication, 3);
        assert_eq!(info.last_mod, 1_700_000_000);
    }

    #[test]
    fn test_file_kind() {
        let raw = RawFileInfo {
            m_kind: b'F' as c_int,
            m_name: ptr::null_mut(),
            m_last_mod: 0,
            m_size: 12,
            m_replication: 1,
            m_block_size: 0,
            m_owner: ptr::null_mut(),
            m_group: ptr::null_mut(),
            m_permissions: 0o644,
            m_last_access: 0,
        };
        let info = unsafe { file_info(&raw) };
        assert_eq!(info.kind, ObjectKind::File);
        assert_eq!(info.size, 12);
        assert_eq!(info.name, "");
    }
}
