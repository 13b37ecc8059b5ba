//! In-memory HDFS backend

use crate::r#trait::{
    BuilderHandle, Errno, FileHandle, FileInfo, FsHandle, HdfsClient, NativeResult, ObjectKind,
    OpenMode,
};
use hdfsio_config::OpenConfig;
use std::collections::{BTreeMap, HashMap};
use std::ffi::CStr;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Native operation, for call counting and fault injection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    NewBuilder,
    Connect,
    Open,
    Close,
    Pread,
    Write,
    Flush,
    Sync,
    Available,
    Exists,
    List,
    Delete,
    Mkdir,
    Stat,
    Rename,
    Copy,
    Move,
}

const OP_COUNT: usize = 17;

const REMOTE_REPLICATION: i16 = 3;
const REMOTE_BLOCK_SIZE: i64 = 128 * 1024 * 1024;
const LOCAL_BLOCK_SIZE: i64 = 32 * 1024 * 1024;

// None is the local filesystem, Some(host) a namenode
type NamespaceKey = Option<String>;

#[derive(Debug, Clone)]
enum Node {
    File {
        data: Vec<u8>,
        mtime: i64,
        replication: i16,
        block_size: i64,
    },
    Dir {
        mtime: i64,
    },
}

/// One filesystem tree, keyed by normalized absolute path
#[derive(Debug)]
struct Namespace {
    nodes: BTreeMap<String, Node>,
}

impl Namespace {
    fn new(now: i64) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert("/".to_string(), Node::Dir { mtime: now });
        Self { nodes }
    }

    fn children(&self, dir: &str) -> Vec<(&String, &Node)> {
        let prefix = child_prefix(dir);
        self.nodes
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter(|(k, _)| k.len() > prefix.len() && !k[prefix.len()..].contains('/'))
            .collect()
    }

    /// `path` and everything below it
    fn subtree(&self, path: &str) -> Vec<(String, Node)> {
        let prefix = child_prefix(path);
        let mut entries: Vec<(String, Node)> = self
            .nodes
            .get(path)
            .map(|n| (path.to_string(), n.clone()))
            .into_iter()
            .collect();
        entries.extend(
            self.nodes
                .range(prefix.clone()..)
                .take_while(|(k, _)| k.starts_with(&prefix))
                .filter(|(k, _)| k.len() > prefix.len())
                .map(|(k, n)| (k.clone(), n.clone())),
        );
        entries
    }

    fn remove_subtree(&mut self, path: &str) {
        for (key, _) in self.subtree(path) {
            self.nodes.remove(&key);
        }
    }

    /// Create `path` and its ancestors as directories
    fn ensure_dirs(&mut self, path: &str, now: i64) -> NativeResult<()> {
        let mut current = String::new();
        for part in path.split('/').filter(|p| !p.is_empty()) {
            current.push('/');
            current.push_str(part);
            match self.nodes.get(&current) {
                Some(Node::File { .. }) => return Err(libc::ENOTDIR),
                Some(Node::Dir { .. }) => {}
                None => {
                    self.nodes.insert(current.clone(), Node::Dir { mtime: now });
                }
            }
        }
        Ok(())
    }
}

fn child_prefix(dir: &str) -> String {
    if dir == "/" {
        "/".to_string()
    } else {
        format!("{}/", dir)
    }
}

fn parent(path: &str) -> Option<&str> {
    match path.rsplit_once('/') {
        Some(("", "")) | None => None,
        Some(("", _)) => Some("/"),
        Some((dir, _)) => Some(dir),
    }
}

fn last_component(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn join(dir: &str, name: &str) -> String {
    format!("{}{}", child_prefix(dir), name)
}

/// Collapse repeated and trailing slashes; relative paths resolve against `/`
fn normalize(path: &CStr) -> NativeResult<String> {
    let path = path.to_str().map_err(|_| libc::EINVAL)?;
    if path.is_empty() {
        return Err(libc::EINVAL);
    }
    let parts: Vec<&str> = path
        .split('/')
        .filter(|p| !p.is_empty() && *p != ".")
        .collect();
    Ok(format!("/{}", parts.join("/")))
}

fn qualified_name(key: &NamespaceKey, path: &str) -> String {
    match key {
        Some(host) => format!("hdfs://{}{}", host, path),
        None => format!("file:{}", path),
    }
}

fn file_info(key: &NamespaceKey, path: &str, node: &Node) -> FileInfo {
    let (kind, size, mtime, replication, block_size, permissions) = match node {
        Node::File {
            data,
            mtime,
            replication,
            block_size,
        } => (
            ObjectKind::File,
            data.len() as i64,
            *mtime,
            *replication,
            *block_size,
            0o644,
        ),
        Node::Dir { mtime } => (ObjectKind::Directory, 0, *mtime, 0, 0, 0o755),
    };
    FileInfo {
        kind,
        name: qualified_name(key, path),
        last_mod: mtime,
        size,
        replication,
        block_size,
        owner: "hdfsio".to_string(),
        group: "supergroup".to_string(),
        permissions,
        last_access: mtime,
    }
}

#[derive(Debug, Default)]
struct Builder {
    name_node: Option<String>,
    ticket_cache: Option<String>,
}

#[derive(Debug)]
struct Connection {
    namespace: NamespaceKey,
    ticket_cache: Option<String>,
}

#[derive(Debug)]
struct OpenFile {
    namespace: NamespaceKey,
    path: String,
    mode: OpenMode,
}

#[derive(Debug, Default)]
struct State {
    namespaces: HashMap<NamespaceKey, Namespace>,
    builders: HashMap<usize, Builder>,
    connections: HashMap<usize, Connection>,
    files: HashMap<usize, OpenFile>,
}

impl State {
    fn namespace_key(&self, fs: FsHandle) -> NativeResult<NamespaceKey> {
        self.connections
            .get(&fs.as_raw())
            .map(|c| c.namespace.clone())
            .ok_or(libc::EBADF)
    }

    fn namespace(&self, fs: FsHandle) -> NativeResult<(NamespaceKey, &Namespace)> {
        let key = self.namespace_key(fs)?;
        let ns = self.namespaces.get(&key).ok_or(libc::EBADF)?;
        Ok((key, ns))
    }

    fn namespace_mut(&mut self, fs: FsHandle) -> NativeResult<&mut Namespace> {
        let key = self.namespace_key(fs)?;
        self.namespaces.get_mut(&key).ok_or(libc::EBADF)
    }

    fn open_file(&self, file: &FileHandle) -> NativeResult<&OpenFile> {
        self.files.get(&file.as_raw()).ok_or(libc::EBADF)
    }

    fn node_mut(&mut self, key: &NamespaceKey, path: &str) -> NativeResult<&mut Node> {
        self.namespaces
            .get_mut(key)
            .and_then(|ns| ns.nodes.get_mut(path))
            .ok_or(libc::ENOENT)
    }
}

#[derive(Debug)]
struct Fault {
    errno: Errno,
    remaining: usize,
}

#[derive(Debug, Default)]
struct Inner {
    state: RwLock<State>,
    calls: [AtomicUsize; OP_COUNT],
    faults: Mutex<HashMap<Op, Fault>>,
    next_id: AtomicUsize,
    clock: AtomicI64,
    // zero means unlimited
    max_read_chunk: AtomicUsize,
    max_write_chunk: AtomicUsize,
}

/// An in-memory implementation of the native client.
///
/// Keeps one tree per namenode plus one for the local filesystem and
/// reproduces the libhdfs behaviours the upper layers depend on: an empty
/// directory lists as a null result with errno 0, handles are consumed on
/// close, and failures carry POSIX error numbers.
///
/// Clones share state, so a test can keep a clone for inspection while the
/// loader owns another.
///
/// # Example
/// ```
/// use hdfsio_vfs::{MemoryClient, Op};
///
/// let client = MemoryClient::new();
/// client.put_file(Some("nn1:8020"), "/data/a.bin", b"abc");
/// assert_eq!(client.read_file(Some("nn1:8020"), "/data/a.bin").unwrap(), b"abc");
/// assert_eq!(client.calls(Op::Open), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryClient {
    inner: Arc<Inner>,
}

impl MemoryClient {
    /// Create a new client. Namespaces appear on first connect or `put_*`.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, State> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn faults(&self) -> MutexGuard<'_, HashMap<Op, Fault>> {
        self.inner.faults.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn now(&self) -> i64 {
        self.inner.clock.load(Ordering::SeqCst)
    }

    fn next_id(&self) -> usize {
        self.inner.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Count the call and consume a pending fault, if any
    fn begin(&self, op: Op) -> NativeResult<()> {
        self.inner.calls[op as usize].fetch_add(1, Ordering::SeqCst);
        let mut faults = self.faults();
        let Some(fault) = faults.get_mut(&op) else {
            return Ok(());
        };
        let errno = fault.errno;
        fault.remaining -= 1;
        if fault.remaining == 0 {
            faults.remove(&op);
        }
        Err(errno)
    }

    /// Make the next `times` calls of `op` fail with `errno`
    ///
    /// `Exists` reports a missing path instead of an errno.
    pub fn inject(&self, op: Op, errno: Errno, times: usize) {
        if times == 0 {
            self.faults().remove(&op);
        } else {
            self.faults().insert(
                op,
                Fault {
                    errno,
                    remaining: times,
                },
            );
        }
    }

    pub fn clear_faults(&self) {
        self.faults().clear();
    }

    /// Number of calls of `op` so far, failed ones included
    pub fn calls(&self, op: Op) -> usize {
        self.inner.calls[op as usize].load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.inner
            .calls
            .iter()
            .map(|c| c.load(Ordering::SeqCst))
            .sum()
    }

    pub fn reset_calls(&self) {
        for counter in &self.inner.calls {
            counter.store(0, Ordering::SeqCst);
        }
    }

    /// Modification time stamped on later mutations, in seconds
    pub fn set_clock(&self, secs: i64) {
        self.inner.clock.store(secs, Ordering::SeqCst);
    }

    /// Cap the bytes returned by one `pread`
    pub fn set_max_read_chunk(&self, limit: Option<usize>) {
        self.inner
            .max_read_chunk
            .store(limit.unwrap_or(0), Ordering::SeqCst);
    }

    /// Cap the bytes accepted by one `write`
    pub fn set_max_write_chunk(&self, limit: Option<usize>) {
        self.inner
            .max_write_chunk
            .store(limit.unwrap_or(0), Ordering::SeqCst);
    }

    /// Store a file directly, creating its parents. Not counted as a call.
    pub fn put_file(&self, name_node: Option<&str>, path: &str, data: &[u8]) {
        let now = self.now();
        let key = name_node.map(str::to_string);
        let mut state = self.write_state();
        let ns = state
            .namespaces
            .entry(key.clone())
            .or_insert_with(|| Namespace::new(now));
        let path = format!("/{}", path.trim_matches('/'));
        if let Some(dir) = parent(&path) {
            // a file in the way leaves the tree untouched
            if ns.ensure_dirs(dir, now).is_err() {
                return;
            }
        }
        ns.nodes.insert(
            path,
            Node::File {
                data: data.to_vec(),
                mtime: now,
                replication: default_replication(&key),
                block_size: default_block_size(&key),
            },
        );
    }

    /// Create a directory directly. Not counted as a call.
    pub fn put_dir(&self, name_node: Option<&str>, path: &str) {
        let now = self.now();
        let mut state = self.write_state();
        let ns = state
            .namespaces
            .entry(name_node.map(str::to_string))
            .or_insert_with(|| Namespace::new(now));
        let _ = ns.ensure_dirs(path, now);
    }

    /// Contents of a file, or `None` if it is missing or a directory
    pub fn read_file(&self, name_node: Option<&str>, path: &str) -> Option<Vec<u8>> {
        let state = self.read();
        let ns = state.namespaces.get(&name_node.map(str::to_string))?;
        match ns.nodes.get(&format!("/{}", path.trim_matches('/')))? {
            Node::File { data, .. } => Some(data.clone()),
            Node::Dir { .. } => None,
        }
    }

    pub fn is_dir(&self, name_node: Option<&str>, path: &str) -> bool {
        let state = self.read();
        let path = format!("/{}", path.trim_matches('/'));
        state
            .namespaces
            .get(&name_node.map(str::to_string))
            .and_then(|ns| ns.nodes.get(&path))
            .is_some_and(|n| matches!(n, Node::Dir { .. }))
    }

    pub fn open_files(&self) -> usize {
        self.read().files.len()
    }

    /// Namenode a connection was made to: `Some(None)` is local, `None` an unknown handle
    pub fn name_node(&self, fs: FsHandle) -> Option<Option<String>> {
        self.read()
            .connections
            .get(&fs.as_raw())
            .map(|c| c.namespace.clone())
    }

    /// Ticket cache a connection was made with
    pub fn ticket_cache(&self, fs: FsHandle) -> Option<String> {
        self.read()
            .connections
            .get(&fs.as_raw())
            .and_then(|c| c.ticket_cache.clone())
    }

    fn transfer(
        &self,
        src_fs: FsHandle,
        src: &CStr,
        dst_fs: FsHandle,
        dst: &CStr,
        delete_source: bool,
    ) -> NativeResult<()> {
        let now = self.now();
        let src = normalize(src)?;
        let dst = normalize(dst)?;
        let mut state = self.write_state();
        let src_key = state.namespace_key(src_fs)?;
        let dst_key = state.namespace_key(dst_fs)?;

        let (_, src_ns) = state.namespace(src_fs)?;
        let entries = src_ns.subtree(&src);
        if entries.is_empty() {
            return Err(libc::ENOENT);
        }

        let dst_ns = state.namespace_mut(dst_fs)?;
        let target = match dst_ns.nodes.get(&dst) {
            Some(Node::Dir { .. }) => join(&dst, last_component(&src)),
            _ => dst.clone(),
        };
        let same_tree = src_key == dst_key;
        if same_tree && (target == src || target.starts_with(&child_prefix(&src))) {
            return Err(libc::EINVAL);
        }
        if let Some(dir) = parent(&target) {
            dst_ns.ensure_dirs(dir, now)?;
        }
        dst_ns.remove_subtree(&target);
        for (key, node) in entries {
            let node = match node {
                Node::File {
                    data,
                    replication,
                    block_size,
                    ..
                } => Node::File {
                    data,
                    mtime: now,
                    replication,
                    block_size,
                },
                Node::Dir { .. } => Node::Dir { mtime: now },
            };
            dst_ns
                .nodes
                .insert(format!("{}{}", target, &key[src.len()..]), node);
        }

        if delete_source {
            state.namespace_mut(src_fs)?.remove_subtree(&src);
        }
        Ok(())
    }
}

fn default_replication(key: &NamespaceKey) -> i16 {
    if key.is_some() {
        REMOTE_REPLICATION
    } else {
        1
    }
}

fn default_block_size(key: &NamespaceKey) -> i64 {
    if key.is_some() {
        REMOTE_BLOCK_SIZE
    } else {
        LOCAL_BLOCK_SIZE
    }
}

impl HdfsClient for MemoryClient {
    fn new_builder(&self) -> NativeResult<BuilderHandle> {
        self.begin(Op::NewBuilder)?;
        let id = self.next_id();
        self.write_state().builders.insert(id, Builder::default());
        Ok(BuilderHandle::from_raw(id))
    }

    fn builder_set_name_node(&self, builder: &BuilderHandle, name_node: Option<&CStr>) {
        if let Some(b) = self.write_state().builders.get_mut(&builder.as_raw()) {
            b.name_node = name_node.map(|nn| nn.to_string_lossy().into_owned());
        }
    }

    fn builder_set_kerb_ticket_cache_path(&self, builder: &BuilderHandle, path: &CStr) {
        if let Some(b) = self.write_state().builders.get_mut(&builder.as_raw()) {
            b.ticket_cache = Some(path.to_string_lossy().into_owned());
        }
    }

    fn builder_connect(&self, builder: BuilderHandle) -> NativeResult<FsHandle> {
        // the builder is freed on every path, as libhdfs does
        let pending = self.write_state().builders.remove(&builder.as_raw());
        self.begin(Op::Connect)?;
        let pending = pending.ok_or(libc::EINVAL)?;
        let now = self.now();
        let id = self.next_id();
        let mut state = self.write_state();
        state
            .namespaces
            .entry(pending.name_node.clone())
            .or_insert_with(|| Namespace::new(now));
        state.connections.insert(
            id,
            Connection {
                namespace: pending.name_node,
                ticket_cache: pending.ticket_cache,
            },
        );
        Ok(FsHandle::from_raw(id))
    }

    fn open_file(
        &self,
        fs: FsHandle,
        path: &CStr,
        mode: OpenMode,
        params: &OpenConfig,
    ) -> NativeResult<FileHandle> {
        self.begin(Op::Open)?;
        let path = normalize(path)?;
        let now = self.now();
        let mut state = self.write_state();
        let key = state.namespace_key(fs)?;
        let ns = state.namespace_mut(fs)?;
        let is_dir = ns
            .nodes
            .get(&path)
            .map(|n| matches!(n, Node::Dir { .. }));
        match (mode, is_dir) {
            (_, Some(true)) => return Err(libc::EISDIR),
            (OpenMode::Read | OpenMode::Append, None) => return Err(libc::ENOENT),
            (OpenMode::Read | OpenMode::Append, Some(false)) => {}
            (OpenMode::Write, _) => {
                if let Some(dir) = parent(&path) {
                    ns.ensure_dirs(dir, now)?;
                }
                let replication = if params.replication > 0 {
                    params.replication
                } else {
                    default_replication(&key)
                };
                let block_size = if params.block_size > 0 {
                    i64::from(params.block_size)
                } else {
                    default_block_size(&key)
                };
                ns.nodes.insert(
                    path.clone(),
                    Node::File {
                        data: Vec::new(),
                        mtime: now,
                        replication,
                        block_size,
                    },
                );
            }
        }
        let id = self.next_id();
        state.files.insert(
            id,
            OpenFile {
                namespace: key,
                path,
                mode,
            },
        );
        Ok(FileHandle::from_raw(id))
    }

    fn close_file(&self, _fs: FsHandle, file: FileHandle) -> NativeResult<()> {
        // the handle is released even when the close reports an error
        let released = self.write_state().files.remove(&file.as_raw());
        self.begin(Op::Close)?;
        released.map(drop).ok_or(libc::EBADF)
    }

    fn pread(
        &self,
        _fs: FsHandle,
        file: &FileHandle,
        position: i64,
        buf: &mut [u8],
    ) -> NativeResult<usize> {
        self.begin(Op::Pread)?;
        let start = usize::try_from(position).map_err(|_| libc::EINVAL)?;
        let state = self.read();
        let open = state.open_file(file)?;
        if open.mode != OpenMode::Read {
            return Err(libc::EBADF);
        }
        let data = match state
            .namespaces
            .get(&open.namespace)
            .and_then(|ns| ns.nodes.get(&open.path))
        {
            Some(Node::File { data, .. }) => data,
            _ => return Err(libc::ENOENT),
        };
        let start = start.min(data.len());
        let mut n = buf.len().min(data.len() - start);
        let limit = self.inner.max_read_chunk.load(Ordering::SeqCst);
        if limit > 0 {
            n = n.min(limit);
        }
        buf[..n].copy_from_slice(&data[start..start + n]);
        Ok(n)
    }

    fn write(&self, _fs: FsHandle, file: &FileHandle, data: &[u8]) -> NativeResult<usize> {
        self.begin(Op::Write)?;
        let now = self.now();
        let mut state = self.write_state();
        let open = state.open_file(file)?;
        if open.mode == OpenMode::Read {
            return Err(libc::EBADF);
        }
        let (key, path) = (open.namespace.clone(), open.path.clone());
        let mut n = data.len();
        let limit = self.inner.max_write_chunk.load(Ordering::SeqCst);
        if limit > 0 {
            n = n.min(limit);
        }
        match state.node_mut(&key, &path)? {
            Node::File {
                data: contents,
                mtime,
                ..
            } => {
                contents.extend_from_slice(&data[..n]);
                *mtime = now;
                Ok(n)
            }
            Node::Dir { .. } => Err(libc::EISDIR),
        }
    }

    fn flush(&self, _fs: FsHandle, file: &FileHandle) -> NativeResult<()> {
        self.begin(Op::Flush)?;
        self.read().open_file(file).map(drop)
    }

    fn hsync(&self, _fs: FsHandle, file: &FileHandle) -> NativeResult<()> {
        self.begin(Op::Sync)?;
        self.read().open_file(file).map(drop)
    }

    fn available(&self, _fs: FsHandle, file: &FileHandle) -> NativeResult<i32> {
        self.begin(Op::Available)?;
        let state = self.read();
        let open = state.open_file(file)?;
        if open.mode != OpenMode::Read {
            return Err(libc::EBADF);
        }
        match state
            .namespaces
            .get(&open.namespace)
            .and_then(|ns| ns.nodes.get(&open.path))
        {
            Some(Node::File { data, .. }) => Ok(i32::try_from(data.len()).unwrap_or(i32::MAX)),
            _ => Err(libc::ENOENT),
        }
    }

    fn exists(&self, fs: FsHandle, path: &CStr) -> bool {
        if self.begin(Op::Exists).is_err() {
            return false;
        }
        let Ok(path) = normalize(path) else {
            return false;
        };
        self.read()
            .namespace(fs)
            .is_ok_and(|(_, ns)| ns.nodes.contains_key(&path))
    }

    fn list_directory(&self, fs: FsHandle, path: &CStr) -> NativeResult<Vec<FileInfo>> {
        self.begin(Op::List)?;
        let path = normalize(path)?;
        let state = self.read();
        let (key, ns) = state.namespace(fs)?;
        match ns.nodes.get(&path) {
            None => Err(libc::ENOENT),
            Some(node @ Node::File { .. }) => Ok(vec![file_info(&key, &path, node)]),
            Some(Node::Dir { .. }) => {
                let children = ns.children(&path);
                if children.is_empty() {
                    // libhdfs: null listing, errno untouched
                    return Err(0);
                }
                Ok(children
                    .into_iter()
                    .map(|(p, n)| file_info(&key, p, n))
                    .collect())
            }
        }
    }

    fn delete(&self, fs: FsHandle, path: &CStr, recursive: bool) -> NativeResult<()> {
        self.begin(Op::Delete)?;
        let path = normalize(path)?;
        if path == "/" {
            return Err(libc::EPERM);
        }
        let mut state = self.write_state();
        let ns = state.namespace_mut(fs)?;
        match ns.nodes.get(&path) {
            None => return Err(libc::ENOENT),
            Some(Node::Dir { .. }) if !recursive && !ns.children(&path).is_empty() => {
                return Err(libc::ENOTEMPTY)
            }
            Some(_) => {}
        }
        ns.remove_subtree(&path);
        Ok(())
    }

    fn create_directory(&self, fs: FsHandle, path: &CStr) -> NativeResult<()> {
        self.begin(Op::Mkdir)?;
        let path = normalize(path)?;
        let now = self.now();
        let mut state = self.write_state();
        let ns = state.namespace_mut(fs)?;
        if let Some(Node::File { .. }) = ns.nodes.get(&path) {
            return Err(libc::EEXIST);
        }
        ns.ensure_dirs(&path, now)
    }

    fn get_path_info(&self, fs: FsHandle, path: &CStr) -> NativeResult<FileInfo> {
        self.begin(Op::Stat)?;
        let path = normalize(path)?;
        let state = self.read();
        let (key, ns) = state.namespace(fs)?;
        let node = ns.nodes.get(&path).ok_or(libc::ENOENT)?;
        Ok(file_info(&key, &path, node))
    }

    fn rename(&self, fs: FsHandle, from: &CStr, to: &CStr) -> NativeResult<()> {
        self.begin(Op::Rename)?;
        let from = normalize(from)?;
        let to = normalize(to)?;
        let mut state = self.write_state();
        let ns = state.namespace_mut(fs)?;
        if !ns.nodes.contains_key(&from) {
            return Err(libc::ENOENT);
        }
        if ns.nodes.contains_key(&to) {
            return Err(libc::EEXIST);
        }
        if from == "/" || to.starts_with(&child_prefix(&from)) {
            return Err(libc::EINVAL);
        }
        match parent(&to).and_then(|dir| ns.nodes.get(dir)) {
            Some(Node::Dir { .. }) => {}
            Some(Node::File { .. }) => return Err(libc::ENOTDIR),
            None => return Err(libc::ENOENT),
        }
        for (key, node) in ns.subtree(&from) {
            ns.nodes.remove(&key);
            ns.nodes.insert(format!("{}{}", to, &key[from.len()..]), node);
        }
        Ok(())
    }

    fn copy(
        &self,
        src_fs: FsHandle,
        src: &CStr,
        dst_fs: FsHandle,
        dst: &CStr,
    ) -> NativeResult<()> {
        self.begin(Op::Copy)?;
        self.transfer(src_fs, src, dst_fs, dst, false)
    }

    fn move_path(
        &self,
        src_fs: FsHandle,
        src: &CStr,
        dst_fs: FsHandle,
        dst: &CStr,
    ) -> NativeResult<()> {
        self.begin(Op::Move)?;
        self.transfer(src_fs, src, dst_fs, dst, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;
    use std::thread;

    fn c(path: &str) -> CString {
        CString::new(path).unwrap()
    }

    fn connect(client: &MemoryClient, name_node: Option<&str>) -> FsHandle {
        let builder = client.new_builder().unwrap();
        let nn = name_node.map(c);
        client.builder_set_name_node(&builder, nn.as_deref());
        client.builder_connect(builder).unwrap()
    }

    fn write_file(client: &MemoryClient, fs: FsHandle, path: &str, data: &[u8]) {
        let file = client
            .open_file(fs, &c(path), OpenMode::Write, &OpenConfig::default())
            .unwrap();
        assert_eq!(client.write(fs, &file, data).unwrap(), data.len());
        client.close_file(fs, file).unwrap();
    }

    #[test]
    fn test_new_client_has_root() {
        let client = MemoryClient::new();
        let fs = connect(&client, None);
        assert!(client.exists(fs, &c("/")));
        assert!(!client.exists(fs, &c("/anything")));
    }

    #[test]
    fn test_namespaces_are_separate() {
        let client = MemoryClient::new();
        let local = connect(&client, None);
        let remote = connect(&client, Some("nn1:8020"));
        write_file(&client, remote, "/a", b"remote");

        assert!(client.exists(remote, &c("/a")));
        assert!(!client.exists(local, &c("/a")));
        assert_eq!(client.name_node(remote), Some(Some("nn1:8020".to_string())));
        assert_eq!(client.name_node(local), Some(None));
    }

    #[test]
    fn test_ticket_cache_recorded() {
        let client = MemoryClient::new();
        let builder = client.new_builder().unwrap();
        client.builder_set_name_node(&builder, Some(&c("nn")));
        client.builder_set_kerb_ticket_cache_path(&builder, &c("/tmp/krb5cc"));
        let fs = client.builder_connect(builder).unwrap();
        assert_eq!(client.ticket_cache(fs).as_deref(), Some("/tmp/krb5cc"));
    }

    #[test]
    fn test_write_then_pread() {
        let client = MemoryClient::new();
        let fs = connect(&client, None);
        write_file(&client, fs, "/dir/file.bin", b"hello world");
        assert!(client.is_dir(None, "/dir"));

        let file = client
            .open_file(fs, &c("/dir/file.bin"), OpenMode::Read, &OpenConfig::default())
            .unwrap();
        let mut buf = [0u8; 5];
        assert_eq!(client.pread(fs, &file, 6, &mut buf).unwrap(), 5);
        assert_eq!(&buf, b"world");
        assert_eq!(client.pread(fs, &file, 11, &mut buf).unwrap(), 0);
        assert_eq!(client.available(fs, &file).unwrap(), 11);
        client.close_file(fs, file).unwrap();
        assert_eq!(client.open_files(), 0);
    }

    #[test]
    fn test_read_chunk_limit() {
        let client = MemoryClient::new();
        client.put_file(None, "/f", b"abcdef");
        client.set_max_read_chunk(Some(2));
        let fs = connect(&client, None);
        let file = client
            .open_file(fs, &c("/f"), OpenMode::Read, &OpenConfig::default())
            .unwrap();
        let mut buf = [0u8; 6];
        assert_eq!(client.pread(fs, &file, 0, &mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"ab");
    }

    #[test]
    fn test_open_errors() {
        let client = MemoryClient::new();
        let fs = connect(&client, None);
        let params = OpenConfig::default();
        assert_eq!(
            client.open_file(fs, &c("/missing"), OpenMode::Read, &params),
            Err(libc::ENOENT)
        );
        assert_eq!(
            client.open_file(fs, &c("/missing"), OpenMode::Append, &params),
            Err(libc::ENOENT)
        );
        assert_eq!(
            client.open_file(fs, &c("/"), OpenMode::Write, &params),
            Err(libc::EISDIR)
        );
        client.put_file(None, "/blocker", b"x");
        assert_eq!(
            client.open_file(fs, &c("/blocker/child"), OpenMode::Write, &params),
            Err(libc::ENOTDIR)
        );
    }

    #[test]
    fn test_append_keeps_contents() {
        let client = MemoryClient::new();
        client.put_file(None, "/log", b"one,");
        let fs = connect(&client, None);
        let file = client
            .open_file(fs, &c("/log"), OpenMode::Append, &OpenConfig::default())
            .unwrap();
        client.write(fs, &file, b"two").unwrap();
        client.close_file(fs, file).unwrap();
        assert_eq!(client.read_file(None, "/log").unwrap(), b"one,two");
    }

    #[test]
    fn test_open_params_recorded() {
        let client = MemoryClient::new();
        let fs = connect(&client, Some("nn"));
        let params = OpenConfig {
            buffer_size: 4096,
            replication: 2,
            block_size: 1024,
        };
        let file = client.open_file(fs, &c("/p"), OpenMode::Write, &params).unwrap();
        client.close_file(fs, file).unwrap();
        let info = client.get_path_info(fs, &c("/p")).unwrap();
        assert_eq!(info.replication, 2);
        assert_eq!(info.block_size, 1024);
        assert_eq!(info.name, "hdfs://nn/p");
    }

    #[test]
    fn test_empty_directory_lists_as_null() {
        let client = MemoryClient::new();
        client.put_dir(None, "/empty");
        let fs = connect(&client, None);
        assert_eq!(client.list_directory(fs, &c("/empty")), Err(0));
        assert_eq!(client.list_directory(fs, &c("/nope")), Err(libc::ENOENT));
    }

    #[test]
    fn test_list_directory_direct_children() {
        let client = MemoryClient::new();
        client.put_file(None, "/d/a", b"1");
        client.put_file(None, "/d/sub/b", b"2");
        client.put_file(None, "/dx", b"3");
        let fs = connect(&client, None);
        let names: Vec<String> = client
            .list_directory(fs, &c("/d"))
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["file:/d/a", "file:/d/sub"]);
    }

    #[test]
    fn test_delete_semantics() {
        let client = MemoryClient::new();
        client.put_file(None, "/d/a", b"1");
        let fs = connect(&client, None);
        assert_eq!(client.delete(fs, &c("/d"), false), Err(libc::ENOTEMPTY));
        client.delete(fs, &c("/d"), true).unwrap();
        assert!(!client.exists(fs, &c("/d/a")));
        assert_eq!(client.delete(fs, &c("/d"), true), Err(libc::ENOENT));
        assert_eq!(client.delete(fs, &c("/"), true), Err(libc::EPERM));
    }

    #[test]
    fn test_create_directory() {
        let client = MemoryClient::new();
        let fs = connect(&client, None);
        client.create_directory(fs, &c("/a/b/c")).unwrap();
        assert!(client.is_dir(None, "/a/b"));
        client.create_directory(fs, &c("/a/b")).unwrap();
        client.put_file(None, "/f", b"");
        assert_eq!(client.create_directory(fs, &c("/f")), Err(libc::EEXIST));
    }

    #[test]
    fn test_rename_subtree() {
        let client = MemoryClient::new();
        client.put_file(None, "/src/x", b"x");
        client.put_dir(None, "/dst");
        let fs = connect(&client, None);
        client.rename(fs, &c("/src"), &c("/dst/moved")).unwrap();
        assert_eq!(client.read_file(None, "/dst/moved/x").unwrap(), b"x");
        assert!(!client.exists(fs, &c("/src")));
    }

    #[test]
    fn test_rename_errors() {
        let client = MemoryClient::new();
        client.put_file(None, "/a", b"a");
        client.put_file(None, "/b", b"b");
        let fs = connect(&client, None);
        assert_eq!(client.rename(fs, &c("/a"), &c("/b")), Err(libc::EEXIST));
        assert_eq!(client.rename(fs, &c("/zz"), &c("/c")), Err(libc::ENOENT));
        assert_eq!(client.rename(fs, &c("/a"), &c("/no/c")), Err(libc::ENOENT));
    }

    #[test]
    fn test_copy_across_namespaces() {
        let client = MemoryClient::new();
        client.put_file(Some("nn"), "/data/part-0", b"remote bytes");
        client.put_dir(None, "/tmp");
        let remote = connect(&client, Some("nn"));
        let local = connect(&client, None);

        client
            .copy(remote, &c("/data/part-0"), local, &c("/tmp"))
            .unwrap();
        assert_eq!(client.read_file(None, "/tmp/part-0").unwrap(), b"remote bytes");
        assert!(client.exists(remote, &c("/data/part-0")));

        client
            .move_path(local, &c("/tmp/part-0"), remote, &c("/data/copy"))
            .unwrap();
        assert_eq!(client.read_file(Some("nn"), "/data/copy").unwrap(), b"remote bytes");
        assert!(!client.exists(local, &c("/tmp/part-0")));
    }

    #[test]
    fn test_copy_into_itself_rejected() {
        let client = MemoryClient::new();
        client.put_file(None, "/d/a", b"a");
        let fs = connect(&client, None);
        assert_eq!(client.copy(fs, &c("/d"), fs, &c("/d/inner")), Err(libc::EINVAL));
    }

    #[test]
    fn test_fault_injection() {
        let client = MemoryClient::new();
        client.inject(Op::Connect, libc::ECONNREFUSED, 2);
        let builder = client.new_builder().unwrap();
        assert_eq!(client.builder_connect(builder), Err(libc::ECONNREFUSED));
        let builder = client.new_builder().unwrap();
        assert_eq!(client.builder_connect(builder), Err(libc::ECONNREFUSED));
        let builder = client.new_builder().unwrap();
        assert!(client.builder_connect(builder).is_ok());
        assert_eq!(client.calls(Op::Connect), 3);
        assert_eq!(client.calls(Op::NewBuilder), 3);
    }

    #[test]
    fn test_clear_faults_and_reset_calls() {
        let client = MemoryClient::new();
        let fs = connect(&client, None);
        client.inject(Op::Mkdir, libc::EACCES, 5);
        client.inject(Op::Stat, libc::EIO, 5);
        assert_eq!(client.create_directory(fs, &c("/d")), Err(libc::EACCES));

        client.clear_faults();
        client.create_directory(fs, &c("/d")).unwrap();
        assert!(client.get_path_info(fs, &c("/d")).is_ok());
        assert_eq!(client.calls(Op::Mkdir), 2);

        client.reset_calls();
        assert_eq!(client.total_calls(), 0);
        assert!(client.exists(fs, &c("/d")));
        assert_eq!(client.calls(Op::Exists), 1);
    }

    #[test]
    fn test_injected_exists_reports_missing() {
        let client = MemoryClient::new();
        let fs = connect(&client, None);
        client.inject(Op::Exists, libc::EIO, 1);
        assert!(!client.exists(fs, &c("/")));
        assert!(client.exists(fs, &c("/")));
    }

    #[test]
    fn test_close_releases_on_failure() {
        let client = MemoryClient::new();
        let fs = connect(&client, None);
        let file = client
            .open_file(fs, &c("/f"), OpenMode::Write, &OpenConfig::default())
            .unwrap();
        client.inject(Op::Close, libc::EIO, 1);
        assert_eq!(client.close_file(fs, file), Err(libc::EIO));
        assert_eq!(client.open_files(), 0);
    }

    #[test]
    fn test_stale_handles() {
        let client = MemoryClient::new();
        let fs = connect(&client, None);
        let ghost = FileHandle::from_raw(999);
        assert_eq!(client.flush(fs, &ghost), Err(libc::EBADF));
        assert_eq!(
            client.list_directory(FsHandle::from_raw(999), &c("/")),
            Err(libc::EBADF)
        );
    }

    #[test]
    fn test_clock_stamps_mtime() {
        let client = MemoryClient::new();
        client.set_clock(1_234);
        let fs = connect(&client, None);
        write_file(&client, fs, "/t", b"x");
        let info = client.get_path_info(fs, &c("/t")).unwrap();
        assert_eq!(info.last_mod, 1_234);
        assert_eq!(info.kind, ObjectKind::File);
    }

    #[test]
    fn test_clone_shares_state() {
        let client = MemoryClient::new();
        let clone = client.clone();
        client.put_file(None, "/shared", b"data");
        assert_eq!(clone.read_file(None, "/shared").unwrap(), b"data");
    }

    #[test]
    fn test_concurrent_writers() {
        let client = MemoryClient::new();
        let fs = connect(&client, None);
        let mut handles = vec![];

        for i in 0..8 {
            let client = client.clone();
            handles.push(thread::spawn(move || {
                let path = format!("/t/{}", i);
                for _ in 0..10 {
                    write_file(&client, fs, &path, path.as_bytes());
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(client.list_directory(fs, &c("/t")).unwrap().len(), 8);
        assert_eq!(client.open_files(), 0);
    }
}
