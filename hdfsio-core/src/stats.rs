use serde::Serialize;

/// Size, modification time and kind of a filesystem entry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FileStatistics {
    /// Length in bytes (zero for directories on most backends)
    pub length: u64,
    /// Last modification time in nanoseconds since the epoch
    pub mtime_nanos: i64,
    pub is_directory: bool,
}

impl FileStatistics {
    /// Build from native values: a signed size and a modification time in seconds
    pub fn from_native(size: i64, mtime_secs: i64, is_directory: bool) -> Self {
        Self {
            length: u64::try_from(size).unwrap_or(0),
            mtime_nanos: mtime_secs.saturating_mul(1_000_000_000),
            is_directory,
        }
    }
}
