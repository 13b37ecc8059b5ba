//! hdfsio Core - status taxonomy and address parsing (pure logic, no IO)
//!
//! Contains the `Status` result type, the errno classification table,
//! the URI parser and the file statistics record.
//! Nothing in here touches the native client or the filesystem.

pub mod errno;
pub mod stats;
pub mod status;
pub mod uri;

// Re-export common types
pub use errno::{io_error, is_retryable, map_errno};
pub use stats::FileStatistics;
pub use status::{Code, Result, Status};
pub use uri::{basename, dirname, parse_uri, split_path, ParsedUri};
