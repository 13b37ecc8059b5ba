//! OS error number classification
//!
//! `map_errno` is total: every `i32` maps to exactly one `Code`.
//! The classification is a lookup table, so platform differences only
//! change which rows exist.

use crate::status::{Code, Status};
use std::io;

// Ordered; the first matching row wins where two names share a value
// (EAGAIN/EWOULDBLOCK, ENOTSUP/EOPNOTSUPP on Linux).
static ERRNO_TABLE: &[(i32, Code)] = &[
    // bad arguments or malformed requests
    (libc::EINVAL, Code::InvalidArgument),
    (libc::ENAMETOOLONG, Code::InvalidArgument),
    (libc::E2BIG, Code::InvalidArgument),
    (libc::EDESTADDRREQ, Code::InvalidArgument),
    (libc::EDOM, Code::InvalidArgument),
    (libc::EFAULT, Code::InvalidArgument),
    (libc::EILSEQ, Code::InvalidArgument),
    (libc::ENOPROTOOPT, Code::InvalidArgument),
    (libc::ENOSTR, Code::InvalidArgument),
    (libc::ENOTSOCK, Code::InvalidArgument),
    (libc::ENOTTY, Code::InvalidArgument),
    (libc::EPROTOTYPE, Code::InvalidArgument),
    (libc::ESPIPE, Code::InvalidArgument),
    // timeouts
    (libc::ETIMEDOUT, Code::DeadlineExceeded),
    (libc::ETIME, Code::DeadlineExceeded),
    // missing entities
    (libc::ENODEV, Code::NotFound),
    (libc::ENOENT, Code::NotFound),
    (libc::ENXIO, Code::NotFound),
    (libc::ESRCH, Code::NotFound),
    // existing entities
    (libc::EEXIST, Code::AlreadyExists),
    (libc::EADDRNOTAVAIL, Code::AlreadyExists),
    (libc::EALREADY, Code::AlreadyExists),
    // permissions
    (libc::EPERM, Code::PermissionDenied),
    (libc::EACCES, Code::PermissionDenied),
    (libc::EROFS, Code::PermissionDenied),
    // state conflicts
    (libc::ENOTEMPTY, Code::FailedPrecondition),
    (libc::EISDIR, Code::FailedPrecondition),
    (libc::ENOTDIR, Code::FailedPrecondition),
    (libc::EADDRINUSE, Code::FailedPrecondition),
    (libc::EBADF, Code::FailedPrecondition),
    (libc::EBUSY, Code::FailedPrecondition),
    (libc::ECHILD, Code::FailedPrecondition),
    (libc::EISCONN, Code::FailedPrecondition),
    (libc::ENOTBLK, Code::FailedPrecondition),
    (libc::ENOTCONN, Code::FailedPrecondition),
    (libc::EPIPE, Code::FailedPrecondition),
    (libc::ESHUTDOWN, Code::FailedPrecondition),
    (libc::ETXTBSY, Code::FailedPrecondition),
    // space, quota and descriptor exhaustion
    (libc::ENOSPC, Code::ResourceExhausted),
    (libc::EDQUOT, Code::ResourceExhausted),
    (libc::EMFILE, Code::ResourceExhausted),
    (libc::EMLINK, Code::ResourceExhausted),
    (libc::ENFILE, Code::ResourceExhausted),
    (libc::ENOBUFS, Code::ResourceExhausted),
    (libc::ENODATA, Code::ResourceExhausted),
    (libc::ENOMEM, Code::ResourceExhausted),
    (libc::ENOSR, Code::ResourceExhausted),
    (libc::EUSERS, Code::ResourceExhausted),
    // overflow
    (libc::EFBIG, Code::OutOfRange),
    (libc::EOVERFLOW, Code::OutOfRange),
    (libc::ERANGE, Code::OutOfRange),
    // unsupported operations and protocol families
    (libc::ENOSYS, Code::Unimplemented),
    (libc::ENOTSUP, Code::Unimplemented),
    (libc::EAFNOSUPPORT, Code::Unimplemented),
    (libc::EPFNOSUPPORT, Code::Unimplemented),
    (libc::EPROTONOSUPPORT, Code::Unimplemented),
    (libc::ESOCKTNOSUPPORT, Code::Unimplemented),
    (libc::EXDEV, Code::Unimplemented),
    // connectivity and transient conditions
    (libc::EAGAIN, Code::Unavailable),
    (libc::ECONNREFUSED, Code::Unavailable),
    (libc::ECONNABORTED, Code::Unavailable),
    (libc::ECONNRESET, Code::Unavailable),
    (libc::EINTR, Code::Unavailable),
    (libc::EHOSTDOWN, Code::Unavailable),
    (libc::EHOSTUNREACH, Code::Unavailable),
    (libc::ENETDOWN, Code::Unavailable),
    (libc::ENETRESET, Code::Unavailable),
    (libc::ENETUNREACH, Code::Unavailable),
    (libc::ENOLCK, Code::Unavailable),
    (libc::ENOLINK, Code::Unavailable),
    // deadlocks and stale handles
    (libc::EDEADLK, Code::Aborted),
    (libc::ESTALE, Code::Aborted),
    (libc::ECANCELED, Code::Cancelled),
];

#[cfg(any(target_os = "linux", target_os = "android"))]
static PLATFORM_TABLE: &[(i32, Code)] = &[(libc::ENONET, Code::Unavailable)];

#[cfg(not(any(target_os = "linux", target_os = "android")))]
static PLATFORM_TABLE: &[(i32, Code)] = &[];

/// Classify an OS error number. `0` is OK, anything unlisted is UNKNOWN.
pub fn map_errno(errno: i32) -> Code {
    if errno == 0 {
        return Code::Ok;
    }
    ERRNO_TABLE
        .iter()
        .chain(PLATFORM_TABLE.iter())
        .find(|(n, _)| *n == errno)
        .map_or(Code::Unknown, |(_, code)| *code)
}

/// OS description of an error number
pub fn strerror(errno: i32) -> String {
    io::Error::from_raw_os_error(errno).to_string()
}

/// Build the error status for a failed native call
///
/// The message is `context`, plus the OS text when the kind is UNKNOWN.
/// An errno of `0` still produces an error (UNKNOWN), never OK.
pub fn io_error(context: impl AsRef<str>, errno: i32) -> Status {
    let context = context.as_ref();
    match map_errno(errno) {
        Code::Ok | Code::Unknown => {
            Status::unknown(format!("{}; {}", context, strerror(errno)))
        }
        code => Status::new(code, context),
    }
}

/// Whether a failed read should simply be issued again
pub fn is_retryable(errno: i32) -> bool {
    errno == libc::EINTR || errno == libc::EAGAIN || errno == libc::EWOULDBLOCK
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_ok() {
        assert_eq!(map_errno(0), Code::Ok);
    }

    #[test]
    fn test_representative_rows() {
        assert_eq!(map_errno(libc::EINVAL), Code::InvalidArgument);
        assert_eq!(map_errno(libc::ETIMEDOUT), Code::DeadlineExceeded);
        assert_eq!(map_errno(libc::ENOENT), Code::NotFound);
        assert_eq!(map_errno(libc::EEXIST), Code::AlreadyExists);
        assert_eq!(map_errno(libc::EACCES), Code::PermissionDenied);
        assert_eq!(map_errno(libc::ENOTEMPTY), Code::FailedPrecondition);
        assert_eq!(map_errno(libc::EPIPE), Code::FailedPrecondition);
        assert_eq!(map_errno(libc::ENOSPC), Code::ResourceExhausted);
        assert_eq!(map_errno(libc::EFBIG), Code::OutOfRange);
        assert_eq!(map_errno(libc::ENOSYS), Code::Unimplemented);
        assert_eq!(map_errno(libc::ECONNREFUSED), Code::Unavailable);
        assert_eq!(map_errno(libc::EDEADLK), Code::Aborted);
        assert_eq!(map_errno(libc::ECANCELED), Code::Cancelled);
    }

    #[test]
    fn test_aliases_agree() {
        assert_eq!(map_errno(libc::EWOULDBLOCK), Code::Unavailable);
        assert_eq!(map_errno(libc::EOPNOTSUPP), Code::Unimplemented);
    }

    #[test]
    fn test_unclassified_is_unknown() {
        assert_eq!(map_errno(libc::EIO), Code::Unknown);
        assert_eq!(map_errno(libc::ELOOP), Code::Unknown);
        assert_eq!(map_errno(-7), Code::Unknown);
        assert_eq!(map_errno(100_000), Code::Unknown);
    }

    #[test]
    fn test_total_over_small_range() {
        for n in -16..512 {
            let code = map_errno(n);
            assert!(!matches!(code, Code::Other(_)));
            assert_eq!(code == Code::Ok, n == 0);
            assert_eq!(map_errno(n), code);
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_platform_row() {
        assert_eq!(map_errno(libc::ENONET), Code::Unavailable);
    }

    #[test]
    fn test_io_error_classified() {
        let s = io_error("/data/part-0", libc::ENOENT);
        assert_eq!(s.code(), Code::NotFound);
        assert_eq!(s.message(), "/data/part-0");
    }

    #[test]
    fn test_io_error_unknown_appends_os_text() {
        let s = io_error("/data/part-0", libc::EIO);
        assert_eq!(s.code(), Code::Unknown);
        assert!(s.message().starts_with("/data/part-0; "));
        assert!(s.message().contains(&strerror(libc::EIO)));
    }

    #[test]
    fn test_io_error_zero_is_not_ok() {
        let s = io_error("ctx", 0);
        assert!(!s.is_ok());
        assert_eq!(s.code(), Code::Unknown);
    }

    #[test]
    fn test_retryable() {
        assert!(is_retryable(libc::EINTR));
        assert!(is_retryable(libc::EAGAIN));
        assert!(!is_retryable(libc::EIO));
        assert!(!is_retryable(0));
    }
}
