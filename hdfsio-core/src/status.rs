//! Status: the success/failure value returned by every hdfsio operation
//!
//! A `Status` is either OK (no message) or an error kind plus a message.
//! Error state lives behind an `Arc`, so cloning a status is a pointer copy.

use std::fmt;
use std::sync::Arc;

/// Result alias used across the workspace. An `Err` never holds an OK status.
pub type Result<T> = std::result::Result<T, Status>;

/// Error kind, numbered like the canonical gRPC codes
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Code {
    Ok,
    Cancelled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
    /// A code outside the enumerated set
    Other(i32),
}

impl Code {
    pub fn as_i32(&self) -> i32 {
        match self {
            Code::Ok => 0,
            Code::Cancelled => 1,
            Code::Unknown => 2,
            Code::InvalidArgument => 3,
            Code::DeadlineExceeded => 4,
            Code::NotFound => 5,
            Code::AlreadyExists => 6,
            Code::PermissionDenied => 7,
            Code::ResourceExhausted => 8,
            Code::FailedPrecondition => 9,
            Code::Aborted => 10,
            Code::OutOfRange => 11,
            Code::Unimplemented => 12,
            Code::Internal => 13,
            Code::Unavailable => 14,
            Code::DataLoss => 15,
            Code::Unauthenticated => 16,
            Code::Other(n) => *n,
        }
    }

    pub fn from_i32(n: i32) -> Code {
        match n {
            0 => Code::Ok,
            1 => Code::Cancelled,
            2 => Code::Unknown,
            3 => Code::InvalidArgument,
            4 => Code::DeadlineExceeded,
            5 => Code::NotFound,
            6 => Code::AlreadyExists,
            7 => Code::PermissionDenied,
            8 => Code::ResourceExhausted,
            9 => Code::FailedPrecondition,
            10 => Code::Aborted,
            11 => Code::OutOfRange,
            12 => Code::Unimplemented,
            13 => Code::Internal,
            14 => Code::Unavailable,
            15 => Code::DataLoss,
            16 => Code::Unauthenticated,
            other => Code::Other(other),
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Code::Ok => "OK",
            Code::Cancelled => "Cancelled",
            Code::Unknown => "Unknown",
            Code::InvalidArgument => "Invalid argument",
            Code::DeadlineExceeded => "Deadline exceeded",
            Code::NotFound => "Not found",
            Code::AlreadyExists => "Already exists",
            Code::PermissionDenied => "Permission denied",
            Code::Unauthenticated => "Unauthenticated",
            Code::ResourceExhausted => "Resource exhausted",
            Code::FailedPrecondition => "Failed precondition",
            Code::Aborted => "Aborted",
            Code::OutOfRange => "Out of range",
            Code::Unimplemented => "Unimplemented",
            Code::Internal => "Internal",
            Code::Unavailable => "Unavailable",
            Code::DataLoss => "Data loss",
            Code::Other(n) => return write!(f, "Unknown code({})", n),
        };
        f.write_str(name)
    }
}

#[derive(Debug, PartialEq, Eq)]
struct State {
    code: Code,
    message: String,
}

/// Operation outcome: OK, or an error kind with a message
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Status {
    // None means OK
    state: Option<Arc<State>>,
}

macro_rules! status_constructors {
    ($($(#[$doc:meta])* $fn_name:ident => $code:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            pub fn $fn_name(message: impl Into<String>) -> Status {
                Status::new(Code::$code, message)
            }
        )*
    };
}

impl Status {
    /// The OK status
    pub fn ok() -> Status {
        Status { state: None }
    }

    /// Build a status. `Code::Ok` always yields the message-less OK value.
    ///
    /// `Code::Other(n)` is folded onto the named code when `n` has one, and
    /// an empty message on an error becomes the code's name, so only OK
    /// carries no message.
    pub fn new(code: Code, message: impl Into<String>) -> Status {
        let code = Code::from_i32(code.as_i32());
        if code == Code::Ok {
            return Status::ok();
        }
        let mut message = message.into();
        if message.is_empty() {
            message = code.to_string();
        }
        Status {
            state: Some(Arc::new(State { code, message })),
        }
    }

    status_constructors! {
        cancelled => Cancelled,
        unknown => Unknown,
        invalid_argument => InvalidArgument,
        deadline_exceeded => DeadlineExceeded,
        not_found => NotFound,
        already_exists => AlreadyExists,
        permission_denied => PermissionDenied,
        unauthenticated => Unauthenticated,
        resource_exhausted => ResourceExhausted,
        failed_precondition => FailedPrecondition,
        aborted => Aborted,
        out_of_range => OutOfRange,
        unimplemented => Unimplemented,
        internal => Internal,
        unavailable => Unavailable,
        data_loss => DataLoss,
    }

    pub fn is_ok(&self) -> bool {
        self.state.is_none()
    }

    pub fn code(&self) -> Code {
        self.state.as_ref().map_or(Code::Ok, |s| s.code)
    }

    /// Error message; empty for OK
    pub fn message(&self) -> &str {
        self.state.as_ref().map_or("", |s| s.message.as_str())
    }

    /// Record `other` if this status is still OK. The first error wins.
    pub fn update(&mut self, other: &Status) {
        if self.is_ok() {
            *self = other.clone();
        }
    }

    /// `Ok(())` for OK, `Err(self)` otherwise
    pub fn into_result(self) -> Result<()> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.state {
            None => f.write_str("OK"),
            Some(state) => write!(f, "{}: {}", state.code, state.message),
        }
    }
}

impl fmt::Debug for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Status({})", self)
    }
}

impl std::error::Error for Status {}
