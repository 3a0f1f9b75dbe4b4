use std::ffi::{CStr, c_int};
use std::fmt;

use crate::{Error, Result};

/// Primary status codes reported by the sqlite library.
///
/// Extended result codes are folded onto their primary code, so every value
/// the native layer can return maps onto exactly one variant.
#[must_use]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ResultCode {
    Ok,
    Error,
    Internal,
    Perm,
    Abort,
    Busy,
    Locked,
    NoMem,
    ReadOnly,
    Interrupt,
    IoErr,
    Corrupt,
    NotFound,
    Full,
    CantOpen,
    Protocol,
    Empty,
    Schema,
    TooBig,
    Constraint,
    Mismatch,
    Misuse,
    NoLfs,
    Auth,
    Format,
    Range,
    NotADb,
    Notice,
    Warning,
    Row,
    Done,
}

impl ResultCode {
    pub fn from_raw(rc: c_int) -> Self {
        use libsqlite3_sys as ffi;

        match rc & 0xff {
            ffi::SQLITE_OK => ResultCode::Ok,
            ffi::SQLITE_INTERNAL => ResultCode::Internal,
            ffi::SQLITE_PERM => ResultCode::Perm,
            ffi::SQLITE_ABORT => ResultCode::Abort,
            ffi::SQLITE_BUSY => ResultCode::Busy,
            ffi::SQLITE_LOCKED => ResultCode::Locked,
            ffi::SQLITE_NOMEM => ResultCode::NoMem,
            ffi::SQLITE_READONLY => ResultCode::ReadOnly,
            ffi::SQLITE_INTERRUPT => ResultCode::Interrupt,
            ffi::SQLITE_IOERR => ResultCode::IoErr,
            ffi::SQLITE_CORRUPT => ResultCode::Corrupt,
            ffi::SQLITE_NOTFOUND => ResultCode::NotFound,
            ffi::SQLITE_FULL => ResultCode::Full,
            ffi::SQLITE_CANTOPEN => ResultCode::CantOpen,
            ffi::SQLITE_PROTOCOL => ResultCode::Protocol,
            ffi::SQLITE_EMPTY => ResultCode::Empty,
            ffi::SQLITE_SCHEMA => ResultCode::Schema,
            ffi::SQLITE_TOOBIG => ResultCode::TooBig,
            ffi::SQLITE_CONSTRAINT => ResultCode::Constraint,
            ffi::SQLITE_MISMATCH => ResultCode::Mismatch,
            ffi::SQLITE_MISUSE => ResultCode::Misuse,
            ffi::SQLITE_NOLFS => ResultCode::NoLfs,
            ffi::SQLITE_AUTH => ResultCode::Auth,
            ffi::SQLITE_FORMAT => ResultCode::Format,
            ffi::SQLITE_RANGE => ResultCode::Range,
            ffi::SQLITE_NOTADB => ResultCode::NotADb,
            ffi::SQLITE_NOTICE => ResultCode::Notice,
            ffi::SQLITE_WARNING => ResultCode::Warning,
            ffi::SQLITE_ROW => ResultCode::Row,
            ffi::SQLITE_DONE => ResultCode::Done,
            // SQLITE_ERROR and anything the library might add later
            _ => ResultCode::Error,
        }
    }

    pub fn as_raw(self) -> c_int {
        use libsqlite3_sys as ffi;

        match self {
            ResultCode::Ok => ffi::SQLITE_OK,
            ResultCode::Error => ffi::SQLITE_ERROR,
            ResultCode::Internal => ffi::SQLITE_INTERNAL,
            ResultCode::Perm => ffi::SQLITE_PERM,
            ResultCode::Abort => ffi::SQLITE_ABORT,
            ResultCode::Busy => ffi::SQLITE_BUSY,
            ResultCode::Locked => ffi::SQLITE_LOCKED,
            ResultCode::NoMem => ffi::SQLITE_NOMEM,
            ResultCode::ReadOnly => ffi::SQLITE_READONLY,
            ResultCode::Interrupt => ffi::SQLITE_INTERRUPT,
            ResultCode::IoErr => ffi::SQLITE_IOERR,
            ResultCode::Corrupt => ffi::SQLITE_CORRUPT,
            ResultCode::NotFound => ffi::SQLITE_NOTFOUND,
            ResultCode::Full => ffi::SQLITE_FULL,
            ResultCode::CantOpen => ffi::SQLITE_CANTOPEN,
            ResultCode::Protocol => ffi::SQLITE_PROTOCOL,
            ResultCode::Empty => ffi::SQLITE_EMPTY,
            ResultCode::Schema => ffi::SQLITE_SCHEMA,
            ResultCode::TooBig => ffi::SQLITE_TOOBIG,
            ResultCode::Constraint => ffi::SQLITE_CONSTRAINT,
            ResultCode::Mismatch => ffi::SQLITE_MISMATCH,
            ResultCode::Misuse => ffi::SQLITE_MISUSE,
            ResultCode::NoLfs => ffi::SQLITE_NOLFS,
            ResultCode::Auth => ffi::SQLITE_AUTH,
            ResultCode::Format => ffi::SQLITE_FORMAT,
            ResultCode::Range => ffi::SQLITE_RANGE,
            ResultCode::NotADb => ffi::SQLITE_NOTADB,
            ResultCode::Notice => ffi::SQLITE_NOTICE,
            ResultCode::Warning => ffi::SQLITE_WARNING,
            ResultCode::Row => ffi::SQLITE_ROW,
            ResultCode::Done => ffi::SQLITE_DONE,
        }
    }

    pub fn is_error(self) -> bool {
        is_error(self)
    }

    /// Converts an error code into an [`Error`], passes any other code through.
    pub fn check(self) -> Result<ResultCode> {
        if self.is_error() { Err(Error::from_code(self)) } else { Ok(self) }
    }

    /// The english description the sqlite library keeps for this code.
    pub fn description(self) -> &'static str {
        let msg = unsafe { libsqlite3_sys::sqlite3_errstr(self.as_raw()) };
        if msg.is_null() {
            return "unknown error";
        }

        unsafe { CStr::from_ptr(msg) }.to_str().unwrap_or("unknown error")
    }
}

/// Only `Ok`, `Row` and `Done` are considered successful outcomes.
pub fn is_error(code: ResultCode) -> bool {
    !matches!(code, ResultCode::Ok | ResultCode::Row | ResultCode::Done)
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl From<c_int> for ResultCode {
    fn from(rc: c_int) -> Self {
        ResultCode::from_raw(rc)
    }
}
