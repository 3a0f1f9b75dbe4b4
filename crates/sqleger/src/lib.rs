//! Ownership layer on top of the sqlite3 C api exposed by libsqlite3-sys.
//!
//! Connections, prepared statements and values are wrapped in move-only types that
//! release their native handle exactly once. The native calls keep returning their
//! status as a [`ResultCode`]; the convenience constructors turn error codes into an
//! [`Error`].

#![warn(clippy::unwrap_used)]

mod connection;
mod error;
mod result;
mod runtimeconfiguration;
mod statement;
mod stringspan;
mod value;

use std::ffi::CStr;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
    Create,
    Memory,
}

pub use connection::{Connection, MEMORY};
pub use error::Error;
pub use result::{ResultCode, is_error};
pub use runtimeconfiguration::RuntimeConfiguration;
pub use statement::Statement;
pub use stringspan::StringSpan;
pub use value::{Datatype, Value, ValueAccess, ValueRef};

pub use libsqlite3_sys as ffi;

pub type Result<T = ()> = std::result::Result<T, Error>;

/// Version of the linked sqlite library, e.g. `3.49.1`.
pub fn sqlite_version() -> &'static str {
    let version = unsafe { libsqlite3_sys::sqlite3_libversion() };
    if version.is_null() {
        return "";
    }

    unsafe { CStr::from_ptr(version) }.to_str().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    #[test_log::test]
    fn version_is_reported() {
        let version = super::sqlite_version();
        assert!(version.starts_with("3."), "unexpected version {version}");
    }
}
