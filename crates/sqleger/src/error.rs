use std::ffi::CStr;

use thiserror::Error;

use crate::ResultCode;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error ({code:?}): {message}")]
    Result { code: ResultCode, message: String },
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid string: {0}")]
    InvalidString(#[from] std::ffi::NulError),
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
}

impl Error {
    /// Error carrying `code`, described by the library's generic text for it.
    pub fn from_code(code: ResultCode) -> Self {
        Error::Result {
            code,
            message: code.description().to_string(),
        }
    }

    /// Error carrying `code`, described by the most recent message of the connection.
    pub(crate) fn from_handle(code: ResultCode, db: *mut libsqlite3_sys::sqlite3) -> Self {
        if db.is_null() {
            return Error::from_code(code);
        }

        Error::Result {
            code,
            message: last_sqlite_error(db),
        }
    }

    /// The status code of the failure. Errors that originate on the rust side
    /// report the code the library would have used for them.
    pub fn code(&self) -> ResultCode {
        match self {
            Error::Result { code, .. } => *code,
            Error::InvalidArgument(_) | Error::InvalidString(_) => ResultCode::Misuse,
            Error::IOError(_) => ResultCode::IoErr,
        }
    }
}

pub(crate) fn last_sqlite_error(db: *mut libsqlite3_sys::sqlite3) -> String {
    let error_message = unsafe { libsqlite3_sys::sqlite3_errmsg(db) };
    if error_message.is_null() {
        return String::new();
    }

    let c_str = unsafe { CStr::from_ptr(error_message) };
    c_str.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn error_carries_code() {
        let err = Error::from_code(ResultCode::Busy);
        assert_eq!(err.code(), ResultCode::Busy);
        assert_eq!(err.to_string(), "Database error (Busy): database is locked");
    }

    #[test_log::test]
    fn rust_side_errors_have_a_code() {
        let nul = std::ffi::CString::new("a\0b").expect_err("interior nul");
        assert_eq!(Error::from(nul).code(), ResultCode::Misuse);

        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        assert_eq!(Error::from(io).code(), ResultCode::IoErr);
    }

    #[test_log::test]
    fn handle_error_without_handle_falls_back_to_code() {
        let err = Error::from_handle(ResultCode::CantOpen, std::ptr::null_mut());
        assert_eq!(err.code(), ResultCode::CantOpen);
        assert_eq!(err.to_string(), "Database error (CantOpen): unable to open database file");
    }
}
