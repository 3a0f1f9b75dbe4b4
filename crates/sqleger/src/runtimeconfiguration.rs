use std::ffi::{CStr, c_char, c_int, c_void};

use crate::{Error, Result, ResultCode};

/// Process wide sqlite settings.
///
/// The library only accepts most of these before it is initialized, so `apply` has to
/// run before the first connection is opened. Applying them later fails with `Misuse`.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfiguration {
    /// Forward the diagnostics sqlite reports through its error log to the `log` crate.
    pub native_logging: bool,
    /// Interpret `file:` filenames as URIs.
    pub uri_filenames: bool,
}

impl RuntimeConfiguration {
    pub fn apply(&self) -> Result<()> {
        setup_logging(self.native_logging)?;

        let rc = unsafe { libsqlite3_sys::sqlite3_config(libsqlite3_sys::SQLITE_CONFIG_URI, c_int::from(self.uri_filenames)) };
        check_config_rc(rc)
    }
}

fn setup_logging(enabled: bool) -> Result<()> {
    let rc = if enabled {
        let callback: unsafe extern "C" fn(*mut c_void, c_int, *const c_char) = log_callback;
        unsafe { libsqlite3_sys::sqlite3_config(libsqlite3_sys::SQLITE_CONFIG_LOG, callback, std::ptr::null_mut::<c_void>()) }
    } else {
        unsafe {
            libsqlite3_sys::sqlite3_config(
                libsqlite3_sys::SQLITE_CONFIG_LOG,
                std::ptr::null_mut::<c_void>(),
                std::ptr::null_mut::<c_void>(),
            )
        }
    };

    check_config_rc(rc)
}

fn check_config_rc(rc: c_int) -> Result<()> {
    let rc = ResultCode::from_raw(rc);
    if rc.is_error() {
        log::warn!("Sqlite configuration rejected: {rc}");
        return Err(Error::from_code(rc));
    }

    Ok(())
}

fn native_log_level(code: c_int) -> log::Level {
    match ResultCode::from_raw(code) {
        ResultCode::Ok | ResultCode::Row | ResultCode::Done => log::Level::Debug,
        ResultCode::Notice | ResultCode::Schema => log::Level::Info,
        ResultCode::Warning => log::Level::Warn,
        _ => log::Level::Error,
    }
}

unsafe extern "C" fn log_callback(_arg: *mut c_void, code: c_int, msg: *const c_char) {
    let msg = if msg.is_null() {
        std::borrow::Cow::Borrowed("")
    } else {
        unsafe { CStr::from_ptr(msg) }.to_string_lossy()
    };

    log::log!(native_log_level(code), "SQLite: {msg}");
}
