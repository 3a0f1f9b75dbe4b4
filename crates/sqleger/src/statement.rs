use std::ffi::{CStr, c_char, c_int, c_uchar, c_void};
use std::fmt;
use std::ptr::{self, NonNull};

use libsqlite3_sys::{sqlite3_stmt, sqlite3_uint64};

use crate::{Connection, Error, Result, ResultCode, StringSpan, ValueRef, error};

/// Owning wrapper of a prepared statement handle.
///
/// The handle is finalized when the statement is dropped. `Statement::default()` is the
/// empty statement: binding, stepping or resetting it returns [`ResultCode::Misuse`]
/// without touching the library. Use `std::mem::take` to move the handle out of a
/// statement and leave an empty one behind.
///
/// A statement may outlive the [`Connection`] it was prepared on, the native connection
/// is released once the connection is closed and its last statement finalized.
#[derive(Default)]
pub struct Statement {
    stmt: Option<NonNull<sqlite3_stmt>>,
}

impl Statement {
    /// Prepares the first statement of `sql` on `conn`, failures are returned as [`Error`].
    pub fn new<'a>(conn: &Connection, sql: impl Into<StringSpan<'a>>) -> Result<Self> {
        let sql = sql.into();
        let mut stmt = Statement::default();
        let rc = conn.prepare_v2(sql, &mut stmt);
        if rc.is_error() {
            let err = Error::from_handle(rc, conn.c_ptr());
            log::error!("Failed to prepare '{sql}': {err}");
            return Err(err);
        }

        if stmt.is_empty() {
            return Err(Error::InvalidArgument(format!("No sql statement in '{sql}'")));
        }

        Ok(stmt)
    }

    /// Takes ownership of `stmt`, a null pointer gives an empty statement.
    ///
    /// # Safety
    /// `stmt` must be null or a prepared statement that nothing else finalizes.
    pub unsafe fn from_raw(stmt: *mut sqlite3_stmt) -> Self {
        Self { stmt: NonNull::new(stmt) }
    }

    pub fn c_ptr(&self) -> *mut sqlite3_stmt {
        self.stmt.map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    /// Hands the raw handle to the caller without finalizing it.
    pub fn take_c_ptr(&mut self) -> *mut sqlite3_stmt {
        self.stmt.take().map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    pub fn is_empty(&self) -> bool {
        self.stmt.is_none()
    }

    pub fn bind_int(&mut self, index: c_int, value: c_int) -> ResultCode {
        self.call("bind_int", |stmt| unsafe { libsqlite3_sys::sqlite3_bind_int(stmt, index, value) })
    }

    pub fn bind_int64(&mut self, index: c_int, value: i64) -> ResultCode {
        self.call("bind_int64", |stmt| unsafe { libsqlite3_sys::sqlite3_bind_int64(stmt, index, value) })
    }

    pub fn bind_double(&mut self, index: c_int, value: f64) -> ResultCode {
        self.call("bind_double", |stmt| unsafe { libsqlite3_sys::sqlite3_bind_double(stmt, index, value) })
    }

    pub fn bind_null(&mut self, index: c_int) -> ResultCode {
        self.call("bind_null", |stmt| unsafe { libsqlite3_sys::sqlite3_bind_null(stmt, index) })
    }

    /// Binds the raw bytes of `data`, sqlite keeps its own copy.
    pub fn bind_blob<T: bytemuck::NoUninit>(&mut self, index: c_int, data: &[T]) -> ResultCode {
        let bytes: &[u8] = bytemuck::cast_slice(data);
        self.call("bind_blob", |stmt| unsafe {
            libsqlite3_sys::sqlite3_bind_blob64(
                stmt,
                index,
                bytes.as_ptr().cast::<c_void>(),
                bytes.len() as sqlite3_uint64,
                libsqlite3_sys::SQLITE_TRANSIENT(),
            )
        })
    }

    /// Binds `data` without copying, sqlite reads it while the statement runs.
    pub fn bind_blob_static(&mut self, index: c_int, data: &'static [u8]) -> ResultCode {
        self.call("bind_blob", |stmt| unsafe {
            libsqlite3_sys::sqlite3_bind_blob64(
                stmt,
                index,
                data.as_ptr().cast::<c_void>(),
                data.len() as sqlite3_uint64,
                libsqlite3_sys::SQLITE_STATIC(),
            )
        })
    }

    /// Binds UTF-8 text, sqlite keeps its own copy.
    pub fn bind_text<'a>(&mut self, index: c_int, text: impl Into<StringSpan<'a>>) -> ResultCode {
        let text = text.into();
        self.call("bind_text", |stmt| unsafe {
            libsqlite3_sys::sqlite3_bind_text64(
                stmt,
                index,
                text.as_ptr(),
                text.len() as sqlite3_uint64,
                libsqlite3_sys::SQLITE_TRANSIENT(),
                libsqlite3_sys::SQLITE_UTF8 as c_uchar,
            )
        })
    }

    /// Binds UTF-8 text without copying, sqlite reads it while the statement runs.
    pub fn bind_text_static(&mut self, index: c_int, text: StringSpan<'static>) -> ResultCode {
        self.call("bind_text", |stmt| unsafe {
            libsqlite3_sys::sqlite3_bind_text64(
                stmt,
                index,
                text.as_ptr(),
                text.len() as sqlite3_uint64,
                libsqlite3_sys::SQLITE_STATIC(),
                libsqlite3_sys::SQLITE_UTF8 as c_uchar,
            )
        })
    }

    /// Sets every parameter back to NULL.
    pub fn clear_bindings(&mut self) -> ResultCode {
        self.call("clear_bindings", |stmt| unsafe { libsqlite3_sys::sqlite3_clear_bindings(stmt) })
    }

    pub fn bind_parameter_count(&self) -> c_int {
        self.stmt
            .map_or(0, |stmt| unsafe { libsqlite3_sys::sqlite3_bind_parameter_count(stmt.as_ptr()) })
    }

    /// Index of the named parameter (including its prefix, e.g. `:id`).
    pub fn bind_parameter_index(&self, name: &CStr) -> Option<c_int> {
        let stmt = self.stmt?;
        match unsafe { libsqlite3_sys::sqlite3_bind_parameter_index(stmt.as_ptr(), name.as_ptr()) } {
            0 => None,
            index => Some(index),
        }
    }

    /// Advances the statement: `Row` when a result row is available, `Done` when finished.
    pub fn step(&mut self) -> ResultCode {
        self.call("step", |stmt| unsafe { libsqlite3_sys::sqlite3_step(stmt) })
    }

    /// Rewinds the statement so it can be stepped again, bindings are kept.
    pub fn reset(&mut self) -> ResultCode {
        self.call("reset", |stmt| unsafe { libsqlite3_sys::sqlite3_reset(stmt) })
    }

    /// Releases the handle, the statement is empty afterwards.
    /// Finalizing an empty statement returns `Ok`.
    pub fn finalize(&mut self) -> ResultCode {
        match self.stmt.take() {
            Some(stmt) => {
                log::trace!("Finalize sqlite statement {:p}", stmt);
                ResultCode::from_raw(unsafe { libsqlite3_sys::sqlite3_finalize(stmt.as_ptr()) })
            }
            None => ResultCode::Ok,
        }
    }

    /// The sql text the statement was compiled from, empty for an empty statement.
    pub fn sql(&self) -> StringSpan<'_> {
        match self.stmt {
            Some(stmt) => unsafe { StringSpan::from_ptr(libsqlite3_sys::sqlite3_sql(stmt.as_ptr())) },
            None => StringSpan::default(),
        }
    }

    /// The sql text with the current bindings substituted for the parameters.
    pub fn expanded_sql(&self) -> Option<String> {
        let stmt = self.stmt?;
        let sql = unsafe { libsqlite3_sys::sqlite3_expanded_sql(stmt.as_ptr()) };
        if sql.is_null() {
            return None;
        }

        let result = unsafe { CStr::from_ptr(sql) }.to_string_lossy().into_owned();
        unsafe { libsqlite3_sys::sqlite3_free(sql.cast::<c_void>()) };
        Some(result)
    }

    pub fn column_count(&self) -> c_int {
        self.stmt
            .map_or(0, |stmt| unsafe { libsqlite3_sys::sqlite3_column_count(stmt.as_ptr()) })
    }

    pub fn column_name(&self, index: c_int) -> Option<&str> {
        let stmt = self.stmt?;
        let name: *const c_char = unsafe { libsqlite3_sys::sqlite3_column_name(stmt.as_ptr(), index) };
        if name.is_null() {
            return None;
        }

        unsafe { CStr::from_ptr(name) }.to_str().ok()
    }

    /// Column of the current row. The borrow keeps the statement from advancing while the
    /// value is in use, use [`ValueAccess::dup`](crate::ValueAccess::dup) to keep it longer.
    pub fn column_value(&mut self, index: c_int) -> ValueRef<'_> {
        match self.stmt {
            Some(stmt) => unsafe { ValueRef::from_raw(libsqlite3_sys::sqlite3_column_value(stmt.as_ptr(), index)) },
            None => ValueRef::empty(),
        }
    }

    pub fn last_error(&self) -> String {
        match self.stmt {
            Some(stmt) => error::last_sqlite_error(unsafe { libsqlite3_sys::sqlite3_db_handle(stmt.as_ptr()) }),
            None => ResultCode::Misuse.description().to_string(),
        }
    }

    fn call(&self, operation: &str, f: impl FnOnce(*mut sqlite3_stmt) -> c_int) -> ResultCode {
        match self.stmt {
            Some(stmt) => ResultCode::from_raw(f(stmt.as_ptr())),
            None => {
                log::warn!("Sqlite {operation} called on an empty statement");
                ResultCode::Misuse
            }
        }
    }
}

impl Drop for Statement {
    fn drop(&mut self) {
        let _ = self.finalize();
    }
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("stmt", &self.c_ptr())
            .field("sql", &self.sql())
            .finish()
    }
}
