use crate::{AccessMode, Error, Result, ResultCode, Statement, StringSpan, error};
use libsqlite3_sys::sqlite3;
use std::ffi::{CStr, CString, c_char, c_int};
use std::fmt;
use std::path::Path;
use std::ptr::{self, NonNull};

/// Filename that opens a private, temporary in-memory database.
pub const MEMORY: &CStr = c":memory:";

// Not part of the generated libsqlite3-sys bindings, the linked library exports it.
unsafe extern "C" {
    fn sqlite3_close_v2(db: *mut sqlite3) -> c_int;
}

/// Owning wrapper of a database connection handle, closed when dropped.
///
/// `Connection::default()` is the empty connection. Closing a connection that still has
/// live statements succeeds: the native handle stays around until the last of them is
/// finalized.
#[derive(Default)]
pub struct Connection {
    db: Option<NonNull<sqlite3>>,
}

impl Connection {
    /// Opens `filename` and reports the native status.
    ///
    /// When the library produced a handle the returned connection owns it, even when
    /// opening failed, so [`last_error`](Connection::last_error) describes the failure.
    pub fn open_v2(filename: &CStr, mode: AccessMode) -> (ResultCode, Connection) {
        let mut db: *mut sqlite3 = ptr::null_mut();
        let flags = access_mode_flags(mode);
        let rc = unsafe { libsqlite3_sys::sqlite3_open_v2(filename.as_ptr(), &mut db, flags, ptr::null()) };
        (ResultCode::from_raw(rc), Connection { db: NonNull::new(db) })
    }

    pub fn open(filename: &CStr, mode: AccessMode) -> Result<Self> {
        let (rc, conn) = Connection::open_v2(filename, mode);
        if rc.is_error() {
            let err = Error::from_handle(rc, conn.c_ptr());
            log::error!("Failed to open database '{}': {err}", filename.to_string_lossy());
            return Err(err);
        }

        log::debug!("Opened database '{}'", filename.to_string_lossy());
        Ok(conn)
    }

    pub fn new(db_path: &Path, mode: AccessMode) -> Result<Self> {
        let c_path = CString::new(db_path.to_string_lossy().to_string())?;
        Connection::open(&c_path, mode)
    }

    pub fn open_in_memory() -> Result<Self> {
        Connection::open(MEMORY, AccessMode::Memory)
    }

    /// Takes ownership of `db`, a null pointer gives an empty connection.
    ///
    /// # Safety
    /// `db` must be null or an open connection that nothing else closes.
    pub unsafe fn from_raw(db: *mut sqlite3) -> Self {
        Self { db: NonNull::new(db) }
    }

    pub fn c_ptr(&self) -> *mut sqlite3 {
        self.db.map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    /// Hands the raw handle to the caller without closing it.
    pub fn take_c_ptr(&mut self) -> *mut sqlite3 {
        self.db.take().map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    pub fn is_empty(&self) -> bool {
        self.db.is_none()
    }

    /// Closes the handle, the connection is empty afterwards.
    /// Closing an empty connection returns `Ok`. When the library refuses to close the
    /// handle the connection keeps owning it.
    pub fn close(&mut self) -> ResultCode {
        let Some(db) = self.db else {
            return ResultCode::Ok;
        };

        log::trace!("Close sqlite connection {:p}", db);
        let rc = ResultCode::from_raw(unsafe { sqlite3_close_v2(db.as_ptr()) });
        if rc.is_error() {
            log::warn!("Failed to close sqlite connection {:p}: {rc}", db);
            return rc;
        }

        self.db = None;
        rc
    }

    /// Compiles the first statement of `sql` into `stmt`.
    ///
    /// Whatever `stmt` held before is finalized. On success it owns the new handle, on
    /// failure it is left empty and the error status is returned. Text after the first
    /// statement is ignored.
    pub fn prepare_v2<'a>(&self, sql: impl Into<StringSpan<'a>>, stmt: &mut Statement) -> ResultCode {
        self.prepare_v2_with_tail(sql, stmt).0
    }

    /// Like [`prepare_v2`](Connection::prepare_v2), also returns the part of `sql` that
    /// was not consumed.
    pub fn prepare_v2_with_tail<'a>(
        &self,
        sql: impl Into<StringSpan<'a>>,
        stmt: &mut Statement,
    ) -> (ResultCode, StringSpan<'a>) {
        let sql = sql.into();
        let _ = stmt.finalize();

        let Some(db) = self.db else {
            log::warn!("Sqlite prepare called on an empty connection");
            return (ResultCode::Misuse, sql);
        };

        let Ok(len) = c_int::try_from(sql.len()) else {
            return (ResultCode::TooBig, sql);
        };

        let mut raw_stmt = ptr::null_mut();
        let mut tail: *const c_char = ptr::null();
        let rc = unsafe { libsqlite3_sys::sqlite3_prepare_v2(db.as_ptr(), sql.as_ptr(), len, &mut raw_stmt, &mut tail) };
        *stmt = unsafe { Statement::from_raw(raw_stmt) };

        let consumed = if tail.is_null() {
            sql.len()
        } else {
            (tail as usize).saturating_sub(sql.as_ptr() as usize)
        };

        (ResultCode::from_raw(rc), sql.split_at(consumed).1)
    }

    pub fn prepare_statement<'a>(&self, sql: impl Into<StringSpan<'a>>) -> Result<Statement> {
        Statement::new(self, sql)
    }

    /// Runs the first statement of `sql` once.
    pub fn execute<'a>(&self, sql: impl Into<StringSpan<'a>>) -> Result<()> {
        let mut stmt = self.prepare_statement(sql)?;
        self.check(stmt.step())?;
        Ok(())
    }

    /// Runs every statement of `sql` in order, stopping at the first failure.
    pub fn execute_batch<'a>(&self, sql: impl Into<StringSpan<'a>>) -> Result<()> {
        let mut remaining = sql.into();
        let mut stmt = Statement::default();
        while !remaining.is_empty() {
            let (rc, tail) = self.prepare_v2_with_tail(remaining, &mut stmt);
            self.check(rc)?;

            if !stmt.is_empty() {
                self.check(stmt.step())?;
            }

            if tail.len() == remaining.len() {
                break;
            }

            remaining = tail;
        }

        Ok(())
    }

    pub fn execute_sql_file(&self, sql_path: &Path) -> Result<()> {
        let sql_contents = std::fs::read_to_string(sql_path)?;
        self.execute_batch(&sql_contents)
    }

    pub fn path(&self) -> Option<String> {
        let db = self.db?;
        let filename = unsafe { libsqlite3_sys::sqlite3_db_filename(db.as_ptr(), c"main".as_ptr()) };
        if !filename.is_null() {
            let c_str = unsafe { CStr::from_ptr(filename) };
            return Some(c_str.to_string_lossy().to_string());
        }
        None
    }

    pub fn last_error(&self) -> String {
        match self.db {
            Some(db) => error::last_sqlite_error(db.as_ptr()),
            None => ResultCode::Misuse.description().to_string(),
        }
    }

    pub fn errcode(&self) -> ResultCode {
        match self.db {
            Some(db) => ResultCode::from_raw(unsafe { libsqlite3_sys::sqlite3_errcode(db.as_ptr()) }),
            None => ResultCode::Misuse,
        }
    }

    /// Rows modified by the most recent INSERT, UPDATE or DELETE.
    pub fn changes(&self) -> i64 {
        self.db
            .map_or(0, |db| i64::from(unsafe { libsqlite3_sys::sqlite3_changes(db.as_ptr()) }))
    }

    pub fn last_insert_rowid(&self) -> i64 {
        self.db
            .map_or(0, |db| unsafe { libsqlite3_sys::sqlite3_last_insert_rowid(db.as_ptr()) })
    }

    fn check(&self, rc: ResultCode) -> Result<ResultCode> {
        if rc.is_error() {
            let err = Error::from_handle(rc, self.c_ptr());
            log::error!("{err}");
            return Err(err);
        }

        Ok(rc)
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection").field("db", &self.c_ptr()).finish()
    }
}

fn access_mode_flags(mode: AccessMode) -> c_int {
    match mode {
        AccessMode::ReadOnly => libsqlite3_sys::SQLITE_OPEN_READONLY,
        AccessMode::ReadWrite => libsqlite3_sys::SQLITE_OPEN_READWRITE,
        AccessMode::Create => libsqlite3_sys::SQLITE_OPEN_READWRITE | libsqlite3_sys::SQLITE_OPEN_CREATE,
        AccessMode::Memory => {
            libsqlite3_sys::SQLITE_OPEN_READWRITE | libsqlite3_sys::SQLITE_OPEN_CREATE | libsqlite3_sys::SQLITE_OPEN_MEMORY
        }
    }
}
