use std::ffi::c_int;
use std::fmt;
use std::marker::PhantomData;
use std::ptr::{self, NonNull};
use std::slice;

use libsqlite3_sys::sqlite3_value;

use crate::StringSpan;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Datatype {
    Integer,
    Float,
    Text,
    Blob,
    Null,
}

impl Datatype {
    /// Maps a native type tag, unknown tags read as `Null`.
    pub fn from_raw(datatype: c_int) -> Self {
        match datatype {
            libsqlite3_sys::SQLITE_INTEGER => Datatype::Integer,
            libsqlite3_sys::SQLITE_FLOAT => Datatype::Float,
            libsqlite3_sys::SQLITE_TEXT => Datatype::Text,
            libsqlite3_sys::SQLITE_BLOB => Datatype::Blob,
            libsqlite3_sys::SQLITE_NULL => Datatype::Null,
            _ => {
                log::warn!("Unknown sqlite datatype: {datatype}");
                Datatype::Null
            }
        }
    }
}

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::Value {}
    impl Sealed for super::ValueRef<'_> {}
}

/// Read access shared by [`Value`] and [`ValueRef`].
///
/// Every accessor is a direct read of the native value. Reading a value through an
/// accessor that does not match its [`Datatype`] applies the sqlite conversion rules
/// (an INTEGER read as text yields its decimal representation, a FLOAT read as an
/// integer is truncated, ...). No type check is performed.
///
/// An empty handle is never passed to the library: it reads like an SQL NULL.
///
/// [`blob`](ValueAccess::blob), [`text`](ValueAccess::text) and
/// [`bytes`](ValueAccess::bytes) may convert the native value to another representation,
/// which releases the buffer an earlier slice pointed into. They take `&mut self`, so a
/// returned slice has to go out of use before the value is read again:
///
/// ```compile_fail
/// use sqleger::{Connection, ResultCode, ValueAccess};
///
/// let conn = Connection::open_in_memory().unwrap();
/// let mut stmt = conn.prepare_statement("SELECT 'ab'").unwrap();
/// assert_eq!(stmt.step(), ResultCode::Row);
///
/// let mut value = stmt.column_value(0);
/// let blob = value.blob();
/// let text = value.text();
/// assert_eq!(blob.len(), text.len());
/// ```
pub trait ValueAccess: sealed::Sealed {
    fn c_ptr(&self) -> *mut sqlite3_value;

    fn is_empty(&self) -> bool {
        self.c_ptr().is_null()
    }

    fn datatype(&self) -> Datatype {
        match NonNull::new(self.c_ptr()) {
            Some(value) => Datatype::from_raw(unsafe { libsqlite3_sys::sqlite3_value_type(value.as_ptr()) }),
            None => Datatype::Null,
        }
    }

    fn int(&self) -> c_int {
        match NonNull::new(self.c_ptr()) {
            Some(value) => unsafe { libsqlite3_sys::sqlite3_value_int(value.as_ptr()) },
            None => 0,
        }
    }

    fn int64(&self) -> i64 {
        match NonNull::new(self.c_ptr()) {
            Some(value) => unsafe { libsqlite3_sys::sqlite3_value_int64(value.as_ptr()) },
            None => 0,
        }
    }

    fn double(&self) -> f64 {
        match NonNull::new(self.c_ptr()) {
            Some(value) => unsafe { libsqlite3_sys::sqlite3_value_double(value.as_ptr()) },
            None => 0.0,
        }
    }

    /// Size in bytes of the blob or UTF-8 text representation.
    fn bytes(&mut self) -> usize {
        match NonNull::new(self.c_ptr()) {
            Some(value) => usize::try_from(unsafe { libsqlite3_sys::sqlite3_value_bytes(value.as_ptr()) }).unwrap_or(0),
            None => 0,
        }
    }

    fn blob(&mut self) -> &[u8] {
        let Some(value) = NonNull::new(self.c_ptr()) else {
            return &[];
        };

        // the pointer has to be requested before the size
        let data = unsafe { libsqlite3_sys::sqlite3_value_blob(value.as_ptr()) };
        let size = self.bytes();
        if data.is_null() || size == 0 {
            return &[];
        }

        unsafe { slice::from_raw_parts(data.cast::<u8>(), size) }
    }

    /// UTF-8 text representation, not nul terminated.
    fn text(&mut self) -> StringSpan<'_> {
        let Some(value) = NonNull::new(self.c_ptr()) else {
            return StringSpan::default();
        };

        let data = unsafe { libsqlite3_sys::sqlite3_value_text(value.as_ptr()) };
        let size = self.bytes();
        unsafe { StringSpan::from_raw_parts(data.cast(), size) }
    }

    /// Copies the value into a new, independently owned [`Value`].
    /// Duplicating an empty handle yields an empty `Value`.
    fn dup(&self) -> Value {
        match NonNull::new(self.c_ptr()) {
            Some(value) => unsafe { Value::from_raw(libsqlite3_sys::sqlite3_value_dup(value.as_ptr())) },
            None => Value::default(),
        }
    }
}

/// Owning wrapper of a `sqlite3_value` handle, released with `sqlite3_value_free`.
#[derive(Default)]
pub struct Value {
    value: Option<NonNull<sqlite3_value>>,
}

impl Value {
    /// Takes ownership of `value`, a null pointer gives an empty `Value`.
    ///
    /// # Safety
    /// `value` must be null or a handle that may be released with `sqlite3_value_free`
    /// (typically obtained from `sqlite3_value_dup`) and that nothing else releases.
    pub unsafe fn from_raw(value: *mut sqlite3_value) -> Self {
        Self { value: NonNull::new(value) }
    }

    /// Releases the handle. Freeing an empty value does nothing.
    pub fn free(&mut self) {
        if let Some(value) = self.value.take() {
            log::trace!("Free sqlite value {:p}", value);
            unsafe { libsqlite3_sys::sqlite3_value_free(value.as_ptr()) };
        }
    }

    /// Hands the raw handle to the caller without releasing it.
    pub fn take_c_ptr(&mut self) -> *mut sqlite3_value {
        self.value.take().map_or(ptr::null_mut(), NonNull::as_ptr)
    }

    pub fn as_value_ref(&mut self) -> ValueRef<'_> {
        ValueRef::from(self)
    }
}

impl ValueAccess for Value {
    fn c_ptr(&self) -> *mut sqlite3_value {
        self.value.map_or(ptr::null_mut(), NonNull::as_ptr)
    }
}

impl Drop for Value {
    fn drop(&mut self) {
        self.free();
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value").field("value", &self.c_ptr()).finish()
    }
}

/// Borrowing view of a `sqlite3_value` handle, never released by this type.
///
/// A `ValueRef` borrows its source exclusively, reading text or blobs through it may
/// convert the native value.
pub struct ValueRef<'a> {
    value: *mut sqlite3_value,
    _source: PhantomData<&'a mut sqlite3_value>,
}

impl<'a> ValueRef<'a> {
    /// # Safety
    /// `value` must be null or a valid handle for the whole of `'a`: when it comes from
    /// a statement column the statement must not be stepped, reset or finalized meanwhile.
    /// No other `ValueRef` or `Value` may read the same handle during `'a`.
    pub unsafe fn from_raw(value: *mut sqlite3_value) -> Self {
        Self {
            value,
            _source: PhantomData,
        }
    }

    pub(crate) fn empty() -> Self {
        Self {
            value: ptr::null_mut(),
            _source: PhantomData,
        }
    }
}

impl<'a> From<&'a mut Value> for ValueRef<'a> {
    fn from(value: &'a mut Value) -> Self {
        unsafe { ValueRef::from_raw(value.c_ptr()) }
    }
}

impl ValueAccess for ValueRef<'_> {
    fn c_ptr(&self) -> *mut sqlite3_value {
        self.value
    }
}

impl fmt::Debug for ValueRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueRef").field("value", &self.value).finish()
    }
}
