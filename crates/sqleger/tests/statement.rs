use sqleger::{Connection, Result, ResultCode, Statement, StringSpan, is_error};

const CREATE_T: &str = "CREATE TABLE t(x INTEGER)";
const CREATE_T_WITH_GARBAGE: &str = "CREATE TABLE t(x INTEGER)garbage";

fn bounded_create() -> StringSpan<'static> {
    StringSpan::new(CREATE_T_WITH_GARBAGE).split_at(25).0
}

#[test_log::test]
fn prepare_and_finalize_nul_terminated() -> Result<()> {
    let d = Connection::open_in_memory()?;

    let mut s = Statement::default();
    let r1 = d.prepare_v2(c"CREATE TABLE t(x INTEGER)", &mut s);
    assert_eq!(r1, ResultCode::Ok);
    assert!(!s.c_ptr().is_null());
    assert_eq!(s.sql(), CREATE_T);

    let r2 = s.finalize();
    assert_eq!(r2, ResultCode::Ok);
    assert!(s.c_ptr().is_null());
    Ok(())
}

#[test_log::test]
fn prepare_and_finalize_bounded() -> Result<()> {
    let d = Connection::open_in_memory()?;
    let q2 = bounded_create();

    let mut s = Statement::default();
    let (r1, tail) = d.prepare_v2_with_tail(q2, &mut s);
    assert_eq!(r1, ResultCode::Ok);
    assert!(!s.c_ptr().is_null());
    assert_eq!(s.sql(), q2);
    assert_ne!(s.sql(), CREATE_T_WITH_GARBAGE);
    assert!(tail.is_empty());

    assert_eq!(s.finalize(), ResultCode::Ok);
    assert!(s.c_ptr().is_null());
    Ok(())
}

#[test_log::test]
fn prepare_failure() -> Result<()> {
    let d = Connection::open_in_memory()?;

    let mut s = Statement::default();
    let r = d.prepare_v2("I'm not SQL!", &mut s);
    assert!(is_error(r));
    assert!(s.c_ptr().is_null());
    Ok(())
}

#[test_log::test]
fn constructor_prepares() -> Result<()> {
    let d = Connection::open_in_memory()?;

    let s = Statement::new(&d, c"CREATE TABLE t(x INTEGER)")?;
    assert!(!s.c_ptr().is_null());
    assert_eq!(s.sql(), CREATE_T);

    let s = Statement::new(&d, bounded_create())?;
    assert!(!s.c_ptr().is_null());
    assert_eq!(s.sql(), bounded_create());
    Ok(())
}

#[test_log::test]
fn constructor_failure_carries_the_code() -> Result<()> {
    let d = Connection::open_in_memory()?;

    let err = Statement::new(&d, "I'm not SQL!").expect_err("invalid sql");
    assert!(is_error(err.code()));
    Ok(())
}

#[test_log::test]
fn take_handles() -> Result<()> {
    let mut d = Connection::open_in_memory()?;
    let mut s = Statement::new(&d, CREATE_T)?;

    let s1 = s.c_ptr();
    let s2 = s.take_c_ptr();
    assert_eq!(s1, s2);
    assert!(s.c_ptr().is_null());
    assert_eq!(unsafe { sqleger::ffi::sqlite3_finalize(s2) }, sqleger::ffi::SQLITE_OK);

    let p1 = d.c_ptr();
    let p2 = d.take_c_ptr();
    assert_eq!(p1, p2);
    assert!(d.c_ptr().is_null());
    assert_eq!(unsafe { sqleger::ffi::sqlite3_close(p2) }, sqleger::ffi::SQLITE_OK);
    Ok(())
}

#[test_log::test]
fn move_construction() -> Result<()> {
    let d = Connection::open_in_memory()?;
    let mut s1 = Statement::new(&d, CREATE_T)?;
    let p = s1.c_ptr();

    let s2 = std::mem::take(&mut s1);
    assert_eq!(s2.c_ptr(), p);
    assert!(s1.c_ptr().is_null());
    Ok(())
}

#[test_log::test]
fn move_assignment_into_empty() -> Result<()> {
    let d = Connection::open_in_memory()?;
    let mut s1 = Statement::new(&d, CREATE_T)?;
    let p = s1.c_ptr();

    let mut s2 = Statement::default();
    assert!(s2.is_empty());
    s2 = std::mem::take(&mut s1);
    assert_eq!(s2.c_ptr(), p);
    assert!(s1.c_ptr().is_null());
    Ok(())
}

#[test_log::test]
fn move_assignment_into_prepared() -> Result<()> {
    let d = Connection::open_in_memory()?;
    let mut s1 = Statement::new(&d, CREATE_T)?;
    let p = s1.c_ptr();

    let mut s2 = Statement::new(&d, "CREATE TABLE u(y INTEGER)")?;
    let previous = s2.c_ptr();
    assert_ne!(previous, p);

    s2 = std::mem::take(&mut s1);
    assert_eq!(s2.c_ptr(), p);
    assert!(s1.c_ptr().is_null());

    // the replaced handle was finalized, so it is no longer listed on the connection
    let mut next = unsafe { sqleger::ffi::sqlite3_next_stmt(d.c_ptr(), std::ptr::null_mut()) };
    while !next.is_null() {
        assert_ne!(next, previous);
        next = unsafe { sqleger::ffi::sqlite3_next_stmt(d.c_ptr(), next) };
    }
    Ok(())
}

#[test_log::test]
fn step_after_done_reexecutes() -> Result<()> {
    let d = Connection::open_in_memory()?;
    let mut s = Statement::new(&d, CREATE_T)?;

    assert_eq!(s.step(), ResultCode::Done);

    let r2 = s.step();
    assert!(is_error(r2));
    assert!(s.last_error().contains("already exists"));
    Ok(())
}

#[test_log::test]
fn reset_then_step_again() -> Result<()> {
    let d = Connection::open_in_memory()?;
    let mut s = Statement::new(&d, "CREATE TABLE IF NOT EXISTS t(x INTEGER)")?;

    assert_eq!(s.step(), ResultCode::Done);
    assert_eq!(s.reset(), ResultCode::Ok);
    assert_eq!(s.step(), ResultCode::Done);
    Ok(())
}

#[test_log::test]
fn reset_reproduces_rows() -> Result<()> {
    let d = Connection::open_in_memory()?;
    let mut s = Statement::new(&d, "SELECT 1 UNION ALL SELECT 2")?;

    for _ in 0..2 {
        assert_eq!(s.step(), ResultCode::Row);
        assert_eq!(s.step(), ResultCode::Row);
        assert_eq!(s.step(), ResultCode::Done);
        assert_eq!(s.reset(), ResultCode::Ok);
    }
    Ok(())
}

#[test_log::test]
fn bind_each_type() -> Result<()> {
    let d = Connection::open_in_memory()?;

    let mut s1 = Statement::new(&d, "CREATE TABLE t(a REAL NOT NULL, b INTEGER NOT NULL, c INTEGER NOT NULL, d INTEGER)")?;
    assert_eq!(s1.step(), ResultCode::Done);

    let mut s2 = Statement::new(&d, "INSERT INTO t VALUES(?1, ?2, ?3, ?4)")?;
    assert_eq!(s2.bind_double(1, 0.25), ResultCode::Ok);
    assert_eq!(s2.bind_int(2, 2), ResultCode::Ok);
    assert_eq!(s2.bind_int64(3, 3), ResultCode::Ok);
    assert_eq!(s2.bind_null(4), ResultCode::Ok);
    assert_eq!(s2.step(), ResultCode::Done);
    assert_eq!(d.changes(), 1);
    Ok(())
}

#[test_log::test]
fn constraint_violation_is_reported_by_step() -> Result<()> {
    let d = Connection::open_in_memory()?;
    d.execute("CREATE TABLE t(a INTEGER NOT NULL)")?;

    let mut s = Statement::new(&d, "INSERT INTO t VALUES(?1)")?;
    assert_eq!(s.bind_null(1), ResultCode::Ok);
    assert_eq!(s.step(), ResultCode::Constraint);
    Ok(())
}

#[test_log::test]
fn statement_outlives_dropped_connection() -> Result<()> {
    let d = Connection::open_in_memory()?;
    let mut s = Statement::new(&d, "SELECT 1")?;
    assert_eq!(s.step(), ResultCode::Row);

    drop(d);
    assert_eq!(s.finalize(), ResultCode::Ok);
    assert!(s.is_empty());
    Ok(())
}

#[test_log::test]
fn closed_connection_is_released_by_last_statement() -> Result<()> {
    let mut d = Connection::open_in_memory()?;
    let s = Statement::new(&d, CREATE_T)?;
    let raw = d.c_ptr();

    assert_eq!(d.close(), ResultCode::Ok);
    assert!(d.is_empty());

    // the statement still lists the connection it belongs to
    assert_eq!(unsafe { sqleger::ffi::sqlite3_db_handle(s.c_ptr()) }, raw);
    drop(s);
    Ok(())
}
