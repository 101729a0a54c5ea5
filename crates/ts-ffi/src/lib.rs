mod context;
mod error;
mod types;

pub use context::*;
pub use error::*;
pub use types::*;

use std::ffi::CString;
use std::os::raw::c_char;

use ts_gemm::{Limits, MatrixMut, MatrixRef};

use crate::error::fail;

/// Execute a closure that returns a `TsStatus`, catching any panics
/// and converting them into `TsStatus::ErrorInternal`.
fn catch_panic<F: FnOnce() -> TsStatus + std::panic::UnwindSafe>(f: F) -> TsStatus {
    match std::panic::catch_unwind(f) {
        Ok(status) => status,
        Err(_) => {
            log::error!("panic caught at the FFI boundary");
            fail(TsStatus::ErrorInternal, "internal panic")
        }
    }
}

/// Only the untransposed operand layout is supported.
fn check_transpose(name: &str, flag: c_char) -> Result<(), TsStatus> {
    match flag as u8 {
        b'n' | b'N' => Ok(()),
        other => Err(fail(
            TsStatus::ErrorInvalidArgument,
            format!("{name}: unsupported transpose flag '{}'", other as char),
        )),
    }
}

/// Elements a `[rows x cols]` operand with leading dimension `ld` spans.
fn span(name: &str, rows: usize, cols: usize, ld: usize) -> Result<usize, TsStatus> {
    if ld < cols {
        return Err(fail(
            TsStatus::ErrorInvalidArgument,
            format!("{name}: leading dimension {ld} is less than {cols} columns"),
        ));
    }
    if rows == 0 || cols == 0 {
        return Ok(0);
    }
    (rows - 1)
        .checked_mul(ld)
        .and_then(|n| n.checked_add(cols))
        .ok_or_else(|| fail(TsStatus::ErrorInvalidArgument, format!("{name}: size overflows")))
}

/// # Safety
/// `ptr` must be valid for reads of the span of the operand, or the span
/// must be empty.
unsafe fn operand<'a>(
    name: &str,
    ptr: *const f64,
    rows: usize,
    cols: usize,
    ld: usize,
) -> Result<MatrixRef<'a>, TsStatus> {
    let len = span(name, rows, cols, ld)?;
    let data: &'a [f64] = if len == 0 {
        &[]
    } else if ptr.is_null() {
        return Err(fail(TsStatus::ErrorInvalidArgument, format!("{name} is null")));
    } else {
        std::slice::from_raw_parts(ptr, len)
    };
    MatrixRef::new(data, rows, cols, ld).map_err(|e| fail(TsStatus::ErrorInvalidArgument, format!("{name}: {e}")))
}

/// # Safety
/// `ptr` must be valid for reads and writes of the span of the operand,
/// or the span must be empty, and must not overlap any other operand.
unsafe fn destination<'a>(
    ptr: *mut f64,
    rows: usize,
    cols: usize,
    ld: usize,
) -> Result<MatrixMut<'a>, TsStatus> {
    let len = span("C", rows, cols, ld)?;
    let data: &'a mut [f64] = if len == 0 {
        &mut []
    } else if ptr.is_null() {
        return Err(fail(TsStatus::ErrorInvalidArgument, "C is null"));
    } else {
        std::slice::from_raw_parts_mut(ptr, len)
    };
    MatrixMut::new(data, rows, cols, ld).map_err(|e| fail(TsStatus::ErrorInvalidArgument, format!("C: {e}")))
}

/// Open a session for problems up to `m_max x n_max x k_max`.
///
/// On success, writes a heap-allocated `TsSession` pointer into `*out`
/// and returns `TsStatus::Ok`. The caller must later call
/// `ts_session_close` to release it.
#[no_mangle]
pub extern "C" fn ts_session_open(
    m_max: usize,
    n_max: usize,
    k_max: usize,
    out: *mut *mut TsSession,
) -> TsStatus {
    catch_panic(|| {
        if out.is_null() {
            return fail(TsStatus::ErrorInvalidArgument, "out is null");
        }
        let session = match TsSession::open(Limits::new(m_max, n_max, k_max)) {
            Ok(s) => s,
            Err(e) => return fail(TsStatus::from(&e), format!("failed to open session: {}", e)),
        };
        unsafe {
            *out = Box::into_raw(Box::new(session));
        }
        TsStatus::Ok
    })
}

/// `C = alpha * A @ B + beta * C` with row-major operands.
///
/// A is `[m x k]` with leading dimension `lda`, B is `[k x n]` with `ldb`,
/// C is `[m x n]` with `ldc`. `trans_a` and `trans_b` must be `'n'` or
/// `'N'`.
///
/// # Safety
/// `session` must come from `ts_session_open`. Each non-empty operand
/// pointer must be valid for its full span, and C must not overlap A or B.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn ts_dgemm(
    session: *mut TsSession,
    trans_a: c_char,
    trans_b: c_char,
    m: usize,
    n: usize,
    k: usize,
    alpha: f64,
    a: *const f64,
    lda: usize,
    b: *const f64,
    ldb: usize,
    beta: f64,
    c: *mut f64,
    ldc: usize,
) -> TsStatus {
    catch_panic(|| {
        if session.is_null() {
            return fail(TsStatus::ErrorInvalidArgument, "session is null");
        }
        let ctx = unsafe { &mut *session };

        let views = check_transpose("trans_a", trans_a)
            .and_then(|_| check_transpose("trans_b", trans_b))
            .and_then(|_| unsafe { operand("A", a, m, k, lda) })
            .and_then(|av| unsafe { operand("B", b, k, n, ldb) }.map(|bv| (av, bv)))
            .and_then(|(av, bv)| unsafe { destination(c, m, n, ldc) }.map(|cv| (av, bv, cv)));
        let (av, bv, cv) = match views {
            Ok(v) => v,
            Err(status) => return status,
        };

        match ctx.session.multiply(alpha, av, bv, beta, cv) {
            Ok(()) => TsStatus::Ok,
            Err(e) => fail(TsStatus::from(&e), format!("dgemm failed: {}", e)),
        }
    })
}

/// Close a session previously opened by `ts_session_open`.
///
/// Passing a null pointer is a no-op and returns `TsStatus::Ok`.
#[no_mangle]
pub unsafe extern "C" fn ts_session_close(session: *mut TsSession) -> TsStatus {
    if session.is_null() {
        return TsStatus::Ok;
    }
    let ctx = Box::from_raw(session);
    ctx.session.close();
    TsStatus::Ok
}

/// Retrieve the last error message.
///
/// Returns a pointer to a C string describing the most recent error, or
/// null if no error has occurred. The caller must free the returned string
/// with `ts_free_string`.
#[no_mangle]
pub extern "C" fn ts_last_error() -> *const c_char {
    match take_last_error() {
        Some(e) => e.into_raw(),
        None => std::ptr::null(),
    }
}

/// Free a string previously returned by `ts_last_error`.
#[no_mangle]
pub unsafe extern "C" fn ts_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}
