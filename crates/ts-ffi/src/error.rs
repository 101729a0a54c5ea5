// Per-thread error reporting for the C ABI. Every failing call leaves one
// message behind; `ts_last_error` hands it to the caller exactly once.

use std::cell::RefCell;
use std::ffi::CString;

use crate::types::TsStatus;

thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Interior NULs would truncate the message on the C side.
fn to_c_message(msg: String) -> CString {
    CString::new(msg.replace('\0', "\\0")).unwrap_or_default()
}

/// Record `msg` as this thread's last error and return `status`.
pub(crate) fn fail(status: TsStatus, msg: impl Into<String>) -> TsStatus {
    let msg = msg.into();
    log::debug!("{:?}: {}", status, msg);
    LAST_ERROR.with(|e| *e.borrow_mut() = Some(to_c_message(msg)));
    status
}

/// Take this thread's last error message, if any.
pub fn take_last_error() -> Option<CString> {
    LAST_ERROR.with(|e| e.borrow_mut().take())
}
