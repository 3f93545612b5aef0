//! C-ABI boundary surface.
//!
//! Thin pass-throughs for native libraries that complete bridge operations
//! by handle. Build this crate as a `cdylib` with the `ffi` feature and link
//! the embedding side against it; handles travel as plain `u64` values and
//! payloads as byte buffers, which the bridge copies and never interprets.
//!
//! An unknown handle on completion is the documented benign race (the entry
//! may already have resolved); it is reported as [`FCB_UNKNOWN_HANDLE`] so
//! native callers can count it, but it is never an error.

use std::ffi::{c_char, CStr};
use std::slice;

use bridge_registry::Handle;

use crate::error::NativeError;
use crate::{global, init, BridgeConfig};

/// Success.
pub const FCB_OK: i32 = 0;
/// The handle was not present; a benign race, not a failure.
pub const FCB_UNKNOWN_HANDLE: i32 = 1;
/// `fcb_init` has not run.
pub const FCB_ERR_NOT_INITIALIZED: i32 = -1;
/// A required pointer argument was null.
pub const FCB_ERR_NULL_POINTER: i32 = -2;
/// A message argument was not valid UTF-8.
pub const FCB_ERR_INVALID_UTF8: i32 = -3;
/// The bridge runtime could not be built.
pub const FCB_ERR_INIT_FAILED: i32 = -4;

/// Initialize the bridge with `worker_threads` runtime threads (0 = CPU
/// cores). Idempotent: only the first call takes effect.
#[no_mangle]
pub extern "C" fn fcb_init(worker_threads: u32) -> i32 {
    let config = BridgeConfig::default().with_worker_threads(worker_threads as usize);
    match init(config) {
        Ok(_) => FCB_OK,
        Err(_) => FCB_ERR_INIT_FAILED,
    }
}

/// Register a pending operation and return its raw handle.
///
/// Returns `0` (never a valid handle) if the bridge is not initialized.
#[no_mangle]
pub extern "C" fn fcb_register() -> u64 {
    match global() {
        Ok(runtime) => runtime.registry().register().as_raw(),
        Err(_) => 0,
    }
}

/// Complete the operation behind `handle` with a success payload of `len`
/// bytes starting at `data`. The bytes are copied before this returns.
///
/// # Safety
///
/// `data` must point to `len` readable bytes, or be null with `len == 0`.
#[no_mangle]
pub unsafe extern "C" fn fcb_complete_ok(handle: u64, data: *const u8, len: usize) -> i32 {
    let Ok(runtime) = global() else {
        return FCB_ERR_NOT_INITIALIZED;
    };
    if data.is_null() && len > 0 {
        return FCB_ERR_NULL_POINTER;
    }

    let payload = if len == 0 {
        Vec::new()
    } else {
        unsafe { slice::from_raw_parts(data, len) }.to_vec()
    };

    if runtime
        .registry()
        .complete(Handle::from_raw(handle), Ok(payload))
    {
        FCB_OK
    } else {
        FCB_UNKNOWN_HANDLE
    }
}

/// Complete the operation behind `handle` with a failure payload. `message`
/// may be null for a code-only failure.
///
/// # Safety
///
/// `message`, when non-null, must point to a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn fcb_complete_err(handle: u64, code: i32, message: *const c_char) -> i32 {
    let Ok(runtime) = global() else {
        return FCB_ERR_NOT_INITIALIZED;
    };

    let message = if message.is_null() {
        String::new()
    } else {
        match unsafe { CStr::from_ptr(message) }.to_str() {
            Ok(text) => text.to_owned(),
            Err(_) => return FCB_ERR_INVALID_UTF8,
        }
    };

    if runtime
        .registry()
        .complete(Handle::from_raw(handle), Err(NativeError { code, message }))
    {
        FCB_OK
    } else {
        FCB_UNKNOWN_HANDLE
    }
}

/// Number of operations the bridge still tracks, for embedder diagnostics.
#[no_mangle]
pub extern "C" fn fcb_in_flight() -> u64 {
    match global() {
        Ok(runtime) => runtime.registry().in_flight() as u64,
        Err(_) => 0,
    }
}
