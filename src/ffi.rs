//! FFI bindings for Synheart Stress
//!
//! This module provides C-compatible functions for calling the predictor from
//! other languages. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using `stress_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::mapper::SynonymTable;
use crate::predictor::StressPredictor;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

// ============================================================================
// Predictor API
// ============================================================================

/// Opaque handle to a StressPredictor
pub struct StressPredictorHandle {
    predictor: StressPredictor,
}

/// Load a predictor from a model artifact path.
///
/// A missing or invalid artifact still yields a handle; it reports not ready
/// and rejects predictions. `synonyms_json` may be NULL to keep the artifact's
/// synonym table.
///
/// # Safety
/// - `model_path` must be a valid null-terminated C string.
/// - `synonyms_json` must be NULL or a valid null-terminated C string.
/// - Must be freed with `stress_predictor_free`.
/// - Returns NULL on invalid arguments; call `stress_last_error` for details.
#[no_mangle]
pub unsafe extern "C" fn stress_predictor_new(
    model_path: *const c_char,
    synonyms_json: *const c_char,
) -> *mut StressPredictorHandle {
    clear_last_error();

    let path = match cstr_to_string(model_path) {
        Some(s) => s,
        None => {
            set_last_error("Invalid model path pointer");
            return ptr::null_mut();
        }
    };

    let synonyms = if synonyms_json.is_null() {
        None
    } else {
        let json = match cstr_to_string(synonyms_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid synonyms string pointer");
                return ptr::null_mut();
            }
        };
        match SynonymTable::from_json(&json) {
            Ok(table) => Some(table),
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    let predictor = StressPredictor::load_with_synonyms(path, synonyms);
    Box::into_raw(Box::new(StressPredictorHandle { predictor }))
}

/// Free a predictor.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `stress_predictor_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn stress_predictor_free(handle: *mut StressPredictorHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Returns 1 when the predictor can serve predictions, 0 otherwise.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `stress_predictor_new`, or NULL.
#[no_mangle]
pub unsafe extern "C" fn stress_predictor_is_ready(handle: *const StressPredictorHandle) -> i32 {
    match handle.as_ref() {
        Some(h) if h.predictor.is_ready() => 1,
        _ => 0,
    }
}

/// Predict stress for a JSON feature vector and return the JSON result.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `stress_predictor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `stress_free_string`.
/// - Returns NULL on error (including an unavailable model); call
///   `stress_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn stress_predict(
    handle: *const StressPredictorHandle,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let handle = match handle.as_ref() {
        Some(h) => h,
        None => {
            set_last_error("Invalid predictor handle");
            return ptr::null_mut();
        }
    };

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match handle.predictor.predict_json(&json_str) {
        Ok(result) => string_to_cstr(&result),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Return the predictor status report as JSON.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `stress_predictor_new`.
/// - Returns a newly allocated string that must be freed with `stress_free_string`.
#[no_mangle]
pub unsafe extern "C" fn stress_status(handle: *const StressPredictorHandle) -> *mut c_char {
    clear_last_error();

    let handle = match handle.as_ref() {
        Some(h) => h,
        None => {
            set_last_error("Invalid predictor handle");
            return ptr::null_mut();
        }
    };

    match serde_json::to_string(&handle.predictor.status()) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Stress functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Stress function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn stress_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Stress function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn stress_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn stress_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
