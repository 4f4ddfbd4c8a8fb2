//! FFI bindings for SpatialIQ
//!
//! This module provides C-compatible functions for calling SpatialIQ from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `spatialiq_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::encoder::ReportEncoder;
use crate::error::ComputeError;
use crate::history::DEFAULT_HISTORY_WINDOW;
use crate::pipeline::{predict_batch, predict_one, SpatialPipeline, SpatialProcessor};
use crate::schema::RawFieldsAdapter;
use crate::tabular::process_csv_str;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
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
        Err(_) => {
            set_last_error("Output contains an interior NUL byte");
            ptr::null_mut()
        }
    }
}

/// Hand a result to the caller, recording the error on failure
fn result_to_cstr(result: Result<String, ComputeError>) -> *mut c_char {
    match result {
        Ok(s) => string_to_cstr(&s),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Predict one student from a JSON object and return a JSON report.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `spatialiq_free_string`.
/// - Returns NULL on error; call `spatialiq_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn spatialiq_predict_one(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    result_to_cstr(
        RawFieldsAdapter::parse_object(&json_str)
            .and_then(|raw| predict_one(&raw).map_err(ComputeError::from))
            .and_then(|prediction| ReportEncoder::new().prediction_to_json(&prediction, false)),
    )
}

/// Predict a JSON array of students and return a JSON batch report.
///
/// Invalid rows are reported inside the batch; only malformed JSON fails the call.
///
/// # Safety
/// - `json_array` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `spatialiq_free_string`.
/// - Returns NULL on error; call `spatialiq_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn spatialiq_predict_batch(json_array: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json_array) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    result_to_cstr(RawFieldsAdapter::parse_array(&json_str).and_then(|rows| {
        let batch = predict_batch(&rows);
        ReportEncoder::new().batch_to_json(&batch, false)
    }))
}

/// Predict every row of a CSV document and return the annotated CSV.
///
/// # Safety
/// - `csv` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `spatialiq_free_string`.
/// - Returns NULL on error; call `spatialiq_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn spatialiq_predict_csv(csv: *const c_char) -> *mut c_char {
    clear_last_error();

    let csv_str = match cstr_to_string(csv) {
        Some(s) => s,
        None => {
            set_last_error("Invalid CSV string pointer");
            return ptr::null_mut();
        }
    };

    result_to_cstr(process_csv_str(&SpatialPipeline::default(), &csv_str).map(|(text, _)| text))
}

// ============================================================================
// Stateful Processor API
// ============================================================================

/// Opaque handle to a SpatialProcessor
pub struct SpatialProcessorHandle {
    processor: SpatialProcessor,
    encoder: ReportEncoder,
}

/// Create a new SpatialProcessor with the specified history window.
///
/// # Safety
/// - Returns a pointer to a newly allocated SpatialProcessor.
/// - Must be freed with `spatialiq_processor_free`.
#[no_mangle]
pub unsafe extern "C" fn spatialiq_processor_new(
    history_window: i32,
) -> *mut SpatialProcessorHandle {
    clear_last_error();

    let window = if history_window <= 0 {
        DEFAULT_HISTORY_WINDOW
    } else {
        history_window as usize
    };

    let handle = Box::new(SpatialProcessorHandle {
        processor: SpatialProcessor::with_history_window(window),
        encoder: ReportEncoder::new(),
    });
    Box::into_raw(handle)
}

/// Free a SpatialProcessor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `spatialiq_processor_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn spatialiq_processor_free(processor: *mut SpatialProcessorHandle) {
    if !processor.is_null() {
        drop(Box::from_raw(processor));
    }
}

/// Predict one student with a stateful processor.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `spatialiq_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `spatialiq_free_string`.
/// - Returns NULL on error; call `spatialiq_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn spatialiq_processor_predict(
    processor: *mut SpatialProcessorHandle,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &mut *processor;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    result_to_cstr(
        RawFieldsAdapter::parse_object(&json_str)
            .and_then(|raw| handle.processor.predict(&raw).map_err(ComputeError::from))
            .and_then(|prediction| handle.encoder.prediction_to_json(&prediction, false)),
    )
}

/// Save processor history to JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `spatialiq_processor_new`.
/// - Returns a newly allocated string that must be freed with `spatialiq_free_string`.
/// - Returns NULL on error; call `spatialiq_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn spatialiq_processor_save_history(
    processor: *mut SpatialProcessorHandle,
) -> *mut c_char {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return ptr::null_mut();
    }

    let handle = &*processor;
    result_to_cstr(handle.processor.save_history())
}

/// Load processor history from JSON.
///
/// # Safety
/// - `processor` must be a valid pointer returned by `spatialiq_processor_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns 0 on success, non-zero on error.
/// - On error, call `spatialiq_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn spatialiq_processor_load_history(
    processor: *mut SpatialProcessorHandle,
    json: *const c_char,
) -> i32 {
    clear_last_error();

    if processor.is_null() {
        set_last_error("Null processor pointer");
        return -1;
    }

    let handle = &mut *processor;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    match handle.processor.load_history(&json_str) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by SpatialIQ functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a SpatialIQ function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn spatialiq_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next SpatialIQ call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn spatialiq_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the SpatialIQ library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn spatialiq_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
