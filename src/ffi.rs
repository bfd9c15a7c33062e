//! FFI bindings for ChatPulse
//!
//! This module provides C-compatible functions for calling ChatPulse from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `pulse_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use crate::pipeline::{parse_to_json, ChatAnalyzer};

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

/// Helper to hand a result string to the caller (caller must free)
fn result_to_cstr(result: Result<String, AnalysisError>) -> *mut c_char {
    let output = match result {
        Ok(s) => s,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };
    match CString::new(output) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => {
            let err = AnalysisError::EncodingError("output contains a NUL byte".to_string());
            set_last_error(&err.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Analyze a transcript and return the report payload JSON.
///
/// # Safety
/// - `text` must be a valid null-terminated UTF-8 C string.
/// - `config_json` must be a valid null-terminated C string or NULL (defaults).
/// - Returns a newly allocated string that must be freed with `pulse_free_string`.
/// - Returns NULL on error; call `pulse_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pulse_analyze(
    text: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let text_str = match cstr_to_string(text) {
        Some(s) => s,
        None => {
            set_last_error("Invalid transcript string pointer");
            return ptr::null_mut();
        }
    };

    let config = if config_json.is_null() {
        AnalysisConfig::default()
    } else {
        let config_str = match cstr_to_string(config_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid config string pointer");
                return ptr::null_mut();
            }
        };
        match AnalysisConfig::from_json(&config_str) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    let result = ChatAnalyzer::with_config(config).and_then(|a| a.analyze_to_json(&text_str));
    result_to_cstr(result)
}

/// Parse a transcript and return the event model as JSON.
///
/// # Safety
/// - `text` must be a valid null-terminated UTF-8 C string.
/// - Returns a newly allocated string that must be freed with `pulse_free_string`.
/// - Returns NULL on error; call `pulse_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pulse_parse(text: *const c_char) -> *mut c_char {
    clear_last_error();

    let text_str = match cstr_to_string(text) {
        Some(s) => s,
        None => {
            set_last_error("Invalid transcript string pointer");
            return ptr::null_mut();
        }
    };

    result_to_cstr(parse_to_json(&text_str))
}

// ============================================================================
// Stateful Analyzer API
// ============================================================================

/// Opaque handle to a ChatAnalyzer
pub struct ChatAnalyzerHandle {
    analyzer: ChatAnalyzer,
}

/// Create a ChatAnalyzer from a JSON configuration (NULL for defaults).
///
/// # Safety
/// - `config_json` must be a valid null-terminated C string or NULL.
/// - Returns a pointer that must be freed with `pulse_analyzer_free`.
/// - Returns NULL on error; call `pulse_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pulse_analyzer_new(config_json: *const c_char) -> *mut ChatAnalyzerHandle {
    clear_last_error();

    let analyzer = if config_json.is_null() {
        Ok(ChatAnalyzer::new())
    } else {
        match cstr_to_string(config_json) {
            Some(s) => AnalysisConfig::from_json(&s).and_then(ChatAnalyzer::with_config),
            None => {
                set_last_error("Invalid config string pointer");
                return ptr::null_mut();
            }
        }
    };

    match analyzer {
        Ok(analyzer) => Box::into_raw(Box::new(ChatAnalyzerHandle { analyzer })),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Free a ChatAnalyzer.
///
/// # Safety
/// - `analyzer` must be a valid pointer returned by `pulse_analyzer_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn pulse_analyzer_free(analyzer: *mut ChatAnalyzerHandle) {
    if !analyzer.is_null() {
        drop(Box::from_raw(analyzer));
    }
}

/// Analyze a transcript with an existing analyzer.
///
/// # Safety
/// - `analyzer` must be a valid pointer returned by `pulse_analyzer_new`.
/// - `text` must be a valid null-terminated UTF-8 C string.
/// - Returns a newly allocated string that must be freed with `pulse_free_string`.
/// - Returns NULL on error; call `pulse_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn pulse_analyzer_analyze(
    analyzer: *const ChatAnalyzerHandle,
    text: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if analyzer.is_null() {
        set_last_error("Null analyzer pointer");
        return ptr::null_mut();
    }

    let text_str = match cstr_to_string(text) {
        Some(s) => s,
        None => {
            set_last_error("Invalid transcript string pointer");
            return ptr::null_mut();
        }
    };

    let handle = &*analyzer;
    result_to_cstr(handle.analyzer.analyze_to_json(&text_str))
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by ChatPulse functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a ChatPulse function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn pulse_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next ChatPulse function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn pulse_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the ChatPulse library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn pulse_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
