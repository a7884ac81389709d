// C ABI for keyboard hosts. The host owns the handle returned by
// `kbd_dictionary_open` and passes it to every call; there is no global engine.
use crate::core::engine::Dictionary;
use crate::core::types::{Candidate, Selection};
use crate::config::DictionaryConfig;
use crate::persistence::FileBackend;
use std::ffi::{c_char, CStr, CString};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr;
use std::sync::Arc;
use tracing::{error, warn};

unsafe fn cptr_to_str<'a>(ptr: *const c_char) -> Option<&'a str> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok()
}

unsafe fn handle<'a>(dictionary: *const Dictionary) -> Option<&'a Dictionary> {
    dictionary.as_ref()
}

fn into_c_string(text: String) -> *mut c_char {
    CString::new(text).map(CString::into_raw).unwrap_or(ptr::null_mut())
}

/// Opens (or creates) the dictionary stored at `path`. `config_json` may be
/// null; a malformed config falls back to the defaults. Returns null only if
/// `path` is not valid UTF-8 or opening panicked.
#[no_mangle]
pub extern "C" fn kbd_dictionary_open(path: *const c_char, config_json: *const c_char) -> *mut Dictionary {
    let Some(path) = (unsafe { cptr_to_str(path) }) else {
        return ptr::null_mut();
    };
    let config = match unsafe { cptr_to_str(config_json) } {
        Some(json) => DictionaryConfig::from_json_str(json).unwrap_or_else(|e| {
            warn!(error = %e, "ignoring dictionary config");
            DictionaryConfig::default()
        }),
        None => DictionaryConfig::default(),
    };

    let result = catch_unwind(AssertUnwindSafe(|| {
        Dictionary::open(config, Arc::new(FileBackend::new(path)))
    }));
    match result {
        Ok(dictionary) => Box::into_raw(Box::new(dictionary)),
        Err(_) => {
            error!("panic while opening dictionary");
            ptr::null_mut()
        }
    }
}

/// Flushes and releases the handle. Passing null is a no-op.
#[no_mangle]
pub extern "C" fn kbd_dictionary_close(dictionary: *mut Dictionary) {
    if dictionary.is_null() {
        return;
    }
    let dictionary = unsafe { Box::from_raw(dictionary) };
    if let Err(e) = dictionary.flush() {
        warn!(error = %e, "failed to save dictionary on close");
    }
}

#[no_mangle]
pub extern "C" fn kbd_dictionary_learn(dictionary: *const Dictionary, word: *const c_char) {
    let (Some(dictionary), Some(word)) = (unsafe { handle(dictionary) }, unsafe { cptr_to_str(word) }) else {
        return;
    };
    let _ = catch_unwind(AssertUnwindSafe(|| dictionary.learn(word)));
}

/// Returns the suggestion row for `prefix` as a JSON array of
/// `{"text": ..., "is_autocorrect": ...}` objects. A `limit` of 0 selects the
/// configured row size. Free the result with `kbd_string_free`.
#[no_mangle]
pub extern "C" fn kbd_dictionary_candidates(
    dictionary: *const Dictionary,
    prefix: *const c_char,
    limit: u32,
) -> *mut c_char {
    let (Some(dictionary), Some(prefix)) = (unsafe { handle(dictionary) }, unsafe { cptr_to_str(prefix) }) else {
        return into_c_string("[]".to_string());
    };
    let limit = if limit == 0 { dictionary.config().default_limit } else { limit as usize };
    let result = catch_unwind(AssertUnwindSafe(|| {
        let candidates = dictionary.candidates(prefix, limit);
        serde_json::to_string(&candidates).unwrap_or_else(|_| "[]".to_string())
    }));
    let json = result.unwrap_or_else(|_| {
        error!("panic while computing candidates");
        "[]".to_string()
    });
    into_c_string(json)
}

/// Dispatches a picked candidate. Returns 1 when the host should commit the
/// text, 0 when it should only replace the composing text, -1 on bad input.
#[no_mangle]
pub extern "C" fn kbd_dictionary_select(
    dictionary: *const Dictionary,
    text: *const c_char,
    is_autocorrect: bool,
) -> i32 {
    let (Some(dictionary), Some(text)) = (unsafe { handle(dictionary) }, unsafe { cptr_to_str(text) }) else {
        return -1;
    };
    let candidate = Candidate { text: text.to_string(), is_autocorrect };
    match catch_unwind(AssertUnwindSafe(|| dictionary.select(&candidate))) {
        Ok(Selection::Commit(_)) => 1,
        Ok(Selection::ReplaceComposing(_)) => 0,
        Err(_) => -1,
    }
}

/// Writes the dictionary synchronously. Returns 0 on success, -1 otherwise.
#[no_mangle]
pub extern "C" fn kbd_dictionary_save(dictionary: *const Dictionary) -> i32 {
    let Some(dictionary) = (unsafe { handle(dictionary) }) else {
        return -1;
    };
    match dictionary.flush() {
        Ok(()) => 0,
        Err(e) => {
            warn!(error = %e, "failed to save dictionary");
            -1
        }
    }
}

#[no_mangle]
pub extern "C" fn kbd_string_free(s: *mut c_char) {
    if !s.is_null() {
        unsafe {
            drop(CString::from_raw(s));
        }
    }
}
