//! Thread-local message of the most recent failed operation.
//!
//! The `Result` of each call is authoritative. This slot exists for callers
//! that display a diagnostic later. It is written on the thread that
//! completes the operation and always holds redacted text.

use std::cell::RefCell;

use common::VaultError;

use crate::telemetry::redact;

thread_local! {
    static LAST_ERROR: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Message of the last failed operation on this thread, `None` if the last
/// operation succeeded.
///
/// Operations record their outcome on the thread that polls them to
/// completion. On a multi-threaded tokio runtime a task can move between
/// threads at any `.await`, so a read that is not on the same thread as the
/// completed call, with no `.await` in between, may see another task's
/// outcome. Prefer the returned `Result` in async code.
pub fn last_error() -> Option<String> {
    LAST_ERROR.with(|e| e.borrow().clone())
}

/// Record the outcome of an operation and pass it through.
pub(crate) fn track<T>(result: Result<T, VaultError>) -> Result<T, VaultError> {
    let msg = result.as_ref().err().map(|e| redact(&e.to_string()));
    LAST_ERROR.with(|slot| *slot.borrow_mut() = msg);
    result
}
