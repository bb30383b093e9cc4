//! Scoped override of the current default region.
//!
//! Overrides live on a thread-local stack with RAII pop, so they are
//! restored on every exit path including panics, and scopes on different
//! threads cannot corrupt one another.

use std::cell::RefCell;
use std::marker::PhantomData;

use tracing::debug;

/// Region assumed when no override is in scope.
pub const DEFAULT_REGION: &str = "world";

thread_local! {
    static REGION_STACK: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Pops its region from the thread's stack on drop. Intentionally not
/// sendable; an override belongs to the thread that pushed it.
#[must_use = "dropping the guard immediately ends the region scope"]
pub struct RegionGuard {
    _not_send: PhantomData<*const ()>,
}

impl Drop for RegionGuard {
    fn drop(&mut self) {
        REGION_STACK.with(|stack| {
            let popped = stack.borrow_mut().pop();
            debug!(region = ?popped, "region scope ended");
        });
    }
}

/// Push a region override for the current thread; it stays active until the
/// returned guard is dropped.
pub fn push_region(name: impl Into<String>) -> RegionGuard {
    let name = name.into();
    debug!(region = %name, "region scope started");
    REGION_STACK.with(|stack| stack.borrow_mut().push(name));
    RegionGuard {
        _not_send: PhantomData,
    }
}

/// Run `body` with `name` as the current region, restored afterwards on
/// every exit path.
pub fn with_region<T>(name: &str, body: impl FnOnce() -> T) -> T {
    let _guard = push_region(name);
    body()
}

/// Innermost override on this thread, or [`DEFAULT_REGION`].
pub fn current_region() -> String {
    REGION_STACK.with(|stack| {
        stack
            .borrow()
            .last()
            .cloned()
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_scopes_restore_in_order() {
        assert_eq!(current_region(), DEFAULT_REGION);
        with_region("europe", || {
            assert_eq!(current_region(), "europe");
            with_region("dach", || {
                assert_eq!(current_region(), "dach");
            });
            assert_eq!(current_region(), "europe");
        });
        assert_eq!(current_region(), DEFAULT_REGION);
    }
}
