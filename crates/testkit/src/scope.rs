//! Process-wide transform scope stack.
//!
//! Suites select payload transforms by entering named scopes. The stack is
//! global to the process and serialized behind one mutex; [`push_scope`]
//! returns a guard whose drop pops exactly the entry it pushed. Dropping a
//! guard while a later scope is still innermost violates stack discipline
//! and is a fatal logic error, not a recoverable condition.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;
use tracing::debug;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);
static STACK: Lazy<Mutex<Vec<Entry>>> = Lazy::new(|| Mutex::new(Vec::new()));

#[derive(Debug)]
struct Entry {
    id: u64,
    name: String,
}

/// Enters a scope; the returned guard leaves it on drop.
pub fn push_scope(name: impl Into<String>) -> ScopeGuard {
    let name = name.into();
    let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
    debug!(scope = name.as_str(), "entering transform scope");
    stack().push(Entry { id, name });
    ScopeGuard { id }
}

/// The innermost scope name, if any scope is active.
pub fn current_scope() -> Option<String> {
    stack().last().map(|entry| entry.name.clone())
}

/// All active scope names, outermost first.
pub fn active_scopes() -> Vec<String> {
    stack().iter().map(|entry| entry.name.clone()).collect()
}

pub fn scope_depth() -> usize {
    stack().len()
}

fn stack() -> MutexGuard<'static, Vec<Entry>> {
    // A panicking guard drop poisons the mutex; the stack itself is left
    // consistent, so the poison flag carries no information here.
    STACK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug)]
pub struct ScopeGuard {
    id: u64,
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let violation = {
            let mut entries = stack();
            let was_top = entries.last().map(|entry| entry.id) == Some(self.id);
            let position = entries.iter().position(|entry| entry.id == self.id);
            // The entry comes off even on a violation, so one undisciplined
            // pop does not wedge every scope beneath it.
            let own = position.map(|index| entries.remove(index).name);
            match (was_top, own) {
                (false, Some(name)) => {
                    let innermost = entries
                        .last()
                        .map_or_else(|| "nothing".to_string(), |entry| entry.name.clone());
                    Some((name, innermost))
                }
                _ => None,
            }
        };
        if let Some((own, innermost)) = violation {
            if !std::thread::panicking() {
                panic!("scope `{own}` dropped while `{innermost}` is still innermost");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // The stack is process-global, so these tests take turns.
    static SERIAL: Mutex<()> = Mutex::new(());

    fn serial() -> MutexGuard<'static, ()> {
        SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    #[test]
    fn nested_scopes_track_the_innermost() {
        let _serial = serial();
        let base = scope_depth();
        let outer = push_scope("request");
        assert_eq!(current_scope().as_deref(), Some("request"));
        let inner = push_scope("changeset");
        assert_eq!(current_scope().as_deref(), Some("changeset"));
        assert_eq!(scope_depth(), base + 2);
        let names = active_scopes();
        assert_eq!(&names[names.len() - 2..], ["request", "changeset"]);
        drop(inner);
        assert_eq!(current_scope().as_deref(), Some("request"));
        drop(outer);
        assert_eq!(scope_depth(), base);
    }

    #[test]
    #[should_panic(expected = "still innermost")]
    fn out_of_order_drop_is_fatal() {
        let _serial = serial();
        let outer = push_scope("outer");
        let _inner = push_scope("inner");
        drop(outer);
    }

    #[test]
    fn a_violation_still_removes_both_entries() {
        let _serial = serial();
        let base = scope_depth();
        let result = std::panic::catch_unwind(|| {
            let outer = push_scope("orphaned");
            let _inner = push_scope("survivor");
            drop(outer);
        });
        assert!(result.is_err());
        assert_eq!(scope_depth(), base);
    }
}
