//! Per-thread sandbox binding.
//!
//! The embedder installs a policy on the thread that runs a script and
//! removes it afterwards. The dispatch facade only reads the slot. Each
//! thread has its own slot; nothing here is shared or locked.
//!
//! Guards from [`enter`] stack: the innermost live guard's policy is the
//! current one, and dropping a guard removes only its own entry, in any
//! order. [`set`] and [`clear`] replace the whole stack, after which older
//! guards no longer own anything.

use crate::sandbox::{ClassPolicy, Sandbox};
use std::cell::{Cell, RefCell};
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{trace, warn};

struct Binding {
    /// `None` for bindings installed by [`set`].
    token: Option<u64>,
    policy: Arc<dyn ClassPolicy>,
}

thread_local! {
    static BINDINGS: RefCell<Vec<Binding>> = const { RefCell::new(Vec::new()) };
    static NEXT_TOKEN: Cell<u64> = const { Cell::new(0) };
}

/// The policy bound to the calling thread, if any.
pub fn current() -> Option<Arc<dyn ClassPolicy>> {
    BINDINGS.with(|stack| stack.borrow().last().map(|b| Arc::clone(&b.policy)))
}

/// Whether the calling thread has a policy bound.
pub fn is_bound() -> bool {
    BINDINGS.with(|stack| !stack.borrow().is_empty())
}

/// Replace the calling thread's binding, returning the previous one.
///
/// Any guards still alive on this thread are detached.
pub fn set(policy: Option<Arc<dyn ClassPolicy>>) -> Option<Arc<dyn ClassPolicy>> {
    trace!(bound = policy.is_some(), "sandbox binding replaced");
    let replacement: Vec<Binding> = policy
        .map(|policy| Binding {
            token: None,
            policy,
        })
        .into_iter()
        .collect();
    let previous = BINDINGS.with(|stack| stack.replace(replacement));
    previous.into_iter().last().map(|b| b.policy)
}

/// Remove the calling thread's binding, returning it.
pub fn clear() -> Option<Arc<dyn ClassPolicy>> {
    set(None)
}

/// Bind `policy` until the returned guard is dropped.
pub fn enter(policy: Arc<dyn ClassPolicy>) -> SandboxGuard {
    let token = NEXT_TOKEN.with(|next| {
        let token = next.get();
        next.set(token + 1);
        token
    });
    trace!(token, "sandbox guard entered");
    BINDINGS.with(|stack| {
        stack.borrow_mut().push(Binding {
            token: Some(token),
            policy,
        })
    });
    SandboxGuard {
        token,
        _not_send: PhantomData,
    }
}

/// Bind a [`Sandbox`] until the returned guard is dropped.
pub fn enter_sandbox(sandbox: Sandbox) -> SandboxGuard {
    enter(Arc::new(sandbox))
}

/// Run `f` with `policy` bound, restoring the previous binding afterwards.
pub fn with_policy<T>(policy: Arc<dyn ClassPolicy>, f: impl FnOnce() -> T) -> T {
    let _guard = enter(policy);
    f()
}

/// Removes its binding on drop.
///
/// Not `Send`: the guard must be dropped on the thread that created it.
#[must_use = "the sandbox is unbound as soon as the guard is dropped"]
pub struct SandboxGuard {
    token: u64,
    _not_send: PhantomData<*const ()>,
}

impl Drop for SandboxGuard {
    fn drop(&mut self) {
        let token = self.token;
        // The slot may already be gone during thread teardown.
        let removed = BINDINGS.try_with(|stack| {
            let mut stack = stack.borrow_mut();
            match stack.iter().rposition(|b| b.token == Some(token)) {
                Some(index) => {
                    stack.remove(index);
                    true
                }
                None => false,
            }
        });
        if let Ok(false) = removed {
            warn!(token, "sandbox guard dropped after its binding was replaced");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_unbound_by_default() {
        thread::spawn(|| {
            assert!(current().is_none());
            assert!(!is_bound());
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_set_and_clear() {
        thread::spawn(|| {
            let previous = set(Some(Arc::new(Sandbox::allow(["a."]))));
            assert!(previous.is_none());
            assert!(current().unwrap().check_class_name("a.B").is_ok());

            let removed = clear();
            assert!(removed.is_some());
            assert!(current().is_none());
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_guard_restores_previous_binding() {
        thread::spawn(|| {
            let _outer = enter_sandbox(Sandbox::allow(["outer."]));
            {
                let _inner = enter_sandbox(Sandbox::allow(["inner."]));
                let policy = current().unwrap();
                assert!(policy.check_class_name("inner.X").is_ok());
                assert!(policy.check_class_name("outer.X").is_err());
            }
            let policy = current().unwrap();
            assert!(policy.check_class_name("outer.X").is_ok());
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_with_policy_scopes_binding() {
        thread::spawn(|| {
            let permitted = with_policy(Arc::new(Sandbox::allow(["x."])), || {
                current().unwrap().check_class_name("x.Y").is_ok()
            });
            assert!(permitted);
            assert!(!is_bound());
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_bindings_are_thread_local() {
        thread::spawn(|| {
            let _guard = enter_sandbox(Sandbox::deny_all());

            let seen_elsewhere = thread::spawn(is_bound).join().unwrap();
            assert!(!seen_elsewhere);
            assert!(is_bound());
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_guards_dropped_out_of_order_leave_nothing_bound() {
        thread::spawn(|| {
            let outer = enter_sandbox(Sandbox::allow(["a."]));
            let inner = enter_sandbox(Sandbox::deny_all());

            drop(outer);
            let policy = current().unwrap();
            assert!(policy.check_class_name("a.X").is_err());

            drop(inner);
            assert!(!is_bound());
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_set_detaches_live_guards() {
        thread::spawn(|| {
            let guard = enter_sandbox(Sandbox::deny_all());
            set(Some(Arc::new(Sandbox::allow(["manual."]))));

            drop(guard);
            let policy = current().unwrap();
            assert!(policy.check_class_name("manual.X").is_ok());
            assert!(clear().is_some());
        })
        .join()
        .unwrap();
    }

    #[test]
    fn test_guard_over_manual_binding_restores_it() {
        thread::spawn(|| {
            set(Some(Arc::new(Sandbox::allow(["base."]))));
            {
                let _guard = enter_sandbox(Sandbox::deny_all());
                assert!(current().unwrap().check_class_name("base.X").is_err());
            }
            assert!(current().unwrap().check_class_name("base.X").is_ok());
            clear();
        })
        .join()
        .unwrap();
    }
}
