//! Change propagation between sub-resources and the objects built from them.
//!
//! A [`Changeable`] owns a [`ChangeSubject`]: a table of weak back-references to
//! every [`ChangeListener`] interested in it. The forward edge (listener to
//! changeable) is the owning one and lives in the listener, e.g. a
//! [`Program`](crate::Program) holds `Rc<Shader>`. The back edge never keeps a
//! listener alive, so no reference cycle can pin native objects in memory.
//!
//! Fan-out is synchronous: by the time [`ChangeSubject::notify_changed`]
//! returns, every listener has observed the change.

use std::cell::{Cell, RefCell};
use std::rc::Weak;

/// Something that reacts to changes of a [`Changeable`].
pub trait ChangeListener {
    /// Called once per change of a changeable this listener is registered on.
    fn notify_changed(&self, changeable: &dyn Changeable);
}

/// Something that can tell its listeners that their derived state is stale.
pub trait Changeable {
    /// The listener table of this changeable.
    fn change_subject(&self) -> &ChangeSubject;

    /// Notify every registered listener.
    fn changed(&self)
    where
        Self: Sized,
    {
        self.change_subject().notify_changed(self);
    }
}

/// Identity of a listener: the address of the object behind the weak pointer.
///
/// Still valid while the listener is being dropped, which is when it
/// deregisters itself.
fn listener_key(listener: &Weak<dyn ChangeListener>) -> *const () {
    listener.as_ptr() as *const ()
}

/// Resets the re-entrancy flag even if a listener panics.
struct NotifyGuard<'a>(&'a Cell<bool>);

impl Drop for NotifyGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Listener table of a [`Changeable`].
#[derive(Default)]
pub struct ChangeSubject {
    listeners: RefCell<Vec<Weak<dyn ChangeListener>>>,
    notifying: Cell<bool>,
}

impl ChangeSubject {
    /// Create an empty listener table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Registering the same listener twice has no effect.
    pub fn register_listener(&self, listener: Weak<dyn ChangeListener>) {
        if self.has_listener(&listener) {
            return;
        }
        self.listeners.borrow_mut().push(listener);
    }

    /// Deregister a listener. Unknown listeners are ignored.
    pub fn deregister_listener(&self, listener: &Weak<dyn ChangeListener>) {
        let key = listener_key(listener);
        self.listeners
            .borrow_mut()
            .retain(|registered| listener_key(registered) != key);
    }

    /// Whether `listener` is currently registered.
    pub fn has_listener(&self, listener: &Weak<dyn ChangeListener>) -> bool {
        let key = listener_key(listener);
        self.listeners
            .borrow()
            .iter()
            .any(|registered| listener_key(registered) == key)
    }

    /// Number of registered listeners that are still alive.
    pub fn listener_count(&self) -> usize {
        self.listeners
            .borrow()
            .iter()
            .filter(|l| l.strong_count() > 0)
            .count()
    }

    /// Whether a fan-out is currently running.
    pub fn is_notifying(&self) -> bool {
        self.notifying.get()
    }

    /// Invoke every registered listener with `source`.
    ///
    /// Works on a snapshot, so listeners may register or deregister (themselves
    /// or others) from their handler. A listener deregistered by an earlier
    /// handler of the same fan-out is skipped. Re-entrant notification of this
    /// subject from inside a handler is suppressed.
    pub fn notify_changed(&self, source: &dyn Changeable) {
        if self.notifying.replace(true) {
            log::warn!("ChangeSubject: suppressed re-entrant change notification");
            return;
        }
        let _guard = NotifyGuard(&self.notifying);

        let snapshot = self.listeners.borrow().clone();
        for listener in &snapshot {
            if !self.has_listener(listener) {
                continue;
            }
            if let Some(listener) = listener.upgrade() {
                listener.notify_changed(source);
            }
        }

        self.listeners.borrow_mut().retain(|l| l.strong_count() > 0);
    }
}

impl std::fmt::Debug for ChangeSubject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeSubject")
            .field("listeners", &self.listener_count())
            .field("notifying", &self.notifying.get())
            .finish()
    }
}
