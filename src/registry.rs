//! Membership tables for bulk operations over live entities.
//!
//! A [`Registry`] does not own its entries. Entities register themselves when
//! they are created and deregister when they are dropped; the registry only
//! keeps weak references so it can run an operation over every live member
//! (e.g. reloading every open file).

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::source::File;

/// Registry of every open [`File`] of a context.
pub type FileRegistry = Registry<File>;

fn key<T: ?Sized>(entity: *const T) -> *const () {
    entity as *const ()
}

/// A set of registered entities, identified by address.
pub struct Registry<T: ?Sized> {
    name: &'static str,
    entries: RefCell<Vec<(*const (), Weak<T>)>>,
}

impl<T: ?Sized> Registry<T> {
    /// Create an empty registry. `name` is used in diagnostics.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: RefCell::new(Vec::new()),
        }
    }

    /// Add `entity`. Registering a member again has no effect.
    pub fn register(&self, entity: &Rc<T>) {
        if self.contains(entity) {
            return;
        }
        self.entries
            .borrow_mut()
            .push((key(Rc::as_ptr(entity)), Rc::downgrade(entity)));
    }

    /// Remove `entity`.
    ///
    /// Deregistering an entity that is not a member is a lifecycle bug in the
    /// caller: it panics in debug builds and is logged and ignored otherwise.
    pub fn deregister(&self, entity: &T) {
        let entity_key = key(entity as *const T);
        let removed = {
            let mut entries = self.entries.borrow_mut();
            let before = entries.len();
            entries.retain(|(k, _)| *k != entity_key);
            entries.len() != before
        };
        if !removed {
            log::error!(
                "Registry '{}': deregistering an entity that is not registered",
                self.name
            );
        }
        debug_assert!(
            removed,
            "Registry '{}': deregistering an entity that is not registered",
            self.name
        );
    }

    /// Whether `entity` is registered.
    pub fn contains(&self, entity: &T) -> bool {
        let entity_key = key(entity as *const T);
        self.entries.borrow().iter().any(|(k, _)| *k == entity_key)
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Apply `operation` to every registered entity still alive.
    ///
    /// Runs over a snapshot, so `operation` may register or deregister
    /// entities. No ordering is guaranteed.
    pub fn for_each_registered(&self, mut operation: impl FnMut(&Rc<T>)) {
        let snapshot: Vec<Weak<T>> = self
            .entries
            .borrow()
            .iter()
            .map(|(_, weak)| weak.clone())
            .collect();
        for entity in snapshot.iter().filter_map(Weak::upgrade) {
            operation(&entity);
        }
    }
}

impl Registry<File> {
    /// Re-read every registered file.
    pub fn reload_all(&self) {
        log::debug!("Registry '{}': reloading {} files", self.name, self.len());
        self.for_each_registered(|file| {
            if let Err(error) = file.reload() {
                file.context().report(error);
            }
        });
    }
}

impl<T: ?Sized> std::fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("name", &self.name)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct Entry {
        visits: Cell<usize>,
    }

    #[test]
    fn test_register_and_deregister() {
        let registry = Registry::<Entry>::new("test");
        let a = Rc::new(Entry::default());
        let b = Rc::new(Entry::default());

        registry.register(&a);
        registry.register(&a);
        registry.register(&b);
        assert_eq!(registry.len(), 2);

        registry.deregister(&a);
        assert!(!registry.contains(&a));
        assert!(registry.contains(&b));
    }

    #[test]
    fn test_for_each_registered() {
        let registry = Registry::<Entry>::new("test");
        let entries: Vec<_> = (0..3).map(|_| Rc::new(Entry::default())).collect();
        for entry in &entries {
            registry.register(entry);
        }

        registry.for_each_registered(|entry| entry.visits.set(entry.visits.get() + 1));
        assert!(entries.iter().all(|e| e.visits.get() == 1));
    }

    #[test]
    fn test_for_each_skips_dropped_entries() {
        let registry = Registry::<Entry>::new("test");
        let kept = Rc::new(Entry::default());
        registry.register(&kept);
        {
            let dropped = Rc::new(Entry::default());
            registry.register(&dropped);
        }

        let mut visited = 0;
        registry.for_each_registered(|_| visited += 1);
        assert_eq!(visited, 1);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "not registered")]
    fn test_deregister_non_member_panics_in_debug() {
        let registry = Registry::<Entry>::new("test");
        let entry = Rc::new(Entry::default());
        registry.deregister(&entry);
    }
}
