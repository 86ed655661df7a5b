//! Ownership of a single native object.

use std::cell::Cell;
use std::rc::Rc;

use crate::backend::{BackendError, ObjectId, ObjectKind};
use crate::context::Context;
use crate::error::GlError;

/// Owns exactly one native object id.
///
/// A handle either created its object ([`ObjectHandle::acquire`], owning) or
/// wraps an id supplied from outside ([`ObjectHandle::wrap`], non-owning). Only
/// owning handles delete their object, at most once, on [`release`] or drop.
///
/// If creation fails the handle carries [`ObjectId::INVALID`]; every operation
/// routed through [`ObjectHandle::ensure_valid`] then reports the misuse and
/// does nothing.
///
/// [`release`]: ObjectHandle::release
pub struct ObjectHandle {
    context: Rc<Context>,
    kind: ObjectKind,
    id: ObjectId,
    owning: bool,
    released: Cell<bool>,
}

impl ObjectHandle {
    /// Create a new native object owned by this handle.
    pub fn acquire(context: &Rc<Context>, kind: ObjectKind) -> Self {
        let id = match context.backend().create_object(kind) {
            Ok(id) if id.is_valid() => id,
            Ok(_) => {
                context.report(GlError::CreationFailed {
                    kind,
                    source: BackendError::CreationFailed {
                        kind,
                        reason: "native layer returned the null id".to_string(),
                    },
                });
                ObjectId::INVALID
            }
            Err(source) => {
                context.report(GlError::CreationFailed { kind, source });
                ObjectId::INVALID
            }
        };
        context.check_error("create_object");

        Self {
            context: Rc::clone(context),
            kind,
            id,
            owning: true,
            released: Cell::new(false),
        }
    }

    /// Wrap an externally created object. The object is never deleted here.
    pub fn wrap(context: &Rc<Context>, kind: ObjectKind, id: ObjectId) -> Self {
        Self {
            context: Rc::clone(context),
            kind,
            id,
            owning: false,
            released: Cell::new(false),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn context(&self) -> &Rc<Context> {
        &self.context
    }

    /// Whether this handle deletes its object on release.
    pub fn is_owning(&self) -> bool {
        self.owning
    }

    pub fn is_released(&self) -> bool {
        self.released.get()
    }

    /// Whether the id names a live object usable through this handle.
    pub fn is_valid(&self) -> bool {
        self.id.is_valid() && !self.released.get()
    }

    /// Report and return `false` if `operation` cannot run on this handle.
    pub fn ensure_valid(&self, operation: &'static str) -> bool {
        if self.is_valid() {
            return true;
        }
        self.context.report(GlError::InvalidHandle {
            kind: self.kind,
            operation,
        });
        false
    }

    /// Delete the native object if owned. Calling this again does nothing.
    pub fn release(&self) {
        if self.released.replace(true) {
            return;
        }
        if !self.owning || !self.id.is_valid() {
            return;
        }
        self.context.backend().delete_object(self.kind, self.id);
        self.context.check_error("delete_object");
        log::trace!("ObjectHandle: released {} {}", self.kind, self.id);
    }
}

impl Drop for ObjectHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectHandle")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("owning", &self.owning)
            .field("released", &self.released.get())
            .finish()
    }
}

static_assertions::assert_not_impl_any!(ObjectHandle: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DummyBackend;

    fn create_test_context() -> (Rc<DummyBackend>, Rc<Context>) {
        let backend = Rc::new(DummyBackend::new());
        let context = Context::with_backend(backend.clone());
        (backend, context)
    }

    #[test]
    fn test_release_is_idempotent() {
        let (backend, context) = create_test_context();
        let handle = ObjectHandle::acquire(&context, ObjectKind::Buffer);
        let id = handle.id();
        assert!(backend.is_alive(id));

        handle.release();
        handle.release();
        drop(handle);

        assert_eq!(backend.delete_count(id), 1);
        assert!(!backend.is_alive(id));
        assert_eq!(context.errors().error_count(), 0);
    }

    #[test]
    fn test_drop_releases_owned_object() {
        let (backend, context) = create_test_context();
        let id = {
            let handle = ObjectHandle::acquire(&context, ObjectKind::Program);
            handle.id()
        };
        assert_eq!(backend.delete_count(id), 1);
    }

    #[test]
    fn test_wrapped_handle_never_deletes() {
        let (backend, context) = create_test_context();
        let owner = ObjectHandle::acquire(&context, ObjectKind::Buffer);
        let wrapped = ObjectHandle::wrap(&context, ObjectKind::Buffer, owner.id());
        assert!(!wrapped.is_owning());

        wrapped.release();
        drop(wrapped);
        assert!(backend.is_alive(owner.id()));
        assert_eq!(backend.delete_count(owner.id()), 0);
    }

    #[test]
    fn test_creation_failure_yields_invalid_handle() {
        let (backend, context) = create_test_context();
        backend.fail_next_creation();
        let handle = ObjectHandle::acquire(&context, ObjectKind::Buffer);

        assert_eq!(handle.id(), ObjectId::INVALID);
        assert!(!handle.is_valid());
        assert!(matches!(
            context.errors().last_error(),
            Some(GlError::CreationFailed { .. })
        ));

        assert!(!handle.ensure_valid("bind"));
        assert!(matches!(
            context.errors().last_error(),
            Some(GlError::InvalidHandle { operation: "bind", .. })
        ));

        drop(handle);
        assert!(backend.deleted_objects().is_empty());
    }
}
