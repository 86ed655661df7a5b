//! Error types and the reporting channel.
//!
//! Native failures never escalate: they are converted to a [`GlError`] and sent
//! through the [`ErrorChannel`] of the owning [`Context`](crate::Context), which
//! logs them and forwards them to an optional callback. Callers observe the
//! consequence as an `Invalid` program or a sentinel return value.

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;

use thiserror::Error;

use crate::backend::{BackendError, ErrorCode, ObjectId, ObjectKind};

/// Errors reported by the object layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GlError {
    #[error("failed to create {kind}: {source}")]
    CreationFailed {
        kind: ObjectKind,
        #[source]
        source: BackendError,
    },
    #[error("{operation} on invalid {kind} handle")]
    InvalidHandle {
        kind: ObjectKind,
        operation: &'static str,
    },
    #[error("{operation} failed with {code}")]
    Native {
        operation: &'static str,
        code: ErrorCode,
    },
    #[error("compiler error in {kind} {id} ({source_info}):\n{info_log}")]
    CompileFailed {
        kind: ObjectKind,
        id: ObjectId,
        source_info: String,
        info_log: String,
    },
    #[error("linker error in program {id}:\n{info_log}")]
    LinkFailed { id: ObjectId, info_log: String },
    #[error("failed to read {}: {reason}", .path.display())]
    Io { path: PathBuf, reason: String },
}

type ErrorCallback = Rc<dyn Fn(&GlError)>;

/// Process-wide reporting channel for recovered errors.
#[derive(Default)]
pub struct ErrorChannel {
    callback: RefCell<Option<ErrorCallback>>,
    last: RefCell<Option<GlError>>,
    count: Cell<usize>,
}

impl ErrorChannel {
    /// Create a channel without a callback.
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a recovered error.
    pub fn report(&self, error: GlError) {
        log::error!("{error}");
        self.count.set(self.count.get() + 1);
        // The callback may replace itself or report again
        let callback = self.callback.borrow().clone();
        if let Some(callback) = callback {
            callback(&error);
        }
        *self.last.borrow_mut() = Some(error);
    }

    /// Install a callback invoked for every reported error.
    pub fn set_callback(&self, callback: impl Fn(&GlError) + 'static) {
        *self.callback.borrow_mut() = Some(Rc::new(callback));
    }

    /// Remove the callback.
    pub fn clear_callback(&self) {
        self.callback.borrow_mut().take();
    }

    /// The most recently reported error.
    pub fn last_error(&self) -> Option<GlError> {
        self.last.borrow().clone()
    }

    /// Take the most recently reported error, leaving none.
    pub fn take_last_error(&self) -> Option<GlError> {
        self.last.borrow_mut().take()
    }

    /// Number of errors reported so far.
    pub fn error_count(&self) -> usize {
        self.count.get()
    }
}

impl std::fmt::Debug for ErrorChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorChannel")
            .field("count", &self.count.get())
            .field("last", &self.last.borrow())
            .field("has_callback", &self.callback.borrow().is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    #[test]
    fn test_error_display() {
        let err = GlError::Native {
            operation: "link_program",
            code: ErrorCode::InvalidOperation,
        };
        assert_eq!(err.to_string(), "link_program failed with GL_INVALID_OPERATION");

        let err = GlError::InvalidHandle {
            kind: ObjectKind::Buffer,
            operation: "bind",
        };
        assert_eq!(err.to_string(), "bind on invalid buffer handle");
    }

    #[test]
    fn test_channel_records_and_forwards() {
        let channel = ErrorChannel::new();
        let seen = Rc::new(Cell::new(0));
        let counter = Rc::clone(&seen);
        channel.set_callback(move |_| counter.set(counter.get() + 1));

        channel.report(GlError::LinkFailed {
            id: ObjectId(3),
            info_log: "boom".to_string(),
        });
        assert_eq!(channel.error_count(), 1);
        assert_eq!(seen.get(), 1);
        assert!(matches!(channel.last_error(), Some(GlError::LinkFailed { .. })));

        channel.clear_callback();
        channel.report(GlError::Native {
            operation: "use_program",
            code: ErrorCode::InvalidValue,
        });
        assert_eq!(seen.get(), 1);
        assert_eq!(channel.error_count(), 2);
        assert!(channel.take_last_error().is_some());
        assert!(channel.last_error().is_none());
    }

    #[test]
    fn test_callback_can_clear_itself() {
        let channel = Rc::new(ErrorChannel::new());
        let seen = Rc::new(Cell::new(0));
        let counter = Rc::clone(&seen);
        let weak = Rc::downgrade(&channel);
        channel.set_callback(move |_| {
            counter.set(counter.get() + 1);
            if let Some(channel) = weak.upgrade() {
                channel.clear_callback();
            }
        });

        let error = GlError::Native {
            operation: "use_program",
            code: ErrorCode::InvalidOperation,
        };
        channel.report(error.clone());
        channel.report(error);
        assert_eq!(seen.get(), 1);
        assert_eq!(channel.error_count(), 2);
    }
}
