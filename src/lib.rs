//! # gl-objects
//!
//! Lifetime management and lazy re-validation for handle-based graphics
//! objects.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`ObjectHandle`] - Ownership of one native object id, released exactly once
//! - [`ChangeSubject`] / [`ChangeListener`] - Synchronous change fan-out over weak back-references
//! - [`Program`] - Composite of [`Shader`]s, [`Uniform`]s and block bindings that relinks lazily
//! - [`Registry`] - Membership tables for bulk operations, e.g. reloading every [`File`]
//! - [`Context`] - Explicit owner of the backend, error channel and registries
//! - [`GlBackend`] - Trait for the native layer, with [`DummyBackend`] for testing
//!
//! ## Example
//!
//! ```ignore
//! use gl_objects::{Context, DummyBackend, ShaderType, Uniform};
//!
//! let context = Context::with_backend(Rc::new(DummyBackend::new()));
//! let program = context.create_program();
//! program.attach(&context.create_shader(ShaderType::Vertex, VERTEX_SOURCE));
//! program.add_uniform(Uniform::new("transform", Mat4::IDENTITY));
//!
//! // Links here, then applies every uniform
//! let location = program.uniform_location("transform");
//! ```

pub mod backend;

mod buffer;
mod change;
mod context;
mod error;
mod handle;
mod program;
mod registry;
mod shader;
mod source;
mod uniform;

// Re-export main types for convenience
pub use backend::{
    BackendError, BackendResult, BufferTarget, BufferUsage, DummyBackend, GlBackend, ObjectId,
    ObjectKind, ShaderType, INVALID_INDEX, INVALID_LOCATION,
};
pub use buffer::Buffer;
pub use change::{ChangeListener, ChangeSubject, Changeable};
pub use context::{Context, ContextConfig};
pub use error::{ErrorChannel, GlError};
pub use handle::ObjectHandle;
pub use program::{LocationIdentity, Program, UniformBlock, ValidationState};
pub use registry::{FileRegistry, Registry};
pub use shader::Shader;
pub use source::{File, StaticStringSource, StringSource};
pub use uniform::{Uniform, UniformType, UniformValue};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the object layer.
///
/// Only announces the library version; there is no global state to set up.
pub fn init() {
    log::info!("gl-objects v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_dummy_backend() {
        let backend = DummyBackend::new();
        assert!(backend.name() == "Dummy");
    }
}
