//! Graphics context.
//!
//! The [`Context`] is the explicit owner of everything process-wide: the native
//! backend, the error channel, the file registry and the bookkeeping of live
//! objects. Objects keep their context alive through an `Rc`, the context only
//! tracks them weakly, so teardown order is always objects first, then context.

use std::cell::RefCell;
use std::path::Path;
use std::rc::{Rc, Weak};

use crate::backend::{BufferTarget, GlBackend, ObjectId, ShaderType};
use crate::buffer::Buffer;
use crate::error::{ErrorChannel, GlError};
use crate::program::Program;
use crate::registry::FileRegistry;
use crate::shader::Shader;
use crate::source::{File, StringSource};

/// Configuration for a [`Context`].
#[derive(Debug, Clone)]
pub struct ContextConfig {
    /// Label used in log output.
    pub label: String,
    /// Poll the native layer for pending errors after each call.
    pub check_errors: bool,
    /// Compile attached shaders on demand while relinking a program. When
    /// disabled, an uncompiled shader fails validation.
    pub compile_on_link: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            label: "gl-objects".to_string(),
            check_errors: true,
            compile_on_link: true,
        }
    }
}

impl ContextConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_error_checking(mut self, enabled: bool) -> Self {
        self.check_errors = enabled;
        self
    }

    pub fn with_compile_on_link(mut self, enabled: bool) -> Self {
        self.compile_on_link = enabled;
        self
    }
}

/// Owner of the native backend and of process-wide bookkeeping.
///
/// # Thread Safety
///
/// The native layer is bound to one thread, and so is the context: it is
/// neither `Send` nor `Sync`.
///
/// # Example
///
/// ```ignore
/// let context = Context::new(Rc::new(DummyBackend::new()), ContextConfig::default());
/// let program = context.create_program();
/// program.attach(&context.create_shader(ShaderType::Vertex, VERTEX_SOURCE));
/// let location = program.uniform_location("transform");
/// ```
pub struct Context {
    backend: Rc<dyn GlBackend>,
    config: ContextConfig,
    errors: ErrorChannel,
    files: FileRegistry,
    // Weak tracking only, for counts and debugging
    programs: RefCell<Vec<Weak<Program>>>,
    shaders: RefCell<Vec<Weak<Shader>>>,
    buffers: RefCell<Vec<Weak<Buffer>>>,
}

impl Context {
    /// Create a context on top of a native backend.
    pub fn new(backend: Rc<dyn GlBackend>, config: ContextConfig) -> Rc<Self> {
        log::info!(
            "Creating context '{}' on {} backend",
            config.label,
            backend.name()
        );
        Rc::new(Self {
            backend,
            config,
            errors: ErrorChannel::new(),
            files: FileRegistry::new("files"),
            programs: RefCell::new(Vec::new()),
            shaders: RefCell::new(Vec::new()),
            buffers: RefCell::new(Vec::new()),
        })
    }

    /// Create a context with the default configuration.
    pub fn with_backend(backend: Rc<dyn GlBackend>) -> Rc<Self> {
        Self::new(backend, ContextConfig::default())
    }

    /// The native backend.
    pub fn backend(&self) -> &dyn GlBackend {
        self.backend.as_ref()
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// The reporting channel for recovered errors.
    pub fn errors(&self) -> &ErrorChannel {
        &self.errors
    }

    /// Report a recovered error.
    pub fn report(&self, error: GlError) {
        self.errors.report(error);
    }

    /// Drain errors left pending by the native layer after `operation`.
    ///
    /// Returns `true` if no error was pending (or checking is disabled).
    pub fn check_error(&self, operation: &'static str) -> bool {
        if !self.config.check_errors {
            return true;
        }
        let mut clean = true;
        while let Some(code) = self.backend.get_error() {
            clean = false;
            self.report(GlError::Native { operation, code });
        }
        clean
    }

    /// Registry of every open [`File`].
    pub fn files(&self) -> &FileRegistry {
        &self.files
    }

    /// Re-read every registered file, notifying the shaders that use them.
    pub fn reload_all_files(&self) {
        self.files.reload_all();
    }

    /// Create a program with no shaders attached.
    pub fn create_program(self: &Rc<Self>) -> Rc<Program> {
        let program = Program::new(self);
        track(&self.programs, &program);
        log::trace!("Context: created program {}", program.id());
        program
    }

    /// Create a shader from a source string.
    pub fn create_shader(self: &Rc<Self>, shader_type: ShaderType, source: &str) -> Rc<Shader> {
        let shader = Shader::from_string(self, shader_type, source);
        self.track_shader(&shader);
        shader
    }

    /// Create a shader whose source is read from a file.
    pub fn create_shader_from_file(
        self: &Rc<Self>,
        shader_type: ShaderType,
        path: impl AsRef<Path>,
    ) -> Rc<Shader> {
        let file: Rc<dyn StringSource> = File::open(self, path);
        let shader = Shader::new(self, shader_type, Some(file));
        self.track_shader(&shader);
        shader
    }

    /// Create a buffer bound to `target` by default.
    pub fn create_buffer(self: &Rc<Self>, target: BufferTarget) -> Rc<Buffer> {
        let buffer = Rc::new(Buffer::new(self, target));
        track(&self.buffers, &buffer);
        log::trace!("Context: created buffer {} ({:?})", buffer.id(), target);
        buffer
    }

    /// Wrap a buffer created outside this layer. It is never deleted by us.
    pub fn wrap_buffer(self: &Rc<Self>, id: ObjectId, target: BufferTarget) -> Rc<Buffer> {
        let buffer = Rc::new(Buffer::from_id(self, id, target));
        track(&self.buffers, &buffer);
        buffer
    }

    fn track_shader(&self, shader: &Rc<Shader>) {
        track(&self.shaders, shader);
        log::trace!(
            "Context: created {} shader {}",
            shader.shader_type().name(),
            shader.id()
        );
    }

    /// Get the number of live programs created by this context.
    pub fn program_count(&self) -> usize {
        self.programs
            .borrow()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Get the number of live shaders created by this context.
    pub fn shader_count(&self) -> usize {
        self.shaders
            .borrow()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Get the number of live buffers created by this context.
    pub fn buffer_count(&self) -> usize {
        self.buffers
            .borrow()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Clean up dead weak references to released objects.
    pub fn cleanup_dead_resources(&self) {
        self.programs.borrow_mut().retain(|w| w.strong_count() > 0);
        self.shaders.borrow_mut().retain(|w| w.strong_count() > 0);
        self.buffers.borrow_mut().retain(|w| w.strong_count() > 0);
    }
}

/// Remember `object` weakly, dropping entries of released objects.
fn track<T>(list: &RefCell<Vec<Weak<T>>>, object: &Rc<T>) {
    let mut list = list.borrow_mut();
    list.retain(|w| w.strong_count() > 0);
    list.push(Rc::downgrade(object));
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("label", &self.config.label)
            .field("backend", &self.backend.name())
            .field("files", &self.files.len())
            .finish()
    }
}

static_assertions::assert_not_impl_any!(Context: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DummyBackend, ErrorCode};

    fn create_test_context() -> (Rc<DummyBackend>, Rc<Context>) {
        let backend = Rc::new(DummyBackend::new());
        let context = Context::with_backend(backend.clone());
        (backend, context)
    }

    #[test]
    fn test_config_builder() {
        let config = ContextConfig::new()
            .with_label("offscreen")
            .with_error_checking(false)
            .with_compile_on_link(false);
        assert_eq!(config.label, "offscreen");
        assert!(!config.check_errors);
        assert!(!config.compile_on_link);
    }

    #[test]
    fn test_check_error_drains_pending() {
        let (backend, context) = create_test_context();
        backend.push_error(ErrorCode::InvalidEnum);
        backend.push_error(ErrorCode::InvalidValue);
        assert!(!context.check_error("test"));
        assert_eq!(context.errors().error_count(), 2);
        assert!(context.check_error("test"));
    }

    #[test]
    fn test_check_error_disabled() {
        let backend = Rc::new(DummyBackend::new());
        let context = Context::new(
            backend.clone(),
            ContextConfig::new().with_error_checking(false),
        );
        backend.push_error(ErrorCode::OutOfMemory);
        assert!(context.check_error("test"));
        assert_eq!(context.errors().error_count(), 0);
    }

    #[test]
    fn test_resource_tracking() {
        let (_backend, context) = create_test_context();
        let program = context.create_program();
        {
            let _shader = context.create_shader(ShaderType::Vertex, "void main() {}");
            let _buffer = context.create_buffer(BufferTarget::Array);
            assert_eq!(context.shader_count(), 1);
            assert_eq!(context.buffer_count(), 1);
        }
        context.cleanup_dead_resources();
        assert_eq!(context.program_count(), 1);
        assert_eq!(context.shader_count(), 0);
        assert_eq!(context.buffer_count(), 0);
        drop(program);
        assert_eq!(context.program_count(), 0);
    }

    #[test]
    fn test_creation_prunes_released_entries() {
        let (_backend, context) = create_test_context();
        for _ in 0..4 {
            drop(context.create_buffer(BufferTarget::Array));
            drop(context.create_program());
        }
        let _buffer = context.create_buffer(BufferTarget::Array);
        let _program = context.create_program();
        assert_eq!(context.buffers.borrow().len(), 1);
        assert_eq!(context.programs.borrow().len(), 1);
        assert_eq!(context.buffer_count(), 1);
    }
}
