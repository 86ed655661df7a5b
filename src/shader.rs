//! Shader objects.
//!
//! A [`Shader`] compiles one pipeline stage from a [`StringSource`]. It is a
//! [`ChangeListener`] of its source (new text is uploaded and the shader drops
//! back to uncompiled) and a [`Changeable`] for the programs it is attached to
//! (every source change and every compilation notifies them).

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::backend::{ObjectId, ObjectKind, ShaderType};
use crate::change::{ChangeListener, ChangeSubject, Changeable};
use crate::context::Context;
use crate::error::GlError;
use crate::handle::ObjectHandle;
use crate::source::{StaticStringSource, StringSource};

/// A shader object.
pub struct Shader {
    this: Weak<Shader>,
    handle: ObjectHandle,
    shader_type: ShaderType,
    source: RefCell<Option<Rc<dyn StringSource>>>,
    compiled: Cell<bool>,
    subject: ChangeSubject,
}

impl Shader {
    /// Create a shader, optionally with a source (uploaded immediately).
    pub fn new(
        context: &Rc<Context>,
        shader_type: ShaderType,
        source: Option<Rc<dyn StringSource>>,
    ) -> Rc<Self> {
        let shader = Rc::new_cyclic(|this| Self {
            this: this.clone(),
            handle: ObjectHandle::acquire(context, ObjectKind::Shader(shader_type)),
            shader_type,
            source: RefCell::new(None),
            compiled: Cell::new(false),
            subject: ChangeSubject::new(),
        });
        if let Some(source) = source {
            shader.set_source(source);
        }
        shader
    }

    /// Create a shader from a source string.
    pub fn from_string(context: &Rc<Context>, shader_type: ShaderType, source: &str) -> Rc<Self> {
        Self::new(context, shader_type, Some(StaticStringSource::new(source)))
    }

    pub fn id(&self) -> ObjectId {
        self.handle.id()
    }

    pub fn handle(&self) -> &ObjectHandle {
        &self.handle
    }

    pub fn shader_type(&self) -> ShaderType {
        self.shader_type
    }

    pub fn source(&self) -> Option<Rc<dyn StringSource>> {
        self.source.borrow().clone()
    }

    /// Replace the source, upload it and invalidate dependent programs.
    pub fn set_source(&self, source: Rc<dyn StringSource>) {
        let previous = self.source.replace(Some(Rc::clone(&source)));
        if let Some(previous) = previous {
            previous.change_subject().deregister_listener(&self.listener());
        }
        source.change_subject().register_listener(self.listener());
        self.update_source();
    }

    /// Replace the source with a plain string.
    pub fn set_source_string(&self, source: &str) {
        self.set_source(StaticStringSource::new(source));
    }

    /// Compile the current source. Returns whether compilation succeeded.
    ///
    /// Failures are reported with the compiler diagnostics. Either way the
    /// programs this shader is attached to are notified.
    pub fn compile(&self) -> bool {
        if !self.handle.ensure_valid("compile_shader") {
            return false;
        }
        let context = self.handle.context();
        let backend = context.backend();

        backend.compile_shader(self.id());
        context.check_error("compile_shader");
        let compiled = backend.compile_status(self.id());
        self.compiled.set(compiled);

        if compiled {
            log::trace!("Shader: compiled {} shader {}", self.shader_type.name(), self.id());
        } else {
            context.report(GlError::CompileFailed {
                kind: self.handle.kind(),
                id: self.id(),
                source_info: self.short_info(),
                info_log: self.info_log(),
            });
        }

        self.changed();
        compiled
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.get()
    }

    /// Compiler diagnostics of the last compilation.
    pub fn info_log(&self) -> String {
        if !self.handle.is_valid() {
            return String::new();
        }
        self.handle.context().backend().shader_info_log(self.id())
    }

    /// Number of programs this shader is attached to.
    pub fn program_count(&self) -> usize {
        self.subject.listener_count()
    }

    fn short_info(&self) -> String {
        self.source
            .borrow()
            .as_ref()
            .map_or_else(|| "<no source>".to_string(), |s| s.short_info())
    }

    fn listener(&self) -> Weak<dyn ChangeListener> {
        self.this.clone()
    }

    fn update_source(&self) {
        self.compiled.set(false);
        if !self.handle.ensure_valid("shader_source") {
            return;
        }
        let text = self
            .source
            .borrow()
            .as_ref()
            .map(|source| source.string())
            .unwrap_or_default();

        let context = self.handle.context();
        context.backend().shader_source(self.id(), &text);
        context.check_error("shader_source");
        log::trace!("Shader: uploaded source of shader {}", self.id());

        self.changed();
    }
}

impl ChangeListener for Shader {
    fn notify_changed(&self, _changeable: &dyn Changeable) {
        self.update_source();
    }
}

impl Changeable for Shader {
    fn change_subject(&self) -> &ChangeSubject {
        &self.subject
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        if let Some(source) = self.source.get_mut().take() {
            source.change_subject().deregister_listener(&self.listener());
        }
    }
}

impl std::fmt::Debug for Shader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shader")
            .field("id", &self.id())
            .field("type", &self.shader_type)
            .field("compiled", &self.compiled.get())
            .finish()
    }
}

static_assertions::assert_not_impl_any!(Shader: Send, Sync);

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
    fn test_source_is_uploaded_on_creation() {
        let (backend, context) = create_test_context();
        let shader = Shader::from_string(&context, ShaderType::Vertex, "void main() {}");
        assert_eq!(
            backend.shader_source_of(shader.id()).as_deref(),
            Some("void main() {}")
        );
        assert!(!shader.is_compiled());
    }

    #[test]
    fn test_compile_success_and_failure() {
        let (_backend, context) = create_test_context();
        let shader = Shader::from_string(&context, ShaderType::Fragment, "void main() {}");
        assert!(shader.compile());
        assert!(shader.is_compiled());

        shader.set_source_string("#error nope");
        assert!(!shader.is_compiled());
        assert!(!shader.compile());
        assert!(shader.info_log().contains("#error"));
        assert!(matches!(
            context.errors().last_error(),
            Some(GlError::CompileFailed { .. })
        ));
    }

    #[test]
    fn test_source_change_resets_compiled_state() {
        let (backend, context) = create_test_context();
        let source = StaticStringSource::new("void main() {}");
        let shader = Shader::new(&context, ShaderType::Compute, Some(source.clone()));
        assert!(shader.compile());

        source.set_string("void main() { }");
        assert!(!shader.is_compiled());
        assert_eq!(
            backend.shader_source_of(shader.id()).as_deref(),
            Some("void main() { }")
        );
    }

    #[test]
    fn test_drop_deregisters_from_source() {
        let (backend, context) = create_test_context();
        let source = StaticStringSource::new("void main() {}");
        let shader = Shader::new(&context, ShaderType::Vertex, Some(source.clone()));
        let id = shader.id();
        assert_eq!(source.change_subject().listener_count(), 1);

        drop(shader);
        assert_eq!(source.change_subject().listener_count(), 0);
        assert_eq!(backend.delete_count(id), 1);
    }

    #[test]
    fn test_replacing_source_moves_listener() {
        let (_backend, context) = create_test_context();
        let first = StaticStringSource::new("void main() {}");
        let second = StaticStringSource::new("void main() {}");
        let shader = Shader::new(&context, ShaderType::Vertex, Some(first.clone()));

        shader.set_source(second.clone());
        assert_eq!(first.change_subject().listener_count(), 0);
        assert_eq!(second.change_subject().listener_count(), 1);
    }
}
