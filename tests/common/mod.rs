//! Common utilities for object layer integration tests.
//!
//! Every test runs against the [`DummyBackend`], which keeps enough state to
//! inspect what the object layer asked the native layer to do.

use std::rc::Rc;

use gl_objects::{Context, ContextConfig, DummyBackend, Program, Shader, ShaderType};

/// Vertex stage declaring one attribute and one uniform.
pub const VERTEX_SOURCE: &str = "\
layout(location = 0) in vec3 position;
uniform mat4 transform;
void main() {}
";

/// Fragment stage declaring a uniform, a uniform block and an output.
pub const FRAGMENT_SOURCE: &str = "\
uniform vec4 tint;
uniform Lights {
    vec4 positions[8];
};
out vec4 frag_color;
void main() {}
";

/// A source that never compiles.
pub const BROKEN_SOURCE: &str = "\
void main() {}
#error this stage is broken
";

/// Route log output through the test harness.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A context on a dummy backend, with the backend kept for inspection.
pub struct TestContext {
    pub backend: Rc<DummyBackend>,
    pub context: Rc<Context>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(ContextConfig::new().with_label("tests"))
    }

    pub fn with_config(config: ContextConfig) -> Self {
        init_logging();
        let backend = Rc::new(DummyBackend::new());
        let context = Context::new(backend.clone(), config);
        Self { backend, context }
    }

    pub fn vertex_shader(&self) -> Rc<Shader> {
        self.context.create_shader(ShaderType::Vertex, VERTEX_SOURCE)
    }

    pub fn fragment_shader(&self) -> Rc<Shader> {
        self.context
            .create_shader(ShaderType::Fragment, FRAGMENT_SOURCE)
    }

    pub fn broken_shader(&self) -> Rc<Shader> {
        self.context.create_shader(ShaderType::Fragment, BROKEN_SOURCE)
    }

    /// A program with the vertex and fragment stages attached, not linked yet.
    pub fn program(&self) -> Rc<Program> {
        let program = self.context.create_program();
        program.attach(&self.vertex_shader());
        program.attach(&self.fragment_shader());
        program
    }
}
