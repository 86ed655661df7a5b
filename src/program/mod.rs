//! Programs and their lazy re-validation.
//!
//! A [`Program`] is built from attached [`Shader`]s, [`Uniform`]s and block
//! bindings. It listens to every attached shader and uniform. Any attachment
//! change or notification marks it dirty, and the next operation that depends
//! on the linked state relinks first:
//!
//! 1. every attached shader that is not compiled yet is compiled; a failure
//!    makes the program [`Invalid`](ValidationState::Invalid) without a link,
//! 2. the native link runs and its status is queried,
//! 3. on success every cached location is re-derived, every uniform value is
//!    re-applied, then every block and storage block binding,
//! 4. on failure the linker log is reported and the location cache is kept as
//!    is; queries return sentinels until the next successful link.
//!
//! Either way `dirty` is cleared, so a failed link is not retried until the
//! next change.

mod block;
mod identity;

pub use block::UniformBlock;
pub use identity::LocationIdentity;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use glam::UVec3;

use crate::backend::{
    ActiveUniformParameter, ObjectId, ObjectKind, ProgramInterface, INVALID_INDEX,
    INVALID_LOCATION,
};
use crate::change::{ChangeListener, Changeable};
use crate::context::Context;
use crate::error::GlError;
use crate::handle::ObjectHandle;
use crate::shader::Shader;
use crate::uniform::{Uniform, UniformType, UniformValue};

/// Validity of a program's linked state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValidationState {
    /// No link attempted yet.
    #[default]
    Unvalidated,
    /// Relink in progress.
    Validating,
    /// Last link succeeded.
    Valid,
    /// Last link (or a required compilation) failed.
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum LocationKey {
    Uniform(String),
    Attribute(String),
}

/// A shader program.
///
/// # Example
///
/// ```ignore
/// let program = context.create_program();
/// program.attach(&vertex);
/// program.attach(&fragment);
/// program.add_uniform(Uniform::new("transform", Mat4::IDENTITY));
///
/// // Links on first use
/// program.use_program();
/// ```
pub struct Program {
    this: Weak<Program>,
    handle: ObjectHandle,
    state: Cell<ValidationState>,
    dirty: Cell<bool>,
    shaders: RefCell<Vec<Rc<Shader>>>,
    uniforms: RefCell<HashMap<LocationIdentity, Rc<Uniform>>>,
    // Type of the value last uploaded per uniform
    applied_types: RefCell<HashMap<LocationIdentity, UniformType>>,
    blocks: RefCell<HashMap<LocationIdentity, UniformBlock>>,
    storage_bindings: RefCell<HashMap<u32, u32>>,
    locations: RefCell<HashMap<LocationKey, i32>>,
}

impl Program {
    /// Create an empty program.
    pub fn new(context: &Rc<Context>) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            handle: ObjectHandle::acquire(context, ObjectKind::Program),
            state: Cell::new(ValidationState::Unvalidated),
            dirty: Cell::new(true),
            shaders: RefCell::new(Vec::new()),
            uniforms: RefCell::new(HashMap::new()),
            applied_types: RefCell::new(HashMap::new()),
            blocks: RefCell::new(HashMap::new()),
            storage_bindings: RefCell::new(HashMap::new()),
            locations: RefCell::new(HashMap::new()),
        })
    }

    pub fn id(&self) -> ObjectId {
        self.handle.id()
    }

    pub fn handle(&self) -> &ObjectHandle {
        &self.handle
    }

    pub fn context(&self) -> &Rc<Context> {
        self.handle.context()
    }

    /// Current validation state. Does not relink.
    pub fn validation_state(&self) -> ValidationState {
        self.state.get()
    }

    /// Whether the next validity-dependent operation will relink.
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Mark the linked state stale.
    pub fn invalidate(&self) {
        if !self.dirty.replace(true) {
            log::trace!("Program {}: marked dirty", self.id());
        }
    }

    /// Relink if anything changed since the last link.
    pub fn check_dirty(&self) {
        if self.dirty.get() {
            self.validate();
        }
    }

    /// Relink now, whether or not anything changed. Returns whether the link
    /// succeeded.
    pub fn link(&self) -> bool {
        self.validate();
        self.state.get() == ValidationState::Valid
    }

    /// Whether the program is linked, relinking first if dirty.
    pub fn is_linked(&self) -> bool {
        self.check_dirty();
        self.state.get() == ValidationState::Valid
    }

    /// Linker diagnostics of the last link.
    pub fn info_log(&self) -> String {
        if !self.handle.is_valid() {
            return String::new();
        }
        self.context().backend().program_info_log(self.id())
    }

    // Attachments

    /// Attach a shader. Attaching a shader twice only marks the program dirty.
    pub fn attach(&self, shader: &Rc<Shader>) {
        if self.is_attached(shader) {
            self.invalidate();
            return;
        }
        if self.handle.ensure_valid("attach_shader") && shader.handle().is_valid() {
            let context = self.context();
            context.backend().attach_shader(self.id(), shader.id());
            context.check_error("attach_shader");
        }
        shader.change_subject().register_listener(self.listener());
        self.shaders.borrow_mut().push(Rc::clone(shader));
        log::trace!("Program {}: attached shader {}", self.id(), shader.id());
        self.invalidate();
    }

    /// Attach several shaders.
    pub fn attach_all(&self, shaders: &[Rc<Shader>]) {
        for shader in shaders {
            self.attach(shader);
        }
    }

    /// Detach a shader, releasing this program's reference to it.
    pub fn detach(&self, shader: &Shader) {
        let removed = {
            let mut shaders = self.shaders.borrow_mut();
            shaders
                .iter()
                .position(|s| std::ptr::eq(s.as_ref(), shader))
                .map(|index| shaders.remove(index))
        };
        let Some(shader) = removed else {
            log::warn!(
                "Program {}: detaching shader {} that is not attached",
                self.id(),
                shader.id()
            );
            return;
        };
        self.detach_native(&shader);
        log::trace!("Program {}: detached shader {}", self.id(), shader.id());
        self.invalidate();
    }

    pub fn is_attached(&self, shader: &Shader) -> bool {
        self.shaders
            .borrow()
            .iter()
            .any(|s| std::ptr::eq(s.as_ref(), shader))
    }

    /// The attached shaders.
    pub fn shaders(&self) -> Vec<Rc<Shader>> {
        self.shaders.borrow().clone()
    }

    /// Add a uniform. A uniform already added under the same identity is
    /// replaced.
    pub fn add_uniform(&self, uniform: Rc<Uniform>) {
        let identity = uniform.identity().clone();
        let previous = self
            .uniforms
            .borrow_mut()
            .insert(identity.clone(), Rc::clone(&uniform));
        if let Some(previous) = previous {
            if !Rc::ptr_eq(&previous, &uniform) {
                previous.change_subject().deregister_listener(&self.listener());
            }
        }
        uniform.change_subject().register_listener(self.listener());
        self.applied_types.borrow_mut().remove(&identity);
        log::trace!("Program {}: added uniform {}", self.id(), identity);
        self.invalidate();
    }

    /// Remove the uniform added under `identity`.
    pub fn remove_uniform(&self, identity: impl Into<LocationIdentity>) -> Option<Rc<Uniform>> {
        let identity = identity.into();
        let removed = self.uniforms.borrow_mut().remove(&identity)?;
        removed.change_subject().deregister_listener(&self.listener());
        self.applied_types.borrow_mut().remove(&identity);
        self.invalidate();
        Some(removed)
    }

    /// The uniform added under `identity`, if any.
    pub fn get_uniform(&self, identity: impl Into<LocationIdentity>) -> Option<Rc<Uniform>> {
        self.uniforms.borrow().get(&identity.into()).cloned()
    }

    /// The uniform added under `identity`, added with `initial` if missing.
    pub fn uniform(
        &self,
        identity: impl Into<LocationIdentity>,
        initial: impl Into<UniformValue>,
    ) -> Rc<Uniform> {
        let identity = identity.into();
        if let Some(uniform) = self.get_uniform(identity.clone()) {
            return uniform;
        }
        let uniform = Uniform::new(identity, initial);
        self.add_uniform(Rc::clone(&uniform));
        uniform
    }

    /// Number of added uniforms.
    pub fn uniform_count(&self) -> usize {
        self.uniforms.borrow().len()
    }

    // Use and dispatch

    /// Make this program current. Returns `false` if it failed to link.
    pub fn use_program(&self) -> bool {
        self.check_dirty();
        if self.state.get() != ValidationState::Valid {
            log::warn!("Program {}: not used, program is not linked", self.id());
            return false;
        }
        let context = self.context();
        context.backend().use_program(self.id());
        context.check_error("use_program");
        true
    }

    /// Unbind whatever program is current.
    pub fn unuse(&self) {
        let context = self.context();
        context.backend().use_program(ObjectId::INVALID);
        context.check_error("use_program");
    }

    /// Whether this program is the current one.
    pub fn is_used(&self) -> bool {
        self.handle.is_valid() && self.context().backend().current_program() == self.id()
    }

    /// Use the program and dispatch `groups` work groups.
    pub fn dispatch_compute(&self, groups: UVec3) {
        if !self.use_program() {
            return;
        }
        let context = self.context();
        context.backend().dispatch_compute(groups);
        context.check_error("dispatch_compute");
    }

    /// Use the program and dispatch with a variable work group size.
    pub fn dispatch_compute_group_size(&self, groups: UVec3, group_size: UVec3) {
        if !self.use_program() {
            return;
        }
        let context = self.context();
        context.backend().dispatch_compute_group_size(groups, group_size);
        context.check_error("dispatch_compute_group_size");
    }

    // Pre-link bindings

    /// Bind a vertex attribute to `index`. Takes effect on the next link.
    pub fn bind_attribute_location(&self, index: u32, name: &str) {
        if !self.handle.ensure_valid("bind_attribute_location") {
            return;
        }
        let context = self.context();
        context.backend().bind_attribute_location(self.id(), index, name);
        context.check_error("bind_attribute_location");
        self.invalidate();
    }

    /// Bind a fragment output to `color_number`. Takes effect on the next link.
    pub fn bind_frag_data_location(&self, color_number: u32, name: &str) {
        if !self.handle.ensure_valid("bind_frag_data_location") {
            return;
        }
        let context = self.context();
        context
            .backend()
            .bind_frag_data_location(self.id(), color_number, name);
        context.check_error("bind_frag_data_location");
        self.invalidate();
    }

    // Derived queries
    //
    // All of these relink first if dirty and return sentinels unless the
    // program is valid.

    pub fn attribute_location(&self, name: &str) -> i32 {
        self.check_dirty();
        if !self.is_valid() {
            return INVALID_LOCATION;
        }
        self.location(LocationKey::Attribute(name.to_string()))
    }

    pub fn uniform_location(&self, name: &str) -> i32 {
        self.check_dirty();
        if !self.is_valid() {
            return INVALID_LOCATION;
        }
        self.location(LocationKey::Uniform(name.to_string()))
    }

    pub fn attribute_locations(&self, names: &[&str]) -> Vec<i32> {
        names.iter().map(|name| self.attribute_location(name)).collect()
    }

    pub fn uniform_locations(&self, names: &[&str]) -> Vec<i32> {
        names.iter().map(|name| self.uniform_location(name)).collect()
    }

    /// Cached location of a uniform, without relinking.
    ///
    /// The value may be stale if the program is dirty or the last link
    /// failed; check [`Program::validation_state`] before trusting it.
    pub fn cached_uniform_location(&self, name: &str) -> Option<i32> {
        self.locations
            .borrow()
            .get(&LocationKey::Uniform(name.to_string()))
            .copied()
    }

    pub fn frag_data_location(&self, name: &str) -> i32 {
        self.check_dirty();
        if !self.is_valid() {
            return INVALID_LOCATION;
        }
        let context = self.context();
        let location = context.backend().frag_data_location(self.id(), name);
        context.check_error("frag_data_location");
        location
    }

    pub fn frag_data_index(&self, name: &str) -> i32 {
        self.check_dirty();
        if !self.is_valid() {
            return INVALID_LOCATION;
        }
        let context = self.context();
        let index = context.backend().frag_data_index(self.id(), name);
        context.check_error("frag_data_index");
        index
    }

    pub fn uniform_block_index(&self, name: &str) -> u32 {
        self.check_dirty();
        if !self.is_valid() {
            return INVALID_INDEX;
        }
        self.block_index(&LocationIdentity::from(name))
    }

    pub fn resource_index(&self, interface: ProgramInterface, name: &str) -> u32 {
        self.check_dirty();
        if !self.is_valid() {
            return INVALID_INDEX;
        }
        let context = self.context();
        let index = context.backend().resource_index(self.id(), interface, name);
        context.check_error("resource_index");
        index
    }

    pub fn active_uniform(&self, index: u32, parameter: ActiveUniformParameter) -> i32 {
        self.active_uniforms(&[index], parameter)
            .first()
            .copied()
            .unwrap_or_default()
    }

    pub fn active_uniforms(&self, indices: &[u32], parameter: ActiveUniformParameter) -> Vec<i32> {
        self.check_dirty();
        if !self.is_valid() {
            return vec![0; indices.len()];
        }
        let context = self.context();
        let values = context.backend().active_uniforms(self.id(), indices, parameter);
        context.check_error("active_uniforms");
        values
    }

    pub fn active_uniform_name(&self, index: u32) -> String {
        self.check_dirty();
        if !self.is_valid() {
            return String::new();
        }
        let context = self.context();
        let name = context.backend().active_uniform_name(self.id(), index);
        context.check_error("active_uniform_name");
        name
    }

    // Blocks

    /// The uniform block under `identity`, created on first access.
    ///
    /// Creating the block entry does not mark the program dirty.
    pub fn uniform_block(&self, identity: impl Into<LocationIdentity>) -> UniformBlock {
        self.check_dirty();
        let identity = identity.into();
        let index = if self.is_valid() {
            self.block_index(&identity)
        } else {
            INVALID_INDEX
        };
        let mut blocks = self.blocks.borrow_mut();
        let block = blocks
            .entry(identity.clone())
            .or_insert_with(|| UniformBlock::new(identity));
        block.set_index(index);
        block.clone()
    }

    /// Assign a binding point to a uniform block. Kept across relinks.
    pub fn set_uniform_block_binding(&self, identity: impl Into<LocationIdentity>, binding: u32) {
        self.check_dirty();
        let identity = identity.into();
        let index = if self.is_valid() {
            self.block_index(&identity)
        } else {
            INVALID_INDEX
        };
        {
            let mut blocks = self.blocks.borrow_mut();
            let block = blocks
                .entry(identity.clone())
                .or_insert_with(|| UniformBlock::new(identity));
            block.set_index(index);
            block.set_binding(binding);
        }
        if index != INVALID_INDEX {
            let context = self.context();
            context.backend().uniform_block_binding(self.id(), index, binding);
            context.check_error("uniform_block_binding");
        }
    }

    /// Assign a binding point to a shader storage block. Kept across relinks.
    pub fn set_shader_storage_block_binding(&self, block_index: u32, binding: u32) {
        self.check_dirty();
        self.storage_bindings.borrow_mut().insert(block_index, binding);
        if self.is_valid() {
            let context = self.context();
            context
                .backend()
                .shader_storage_block_binding(self.id(), block_index, binding);
            context.check_error("shader_storage_block_binding");
        }
    }

    // Validation

    fn is_valid(&self) -> bool {
        self.state.get() == ValidationState::Valid
    }

    fn listener(&self) -> Weak<dyn ChangeListener> {
        self.this.clone()
    }

    fn validate(&self) {
        if self.state.get() == ValidationState::Validating {
            log::warn!("Program {}: relink requested while relinking, ignored", self.id());
            return;
        }
        log::debug!("Program {}: relinking", self.id());
        self.state.set(ValidationState::Validating);
        // Mutations made by error callbacks during the relink must survive it
        self.dirty.set(false);

        let linked = self.compile_shaders() && self.link_native();

        if linked {
            self.state.set(ValidationState::Valid);
            self.refresh_locations();
            self.apply_uniforms();
            self.apply_block_bindings();
            log::debug!("Program {}: linked", self.id());
        } else {
            self.state.set(ValidationState::Invalid);
            log::debug!("Program {}: link failed", self.id());
        }
    }

    fn compile_shaders(&self) -> bool {
        let compile_on_link = self.context().config().compile_on_link;
        let shaders = self.shaders();
        for shader in shaders.iter().filter(|s| !s.is_compiled()) {
            if !compile_on_link {
                self.context().report(GlError::LinkFailed {
                    id: self.id(),
                    info_log: format!("shader {} is not compiled", shader.id()),
                });
                return false;
            }
            if !shader.compile() {
                return false;
            }
        }
        true
    }

    fn link_native(&self) -> bool {
        if !self.handle.ensure_valid("link_program") {
            return false;
        }
        let context = self.context();
        let backend = context.backend();
        backend.link_program(self.id());
        context.check_error("link_program");
        if backend.link_status(self.id()) {
            return true;
        }
        context.report(GlError::LinkFailed {
            id: self.id(),
            info_log: backend.program_info_log(self.id()),
        });
        false
    }

    fn query_location(&self, key: &LocationKey) -> i32 {
        let context = self.context();
        let location = match key {
            LocationKey::Uniform(name) => context.backend().uniform_location(self.id(), name),
            LocationKey::Attribute(name) => context.backend().attribute_location(self.id(), name),
        };
        context.check_error("get_location");
        location
    }

    fn location(&self, key: LocationKey) -> i32 {
        let cached = self.locations.borrow().get(&key).copied();
        if let Some(location) = cached {
            return location;
        }
        let location = self.query_location(&key);
        self.locations.borrow_mut().insert(key, location);
        location
    }

    fn refresh_locations(&self) {
        let keys: Vec<LocationKey> = self.locations.borrow().keys().cloned().collect();
        for key in keys {
            let location = self.query_location(&key);
            self.locations.borrow_mut().insert(key, location);
        }
    }

    fn uniform_location_of(&self, identity: &LocationIdentity) -> i32 {
        match identity {
            LocationIdentity::Name(name) => self.location(LocationKey::Uniform(name.clone())),
            LocationIdentity::Location(location) => *location,
        }
    }

    fn apply_uniform(&self, uniform: &Uniform) {
        let location = self.uniform_location_of(uniform.identity());
        let value = uniform.value();
        let context = self.context();
        context.backend().set_uniform(self.id(), location, &value);
        context.check_error("set_uniform");
        self.applied_types
            .borrow_mut()
            .insert(uniform.identity().clone(), value.ty());
    }

    fn apply_uniforms(&self) {
        let uniforms: Vec<Rc<Uniform>> = self.uniforms.borrow().values().cloned().collect();
        for uniform in &uniforms {
            self.apply_uniform(uniform);
        }
    }

    fn block_index(&self, identity: &LocationIdentity) -> u32 {
        match identity {
            LocationIdentity::Name(name) => {
                let context = self.context();
                let index = context.backend().uniform_block_index(self.id(), name);
                context.check_error("uniform_block_index");
                index
            }
            LocationIdentity::Location(index) => u32::try_from(*index).unwrap_or(INVALID_INDEX),
        }
    }

    fn apply_block_bindings(&self) {
        let context = self.context();
        let backend = context.backend();

        let identities: Vec<LocationIdentity> = self.blocks.borrow().keys().cloned().collect();
        for identity in identities {
            let index = self.block_index(&identity);
            let binding = match self.blocks.borrow_mut().get_mut(&identity) {
                Some(block) => {
                    block.set_index(index);
                    block.binding()
                }
                None => None,
            };
            if let Some(binding) = binding.filter(|_| index != INVALID_INDEX) {
                backend.uniform_block_binding(self.id(), index, binding);
                context.check_error("uniform_block_binding");
            }
        }

        let storage: Vec<(u32, u32)> = self
            .storage_bindings
            .borrow()
            .iter()
            .map(|(&index, &binding)| (index, binding))
            .collect();
        for (index, binding) in storage {
            backend.shader_storage_block_binding(self.id(), index, binding);
            context.check_error("shader_storage_block_binding");
        }
    }

    /// The attached uniform that `changeable` is, if any.
    fn attached_uniform(&self, changeable: &dyn Changeable) -> Option<Rc<Uniform>> {
        let subject = changeable.change_subject();
        self.uniforms
            .borrow()
            .values()
            .find(|u| std::ptr::eq(u.change_subject(), subject))
            .cloned()
    }

    /// Upload a changed uniform in place if the linked state allows it.
    fn reapply_in_place(&self, uniform: &Uniform) -> bool {
        if !self.is_valid() || self.dirty.get() {
            return false;
        }
        let same_type = self.applied_types.borrow().get(uniform.identity()) == Some(&uniform.value_type());
        if same_type {
            self.apply_uniform(uniform);
        }
        same_type
    }

    fn detach_native(&self, shader: &Shader) {
        if self.handle.is_valid() && shader.handle().is_valid() {
            let context = self.context();
            context.backend().detach_shader(self.id(), shader.id());
            context.check_error("detach_shader");
        }
        shader.change_subject().deregister_listener(&self.listener());
    }
}

impl ChangeListener for Program {
    fn notify_changed(&self, changeable: &dyn Changeable) {
        if self.state.get() == ValidationState::Validating {
            return;
        }
        if let Some(uniform) = self.attached_uniform(changeable) {
            if self.reapply_in_place(&uniform) {
                return;
            }
        }
        self.invalidate();
    }
}

impl Drop for Program {
    fn drop(&mut self) {
        let shaders = std::mem::take(self.shaders.get_mut());
        for shader in &shaders {
            self.detach_native(shader);
        }
        let listener = self.listener();
        for uniform in self.uniforms.get_mut().values() {
            uniform.change_subject().deregister_listener(&listener);
        }
        log::trace!("Program {}: destroyed", self.id());
    }
}

impl std::fmt::Debug for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Program")
            .field("id", &self.id())
            .field("state", &self.state.get())
            .field("dirty", &self.dirty.get())
            .field("shaders", &self.shaders.borrow().len())
            .field("uniforms", &self.uniforms.borrow().len())
            .finish()
    }
}

static_assertions::assert_not_impl_any!(Program: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::GlBackend;
    use crate::backend::{DummyBackend, ShaderType};
    use crate::context::ContextConfig;
    use glam::{Mat4, Vec3};

    const VERTEX: &str = "in vec3 position;\nuniform mat4 transform;\nvoid main() {}";
    const FRAGMENT: &str = "uniform vec3 color;\nuniform Lights {\nout vec4 frag_color;\nvoid main() {}";

    fn create_test_context() -> (Rc<DummyBackend>, Rc<Context>) {
        let backend = Rc::new(DummyBackend::new());
        let context = Context::with_backend(backend.clone());
        (backend, context)
    }

    fn create_linked_program(context: &Rc<Context>) -> Rc<Program> {
        let program = context.create_program();
        program.attach(&context.create_shader(ShaderType::Vertex, VERTEX));
        program.attach(&context.create_shader(ShaderType::Fragment, FRAGMENT));
        program
    }

    #[test]
    fn test_new_program_is_dirty_and_unvalidated() {
        let (_backend, context) = create_test_context();
        let program = context.create_program();
        assert!(program.is_dirty());
        assert_eq!(program.validation_state(), ValidationState::Unvalidated);
    }

    #[test]
    fn test_query_links_lazily() {
        let (backend, context) = create_test_context();
        let program = create_linked_program(&context);
        assert_eq!(backend.link_count(), 0);

        assert_eq!(program.uniform_location("transform"), 0);
        assert_eq!(program.validation_state(), ValidationState::Valid);
        assert!(!program.is_dirty());
        assert_eq!(backend.link_count(), 1);

        // Clean program does not relink
        assert_eq!(program.uniform_location("color"), 1);
        assert_eq!(program.attribute_location("position"), 0);
        assert_eq!(backend.link_count(), 1);
    }

    #[test]
    fn test_program_without_shaders_is_invalid() {
        let (_backend, context) = create_test_context();
        let program = context.create_program();
        assert_eq!(program.uniform_location("anything"), INVALID_LOCATION);
        assert_eq!(program.validation_state(), ValidationState::Invalid);
        assert!(!program.is_dirty());
    }

    #[test]
    fn test_failed_compile_skips_link() {
        let (backend, context) = create_test_context();
        let program = context.create_program();
        program.attach(&context.create_shader(ShaderType::Vertex, "#error broken"));

        assert!(!program.link());
        assert_eq!(backend.link_count(), 0);
        assert!(matches!(
            context.errors().last_error(),
            Some(GlError::CompileFailed { .. })
        ));
    }

    #[test]
    fn test_failed_link_keeps_cache_but_returns_sentinel() {
        let (backend, context) = create_test_context();
        let program = create_linked_program(&context);
        assert_eq!(program.uniform_location("color"), 1);

        backend.fail_next_link();
        program.invalidate();
        assert_eq!(program.uniform_location("color"), INVALID_LOCATION);
        assert_eq!(program.validation_state(), ValidationState::Invalid);
        assert_eq!(program.cached_uniform_location("color"), Some(1));
        assert!(matches!(
            context.errors().last_error(),
            Some(GlError::LinkFailed { .. })
        ));

        // Not retried until something changes
        assert_eq!(program.uniform_location("color"), INVALID_LOCATION);
        assert_eq!(backend.link_count(), 2);
    }

    #[test]
    fn test_uniforms_applied_on_link() {
        let (backend, context) = create_test_context();
        let program = create_linked_program(&context);
        program.add_uniform(Uniform::new("color", Vec3::X));
        program.add_uniform(Uniform::new("transform", Mat4::IDENTITY));

        assert!(program.link());
        assert_eq!(
            backend.uniform_value(program.id(), 1),
            Some(UniformValue::Vec3(Vec3::X))
        );
        assert_eq!(
            backend.uniform_value(program.id(), 0),
            Some(UniformValue::Mat4(Mat4::IDENTITY))
        );
    }

    #[test]
    fn test_uniform_same_type_applied_in_place() {
        let (backend, context) = create_test_context();
        let program = create_linked_program(&context);
        let color = program.uniform("color", Vec3::X);
        assert!(program.link());

        color.set(Vec3::Y);
        assert!(!program.is_dirty());
        assert_eq!(
            backend.uniform_value(program.id(), 1),
            Some(UniformValue::Vec3(Vec3::Y))
        );
        assert_eq!(backend.link_count(), 1);
    }

    #[test]
    fn test_uniform_type_change_marks_dirty() {
        let (backend, context) = create_test_context();
        let program = create_linked_program(&context);
        let color = program.uniform("color", Vec3::X);
        assert!(program.link());

        color.set(1.0f32);
        assert!(program.is_dirty());
        assert!(program.is_linked());
        assert_eq!(
            backend.uniform_value(program.id(), 1),
            Some(UniformValue::Float(1.0))
        );
    }

    #[test]
    fn test_uniform_replaced_under_same_identity() {
        let (_backend, context) = create_test_context();
        let program = create_linked_program(&context);
        let first = Uniform::new("color", Vec3::X);
        let second = Uniform::new("color", Vec3::Z);

        program.add_uniform(first.clone());
        program.add_uniform(second.clone());
        assert_eq!(program.uniform_count(), 1);
        assert_eq!(first.program_count(), 0);
        assert_eq!(second.program_count(), 1);
        assert!(Rc::ptr_eq(&program.get_uniform("color").unwrap(), &second));
    }

    #[test]
    fn test_remove_uniform() {
        let (_backend, context) = create_test_context();
        let program = create_linked_program(&context);
        let color = program.uniform("color", Vec3::X);
        assert!(program.link());

        let removed = program.remove_uniform("color").unwrap();
        assert!(Rc::ptr_eq(&removed, &color));
        assert!(program.is_dirty());
        assert_eq!(color.program_count(), 0);
        assert!(program.remove_uniform("color").is_none());
    }

    #[test]
    fn test_reattach_only_marks_dirty() {
        let (backend, context) = create_test_context();
        let program = context.create_program();
        let shader = context.create_shader(ShaderType::Vertex, VERTEX);
        program.attach(&shader);
        assert!(program.link());

        program.attach(&shader);
        assert!(program.is_dirty());
        assert_eq!(program.shaders().len(), 1);
        assert_eq!(backend.attached_shaders(program.id()), vec![shader.id()]);
        assert_eq!(context.errors().error_count(), 0);
    }

    #[test]
    fn test_detach_unattached_is_ignored() {
        let (_backend, context) = create_test_context();
        let program = create_linked_program(&context);
        assert!(program.link());
        let stranger = context.create_shader(ShaderType::Vertex, VERTEX);

        program.detach(&stranger);
        assert!(!program.is_dirty());
        assert_eq!(program.shaders().len(), 2);
    }

    #[test]
    fn test_block_binding_survives_relink() {
        let (backend, context) = create_test_context();
        let program = create_linked_program(&context);

        program.set_uniform_block_binding("Lights", 3);
        let block = program.uniform_block("Lights");
        assert_eq!(block.index(), 0);
        assert_eq!(block.binding(), Some(3));
        assert_eq!(backend.block_binding(program.id(), 0), Some(3));

        program.invalidate();
        assert!(program.is_linked());
        assert_eq!(backend.block_binding(program.id(), 0), Some(3));
    }

    #[test]
    fn test_creating_block_entry_does_not_dirty() {
        let (_backend, context) = create_test_context();
        let program = create_linked_program(&context);
        let missing = program.uniform_block("Missing");
        assert!(!missing.is_valid());
        assert!(!program.is_dirty());
    }

    #[test]
    fn test_storage_block_binding_survives_relink() {
        let (backend, context) = create_test_context();
        let program = context.create_program();
        program.attach(&context.create_shader(
            ShaderType::Compute,
            "buffer Particles {\nvoid main() {}",
        ));

        program.set_shader_storage_block_binding(0, 5);
        assert_eq!(backend.storage_block_binding(program.id(), 0), Some(5));

        assert!(program.link());
        assert_eq!(backend.storage_block_binding(program.id(), 0), Some(5));
    }

    #[test]
    fn test_bound_attribute_location_takes_effect_after_relink() {
        let (_backend, context) = create_test_context();
        let program = create_linked_program(&context);
        assert_eq!(program.attribute_location("position"), 0);

        program.bind_attribute_location(7, "position");
        assert!(program.is_dirty());
        assert_eq!(program.attribute_location("position"), 7);
        assert_eq!(program.attribute_locations(&["position", "missing"]), vec![7, -1]);
    }

    #[test]
    fn test_frag_data_queries() {
        let (_backend, context) = create_test_context();
        let program = create_linked_program(&context);
        program.bind_frag_data_location(2, "frag_color");
        assert_eq!(program.frag_data_location("frag_color"), 2);
        assert_eq!(program.frag_data_index("frag_color"), 0);
        assert_eq!(program.frag_data_location("missing"), INVALID_LOCATION);
    }

    #[test]
    fn test_use_and_unuse() {
        let (backend, context) = create_test_context();
        let program = create_linked_program(&context);
        assert!(program.use_program());
        assert!(program.is_used());

        program.unuse();
        assert!(!program.is_used());
        assert_eq!(backend.current_program(), ObjectId::INVALID);
    }

    #[test]
    fn test_use_invalid_program_fails() {
        let (_backend, context) = create_test_context();
        let program = context.create_program();
        assert!(!program.use_program());
        assert!(!program.is_used());
    }

    #[test]
    fn test_dispatch_uses_program() {
        let (backend, context) = create_test_context();
        let program = context.create_program();
        program.attach(&context.create_shader(ShaderType::Compute, "void main() {}"));

        program.dispatch_compute(UVec3::new(8, 8, 1));
        program.dispatch_compute_group_size(UVec3::ONE, UVec3::new(64, 1, 1));
        let dispatches = backend.dispatches();
        assert_eq!(dispatches.len(), 2);
        assert_eq!(dispatches[0].groups, UVec3::new(8, 8, 1));
        assert_eq!(dispatches[1].group_size, Some(UVec3::new(64, 1, 1)));
    }

    #[test]
    fn test_active_uniform_queries() {
        let (_backend, context) = create_test_context();
        let program = create_linked_program(&context);
        assert_eq!(program.active_uniform_name(1), "color");
        assert_eq!(
            program.active_uniform(1, ActiveUniformParameter::NameLength),
            "color".len() as i32 + 1
        );
        assert_eq!(
            program.resource_index(ProgramInterface::ProgramOutput, "frag_color"),
            0
        );
        assert_eq!(program.uniform_block_index("Lights"), 0);
    }

    #[test]
    fn test_uncompiled_shader_fails_without_compile_on_link() {
        let backend = Rc::new(DummyBackend::new());
        let context = Context::new(
            backend.clone(),
            ContextConfig::new().with_compile_on_link(false),
        );
        let program = context.create_program();
        let shader = context.create_shader(ShaderType::Vertex, VERTEX);
        program.attach(&shader);

        assert!(!program.link());
        assert_eq!(backend.link_count(), 0);

        assert!(shader.compile());
        assert!(program.is_dirty());
        assert!(program.is_linked());
    }

    #[test]
    fn test_drop_detaches_everything() {
        let (backend, context) = create_test_context();
        let program = create_linked_program(&context);
        let shaders = program.shaders();
        let color = program.uniform("color", Vec3::X);
        let id = program.id();

        drop(program);
        assert_eq!(backend.delete_count(id), 1);
        assert!(shaders.iter().all(|s| s.program_count() == 0));
        assert_eq!(color.program_count(), 0);
    }
}
