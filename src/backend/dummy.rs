//! Dummy native backend for testing and development.
//!
//! This backend doesn't talk to a driver but simulates the object model of one:
//! objects get ids, shaders compile (a source containing `#error` fails),
//! programs link from their attached compiled shaders and expose the uniforms,
//! attributes and blocks declared in those sources. Every effect is recorded so
//! tests can inspect what the object layer actually did.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use glam::UVec3;

use crate::uniform::UniformValue;

use super::{
    ActiveUniformParameter, BackendError, BackendResult, BufferParameter, BufferTarget,
    BufferUsage, ErrorCode, GlBackend, IndexedBufferTarget, ObjectId, ObjectKind,
    ProgramInterface, ShaderType, INVALID_INDEX, INVALID_LOCATION,
};

#[derive(Debug, Default)]
struct DummyShader {
    source: String,
    compiled: bool,
    info_log: String,
}

#[derive(Debug, Default)]
struct DummyProgram {
    shaders: Vec<ObjectId>,
    linked: bool,
    info_log: String,
    uniforms: Vec<String>,
    attributes: Vec<String>,
    outputs: Vec<String>,
    blocks: Vec<String>,
    storage_blocks: Vec<String>,
    attribute_bindings: HashMap<String, u32>,
    frag_data_bindings: HashMap<String, u32>,
    uniform_values: HashMap<i32, UniformValue>,
    block_bindings: HashMap<u32, u32>,
    storage_bindings: HashMap<u32, u32>,
}

#[derive(Debug, Default)]
struct DummyBuffer {
    data: Vec<u8>,
    usage: Option<BufferUsage>,
}

#[derive(Debug)]
enum DummyObject {
    Buffer(DummyBuffer),
    Shader(ShaderType, DummyShader),
    Program(DummyProgram),
}

/// A recorded compute dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    pub groups: UVec3,
    pub group_size: Option<UVec3>,
}

#[derive(Debug, Default)]
struct DummyState {
    next_id: u32,
    objects: HashMap<ObjectId, DummyObject>,
    deleted: Vec<(ObjectKind, ObjectId)>,
    errors: VecDeque<ErrorCode>,
    fail_next_creation: bool,
    fail_next_link: bool,
    link_count: usize,
    compile_count: usize,
    current_program: ObjectId,
    buffer_bindings: HashMap<BufferTarget, ObjectId>,
    indexed_bindings: HashMap<(IndexedBufferTarget, u32), (ObjectId, Option<(usize, usize)>)>,
    dispatches: Vec<Dispatch>,
}

impl DummyState {
    fn push_error(&mut self, code: ErrorCode) {
        self.errors.push_back(code);
    }

    fn shader(&self, id: ObjectId) -> Option<&DummyShader> {
        match self.objects.get(&id) {
            Some(DummyObject::Shader(_, shader)) => Some(shader),
            _ => None,
        }
    }

    fn shader_mut(&mut self, id: ObjectId) -> Option<&mut DummyShader> {
        match self.objects.get_mut(&id) {
            Some(DummyObject::Shader(_, shader)) => Some(shader),
            _ => None,
        }
    }

    fn program(&self, id: ObjectId) -> Option<&DummyProgram> {
        match self.objects.get(&id) {
            Some(DummyObject::Program(program)) => Some(program),
            _ => None,
        }
    }

    fn program_mut(&mut self, id: ObjectId) -> Option<&mut DummyProgram> {
        match self.objects.get_mut(&id) {
            Some(DummyObject::Program(program)) => Some(program),
            _ => None,
        }
    }

    fn linked_program(&mut self, id: ObjectId) -> Option<&mut DummyProgram> {
        match self.objects.get_mut(&id) {
            Some(DummyObject::Program(program)) if program.linked => Some(program),
            Some(DummyObject::Program(_)) => {
                self.errors.push_back(ErrorCode::InvalidOperation);
                None
            }
            _ => {
                self.errors.push_back(ErrorCode::InvalidValue);
                None
            }
        }
    }

    fn bound_buffer_mut(&mut self, target: BufferTarget) -> Option<&mut DummyBuffer> {
        let id = self.buffer_bindings.get(&target).copied()?;
        match self.objects.get_mut(&id) {
            Some(DummyObject::Buffer(buffer)) => Some(buffer),
            _ => None,
        }
    }
}

/// Declarations gathered from the sources of a program's shaders.
#[derive(Default)]
struct Interface {
    uniforms: Vec<String>,
    attributes: Vec<String>,
    outputs: Vec<String>,
    blocks: Vec<String>,
    storage_blocks: Vec<String>,
}

impl Interface {
    fn scan(&mut self, ty: ShaderType, source: &str) {
        for line in source.lines() {
            let line = strip_layout(line.trim());
            let mut tokens = line.split_whitespace();
            let (Some(qualifier), Some(second)) = (tokens.next(), tokens.next()) else {
                continue;
            };
            let third = tokens.next();
            match qualifier {
                "uniform" if line.contains('{') || third.is_none() => {
                    push_unique(&mut self.blocks, identifier(second));
                }
                "uniform" => {
                    if let Some(name) = third {
                        push_unique(&mut self.uniforms, identifier(name));
                    }
                }
                "buffer" => push_unique(&mut self.storage_blocks, identifier(second)),
                "in" if ty == ShaderType::Vertex => {
                    if let Some(name) = third {
                        push_unique(&mut self.attributes, identifier(name));
                    }
                }
                "out" if ty == ShaderType::Fragment => {
                    if let Some(name) = third {
                        push_unique(&mut self.outputs, identifier(name));
                    }
                }
                _ => {}
            }
        }
    }
}

fn strip_layout(line: &str) -> &str {
    if line.starts_with("layout") {
        if let Some(end) = line.find(')') {
            return line[end + 1..].trim_start();
        }
    }
    line
}

fn identifier(token: &str) -> String {
    token
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .next()
        .unwrap_or_default()
        .to_string()
}

fn push_unique(names: &mut Vec<String>, name: String) {
    if !name.is_empty() && !names.contains(&name) {
        names.push(name);
    }
}

fn position(names: &[String], name: &str) -> Option<usize> {
    names.iter().position(|n| n == name)
}

/// Dummy native backend.
#[derive(Debug, Default)]
pub struct DummyBackend {
    state: RefCell<DummyState>,
}

impl DummyBackend {
    /// Create a new dummy backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next object creation fail.
    pub fn fail_next_creation(&self) {
        self.state.borrow_mut().fail_next_creation = true;
    }

    /// Make the next link fail even if every shader compiled.
    pub fn fail_next_link(&self) {
        self.state.borrow_mut().fail_next_link = true;
    }

    /// Queue an error as if the last native call had failed.
    pub fn push_error(&self, code: ErrorCode) {
        self.state.borrow_mut().push_error(code);
    }

    /// Every delete call received, in order.
    pub fn deleted_objects(&self) -> Vec<(ObjectKind, ObjectId)> {
        self.state.borrow().deleted.clone()
    }

    /// How many times `id` was deleted.
    pub fn delete_count(&self, id: ObjectId) -> usize {
        self.state
            .borrow()
            .deleted
            .iter()
            .filter(|(_, deleted)| *deleted == id)
            .count()
    }

    /// Whether `id` names a live object.
    pub fn is_alive(&self, id: ObjectId) -> bool {
        self.state.borrow().objects.contains_key(&id)
    }

    /// Number of live objects of all kinds.
    pub fn live_object_count(&self) -> usize {
        self.state.borrow().objects.len()
    }

    /// Number of link calls received.
    pub fn link_count(&self) -> usize {
        self.state.borrow().link_count
    }

    /// Number of compile calls received.
    pub fn compile_count(&self) -> usize {
        self.state.borrow().compile_count
    }

    /// Shaders currently attached to a program.
    pub fn attached_shaders(&self, program: ObjectId) -> Vec<ObjectId> {
        self.state
            .borrow()
            .program(program)
            .map(|p| p.shaders.clone())
            .unwrap_or_default()
    }

    /// Source last uploaded to a shader.
    pub fn shader_source_of(&self, shader: ObjectId) -> Option<String> {
        self.state.borrow().shader(shader).map(|s| s.source.clone())
    }

    /// Value last uploaded to a program location.
    pub fn uniform_value(&self, program: ObjectId, location: i32) -> Option<UniformValue> {
        self.state
            .borrow()
            .program(program)
            .and_then(|p| p.uniform_values.get(&location).cloned())
    }

    /// Binding last assigned to a uniform block.
    pub fn block_binding(&self, program: ObjectId, block_index: u32) -> Option<u32> {
        self.state
            .borrow()
            .program(program)
            .and_then(|p| p.block_bindings.get(&block_index).copied())
    }

    /// Binding last assigned to a shader storage block.
    pub fn storage_block_binding(&self, program: ObjectId, block_index: u32) -> Option<u32> {
        self.state
            .borrow()
            .program(program)
            .and_then(|p| p.storage_bindings.get(&block_index).copied())
    }

    /// Buffer currently bound to `target`.
    pub fn bound_buffer(&self, target: BufferTarget) -> ObjectId {
        self.state
            .borrow()
            .buffer_bindings
            .get(&target)
            .copied()
            .unwrap_or(ObjectId::INVALID)
    }

    /// Buffer and optional range bound to an indexed binding point.
    pub fn indexed_binding(
        &self,
        target: IndexedBufferTarget,
        index: u32,
    ) -> Option<(ObjectId, Option<(usize, usize)>)> {
        self.state
            .borrow()
            .indexed_bindings
            .get(&(target, index))
            .copied()
    }

    /// Data store contents of a buffer.
    pub fn buffer_contents(&self, buffer: ObjectId) -> Option<Vec<u8>> {
        match self.state.borrow().objects.get(&buffer) {
            Some(DummyObject::Buffer(b)) => Some(b.data.clone()),
            _ => None,
        }
    }

    /// Every compute dispatch received, in order.
    pub fn dispatches(&self) -> Vec<Dispatch> {
        self.state.borrow().dispatches.clone()
    }
}

impl GlBackend for DummyBackend {
    fn name(&self) -> &'static str {
        "Dummy"
    }

    fn get_error(&self) -> Option<ErrorCode> {
        self.state.borrow_mut().errors.pop_front()
    }

    fn create_object(&self, kind: ObjectKind) -> BackendResult<ObjectId> {
        let mut state = self.state.borrow_mut();
        if std::mem::take(&mut state.fail_next_creation) {
            return Err(BackendError::CreationFailed {
                kind,
                reason: "simulated allocation failure".to_string(),
            });
        }

        state.next_id += 1;
        let id = ObjectId(state.next_id);
        let object = match kind {
            ObjectKind::Buffer => DummyObject::Buffer(DummyBuffer::default()),
            ObjectKind::Shader(ty) => DummyObject::Shader(ty, DummyShader::default()),
            ObjectKind::Program => DummyObject::Program(DummyProgram::default()),
        };
        state.objects.insert(id, object);

        log::trace!("DummyBackend: created {} {}", kind, id);
        Ok(id)
    }

    fn delete_object(&self, kind: ObjectKind, id: ObjectId) {
        let mut state = self.state.borrow_mut();
        state.deleted.push((kind, id));
        if state.objects.remove(&id).is_none() {
            state.push_error(ErrorCode::InvalidValue);
            return;
        }
        if state.current_program == id {
            state.current_program = ObjectId::INVALID;
        }
        state.buffer_bindings.retain(|_, bound| *bound != id);
        log::trace!("DummyBackend: deleted {} {}", kind, id);
    }

    fn shader_source(&self, shader: ObjectId, source: &str) {
        let mut state = self.state.borrow_mut();
        match state.shader_mut(shader) {
            Some(s) => s.source = source.to_string(),
            None => state.push_error(ErrorCode::InvalidValue),
        }
    }

    fn compile_shader(&self, shader: ObjectId) {
        let mut state = self.state.borrow_mut();
        state.compile_count += 1;
        let Some(s) = state.shader_mut(shader) else {
            state.push_error(ErrorCode::InvalidValue);
            return;
        };

        if s.source.trim().is_empty() {
            s.compiled = false;
            s.info_log = "0:0: error: empty shader source".to_string();
        } else if let Some(line) = s.source.lines().position(|l| l.trim().starts_with("#error")) {
            s.compiled = false;
            s.info_log = format!("0:{}: error: #error directive", line + 1);
        } else {
            s.compiled = true;
            s.info_log.clear();
        }
    }

    fn compile_status(&self, shader: ObjectId) -> bool {
        self.state.borrow().shader(shader).is_some_and(|s| s.compiled)
    }

    fn shader_info_log(&self, shader: ObjectId) -> String {
        self.state
            .borrow()
            .shader(shader)
            .map(|s| s.info_log.clone())
            .unwrap_or_default()
    }

    fn attach_shader(&self, program: ObjectId, shader: ObjectId) {
        let mut state = self.state.borrow_mut();
        if state.shader(shader).is_none() {
            state.push_error(ErrorCode::InvalidValue);
            return;
        }
        match state.program_mut(program) {
            Some(p) if p.shaders.contains(&shader) => state.push_error(ErrorCode::InvalidOperation),
            Some(p) => p.shaders.push(shader),
            None => state.push_error(ErrorCode::InvalidValue),
        }
    }

    fn detach_shader(&self, program: ObjectId, shader: ObjectId) {
        let mut state = self.state.borrow_mut();
        let detached = match state.program_mut(program) {
            Some(p) => {
                let before = p.shaders.len();
                p.shaders.retain(|s| *s != shader);
                p.shaders.len() != before
            }
            None => false,
        };
        if !detached {
            state.push_error(ErrorCode::InvalidOperation);
        }
    }

    fn link_program(&self, program: ObjectId) {
        let mut state = self.state.borrow_mut();
        state.link_count += 1;
        let force_failure = std::mem::take(&mut state.fail_next_link);

        let Some(shaders) = state.program(program).map(|p| p.shaders.clone()) else {
            state.push_error(ErrorCode::InvalidValue);
            return;
        };

        let mut interface = Interface::default();
        let mut failure = None;
        if shaders.is_empty() {
            failure = Some("error: no shaders attached".to_string());
        }
        for shader in &shaders {
            match state.objects.get(shader) {
                Some(DummyObject::Shader(ty, s)) if s.compiled => interface.scan(*ty, &s.source),
                _ => failure = Some(format!("error: shader {shader} is not compiled")),
            }
        }
        if force_failure {
            failure = Some("error: simulated link failure".to_string());
        }

        let Some(p) = state.program_mut(program) else {
            return;
        };
        match failure {
            Some(log) => {
                p.linked = false;
                p.info_log = log;
            }
            None => {
                p.linked = true;
                p.info_log.clear();
                p.uniforms = interface.uniforms;
                p.attributes = interface.attributes;
                p.outputs = interface.outputs;
                p.blocks = interface.blocks;
                p.storage_blocks = interface.storage_blocks;
                p.uniform_values.clear();
                p.block_bindings.clear();
                p.storage_bindings.clear();
            }
        }
    }

    fn link_status(&self, program: ObjectId) -> bool {
        self.state.borrow().program(program).is_some_and(|p| p.linked)
    }

    fn program_info_log(&self, program: ObjectId) -> String {
        self.state
            .borrow()
            .program(program)
            .map(|p| p.info_log.clone())
            .unwrap_or_default()
    }

    fn use_program(&self, program: ObjectId) {
        let mut state = self.state.borrow_mut();
        if program.is_valid() && state.program(program).is_none() {
            state.push_error(ErrorCode::InvalidValue);
            return;
        }
        state.current_program = program;
    }

    fn current_program(&self) -> ObjectId {
        self.state.borrow().current_program
    }

    fn bind_attribute_location(&self, program: ObjectId, index: u32, name: &str) {
        let mut state = self.state.borrow_mut();
        match state.program_mut(program) {
            Some(p) => {
                p.attribute_bindings.insert(name.to_string(), index);
            }
            None => state.push_error(ErrorCode::InvalidValue),
        }
    }

    fn bind_frag_data_location(&self, program: ObjectId, color_number: u32, name: &str) {
        let mut state = self.state.borrow_mut();
        match state.program_mut(program) {
            Some(p) => {
                p.frag_data_bindings.insert(name.to_string(), color_number);
            }
            None => state.push_error(ErrorCode::InvalidValue),
        }
    }

    fn attribute_location(&self, program: ObjectId, name: &str) -> i32 {
        let mut state = self.state.borrow_mut();
        let Some(p) = state.linked_program(program) else {
            return INVALID_LOCATION;
        };
        match position(&p.attributes, name) {
            Some(i) => p
                .attribute_bindings
                .get(name)
                .map_or(i as i32, |bound| *bound as i32),
            None => INVALID_LOCATION,
        }
    }

    fn uniform_location(&self, program: ObjectId, name: &str) -> i32 {
        let mut state = self.state.borrow_mut();
        state
            .linked_program(program)
            .and_then(|p| position(&p.uniforms, name))
            .map_or(INVALID_LOCATION, |i| i as i32)
    }

    fn frag_data_location(&self, program: ObjectId, name: &str) -> i32 {
        let mut state = self.state.borrow_mut();
        let Some(p) = state.linked_program(program) else {
            return INVALID_LOCATION;
        };
        match position(&p.outputs, name) {
            Some(i) => p
                .frag_data_bindings
                .get(name)
                .map_or(i as i32, |bound| *bound as i32),
            None => INVALID_LOCATION,
        }
    }

    fn frag_data_index(&self, program: ObjectId, name: &str) -> i32 {
        let mut state = self.state.borrow_mut();
        state
            .linked_program(program)
            .and_then(|p| position(&p.outputs, name))
            .map_or(INVALID_LOCATION, |_| 0)
    }

    fn uniform_block_index(&self, program: ObjectId, name: &str) -> u32 {
        let mut state = self.state.borrow_mut();
        state
            .linked_program(program)
            .and_then(|p| position(&p.blocks, name))
            .map_or(INVALID_INDEX, |i| i as u32)
    }

    fn resource_index(&self, program: ObjectId, interface: ProgramInterface, name: &str) -> u32 {
        let mut state = self.state.borrow_mut();
        let Some(p) = state.linked_program(program) else {
            return INVALID_INDEX;
        };
        let names = match interface {
            ProgramInterface::Uniform => &p.uniforms,
            ProgramInterface::UniformBlock => &p.blocks,
            ProgramInterface::ProgramInput => &p.attributes,
            ProgramInterface::ProgramOutput => &p.outputs,
            ProgramInterface::ShaderStorageBlock => &p.storage_blocks,
        };
        position(names, name).map_or(INVALID_INDEX, |i| i as u32)
    }

    fn active_uniforms(
        &self,
        program: ObjectId,
        indices: &[u32],
        parameter: ActiveUniformParameter,
    ) -> Vec<i32> {
        let mut state = self.state.borrow_mut();
        let Some(p) = state.linked_program(program) else {
            return vec![0; indices.len()];
        };
        let values: Option<Vec<i32>> = indices
            .iter()
            .map(|index| {
                let name = p.uniforms.get(*index as usize)?;
                Some(match parameter {
                    ActiveUniformParameter::Size => 1,
                    ActiveUniformParameter::NameLength => name.len() as i32 + 1,
                    ActiveUniformParameter::BlockIndex | ActiveUniformParameter::Offset => -1,
                    ActiveUniformParameter::Type => p
                        .uniform_values
                        .get(&(*index as i32))
                        .map_or(0, |value| value.ty() as i32 + 1),
                })
            })
            .collect();
        match values {
            Some(values) => values,
            None => {
                state.push_error(ErrorCode::InvalidValue);
                vec![0; indices.len()]
            }
        }
    }

    fn active_uniform_name(&self, program: ObjectId, index: u32) -> String {
        let mut state = self.state.borrow_mut();
        let name = state
            .linked_program(program)
            .and_then(|p| p.uniforms.get(index as usize).cloned());
        match name {
            Some(name) => name,
            None => {
                state.push_error(ErrorCode::InvalidValue);
                String::new()
            }
        }
    }

    fn set_uniform(&self, program: ObjectId, location: i32, value: &UniformValue) {
        let mut state = self.state.borrow_mut();
        let Some(p) = state.linked_program(program) else {
            return;
        };
        if location == INVALID_LOCATION {
            return;
        }
        if location < 0 || location as usize >= p.uniforms.len() {
            state.push_error(ErrorCode::InvalidOperation);
            return;
        }
        p.uniform_values.insert(location, value.clone());
    }

    fn uniform_block_binding(&self, program: ObjectId, block_index: u32, binding: u32) {
        let mut state = self.state.borrow_mut();
        let Some(p) = state.linked_program(program) else {
            return;
        };
        if block_index as usize >= p.blocks.len() {
            state.push_error(ErrorCode::InvalidValue);
            return;
        }
        p.block_bindings.insert(block_index, binding);
    }

    fn shader_storage_block_binding(&self, program: ObjectId, block_index: u32, binding: u32) {
        let mut state = self.state.borrow_mut();
        let Some(p) = state.linked_program(program) else {
            return;
        };
        if block_index as usize >= p.storage_blocks.len() {
            state.push_error(ErrorCode::InvalidValue);
            return;
        }
        p.storage_bindings.insert(block_index, binding);
    }

    fn dispatch_compute(&self, groups: UVec3) {
        self.dispatch(groups, None);
    }

    fn dispatch_compute_group_size(&self, groups: UVec3, group_size: UVec3) {
        self.dispatch(groups, Some(group_size));
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: ObjectId) {
        let mut state = self.state.borrow_mut();
        if !buffer.is_valid() {
            state.buffer_bindings.remove(&target);
            return;
        }
        match state.objects.get(&buffer) {
            Some(DummyObject::Buffer(_)) => {
                state.buffer_bindings.insert(target, buffer);
            }
            _ => state.push_error(ErrorCode::InvalidValue),
        }
    }

    fn buffer_data(&self, target: BufferTarget, size: usize, data: Option<&[u8]>, usage: BufferUsage) {
        let mut state = self.state.borrow_mut();
        let Some(buffer) = state.bound_buffer_mut(target) else {
            state.push_error(ErrorCode::InvalidOperation);
            return;
        };
        buffer.data = match data {
            Some(bytes) => bytes[..size.min(bytes.len())].to_vec(),
            None => vec![0; size],
        };
        buffer.data.resize(size, 0);
        buffer.usage = Some(usage);
    }

    fn buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        let Some(buffer) = state.bound_buffer_mut(target) else {
            state.push_error(ErrorCode::InvalidOperation);
            return;
        };
        if offset + data.len() > buffer.data.len() {
            state.push_error(ErrorCode::InvalidValue);
            return;
        }
        buffer.data[offset..offset + data.len()].copy_from_slice(data);
    }

    fn buffer_parameter(&self, target: BufferTarget, parameter: BufferParameter) -> i64 {
        let mut state = self.state.borrow_mut();
        let Some(buffer) = state.bound_buffer_mut(target) else {
            state.push_error(ErrorCode::InvalidOperation);
            return 0;
        };
        match parameter {
            BufferParameter::Size => buffer.data.len() as i64,
            BufferParameter::Usage => buffer.usage.map_or(0, |u| u as i64 + 1),
            BufferParameter::Mapped => 0,
        }
    }

    fn bind_buffer_base(&self, target: IndexedBufferTarget, index: u32, buffer: ObjectId) {
        let mut state = self.state.borrow_mut();
        state.indexed_bindings.insert((target, index), (buffer, None));
    }

    fn bind_buffer_range(
        &self,
        target: IndexedBufferTarget,
        index: u32,
        buffer: ObjectId,
        offset: usize,
        size: usize,
    ) {
        let mut state = self.state.borrow_mut();
        if size == 0 {
            state.push_error(ErrorCode::InvalidValue);
            return;
        }
        state
            .indexed_bindings
            .insert((target, index), (buffer, Some((offset, size))));
    }

    fn copy_buffer_sub_data(
        &self,
        read_target: BufferTarget,
        write_target: BufferTarget,
        read_offset: usize,
        write_offset: usize,
        size: usize,
    ) {
        let mut state = self.state.borrow_mut();
        let source = match state.bound_buffer_mut(read_target) {
            Some(buffer) if read_offset + size <= buffer.data.len() => {
                buffer.data[read_offset..read_offset + size].to_vec()
            }
            _ => {
                state.push_error(ErrorCode::InvalidValue);
                return;
            }
        };
        match state.bound_buffer_mut(write_target) {
            Some(buffer) if write_offset + size <= buffer.data.len() => {
                buffer.data[write_offset..write_offset + size].copy_from_slice(&source);
            }
            _ => state.push_error(ErrorCode::InvalidValue),
        }
    }

    fn clear_buffer_data(&self, target: BufferTarget, pattern: &[u8]) {
        let mut state = self.state.borrow_mut();
        let Some(buffer) = state.bound_buffer_mut(target) else {
            state.push_error(ErrorCode::InvalidOperation);
            return;
        };
        if pattern.is_empty() {
            buffer.data.fill(0);
            return;
        }
        for (i, byte) in buffer.data.iter_mut().enumerate() {
            *byte = pattern[i % pattern.len()];
        }
    }
}

impl DummyBackend {
    fn dispatch(&self, groups: UVec3, group_size: Option<UVec3>) {
        let mut state = self.state.borrow_mut();
        let current = state.current_program;
        if state.program(current).map_or(true, |p| !p.linked) {
            state.push_error(ErrorCode::InvalidOperation);
            return;
        }
        state.dispatches.push(Dispatch { groups, group_size });
    }
}
