//! Native graphics layer abstraction.
//!
//! The object layer never talks to a driver directly. Every native call goes
//! through [`GlBackend`], an object-safe trait with `&self` methods modelled on
//! the stateful, handle-based graphics API underneath. Errors that the native
//! layer leaves pending are polled with [`GlBackend::get_error`] after the call,
//! so that failures are reported instead of aborting.
//!
//! [`DummyBackend`] is a deterministic in-memory implementation for tests and
//! headless development.

mod dummy;
mod types;

pub use dummy::DummyBackend;
pub use types::*;

use glam::UVec3;
use thiserror::Error;

use crate::uniform::UniformValue;

/// Errors returned by native object creation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("failed to create {kind}: {reason}")]
    CreationFailed { kind: ObjectKind, reason: String },
    #[error("out of memory")]
    OutOfMemory,
    #[error("context lost")]
    ContextLost,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// The native resource layer.
///
/// Implementations are bound to a single context on a single thread. Calls
/// that fail leave an [`ErrorCode`] pending, which the caller picks up with
/// [`GlBackend::get_error`].
pub trait GlBackend {
    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Pop the oldest pending error, if any.
    fn get_error(&self) -> Option<ErrorCode>;

    // Object lifetime

    /// Create a native object of the given kind.
    fn create_object(&self, kind: ObjectKind) -> BackendResult<ObjectId>;

    /// Destroy a native object.
    fn delete_object(&self, kind: ObjectKind, id: ObjectId);

    // Shaders

    /// Replace the source string of a shader.
    fn shader_source(&self, shader: ObjectId, source: &str);

    /// Compile a shader.
    fn compile_shader(&self, shader: ObjectId);

    /// Whether the last compilation succeeded.
    fn compile_status(&self, shader: ObjectId) -> bool;

    /// Compiler diagnostics of the last compilation.
    fn shader_info_log(&self, shader: ObjectId) -> String;

    // Programs

    fn attach_shader(&self, program: ObjectId, shader: ObjectId);

    fn detach_shader(&self, program: ObjectId, shader: ObjectId);

    /// Link a program from its currently attached shaders.
    fn link_program(&self, program: ObjectId);

    /// Whether the last link succeeded.
    fn link_status(&self, program: ObjectId) -> bool;

    /// Linker diagnostics of the last link.
    fn program_info_log(&self, program: ObjectId) -> String;

    /// Make a program current, `ObjectId::INVALID` unbinds.
    fn use_program(&self, program: ObjectId);

    fn current_program(&self) -> ObjectId;

    fn bind_attribute_location(&self, program: ObjectId, index: u32, name: &str);

    fn bind_frag_data_location(&self, program: ObjectId, color_number: u32, name: &str);

    fn attribute_location(&self, program: ObjectId, name: &str) -> i32;

    fn uniform_location(&self, program: ObjectId, name: &str) -> i32;

    fn frag_data_location(&self, program: ObjectId, name: &str) -> i32;

    fn frag_data_index(&self, program: ObjectId, name: &str) -> i32;

    fn uniform_block_index(&self, program: ObjectId, name: &str) -> u32;

    fn resource_index(&self, program: ObjectId, interface: ProgramInterface, name: &str) -> u32;

    fn active_uniforms(
        &self,
        program: ObjectId,
        indices: &[u32],
        parameter: ActiveUniformParameter,
    ) -> Vec<i32>;

    fn active_uniform_name(&self, program: ObjectId, index: u32) -> String;

    /// Upload a uniform value to a program location.
    fn set_uniform(&self, program: ObjectId, location: i32, value: &UniformValue);

    fn uniform_block_binding(&self, program: ObjectId, block_index: u32, binding: u32);

    fn shader_storage_block_binding(&self, program: ObjectId, block_index: u32, binding: u32);

    fn dispatch_compute(&self, groups: UVec3);

    fn dispatch_compute_group_size(&self, groups: UVec3, group_size: UVec3);

    // Buffers

    fn bind_buffer(&self, target: BufferTarget, buffer: ObjectId);

    /// (Re)allocate the data store of the buffer bound to `target`.
    ///
    /// `data` is `None` for an uninitialised store of `size` bytes.
    fn buffer_data(&self, target: BufferTarget, size: usize, data: Option<&[u8]>, usage: BufferUsage);

    fn buffer_sub_data(&self, target: BufferTarget, offset: usize, data: &[u8]);

    fn buffer_parameter(&self, target: BufferTarget, parameter: BufferParameter) -> i64;

    fn bind_buffer_base(&self, target: IndexedBufferTarget, index: u32, buffer: ObjectId);

    fn bind_buffer_range(
        &self,
        target: IndexedBufferTarget,
        index: u32,
        buffer: ObjectId,
        offset: usize,
        size: usize,
    );

    fn copy_buffer_sub_data(
        &self,
        read_target: BufferTarget,
        write_target: BufferTarget,
        read_offset: usize,
        write_offset: usize,
        size: usize,
    );

    /// Fill the buffer bound to `target` with a repeated pattern.
    fn clear_buffer_data(&self, target: BufferTarget, pattern: &[u8]);
}
