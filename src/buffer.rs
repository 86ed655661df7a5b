//! Buffer objects.

use std::cell::Cell;
use std::rc::Rc;

use bytemuck::Pod;

use crate::backend::{
    BufferParameter, BufferTarget, BufferUsage, IndexedBufferTarget, ObjectId, ObjectKind,
};
use crate::context::Context;
use crate::handle::ObjectHandle;

/// A buffer object.
///
/// Buffers are created by [`Context::create_buffer`] (owning) or wrapped with
/// [`Context::wrap_buffer`] (non-owning). Every data operation binds the buffer
/// to its current target first, so the target can be changed freely between
/// calls with [`Buffer::bind_to`].
///
/// # Example
///
/// ```ignore
/// let buffer = context.create_buffer(BufferTarget::Array);
/// buffer.set_data(&[0.0f32, 1.0, 2.0], BufferUsage::StaticDraw);
/// assert_eq!(buffer.size(), 12);
/// ```
pub struct Buffer {
    handle: ObjectHandle,
    target: Cell<BufferTarget>,
}

impl Buffer {
    /// Create a new buffer (called by Context).
    pub(crate) fn new(context: &Rc<Context>, target: BufferTarget) -> Self {
        Self {
            handle: ObjectHandle::acquire(context, ObjectKind::Buffer),
            target: Cell::new(target),
        }
    }

    /// Wrap an existing buffer (called by Context).
    pub(crate) fn from_id(context: &Rc<Context>, id: ObjectId, target: BufferTarget) -> Self {
        Self {
            handle: ObjectHandle::wrap(context, ObjectKind::Buffer, id),
            target: Cell::new(target),
        }
    }

    pub fn id(&self) -> ObjectId {
        self.handle.id()
    }

    pub fn handle(&self) -> &ObjectHandle {
        &self.handle
    }

    /// The target used by [`Buffer::bind`] and the data operations.
    pub fn target(&self) -> BufferTarget {
        self.target.get()
    }

    /// Bind to the current target.
    pub fn bind(&self) {
        if !self.handle.ensure_valid("bind_buffer") {
            return;
        }
        self.bind_native(self.target.get());
    }

    /// Change the target and bind to it.
    pub fn bind_to(&self, target: BufferTarget) {
        self.target.set(target);
        self.bind();
    }

    /// Unbind whatever buffer is bound to the current target.
    pub fn unbind(&self) {
        self.bind_native_id(self.target.get(), ObjectId::INVALID);
    }

    /// Upload `data`, replacing the whole data store.
    pub fn set_data<T: Pod>(&self, data: &[T], usage: BufferUsage) {
        if !self.handle.ensure_valid("buffer_data") {
            return;
        }
        let bytes: &[u8] = bytemuck::cast_slice(data);
        let target = self.target.get();
        self.bind_native(target);
        let context = self.handle.context();
        context
            .backend()
            .buffer_data(target, bytes.len(), Some(bytes), usage);
        context.check_error("buffer_data");
    }

    /// Update part of the data store starting at byte `offset`.
    pub fn set_sub_data<T: Pod>(&self, offset: usize, data: &[T]) {
        if !self.handle.ensure_valid("buffer_sub_data") {
            return;
        }
        let target = self.target.get();
        self.bind_native(target);
        let context = self.handle.context();
        context
            .backend()
            .buffer_sub_data(target, offset, bytemuck::cast_slice(data));
        context.check_error("buffer_sub_data");
    }

    /// Allocate an uninitialised data store of `size` bytes.
    pub fn allocate(&self, size: usize, usage: BufferUsage) {
        if !self.handle.ensure_valid("buffer_data") {
            return;
        }
        let target = self.target.get();
        self.bind_native(target);
        let context = self.handle.context();
        context.backend().buffer_data(target, size, None, usage);
        context.check_error("buffer_data");
    }

    pub fn parameter(&self, parameter: BufferParameter) -> i64 {
        if !self.handle.ensure_valid("buffer_parameter") {
            return 0;
        }
        let target = self.target.get();
        self.bind_native(target);
        let context = self.handle.context();
        let value = context.backend().buffer_parameter(target, parameter);
        context.check_error("buffer_parameter");
        value
    }

    /// Size of the data store in bytes.
    pub fn size(&self) -> usize {
        usize::try_from(self.parameter(BufferParameter::Size)).unwrap_or_default()
    }

    /// Bind to an indexed binding point.
    pub fn bind_base(&self, target: IndexedBufferTarget, index: u32) {
        if !self.handle.ensure_valid("bind_buffer_base") {
            return;
        }
        let context = self.handle.context();
        context.backend().bind_buffer_base(target, index, self.id());
        context.check_error("bind_buffer_base");
    }

    /// Bind a byte range to an indexed binding point.
    pub fn bind_range(&self, target: IndexedBufferTarget, index: u32, offset: usize, size: usize) {
        if !self.handle.ensure_valid("bind_buffer_range") {
            return;
        }
        let context = self.handle.context();
        context
            .backend()
            .bind_buffer_range(target, index, self.id(), offset, size);
        context.check_error("bind_buffer_range");
    }

    /// Copy `size` bytes from this buffer into `destination`.
    pub fn copy_sub_data(
        &self,
        destination: &Buffer,
        read_offset: usize,
        write_offset: usize,
        size: usize,
    ) {
        if !self.handle.ensure_valid("copy_buffer_sub_data")
            || !destination.handle.ensure_valid("copy_buffer_sub_data")
        {
            return;
        }
        self.bind_native(BufferTarget::CopyRead);
        destination.bind_native(BufferTarget::CopyWrite);
        let context = self.handle.context();
        context.backend().copy_buffer_sub_data(
            BufferTarget::CopyRead,
            BufferTarget::CopyWrite,
            read_offset,
            write_offset,
            size,
        );
        context.check_error("copy_buffer_sub_data");
    }

    /// Copy the first `size` bytes into `destination`.
    pub fn copy_data(&self, destination: &Buffer, size: usize) {
        self.copy_sub_data(destination, 0, 0, size);
    }

    /// Fill the data store with a repeated value.
    pub fn clear_data<T: Pod>(&self, value: &T) {
        if !self.handle.ensure_valid("clear_buffer_data") {
            return;
        }
        let target = self.target.get();
        self.bind_native(target);
        let context = self.handle.context();
        context
            .backend()
            .clear_buffer_data(target, bytemuck::bytes_of(value));
        context.check_error("clear_buffer_data");
    }

    fn bind_native(&self, target: BufferTarget) {
        self.bind_native_id(target, self.id());
    }

    fn bind_native_id(&self, target: BufferTarget, id: ObjectId) {
        let context = self.handle.context();
        context.backend().bind_buffer(target, id);
        context.check_error("bind_buffer");
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("id", &self.id())
            .field("target", &self.target.get())
            .field("owning", &self.handle.is_owning())
            .finish()
    }
}

static_assertions::assert_not_impl_any!(Buffer: Send, Sync);
