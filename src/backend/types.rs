//! Plain data types shared between the object layer and the native backend.

use std::fmt;

/// Location returned for names that do not resolve in a linked program.
pub const INVALID_LOCATION: i32 = -1;

/// Index returned for blocks or resources that do not resolve in a linked program.
pub const INVALID_INDEX: u32 = u32::MAX;

/// Native object identifier.
///
/// `ObjectId(0)` never names a live object. Handles whose creation failed carry
/// it so that every later call on them can be turned into a reported no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ObjectId(pub u32);

impl ObjectId {
    /// The invalid (null) identifier.
    pub const INVALID: Self = Self(0);

    /// Check if this id could name a live object.
    #[inline]
    pub const fn is_valid(&self) -> bool {
        self.0 != 0
    }

    /// Raw numeric value.
    #[inline]
    pub const fn raw(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Programmable pipeline stage a shader object belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderType {
    Vertex,
    TessControl,
    TessEvaluation,
    Geometry,
    Fragment,
    Compute,
}

impl ShaderType {
    /// Human readable stage name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Vertex => "vertex",
            Self::TessControl => "tessellation control",
            Self::TessEvaluation => "tessellation evaluation",
            Self::Geometry => "geometry",
            Self::Fragment => "fragment",
            Self::Compute => "compute",
        }
    }
}

/// Kind of native object behind a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Buffer,
    Shader(ShaderType),
    Program,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffer => write!(f, "buffer"),
            Self::Shader(ty) => write!(f, "{} shader", ty.name()),
            Self::Program => write!(f, "program"),
        }
    }
}

/// Error codes the native layer can leave pending after a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    InvalidEnum,
    InvalidValue,
    InvalidOperation,
    OutOfMemory,
    InvalidFramebufferOperation,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InvalidEnum => "GL_INVALID_ENUM",
            Self::InvalidValue => "GL_INVALID_VALUE",
            Self::InvalidOperation => "GL_INVALID_OPERATION",
            Self::OutOfMemory => "GL_OUT_OF_MEMORY",
            Self::InvalidFramebufferOperation => "GL_INVALID_FRAMEBUFFER_OPERATION",
        };
        f.write_str(name)
    }
}

/// Binding point a buffer can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferTarget {
    #[default]
    Array,
    ElementArray,
    Uniform,
    ShaderStorage,
    CopyRead,
    CopyWrite,
    PixelPack,
    PixelUnpack,
    TransformFeedback,
    DrawIndirect,
    DispatchIndirect,
    AtomicCounter,
}

/// Indexed binding points used by `bind_base`/`bind_range`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexedBufferTarget {
    Uniform,
    ShaderStorage,
    TransformFeedback,
    AtomicCounter,
}

/// Usage hint for buffer data stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferUsage {
    StreamDraw,
    StreamRead,
    StreamCopy,
    #[default]
    StaticDraw,
    StaticRead,
    StaticCopy,
    DynamicDraw,
    DynamicRead,
    DynamicCopy,
}

/// Queryable buffer parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferParameter {
    Size,
    Usage,
    Mapped,
}

/// Program interfaces addressable through `resource_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramInterface {
    Uniform,
    UniformBlock,
    ProgramInput,
    ProgramOutput,
    ShaderStorageBlock,
}

/// Per-uniform properties queryable through `active_uniforms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActiveUniformParameter {
    Type,
    Size,
    NameLength,
    BlockIndex,
    Offset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_object_id() {
        assert!(!ObjectId::INVALID.is_valid());
        assert!(ObjectId(7).is_valid());
        assert_eq!(ObjectId::default(), ObjectId::INVALID);
    }

    #[test]
    fn test_object_kind_display() {
        assert_eq!(ObjectKind::Program.to_string(), "program");
        assert_eq!(
            ObjectKind::Shader(ShaderType::Fragment).to_string(),
            "fragment shader"
        );
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::InvalidOperation.to_string(), "GL_INVALID_OPERATION");
    }
}
