//! Typed uniform values.

use glam::{IVec2, IVec3, IVec4, Mat2, Mat3, Mat4, UVec2, UVec3, UVec4, Vec2, Vec3, Vec4};

/// A value that can be uploaded to a uniform location.
#[derive(Debug, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    UInt(u32),
    Bool(bool),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    IVec2(IVec2),
    IVec3(IVec3),
    IVec4(IVec4),
    UVec2(UVec2),
    UVec3(UVec3),
    UVec4(UVec4),
    Mat2(Mat2),
    Mat3(Mat3),
    Mat4(Mat4),
    FloatArray(Vec<f32>),
    IntArray(Vec<i32>),
    Vec4Array(Vec<Vec4>),
    Mat4Array(Vec<Mat4>),
}

/// Discriminant of a [`UniformValue`].
///
/// A program re-applies a changed value in place only while the type stays the
/// same; a type change forces a relink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniformType {
    Float,
    Int,
    UInt,
    Bool,
    Vec2,
    Vec3,
    Vec4,
    IVec2,
    IVec3,
    IVec4,
    UVec2,
    UVec3,
    UVec4,
    Mat2,
    Mat3,
    Mat4,
    FloatArray,
    IntArray,
    Vec4Array,
    Mat4Array,
}

impl UniformValue {
    /// The type of this value.
    pub fn ty(&self) -> UniformType {
        match self {
            Self::Float(_) => UniformType::Float,
            Self::Int(_) => UniformType::Int,
            Self::UInt(_) => UniformType::UInt,
            Self::Bool(_) => UniformType::Bool,
            Self::Vec2(_) => UniformType::Vec2,
            Self::Vec3(_) => UniformType::Vec3,
            Self::Vec4(_) => UniformType::Vec4,
            Self::IVec2(_) => UniformType::IVec2,
            Self::IVec3(_) => UniformType::IVec3,
            Self::IVec4(_) => UniformType::IVec4,
            Self::UVec2(_) => UniformType::UVec2,
            Self::UVec3(_) => UniformType::UVec3,
            Self::UVec4(_) => UniformType::UVec4,
            Self::Mat2(_) => UniformType::Mat2,
            Self::Mat3(_) => UniformType::Mat3,
            Self::Mat4(_) => UniformType::Mat4,
            Self::FloatArray(_) => UniformType::FloatArray,
            Self::IntArray(_) => UniformType::IntArray,
            Self::Vec4Array(_) => UniformType::Vec4Array,
            Self::Mat4Array(_) => UniformType::Mat4Array,
        }
    }

    /// Number of array elements (1 for non-array values).
    pub fn len(&self) -> usize {
        match self {
            Self::FloatArray(v) => v.len(),
            Self::IntArray(v) => v.len(),
            Self::Vec4Array(v) => v.len(),
            Self::Mat4Array(v) => v.len(),
            _ => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

macro_rules! impl_from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for UniformValue {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from_value! {
    f32 => Float,
    i32 => Int,
    u32 => UInt,
    bool => Bool,
    Vec2 => Vec2,
    Vec3 => Vec3,
    Vec4 => Vec4,
    IVec2 => IVec2,
    IVec3 => IVec3,
    IVec4 => IVec4,
    UVec2 => UVec2,
    UVec3 => UVec3,
    UVec4 => UVec4,
    Mat2 => Mat2,
    Mat3 => Mat3,
    Mat4 => Mat4,
    Vec<f32> => FloatArray,
    Vec<i32> => IntArray,
    Vec<Vec4> => Vec4Array,
    Vec<Mat4> => Mat4Array,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_type() {
        assert_eq!(UniformValue::from(1.0f32).ty(), UniformType::Float);
        assert_eq!(UniformValue::from(Mat4::IDENTITY).ty(), UniformType::Mat4);
        assert_eq!(UniformValue::from(vec![Vec4::ONE; 3]).ty(), UniformType::Vec4Array);
    }

    #[test]
    fn test_value_len() {
        assert_eq!(UniformValue::from(3i32).len(), 1);
        assert_eq!(UniformValue::from(vec![0.0f32; 4]).len(), 4);
        assert!(UniformValue::from(Vec::<f32>::new()).is_empty());
    }
}
