//! Addressing of uniforms and blocks inside a program.

use std::fmt;

/// Identifies a uniform or block either by name or by explicit location.
///
/// For blocks, `Location` is the block index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LocationIdentity {
    Name(String),
    Location(i32),
}

impl LocationIdentity {
    /// The name, if addressed by name.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name),
            Self::Location(_) => None,
        }
    }

    /// The explicit location, if addressed by location.
    pub fn location(&self) -> Option<i32> {
        match self {
            Self::Name(_) => None,
            Self::Location(location) => Some(*location),
        }
    }
}

impl fmt::Display for LocationIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "'{name}'"),
            Self::Location(location) => write!(f, "@{location}"),
        }
    }
}

impl From<&str> for LocationIdentity {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for LocationIdentity {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<i32> for LocationIdentity {
    fn from(location: i32) -> Self {
        Self::Location(location)
    }
}
