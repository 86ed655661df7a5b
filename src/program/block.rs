//! Uniform block bindings.

use crate::backend::INVALID_INDEX;

use super::LocationIdentity;

/// A uniform block of a program and the binding point assigned to it.
///
/// Blocks are owned by their program. The index is re-derived after every
/// successful link and the binding is re-applied with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniformBlock {
    identity: LocationIdentity,
    index: u32,
    binding: Option<u32>,
}

impl UniformBlock {
    pub(crate) fn new(identity: LocationIdentity) -> Self {
        Self {
            identity,
            index: INVALID_INDEX,
            binding: None,
        }
    }

    pub fn identity(&self) -> &LocationIdentity {
        &self.identity
    }

    /// Block index in the linked program, `INVALID_INDEX` if unknown.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Binding point, if one was assigned.
    pub fn binding(&self) -> Option<u32> {
        self.binding
    }

    /// Whether the block resolved to an index in the last successful link.
    pub fn is_valid(&self) -> bool {
        self.index != INVALID_INDEX
    }

    pub(crate) fn set_index(&mut self, index: u32) {
        self.index = index;
    }

    pub(crate) fn set_binding(&mut self, binding: u32) {
        self.binding = Some(binding);
    }
}
