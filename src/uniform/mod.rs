//! Named uniform values shared between programs.
//!
//! A [`Uniform`] is created independently of any program and can be added to
//! many of them. It keeps its current value and notifies every program it was
//! added to when that value changes. Each program then either uploads the new
//! value right away (same type, program linked and clean) or marks itself dirty
//! and picks the value up on its next relink.

mod value;

pub use value::{UniformType, UniformValue};

use std::cell::RefCell;
use std::rc::Rc;

use crate::change::{ChangeSubject, Changeable};
use crate::program::LocationIdentity;

/// A uniform value addressed by name or explicit location.
pub struct Uniform {
    identity: LocationIdentity,
    value: RefCell<UniformValue>,
    subject: ChangeSubject,
}

impl Uniform {
    /// Create a uniform with an initial value.
    pub fn new(identity: impl Into<LocationIdentity>, value: impl Into<UniformValue>) -> Rc<Self> {
        Rc::new(Self {
            identity: identity.into(),
            value: RefCell::new(value.into()),
            subject: ChangeSubject::new(),
        })
    }

    pub fn identity(&self) -> &LocationIdentity {
        &self.identity
    }

    /// The uniform name, if it is addressed by name.
    pub fn name(&self) -> Option<&str> {
        self.identity.name()
    }

    /// A copy of the current value.
    pub fn value(&self) -> UniformValue {
        self.value.borrow().clone()
    }

    pub fn value_type(&self) -> UniformType {
        self.value.borrow().ty()
    }

    /// Replace the value and notify every program this uniform was added to.
    pub fn set(&self, value: impl Into<UniformValue>) {
        *self.value.borrow_mut() = value.into();
        self.changed();
    }

    /// Number of programs this uniform is currently added to.
    pub fn program_count(&self) -> usize {
        self.subject.listener_count()
    }
}

impl Changeable for Uniform {
    fn change_subject(&self) -> &ChangeSubject {
        &self.subject
    }
}

impl std::fmt::Debug for Uniform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Uniform")
            .field("identity", &self.identity)
            .field("value", &self.value.borrow())
            .finish()
    }
}

static_assertions::assert_not_impl_any!(Uniform: Send, Sync);
