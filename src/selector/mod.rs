//! Typed selection criteria.
//!
//! A [`Selector`] describes which slice of a node's data a consumer wants
//! (for example "the state nearest to time T"). Selectors are identified by
//! their concrete Rust type; a [`SelectorSet`] holds at most one selector of
//! each type.

pub mod set;
pub mod temporal;

pub use set::SelectorSet;
pub use temporal::{TemporalMode, TemporalSelector};

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a selector's concrete type.
#[derive(Clone, Copy)]
pub struct SelectorType {
    id: TypeId,
    name: &'static str,
}

impl SelectorType {
    pub fn of<S: Selector>() -> Self {
        Self {
            id: TypeId::of::<S>(),
            name: std::any::type_name::<S>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified type name, for diagnostics.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for SelectorType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for SelectorType {}

impl Hash for SelectorType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for SelectorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SelectorType({})", self.name)
    }
}

/// Object-safe plumbing implemented for every `Selector + Clone`.
pub trait DynSelector {
    fn clone_box(&self) -> Box<dyn Selector>;
    fn as_any(&self) -> &dyn Any;
    fn selector_type(&self) -> SelectorType;
}

impl<T: Selector + Clone> DynSelector for T {
    fn clone_box(&self) -> Box<dyn Selector> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn selector_type(&self) -> SelectorType {
        SelectorType::of::<T>()
    }
}

/// A selection criterion. Implement this (and derive `Clone`) for any
/// consumer-defined selector type.
pub trait Selector: DynSelector + fmt::Debug + Send + Sync + 'static {}

impl Clone for Box<dyn Selector> {
    fn clone(&self) -> Self {
        (**self).clone_box()
    }
}
