//! Typed capability lookup for data sources.

use std::any::{type_name, Any, TypeId};
use std::collections::HashSet;

/// An output surface of a data source, such as "emits track updates".
///
/// A source holds at most one interface of each type. An interface may also
/// answer lookups for broader interface types by exposing views of them
/// through [`ancestors`](Self::ancestors); two interfaces on one source may
/// never share any such type.
pub trait SourceInterface: Any {
    /// Every broader interface this one can be viewed as.
    fn ancestors(&self) -> Vec<AncestorView<'_>> {
        Vec::new()
    }
}

/// A borrowed view of an interface as one of its ancestor types.
pub struct AncestorView<'a> {
    type_id: TypeId,
    value: &'a (dyn Any + 'static),
}

impl<'a> AncestorView<'a> {
    pub fn of<A: SourceInterface>(value: &'a A) -> Self {
        Self {
            type_id: TypeId::of::<A>(),
            value,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }
}

type ViewFn = for<'a> fn(&'a (dyn Any + 'static), TypeId) -> Option<&'a (dyn Any + 'static)>;

fn view_as<'a, T: SourceInterface>(
    value: &'a (dyn Any + 'static),
    ty: TypeId,
) -> Option<&'a (dyn Any + 'static)> {
    value
        .downcast_ref::<T>()?
        .ancestors()
        .into_iter()
        .find(|view| view.type_id == ty)
        .map(|view| view.value)
}

/// One registered interface.
pub struct InterfaceEntry {
    name: &'static str,
    type_id: TypeId,
    covers: Vec<TypeId>,
    value: Box<dyn Any>,
    view: ViewFn,
}

impl InterfaceEntry {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn as_any(&self) -> &dyn Any {
        &*self.value
    }

    /// The interface viewed as `ty`, which is either its own type or one of
    /// its ancestors.
    pub fn view(&self, ty: TypeId) -> Option<&dyn Any> {
        if ty == self.type_id {
            Some(&*self.value)
        } else {
            (self.view)(&*self.value, ty)
        }
    }
}

impl std::fmt::Debug for InterfaceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterfaceEntry").field("name", &self.name).finish()
    }
}

/// The interfaces owned by one data source.
#[derive(Debug, Default)]
pub struct InterfaceRegistry {
    entries: Vec<InterfaceEntry>,
}

impl InterfaceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `interface`.
    ///
    /// # Panics
    ///
    /// Panics if `interface` overlaps, by its own type or any ancestor, an
    /// interface already registered. Such a source could not answer lookups
    /// unambiguously.
    pub fn add<T: SourceInterface>(&mut self, interface: T) {
        let mut covers = vec![TypeId::of::<T>()];
        covers.extend(interface.ancestors().iter().map(AncestorView::type_id));

        if let Some(existing) = self
            .entries
            .iter()
            .find(|e| e.covers.iter().any(|t| covers.contains(t)))
        {
            tracing::error!(
                "Interface {} overlaps already registered interface {}",
                type_name::<T>(),
                existing.name
            );
            panic!(
                "interface {} overlaps already registered interface {}",
                type_name::<T>(),
                existing.name
            );
        }

        self.entries.push(InterfaceEntry {
            name: type_name::<T>(),
            type_id: TypeId::of::<T>(),
            covers,
            value: Box::new(interface),
            view: view_as::<T>,
        });
    }

    /// The interface answering to `T`, directly or through an ancestor view.
    pub fn interface<T: SourceInterface>(&self) -> Option<&T> {
        let ty = TypeId::of::<T>();
        self.interface_by_type(ty)?.view(ty)?.downcast_ref::<T>()
    }

    pub fn has_interface<T: SourceInterface>(&self) -> bool {
        self.has_interface_type(TypeId::of::<T>())
    }

    /// Whether any interface answers to `ty`, directly or as an ancestor.
    pub fn has_interface_type(&self, ty: TypeId) -> bool {
        self.entries.iter().any(|e| e.covers.contains(&ty))
    }

    /// Entry answering to `ty`, directly or as an ancestor.
    pub fn interface_by_type(&self, ty: TypeId) -> Option<&InterfaceEntry> {
        self.entries.iter().find(|e| e.covers.contains(&ty))
    }

    pub fn interfaces(&self) -> impl Iterator<Item = &InterfaceEntry> + '_ {
        self.entries.iter()
    }

    /// Every type that some interface answers to.
    pub fn interface_types(&self) -> HashSet<TypeId> {
        self.entries
            .iter()
            .flat_map(|e| e.covers.iter().copied())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
