//! Copy-on-write selector collection.

use super::{Selector, SelectorType};
use std::collections::HashMap;
use std::sync::Arc;

/// Mapping from selector type to at most one selector of that type.
///
/// Cloning is O(1): clones share one backing store until either side is
/// mutated, at which point the mutating side deep-clones every selector.
/// A set handed to an in-flight request is therefore never changed under it.
#[derive(Clone, Default, Debug)]
pub struct SelectorSet {
    selectors: Arc<HashMap<SelectorType, Box<dyn Selector>>>,
}

impl SelectorSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with<S: Selector>(mut self, selector: S) -> Self {
        self.insert(selector);
        self
    }

    /// Insert `selector`, replacing any existing selector of the same type.
    pub fn insert<S: Selector>(&mut self, selector: S) {
        self.insert_boxed(Box::new(selector));
    }

    pub fn insert_boxed(&mut self, selector: Box<dyn Selector>) {
        let key = selector.selector_type();
        self.detach().insert(key, selector);
    }

    /// Remove the selector of type `S`. Returns `false` if none was present.
    pub fn remove<S: Selector>(&mut self) -> bool {
        self.remove_type(&SelectorType::of::<S>())
    }

    pub fn remove_type(&mut self, ty: &SelectorType) -> bool {
        if !self.selectors.contains_key(ty) {
            return false;
        }
        self.detach().remove(ty).is_some()
    }

    pub fn get<S: Selector>(&self) -> Option<&S> {
        self.selectors
            .get(&SelectorType::of::<S>())
            .and_then(|s| (**s).as_any().downcast_ref::<S>())
    }

    pub fn get_type(&self, ty: &SelectorType) -> Option<&dyn Selector> {
        self.selectors.get(ty).map(|s| &**s)
    }

    pub fn contains<S: Selector>(&self) -> bool {
        self.contains_type(&SelectorType::of::<S>())
    }

    pub fn contains_type(&self, ty: &SelectorType) -> bool {
        self.selectors.contains_key(ty)
    }

    pub fn len(&self) -> usize {
        self.selectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selectors.is_empty()
    }

    pub fn types(&self) -> impl Iterator<Item = SelectorType> + '_ {
        self.selectors.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Selector> + '_ {
        self.selectors.values().map(|s| &**s)
    }

    /// Whether both sets still share one backing store.
    pub fn shares_storage_with(&self, other: &SelectorSet) -> bool {
        Arc::ptr_eq(&self.selectors, &other.selectors)
    }

    fn detach(&mut self) -> &mut HashMap<SelectorType, Box<dyn Selector>> {
        if Arc::strong_count(&self.selectors) > 1 {
            tracing::trace!("Detaching shared selector set ({} entries)", self.selectors.len());
        }
        Arc::make_mut(&mut self.selectors)
    }
}

impl<S: Selector> Extend<S> for SelectorSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for selector in iter {
            self.insert(selector);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::{TemporalMode, TemporalSelector};
    use crate::types::TimeStamp;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Label(String);

    impl Selector for Label {}

    #[test]
    fn test_insert_replaces_same_type() {
        let mut set = SelectorSet::new();
        set.insert(TemporalSelector::nearest(TimeStamp::from_time(1)));
        set.insert(TemporalSelector::at_or_before(TimeStamp::from_time(2)));
        assert_eq!(set.len(), 1);
        let sel = set.get::<TemporalSelector>().unwrap();
        assert_eq!(sel.mode, TemporalMode::AtOrBefore);
        assert_eq!(sel.time, TimeStamp::from_time(2));
    }

    #[test]
    fn test_distinct_types_coexist() {
        let set = SelectorSet::new()
            .with(Label("a".into()))
            .with(TemporalSelector::nearest(TimeStamp::from_frame(3)));
        assert_eq!(set.len(), 2);
        assert!(set.contains::<Label>());
        assert!(set.contains_type(&SelectorType::of::<TemporalSelector>()));
        assert_eq!(set.types().count(), 2);
    }

    #[test]
    fn test_clone_shares_until_mutation() {
        let a = SelectorSet::new().with(Label("a".into()));
        let mut b = a.clone();
        assert!(a.shares_storage_with(&b));
        b.insert(Label("b".into()));
        assert!(!a.shares_storage_with(&b));
        assert_eq!(a.get::<Label>(), Some(&Label("a".into())));
        assert_eq!(b.get::<Label>(), Some(&Label("b".into())));
    }

    #[test]
    fn test_remove_missing_keeps_sharing() {
        let a = SelectorSet::new().with(Label("a".into()));
        let mut b = a.clone();
        assert!(!b.remove::<TemporalSelector>());
        assert!(a.shares_storage_with(&b));
        assert!(b.remove::<Label>());
        assert!(b.is_empty());
        assert_eq!(a.len(), 1);
    }

    proptest! {
        #[test]
        fn prop_copy_on_write_never_leaks(
            initial in proptest::collection::vec(any::<i64>(), 0..4),
            edits in proptest::collection::vec((any::<bool>(), any::<i64>()), 1..16),
        ) {
            let mut a = SelectorSet::new();
            for t in &initial {
                a.insert(TemporalSelector::nearest(TimeStamp::from_time(*t)));
            }
            let before = a.get::<TemporalSelector>().copied();

            let mut b = a.clone();
            for (insert, t) in edits {
                if insert {
                    b.insert(TemporalSelector::at_or_after(TimeStamp::from_time(t)));
                    b.insert(Label(t.to_string()));
                } else {
                    b.remove::<TemporalSelector>();
                }
            }

            prop_assert_eq!(a.get::<TemporalSelector>().copied(), before);
            prop_assert!(!a.contains::<Label>());
        }
    }
}
