use parking_lot::RwLock;
use std::sync::Arc;

use crate::models::{Entity, EntityId, Pagination};
use crate::mutation::patch_by_id;

/// Observable state of one list view.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState<T> {
    Idle,
    Loading,
    Loaded(Vec<T>),
    Failed(String),
}

impl<T> LoadState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadState::Loading)
    }

    pub fn items(&self) -> &[T] {
        match self {
            LoadState::Loaded(items) => items,
            _ => &[],
        }
    }
}

struct Inner<T> {
    state: LoadState<T>,
    pagination: Option<Pagination>,
    /// Sequence number of the most recently started load
    latest: u64,
}

/// The in-memory cache behind a list view.
///
/// Holds the items of the last successful load, in server order. Loaders
/// replace it wholesale; mutation controllers patch single records by id.
/// Clones share the same cache.
pub struct Collection<T> {
    inner: Arc<RwLock<Inner<T>>>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Entity> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> Collection<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                state: LoadState::Idle,
                pagination: None,
                latest: 0,
            })),
        }
    }

    /// Cache pre-filled with `items`, as if a load had just finished.
    pub fn loaded(items: Vec<T>) -> Self {
        let collection = Self::new();
        collection.inner.write().state = LoadState::Loaded(items);
        collection
    }

    pub fn state(&self) -> LoadState<T> {
        self.inner.read().state.clone()
    }

    pub fn items(&self) -> Vec<T> {
        self.inner.read().state.items().to_vec()
    }

    pub fn pagination(&self) -> Option<Pagination> {
        self.inner.read().pagination
    }

    pub fn is_loading(&self) -> bool {
        self.inner.read().state.is_loading()
    }

    pub fn get(&self, id: &EntityId) -> Option<T> {
        self.inner
            .read()
            .state
            .items()
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }

    /// Apply `patch` to the record with `id`. Returns the patched record, or
    /// `None` if no such record is cached.
    pub fn patch(&self, id: &EntityId, patch: impl FnOnce(&mut T)) -> Option<T> {
        let mut inner = self.inner.write();
        match &mut inner.state {
            LoadState::Loaded(items) => {
                if patch_by_id(items, id, patch) {
                    items.iter().find(|item| item.id() == id).cloned()
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Swap in a server-confirmed record, keeping its position.
    pub fn replace(&self, entity: T) -> bool {
        let id = entity.id().clone();
        self.patch(&id, move |slot| *slot = entity).is_some()
    }

    /// Append a freshly created record.
    pub fn push(&self, entity: T) {
        if let LoadState::Loaded(items) = &mut self.inner.write().state {
            items.push(entity);
        }
    }

    pub fn remove(&self, id: &EntityId) -> Option<T> {
        match &mut self.inner.write().state {
            LoadState::Loaded(items) => {
                let idx = items.iter().position(|item| item.id() == id)?;
                Some(items.remove(idx))
            }
            _ => None,
        }
    }

    /// Enter `Loading` and return the sequence number of the new load.
    pub(crate) fn begin_load(&self) -> u64 {
        let mut inner = self.inner.write();
        inner.latest += 1;
        inner.state = LoadState::Loading;
        inner.latest
    }

    /// Store the outcome of load `seq`. Returns `false`, leaving the cache
    /// untouched, when a newer load has started since.
    pub(crate) fn finish_load(
        &self,
        seq: u64,
        outcome: Result<(Vec<T>, Option<Pagination>), String>,
    ) -> bool {
        let mut inner = self.inner.write();
        if seq != inner.latest {
            return false;
        }
        match outcome {
            Ok((items, pagination)) => {
                inner.state = LoadState::Loaded(items);
                inner.pagination = pagination;
            }
            Err(message) => inner.state = LoadState::Failed(message),
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: EntityId,
        value: u32,
    }

    impl Entity for Item {
        fn id(&self) -> &EntityId {
            &self.id
        }
    }

    fn item(id: &str, value: u32) -> Item {
        Item {
            id: EntityId::from(id),
            value,
        }
    }

    #[test]
    fn test_patch_replace_remove_keep_order() {
        let c = Collection::loaded(vec![item("a", 1), item("b", 2), item("c", 3)]);

        let patched = c.patch(&EntityId::from("b"), |i| i.value = 20).unwrap();
        assert_eq!(patched.value, 20);
        assert!(c.replace(item("c", 30)));
        assert!(!c.replace(item("zz", 0)));
        assert_eq!(c.remove(&EntityId::from("a")).unwrap().value, 1);
        c.push(item("d", 4));

        let values: Vec<_> = c.items().iter().map(|i| i.value).collect();
        assert_eq!(values, vec![20, 30, 4]);
    }

    #[test]
    fn test_stale_load_is_discarded() {
        let c: Collection<Item> = Collection::new();
        let first = c.begin_load();
        let second = c.begin_load();

        assert!(c.finish_load(second, Ok((vec![item("new", 2)], None))));
        assert!(!c.finish_load(first, Ok((vec![item("old", 1)], None))));
        assert_eq!(c.items(), vec![item("new", 2)]);
    }

    #[test]
    fn test_clones_share_state() {
        let c: Collection<Item> = Collection::new();
        let view = c.clone();
        let seq = c.begin_load();
        assert!(view.is_loading());
        c.finish_load(seq, Err("offline".into()));
        assert_eq!(view.state(), LoadState::Failed("offline".into()));
        assert!(view.patch(&EntityId::from("a"), |_| {}).is_none());
    }
}
