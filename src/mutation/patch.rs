use crate::models::{Entity, EntityId};

/// Apply `patch` to the first item whose id equals `id`.
///
/// Every other item, and the order of the list, is left alone. Returns
/// whether a match was found.
pub fn patch_by_id<T: Entity>(items: &mut [T], id: &EntityId, patch: impl FnOnce(&mut T)) -> bool {
    match items.iter_mut().find(|item| item.id() == id) {
        Some(item) => {
            patch(item);
            true
        }
        None => false,
    }
}
