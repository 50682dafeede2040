//! In-place edits on a wish list kept newest first.

use wishwall_shared::{Wish, WishId};

pub(crate) fn sort_newest_first(wishes: &mut [Wish]) {
    wishes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

/// Replace the wish with the same id, or insert it at its place in the
/// ordering. Returns whether the list changed.
pub(crate) fn upsert(wishes: &mut Vec<Wish>, wish: Wish) -> bool {
    if let Some(existing) = wishes.iter_mut().find(|w| w.id == wish.id) {
        if *existing == wish {
            return false;
        }
        let reordered = existing.created_at != wish.created_at;
        *existing = wish;
        if reordered {
            sort_newest_first(wishes);
        }
        return true;
    }

    let at = wishes.partition_point(|w| w.created_at > wish.created_at);
    wishes.insert(at, wish);
    true
}

pub(crate) fn remove(wishes: &mut Vec<Wish>, id: WishId) -> bool {
    let before = wishes.len();
    wishes.retain(|w| w.id != id);
    wishes.len() != before
}

pub(crate) fn set_likes(wishes: &mut [Wish], id: WishId, likes_count: u32) -> bool {
    match wishes.iter_mut().find(|w| w.id == id) {
        Some(wish) if wish.likes_count != likes_count => {
            wish.likes_count = likes_count;
            true
        }
        _ => false,
    }
}
