//! # Fixed-Capacity Slot Registries
//!
//! Every engine resource (meshes, textures, emitters, nodes, animations)
//! lives in a fixed-capacity slot array and is addressed by a 1-origin
//! integer handle. Handle 0 always means "invalid / none", and handles are
//! never negative.
//!
//! There is no generation counter: destroying a slot immediately invalidates
//! its handle, and a stale handle held after the slot is recycled will
//! silently address the new occupant. Not reusing destroyed handles is a
//! caller responsibility.

/// 1-origin resource handle. 0 is invalid.
pub type Handle = i32;

/// Fixed-capacity slot array with first-free-slot allocation.
///
/// `insert` returns a 1-origin handle, or 0 when all `N` slots are occupied.
/// Every accessor validates range and occupancy, so operations on invalid or
/// destroyed handles degrade to `None` rather than panicking.
pub struct SlotArena<T, const N: usize> {
    slots: Vec<Option<T>>,
}

impl<T, const N: usize> SlotArena<T, N> {
    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(N);
        slots.resize_with(N, || None);
        Self { slots }
    }

    /// Number of slots, occupied or not.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }

    /// Stores `value` in the first free slot and returns its handle, or 0
    /// when the arena is exhausted.
    pub fn insert(&mut self, value: T) -> Handle {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(value);
                return index as Handle + 1;
            }
        }
        0
    }

    /// Removes and returns the entry at `handle`, freeing the slot for a
    /// later `insert`. Invalid handles return `None`.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        self.index(handle).and_then(|i| self.slots[i].take())
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.index(handle).and_then(|i| self.slots[i].as_ref())
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.index(handle).and_then(move |i| self.slots[i].as_mut())
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.get(handle).is_some()
    }

    /// Iterates live entries as `(handle, &entry)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Handle, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|v| (i as Handle + 1, v)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|v| (i as Handle + 1, v)))
    }

    fn index(&self, handle: Handle) -> Option<usize> {
        if handle < 1 || handle as usize > N {
            None
        } else {
            Some(handle as usize - 1)
        }
    }
}

impl<T, const N: usize> Default for SlotArena<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_one_origin() {
        let mut arena: SlotArena<u32, 4> = SlotArena::new();
        assert_eq!(arena.insert(10), 1);
        assert_eq!(arena.insert(20), 2);
        assert_eq!(arena.get(1), Some(&10));
        assert_eq!(arena.get(0), None);
        assert_eq!(arena.get(-3), None);
        assert_eq!(arena.get(5), None);
    }

    #[test]
    fn exhaustion_returns_zero_then_freed_slot_is_reused() {
        let mut arena: SlotArena<u32, 3> = SlotArena::new();
        for i in 0..3 {
            assert_eq!(arena.insert(i), i as Handle + 1);
        }
        // Capacity + 1 fails.
        assert_eq!(arena.insert(99), 0);

        // Freeing slot 2 lets the next insert reuse it.
        assert_eq!(arena.remove(2), Some(1));
        assert_eq!(arena.insert(42), 2);
        assert_eq!(arena.get(2), Some(&42));
    }

    #[test]
    fn removed_handle_reads_as_dead_until_reused() {
        let mut arena: SlotArena<u32, 4> = SlotArena::new();
        let h = arena.insert(7);
        assert!(arena.contains(h));
        arena.remove(h);
        assert!(!arena.contains(h));
        assert_eq!(arena.get(h), None);
        assert_eq!(arena.remove(h), None);
    }

    #[test]
    fn iter_skips_holes() {
        let mut arena: SlotArena<u32, 4> = SlotArena::new();
        let a = arena.insert(1);
        let b = arena.insert(2);
        let c = arena.insert(3);
        arena.remove(b);
        let live: Vec<_> = arena.iter().map(|(h, v)| (h, *v)).collect();
        assert_eq!(live, vec![(a, 1), (c, 3)]);
    }
}
