//! Fixed-capacity bump allocation.
//!
//! A context receives one block of memory at initialization and never grows
//! it. The block is split into two parts:
//!
//! - typed tables (element nodes, child lists, caches, render commands) laid
//!   directly over the block once, at initialization, in a fixed order;
//! - a tail region that receives per-frame string payloads (element names and
//!   text content) and is reclaimed in O(1) by [`Arena::reset`].
//!
//! Offsets never escape the crate: callers see [`ArenaStr`] handles that carry
//! the generation they were allocated in, so a handle kept across a reset
//! resolves to an empty string instead of aliasing newer data.

use std::fmt;
use std::ops::{Index, IndexMut, Range};
use std::ptr::{self, NonNull};
use std::rc::Rc;
use thiserror::Error;
use trellis_traits::LayoutError;

/// Alignment of the block's base. Nothing stored in an arena may need more.
pub const ARENA_ALIGN: usize = 16;

#[repr(C, align(16))]
#[derive(Clone, Copy)]
struct Chunk([u8; ARENA_ALIGN]);

/// The memory behind an arena. Tables carved from it hold a reference, so the
/// block outlives every table even if the arena is dropped first.
#[derive(Debug)]
struct Block {
    base: NonNull<u8>,
    chunks: usize,
}

impl Block {
    fn zeroed(bytes: usize) -> Self {
        let chunks = bytes.div_ceil(ARENA_ALIGN);
        let memory = vec![Chunk([0; ARENA_ALIGN]); chunks].into_boxed_slice();
        Self {
            base: NonNull::from(Box::leak(memory)).cast::<u8>(),
            chunks,
        }
    }

    /// Pointer to `offset` bytes past the base.
    ///
    /// # Safety
    ///
    /// `offset` must lie within the block.
    unsafe fn at<T>(&self, offset: usize) -> NonNull<T> {
        unsafe { self.base.add(offset).cast::<T>() }
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        let slice = ptr::slice_from_raw_parts_mut(self.base.as_ptr().cast::<Chunk>(), self.chunks);
        // SAFETY: base and chunks describe the boxed slice leaked in `zeroed`.
        drop(unsafe { Box::from_raw(slice) });
    }
}
/// Failure to satisfy an allocation from the remaining capacity.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("arena exhausted: requested {requested} bytes, {remaining} of {capacity} remaining")]
pub struct ArenaError {
    pub requested: usize,
    pub remaining: usize,
    pub capacity: usize,
}

impl From<ArenaError> for LayoutError {
    fn from(err: ArenaError) -> Self {
        LayoutError::ArenaCapacityExceeded {
            requested: err.requested,
            remaining: err.remaining,
            capacity: err.capacity,
        }
    }
}

/// Position of an allocation inside an arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArenaOffset(usize);

impl ArenaOffset {
    pub(crate) fn get(self) -> usize {
        self.0
    }
}

/// Handle to a UTF-8 string stored in an arena's frame region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ArenaStr {
    offset: u32,
    len: u32,
    generation: u32,
}

impl ArenaStr {
    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// A sub-range of this string, in bytes. The range is clamped to the
    /// string; callers are expected to pass char boundaries.
    pub(crate) fn slice(&self, start: usize, len: usize) -> ArenaStr {
        let start = start.min(self.len as usize) as u32;
        let len = (len as u32).min(self.len - start);
        ArenaStr {
            offset: self.offset + start,
            len,
            generation: self.generation,
        }
    }
}

#[derive(Debug)]
pub struct Arena {
    block: Option<Rc<Block>>,
    capacity: usize,
    next: usize,
    reset_offset: usize,
    generation: u32,
}

impl Arena {
    /// An arena backed by a zeroed block of `capacity` bytes, aligned to
    /// [`ARENA_ALIGN`]. This is the only heap allocation a context makes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            block: Some(Rc::new(Block::zeroed(capacity))),
            capacity,
            next: 0,
            reset_offset: 0,
            generation: 0,
        }
    }

    /// An arena without backing memory that only counts. Used to compute the
    /// minimum size of a configuration by replaying its allocations.
    pub(crate) fn measuring() -> Self {
        Self {
            block: None,
            capacity: usize::MAX,
            next: 0,
            reset_offset: 0,
            generation: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn used(&self) -> usize {
        self.next
    }

    pub fn remaining(&self) -> usize {
        self.capacity - self.next
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Bytes used since the last reset.
    pub fn frame_bytes(&self) -> usize {
        self.next - self.reset_offset
    }

    /// Bump-allocates `size` bytes aligned to `align`, a power of two no
    /// larger than [`ARENA_ALIGN`].
    pub fn allocate(&mut self, size: usize, align: usize) -> Result<ArenaOffset, ArenaError> {
        let align = align.max(1);
        let exhausted = ArenaError {
            requested: size,
            remaining: self.remaining(),
            capacity: self.capacity,
        };
        if !align.is_power_of_two() || align > ARENA_ALIGN {
            return Err(exhausted);
        }
        let start = self
            .next
            .checked_add(align - 1)
            .map(|n| n & !(align - 1))
            .ok_or(exhausted)?;
        let end = start.checked_add(size).ok_or(exhausted)?;
        if end > self.capacity {
            return Err(exhausted);
        }
        self.next = end;
        Ok(ArenaOffset(start))
    }

    /// Charges room for `count` values of `T`.
    pub fn allocate_array<T>(&mut self, count: usize) -> Result<ArenaOffset, ArenaError> {
        let size = size_of::<T>().checked_mul(count).ok_or(ArenaError {
            requested: usize::MAX,
            remaining: self.remaining(),
            capacity: self.capacity,
        })?;
        self.allocate(size, align_of::<T>())
    }

    /// Carves an empty table with room for `capacity` values. A measuring
    /// arena charges the bytes and hands back a table of capacity zero.
    pub fn alloc_pool<T: Copy>(&mut self, capacity: usize) -> Result<Pool<T>, ArenaError> {
        let offset = self.allocate_array::<T>(capacity)?.get();
        let Some(block) = &self.block else {
            return Ok(Pool::default());
        };
        Ok(Pool {
            // SAFETY: `allocate_array` placed `capacity` values inside the block.
            ptr: unsafe { block.at::<T>(offset) },
            len: 0,
            capacity,
            block: Some(Rc::clone(block)),
        })
    }

    /// Carves a map holding up to `capacity` entries.
    pub fn alloc_map<V: Copy>(&mut self, capacity: usize) -> Result<FixedMap<V>, ArenaError> {
        let mut slots = self.alloc_pool::<Option<(u32, V)>>(FixedMap::<V>::slot_count(capacity))?;
        while slots.push(None).is_ok() {}
        let capacity = if slots.is_empty() { 0 } else { capacity };
        Ok(FixedMap {
            slots,
            len: 0,
            capacity,
        })
    }

    /// Everything allocated so far survives [`Arena::reset`].
    pub(crate) fn mark_reset_point(&mut self) {
        self.reset_offset = self.next;
    }

    /// Reclaims every allocation made since the reset point. O(1).
    pub fn reset(&mut self) {
        self.next = self.reset_offset;
        self.generation = self.generation.wrapping_add(1);
    }

    /// Copies a string into the frame region.
    pub fn alloc_str(&mut self, s: &str) -> Result<ArenaStr, ArenaError> {
        if s.is_empty() {
            return Ok(ArenaStr {
                generation: self.generation,
                ..ArenaStr::default()
            });
        }
        let too_large = ArenaError {
            requested: s.len(),
            remaining: self.remaining(),
            capacity: self.capacity,
        };
        let len = u32::try_from(s.len()).map_err(|_| too_large)?;
        let offset = self.allocate(s.len(), 1)?.get();
        let start = u32::try_from(offset).map_err(|_| too_large)?;
        if let Some(block) = &self.block {
            // SAFETY: `allocate` reserved `s.len()` bytes at `offset` inside
            // the block, and no table overlaps the frame region.
            unsafe {
                ptr::copy_nonoverlapping(s.as_ptr(), block.at::<u8>(offset).as_ptr(), s.len());
            }
        }
        Ok(ArenaStr {
            offset: start,
            len,
            generation: self.generation,
        })
    }

    /// Resolves a string handle. Handles from an earlier generation resolve to
    /// the empty string.
    pub fn get_str(&self, handle: ArenaStr) -> &str {
        if handle.generation != self.generation || handle.len == 0 {
            return "";
        }
        let Some(block) = &self.block else {
            return "";
        };
        let start = handle.offset as usize;
        let len = handle.len as usize;
        if start.saturating_add(len) > self.next {
            return "";
        }
        // SAFETY: the range was written by `alloc_str` in this generation and
        // lies below the cursor.
        let bytes = unsafe { std::slice::from_raw_parts(block.at::<u8>(start).as_ptr(), len) };
        std::str::from_utf8(bytes).unwrap_or("")
    }
}

/// Returned when a fixed-capacity table is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityExceeded;

/// A table laid over an arena block with a capacity fixed at initialization.
/// Pushing past the capacity fails instead of reallocating.
pub struct Pool<T> {
    ptr: NonNull<T>,
    len: usize,
    capacity: usize,
    block: Option<Rc<Block>>,
}

impl<T> Default for Pool<T> {
    fn default() -> Self {
        Self {
            ptr: NonNull::dangling(),
            len: 0,
            capacity: 0,
            block: None,
        }
    }
}

impl<T: Copy + fmt::Debug> fmt::Debug for Pool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("capacity", &self.capacity)
            .field("items", &self.as_slice())
            .finish()
    }
}

impl<T: Copy> Pool<T> {
    /// A pool with a block of its own.
    #[cfg(test)]
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Arena::with_capacity(size_of::<T>() * capacity)
            .alloc_pool(capacity)
            .unwrap_or_default()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len >= self.capacity
    }

    /// True when the table lives inside `arena`'s block.
    pub fn is_carved_from(&self, arena: &Arena) -> bool {
        match (&self.block, &arena.block) {
            (Some(ours), Some(theirs)) => Rc::ptr_eq(ours, theirs),
            _ => false,
        }
    }

    /// Appends a value and returns its index.
    pub fn push(&mut self, value: T) -> Result<usize, CapacityExceeded> {
        if self.is_full() {
            return Err(CapacityExceeded);
        }
        // SAFETY: len < capacity, and the carve reserved `capacity` slots.
        unsafe { self.ptr.add(self.len).write(value) };
        self.len += 1;
        Ok(self.len - 1)
    }

    pub fn pop(&mut self) -> Option<T> {
        let last = *self.as_slice().last()?;
        self.len -= 1;
        Some(last)
    }

    pub fn first(&self) -> Option<&T> {
        self.as_slice().first()
    }

    pub fn last(&self) -> Option<&T> {
        self.as_slice().last()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(index)
    }

    pub fn truncate(&mut self, len: usize) {
        self.len = self.len.min(len);
    }

    /// Removes `index` by moving the last value into its place.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn swap_remove(&mut self, index: usize) -> T {
        let last = self.len - 1;
        let items = self.as_mut_slice();
        let value = items[index];
        items[index] = items[last];
        self.len = last;
        value
    }

    /// Removes `index`, shifting the values after it down.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn remove(&mut self, index: usize) -> T {
        let items = self.as_mut_slice();
        let value = items[index];
        items.copy_within(index + 1.., index);
        self.len -= 1;
        value
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&T) -> bool) {
        let mut kept = 0;
        for index in 0..self.len {
            let value = self[index];
            if keep(&value) {
                self[kept] = value;
                kept += 1;
            }
        }
        self.len = kept;
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn as_slice(&self) -> &[T] {
        // SAFETY: the first `len` slots were written by `push`.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: as above, and `&mut self` makes the access unique.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    /// Copies `range` of this pool onto the end of `dest`.
    pub fn copy_range_to(&self, range: Range<usize>, dest: &mut Pool<T>) -> Result<(), CapacityExceeded> {
        let source = &self.as_slice()[range];
        if dest.len + source.len() > dest.capacity {
            return Err(CapacityExceeded);
        }
        // SAFETY: `dest` has room for `source.len()` more values, and two
        // pools never share slots.
        unsafe {
            ptr::copy_nonoverlapping(source.as_ptr(), dest.ptr.add(dest.len).as_ptr(), source.len());
        }
        dest.len += source.len();
        Ok(())
    }
}

impl<T: Copy> Index<usize> for Pool<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

impl<T: Copy> IndexMut<usize> for Pool<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        &mut self.as_mut_slice()[index]
    }
}

/// An open-addressed map from element and text hashes to values, with a
/// capacity fixed at initialization. Slots live in the arena; the table is
/// kept at most half full so every probe reaches an empty slot.
pub struct FixedMap<V> {
    slots: Pool<Option<(u32, V)>>,
    len: usize,
    capacity: usize,
}

impl<V> Default for FixedMap<V> {
    fn default() -> Self {
        Self {
            slots: Pool::default(),
            len: 0,
            capacity: 0,
        }
    }
}

impl<V: Copy + fmt::Debug> fmt::Debug for FixedMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.slots.iter().flatten().map(|(key, value)| (key, value)))
            .finish()
    }
}

/// Fibonacci hashing spreads the sequential offsets of indexed ids.
fn home_slot(key: u32, mask: usize) -> usize {
    key.wrapping_mul(0x9E37_79B9) as usize & mask
}

impl<V: Copy> FixedMap<V> {
    fn slot_count(capacity: usize) -> usize {
        if capacity == 0 {
            0
        } else {
            capacity.saturating_mul(2).next_power_of_two()
        }
    }

    /// A map with a block of its own.
    #[cfg(test)]
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        let bytes = size_of::<Option<(u32, V)>>() * Self::slot_count(capacity);
        Arena::with_capacity(bytes)
            .alloc_map(capacity)
            .unwrap_or_default()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The slot holding `key`, or the empty slot where it would go.
    fn locate(&self, key: u32) -> Option<(usize, bool)> {
        let mask = self.slots.len().checked_sub(1)?;
        let mut slot = home_slot(key, mask);
        loop {
            match self.slots[slot] {
                Some((existing, _)) if existing == key => return Some((slot, true)),
                Some(_) => slot = (slot + 1) & mask,
                None => return Some((slot, false)),
            }
        }
    }

    /// Inserts or replaces. A new key is refused once the map is full.
    pub fn insert(&mut self, key: u32, value: V) -> Result<(), CapacityExceeded> {
        match self.locate(key) {
            Some((slot, true)) => self.slots[slot] = Some((key, value)),
            Some((slot, false)) if self.len < self.capacity => {
                self.slots[slot] = Some((key, value));
                self.len += 1;
            }
            _ => return Err(CapacityExceeded),
        }
        Ok(())
    }

    pub fn get(&self, key: &u32) -> Option<&V> {
        match self.locate(*key)? {
            (slot, true) => self.slots[slot].as_ref().map(|(_, value)| value),
            (_, false) => None,
        }
    }

    pub fn get_mut(&mut self, key: &u32) -> Option<&mut V> {
        match self.locate(*key)? {
            (slot, true) => self.slots[slot].as_mut().map(|(_, value)| value),
            (_, false) => None,
        }
    }

    pub fn remove(&mut self, key: &u32) -> Option<V> {
        let (slot, true) = self.locate(*key)? else {
            return None;
        };
        let removed = self.slots[slot].map(|(_, value)| value);
        self.remove_at(slot);
        removed
    }

    /// Empties `hole` and shifts later entries of its cluster back so no
    /// probe sequence is broken.
    fn remove_at(&mut self, mut hole: usize) {
        let mask = self.slots.len() - 1;
        self.slots[hole] = None;
        self.len -= 1;
        let mut slot = (hole + 1) & mask;
        while let Some((key, value)) = self.slots[slot] {
            let home = home_slot(key, mask);
            if slot.wrapping_sub(home) & mask >= slot.wrapping_sub(hole) & mask {
                self.slots[hole] = Some((key, value));
                self.slots[slot] = None;
                hole = slot;
            }
            slot = (slot + 1) & mask;
        }
    }

    /// Keeps the entries for which `keep` returns true. Every entry is
    /// visited exactly once.
    pub fn retain(&mut self, mut keep: impl FnMut(&u32, &mut V) -> bool) {
        let Some(mask) = self.slots.len().checked_sub(1) else {
            return;
        };
        // Starting after an empty slot keeps shifted entries ahead of the scan.
        let Some(start) = self.slots.iter().position(Option::is_none) else {
            return;
        };
        let mut step = 1;
        while step <= mask {
            let slot = (start + step) & mask;
            match self.slots[slot] {
                Some((key, mut value)) => {
                    if keep(&key, &mut value) {
                        self.slots[slot] = Some((key, value));
                        step += 1;
                    } else {
                        self.remove_at(slot);
                    }
                }
                None => step += 1,
            }
        }
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.slots.iter().flatten().map(|(_, value)| value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_respects_alignment() {
        let mut arena = Arena::with_capacity(64);
        let first = arena.allocate(3, 1).unwrap();
        let second = arena.allocate(8, 8).unwrap();
        assert_eq!(first.get(), 0);
        assert_eq!(second.get(), 8);
        assert_eq!(arena.used(), 16);
    }

    #[test]
    fn test_allocate_fails_without_moving_the_cursor() {
        let mut arena = Arena::with_capacity(16);
        arena.allocate(10, 1).unwrap();
        let err = arena.allocate(8, 1).unwrap_err();
        assert_eq!(err.requested, 8);
        assert_eq!(err.remaining, 6);
        assert_eq!(err.capacity, 16);
        assert_eq!(arena.used(), 10);
        assert!(arena.allocate(6, 1).is_ok());
    }

    #[test]
    fn test_reset_returns_to_reset_point() {
        let mut arena = Arena::with_capacity(32);
        arena.allocate(8, 1).unwrap();
        arena.mark_reset_point();
        arena.alloc_str("hello world").unwrap();
        assert_eq!(arena.frame_bytes(), 11);
        arena.reset();
        assert_eq!(arena.used(), 8);
        assert_eq!(arena.frame_bytes(), 0);
    }

    #[test]
    fn test_string_handles_go_stale_after_reset() {
        let mut arena = Arena::with_capacity(32);
        let handle = arena.alloc_str("label").unwrap();
        assert_eq!(arena.get_str(handle), "label");
        assert_eq!(arena.get_str(handle.slice(1, 3)), "abe");
        arena.reset();
        let newer = arena.alloc_str("other").unwrap();
        assert_eq!(arena.get_str(handle), "");
        assert_eq!(arena.get_str(newer), "other");
    }

    #[test]
    fn test_measuring_arena_counts_without_memory() {
        let mut arena = Arena::measuring();
        arena.allocate_array::<u64>(10).unwrap();
        assert_eq!(arena.used(), 80);
    }

    #[test]
    fn test_pool_refuses_past_capacity() {
        let mut pool = Pool::<u32>::with_capacity(2);
        assert_eq!(pool.push(1), Ok(0));
        assert_eq!(pool.push(2), Ok(1));
        assert_eq!(pool.push(3), Err(CapacityExceeded));
        assert!(pool.is_full());
        pool.pop();
        assert_eq!(pool.push(4), Ok(1));
    }

    #[test]
    fn test_copy_range_to_checks_destination_capacity() {
        let mut source = Pool::<u32>::with_capacity(4);
        for value in [1, 2, 3, 4] {
            source.push(value).unwrap();
        }
        let mut dest = Pool::<u32>::with_capacity(3);
        source.copy_range_to(1..3, &mut dest).unwrap();
        assert_eq!(dest.as_slice(), &[2, 3]);
        assert_eq!(source.copy_range_to(0..2, &mut dest), Err(CapacityExceeded));
    }

    #[test]
    fn test_allocate_refuses_alignment_beyond_the_block() {
        let mut arena = Arena::with_capacity(128);
        assert!(arena.allocate(8, ARENA_ALIGN).is_ok());
        assert!(arena.allocate(8, ARENA_ALIGN * 2).is_err());
        assert!(arena.allocate(8, 3).is_err());
    }

    #[test]
    fn test_pools_are_carved_aligned_from_the_block() {
        let mut arena = Arena::with_capacity(128);
        let mut bytes = arena.alloc_pool::<u8>(3).unwrap();
        let mut wide = arena.alloc_pool::<u64>(4).unwrap();
        assert_eq!(arena.used(), 8 + 32);
        assert!(bytes.is_carved_from(&arena));
        assert!(wide.is_carved_from(&arena));
        assert_eq!(wide.ptr.as_ptr() as usize % align_of::<u64>(), 0);

        bytes.push(7).unwrap();
        wide.push(u64::MAX).unwrap();
        wide.push(1).unwrap();
        assert_eq!(bytes.as_slice(), &[7]);
        assert_eq!(wide.as_slice(), &[u64::MAX, 1]);
    }

    #[test]
    fn test_measuring_arena_hands_out_empty_tables() {
        let mut arena = Arena::measuring();
        let pool = arena.alloc_pool::<u32>(10).unwrap();
        let map = arena.alloc_map::<u32>(4).unwrap();
        assert_eq!(pool.capacity(), 0);
        assert_eq!(map.capacity(), 0);
        assert_eq!(arena.used(), 40 + 8 * size_of::<Option<(u32, u32)>>());
    }

    #[test]
    fn test_tables_outlive_their_arena() {
        let mut pool = {
            let mut arena = Arena::with_capacity(16);
            arena.alloc_pool::<u32>(4).unwrap()
        };
        pool.push(9).unwrap();
        assert_eq!(pool.pop(), Some(9));
    }

    #[test]
    fn test_pool_removal_keeps_order() {
        let mut pool = Pool::<u32>::with_capacity(5);
        for value in [1, 2, 3, 4, 5] {
            pool.push(value).unwrap();
        }
        assert_eq!(pool.remove(1), 2);
        assert_eq!(pool.as_slice(), &[1, 3, 4, 5]);
        assert_eq!(pool.swap_remove(0), 1);
        assert_eq!(pool.as_slice(), &[5, 3, 4]);
        pool.retain(|value| *value != 3);
        assert_eq!(pool.as_slice(), &[5, 4]);
        assert_eq!(pool.first(), Some(&5));
    }

    #[test]
    fn test_fixed_map_removal_keeps_other_keys_reachable() {
        let mut map = FixedMap::<u32>::with_capacity(8);
        for key in 0..8 {
            map.insert(key * 16, key).unwrap();
        }
        for key in (0..8).step_by(2) {
            assert_eq!(map.remove(&(key * 16)), Some(key));
        }
        assert_eq!(map.len(), 4);
        for key in 0..8 {
            let expected = (key % 2 == 1).then_some(key);
            assert_eq!(map.get(&(key * 16)).copied(), expected);
        }
        assert_eq!(map.remove(&0), None);
    }

    #[test]
    fn test_fixed_map_retain_visits_every_entry_once() {
        let mut map = FixedMap::<u32>::with_capacity(16);
        for key in 0..16 {
            map.insert(key, key * 10).unwrap();
        }
        let mut visits = 0;
        map.retain(|key, value| {
            visits += 1;
            *value += 1;
            key % 3 == 0
        });
        assert_eq!(visits, 16);
        assert_eq!(map.len(), 6);
        assert_eq!(map.get(&9), Some(&91));
        assert_eq!(map.get(&10), None);
        let mut kept: Vec<u32> = map.values().copied().collect();
        kept.sort_unstable();
        assert_eq!(kept, vec![1, 31, 61, 91, 121, 151]);
    }

    #[test]
    fn test_fixed_map_allows_replacing_when_full() {
        let mut map = FixedMap::<u32>::with_capacity(1);
        map.insert(1, 10).unwrap();
        assert!(map.insert(1, 11).is_ok());
        assert_eq!(map.insert(2, 20), Err(CapacityExceeded));
        assert_eq!(map.get(&1), Some(&11));
    }
}
