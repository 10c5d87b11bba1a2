//! Attribute presence tracking
//!
//! A fixed-width bit vector answering "has attribute X been populated".
//! Records pair every field with one bit here; a field whose bit is clear
//! must never be read.

use std::fmt;
use std::marker::PhantomData;

use crate::attr::AttributeId;

/// Number of 32-bit words backing a presence set
pub const PRESENCE_WORDS: usize = 2;

/// Total bit capacity, sized for the largest record (conntrack)
pub const PRESENCE_CAPACITY: usize = PRESENCE_WORDS * 32;

/// Presence bits for the attribute space `A`
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PresenceSet<A> {
    words: [u32; PRESENCE_WORDS],
    _ids: PhantomData<A>,
}

impl<A: AttributeId> Default for PresenceSet<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: AttributeId> PresenceSet<A> {
    /// Create an empty set
    pub fn new() -> Self {
        assert!(
            A::COUNT <= PRESENCE_CAPACITY,
            "attribute space larger than presence capacity"
        );
        Self {
            words: [0; PRESENCE_WORDS],
            _ids: PhantomData,
        }
    }

    /// Is `id` populated?
    pub fn test(&self, id: A) -> bool {
        self.test_index(id.index())
    }

    /// Mark `id` as populated
    pub fn set(&mut self, id: A) {
        self.set_index(id.index());
    }

    /// Mark `id` as unpopulated
    pub fn clear(&mut self, id: A) {
        self.clear_index(id.index());
    }

    /// Test a raw bit position. Panics if `index` is outside the id space.
    pub fn test_index(&self, index: usize) -> bool {
        let (word, bit) = Self::locate(index);
        self.words[word] & bit != 0
    }

    /// Set a raw bit position. Panics if `index` is outside the id space.
    pub fn set_index(&mut self, index: usize) {
        let (word, bit) = Self::locate(index);
        self.words[word] |= bit;
    }

    /// Clear a raw bit position. Panics if `index` is outside the id space.
    pub fn clear_index(&mut self, index: usize) {
        let (word, bit) = Self::locate(index);
        self.words[word] &= !bit;
    }

    /// True if every one of `ids` is populated
    pub fn test_all(&self, ids: &[A]) -> bool {
        ids.iter().all(|id| self.test(*id))
    }

    /// True if any of `ids` is populated
    pub fn test_any(&self, ids: &[A]) -> bool {
        ids.iter().any(|id| self.test(*id))
    }

    /// Unset every bit
    pub fn clear_all(&mut self) {
        self.words = [0; PRESENCE_WORDS];
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    /// Number of populated attributes
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    fn locate(index: usize) -> (usize, u32) {
        assert!(
            index < A::COUNT,
            "attribute index {} out of range (max {})",
            index,
            A::COUNT
        );
        (index / 32, 1u32 << (index % 32))
    }
}

impl<A: AttributeId> fmt::Debug for PresenceSet<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        for index in 0..A::COUNT {
            if self.test_index(index) {
                set.entry(&index);
            }
        }
        set.finish()
    }
}
