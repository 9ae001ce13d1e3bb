//! Recency List Module
//!
//! Arena-backed doubly linked list ordering entries from most to least
//! recently used.

use crate::cache::CacheEntry;

// == Recency List ==
/// Ordered set of entries for LRU eviction.
///
/// Entries live in a slot arena and link to each other by slot index:
/// - `head` = most recently used
/// - `tail` = least recently used
///
/// Slot indices stay stable while an entry is resident, so they can be used as
/// handles by an external index. Freed slots are recycled.
#[derive(Debug)]
pub struct RecencyList<K, V> {
    slots: Vec<Option<CacheEntry<K, V>>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<K, V> RecencyList<K, V> {
    // == Constructor ==
    /// Creates an empty list with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    // == Push Front ==
    /// Links a new entry at the head and returns its slot.
    pub fn push_front(&mut self, entry: CacheEntry<K, V>) -> usize {
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(entry);
                idx
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        };
        self.link_front(idx);
        self.len += 1;
        idx
    }

    // == Move To Front ==
    /// Marks the entry at `idx` as most recently used.
    pub fn move_to_front(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.link_front(idx);
    }

    // == Remove ==
    /// Unlinks and returns the entry at `idx`, freeing its slot.
    pub fn remove(&mut self, idx: usize) -> Option<CacheEntry<K, V>> {
        self.slots.get(idx)?.as_ref()?;
        self.unlink(idx);
        self.len -= 1;
        self.free.push(idx);
        self.slots[idx].take()
    }

    /// Slot of the least recently used entry, the eviction candidate.
    pub fn tail(&self) -> Option<usize> {
        self.tail
    }

    pub fn get(&self, idx: usize) -> Option<&CacheEntry<K, V>> {
        self.slots.get(idx).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut CacheEntry<K, V>> {
        self.slots.get_mut(idx).and_then(Option::as_mut)
    }

    // == Iter ==
    /// Walks entries from most to least recently used, yielding their slots.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Detaches `idx` from its neighbours, fixing up head and tail.
    fn unlink(&mut self, idx: usize) {
        let (prev, next) = {
            let entry = self.entry_mut(idx);
            (entry.prev.take(), entry.next.take())
        };

        match prev {
            Some(p) => self.entry_mut(p).next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.entry_mut(n).prev = prev,
            None => self.tail = prev,
        }
    }

    fn link_front(&mut self, idx: usize) {
        let old_head = self.head;
        {
            let entry = self.entry_mut(idx);
            entry.prev = None;
            entry.next = old_head;
        }
        match old_head {
            Some(h) => self.entry_mut(h).prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    fn entry_mut(&mut self, idx: usize) -> &mut CacheEntry<K, V> {
        self.slots[idx]
            .as_mut()
            .expect("recency list links point at a vacant slot")
    }
}

// == Iterator ==
/// Iterator over `(slot, entry)` pairs from head to tail.
pub struct Iter<'a, K, V> {
    list: &'a RecencyList<K, V>,
    cursor: Option<usize>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (usize, &'a CacheEntry<K, V>);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor?;
        let entry = self.list.get(idx)?;
        self.cursor = entry.next;
        Some((idx, entry))
    }
}

#[cfg(test)]
impl<K, V> RecencyList<K, V> {
    /// Slot of the most recently used entry.
    pub(crate) fn head(&self) -> Option<usize> {
        self.head
    }

    /// Panics unless forward and backward walks agree with `len`.
    pub(crate) fn assert_linked(&self) {
        let forward: Vec<usize> = self.iter().map(|(idx, _)| idx).collect();
        assert_eq!(forward.len(), self.len, "forward walk length");
        assert_eq!(forward.last().copied(), self.tail, "forward walk ends at tail");

        let mut backward = Vec::with_capacity(self.len);
        let mut cursor = self.tail;
        while let Some(idx) = cursor {
            backward.push(idx);
            cursor = self.get(idx).and_then(|e| e.prev);
            assert!(backward.len() <= self.len, "backward walk loops");
        }
        backward.reverse();
        assert_eq!(forward, backward, "prev links mirror next links");

        let occupied = self.slots.iter().filter(|s| s.is_some()).count();
        assert_eq!(occupied, self.len, "occupied slots");
    }
}
