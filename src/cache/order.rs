//! Eviction Order Module
//!
//! Arena-backed doubly-linked list giving O(1) unlink and relink at any
//! position through stable handles.

// == Handle ==
/// Stable reference to a slot in an [`OrderList`].
///
/// A handle stays valid until its value is removed; the slot may then be
/// reused by a later push.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(usize);

#[derive(Debug)]
struct Slot<T> {
    value: Option<T>,
    prev: Option<usize>,
    next: Option<usize>,
}

// == Order List ==
/// Tracks insertion/promotion order for eviction.
///
/// - Front = oldest, evicted first
/// - Back = most recently inserted or promoted
#[derive(Debug)]
pub struct OrderList<T> {
    slots: Vec<Slot<T>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T> Default for OrderList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OrderList<T> {
    // == Constructor ==
    /// Creates a new empty list.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    // == Push Back ==
    /// Appends a value at the most recent end and returns its handle.
    pub fn push_back(&mut self, value: T) -> Handle {
        let slot = Slot {
            value: Some(value),
            prev: None,
            next: None,
        };
        let idx = match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = slot;
                idx
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        };
        self.link_back(idx);
        self.len += 1;
        Handle(idx)
    }

    // == Get ==
    /// Returns the value behind a handle, if it is still live.
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots.get(handle.0).and_then(|s| s.value.as_ref())
    }

    // == Remove ==
    /// Unlinks and returns the value behind a handle.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        if self.get(handle).is_none() {
            return None;
        }
        self.unlink(handle.0);
        self.len -= 1;
        self.free.push(handle.0);
        self.slots[handle.0].value.take()
    }

    // == Move To Back ==
    /// Moves a live value to the most recent end.
    ///
    /// Returns false if the handle is stale.
    pub fn move_to_back(&mut self, handle: Handle) -> bool {
        if self.get(handle).is_none() {
            return false;
        }
        if self.tail != Some(handle.0) {
            self.unlink(handle.0);
            self.link_back(handle.0);
        }
        true
    }

    // == Pop Front ==
    /// Removes and returns the oldest value.
    ///
    /// Returns None if the list is empty.
    pub fn pop_front(&mut self) -> Option<T> {
        let head = self.head?;
        self.remove(Handle(head))
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.len
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    // == Iter ==
    /// Iterates values oldest-first.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    fn link_back(&mut self, idx: usize) {
        self.slots[idx].prev = self.tail;
        self.slots[idx].next = None;
        match self.tail {
            Some(tail) => self.slots[tail].next = Some(idx),
            None => self.head = Some(idx),
        }
        self.tail = Some(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.slots[idx].prev, self.slots[idx].next);
        match prev {
            Some(p) => self.slots[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.slots[n].prev = prev,
            None => self.tail = prev,
        }
        self.slots[idx].prev = None;
        self.slots[idx].next = None;
    }
}

/// Oldest-first iterator over an [`OrderList`].
pub struct Iter<'a, T> {
    list: &'a OrderList<T>,
    cursor: Option<usize>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.cursor?;
        let slot = &self.list.slots[idx];
        self.cursor = slot.next;
        slot.value.as_ref()
    }
}
