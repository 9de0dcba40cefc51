// ============================================================================
// spark-fiber - Ring
// Index-based circular singly-linked list with a `last` pointer
// ============================================================================
//
// Update queues and effect lists are circular lists whose handle points at
// the newest entry; `last.next` is the oldest. Entries live in a Vec and link
// by index, so pushing is O(1) and no entry owns another.
// ============================================================================

#[derive(Clone, Debug)]
struct Slot<T> {
    value: T,
    next: usize,
}

/// Circular list of `T` in insertion order.
#[derive(Clone, Debug)]
pub struct Ring<T> {
    slots: Vec<Slot<T>>,
    last: Option<usize>,
}

impl<T> Ring<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            last: None,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last.is_none()
    }

    /// Append `value` after the newest entry.
    pub fn push(&mut self, value: T) {
        let index = self.slots.len();
        match self.last {
            Some(last) => {
                let first = self.slots[last].next;
                self.slots.push(Slot { value, next: first });
                self.slots[last].next = index;
            }
            None => self.slots.push(Slot { value, next: index }),
        }
        self.last = Some(index);
    }

    /// The newest entry
    pub fn last(&self) -> Option<&T> {
        self.last.map(|i| &self.slots[i].value)
    }

    /// The oldest entry
    pub fn first(&self) -> Option<&T> {
        self.last.map(|i| &self.slots[self.slots[i].next].value)
    }

    /// Walk from the oldest entry to the newest.
    pub fn iter(&self) -> RingIter<'_, T> {
        RingIter {
            ring: self,
            cursor: self.last.map(|i| self.slots[i].next),
        }
    }

    /// Take every entry, leaving the ring empty.
    pub fn take(&mut self) -> Ring<T> {
        std::mem::take(self)
    }

    /// Splice `other` in after the newest entry, keeping its order.
    pub fn append(&mut self, other: Ring<T>) {
        for value in other {
            self.push(value);
        }
    }
}

impl<T> Default for Ring<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for Ring<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut ring = Ring::new();
        for value in iter {
            ring.push(value);
        }
        ring
    }
}

pub struct RingIter<'a, T> {
    ring: &'a Ring<T>,
    cursor: Option<usize>,
}

impl<'a, T> Iterator for RingIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let index = self.cursor?;
        let slot = &self.ring.slots[index];
        self.cursor = if Some(index) == self.ring.last {
            None
        } else {
            Some(slot.next)
        };
        Some(&slot.value)
    }
}

impl<'a, T> IntoIterator for &'a Ring<T> {
    type Item = &'a T;
    type IntoIter = RingIter<'a, T>;

    fn into_iter(self) -> RingIter<'a, T> {
        self.iter()
    }
}

impl<T> IntoIterator for Ring<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    /// Consume the ring oldest-first.
    fn into_iter(self) -> Self::IntoIter {
        let Some(last) = self.last else {
            return Vec::new().into_iter();
        };
        let mut order = Vec::with_capacity(self.slots.len());
        let mut cursor = self.slots[last].next;
        loop {
            order.push(cursor);
            if cursor == last {
                break;
            }
            cursor = self.slots[cursor].next;
        }

        let mut values: Vec<Option<T>> = self.slots.into_iter().map(|s| Some(s.value)).collect();
        order
            .into_iter()
            .filter_map(|i| values[i].take())
            .collect::<Vec<_>>()
            .into_iter()
    }
}

// =============================================================================
// TESTS
// =============================================================================
