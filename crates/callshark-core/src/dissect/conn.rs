use std::collections::HashMap;
use std::fmt;

use crate::packet::Endpoint;

/// Directional connection key (source to destination).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnKey {
    pub src: Endpoint,
    pub dst: Endpoint,
}

impl ConnKey {
    pub fn new(src: Endpoint, dst: Endpoint) -> Self {
        Self { src, dst }
    }

    pub fn reversed(&self) -> Self {
        Self {
            src: self.dst,
            dst: self.src,
        }
    }
}

impl fmt::Display for ConnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.src, self.dst)
    }
}

struct Slot<T> {
    key: ConnKey,
    last_used: u64,
    state: T,
}

/// Bounded per-connection state store.
///
/// Slots live in a vector and are addressed through a key index. When the
/// arena is full the least recently used slot is recycled.
pub struct ConnectionArena<T> {
    slots: Vec<Slot<T>>,
    index: HashMap<ConnKey, usize>,
    capacity: usize,
    clock: u64,
}

impl<T: Default> ConnectionArena<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::new(),
            index: HashMap::new(),
            capacity: capacity.max(1),
            clock: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, key: &ConnKey) -> Option<&T> {
        self.index.get(key).map(|&i| &self.slots[i].state)
    }

    /// State for `key`, created with `T::default()` on first use.
    pub fn entry(&mut self, key: ConnKey) -> &mut T {
        self.clock += 1;
        let clock = self.clock;
        if let Some(&i) = self.index.get(&key) {
            let slot = &mut self.slots[i];
            slot.last_used = clock;
            return &mut slot.state;
        }

        let i = if self.slots.len() < self.capacity {
            self.slots.push(Slot {
                key,
                last_used: clock,
                state: T::default(),
            });
            self.slots.len() - 1
        } else {
            let victim = self
                .slots
                .iter()
                .enumerate()
                .min_by_key(|(_, slot)| slot.last_used)
                .map(|(i, _)| i)
                .unwrap_or(0);
            let old = std::mem::replace(
                &mut self.slots[victim],
                Slot {
                    key,
                    last_used: clock,
                    state: T::default(),
                },
            );
            self.index.remove(&old.key);
            tracing::debug!(evicted = %old.key, "connection table full, recycling slot");
            victim
        };
        self.index.insert(key, i);
        &mut self.slots[i].state
    }

    pub fn remove(&mut self, key: &ConnKey) -> Option<T> {
        let i = self.index.remove(key)?;
        let last = self.slots.len() - 1;
        let slot = self.slots.swap_remove(i);
        if i != last {
            let moved = self.slots[i].key;
            self.index.insert(moved, i);
        }
        Some(slot.state)
    }
}

#[cfg(test)]
mod tests {
    use super::{ConnKey, ConnectionArena};
    use crate::packet::Endpoint;

    fn key(port: u16) -> ConnKey {
        ConnKey::new(
            Endpoint::new("10.0.0.1".parse().unwrap(), port),
            Endpoint::new("10.0.0.2".parse().unwrap(), 5060),
        )
    }

    #[test]
    fn entry_creates_and_reuses_state() {
        let mut arena: ConnectionArena<u32> = ConnectionArena::with_capacity(4);
        *arena.entry(key(1)) += 1;
        *arena.entry(key(1)) += 1;
        assert_eq!(arena.get(&key(1)), Some(&2));
        assert_eq!(arena.len(), 1);
        assert!(arena.get(&key(1).reversed()).is_none());
    }

    #[test]
    fn full_arena_recycles_least_recently_used() {
        let mut arena: ConnectionArena<u32> = ConnectionArena::with_capacity(2);
        *arena.entry(key(1)) = 1;
        *arena.entry(key(2)) = 2;
        *arena.entry(key(1)) += 10;
        *arena.entry(key(3)) = 3;
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.get(&key(1)), Some(&11));
        assert!(arena.get(&key(2)).is_none());
        assert_eq!(arena.get(&key(3)), Some(&3));
    }

    #[test]
    fn remove_keeps_index_consistent() {
        let mut arena: ConnectionArena<u32> = ConnectionArena::with_capacity(4);
        *arena.entry(key(1)) = 1;
        *arena.entry(key(2)) = 2;
        *arena.entry(key(3)) = 3;
        assert_eq!(arena.remove(&key(1)), Some(1));
        assert_eq!(arena.get(&key(3)), Some(&3));
        assert_eq!(arena.get(&key(2)), Some(&2));
        assert!(arena.remove(&key(1)).is_none());
    }
}
