//! Fixed-capacity entity pools with generation-tagged handles
//!
//! A `Handle` is a slot index plus the slot's generation at spawn time.
//! Killing an entity only flags it; the slot is reclaimed (and its generation
//! bumped) by `reclaim`, so pools can be iterated and mutated in the same
//! collision pass. A handle that outlives its entity resolves to `None`.

use std::fmt;
use std::marker::PhantomData;

/// Stable reference to an entity in an `Arena<T>`
pub struct Handle<T> {
    index: u32,
    generation: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    fn new(index: u32, generation: u32) -> Self {
        Self {
            index,
            generation,
            _marker: PhantomData,
        }
    }

    /// Slot index (stable for the entity's lifetime)
    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index, self.generation)
    }
}

#[derive(Debug, Clone)]
struct Slot<T> {
    generation: u32,
    alive: bool,
    value: Option<T>,
}

/// Fixed-capacity pool of `T`
#[derive(Debug, Clone)]
pub struct Arena<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    capacity: usize,
    live: usize,
}

impl<T> Arena<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free: Vec::new(),
            capacity,
            live: 0,
        }
    }

    /// Insert a value, or `None` if every slot is taken (dead-but-unreclaimed
    /// slots count as taken)
    pub fn spawn(&mut self, value: T) -> Option<Handle<T>> {
        let index = if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.alive = true;
            slot.value = Some(value);
            index
        } else if self.slots.len() < self.capacity {
            self.slots.push(Slot {
                generation: 0,
                alive: true,
                value: Some(value),
            });
            (self.slots.len() - 1) as u32
        } else {
            return None;
        };
        self.live += 1;
        Some(Handle::new(index, self.slots[index as usize].generation))
    }

    fn slot(&self, handle: Handle<T>) -> Option<&Slot<T>> {
        self.slots
            .get(handle.index())
            .filter(|s| s.alive && s.generation == handle.generation)
    }

    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.slot(handle).and_then(|s| s.value.as_ref())
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index())
            .filter(|s| s.alive && s.generation == handle.generation)
            .and_then(|s| s.value.as_mut())
    }

    pub fn is_alive(&self, handle: Handle<T>) -> bool {
        self.slot(handle).is_some()
    }

    /// Flag an entity dead. Returns false if it was already dead or stale.
    pub fn kill(&mut self, handle: Handle<T>) -> bool {
        match self
            .slots
            .get_mut(handle.index())
            .filter(|s| s.alive && s.generation == handle.generation)
        {
            Some(slot) => {
                slot.alive = false;
                self.live -= 1;
                true
            }
            None => false,
        }
    }

    /// Drop dead entities and free their slots for reuse
    pub fn reclaim(&mut self) -> usize {
        let mut reclaimed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if !slot.alive && slot.value.is_some() {
                slot.value = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                reclaimed += 1;
            }
        }
        // Highest first, so `spawn` pops the lowest free slot
        if reclaimed > 0 {
            self.free.sort_unstable_by(|a, b| b.cmp(a));
        }
        reclaimed
    }

    /// Kill and reclaim everything; all outstanding handles go stale
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.alive = false;
        }
        self.live = 0;
        self.reclaim();
    }

    /// Live entity count
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots available to `spawn` right now
    pub fn vacancies(&self) -> usize {
        self.free.len() + (self.capacity - self.slots.len())
    }

    /// Live entities in slot order
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            if !s.alive {
                return None;
            }
            s.value
                .as_ref()
                .map(|v| (Handle::new(i as u32, s.generation), v))
        })
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Handle<T>, &mut T)> {
        self.slots.iter_mut().enumerate().filter_map(|(i, s)| {
            if !s.alive {
                return None;
            }
            let generation = s.generation;
            s.value
                .as_mut()
                .map(|v| (Handle::new(i as u32, generation), v))
        })
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.iter().map(|(_, v)| v)
    }

    /// Snapshot of live handles, for passes that mutate other pools
    pub fn handles(&self) -> Vec<Handle<T>> {
        self.iter().map(|(h, _)| h).collect()
    }
}
