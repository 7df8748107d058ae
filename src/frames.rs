//! Frame handles.
//!
//! A frame is identified by a [`FrameRef`]: a slot index plus the generation the
//! slot had when the frame was created. Slots are recycled after a frame goes
//! away, but the generation is bumped first, so an old handle can never alias
//! the frame that later reuses its slot.

use std::fmt;

/// Generation-checked handle to a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameRef {
    index: u32,
    generation: u32,
}

impl FrameRef {
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for FrameRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame#{}v{}", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Arena of live frames, keyed by [`FrameRef`].
#[derive(Debug)]
pub struct FrameTable<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for FrameTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FrameTable<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }

    /// Store `value` in a fresh or recycled slot and return its handle.
    pub fn insert(&mut self, value: T) -> FrameRef {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return FrameRef {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            value: Some(value),
        });
        FrameRef {
            index,
            generation: 0,
        }
    }

    /// Remove the frame behind `frame`. Stale handles return `None`.
    pub fn remove(&mut self, frame: FrameRef) -> Option<T> {
        let slot = self.slots.get_mut(frame.index as usize)?;
        if slot.generation != frame.generation {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(frame.index);
        self.len -= 1;
        Some(value)
    }

    pub fn get(&self, frame: FrameRef) -> Option<&T> {
        self.slots
            .get(frame.index as usize)
            .filter(|slot| slot.generation == frame.generation)
            .and_then(|slot| slot.value.as_ref())
    }

    pub fn contains(&self, frame: FrameRef) -> bool {
        self.get(frame).is_some()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (FrameRef, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value.as_ref().map(|value| {
                (
                    FrameRef {
                        index: index as u32,
                        generation: slot.generation,
                    },
                    value,
                )
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removed_handle_goes_stale_when_slot_is_reused() {
        let mut table = FrameTable::new();
        let first = table.insert("a");
        assert_eq!(table.remove(first), Some("a"));

        let second = table.insert("b");
        assert_eq!(second.index(), first.index());
        assert_ne!(second, first);
        assert_eq!(table.get(first), None);
        assert_eq!(table.get(second), Some(&"b"));
        assert_eq!(table.remove(first), None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn iter_skips_empty_slots() {
        let mut table = FrameTable::new();
        let a = table.insert(1);
        let b = table.insert(2);
        table.remove(a);
        let live: Vec<_> = table.iter().collect();
        assert_eq!(live, vec![(b, &2)]);
    }
}
