//! The step queue: one slot per clock step in a cycle.

use super::player::PlayerId;
use super::Clock;
use crate::types::time::Time;
use std::fmt;

/// Handle for a scheduled callable, used to cancel it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScheduleKey(pub(crate) u64);

impl fmt::Display for ScheduleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

pub(crate) type Call = Box<dyn FnOnce(&Clock) -> anyhow::Result<()> + Send>;
pub(crate) type Recurring = Box<dyn FnMut(&Clock) -> anyhow::Result<()> + Send>;

pub(crate) enum Task {
    /// Fire once
    Call(Call),
    /// Fire, then come back `interval` beats later
    Repeat { interval: Time, action: Recurring },
    /// Update and emit a registered player
    Player(PlayerId),
}

impl Task {
    pub fn is_player(&self) -> bool {
        matches!(self, Task::Player(_))
    }
}

pub(crate) struct Entry {
    pub key: ScheduleKey,
    /// Exact due beat
    pub at: Time,
    /// Absolute due step (`at` on the current grid)
    pub step: u64,
    pub task: Task,
}

pub(crate) struct Queue {
    slots: Vec<Vec<Entry>>,
}

impl Queue {
    pub fn new(len: usize) -> Self {
        Self {
            slots: (0..len.max(1)).map(|_| Vec::new()).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn push(&mut self, entry: Entry) {
        let slot = (entry.step % self.slots.len() as u64) as usize;
        self.slots[slot].push(entry);
    }

    /// Remove and return the entries of `position`'s slot that are due.
    /// Entries filed for a later cycle stay put.
    pub fn take_due(&mut self, position: u64) -> Vec<Entry> {
        let slot = (position % self.slots.len() as u64) as usize;
        let (due, later): (Vec<Entry>, Vec<Entry>) = std::mem::take(&mut self.slots[slot])
            .into_iter()
            .partition(|entry| entry.step <= position);
        self.slots[slot] = later;
        due
    }

    pub fn remove(&mut self, key: ScheduleKey) -> bool {
        for slot in &mut self.slots {
            if let Some(index) = slot.iter().position(|entry| entry.key == key) {
                slot.remove(index);
                return true;
            }
        }
        false
    }

    /// Remove every entry for a player
    pub fn remove_player(&mut self, id: PlayerId) {
        for slot in &mut self.slots {
            slot.retain(|entry| !matches!(entry.task, Task::Player(p) if p == id));
        }
    }

    pub fn contains(&self, key: ScheduleKey) -> bool {
        self.slots.iter().flatten().any(|entry| entry.key == key)
    }

    /// Empty the queue and resize it, handing back what it held
    pub fn rebuild(&mut self, len: usize) -> Vec<Entry> {
        let old = std::mem::replace(self, Queue::new(len));
        old.slots.into_iter().flatten().collect()
    }

    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(Vec::clear);
    }

    pub fn count(&self) -> usize {
        self.slots.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Vec::is_empty)
    }

    pub fn slot_len(&self, slot: usize) -> usize {
        self.slots.get(slot).map_or(0, Vec::len)
    }

    /// Due steps of every entry, for status reports
    pub fn due_steps(&self) -> Vec<u64> {
        let mut steps: Vec<u64> = self.slots.iter().flatten().map(|entry| entry.step).collect();
        steps.sort_unstable();
        steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::time::beats;

    fn entry(key: u64, step: u64) -> Entry {
        Entry {
            key: ScheduleKey(key),
            at: beats(step as i64),
            step,
            task: Task::Call(Box::new(|_| Ok(()))),
        }
    }

    #[test]
    fn test_take_due_leaves_later_cycles() {
        let mut queue = Queue::new(4);
        queue.push(entry(1, 2));
        queue.push(entry(2, 6));
        assert_eq!(queue.slot_len(2), 2);

        let due = queue.take_due(2);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].key, ScheduleKey(1));
        assert_eq!(queue.count(), 1);

        assert_eq!(queue.take_due(6).len(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_remove_and_rebuild() {
        let mut queue = Queue::new(4);
        queue.push(entry(1, 0));
        queue.push(entry(2, 3));
        assert!(queue.remove(ScheduleKey(1)));
        assert!(!queue.remove(ScheduleKey(1)));
        assert!(queue.contains(ScheduleKey(2)));

        let entries = queue.rebuild(8);
        assert_eq!(entries.len(), 1);
        assert_eq!(queue.len(), 8);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_remove_player() {
        let mut queue = Queue::new(2);
        queue.push(Entry {
            key: ScheduleKey(9),
            at: beats(0),
            step: 0,
            task: Task::Player(PlayerId(3)),
        });
        queue.push(entry(1, 0));
        queue.remove_player(PlayerId(3));
        assert_eq!(queue.count(), 1);
    }
}
