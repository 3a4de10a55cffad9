use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
};

use super::GameState;
use crate::types::SentenceId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Task {
    EnterScene(GameState),
    BeginPlaying,
    LoadBother,
    Settle(SentenceId),
    Tick { epoch: u32 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskHandle(u64);

#[derive(Debug)]
struct Entry {
    due: u64,
    seq: u64,
    task: Task,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

/// Virtual-time queue of deferred work. Tasks due at the same instant run in
/// the order they were scheduled.
#[derive(Debug, Default)]
pub struct Scheduler {
    now: u64,
    next_seq: u64,
    queue: BinaryHeap<Reverse<Entry>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn schedule(&mut self, delay_ms: u64, task: Task) -> TaskHandle {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Entry {
            due: self.now.saturating_add(delay_ms),
            seq,
            task,
        }));
        TaskHandle(seq)
    }

    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.queue.len();
        self.queue.retain(|Reverse(entry)| entry.seq != handle.0);
        self.queue.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.queue.clear();
    }

    /// Pops the next task due at or before `until`, moving the clock to its
    /// due time. Once nothing is due the clock moves to `until`.
    pub fn pop_due(&mut self, until: u64) -> Option<Task> {
        let due = self.queue.peek().map(|Reverse(entry)| entry.due);
        match due {
            Some(due) if due <= until => {
                let Reverse(entry) = self.queue.pop()?;
                self.now = self.now.max(entry.due);
                Some(entry.task)
            }
            _ => {
                self.now = self.now.max(until);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(scheduler: &mut Scheduler, until: u64) -> Vec<Task> {
        std::iter::from_fn(|| scheduler.pop_due(until)).collect()
    }

    mod pop_due {
        use super::*;

        #[test]
        fn runs_in_due_order() {
            let mut scheduler = Scheduler::new();
            scheduler.schedule(300, Task::Settle(3));
            scheduler.schedule(100, Task::Settle(1));
            scheduler.schedule(200, Task::Settle(2));
            assert_eq!(
                drain(&mut scheduler, 1000),
                vec![Task::Settle(1), Task::Settle(2), Task::Settle(3)]
            );
            assert_eq!(scheduler.now(), 1000);
        }

        #[test]
        fn ties_keep_schedule_order() {
            let mut scheduler = Scheduler::new();
            scheduler.schedule(50, Task::LoadBother);
            scheduler.schedule(50, Task::BeginPlaying);
            assert_eq!(
                drain(&mut scheduler, 50),
                vec![Task::LoadBother, Task::BeginPlaying]
            );
        }

        #[test]
        fn leaves_future_tasks_queued() {
            let mut scheduler = Scheduler::new();
            scheduler.schedule(100, Task::LoadBother);
            assert!(scheduler.pop_due(99).is_none());
            assert_eq!(scheduler.now(), 99);
            assert_eq!(scheduler.pending(), 1);
            assert_eq!(scheduler.pop_due(100), Some(Task::LoadBother));
        }

        #[test]
        fn delays_are_relative_to_the_running_task() {
            let mut scheduler = Scheduler::new();
            scheduler.schedule(100, Task::LoadBother);
            assert_eq!(scheduler.pop_due(500), Some(Task::LoadBother));
            assert_eq!(scheduler.now(), 100);
            scheduler.schedule(100, Task::LoadBother);
            assert_eq!(scheduler.pop_due(500), Some(Task::LoadBother));
            assert_eq!(scheduler.now(), 200);
        }

        #[test]
        fn clock_never_runs_backwards() {
            let mut scheduler = Scheduler::new();
            scheduler.pop_due(500);
            scheduler.pop_due(200);
            assert_eq!(scheduler.now(), 500);
        }
    }

    mod cancel {
        use super::*;

        #[test]
        fn cancelled_task_never_runs() {
            let mut scheduler = Scheduler::new();
            let keep = scheduler.schedule(10, Task::Settle(1));
            let drop = scheduler.schedule(10, Task::Settle(2));
            assert!(scheduler.cancel(drop));
            assert!(!scheduler.cancel(drop));
            assert!(!scheduler.cancel(TaskHandle(99)));
            assert_eq!(scheduler.pending(), 1);
            assert_eq!(drain(&mut scheduler, 10), vec![Task::Settle(1)]);
            assert!(!scheduler.cancel(keep));
        }

        #[test]
        fn cancel_all_empties_queue() {
            let mut scheduler = Scheduler::new();
            scheduler.schedule(10, Task::LoadBother);
            scheduler.schedule(20, Task::BeginPlaying);
            scheduler.cancel_all();
            assert_eq!(scheduler.pending(), 0);
            assert!(scheduler.pop_due(u64::MAX).is_none());
        }
    }
}
