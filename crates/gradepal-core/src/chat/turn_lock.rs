//! One in-flight turn per thread.
//!
//! A second send to a thread that is still producing a reply is rejected
//! rather than interleaved.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use uuid::Uuid;

/// Registry of threads with a turn in progress.
#[derive(Debug, Clone, Default)]
pub struct TurnLocks {
    active: Arc<DashMap<Uuid, ()>>,
}

impl TurnLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `thread_id`. `None` if a turn already holds it.
    pub fn try_acquire(&self, thread_id: Uuid) -> Option<TurnGuard> {
        match self.active.entry(thread_id) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(TurnGuard {
                    active: Arc::clone(&self.active),
                    thread_id,
                })
            }
        }
    }

    pub fn is_active(&self, thread_id: &Uuid) -> bool {
        self.active.contains_key(thread_id)
    }
}

/// Releases the thread when dropped.
#[derive(Debug)]
pub struct TurnGuard {
    active: Arc<DashMap<Uuid, ()>>,
    thread_id: Uuid,
}

impl TurnGuard {
    pub fn thread_id(&self) -> Uuid {
        self.thread_id
    }
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        self.active.remove(&self.thread_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_acquire_is_rejected_until_release() {
        let locks = TurnLocks::new();
        let id = Uuid::now_v7();

        let guard = locks.try_acquire(id).unwrap();
        assert!(locks.try_acquire(id).is_none());
        assert!(locks.is_active(&id));

        drop(guard);
        assert!(!locks.is_active(&id));
        assert!(locks.try_acquire(id).is_some());
    }

    #[test]
    fn test_different_threads_do_not_contend() {
        let locks = TurnLocks::new();
        let _a = locks.try_acquire(Uuid::now_v7()).unwrap();
        let _b = locks.try_acquire(Uuid::now_v7()).unwrap();
    }
}
