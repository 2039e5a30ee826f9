use log::{debug, warn};
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use super::handle::HandleSlot;

/// Identity of one opened handle, unique within its registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleId(u64);

impl fmt::Display for HandleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Non-owning set of live handles.
///
/// Entries are weak: handles belong to whoever opened them, and the
/// registry only exists so [`close_all`](Self::close_all) can reach the
/// ones still open at shutdown.
#[derive(Default)]
pub struct HandleRegistry {
    next_id: AtomicU64,
    live: Mutex<HashMap<HandleId, Weak<HandleSlot>>>,
}

impl HandleRegistry {
    fn live(&self) -> MutexGuard<'_, HashMap<HandleId, Weak<HandleSlot>>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn register(&self, slot: &Arc<HandleSlot>) -> HandleId {
        let id = HandleId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.live().insert(id, Arc::downgrade(slot));
        id
    }

    pub(crate) fn unregister(&self, id: HandleId) {
        self.live().remove(&id);
    }

    /// Number of handles currently tracked.
    pub fn len(&self) -> usize {
        self.live().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Close every tracked handle and forget them all.
    ///
    /// Returns how many were still open. Files already written to the
    /// scratch directory are left alone.
    pub fn close_all(&self) -> usize {
        let drained: Vec<_> = self.live().drain().collect();
        let mut closed = 0;
        for (id, slot) in drained {
            let Some(slot) = slot.upgrade() else {
                continue;
            };
            if slot
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take()
                .is_some()
            {
                warn!("closing handle {} left open at shutdown", id);
                closed += 1;
            }
        }
        debug!("close_all released {} handle(s)", closed);
        closed
    }
}
