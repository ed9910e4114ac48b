//! Emulated thread-local storage (`TlsAlloc`, `TlsFree`, `TlsGetValue`, `TlsSetValue`).
//!
//! Scheduler contexts are shared between many emulated threads, so values are
//! scoped to the emulated thread rather than to the OS thread underneath it.
//! Dispatch wraps every start routine in a [`TlsContextGuard`]: the routine
//! starts with empty storage, and whatever it stored is dropped when it returns.
//! Code running outside an emulated thread gets plain per-OS-thread storage.
//!
//! Freeing an index bumps its generation; values written under an older
//! generation are never returned again, even after the index is reallocated.

use crate::error::{Result, ThreadEmulationError};
use parking_lot::Mutex;
use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Value stored in a TLS slot
pub type TlsValue = Arc<dyn Any + Send + Sync>;

/// Index returned by [`TlsRegistry::alloc`]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TlsIndex(u32);

impl TlsIndex {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for TlsIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TlsIndex({})", self.0)
    }
}

#[derive(Clone, Copy, Default)]
struct SlotState {
    allocated: bool,
    generation: u64,
}

/// Slot index -> (generation the value was written under, value)
type ContextValues = HashMap<u32, (u64, TlsValue)>;

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(0);

thread_local! {
    /// Registry id -> values of the emulated thread currently running here
    static CONTEXT: RefCell<HashMap<u64, ContextValues>> = RefCell::new(HashMap::new());
}

/// TLS index space of one [`ThreadEmulation`](crate::ThreadEmulation)
pub struct TlsRegistry {
    id: u64,
    capacity: u32,
    slots: Mutex<Vec<SlotState>>,
}

impl TlsRegistry {
    pub fn new(capacity: u32) -> Self {
        Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            capacity,
            slots: Mutex::new(Vec::new()),
        }
    }

    /// Allocate the lowest free index
    pub fn alloc(&self) -> Result<TlsIndex> {
        let mut slots = self.slots.lock();

        let free = slots.iter().position(|slot| !slot.allocated);
        let index = match free {
            Some(index) => index,
            None if slots.len() < self.capacity as usize => {
                slots.push(SlotState::default());
                slots.len() - 1
            }
            None => return Err(ThreadEmulationError::TlsOutOfIndexes),
        };

        let slot = &mut slots[index];
        slot.allocated = true;
        slot.generation += 1;
        Ok(TlsIndex(index as u32))
    }

    pub fn free(&self, index: TlsIndex) -> Result<()> {
        let mut slots = self.slots.lock();
        match slots.get_mut(index.0 as usize) {
            Some(slot) if slot.allocated => {
                slot.allocated = false;
                Ok(())
            }
            _ => Err(ThreadEmulationError::InvalidTlsIndex(index.0)),
        }
    }

    /// Store `value` for the current emulated thread; `None` clears the slot
    pub fn set_value(&self, index: TlsIndex, value: Option<TlsValue>) -> Result<()> {
        let generation = self.generation(index)?;

        // The replaced value is dropped after the borrow ends, in case its
        // destructor touches TLS itself.
        let replaced = CONTEXT.with(|context| {
            let mut context = context.borrow_mut();
            let values = context.entry(self.id).or_default();
            match value {
                Some(value) => values.insert(index.0, (generation, value)),
                None => values.remove(&index.0),
            }
        });
        drop(replaced);
        Ok(())
    }

    pub fn get_value(&self, index: TlsIndex) -> Result<Option<TlsValue>> {
        let generation = self.generation(index)?;

        Ok(CONTEXT.with(|context| {
            context
                .borrow()
                .get(&self.id)
                .and_then(|values| values.get(&index.0))
                .filter(|(written_under, _)| *written_under == generation)
                .map(|(_, value)| Arc::clone(value))
        }))
    }

    pub fn allocated_count(&self) -> usize {
        self.slots.lock().iter().filter(|slot| slot.allocated).count()
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Give the calling context fresh storage until the guard drops
    pub(crate) fn enter_context(&self) -> TlsContextGuard {
        let saved = CONTEXT.with(|context| context.borrow_mut().remove(&self.id));
        TlsContextGuard {
            registry_id: self.id,
            saved,
        }
    }

    fn generation(&self, index: TlsIndex) -> Result<u64> {
        match self.slots.lock().get(index.0 as usize) {
            Some(slot) if slot.allocated => Ok(slot.generation),
            _ => Err(ThreadEmulationError::InvalidTlsIndex(index.0)),
        }
    }
}

/// Drops the emulated thread's values and restores what the context held before
pub(crate) struct TlsContextGuard {
    registry_id: u64,
    saved: Option<ContextValues>,
}

impl Drop for TlsContextGuard {
    fn drop(&mut self) {
        let saved = self.saved.take();
        let finished = CONTEXT.try_with(|context| {
            let mut context = context.borrow_mut();
            let finished = context.remove(&self.registry_id);
            if let Some(saved) = saved {
                context.insert(self.registry_id, saved);
            }
            finished
        });
        drop(finished);
    }
}
