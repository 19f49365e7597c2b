// SPDX-License-Identifier: MPL-2.0

//! Listeners for the on-screen position of video layers.
//!
//! A single external actor owns the observer and moves it between layers,
//! so every layer's observer slot sits behind one registry-wide lock rather
//! than a per-layer one. Registration, notification lookups and the release
//! on layer destruction all go through [`ObserverRegistry::lock`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use crate::geometry::IntRect;

/// Receives the screen-space rectangle of a video layer after each frame.
pub trait VideoLayerObserver: Send + Sync {
    fn notify_rect_change(&self, rect: IntRect);
}

/// Key of one layer's observer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverSlot(u64);

type Slots = HashMap<ObserverSlot, Arc<dyn VideoLayerObserver>>;

/// Observer slots of every layer, guarded by a single mutex.
#[derive(Default)]
pub struct ObserverRegistry {
    slots: Mutex<Slots>,
    next_slot: AtomicU64,
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("next_slot", &self.next_slot.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl ObserverRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// The registry shared by every layer created without an explicit one.
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<ObserverRegistry>> = OnceLock::new();
        GLOBAL.get_or_init(ObserverRegistry::new).clone()
    }

    /// Reserves an empty slot for a new layer.
    pub fn allocate(&self) -> ObserverSlot {
        ObserverSlot(self.next_slot.fetch_add(1, Ordering::Relaxed))
    }

    /// Acquires the registry lock for the lifetime of the returned guard.
    ///
    /// A poisoned lock is recovered: slots only ever hold complete values.
    pub fn lock(&self) -> ObserverGuard<'_> {
        ObserverGuard {
            slots: self.slots.lock().unwrap_or_else(PoisonError::into_inner),
        }
    }
}

/// Scoped access to the observer slots.
pub struct ObserverGuard<'a> {
    slots: MutexGuard<'a, Slots>,
}

impl ObserverGuard<'_> {
    /// Points `slot` at `observer`.
    ///
    /// Nothing happens when `observer` is the one already registered.
    /// Otherwise the previous reference is released and the new one retained;
    /// `None` only releases. Returns whether the slot changed.
    pub fn register(
        &mut self,
        slot: ObserverSlot,
        observer: Option<Arc<dyn VideoLayerObserver>>,
    ) -> bool {
        let current = self.slots.get(&slot);
        let unchanged = match (current, observer.as_ref()) {
            (Some(current), Some(new)) => same_observer(current, new),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return false;
        }

        match observer {
            Some(observer) => {
                self.slots.insert(slot, observer);
            }
            None => {
                self.slots.remove(&slot);
            }
        }
        true
    }

    /// A new reference to the observer of `slot`.
    #[must_use]
    pub fn observer(&self, slot: ObserverSlot) -> Option<Arc<dyn VideoLayerObserver>> {
        self.slots.get(&slot).cloned()
    }

    /// Drops the reference held for `slot`.
    pub fn release(&mut self, slot: ObserverSlot) -> Option<Arc<dyn VideoLayerObserver>> {
        self.slots.remove(&slot)
    }

    /// Number of slots with an observer.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Identity comparison, ignoring vtable differences.
fn same_observer(a: &Arc<dyn VideoLayerObserver>, b: &Arc<dyn VideoLayerObserver>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
