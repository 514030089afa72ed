//! Keyed debounced values with lease-based lifetime.
//!
//! The first observation of a key creates its holder; dropping the last
//! [`Lease`] for that key tears the holder down and cancels its timer.

use std::{fmt, hash::Hash, sync::Arc};

use dashmap::{mapref::entry::Entry, DashMap};
use tracing::debug;

use crate::{
    delay::Delay,
    equality::ValueEq,
    holder::{DebouncedValue, Subscription},
    scheduler::Scheduler,
};

struct Slot<T> {
    holder: DebouncedValue<T>,
    leases: usize,
}

type Slots<K, T> = Arc<DashMap<K, Slot<T>>>;

pub struct DebounceRegistry<K, T> {
    slots: Slots<K, T>,
    scheduler: Arc<dyn Scheduler>,
    eq: Arc<dyn ValueEq<T>>,
}

impl<K, T> DebounceRegistry<K, T>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new(scheduler: Arc<dyn Scheduler>, eq: impl ValueEq<T>) -> Self {
        Self {
            slots: Arc::new(DashMap::new()),
            scheduler,
            eq: Arc::new(eq),
        }
    }

    /// Observe `value` under `key` and take a lease on the key's holder.
    pub fn observe(&self, key: K, value: T, delay: Delay) -> Lease<K, T> {
        match self.slots.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let slot = occupied.get_mut();
                slot.leases += 1;
                slot.holder.observe(value, delay);
            }
            Entry::Vacant(vacant) => {
                debug!("creating debounced holder for new key");
                vacant.insert(Slot {
                    holder: DebouncedValue::from_parts(
                        value,
                        delay,
                        self.scheduler.clone(),
                        self.eq.clone(),
                    ),
                    leases: 1,
                });
            }
        }

        Lease {
            key,
            slots: self.slots.clone(),
        }
    }

    /// Settled value for `key`, if any lease keeps it alive.
    pub fn get(&self, key: &K) -> Option<T> {
        self.slots.get(key).map(|slot| slot.holder.get())
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Keeps one key's holder alive.
pub struct Lease<K, T>
where
    K: Eq + Hash,
{
    key: K,
    slots: Slots<K, T>,
}

impl<K, T> Lease<K, T>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn observe(&self, value: T, delay: Delay) -> Option<T> {
        self.slots
            .get(&self.key)
            .map(|slot| slot.holder.observe(value, delay))
    }

    pub fn get(&self) -> Option<T> {
        self.slots.get(&self.key).map(|slot| slot.holder.get())
    }

    pub fn subscribe(&self) -> Option<Subscription<T>> {
        self.slots.get(&self.key).map(|slot| slot.holder.subscribe())
    }
}

impl<K, T> Drop for Lease<K, T>
where
    K: Eq + Hash,
{
    fn drop(&mut self) {
        if let Some(mut slot) = self.slots.get_mut(&self.key) {
            slot.leases = slot.leases.saturating_sub(1);
        }
        // removed outside the shard guard above; the holder's own drop
        // cancels its timer
        if let Some((_, slot)) = self.slots.remove_if(&self.key, |_, slot| slot.leases == 0) {
            debug!("last lease dropped, tearing holder down");
            drop(slot);
        }
    }
}

impl<K: Eq + Hash + fmt::Debug, T> fmt::Debug for Lease<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lease").field("key", &self.key).finish()
    }
}
