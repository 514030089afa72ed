//! The debounced value holder.
//!
//! A holder keeps the last observed input, the delay in force and a single
//! pending timer. Every input change bumps a generation counter, cancels the
//! pending timer and arms a new one. When a timer fires it publishes its
//! value only if its generation is still the current one, so a cancelled
//! timer can never publish even if its task already woke up.

use std::{
    fmt,
    sync::{Arc, Weak},
};

use parking_lot::Mutex;
use tokio::sync::{watch, Notify};
use tracing::{debug, trace};

use crate::{
    delay::Delay,
    equality::{ByValue, ValueEq},
    error::DebounceError,
    pending::PendingTimer,
    scheduler::{Scheduler, TokioScheduler},
};

struct State<T> {
    input: T,
    delay: Delay,
    generation: u64,
    pending: bool,
    timer: PendingTimer,
    closed: bool,
}

/// Publishes an input value once it has been stable for a delay.
///
/// The settled value starts out as the first input. Dropping the holder
/// cancels the pending timer; a value that had not settled yet is never
/// published.
pub struct DebouncedValue<T> {
    state: Arc<Mutex<State<T>>>,
    settled: Arc<watch::Sender<T>>,
    idle: Arc<Notify>,
    eq: Arc<dyn ValueEq<T>>,
}

impl<T> DebouncedValue<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Holder comparing inputs with `PartialEq`.
    pub fn new(initial: T, delay: Delay, scheduler: Arc<dyn Scheduler>) -> Self
    where
        T: PartialEq,
    {
        Self::with_equality(initial, delay, scheduler, ByValue)
    }

    /// Holder driven by the Tokio runtime the caller runs on.
    pub fn spawn(initial: T, delay: Delay) -> Result<Self, DebounceError>
    where
        T: PartialEq,
    {
        let scheduler = TokioScheduler::try_current()?;
        Ok(Self::new(initial, delay, Arc::new(scheduler)))
    }

    pub fn with_equality(
        initial: T,
        delay: Delay,
        scheduler: Arc<dyn Scheduler>,
        eq: impl ValueEq<T>,
    ) -> Self {
        Self::from_parts(initial, delay, scheduler, Arc::new(eq))
    }

    pub(crate) fn from_parts(
        initial: T,
        delay: Delay,
        scheduler: Arc<dyn Scheduler>,
        eq: Arc<dyn ValueEq<T>>,
    ) -> Self {
        let (settled, _) = watch::channel(initial.clone());
        let holder = Self {
            state: Arc::new(Mutex::new(State {
                input: initial.clone(),
                delay,
                generation: 0,
                pending: false,
                timer: PendingTimer::new(scheduler),
                closed: false,
            })),
            settled: Arc::new(settled),
            idle: Arc::new(Notify::new()),
            eq,
        };

        // the first value counts as a change too
        let mut state = holder.state.lock();
        holder.reschedule(&mut state, initial);
        drop(state);

        holder
    }

    /// Register interest in `value` and return the current settled value.
    ///
    /// The returned value stays stale until `value` has held for `delay`.
    /// Re-observing an unchanged value with the same delay changes nothing;
    /// a new delay restarts the wait against the latest value.
    pub fn observe(&self, value: T, delay: Delay) -> T {
        let mut state = self.state.lock();
        if !state.closed {
            let same_input = self.eq.same(&state.input, &value);
            if !same_input || state.delay != delay {
                state.input = value.clone();
                state.delay = delay;
                self.reschedule(&mut state, value);
            }
        }
        drop(state);

        self.get()
    }

    /// Current settled value.
    pub fn get(&self) -> T {
        self.settled.borrow().clone()
    }

    pub fn subscribe(&self) -> Subscription<T> {
        Subscription {
            rx: self.settled.subscribe(),
        }
    }

    pub fn delay(&self) -> Delay {
        self.state.lock().delay
    }

    /// Whether an observed value is still waiting to settle.
    pub fn is_pending(&self) -> bool {
        self.state.lock().pending
    }

    /// Wait until nothing is pending: the last observed value has settled or
    /// the holder was closed.
    pub async fn wait_settled(&self) {
        loop {
            let idle = self.idle.notified();
            tokio::pin!(idle);
            // register before checking so a settle in between isn't missed
            idle.as_mut().enable();
            if !self.is_pending() {
                return;
            }
            idle.await;
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn reschedule(&self, state: &mut State<T>, value: T) {
        state.generation += 1;
        state.pending = true;
        let generation = state.generation;
        let delay = state.delay;
        trace!(generation, delay_ms = delay.as_millis() as u64, "rescheduling settle");

        let publish = Publish {
            state: Arc::downgrade(&self.state),
            settled: Arc::downgrade(&self.settled),
            idle: self.idle.clone(),
            eq: self.eq.clone(),
            generation,
            value,
        };
        state
            .timer
            .arm(delay.as_duration(), Box::new(move || publish.run()));
    }
}

impl<T> DebouncedValue<T> {
    /// Tear the holder down: cancel the pending timer and stop accepting
    /// values. Called on drop as well.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if state.closed {
            return;
        }
        state.closed = true;
        state.generation += 1;
        state.pending = false;
        if state.timer.disarm() {
            debug!("closed with a value pending, discarding it");
        }
        drop(state);
        self.idle.notify_waiters();
    }
}

impl<T> Drop for DebouncedValue<T> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<T: fmt::Debug> fmt::Debug for DebouncedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("DebouncedValue")
            .field("settled", &*self.settled.borrow())
            .field("input", &state.input)
            .field("delay", &state.delay)
            .field("timer", &state.timer)
            .finish()
    }
}

/// Everything a firing timer needs to publish, without keeping the holder
/// alive.
struct Publish<T> {
    state: Weak<Mutex<State<T>>>,
    settled: Weak<watch::Sender<T>>,
    idle: Arc<Notify>,
    eq: Arc<dyn ValueEq<T>>,
    generation: u64,
    value: T,
}

impl<T: 'static> Publish<T> {
    fn run(self) {
        let (Some(state), Some(settled)) = (self.state.upgrade(), self.settled.upgrade()) else {
            return;
        };
        // publish under the state lock so a concurrent observe can't
        // interleave between the generation check and the send
        let mut state = state.lock();
        if state.closed || state.generation != self.generation {
            trace!(generation = self.generation, "stale timer, dropping value");
            return;
        }
        state.pending = false;

        let eq = &self.eq;
        let value = self.value;
        let changed = settled.send_if_modified(|current| {
            if eq.same(current, &value) {
                false
            } else {
                *current = value;
                true
            }
        });
        debug!(generation = self.generation, changed, "value settled");
        drop(state);
        self.idle.notify_waiters();
    }
}

/// Observer of the settled value.
#[derive(Debug, Clone)]
pub struct Subscription<T> {
    rx: watch::Receiver<T>,
}

impl<T: Clone> Subscription<T> {
    /// Wait for the next published value.
    ///
    /// Fails with [`DebounceError::Closed`] once the holder is gone and
    /// every published value has been seen.
    pub async fn changed(&mut self) -> Result<T, DebounceError> {
        self.rx.changed().await.map_err(|_| DebounceError::Closed)?;
        Ok(self.rx.borrow_and_update().clone())
    }

    /// Whether a value was published since the last `changed`.
    pub fn has_changed(&self) -> Result<bool, DebounceError> {
        self.rx.has_changed().map_err(|_| DebounceError::Closed)
    }

    pub fn get(&self) -> T {
        self.rx.borrow().clone()
    }
}
