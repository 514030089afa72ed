//! # value-debouncer
//!
//! Publish a value only after it has stopped changing for a while.
//!
//! A [`DebouncedValue`] wraps an input value and a [`Delay`]. Callers keep
//! calling [`DebouncedValue::observe`] with whatever the input currently is;
//! the settled value returned (and broadcast to [`Subscription`]s) only
//! moves once an input has held for the full delay. Intermediate values in
//! a burst are dropped, never queued.
//!
//! ## Overview
//!
//! - **holder**: the debounced value itself, one pending timer per holder
//! - **scheduler**: the timer facility, with a Tokio implementation
//! - **pending**: RAII slot that cancels the previous timer on every exit
//! - **equality**: what "unchanged" means, picked by the caller
//! - **registry**: one holder per key, alive while leases exist
//!
//! ## Example
//!
//! ```ignore
//! use value_debouncer::{DebouncedValue, Delay};
//!
//! let search = DebouncedValue::spawn(String::new(), Delay::DEFAULT)?;
//! let mut settled = search.subscribe();
//!
//! search.observe("tok".to_string(), Delay::DEFAULT);
//! search.observe("tokio".to_string(), Delay::DEFAULT);
//!
//! // only "tokio" is ever published, 300ms after the last keystroke
//! assert_eq!(settled.changed().await?, "tokio");
//! ```

mod delay;
mod equality;
mod error;
mod holder;
mod pending;
mod registry;
mod scheduler;

pub use delay::Delay;
pub use equality::{eq_fn, ByIdentity, ByValue, EqFn, ValueEq};
pub use error::DebounceError;
pub use holder::{DebouncedValue, Subscription};
pub use pending::PendingTimer;
pub use registry::{DebounceRegistry, Lease};
pub use scheduler::{Scheduler, TimerCallback, TimerHandle, TokioScheduler};
