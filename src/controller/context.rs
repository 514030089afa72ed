//! Events and options shared by the settle controller.

use value_debouncer::Delay;

use crate::{config::Config, entity::EqualityMode};

/// Events the settle loop reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettleEvent {
    /// A new input value
    Input(String),
    /// Change the delay; the wait restarts against the latest input
    DelayChanged(Delay),
    /// No more input; tear the holder down
    Eof,
}

/// What the settle loop needs from the resolved config.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettleOptions {
    pub delay: Delay,
    pub equality: EqualityMode,
    /// Wait for the pending value to settle before tearing down on EOF
    pub flush_on_eof: bool,
}

impl From<&Config> for SettleOptions {
    fn from(config: &Config) -> Self {
        Self {
            delay: config.delay,
            equality: config.equality,
            flush_on_eof: config.flush_on_eof,
        }
    }
}
