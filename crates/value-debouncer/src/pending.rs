use std::{fmt, sync::Arc, time::Duration};

use tracing::trace;

use crate::scheduler::{Scheduler, TimerCallback, TimerHandle};

/// Slot for the single outstanding timer of a holder.
///
/// Arming cancels whatever was armed before; dropping the slot cancels the
/// current timer.
pub struct PendingTimer {
    scheduler: Arc<dyn Scheduler>,
    handle: Option<TimerHandle>,
}

impl PendingTimer {
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self {
            scheduler,
            handle: None,
        }
    }

    pub fn arm(&mut self, delay: Duration, callback: TimerCallback) {
        self.disarm();
        trace!("arming timer for {:?}", delay);
        self.handle = Some(self.scheduler.schedule(delay, callback));
    }

    /// Cancel the armed timer. Returns whether it was still outstanding.
    pub fn disarm(&mut self) -> bool {
        let Some(handle) = self.handle.take() else {
            return false;
        };
        let outstanding = handle.is_outstanding();
        self.scheduler.cancel(&handle);
        outstanding
    }

    pub fn is_armed(&self) -> bool {
        self.handle
            .as_ref()
            .is_some_and(|handle| handle.is_outstanding())
    }
}

impl Drop for PendingTimer {
    fn drop(&mut self) {
        if self.disarm() {
            trace!("pending timer cancelled on drop");
        }
    }
}

impl fmt::Debug for PendingTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingTimer")
            .field("armed", &self.is_armed())
            .finish()
    }
}
