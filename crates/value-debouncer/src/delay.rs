use std::time::Duration;

/// Quiet period a value must hold before it is published.
///
/// Negative inputs are clamped to zero rather than rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Delay(Duration);

impl Delay {
    /// 300ms, the quiet period used when the caller doesn't pick one.
    pub const DEFAULT: Delay = Delay(Duration::from_millis(300));

    pub const ZERO: Delay = Delay(Duration::ZERO);

    /// Build a delay from signed milliseconds, clamping negatives to zero.
    pub fn from_millis(ms: i64) -> Self {
        Self(Duration::from_millis(ms.max(0) as u64))
    }

    pub fn as_duration(&self) -> Duration {
        self.0
    }

    pub fn as_millis(&self) -> u128 {
        self.0.as_millis()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Default for Delay {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl From<Duration> for Delay {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}

impl From<Delay> for Duration {
    fn from(delay: Delay) -> Self {
        delay.0
    }
}
