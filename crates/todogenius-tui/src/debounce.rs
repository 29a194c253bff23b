use std::time::{Duration, Instant};

/// Holds back a rapidly changing value until it has been stable for `delay`.
///
/// Only the newest value is kept; each `set` restarts the window. Time is
/// passed in explicitly so the event loop and tests control the clock.
#[derive(Debug, Clone)]
pub struct Debounced<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debounced<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn set(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// Returns the value once its window has elapsed. Fires at most once per `set`.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.pending {
            Some((_, deadline)) if deadline <= now => self.pending.take().map(|(v, _)| v),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, d)| *d)
    }
}
