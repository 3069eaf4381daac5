use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Wait was cancelled")]
pub struct Cancelled;

/// Clock and sleep source for the polling loops.
///
/// `now` is monotonic and relative to an arbitrary origin. `pause` returns
/// `Err(Cancelled)` as soon as the owner asks the loop to stop.
pub trait Pacer {
    fn now(&self) -> Duration;
    fn pause(&mut self, period: Duration) -> Result<(), Cancelled>;
}

/// Shared stop flag that wakes a sleeping [`WallPacer`] immediately.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (flag, wakeup) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        wakeup.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep for `period` unless cancelled first.
    fn sleep(&self, period: Duration) -> Result<(), Cancelled> {
        let (flag, wakeup) = &*self.inner;
        let guard = flag.lock().unwrap_or_else(PoisonError::into_inner);
        let (guard, _timeout) = wakeup
            .wait_timeout_while(guard, period, |cancelled| !*cancelled)
            .unwrap_or_else(PoisonError::into_inner);

        if *guard {
            Err(Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Real time pacing backed by [`Instant`].
#[derive(Debug, Clone)]
pub struct WallPacer {
    origin: Instant,
    cancel: CancelToken,
}

impl WallPacer {
    pub fn new(cancel: CancelToken) -> Self {
        Self {
            origin: Instant::now(),
            cancel,
        }
    }
}

impl Default for WallPacer {
    fn default() -> Self {
        Self::new(CancelToken::new())
    }
}

impl Pacer for WallPacer {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn pause(&mut self, period: Duration) -> Result<(), Cancelled> {
        self.cancel.sleep(period)
    }
}

/// Simulated time: the clock only moves when the loop pauses.
#[derive(Debug, Clone, Default)]
pub struct VirtualPacer {
    now: Duration,
    pauses: usize,
    budget: Option<usize>,
}

impl VirtualPacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report cancellation once `pauses` pauses have completed.
    pub fn cancel_after(mut self, pauses: usize) -> Self {
        self.budget = Some(pauses);
        self
    }

    pub fn pauses(&self) -> usize {
        self.pauses
    }
}

impl Pacer for VirtualPacer {
    fn now(&self) -> Duration {
        self.now
    }

    fn pause(&mut self, period: Duration) -> Result<(), Cancelled> {
        if self.budget.is_some_and(|budget| self.pauses >= budget) {
            return Err(Cancelled);
        }
        self.now += period;
        self.pauses += 1;
        Ok(())
    }
}
