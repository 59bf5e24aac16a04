//! CPU-side frame gating.
//!
//! [`FramePermits`] is a bounded counting semaphore: it starts with `max`
//! permits, an acquirer takes one per frame and the GPU completion callback
//! gives it back. When all permits are out the acquirer blocks, which bounds
//! the number of frames in flight.
//!
//! # Teardown
//!
//! [`FramePermits::close`] must be called before the owner goes away. It
//! refills the permits and wakes every waiter; from then on every acquire
//! returns [`GateClosed`] immediately, so no thread stays blocked on a gate
//! nobody will ever signal again.

use crate::error::GateClosed;
use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct GateState {
    available: usize,
    closed: bool,
}

/// A bounded counting semaphore with an explicit close.
#[derive(Debug)]
pub struct FramePermits {
    state: Mutex<GateState>,
    released: Condvar,
    max: usize,
}

impl FramePermits {
    /// Creates a gate holding `max` permits.
    pub fn new(max: usize) -> FramePermits {
        FramePermits {
            state: Mutex::new(GateState {
                available: max,
                closed: false,
            }),
            released: Condvar::new(),
            max,
        }
    }

    /// Maximum number of permits.
    #[inline]
    pub fn max(&self) -> usize {
        self.max
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        self.state.lock().available
    }

    /// Has [`FramePermits::close`] been called?
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Takes a permit, blocking until one is free.
    pub fn acquire(&self) -> Result<(), GateClosed> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return Err(GateClosed);
            }
            if state.available > 0 {
                state.available -= 1;
                return Ok(());
            }
            self.released.wait(&mut state);
        }
    }

    /// Takes a permit if one is free right now.
    pub fn try_acquire(&self) -> Result<bool, GateClosed> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(GateClosed);
        }
        if state.available > 0 {
            state.available -= 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Takes a permit, waiting at most `timeout`. Returns `Ok(false)` on timeout.
    pub fn acquire_timeout(&self, timeout: Duration) -> Result<bool, GateClosed> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return Err(GateClosed);
            }
            if state.available > 0 {
                state.available -= 1;
                return Ok(true);
            }
            if self.released.wait_until(&mut state, deadline).timed_out() {
                // A release may have raced with the timeout.
                if !state.closed && state.available > 0 {
                    state.available -= 1;
                    return Ok(true);
                }
                return Ok(false);
            }
        }
    }

    /// Returns a permit and wakes one waiter.
    ///
    /// Releasing more permits than were acquired is ignored past `max`.
    pub fn release(&self) {
        let mut state = self.state.lock();
        if state.available < self.max {
            state.available += 1;
        } else if !state.closed {
            log::warn!("Frame gate released more often than acquired.");
        }
        drop(state);
        self.released.notify_one();
    }

    /// Closes the gate: refills every permit and wakes all waiters.
    ///
    /// Idempotent.
    pub fn close(&self) {
        let mut state = self.state.lock();
        if !state.closed {
            log::debug!(
                "Closing frame gate ({} of {} permits outstanding).",
                self.max - state.available,
                self.max
            );
        }
        state.closed = true;
        state.available = self.max;
        drop(state);
        self.released.notify_all();
    }
}
