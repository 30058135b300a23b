//! Timing primitives for the Feltwire client.
//!
//! The connection manager runs a single `tokio::select!` loop; anything
//! time-driven has to be expressible as a future in that loop. Both
//! timers here follow the same rule: **while disarmed they pend
//! forever**, so they can sit permanently in the `select!` without
//! firing, and arming/disarming is a plain synchronous state flip on the
//! owning task.
//!
//! - [`KeepaliveTimer`] — repeating; drives the heartbeat while a
//!   connection is up.
//! - [`RetryTimer`] — single-shot; drives the one reconnection attempt
//!   scheduled after an unexpected connection loss.
//! - [`wait_until`] — bounded, cancellable wait for a predicate over a
//!   watch channel; the building block for "wait for
//!   connection-established before authenticating" style sequencing.
//!
//! # Integration
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         cmd = cmd_rx.recv() => { /* public operations */ }
//!         frame = socket_recv() => { /* inbound dispatch */ }
//!         () = heartbeat.due() => { /* send heartbeat */ }
//!         () = retry.due() => { /* attempt reconnect */ }
//!     }
//! }
//! ```

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{self, Instant as TokioInstant};
use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// KeepaliveTimer
// ---------------------------------------------------------------------------

/// Repeating keepalive timer with explicit armed/disarmed state.
///
/// Created disarmed. [`arm`](Self::arm) schedules the first fire one full
/// interval out and every completed [`due`](Self::due) schedules the
/// next; [`disarm`](Self::disarm) cancels the pending deadline
/// synchronously. Re-arming always resets the deadline, so no stale
/// deadline from a previous connection can leak into a new one.
///
/// A zero interval disables the timer entirely: `arm` is a logged no-op
/// and [`due`](Self::due) pends forever.
#[derive(Debug)]
pub struct KeepaliveTimer {
    interval: Duration,
    next_fire: Option<TokioInstant>,
    fired: u64,
}

impl KeepaliveTimer {
    /// Creates a disarmed timer with the given interval.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_fire: None,
            fired: 0,
        }
    }

    /// Arms (or re-arms) the timer: next fire is one interval from now.
    pub fn arm(&mut self) {
        if self.interval.is_zero() {
            debug!("keepalive interval is zero — timer stays disarmed");
            return;
        }
        self.next_fire = Some(TokioInstant::now() + self.interval);
        debug!(interval = ?self.interval, "keepalive armed");
    }

    /// Disarms the timer. The pending deadline is dropped immediately.
    ///
    /// Idempotent.
    pub fn disarm(&mut self) {
        if self.next_fire.take().is_some() {
            debug!("keepalive disarmed");
        }
    }

    /// Whether a fire is currently scheduled.
    pub fn is_armed(&self) -> bool {
        self.next_fire.is_some()
    }

    /// The configured interval.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// How many times the timer has fired since creation.
    pub fn fired(&self) -> u64 {
        self.fired
    }

    /// Resolves when the next keepalive is due, then schedules the one
    /// after it.
    ///
    /// While disarmed this pends forever — `tokio::select!` will simply
    /// never take this branch.
    pub async fn due(&mut self) {
        let Some(next) = self.next_fire else {
            std::future::pending::<()>().await;
            unreachable!()
        };

        time::sleep_until(next).await;

        self.next_fire = Some(TokioInstant::now() + self.interval);
        self.fired += 1;
        trace!(fired = self.fired, "keepalive due");
    }
}

// ---------------------------------------------------------------------------
// RetryTimer
// ---------------------------------------------------------------------------

/// Single-shot retry timer with explicit armed/disarmed state.
///
/// This is the reconnection supervisor's clock: armed once per
/// unexpected connection loss, it fires exactly once after the fixed
/// delay and disarms itself. The owner decides at fire time whether the
/// retry still applies (it doesn't if the caller reconnected manually in
/// the meantime).
///
/// Modelling the supervisor as explicit armed/disarmed state — rather
/// than timer callbacks re-triggering each other — is what makes
/// cancellation on manual disconnect a one-line, testable operation.
#[derive(Debug)]
pub struct RetryTimer {
    delay: Duration,
    deadline: Option<TokioInstant>,
}

impl RetryTimer {
    /// Creates a disarmed timer with the given fixed delay.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    /// Arms the timer: it will fire once, one delay from now.
    ///
    /// Re-arming while already armed resets the deadline — there is
    /// never more than one pending attempt.
    pub fn arm(&mut self) {
        self.deadline = Some(TokioInstant::now() + self.delay);
        debug!(delay = ?self.delay, "retry armed");
    }

    /// Disarms the timer, cancelling any pending fire.
    ///
    /// Idempotent.
    pub fn disarm(&mut self) {
        if self.deadline.take().is_some() {
            debug!("retry disarmed");
        }
    }

    /// Whether a fire is currently scheduled.
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// The configured delay.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Resolves when the scheduled attempt is due, disarming the timer.
    ///
    /// While disarmed this pends forever.
    pub async fn due(&mut self) {
        let Some(deadline) = self.deadline else {
            std::future::pending::<()>().await;
            unreachable!()
        };

        time::sleep_until(deadline).await;

        self.deadline = None;
        debug!("retry due");
    }
}

// ---------------------------------------------------------------------------
// wait_until
// ---------------------------------------------------------------------------

/// Why a [`wait_until`] call did not observe its predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WaitError {
    /// The timeout elapsed before the predicate held.
    #[error("timed out waiting for condition")]
    TimedOut,

    /// The watched state's owner was torn down mid-wait.
    #[error("state channel closed while waiting")]
    Closed,
}

/// Waits (bounded) for `predicate` to hold over the values of a watch
/// channel.
///
/// Resolves immediately if the current value already satisfies the
/// predicate. This is a cooperative wait, not a poll loop: the task is
/// woken only when the watched value changes, and the whole wait is
/// cancelled cleanly if the sender is dropped (owner torn down) or the
/// timeout fires.
///
/// # Errors
/// - [`WaitError::TimedOut`] — `timeout` elapsed first.
/// - [`WaitError::Closed`] — the sender was dropped first.
pub async fn wait_until<T>(
    rx: &mut watch::Receiver<T>,
    timeout: Duration,
    mut predicate: impl FnMut(&T) -> bool,
) -> Result<(), WaitError> {
    match time::timeout(timeout, rx.wait_for(|value| predicate(value))).await {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(_)) => Err(WaitError::Closed),
        Err(_) => Err(WaitError::TimedOut),
    }
}
