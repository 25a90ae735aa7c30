//! Preview scheduling: render requests, trailing-edge coalescing and the
//! per-session render state.
//!
//! The [`Coalescer`] is pure: it is driven with explicit [`Instant`]s so its
//! timing can be tested without sleeping.
//!
//! ```text
//!   offers:   a   b c d           e
//!   time:     |---+-+-+---|-------+------|
//!   dispatch: a           d       e
//!             ^ leading   ^ last + interval (trailing)
//! ```
//!
//! The first offer after a quiet period dispatches at once; offers inside
//! the interval replace each other and only the newest one is dispatched
//! once the interval has elapsed.

use hdredit_ops::AdjustmentChain;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::{Duration, Instant};

/// Value snapshot of a session, taken on every edit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    /// Chain at the time of the edit.
    pub chain: AdjustmentChain,
    /// Bypass flag at the time of the edit.
    pub show_original: bool,
    /// Per-session sequence number, strictly increasing.
    pub seq: u64,
    /// When the snapshot was taken.
    pub requested_at: Instant,
}

/// Trailing-edge rate limiter for one session.
#[derive(Debug, Clone)]
pub struct Coalescer {
    min_interval: Duration,
    last_dispatch: Option<Instant>,
    pending: Option<RenderRequest>,
    discarded: u64,
}

impl Coalescer {
    /// Coalescer with the given minimum spacing.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_dispatch: None,
            pending: None,
            discarded: 0,
        }
    }

    /// Queues `request`, replacing any older pending one.
    ///
    /// Returns `true` if an older snapshot was discarded.
    pub fn offer(&mut self, request: RenderRequest) -> bool {
        let replaced = match &self.pending {
            Some(old) if old.seq > request.seq => return true,
            Some(_) => true,
            None => false,
        };
        if replaced {
            self.discarded += 1;
        }
        self.pending = Some(request);
        replaced
    }

    /// Takes the pending request if it may be dispatched at `now`.
    pub fn take_due(&mut self, now: Instant) -> Option<RenderRequest> {
        let deadline = self.next_deadline()?;
        if now < deadline {
            return None;
        }
        self.last_dispatch = Some(now);
        self.pending.take()
    }

    /// When the pending request becomes due; `None` if nothing is pending.
    pub fn next_deadline(&self) -> Option<Instant> {
        let pending = self.pending.as_ref()?;
        Some(match self.last_dispatch {
            Some(last) => (last + self.min_interval).max(pending.requested_at),
            None => pending.requested_at,
        })
    }

    /// `true` if a request is waiting.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Number of snapshots replaced before dispatch.
    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}

/// Where a session's preview is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum RenderState {
    /// Nothing queued or running.
    #[default]
    Idle = 0,
    /// A request is waiting on the lane.
    Scheduled = 1,
    /// The lane is rendering this session.
    Rendering = 2,
}

/// Render state shared between a session and the render lane.
#[derive(Debug, Default)]
pub struct StateCell(AtomicU8);

impl StateCell {
    /// Current state.
    pub fn load(&self) -> RenderState {
        match self.0.load(Ordering::Acquire) {
            1 => RenderState::Scheduled,
            2 => RenderState::Rendering,
            _ => RenderState::Idle,
        }
    }

    /// Publishes a new state.
    pub fn store(&self, state: RenderState) {
        self.0.store(state as u8, Ordering::Release);
    }
}
