//! core::context
//!
//! Cancellable, deadline-bearing operation context.
//!
//! Every blocking step of an acquisition (clone, remote ref listing, fetch,
//! checkout) polls an [`OpContext`]. Clones of a context share the same
//! cancellation flag, so any holder can cancel the operation from another
//! thread.
//!
//! # Example
//!
//! ```
//! use gitsnap::core::context::{Interrupted, OpContext};
//! use std::time::Duration;
//!
//! let ctx = OpContext::with_timeout(Duration::from_secs(30));
//! assert!(ctx.check().is_ok());
//!
//! let handle = ctx.clone();
//! handle.cancel();
//! assert_eq!(ctx.check(), Err(Interrupted::Cancelled));
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Why an operation stopped early.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum Interrupted {
    #[error("operation cancelled")]
    Cancelled,

    #[error("operation deadline exceeded")]
    DeadlineExceeded,
}

/// Shared cancellation flag plus an optional deadline.
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl OpContext {
    /// A context that is never cancelled unless [`cancel`](Self::cancel) is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context whose deadline is `timeout` from now.
    ///
    /// A timeout too large to represent as an instant means no deadline.
    pub fn with_timeout(timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => Self::new().deadline_at(deadline),
            None => Self::new(),
        }
    }

    /// Derive a context sharing this one's cancellation flag, with a deadline.
    ///
    /// An earlier existing deadline wins.
    pub fn deadline_at(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    /// Request cancellation. Visible to all clones.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// The deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Return an error if the operation should stop.
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(Interrupted::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(Interrupted::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Whether the operation should stop.
    pub fn is_done(&self) -> bool {
        self.check().is_err()
    }
}
