//! Cancellation for the barrier wait.
//!
//! A [`Cancel`] is a cloneable token that fires either when any clone calls
//! [`Cancel::cancel`] or when its deadline passes. Children derived with
//! [`Cancel::with_timeout`] fire when any ancestor fires, but canceling a
//! child never reaches its parent or siblings. A child's deadline never
//! extends the parent's.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use futures::future::select_all;
use tokio::sync::watch;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    Canceled,
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canceled => f.write_str("canceled"),
            Self::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cancel {
    /// Ancestors' flags followed by this token's own flag, which is last.
    lineage: Vec<Arc<watch::Sender<bool>>>,
    deadline: Option<Instant>,
}

impl Default for Cancel {
    fn default() -> Self {
        Self::new()
    }
}

impl Cancel {
    /// A token with no deadline that fires only when canceled.
    pub fn new() -> Self {
        Self { lineage: vec![new_flag()], deadline: None }
    }

    /// Derives a child that also fires `timeout` from now.
    ///
    /// A timeout too large to represent leaves the deadline unchanged.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.child(self.deadline),
        }
    }

    /// Derives a child that also fires at `deadline`.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        };
        self.child(Some(deadline))
    }

    fn child(&self, deadline: Option<Instant>) -> Self {
        let mut lineage = self.lineage.clone();
        lineage.push(new_flag());
        Self { lineage, deadline }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Fires this token, its clones and every token derived from it. The
    /// parent it was derived from is unaffected.
    pub fn cancel(&self) {
        if let Some(own) = self.lineage.last() {
            own.send_replace(true);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    /// Why the token has fired, or `None` while it is still live.
    pub fn reason(&self) -> Option<CancelReason> {
        if self.lineage.iter().any(|flag| *flag.borrow()) {
            return Some(CancelReason::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves once the token fires. Explicit cancellation wins a tie with
    /// the deadline.
    pub async fn cancelled(&self) -> CancelReason {
        // `self` keeps every sender alive, so each wait only returns once its
        // flag is set.
        let flagged = select_all(self.lineage.iter().map(|flag| {
            let mut rx = flag.subscribe();
            Box::pin(async move {
                let _ = rx.wait_for(|set| *set).await;
            })
        }));

        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = flagged => CancelReason::Canceled,
                _ = tokio::time::sleep_until(deadline) => CancelReason::DeadlineExceeded,
            },
            None => {
                flagged.await;
                CancelReason::Canceled
            }
        }
    }
}

fn new_flag() -> Arc<watch::Sender<bool>> {
    let (flag, _) = watch::channel(false);
    Arc::new(flag)
}
