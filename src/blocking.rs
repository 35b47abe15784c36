//! Synchronous entry point for services that do not run a tokio runtime.

use std::time::Duration;

use tokio::runtime::Handle;

use crate::{AbideCode, AbideError, Barrier, Cancel};

/// Runs a barrier against the real environment on a private current-thread
/// runtime, waiting at most `timeout` (forever when `None`).
///
/// Inside a tokio runtime this fails with [`AbideCode::Resource`]; use
/// [`crate::barrier`] there.
pub fn barrier(timeout: Option<Duration>, unset_environment: bool) -> Result<(), AbideError> {
    if Handle::try_current().is_ok() {
        return Err(AbideError::new(AbideCode::Resource).ctx("blocking barrier called from within a tokio runtime"));
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(AbideError::resource)?;

    let cancel = match timeout {
        Some(timeout) => Cancel::new().with_timeout(timeout),
        None => Cancel::new(),
    };
    runtime.block_on(Barrier::new().wait_with(&cancel, unset_environment))
}
