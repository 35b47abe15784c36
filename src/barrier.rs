//! The barrier handshake.
//!
//! The service manager processes datagrams on its notify socket in order.
//! We send `BARRIER=1` with the write end of a fresh pipe attached, drop our
//! own copy of that write end, and wait for end-of-stream on the read end.
//! The manager closes its copy only after handling everything queued ahead of
//! the barrier, so end-of-stream means every earlier notification was seen.

use std::os::fd::{AsFd, OwnedFd};
use std::os::unix::net::UnixDatagram;

use nix::fcntl::OFlag;
use nix::unistd::pipe2;
use tokio::io::AsyncReadExt;
use tokio::net::unix::pipe;
use tracing::{debug, trace};

use crate::address::NotifyAddress;
use crate::config::EnvConfig;
use crate::fdpass::ScmRights;
use crate::{AbideError, BARRIER_MESSAGE, BarrierConfig, Cancel, ConfigSource, DescriptorSender, NOTIFY_SOCKET};

/// A barrier against the service manager, with pluggable configuration and
/// descriptor-passing capabilities.
#[derive(Debug, Clone)]
pub struct Barrier<C = EnvConfig, S = ScmRights> {
    source: C,
    sender: S,
    cfg: BarrierConfig,
}

impl Default for Barrier {
    fn default() -> Self {
        Self::new()
    }
}

impl Barrier {
    /// Reads the real environment and passes the pipe with `sendmsg(2)`.
    pub fn new() -> Self {
        Self::with_parts(EnvConfig, ScmRights)
    }
}

impl<C: ConfigSource, S: DescriptorSender> Barrier<C, S> {
    pub fn with_parts(source: C, sender: S) -> Self {
        Self { source, sender, cfg: BarrierConfig::default() }
    }

    pub fn with_config(mut self, cfg: BarrierConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn config(&self) -> BarrierConfig {
        self.cfg
    }

    /// Runs the barrier with the stored [`BarrierConfig`]. A configured
    /// timeout is layered onto `cancel` as a deadline.
    pub async fn wait(&self, cancel: &Cancel) -> Result<(), AbideError> {
        let cancel = match self.cfg.timeout() {
            Some(timeout) => cancel.with_timeout(timeout),
            None => cancel.clone(),
        };
        self.wait_with(&cancel, self.cfg.unset_environment).await
    }

    /// Blocks until the service manager has processed every notification
    /// sent before this call, or until `cancel` fires.
    ///
    /// With `unset_environment`, `NOTIFY_SOCKET` is removed right after it is
    /// read, whatever the outcome.
    pub async fn wait_with(&self, cancel: &Cancel, unset_environment: bool) -> Result<(), AbideError> {
        let raw = self.source.get(NOTIFY_SOCKET);
        if unset_environment {
            self.source.unset(NOTIFY_SOCKET);
        }

        let addr = raw
            .as_deref()
            .and_then(NotifyAddress::parse)
            .ok_or_else(AbideError::no_channel)?;
        debug!(%addr, unset_environment, "barrier: resolved notify socket");

        let (read_end, write_end) = pipe2(OFlag::O_CLOEXEC).map_err(|e| AbideError::resource(e.into()))?;

        let conn = UnixDatagram::unbound().map_err(AbideError::resource)?;
        addr.connect(&conn).map_err(AbideError::connect)?;

        self.sender
            .send_with_descriptor(conn.as_fd(), BARRIER_MESSAGE, write_end.as_fd())
            .map_err(AbideError::send)?;
        // The read end only reports end-of-stream once every copy of the
        // write end is closed, ours included.
        drop(write_end);
        debug!(%addr, "barrier: sent, waiting for close");

        let outcome = wait_for_close(read_end, cancel).await;
        drop(conn);
        outcome
    }
}

/// Runs a barrier against the real environment.
pub async fn barrier(cancel: &Cancel, unset_environment: bool) -> Result<(), AbideError> {
    Barrier::new().wait_with(cancel, unset_environment).await
}

/// Waits for end-of-stream on `read_end`, giving up when `cancel` fires.
///
/// Nothing ever writes to the pipe; a byte arriving instead of end-of-stream
/// is ignored and still counts as the close.
pub(crate) async fn wait_for_close(read_end: OwnedFd, cancel: &Cancel) -> Result<(), AbideError> {
    let mut reader = pipe::Receiver::from_owned_fd(read_end).map_err(AbideError::resource)?;
    let mut byte = [0u8; 1];

    tokio::select! {
        biased;
        reason = cancel.cancelled() => {
            debug!(%reason, "barrier: wait abandoned");
            Err(AbideError::canceled(reason))
        }
        read = reader.read(&mut byte) => match read {
            Ok(0) => {
                debug!("barrier: service manager closed the pipe");
                Ok(())
            }
            Ok(n) => {
                trace!(n, "barrier: ignoring unexpected pipe payload");
                Ok(())
            }
            Err(err) => Err(AbideError::wait(err)),
        },
    }
}
