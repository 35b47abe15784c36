//! # ABIDE
//! Notification barrier against the service manager.
//!
//! A supervised service reports state by sending datagrams to `NOTIFY_SOCKET`.
//! Those sends are fire-and-forget, so a service that signals `READY=1` and
//! then exits (or is inspected) may race the manager's processing. A barrier
//! closes that gap: it returns only once the manager has drained every
//! datagram this process queued before it.
//!
//! ## How
//! * A pipe is created and its write end travels to the manager with a
//!   `BARRIER=1` datagram (`SCM_RIGHTS`).
//! * Our copy of the write end is closed at once.
//! * The manager closes its copy after processing everything ahead of the
//!   barrier, and the read end reports end-of-stream.
//!
//! ```ignore
//! let cancel = abide::Cancel::new().with_timeout(std::time::Duration::from_secs(5));
//! abide::barrier(&cancel, false).await?;
//! ```

pub mod address;
pub mod barrier;
#[cfg(feature = "blocking")]
pub mod blocking;
pub mod cancel;
pub mod config;
pub mod error;
pub mod fdpass;
pub mod traits;
pub mod types;

pub use address::NotifyAddress;
pub use barrier::{Barrier, barrier};
pub use cancel::{Cancel, CancelReason};
pub use config::{EnvConfig, MemoryConfig};
pub use error::*;
pub use fdpass::{ScmRights, recv_with_descriptor};
pub use traits::*;
pub use types::*;
