use std::{fmt, io};

use liaise::{Liaise, RegisterErrors};

use crate::CancelReason;

#[derive(RegisterErrors, Debug, Copy, Clone, PartialEq, Eq)]
#[error_prefix = "ABIDE"]
pub enum AbideCode {
    NoChannel = 1,
    Resource = 2,
    Connect = 3,
    Send = 4,
    Canceled = 5,
    DeadlineExceeded = 6,
    Wait = 7,
}

impl Liaise for AbideCode {
    fn code_id(self) -> u16 { self as u16 }

    fn message(self) -> &'static str {
        match self {
            Self::NoChannel => "Notification socket not available",
            Self::Resource => "Resource creation failed",
            Self::Connect => "Connect failed",
            Self::Send => "Barrier send failed",
            Self::Canceled => "Barrier canceled",
            Self::DeadlineExceeded => "Barrier deadline exceeded",
            Self::Wait => "Barrier wait failed",
        }
    }
}

/// Error returned by a barrier call.
///
/// OS failures keep the original `io::Error` as their source; the code says
/// which protocol step produced it.
#[derive(Debug)]
pub struct AbideError {
    pub code: AbideCode,
    pub ctx: Option<String>,
    pub source: Option<AbideSource>,
}

#[derive(Debug)]
pub enum AbideSource {
    Io(io::Error),
}

impl AbideError {
    #[inline]
    pub fn new(code: AbideCode) -> Self {
        Self { code, ctx: None, source: None }
    }

    #[inline]
    pub fn ctx(mut self, ctx: impl fmt::Display) -> Self {
        self.ctx = Some(ctx.to_string());
        self
    }

    #[inline]
    fn os(code: AbideCode, err: io::Error) -> Self {
        Self {
            code,
            ctx: Some(err.to_string()),
            source: Some(AbideSource::Io(err)),
        }
    }

    /// `NOTIFY_SOCKET` is unset or empty. Not transient.
    #[inline]
    pub fn no_channel() -> Self {
        Self::new(AbideCode::NoChannel)
    }

    #[inline]
    pub fn resource(err: io::Error) -> Self {
        Self::os(AbideCode::Resource, err)
    }

    #[inline]
    pub fn connect(err: io::Error) -> Self {
        Self::os(AbideCode::Connect, err)
    }

    #[inline]
    pub fn send(err: io::Error) -> Self {
        Self::os(AbideCode::Send, err)
    }

    #[inline]
    pub fn wait(err: io::Error) -> Self {
        Self::os(AbideCode::Wait, err)
    }

    #[inline]
    pub fn canceled(reason: CancelReason) -> Self {
        match reason {
            CancelReason::Canceled => Self::new(AbideCode::Canceled),
            CancelReason::DeadlineExceeded => Self::new(AbideCode::DeadlineExceeded),
        }
    }

    /// True when the caller's cancellation (or its deadline) ended the wait.
    pub fn is_canceled(&self) -> bool {
        matches!(self.code, AbideCode::Canceled | AbideCode::DeadlineExceeded)
    }

    pub fn cancel_reason(&self) -> Option<CancelReason> {
        match self.code {
            AbideCode::Canceled => Some(CancelReason::Canceled),
            AbideCode::DeadlineExceeded => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn io_error(&self) -> Option<&io::Error> {
        match &self.source {
            Some(AbideSource::Io(e)) => Some(e),
            None => None,
        }
    }

    pub fn raw_os_error(&self) -> Option<i32> {
        self.io_error().and_then(io::Error::raw_os_error)
    }
}

impl fmt::Display for AbideError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // "[ABIDE0003] Connect failed: ..."
        let base = self.code.render();
        match &self.ctx {
            Some(ctx) => write!(f, "{base}: {ctx}"),
            None => write!(f, "{base}"),
        }
    }
}

impl std::error::Error for AbideError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.source {
            Some(AbideSource::Io(e)) => Some(e),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn os_errors_keep_source_and_text() {
        let err = AbideError::connect(io::Error::from_raw_os_error(nix::libc::ENOENT));
        assert_eq!(err.code, AbideCode::Connect);
        assert_eq!(err.raw_os_error(), Some(nix::libc::ENOENT));
        assert!(err.source().is_some());

        let rendered = err.to_string();
        assert!(rendered.contains("Connect failed"), "{rendered}");
        assert!(rendered.contains("os error"), "{rendered}");
    }

    #[test]
    fn no_channel_has_no_source() {
        let err = AbideError::no_channel();
        assert!(err.source().is_none());
        assert!(!err.is_canceled());
        assert!(err.to_string().contains("Notification socket not available"));
    }

    #[test]
    fn cancellation_codes() {
        let canceled = AbideError::canceled(CancelReason::Canceled);
        let expired = AbideError::canceled(CancelReason::DeadlineExceeded);

        assert!(canceled.is_canceled());
        assert!(expired.is_canceled());
        assert_eq!(canceled.cancel_reason(), Some(CancelReason::Canceled));
        assert_eq!(expired.code, AbideCode::DeadlineExceeded);
        assert!(AbideError::wait(io::Error::other("boom")).cancel_reason().is_none());
    }
}
