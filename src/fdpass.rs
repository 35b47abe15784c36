//! Descriptor passing over Unix datagram sockets (`SCM_RIGHTS`).

use std::io::{self, IoSlice, IoSliceMut};
use std::os::fd::{AsRawFd, BorrowedFd, FromRawFd, OwnedFd, RawFd};

use nix::sys::socket::{ControlMessage, ControlMessageOwned, MsgFlags, recvmsg, sendmsg};
use tracing::trace;

use crate::DescriptorSender;

/// Most descriptors [`recv_with_descriptor`] will accept from one datagram.
pub const MAX_RECV_FDS: usize = 8;

/// `sendmsg(2)` with a single `SCM_RIGHTS` control message.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScmRights;

impl DescriptorSender for ScmRights {
    fn send_with_descriptor(&self, socket: BorrowedFd<'_>, payload: &[u8], fd: BorrowedFd<'_>) -> io::Result<()> {
        let fds = [fd.as_raw_fd()];
        let cmsgs = [ControlMessage::ScmRights(&fds)];
        let iov = [IoSlice::new(payload)];

        let sent = sendmsg::<()>(socket.as_raw_fd(), &iov, &cmsgs, MsgFlags::empty(), None)?;
        trace!(sent, fd = fds[0], "ScmRights: datagram sent");
        if sent != payload.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short datagram: sent {sent} of {} bytes", payload.len()),
            ));
        }
        Ok(())
    }
}

/// Receives one datagram into `buf` along with any descriptors attached to it.
///
/// This is the service manager's half of the handshake. Every received
/// descriptor is returned owned, so dropping them closes them.
pub fn recv_with_descriptor(socket: BorrowedFd<'_>, buf: &mut [u8]) -> io::Result<(usize, Vec<OwnedFd>)> {
    let mut cmsg_buf = nix::cmsg_space!([RawFd; MAX_RECV_FDS]);
    let mut iov = [IoSliceMut::new(buf)];

    let msg = recvmsg::<()>(socket.as_raw_fd(), &mut iov, Some(&mut cmsg_buf), MsgFlags::empty())?;

    let mut fds = Vec::new();
    for cmsg in msg.cmsgs()? {
        if let ControlMessageOwned::ScmRights(raw) = cmsg {
            // SAFETY: the kernel just installed these descriptors in our table
            // and nothing else refers to them yet.
            fds.extend(raw.into_iter().map(|fd| unsafe { OwnedFd::from_raw_fd(fd) }));
        }
    }

    if msg.flags.contains(MsgFlags::MSG_CTRUNC) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "ancillary data truncated",
        ));
    }
    if msg.flags.contains(MsgFlags::MSG_TRUNC) {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("datagram larger than {} byte buffer", msg.bytes),
        ));
    }

    Ok((msg.bytes, fds))
}
