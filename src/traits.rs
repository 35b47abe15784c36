use std::ffi::OsString;
use std::io;
use std::os::fd::BorrowedFd;

/// Process-wide configuration, keyed by variable name.
pub trait ConfigSource {
    fn get(&self, key: &str) -> Option<OsString>;
    fn unset(&self, key: &str);
}

/// Sends one datagram on a connected socket with `fd` attached as ancillary data.
pub trait DescriptorSender {
    fn send_with_descriptor(&self, socket: BorrowedFd<'_>, payload: &[u8], fd: BorrowedFd<'_>) -> io::Result<()>;
}

impl<T: ConfigSource + ?Sized> ConfigSource for &T {
    fn get(&self, key: &str) -> Option<OsString> {
        (**self).get(key)
    }

    fn unset(&self, key: &str) {
        (**self).unset(key)
    }
}

impl<T: DescriptorSender + ?Sized> DescriptorSender for &T {
    fn send_with_descriptor(&self, socket: BorrowedFd<'_>, payload: &[u8], fd: BorrowedFd<'_>) -> io::Result<()> {
        (**self).send_with_descriptor(socket, payload, fd)
    }
}
