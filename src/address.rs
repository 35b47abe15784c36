//! Parsing and connecting to the `NOTIFY_SOCKET` address.
//!
//! A leading `@` selects the Linux abstract namespace; anything else is a
//! filesystem path and is used as given.

use std::ffi::OsStr;
use std::fmt;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::net::UnixDatagram;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyAddress {
    Path(PathBuf),
    Abstract(Vec<u8>),
}

impl NotifyAddress {
    /// Returns `None` for an empty value: no service manager is listening.
    pub fn parse(raw: &OsStr) -> Option<Self> {
        let bytes = raw.as_bytes();
        match bytes.first() {
            None => None,
            Some(b'@') => Some(Self::Abstract(bytes[1..].to_vec())),
            Some(_) => Some(Self::Path(PathBuf::from(raw))),
        }
    }

    /// Connects an unbound datagram socket to this address.
    pub fn connect(&self, socket: &UnixDatagram) -> io::Result<()> {
        match self {
            Self::Path(path) => socket.connect(path),
            Self::Abstract(name) => connect_abstract(socket, name),
        }
    }
}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn connect_abstract(socket: &UnixDatagram, name: &[u8]) -> io::Result<()> {
    #[cfg(target_os = "android")]
    use std::os::android::net::SocketAddrExt;
    #[cfg(target_os = "linux")]
    use std::os::linux::net::SocketAddrExt;
    use std::os::unix::net::SocketAddr;

    let addr = SocketAddr::from_abstract_name(name)?;
    socket.connect_addr(&addr)
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
fn connect_abstract(_socket: &UnixDatagram, _name: &[u8]) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "abstract socket addresses are only available on Linux",
    ))
}

impl fmt::Display for NotifyAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Abstract(name) => write!(f, "@{}", String::from_utf8_lossy(name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn empty_means_absent() {
        assert_eq!(NotifyAddress::parse(OsStr::new("")), None);
    }

    #[test]
    fn at_sign_selects_abstract_namespace() {
        let addr = NotifyAddress::parse(OsStr::new("@/org/freedesktop/systemd1/notify")).unwrap();
        assert_eq!(addr, NotifyAddress::Abstract(b"/org/freedesktop/systemd1/notify".to_vec()));
        assert_eq!(addr.to_string(), "@/org/freedesktop/systemd1/notify");
    }

    #[test]
    fn plain_value_is_a_path() {
        let addr = NotifyAddress::parse(OsStr::new("/run/systemd/notify")).unwrap();
        assert_eq!(addr, NotifyAddress::Path(PathBuf::from("/run/systemd/notify")));
        assert_eq!(addr.to_string(), "/run/systemd/notify");
    }

    #[test]
    fn connect_to_missing_path_fails() {
        let temp = TempDir::new().unwrap();
        let addr = NotifyAddress::Path(temp.path().join("gone.sock"));
        let socket = UnixDatagram::unbound().unwrap();
        let err = addr.connect(&socket).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn connect_to_bound_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notify.sock");
        let _server = UnixDatagram::bind(&path).unwrap();

        let socket = UnixDatagram::unbound().unwrap();
        NotifyAddress::Path(path).connect(&socket).unwrap();
        socket.send(b"READY=1").unwrap();
    }
}
