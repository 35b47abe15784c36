#![allow(dead_code)]

use std::os::fd::{AsFd, OwnedFd};
use std::os::unix::net::UnixDatagram;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

use abide::recv_with_descriptor;
use tempfile::TempDir;

/// A stand-in service manager bound to a socket in a temp directory.
pub struct Supervisor {
    _dir: TempDir,
    pub path: PathBuf,
    pub socket: UnixDatagram,
}

impl Supervisor {
    pub fn bind() -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notify.sock");
        let socket = UnixDatagram::bind(&path).unwrap();
        Self { _dir: dir, path, socket }
    }
}

/// One datagram as seen by the supervisor.
#[derive(Debug)]
pub struct Received {
    pub payload: Vec<u8>,
    pub fds: Vec<OwnedFd>,
}

pub fn recv(socket: &UnixDatagram) -> Received {
    let mut buf = [0u8; 256];
    let (n, fds) = recv_with_descriptor(socket.as_fd(), &mut buf).unwrap();
    Received { payload: buf[..n].to_vec(), fds }
}

/// Receives datagrams until the barrier arrives, holds its descriptor for
/// `hold`, then closes it. Returns every payload in arrival order.
pub fn close_after(socket: UnixDatagram, hold: Duration) -> JoinHandle<Vec<Vec<u8>>> {
    std::thread::spawn(move || {
        let mut seen = Vec::new();
        loop {
            let msg = recv(&socket);
            let is_barrier = msg.payload == b"BARRIER=1";
            seen.push(msg.payload);
            if is_barrier {
                assert_eq!(msg.fds.len(), 1, "barrier must carry exactly one descriptor");
                std::thread::sleep(hold);
                drop(msg.fds);
                return seen;
            }
        }
    })
}

/// Receives the barrier and hands its descriptor back so the test can keep
/// it open for as long as it likes.
pub fn never_close(socket: UnixDatagram) -> mpsc::Receiver<Received> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let _ = tx.send(recv(&socket));
    });
    rx
}
