//! Handle lifecycle: a move-only wrapper owning exactly one OS socket
//! handle.
//!
//! A [`Socket`] allocates (or adopts) a descriptor, registers it with the
//! [`Registry`], mediates every syscall against it, and releases it exactly
//! once. Blocking operations are built on [`Socket::ready_op`], which turns
//! a caller-supplied syscall attempt plus a readiness kind into a
//! deadline-aware loop.

use std::{
  fmt, io,
  os::fd::{AsRawFd, IntoRawFd, RawFd},
  time::{Duration, Instant},
};

use crate::{
  endpoint::{Endpoint, Family, SocketKind},
  error::{Error, Result},
  options::{self, OptValue, SockOption},
  registry::{Interest, OwnerId, Registry, WaitStatus},
};

/// Sentinel for a wrapper whose handle has been released or given away.
const NO_HANDLE: RawFd = -1;

#[cfg(linux)]
const SEND_FLAGS: libc::c_int = libc::MSG_NOSIGNAL;
#[cfg(not(linux))]
const SEND_FLAGS: libc::c_int = 0;

/// Move-only owner of one OS socket handle.
///
/// There is no `Clone`: a handle value is reachable from exactly one live
/// wrapper at any instant, so dropping a wrapper can never release a handle
/// still owned elsewhere.
pub struct Socket {
  fd: RawFd,
  family: Family,
  owner: OwnerId,
}

/// Post-conditions of every successful construction: address reuse options,
/// SIGPIPE suppression, and nonblocking mode. Nonblocking is what makes a
/// raced wakeup observable as `WouldBlock` inside the readiness retry loop
/// instead of a stall.
fn configure(fd: RawFd) -> Result<()> {
  let enable: libc::c_int = 1;
  options::set(fd, libc::SOL_SOCKET, libc::SO_REUSEADDR, &enable)?;
  #[cfg(any(linux, bsdish))]
  options::set(fd, libc::SOL_SOCKET, libc::SO_REUSEPORT, &enable)?;
  // Linux suppresses SIGPIPE per send via MSG_NOSIGNAL; the bsd family has
  // no such flag and needs it set on the socket instead.
  #[cfg(bsdish)]
  options::set(fd, libc::SOL_SOCKET, libc::SO_NOSIGPIPE, &enable)?;

  // SAFETY: fcntl on an owned descriptor.
  let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
  if flags < 0 {
    return Err(Error::Create(io::Error::last_os_error()));
  }
  // SAFETY: same as above.
  if unsafe { libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) } < 0 {
    return Err(Error::Create(io::Error::last_os_error()));
  }
  Ok(())
}

fn cvt(rc: libc::ssize_t) -> io::Result<usize> {
  if rc < 0 { Err(io::Error::last_os_error()) } else { Ok(rc as usize) }
}

fn would_block(err: &io::Error) -> bool {
  err.kind() == io::ErrorKind::WouldBlock
    || err.raw_os_error() == Some(libc::EINPROGRESS)
}

impl Socket {
  /// Allocates a fresh OS handle of the requested family and shape.
  pub fn new(family: Family, kind: SocketKind) -> Result<Socket> {
    // SAFETY: plain socket(2) call.
    let fd = unsafe { libc::socket(family.as_raw(), kind.as_raw(), 0) };
    if fd < 0 {
      return Err(Error::Create(io::Error::last_os_error()));
    }
    Self::adopt(fd, family)
  }

  /// Wraps an already-open descriptor, e.g. one produced by an accept.
  ///
  /// The same reuse/nonblocking post-conditions and registration as a fresh
  /// construction apply. On any failure the descriptor is closed before the
  /// error surfaces, so the failure path leaks nothing.
  pub fn adopt(fd: RawFd, family: Family) -> Result<Socket> {
    if fd < 0 {
      return Err(Error::Create(io::Error::from_raw_os_error(libc::EBADF)));
    }
    if let Err(err) = configure(fd) {
      // SAFETY: fd is open and owned by this construction attempt.
      unsafe { libc::close(fd) };
      return Err(err);
    }

    let owner = OwnerId::next();
    Registry::global().register(fd, owner, family);
    Ok(Socket { fd, family, owner })
  }

  /// Releases the handle: deregister from the registry, then close the
  /// descriptor. Runs at most once; repeated calls and calls on a wrapper
  /// that gave its handle away are no-ops.
  pub fn close(&mut self) {
    if self.fd == NO_HANDLE {
      return;
    }
    Registry::global().deregister(self.fd);
    // SAFETY: fd is open and exclusively owned until this point.
    unsafe { libc::close(self.fd) };
    self.fd = NO_HANDLE;
  }

  fn ensure_open(&self) -> Result<RawFd> {
    if self.fd == NO_HANDLE { Err(Error::Closed) } else { Ok(self.fd) }
  }

  pub fn family(&self) -> Family {
    self.family
  }

  pub fn owner(&self) -> OwnerId {
    self.owner
  }

  /// Mints a fresh owner identity and repoints the registry entry at it.
  ///
  /// Called when another wrapper object takes over the handle, e.g. a
  /// protocol-layer type swallowing a `Socket`. On a wrapper without a
  /// handle the registry update is a no-op.
  pub fn reown(&mut self) -> OwnerId {
    self.owner = OwnerId::next();
    Registry::global().update_owner(self.fd, self.owner);
    self.owner
  }

  pub fn set_option<T: OptValue>(&self, opt: SockOption<T>) -> Result<()> {
    let fd = self.ensure_open()?;
    options::set(fd, opt.level(), opt.name(), &opt.value())
  }

  pub fn get_option<T: OptValue>(
    &self,
    level: libc::c_int,
    name: libc::c_int,
  ) -> Result<SockOption<T>> {
    let fd = self.ensure_open()?;
    let value = options::get::<T>(fd, level, name)?;
    Ok(SockOption::new(level, name, value))
  }

  pub fn get_option_value<T: OptValue>(
    &self,
    level: libc::c_int,
    name: libc::c_int,
  ) -> Result<T> {
    Ok(self.get_option::<T>(level, name)?.value())
  }

  /// Deadline-aware blocking primitive.
  ///
  /// The relative timeout converts to an absolute deadline once, up front,
  /// so retries after spurious wakeups consume a shrinking budget. The loop:
  /// wait for `interest` readiness; on timeout return `Ok(None)` with no
  /// side effects; on readiness run `attempt` once; if it would still block
  /// (another thread raced in first) re-wait against the remaining budget;
  /// any other failure surfaces as [`Error::Io`]. Without a timeout the loop
  /// runs until the syscall itself resolves.
  pub fn ready_op<T>(
    &self,
    interest: Interest,
    timeout: Option<Duration>,
    mut attempt: impl FnMut(RawFd) -> io::Result<T>,
  ) -> Result<Option<T>> {
    let fd = self.ensure_open()?;
    let deadline = timeout.map(|t| Instant::now() + t);
    loop {
      match Registry::global().wait(fd, interest, deadline)? {
        WaitStatus::TimedOut => return Ok(None),
        WaitStatus::Ready => match attempt(fd) {
          Ok(value) => return Ok(Some(value)),
          Err(err) if would_block(&err) => continue,
          Err(err) => return Err(Error::Io(err)),
        },
      }
    }
  }

  fn check_family(&self, endpoint: &Endpoint) -> Result<()> {
    if endpoint.family() != self.family {
      return Err(Error::Validation(format!(
        "{:?} socket cannot use a {:?} endpoint",
        self.family,
        endpoint.family()
      )));
    }
    Ok(())
  }

  pub fn bind(&self, endpoint: &Endpoint) -> Result<()> {
    let fd = self.ensure_open()?;
    self.check_family(endpoint)?;
    let (addr, len) = endpoint.raw_parts();
    // SAFETY: addr/len describe a valid native address structure.
    if unsafe { libc::bind(fd, addr, len) } != 0 {
      return Err(Error::Io(io::Error::last_os_error()));
    }
    Ok(())
  }

  pub fn listen(&self, backlog: i32) -> Result<()> {
    let fd = self.ensure_open()?;
    // SAFETY: plain listen(2) call.
    if unsafe { libc::listen(fd, backlog) } != 0 {
      return Err(Error::Io(io::Error::last_os_error()));
    }
    Ok(())
  }

  /// Accepts one pending connection, waiting up to `timeout` for the
  /// listening handle to become readable. `Ok(None)` reports an elapsed
  /// deadline. The accepted handle is adopted into a new `Socket` with the
  /// usual construction post-conditions.
  pub fn accept(
    &self,
    timeout: Option<Duration>,
  ) -> Result<Option<(Socket, Endpoint)>> {
    let family = self.family;
    let accepted = self.ready_op(Interest::Read, timeout, |fd| {
      let mut peer = Endpoint::unspecified(family);
      let (addr, mut len) = peer.raw_parts_mut();
      // SAFETY: addr points at a native structure of at least `len` bytes.
      let rc = unsafe { libc::accept(fd, addr, &mut len) };
      if rc < 0 { Err(io::Error::last_os_error()) } else { Ok((rc, peer)) }
    })?;

    match accepted {
      None => Ok(None),
      Some((fd, peer)) => Ok(Some((Socket::adopt(fd, family)?, peer))),
    }
  }

  /// Connects to `endpoint`, waiting up to `timeout` for the connection to
  /// complete. `Ok(None)` reports an elapsed deadline.
  ///
  /// An immediate success completes synchronously. An in-progress connect
  /// waits for writability and then reads `SO_ERROR` for the real outcome.
  pub fn connect(
    &self,
    endpoint: &Endpoint,
    timeout: Option<Duration>,
  ) -> Result<Option<()>> {
    let fd = self.ensure_open()?;
    self.check_family(endpoint)?;

    let (addr, len) = endpoint.raw_parts();
    // SAFETY: addr/len describe a valid native address structure.
    if unsafe { libc::connect(fd, addr, len) } == 0 {
      return Ok(Some(()));
    }

    let err = io::Error::last_os_error();
    if !would_block(&err) {
      return Err(Error::Io(err));
    }

    let deadline = timeout.map(|t| Instant::now() + t);
    match Registry::global().wait(fd, Interest::Write, deadline)? {
      WaitStatus::TimedOut => Ok(None),
      WaitStatus::Ready => {
        let pending =
          options::get::<libc::c_int>(fd, libc::SOL_SOCKET, libc::SO_ERROR)?;
        if pending == 0 {
          Ok(Some(()))
        } else {
          Err(Error::Io(io::Error::from_raw_os_error(pending)))
        }
      }
    }
  }

  /// Receives into `buf`, waiting up to `timeout` for data. `Ok(None)`
  /// reports an elapsed deadline; no bytes have been consumed in that case.
  pub fn recv(
    &self,
    buf: &mut [u8],
    timeout: Option<Duration>,
  ) -> Result<Option<usize>> {
    self.ready_op(Interest::Read, timeout, |fd| {
      // SAFETY: buf is valid for writes of buf.len() bytes.
      cvt(unsafe {
        libc::recv(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len(), 0)
      })
    })
  }

  /// Sends from `buf`, waiting up to `timeout` for writability. May write
  /// fewer bytes than `buf.len()`.
  pub fn send(
    &self,
    buf: &[u8],
    timeout: Option<Duration>,
  ) -> Result<Option<usize>> {
    self.ready_op(Interest::Write, timeout, |fd| {
      // SAFETY: buf is valid for reads of buf.len() bytes.
      cvt(unsafe {
        libc::send(
          fd,
          buf.as_ptr() as *const libc::c_void,
          buf.len(),
          SEND_FLAGS,
        )
      })
    })
  }

  /// Receives one datagram and the endpoint it came from.
  pub fn recv_from(
    &self,
    buf: &mut [u8],
    timeout: Option<Duration>,
  ) -> Result<Option<(usize, Endpoint)>> {
    let family = self.family;
    self.ready_op(Interest::Read, timeout, |fd| {
      let mut peer = Endpoint::unspecified(family);
      let (addr, mut len) = peer.raw_parts_mut();
      // SAFETY: buf and addr/len are valid for the kernel to write through.
      let rc = unsafe {
        libc::recvfrom(
          fd,
          buf.as_mut_ptr() as *mut libc::c_void,
          buf.len(),
          0,
          addr,
          &mut len,
        )
      };
      if rc < 0 {
        Err(io::Error::last_os_error())
      } else {
        Ok((rc as usize, peer))
      }
    })
  }

  /// Sends one datagram to `endpoint`.
  pub fn send_to(
    &self,
    endpoint: &Endpoint,
    buf: &[u8],
    timeout: Option<Duration>,
  ) -> Result<Option<usize>> {
    self.check_family(endpoint)?;
    let (addr, len) = endpoint.raw_parts();
    self.ready_op(Interest::Write, timeout, |fd| {
      // SAFETY: buf and addr/len are valid for reads.
      cvt(unsafe {
        libc::sendto(
          fd,
          buf.as_ptr() as *const libc::c_void,
          buf.len(),
          SEND_FLAGS,
          addr,
          len,
        )
      })
    })
  }

  /// The address the handle is locally bound to.
  pub fn local_endpoint(&self) -> Result<Endpoint> {
    let fd = self.ensure_open()?;
    let mut local = Endpoint::unspecified(self.family);
    let (addr, mut len) = local.raw_parts_mut();
    // SAFETY: addr points at a native structure of at least `len` bytes.
    if unsafe { libc::getsockname(fd, addr, &mut len) } != 0 {
      return Err(Error::Io(io::Error::last_os_error()));
    }
    Ok(local)
  }
}

impl AsRawFd for Socket {
  /// Read-only interop accessor. The value must never be used to construct
  /// a second owning wrapper.
  fn as_raw_fd(&self) -> RawFd {
    self.fd
  }
}

impl IntoRawFd for Socket {
  /// Ownership leaves the core: the registry entry is removed and the
  /// caller becomes responsible for closing the descriptor.
  fn into_raw_fd(self) -> RawFd {
    let fd = self.fd;
    if fd != NO_HANDLE {
      Registry::global().deregister(fd);
    }
    let mut this = self;
    // Drop on the emptied wrapper is a no-op.
    this.fd = NO_HANDLE;
    fd
  }
}

impl Drop for Socket {
  fn drop(&mut self) {
    // Safe on a wrapper that gave its handle away: both steps no-op.
    self.close();
  }
}

impl fmt::Debug for Socket {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Socket")
      .field("fd", &self.fd)
      .field("family", &self.family)
      .field("owner", &self.owner)
      .finish()
  }
}
