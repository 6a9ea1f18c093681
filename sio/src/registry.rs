//! Process-wide table of live socket handles and the readiness wait
//! primitive.
//!
//! Every blocking operation in the crate funnels through
//! [`Registry::wait`], so stream reads, accepts, and connects share one
//! readiness mechanism instead of each socket flavor reinventing polling.
//! The table's owner back-references exist for event dispatch to the right
//! wrapper object and carry no ownership.

use std::{
  collections::HashMap,
  io,
  os::fd::RawFd,
  sync::{
    Mutex, MutexGuard,
    atomic::{AtomicPtr, AtomicU64, Ordering},
  },
  time::{Duration, Instant},
};

use crate::{
  endpoint::Family,
  error::{Error, Result},
};

/// Readiness kind a wait is interested in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Interest {
  Read,
  Write,
  Either,
}

impl Interest {
  fn poll_events(self) -> libc::c_short {
    match self {
      Interest::Read => libc::POLLIN,
      Interest::Write => libc::POLLOUT,
      Interest::Either => libc::POLLIN | libc::POLLOUT,
    }
  }
}

/// Outcome of a wait that did not fail. A timeout is a normal outcome, not
/// an error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WaitStatus {
  Ready,
  TimedOut,
}

/// Non-owning back-reference to the wrapper currently owning a handle.
///
/// A minted token rather than a pointer, so it can never dangle no matter
/// how the owning wrapper moves.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct OwnerId(u64);

impl OwnerId {
  pub(crate) fn next() -> Self {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    OwnerId(NEXT.fetch_add(1, Ordering::Relaxed))
  }
}

struct Entry {
  owner: OwnerId,
  family: Family,
}

/// Upper bound on a single `poll(2)` slice. Re-checking the table between
/// slices is what lets a concurrent deregistration fail an in-flight wait
/// instead of leaving it parked on a removed entry.
const POLL_SLICE: Duration = Duration::from_millis(100);

/// The process-wide readiness registry.
pub struct Registry {
  table: Mutex<HashMap<RawFd, Entry>>,
}

static REGISTRY: AtomicPtr<Registry> = AtomicPtr::new(std::ptr::null_mut());

impl Registry {
  fn new() -> Self {
    Self { table: Mutex::new(HashMap::new()) }
  }

  /// Table access without poison propagation. A panic while holding the
  /// lock leaves a structurally sound map, so waiters keep working.
  fn table(&self) -> MutexGuard<'_, HashMap<RawFd, Entry>> {
    self.table.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// The shared instance, installed race-free on first access and alive for
  /// the rest of the process.
  pub fn global() -> &'static Registry {
    let ptr = REGISTRY.load(Ordering::Acquire);
    if !ptr.is_null() {
      // SAFETY: an installed pointer is never torn down.
      return unsafe { &*ptr };
    }

    let candidate = Box::into_raw(Box::new(Registry::new()));
    match REGISTRY.compare_exchange(
      std::ptr::null_mut(),
      candidate,
      Ordering::AcqRel,
      Ordering::Acquire,
    ) {
      // SAFETY: we just installed this pointer.
      Ok(_) => unsafe { &*candidate },
      Err(installed) => {
        // Another thread won the install, discard our allocation.
        // SAFETY: candidate was never published.
        let _ = unsafe { Box::from_raw(candidate) };
        // SAFETY: the winning pointer is never torn down.
        unsafe { &*installed }
      }
    }
  }

  /// Inserts or overwrites the entry for `fd`. Re-registering a live handle
  /// is expected and keeps the table at one entry per handle.
  pub fn register(&self, fd: RawFd, owner: OwnerId, family: Family) {
    self.table().insert(fd, Entry { owner, family });
  }

  /// Repoints the entry for `fd` at `new_owner` without touching wait state.
  ///
  /// Unknown handles (including the released `-1` sentinel) are ignored: a
  /// wrapper that gave its handle away must not resurrect an entry.
  pub fn update_owner(&self, fd: RawFd, new_owner: OwnerId) {
    if let Some(entry) = self.table().get_mut(&fd) {
      entry.owner = new_owner;
    }
  }

  /// Removes the entry for `fd`. Idempotent: destruction after an explicit
  /// close deregisters a second time and must stay a no-op.
  pub fn deregister(&self, fd: RawFd) {
    self.table().remove(&fd);
  }

  pub fn owner_of(&self, fd: RawFd) -> Option<OwnerId> {
    self.table().get(&fd).map(|entry| entry.owner)
  }

  pub fn family_of(&self, fd: RawFd) -> Option<Family> {
    self.table().get(&fd).map(|entry| entry.family)
  }

  /// Blocks the calling thread until `fd` is ready for `interest`, the
  /// deadline elapses, or the handle stops being serviceable.
  ///
  /// A deadline already in the past still polls once with a zero timeout so
  /// readiness that is pending right now is honored. A handle that is
  /// deregistered or closed while the wait is in flight fails with
  /// [`Error::Closed`] instead of hanging.
  pub fn wait(
    &self,
    fd: RawFd,
    interest: Interest,
    deadline: Option<Instant>,
  ) -> Result<WaitStatus> {
    loop {
      if self.owner_of(fd).is_none() {
        return Err(Error::Closed);
      }

      let slice = match deadline {
        None => POLL_SLICE,
        Some(at) => at.saturating_duration_since(Instant::now()).min(POLL_SLICE),
      };
      let millis =
        slice.as_nanos().div_ceil(1_000_000).min(i32::MAX as u128) as libc::c_int;

      let mut pfd =
        libc::pollfd { fd, events: interest.poll_events(), revents: 0 };
      // SAFETY: pfd is a valid pollfd for the duration of the call.
      let rc = unsafe { libc::poll(&mut pfd, 1, millis) };

      if rc < 0 {
        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::EINTR) {
          // Retry against the remaining budget.
          continue;
        }
        return Err(Error::Io(err));
      }

      if rc == 0 {
        match deadline {
          Some(at) if Instant::now() >= at => return Ok(WaitStatus::TimedOut),
          // Slice expired, keep waiting.
          _ => continue,
        }
      }

      if pfd.revents & libc::POLLNVAL != 0 {
        // The descriptor was closed while we were waiting on it.
        return Err(Error::Closed);
      }

      // POLLERR/POLLHUP count as ready: the caller's syscall attempt will
      // surface the actual condition.
      return Ok(WaitStatus::Ready);
    }
  }
}
