//! Hostname resolution through the system resolver.

use std::{ffi::CString, io, mem, ptr};

use crate::{
  endpoint::{Family, SocketKind},
  error::{Error, Result},
};

pub(crate) fn resolve_host_v4(
  host: &str,
  port: u16,
  kind: SocketKind,
) -> Result<libc::sockaddr_in> {
  let storage = lookup(host, port, Family::V4, kind)?;
  // SAFETY: lookup only returns storage whose family matched AF_INET, and
  // sockaddr_in fits inside sockaddr_storage by design.
  Ok(unsafe {
    *(&storage as *const libc::sockaddr_storage as *const libc::sockaddr_in)
  })
}

pub(crate) fn resolve_host_v6(
  host: &str,
  port: u16,
  kind: SocketKind,
) -> Result<libc::sockaddr_in6> {
  let storage = lookup(host, port, Family::V6, kind)?;
  // SAFETY: same as above for AF_INET6.
  Ok(unsafe {
    *(&storage as *const libc::sockaddr_storage as *const libc::sockaddr_in6)
  })
}

/// Runs `getaddrinfo` with family and socktype hints. The first result of
/// the requested family wins, making resolution deterministic for a given
/// input.
fn lookup(
  host: &str,
  port: u16,
  family: Family,
  kind: SocketKind,
) -> Result<libc::sockaddr_storage> {
  let host = CString::new(host).map_err(|_| {
    Error::Validation("host contains an interior NUL byte".into())
  })?;
  let service = CString::new(port.to_string()).map_err(|_| {
    Error::Validation("service contains an interior NUL byte".into())
  })?;

  // SAFETY: all-zero addrinfo is a valid hints value.
  let mut hints: libc::addrinfo = unsafe { mem::zeroed() };
  hints.ai_family = family.as_raw();
  hints.ai_socktype = kind.as_raw();

  let mut list: *mut libc::addrinfo = ptr::null_mut();
  let rc = unsafe {
    libc::getaddrinfo(host.as_ptr(), service.as_ptr(), &hints, &mut list)
  };
  if rc != 0 {
    return Err(Error::Resolution(gai_error(rc)));
  }

  let mut found = None;
  let mut cursor = list;
  while !cursor.is_null() {
    // SAFETY: cursor walks the list getaddrinfo just returned.
    let entry = unsafe { &*cursor };
    if entry.ai_family == family.as_raw() && !entry.ai_addr.is_null() {
      // SAFETY: all-zero sockaddr_storage is valid, ai_addr points at
      // ai_addrlen readable bytes, and the copy is clamped to the storage
      // size.
      let mut storage: libc::sockaddr_storage = unsafe { mem::zeroed() };
      let len = (entry.ai_addrlen as usize)
        .min(mem::size_of::<libc::sockaddr_storage>());
      unsafe {
        ptr::copy_nonoverlapping(
          entry.ai_addr as *const u8,
          &mut storage as *mut libc::sockaddr_storage as *mut u8,
          len,
        );
      }
      found = Some(storage);
      break;
    }
    cursor = entry.ai_next;
  }

  // SAFETY: list came from getaddrinfo and is freed exactly once.
  unsafe { libc::freeaddrinfo(list) };

  found.ok_or_else(|| {
    Error::Resolution(io::Error::new(
      io::ErrorKind::NotFound,
      "no address of the requested family",
    ))
  })
}

fn gai_error(rc: libc::c_int) -> io::Error {
  if rc == libc::EAI_SYSTEM {
    io::Error::last_os_error()
  } else {
    // SAFETY: gai_strerror returns a static NUL-terminated string.
    let msg = unsafe { std::ffi::CStr::from_ptr(libc::gai_strerror(rc)) };
    io::Error::other(msg.to_string_lossy().into_owned())
  }
}
