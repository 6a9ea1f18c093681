//! Address endpoints for the three supported families.
//!
//! An [`Endpoint`] holds the OS-native fixed-size address structure for an
//! IPv4, IPv6, or local-domain (unix) address, together with a lazily
//! computed presentation cache of (textual address, port). The cache is
//! recomputed on demand and invalidated unconditionally whenever the native
//! structure is exposed for mutation through [`Endpoint::raw_parts_mut`].

use std::{
  cell::OnceCell,
  fmt, mem,
  net::{Ipv4Addr, Ipv6Addr},
};

use crate::{
  error::{Error, Result},
  resolve,
};

/// Address family of a socket or endpoint.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Family {
  V4,
  V6,
  Unix,
}

impl Family {
  pub fn as_raw(self) -> libc::c_int {
    match self {
      Family::V4 => libc::AF_INET,
      Family::V6 => libc::AF_INET6,
      Family::Unix => libc::AF_UNIX,
    }
  }
}

/// Socket shape, also used as the resolution hint for whether an endpoint
/// feeds a stream or datagram consumer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SocketKind {
  Stream,
  Dgram,
  /// No preference; resolution accepts either shape.
  Unspecified,
}

impl SocketKind {
  pub(crate) fn as_raw(self) -> libc::c_int {
    match self {
      SocketKind::Stream => libc::SOCK_STREAM,
      SocketKind::Dgram => libc::SOCK_DGRAM,
      SocketKind::Unspecified => 0,
    }
  }
}

/// Cached human-readable form of an endpoint.
#[derive(Clone, Debug)]
struct Presentation {
  addr: String,
  port: u16,
}

#[derive(Clone)]
enum EndpointAddr {
  V4(libc::sockaddr_in),
  V6(libc::sockaddr_in6),
  Unix(libc::sockaddr_un),
}

/// A network or local-domain address with a lazily materialized textual form.
#[derive(Clone)]
pub struct Endpoint {
  addr: EndpointAddr,
  cache: OnceCell<Presentation>,
}

impl Endpoint {
  /// Resolves `host` to an IPv4 endpoint through the system resolver.
  ///
  /// The first result matching the family wins, so resolution is
  /// deterministic for a given input. The presentation cache is seeded from
  /// the explicit strings and stays valid until the native structure is
  /// mutated.
  pub fn resolve_v4(host: &str, port: u16, kind: SocketKind) -> Result<Endpoint> {
    let addr = resolve::resolve_host_v4(host, port, kind)?;
    let endpoint =
      Endpoint { addr: EndpointAddr::V4(addr), cache: OnceCell::new() };
    let _ = endpoint.cache.set(Presentation { addr: host.to_owned(), port });
    Ok(endpoint)
  }

  /// Resolves `host` to an IPv6 endpoint through the system resolver.
  pub fn resolve_v6(host: &str, port: u16, kind: SocketKind) -> Result<Endpoint> {
    let addr = resolve::resolve_host_v6(host, port, kind)?;
    let endpoint =
      Endpoint { addr: EndpointAddr::V6(addr), cache: OnceCell::new() };
    let _ = endpoint.cache.set(Presentation { addr: host.to_owned(), port });
    Ok(endpoint)
  }

  /// IPv4 endpoint from raw address octets in network order.
  pub fn from_bytes_v4(bytes: [u8; 4], port: u16) -> Endpoint {
    // SAFETY: all-zero sockaddr_in is a valid value for every field.
    let mut addr: libc::sockaddr_in = unsafe { mem::zeroed() };
    #[cfg(bsdish)]
    {
      addr.sin_len = mem::size_of::<libc::sockaddr_in>() as u8;
    }
    addr.sin_family = libc::AF_INET as libc::sa_family_t;
    addr.sin_port = port.to_be();
    addr.sin_addr = libc::in_addr { s_addr: u32::from_ne_bytes(bytes) };
    Endpoint { addr: EndpointAddr::V4(addr), cache: OnceCell::new() }
  }

  /// IPv6 endpoint from raw address octets in network order.
  ///
  /// The family tag is written strictly for the variant being constructed.
  pub fn from_bytes_v6(bytes: [u8; 16], port: u16) -> Endpoint {
    // SAFETY: all-zero sockaddr_in6 is a valid value for every field.
    let mut addr: libc::sockaddr_in6 = unsafe { mem::zeroed() };
    #[cfg(bsdish)]
    {
      addr.sin6_len = mem::size_of::<libc::sockaddr_in6>() as u8;
    }
    addr.sin6_family = libc::AF_INET6 as libc::sa_family_t;
    addr.sin6_port = port.to_be();
    addr.sin6_addr = libc::in6_addr { s6_addr: bytes };
    Endpoint { addr: EndpointAddr::V6(addr), cache: OnceCell::new() }
  }

  /// Wraps an already-filled native IPv4 structure. The textual form is not
  /// known yet, so the first read recomputes it.
  pub fn from_native_v4(addr: libc::sockaddr_in) -> Endpoint {
    Endpoint { addr: EndpointAddr::V4(addr), cache: OnceCell::new() }
  }

  /// Wraps an already-filled native IPv6 structure.
  pub fn from_native_v6(addr: libc::sockaddr_in6) -> Endpoint {
    Endpoint { addr: EndpointAddr::V6(addr), cache: OnceCell::new() }
  }

  /// Wraps an already-filled native local-domain structure.
  pub fn from_native_unix(addr: libc::sockaddr_un) -> Endpoint {
    Endpoint { addr: EndpointAddr::Unix(addr), cache: OnceCell::new() }
  }

  /// Local-domain endpoint for a filesystem path.
  ///
  /// There is no lazy machinery here: the textual form is the stored path.
  /// A path at or above the platform's path-buffer capacity is rejected.
  pub fn unix(path: &str) -> Result<Endpoint> {
    // SAFETY: all-zero sockaddr_un is a valid value for every field.
    let mut addr: libc::sockaddr_un = unsafe { mem::zeroed() };
    let capacity = addr.sun_path.len();
    if path.len() >= capacity {
      return Err(Error::Validation(format!(
        "local-domain path of {} bytes does not fit the {}-byte path buffer",
        path.len(),
        capacity
      )));
    }
    // The kernel stops at the first NUL; an embedded one would silently bind
    // a truncated path.
    if path.as_bytes().contains(&0) {
      return Err(Error::Validation(
        "local-domain path contains an interior NUL byte".into(),
      ));
    }
    #[cfg(bsdish)]
    {
      addr.sun_len = mem::size_of::<libc::sockaddr_un>() as u8;
    }
    addr.sun_family = libc::AF_UNIX as libc::sa_family_t;
    for (dst, src) in addr.sun_path.iter_mut().zip(path.as_bytes()) {
      *dst = *src as libc::c_char;
    }
    Ok(Endpoint { addr: EndpointAddr::Unix(addr), cache: OnceCell::new() })
  }

  /// Zeroed native structure of the given family, for syscalls that write a
  /// peer address back through [`Endpoint::raw_parts_mut`].
  pub fn unspecified(family: Family) -> Endpoint {
    match family {
      // SAFETY: all-zero native address structures are valid values.
      Family::V4 => {
        let mut addr: libc::sockaddr_in = unsafe { mem::zeroed() };
        addr.sin_family = libc::AF_INET as libc::sa_family_t;
        Self::from_native_v4(addr)
      }
      Family::V6 => {
        let mut addr: libc::sockaddr_in6 = unsafe { mem::zeroed() };
        addr.sin6_family = libc::AF_INET6 as libc::sa_family_t;
        Self::from_native_v6(addr)
      }
      Family::Unix => {
        let mut addr: libc::sockaddr_un = unsafe { mem::zeroed() };
        addr.sun_family = libc::AF_UNIX as libc::sa_family_t;
        Self::from_native_unix(addr)
      }
    }
  }

  pub fn family(&self) -> Family {
    match &self.addr {
      EndpointAddr::V4(_) => Family::V4,
      EndpointAddr::V6(_) => Family::V6,
      EndpointAddr::Unix(_) => Family::Unix,
    }
  }

  fn presentation(&self) -> &Presentation {
    self.cache.get_or_init(|| match &self.addr {
      EndpointAddr::V4(addr) => Presentation {
        addr: Ipv4Addr::from(u32::from_be(addr.sin_addr.s_addr)).to_string(),
        port: u16::from_be(addr.sin_port),
      },
      EndpointAddr::V6(addr) => Presentation {
        addr: Ipv6Addr::from(addr.sin6_addr.s6_addr).to_string(),
        port: u16::from_be(addr.sin6_port),
      },
      EndpointAddr::Unix(addr) => {
        let path: Vec<u8> = addr
          .sun_path
          .iter()
          .take_while(|&&c| c != 0)
          .map(|&c| c as u8)
          .collect();
        Presentation {
          addr: String::from_utf8_lossy(&path).into_owned(),
          port: 0,
        }
      }
    })
  }

  /// Textual address in the platform's standard presentation form.
  /// Recomputed lazily when the cache was invalidated.
  pub fn get_addr_string(&self) -> &str {
    &self.presentation().addr
  }

  /// Port in host order, `None` for local-domain endpoints.
  pub fn get_port(&self) -> Option<u16> {
    match &self.addr {
      EndpointAddr::Unix(_) => None,
      _ => Some(self.presentation().port),
    }
  }

  /// Raw address octets: 4 bytes for v4, 16 for v6, the path bytes for unix.
  pub fn get_addr_bytes(&self) -> Vec<u8> {
    match &self.addr {
      EndpointAddr::V4(addr) => addr.sin_addr.s_addr.to_ne_bytes().to_vec(),
      EndpointAddr::V6(addr) => addr.sin6_addr.s6_addr.to_vec(),
      EndpointAddr::Unix(addr) => addr
        .sun_path
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect(),
    }
  }

  /// Native structure pointer and length for passing to a syscall.
  pub fn raw_parts(&self) -> (*const libc::sockaddr, libc::socklen_t) {
    match &self.addr {
      EndpointAddr::V4(addr) => (
        addr as *const libc::sockaddr_in as *const libc::sockaddr,
        mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
      ),
      EndpointAddr::V6(addr) => (
        addr as *const libc::sockaddr_in6 as *const libc::sockaddr,
        mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t,
      ),
      EndpointAddr::Unix(addr) => (
        addr as *const libc::sockaddr_un as *const libc::sockaddr,
        mem::size_of::<libc::sockaddr_un>() as libc::socklen_t,
      ),
    }
  }

  /// Mutable native structure pointer and capacity.
  ///
  /// The presentation cache is invalidated unconditionally: the caller may
  /// write through the pointer and the cache must never outlive such a
  /// write. This holds even if no write happens.
  pub fn raw_parts_mut(&mut self) -> (*mut libc::sockaddr, libc::socklen_t) {
    let _ = self.cache.take();
    match &mut self.addr {
      EndpointAddr::V4(addr) => (
        addr as *mut libc::sockaddr_in as *mut libc::sockaddr,
        mem::size_of::<libc::sockaddr_in>() as libc::socklen_t,
      ),
      EndpointAddr::V6(addr) => (
        addr as *mut libc::sockaddr_in6 as *mut libc::sockaddr,
        mem::size_of::<libc::sockaddr_in6>() as libc::socklen_t,
      ),
      EndpointAddr::Unix(addr) => (
        addr as *mut libc::sockaddr_un as *mut libc::sockaddr,
        mem::size_of::<libc::sockaddr_un>() as libc::socklen_t,
      ),
    }
  }
}

impl fmt::Debug for Endpoint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut dbg = f.debug_struct("Endpoint");
    dbg.field("family", &self.family());
    dbg.field("addr", &self.get_addr_string());
    if let Some(port) = self.get_port() {
      dbg.field("port", &port);
    }
    dbg.finish()
  }
}
