use sio::{Endpoint, Error, Family, SocketKind};

#[test]
fn v4_bytes_present_as_dotted_quad() {
  let endpoint = Endpoint::from_bytes_v4([127, 0, 0, 1], 9999);
  assert_eq!(endpoint.family(), Family::V4);
  assert_eq!(endpoint.get_addr_string(), "127.0.0.1");
  assert_eq!(endpoint.get_port(), Some(9999));
  assert_eq!(endpoint.get_addr_bytes(), vec![127, 0, 0, 1]);
}

#[test]
fn v6_bytes_carry_the_v6_family_tag() {
  let mut bytes = [0u8; 16];
  bytes[15] = 1;
  let endpoint = Endpoint::from_bytes_v6(bytes, 443);
  assert_eq!(endpoint.family(), Family::V6);
  assert_eq!(endpoint.get_addr_string(), "::1");
  assert_eq!(endpoint.get_port(), Some(443));

  let (addr, _) = endpoint.raw_parts();
  // The stored family tag must match the variant, not any other family.
  let family = unsafe { (*(addr as *const libc::sockaddr_in6)).sin6_family };
  assert_eq!(family, libc::AF_INET6 as libc::sa_family_t);
}

#[test]
fn unix_path_round_trips_exactly() {
  let endpoint = Endpoint::unix("/tmp/sock2").unwrap();
  assert_eq!(endpoint.family(), Family::Unix);
  assert_eq!(endpoint.get_addr_string(), "/tmp/sock2");
  assert_eq!(endpoint.get_port(), None);
  assert_eq!(endpoint.get_addr_bytes(), b"/tmp/sock2".to_vec());
}

#[test]
fn oversized_unix_path_is_rejected() {
  let long = "/tmp/".to_owned() + &"x".repeat(256);
  let err = Endpoint::unix(&long).unwrap_err();
  assert!(matches!(err, Error::Validation(_)), "got {err}");
}

#[test]
fn unix_path_with_an_interior_nul_is_rejected() {
  let err = Endpoint::unix("/tmp/so\0ck").unwrap_err();
  assert!(matches!(err, Error::Validation(_)), "got {err}");
}

#[test]
fn unix_path_at_capacity_is_rejected() {
  // sun_path capacity varies per platform; probe it through a zeroed value.
  let capacity =
    unsafe { std::mem::zeroed::<libc::sockaddr_un>() }.sun_path.len();

  let at_capacity = "y".repeat(capacity);
  assert!(Endpoint::unix(&at_capacity).is_err());

  // One under capacity leaves room for the terminator and is accepted.
  let under = "y".repeat(capacity - 1);
  let endpoint = Endpoint::unix(&under).unwrap();
  assert_eq!(endpoint.get_addr_string(), under);
}

#[test]
fn mutable_raw_access_invalidates_the_presentation() {
  let mut endpoint = Endpoint::from_bytes_v4([10, 0, 0, 7], 1000);
  // Materialize the cache first.
  assert_eq!(endpoint.get_addr_string(), "10.0.0.7");
  assert_eq!(endpoint.get_port(), Some(1000));

  let (addr, _) = endpoint.raw_parts_mut();
  unsafe {
    let v4 = addr as *mut libc::sockaddr_in;
    (*v4).sin_port = 2000u16.to_be();
    (*v4).sin_addr.s_addr = u32::from_ne_bytes([10, 0, 0, 8]);
  }

  // The next read recomputes from the mutated native structure.
  assert_eq!(endpoint.get_addr_string(), "10.0.0.8");
  assert_eq!(endpoint.get_port(), Some(2000));
}

#[test]
fn raw_access_without_a_write_still_reads_consistently() {
  let mut endpoint = Endpoint::from_bytes_v4([192, 168, 1, 1], 80);
  assert_eq!(endpoint.get_addr_string(), "192.168.1.1");
  let _ = endpoint.raw_parts_mut();
  assert_eq!(endpoint.get_addr_string(), "192.168.1.1");
  assert_eq!(endpoint.get_port(), Some(80));
}

#[test]
fn resolving_a_literal_matches_its_bytes() {
  let endpoint =
    Endpoint::resolve_v4("127.0.0.1", 8080, SocketKind::Stream).unwrap();
  assert_eq!(endpoint.family(), Family::V4);
  assert_eq!(endpoint.get_addr_string(), "127.0.0.1");
  assert_eq!(endpoint.get_port(), Some(8080));
  assert_eq!(endpoint.get_addr_bytes(), vec![127, 0, 0, 1]);
}

#[test]
fn resolving_a_v6_literal_matches_its_bytes() {
  let endpoint =
    Endpoint::resolve_v6("::1", 8080, SocketKind::Dgram).unwrap();
  assert_eq!(endpoint.family(), Family::V6);
  let mut expected = vec![0u8; 16];
  expected[15] = 1;
  assert_eq!(endpoint.get_addr_bytes(), expected);
}

#[test]
fn resolution_failure_surfaces_as_a_resolution_error() {
  let err = Endpoint::resolve_v4(
    "host.invalid.sio-test.example",
    80,
    SocketKind::Unspecified,
  )
  .unwrap_err();
  assert!(matches!(err, Error::Resolution(_)), "got {err}");
}

#[test]
fn unspecified_endpoints_report_their_family() {
  assert_eq!(Endpoint::unspecified(Family::V4).family(), Family::V4);
  assert_eq!(Endpoint::unspecified(Family::V6).family(), Family::V6);
  assert_eq!(Endpoint::unspecified(Family::Unix).family(), Family::Unix);
}
