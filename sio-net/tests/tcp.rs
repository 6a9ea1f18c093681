use std::{thread, time::Duration};

use sio::{Endpoint, Family, SocketKind};
use sio_net::{TcpAcceptor, TcpConnection};

fn loopback_acceptor() -> (TcpAcceptor, Endpoint) {
  let acceptor =
    TcpAcceptor::bind(&Endpoint::from_bytes_v4([127, 0, 0, 1], 0)).unwrap();
  let local = acceptor.local_endpoint().unwrap();
  (acceptor, local)
}

#[test]
fn accept_times_out_with_no_client() {
  let (acceptor, _) = loopback_acceptor();
  let got = acceptor.accept_timeout(Duration::from_millis(50)).unwrap();
  assert!(got.is_none());
}

#[test]
fn echo_round_trip() {
  let (acceptor, local) = loopback_acceptor();
  let (tx, rx) = crossbeam_channel::bounded::<Endpoint>(1);

  let client = thread::spawn(move || {
    let target = rx.recv().unwrap();
    let conn = TcpConnection::connect(&target).unwrap();
    conn.send(b"ping").unwrap();

    let mut buf = [0u8; 16];
    let n = conn
      .read_timeout(&mut buf, Duration::from_millis(4000))
      .unwrap()
      .expect("server reply should arrive");
    assert_eq!(&buf[..n], b"pong");
  });
  tx.send(local).unwrap();

  let (conn, peer) = acceptor
    .accept_timeout(Duration::from_millis(4000))
    .unwrap()
    .expect("client should connect");
  assert_eq!(peer.get_addr_string(), "127.0.0.1");

  let mut buf = [0u8; 16];
  let n = conn
    .read_timeout(&mut buf, Duration::from_millis(4000))
    .unwrap()
    .expect("client request should arrive");
  assert_eq!(&buf[..n], b"ping");
  conn.send(b"pong").unwrap();

  client.join().unwrap();
}

#[test]
fn read_with_zero_deadline_reports_no_data() {
  let (acceptor, local) = loopback_acceptor();

  let client = thread::spawn(move || {
    let conn = TcpConnection::connect(&local).unwrap();
    // Keep the connection open until the server side is done probing.
    thread::sleep(Duration::from_millis(300));
    drop(conn);
  });

  let (conn, _) = acceptor
    .accept_timeout(Duration::from_millis(4000))
    .unwrap()
    .expect("client should connect");

  let mut buf = [0u8; 16];
  let got = conn.read_timeout(&mut buf, Duration::ZERO).unwrap();
  assert!(got.is_none());

  client.join().unwrap();
}

#[test]
fn connect_to_an_unserved_port_fails() {
  // A UDP-only binding guarantees no TCP listener holds the port.
  let blocker = sio::Socket::new(Family::V4, SocketKind::Dgram).unwrap();
  blocker.bind(&Endpoint::from_bytes_v4([127, 0, 0, 1], 0)).unwrap();
  let port = blocker.local_endpoint().unwrap().get_port().unwrap();

  let target = Endpoint::from_bytes_v4([127, 0, 0, 1], port);
  let err = match TcpConnection::connect_timeout(&target, Duration::from_millis(4000)) {
    Err(err) => err,
    Ok(Some(_)) => panic!("connect to an unserved port succeeded"),
    Ok(None) => panic!("refusal should surface before the deadline"),
  };
  assert!(matches!(err, sio::Error::Io(_)), "got {err}");
}

#[test]
fn sends_larger_than_one_buffer_arrive_whole() {
  let (acceptor, local) = loopback_acceptor();
  let payload: Vec<u8> = (0..1_000_000u32).map(|i| i as u8).collect();
  let expected = payload.clone();

  let client = thread::spawn(move || {
    let conn = TcpConnection::connect(&local).unwrap();
    let written = conn.send(&payload).unwrap();
    assert_eq!(written, payload.len());
  });

  let (conn, _) = acceptor
    .accept_timeout(Duration::from_millis(4000))
    .unwrap()
    .expect("client should connect");

  let mut received = Vec::with_capacity(expected.len());
  let mut buf = [0u8; 64 * 1024];
  while received.len() < expected.len() {
    let n = conn.read(&mut buf).unwrap();
    assert!(n > 0, "stream closed early at {} bytes", received.len());
    received.extend_from_slice(&buf[..n]);
  }
  assert_eq!(received, expected);

  client.join().unwrap();
}

#[test]
fn read_returns_zero_at_end_of_stream() {
  let (acceptor, local) = loopback_acceptor();

  let client = thread::spawn(move || {
    let conn = TcpConnection::connect(&local).unwrap();
    conn.send(b"bye").unwrap();
  });

  let (conn, _) = acceptor
    .accept_timeout(Duration::from_millis(4000))
    .unwrap()
    .expect("client should connect");
  client.join().unwrap();

  let mut buf = [0u8; 16];
  let n = conn.read(&mut buf).unwrap();
  assert_eq!(&buf[..n], b"bye");
  assert_eq!(conn.read(&mut buf).unwrap(), 0);
}
