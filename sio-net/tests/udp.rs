use std::{thread, time::Duration};

use sio::{Endpoint, Family};
use sio_net::UdpSocket;

fn bound() -> (UdpSocket, Endpoint) {
  let sock = UdpSocket::bind(&Endpoint::from_bytes_v4([127, 0, 0, 1], 0)).unwrap();
  let local = sock.local_endpoint().unwrap();
  (sock, local)
}

#[test]
fn datagram_round_trip_between_two_bound_sockets() {
  let (alpha, alpha_at) = bound();
  let (beta, beta_at) = bound();

  alpha.send_to(&beta_at, b"to-beta").unwrap();
  let mut buf = [0u8; 64];
  let (n, from) = beta
    .recv_from_timeout(&mut buf, Duration::from_millis(4000))
    .unwrap()
    .expect("datagram should arrive");
  assert_eq!(&buf[..n], b"to-beta");
  assert_eq!(from.get_port(), alpha_at.get_port());

  beta.send_to(&from, b"to-alpha").unwrap();
  let (n, _) = alpha
    .recv_from_timeout(&mut buf, Duration::from_millis(4000))
    .unwrap()
    .expect("reply should arrive");
  assert_eq!(&buf[..n], b"to-alpha");
}

#[test]
fn unbound_sender_can_transmit() {
  let (receiver, at) = bound();
  let sender = UdpSocket::unbound(Family::V4).unwrap();
  sender.send_to(&at, b"from-nowhere").unwrap();

  let mut buf = [0u8; 64];
  let (n, _) = receiver
    .recv_from_timeout(&mut buf, Duration::from_millis(4000))
    .unwrap()
    .expect("datagram should arrive");
  assert_eq!(&buf[..n], b"from-nowhere");
}

#[test]
fn recv_with_zero_deadline_reports_no_data() {
  let (receiver, _) = bound();
  let mut buf = [0u8; 64];
  let got = receiver.recv_from_timeout(&mut buf, Duration::ZERO).unwrap();
  assert!(got.is_none());
}

#[test]
fn blocking_recv_waits_for_a_late_sender() {
  let (receiver, at) = bound();

  let sender = thread::spawn(move || {
    thread::sleep(Duration::from_millis(200));
    let sock = UdpSocket::unbound(Family::V4).unwrap();
    sock.send_to(&at, b"eventually").unwrap();
  });

  let mut buf = [0u8; 64];
  let (n, _) = receiver.recv_from(&mut buf).unwrap();
  assert_eq!(&buf[..n], b"eventually");
  sender.join().unwrap();
}
