use std::time::Duration;

use sio::{Endpoint, Family, Result, Socket, SocketKind};

/// A datagram socket addressed per message.
pub struct UdpSocket {
  socket: Socket,
}

impl UdpSocket {
  /// Binds a datagram socket to `endpoint` so it can receive.
  pub fn bind(endpoint: &Endpoint) -> Result<UdpSocket> {
    let mut socket = Socket::new(endpoint.family(), SocketKind::Dgram)?;
    socket.bind(endpoint)?;
    socket.reown();
    Ok(UdpSocket { socket })
  }

  /// Datagram socket without a local binding. Usable for sending; the OS
  /// assigns a local address on first send.
  pub fn unbound(family: Family) -> Result<UdpSocket> {
    let mut socket = Socket::new(family, SocketKind::Dgram)?;
    socket.reown();
    Ok(UdpSocket { socket })
  }

  /// Sends one datagram to `endpoint`.
  pub fn send_to(&self, endpoint: &Endpoint, data: &[u8]) -> Result<usize> {
    match self.socket.send_to(endpoint, data, None)? {
      Some(n) => Ok(n),
      None => unreachable!(),
    }
  }

  /// Receives one datagram and the endpoint it came from, blocking until a
  /// message arrives.
  pub fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, Endpoint)> {
    match self.socket.recv_from(buf, None)? {
      Some(received) => Ok(received),
      None => unreachable!(),
    }
  }

  /// Receives one datagram within `timeout`. `Ok(None)` reports an elapsed
  /// deadline; nothing has been consumed in that case.
  pub fn recv_from_timeout(
    &self,
    buf: &mut [u8],
    timeout: Duration,
  ) -> Result<Option<(usize, Endpoint)>> {
    self.socket.recv_from(buf, Some(timeout))
  }

  pub fn local_endpoint(&self) -> Result<Endpoint> {
    self.socket.local_endpoint()
  }

  pub fn socket(&self) -> &Socket {
    &self.socket
  }
}
