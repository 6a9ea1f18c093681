use std::time::Duration;

use sio::{Endpoint, Result, Socket, SocketKind};

/// A connected stream socket.
pub struct TcpConnection {
  socket: Socket,
}

impl TcpConnection {
  /// Connects to `endpoint`, blocking until the connection resolves.
  pub fn connect(endpoint: &Endpoint) -> Result<TcpConnection> {
    match Self::connect_inner(endpoint, None)? {
      Some(conn) => Ok(conn),
      // A connect without a deadline never times out.
      None => unreachable!(),
    }
  }

  /// Connects to `endpoint` within `timeout`. `Ok(None)` reports an elapsed
  /// deadline.
  pub fn connect_timeout(
    endpoint: &Endpoint,
    timeout: Duration,
  ) -> Result<Option<TcpConnection>> {
    Self::connect_inner(endpoint, Some(timeout))
  }

  fn connect_inner(
    endpoint: &Endpoint,
    timeout: Option<Duration>,
  ) -> Result<Option<TcpConnection>> {
    let socket = Socket::new(endpoint.family(), SocketKind::Stream)?;
    match socket.connect(endpoint, timeout)? {
      Some(()) => Ok(Some(Self::take(socket))),
      None => Ok(None),
    }
  }

  /// Wraps a core socket, taking over its registry entry.
  pub(crate) fn take(mut socket: Socket) -> TcpConnection {
    socket.reown();
    TcpConnection { socket }
  }

  /// Sends the whole buffer, waiting for writability between partial
  /// writes. Returns the number of bytes written, always `data.len()`.
  pub fn send(&self, mut data: &[u8]) -> Result<usize> {
    let total = data.len();
    while !data.is_empty() {
      match self.socket.send(data, None)? {
        Some(written) => data = &data[written..],
        None => unreachable!(),
      }
    }
    Ok(total)
  }

  /// Reads into `buf`, blocking until data (or EOF, reported as 0) arrives.
  pub fn read(&self, buf: &mut [u8]) -> Result<usize> {
    match self.socket.recv(buf, None)? {
      Some(n) => Ok(n),
      None => unreachable!(),
    }
  }

  /// Reads into `buf` within `timeout`. `Ok(None)` reports an elapsed
  /// deadline; nothing has been consumed in that case.
  pub fn read_timeout(
    &self,
    buf: &mut [u8],
    timeout: Duration,
  ) -> Result<Option<usize>> {
    self.socket.recv(buf, Some(timeout))
  }

  pub fn local_endpoint(&self) -> Result<Endpoint> {
    self.socket.local_endpoint()
  }

  pub fn socket(&self) -> &Socket {
    &self.socket
  }
}

/// A passive stream socket accepting incoming connections.
pub struct TcpAcceptor {
  socket: Socket,
}

impl TcpAcceptor {
  /// Binds to `endpoint` and starts listening with a backlog of 128.
  pub fn bind(endpoint: &Endpoint) -> Result<TcpAcceptor> {
    let mut socket = Socket::new(endpoint.family(), SocketKind::Stream)?;
    socket.bind(endpoint)?;
    socket.listen(128)?;
    socket.reown();
    Ok(TcpAcceptor { socket })
  }

  /// Accepts one connection, blocking until a client arrives.
  pub fn accept(&self) -> Result<(TcpConnection, Endpoint)> {
    match self.socket.accept(None)? {
      Some((socket, peer)) => Ok((TcpConnection::take(socket), peer)),
      None => unreachable!(),
    }
  }

  /// Accepts one connection within `timeout`. `Ok(None)` reports an elapsed
  /// deadline.
  pub fn accept_timeout(
    &self,
    timeout: Duration,
  ) -> Result<Option<(TcpConnection, Endpoint)>> {
    match self.socket.accept(Some(timeout))? {
      Some((socket, peer)) => Ok(Some((TcpConnection::take(socket), peer))),
      None => Ok(None),
    }
  }

  pub fn local_endpoint(&self) -> Result<Endpoint> {
    self.socket.local_endpoint()
  }

  pub fn socket(&self) -> &Socket {
    &self.socket
  }
}
