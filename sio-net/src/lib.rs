//! Protocol socket shapes over the sio core.
//!
//! Thin policy types that pick which core operations a handle issues:
//!
//! - [`TcpAcceptor`]: passive stream socket accepting connections.
//! - [`TcpConnection`]: connected stream socket for reading and writing.
//! - [`UdpSocket`]: datagram socket addressed per message.
//! - [`unix`]: the same shapes over local-domain endpoints.
//!
//! Every deadline variant returns `Ok(None)` on an elapsed deadline, the
//! same "no result yet" convention as the core.
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use sio::Endpoint;
//! use sio_net::TcpAcceptor;
//!
//! fn serve() -> sio::Result<()> {
//!     let endpoint = Endpoint::from_bytes_v4([127, 0, 0, 1], 8080);
//!     let acceptor = TcpAcceptor::bind(&endpoint)?;
//!
//!     while let Some((conn, peer)) =
//!         acceptor.accept_timeout(Duration::from_secs(5))?
//!     {
//!         println!("connection from {}", peer.get_addr_string());
//!         let mut buf = [0u8; 1024];
//!         if let Some(n) = conn.read_timeout(&mut buf, Duration::from_secs(1))? {
//!             conn.send(&buf[..n])?;
//!         }
//!     }
//!     Ok(())
//! }
//! ```

mod tcp;
mod udp;
pub mod unix;

pub use tcp::{TcpAcceptor, TcpConnection};
pub use udp::UdpSocket;
