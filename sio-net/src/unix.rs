//! Local-domain shorthand for the stream and datagram shapes.
//!
//! The stream and datagram types work over any endpoint family; these
//! aliases name the local-domain usage. Construct endpoints with
//! [`Endpoint::unix`](sio::Endpoint::unix).
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use sio::Endpoint;
//! use sio_net::unix::UnixDgram;
//!
//! fn receive_one() -> sio::Result<()> {
//!     let sock = UnixDgram::bind(&Endpoint::unix("/tmp/sock2")?)?;
//!     let mut buf = [0u8; 1024];
//!     match sock.recv_from_timeout(&mut buf, Duration::from_millis(4000))? {
//!         Some((n, peer)) => {
//!             println!("{} bytes from {:?}", n, peer.get_addr_string());
//!         }
//!         None => println!("no message received"),
//!     }
//!     Ok(())
//! }
//! ```

pub type UnixStream = crate::tcp::TcpConnection;
pub type UnixAcceptor = crate::tcp::TcpAcceptor;
pub type UnixDgram = crate::udp::UdpSocket;
