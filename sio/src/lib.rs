#![allow(private_bounds)]

//! # sio - Typed socket handles with a readiness core
//!
//! sio wraps raw OS socket handles in typed, ownership-safe objects and
//! gives every blocking call an optional deadline: instead of stalling
//! forever, a read, accept, or connect can return "no result yet" once its
//! time budget elapses.
//!
//! ## Architecture
//!
//! - [`Socket`]: move-only owner of one OS handle. Creates or adopts the
//!   descriptor, registers it, mediates every syscall, releases it exactly
//!   once.
//! - [`Registry`]: process-wide table of all live handles plus the shared
//!   readiness-wait primitive every blocking operation funnels through.
//! - [`Endpoint`]: IPv4/IPv6/local-domain address with a lazily computed
//!   textual form.
//! - [`SockOption`]: typed (level, name) socket option values.
//!
//! Timeouts are never errors. A deadline-bounded operation returns
//! `Ok(None)` when the deadline elapses, `Ok(Some(..))` on success, and
//! `Err(..)` only for real failures.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use sio::{Endpoint, Family, Socket, SocketKind};
//!
//! fn receiver() -> sio::Result<()> {
//!     let socket = Socket::new(Family::V4, SocketKind::Dgram)?;
//!     socket.bind(&Endpoint::from_bytes_v4([127, 0, 0, 1], 9999))?;
//!
//!     let mut buf = [0u8; 1024];
//!     match socket.recv_from(&mut buf, Some(Duration::from_millis(4000)))? {
//!         Some((n, peer)) => {
//!             println!("{} bytes from {}", n, peer.get_addr_string());
//!         }
//!         None => println!("no message within the deadline"),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Blocking without a deadline
//!
//! Passing `None` as the timeout blocks until the operation resolves:
//!
//! ```rust,no_run
//! use sio::{Endpoint, Family, Socket, SocketKind};
//!
//! fn server() -> sio::Result<()> {
//!     let listener = Socket::new(Family::V4, SocketKind::Stream)?;
//!     listener.bind(&Endpoint::from_bytes_v4([0, 0, 0, 0], 8080))?;
//!     listener.listen(128)?;
//!
//!     // Blocks until a client arrives.
//!     let (conn, peer) = listener.accept(None)?.expect("no deadline given");
//!     println!("client: {}", peer.get_addr_string());
//!
//!     let mut buf = [0u8; 1024];
//!     let n = conn.recv(&mut buf, None)?.expect("no deadline given");
//!     println!("read {} bytes", n);
//!     Ok(())
//! }
//! ```
//!
//! ## Ownership
//!
//! A handle value is reachable from exactly one live [`Socket`] at any
//! instant. `Socket` is move-only; transferring it transfers the handle,
//! and dropping it (or calling [`Socket::close`]) releases the handle
//! exactly once. The [`Registry`] entry tracks the current owner through a
//! token that is repointed when a higher-level wrapper takes the handle
//! over, and removed when the handle is released.
//!
//! ## Threading
//!
//! No threads are spawned. Blocking operations suspend the calling thread
//! inside the registry's multiplex wait; different threads may operate on
//! distinct handles concurrently. Cancellation is deadline-based only.

pub mod endpoint;
pub mod error;
pub mod options;
pub mod registry;
mod resolve;
pub mod socket;

pub use endpoint::{Endpoint, Family, SocketKind};
pub use error::{Error, Result};
pub use options::SockOption;
pub use registry::{Interest, Registry, WaitStatus};
pub use socket::Socket;
