//! Error taxonomy for the core.
//!
//! A timeout is deliberately absent here: deadline-bounded operations report
//! an elapsed deadline as `Ok(None)`, distinguishable from both success and
//! failure.

use std::{fmt, io};

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
  /// Allocating or configuring the OS handle failed.
  Create(io::Error),
  /// A get/set socket option call failed.
  Option(io::Error),
  /// The kernel reported an option value size other than the one the typed
  /// codec expected. An ABI mismatch, never silently truncated.
  OptionSize { expected: usize, got: usize },
  /// Malformed caller input, e.g. an oversized local-domain path or a
  /// family mismatch between socket and endpoint.
  Validation(String),
  /// Operation attempted after the handle was released.
  Closed,
  /// Name resolution failed.
  Resolution(io::Error),
  /// The underlying syscall failed for a reason other than "would block".
  Io(io::Error),
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Create(err) => write!(f, "failed to create socket: {err}"),
      Self::Option(err) => write!(f, "socket option call failed: {err}"),
      Self::OptionSize { expected, got } => {
        write!(f, "option value size mismatch: expected {expected}, got {got}")
      }
      Self::Validation(msg) => write!(f, "invalid input: {msg}"),
      Self::Closed => f.write_str("socket handle is closed"),
      Self::Resolution(err) => write!(f, "name resolution failed: {err}"),
      Self::Io(err) => err.fmt(f),
    }
  }
}

impl std::error::Error for Error {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      Self::Create(err)
      | Self::Option(err)
      | Self::Resolution(err)
      | Self::Io(err) => Some(err),
      _ => None,
    }
  }
}
