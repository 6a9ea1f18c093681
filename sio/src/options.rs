//! Typed encode/decode of OS socket options keyed by a (level, name) pair.
//!
//! Values cross the option ABI as raw bytes of exactly `size_of::<T>()`, so
//! the value types are restricted to the plain-old-data shapes the OS
//! actually uses. Nothing is cached; every call round-trips to the OS.

use std::{io, mem, os::fd::RawFd};

use crate::error::{Error, Result};

mod private {
  pub trait Sealed {}
}

/// Marker for the plain-old-data types the option ABI traffics in.
pub trait OptValue: Copy + private::Sealed {}

macro_rules! opt_value {
  ($($ty:ty),* $(,)?) => {
    $(
      impl private::Sealed for $ty {}
      impl OptValue for $ty {}
    )*
  };
}

opt_value!(libc::c_int, libc::timeval, libc::linger);

/// A typed socket option value addressed by its OS (level, name) pair.
#[derive(Copy, Clone, Debug)]
pub struct SockOption<T: OptValue> {
  level: libc::c_int,
  name: libc::c_int,
  value: T,
}

impl<T: OptValue> SockOption<T> {
  pub fn new(level: libc::c_int, name: libc::c_int, value: T) -> Self {
    Self { level, name, value }
  }

  pub fn level(&self) -> libc::c_int {
    self.level
  }

  pub fn name(&self) -> libc::c_int {
    self.name
  }

  pub fn value(&self) -> T {
    self.value
  }
}

pub(crate) fn set<T: OptValue>(
  fd: RawFd,
  level: libc::c_int,
  name: libc::c_int,
  value: &T,
) -> Result<()> {
  let len = mem::size_of::<T>() as libc::socklen_t;
  // SAFETY: value is a live T and len is its exact size.
  let rc = unsafe {
    libc::setsockopt(
      fd,
      level,
      name,
      value as *const T as *const libc::c_void,
      len,
    )
  };
  if rc != 0 {
    return Err(Error::Option(io::Error::last_os_error()));
  }
  Ok(())
}

pub(crate) fn get<T: OptValue>(
  fd: RawFd,
  level: libc::c_int,
  name: libc::c_int,
) -> Result<T> {
  let mut value = mem::MaybeUninit::<T>::zeroed();
  let mut len = mem::size_of::<T>() as libc::socklen_t;
  // SAFETY: value has room for exactly len bytes.
  let rc = unsafe {
    libc::getsockopt(
      fd,
      level,
      name,
      value.as_mut_ptr() as *mut libc::c_void,
      &mut len,
    )
  };
  if rc != 0 {
    return Err(Error::Option(io::Error::last_os_error()));
  }
  if len as usize != mem::size_of::<T>() {
    // An ABI mismatch between caller and kernel, not truncatable data.
    return Err(Error::OptionSize {
      expected: mem::size_of::<T>(),
      got: len as usize,
    });
  }
  // SAFETY: the kernel wrote exactly size_of::<T>() bytes and T is plain
  // data where any bit pattern of the right size is a value.
  Ok(unsafe { value.assume_init() })
}
