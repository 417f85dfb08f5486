//! Error types for the key debouncer.

use core::fmt;

/// The error type returned by configuration and lifecycle calls.
///
/// Every failing call leaves the registry exactly as it was before the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A pin number is out of range, or a [`KeyConfig`](crate::KeyConfig) asks
    /// for repeat without long-press.
    InvalidArgument,
    /// The operation does not fit the current state: the key is not configured,
    /// repeat would outlive long-press, or the debouncer is not (or already) running.
    InvalidState,
    /// An underlying interrupt resource could not be set up.
    ///
    /// Registration treats this as non-fatal and carries on.
    ResourceUnavailable,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "invalid argument"),
            Self::InvalidState => write!(f, "invalid state"),
            Self::ResourceUnavailable => write!(f, "resource unavailable"),
        }
    }
}

impl core::error::Error for Error {}
