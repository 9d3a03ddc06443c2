//! Driver error type

use pt6964_protocol::ValidationError;

use crate::config::ConfigError;

/// Errors returned by driver operations
///
/// `E` is the bus backend's error type. Validation failures are detected
/// before any bus access, so a call failing with
/// [`Error::Validation`] or [`Error::Config`] has touched no line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error<E> {
    /// A parameter was outside its documented range
    Validation(ValidationError),
    /// The driver configuration was rejected
    Config(ConfigError),
    /// The bus backend failed; passed through unchanged
    Bus(E),
}

impl<E> From<ValidationError> for Error<E> {
    fn from(e: ValidationError) -> Self {
        Error::Validation(e)
    }
}

impl<E> From<ConfigError> for Error<E> {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl<E: core::fmt::Display> core::fmt::Display for Error<E> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Validation(e) => write!(f, "invalid parameter: {e}"),
            Error::Config(e) => write!(f, "invalid configuration: {e}"),
            Error::Bus(e) => write!(f, "bus error: {e}"),
        }
    }
}

impl<E: core::fmt::Debug + core::fmt::Display> std::error::Error for Error<E> {}
