//! Error types for registration and resolution.

use crate::ident::ServiceId;
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving services.
///
/// Every variant is fatal to the `create` call that raised it; there is no
/// retry and no partial-graph recovery.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  /// No registration exists for the identifier.
  #[error("no registration found for `{0}`")]
  UnknownId(ServiceId),

  /// A bare name matches the simple name of more than one registration.
  #[error("simple name `{0}` is ambiguous; use the canonical `namespace:name` form")]
  AmbiguousName(String),

  /// A deferred registration points at an identifier no declared
  /// constructible carries.
  #[error("`{0}` does not name a declared constructible")]
  UnknownType(ServiceId),

  /// The instance registered under the identifier is of a different type
  /// than the one requested.
  #[error("instance registered for `{0}` is not of the requested type")]
  TypeMismatch(ServiceId),

  /// The dependency graph reached the identifier while already building it.
  #[error("circular dependency detected while resolving `{0}`")]
  CircularDependency(ServiceId),
}
