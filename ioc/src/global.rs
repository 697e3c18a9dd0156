//! The process-global registry instance and its access function.

use once_cell::sync::Lazy;

use crate::sync::Registry;

// The one and only global registry. Created on first access.
static GLOBAL_REGISTRY: Lazy<Registry> = Lazy::new(Registry::default);

/// The shared, process-wide [`Registry`](crate::sync::Registry).
///
/// Registrations made here are visible from any thread, to every provider
/// created through this function.
///
/// # Examples
///
/// ```
/// use lattice_ioc::sync::{Injectable, Resolved};
/// use lattice_ioc::{global, resolve, Lifetime, ServiceId};
///
/// struct Motd(&'static str);
///
/// impl Injectable for Motd {
///   fn service_id() -> ServiceId {
///     ServiceId::new("docs:motd")
///   }
///   fn build(_: &Resolved) -> Self {
///     Motd("hello")
///   }
/// }
///
/// global().register::<Motd>(Lifetime::Singleton);
/// let provider = global().create_provider();
/// assert_eq!(resolve!(provider, Motd).0, "hello");
/// ```
pub fn global() -> &'static Registry {
  &GLOBAL_REGISTRY
}
