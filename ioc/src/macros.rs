//! Ergonomic resolution and dependency-table macros.

/// Resolves a service from a provider, panicking on failure.
///
/// This is the convenient front door for application code that treats a
/// missing registration as a fatal condition. The fallible equivalents are
/// [`Provider::create_of`](crate::Provider::create_of) and
/// [`Provider::create_as`](crate::Provider::create_as).
///
/// # Panics
///
/// Panics when the service cannot be resolved.
///
/// # Examples
///
/// ```
/// use lattice_ioc::{resolve, Injectable, Lifetime, Registry, Resolved, ServiceId};
///
/// struct Greeter;
///
/// impl Injectable for Greeter {
///   fn service_id() -> ServiceId {
///     ServiceId::new("app:greeter")
///   }
///   fn build(_: &Resolved) -> Self {
///     Greeter
///   }
/// }
///
/// let registry = Registry::new();
/// registry.register::<Greeter>(Lifetime::Singleton);
/// let provider = registry.create_provider();
///
/// let greeter = resolve!(provider, Greeter);
/// let by_name = resolve!(provider, Greeter, "greeter");
/// assert!(std::rc::Rc::ptr_eq(&greeter, &by_name));
/// ```
#[macro_export]
macro_rules! resolve {
  // Resolve by type: resolve!(provider, MyService)
  ($provider:expr, $type:ty) => {
    $provider.create_of::<$type>().unwrap_or_else(|err| {
      panic!(
        "failed to resolve required service `{}`: {}",
        ::std::any::type_name::<$type>(),
        err
      )
    })
  };

  // Resolve by identifier: resolve!(provider, MyService, "app:service")
  ($provider:expr, $type:ty, $key:expr) => {
    $provider.create_as::<$type>($key).unwrap_or_else(|err| {
      panic!("failed to resolve required service `{}`: {}", $key, err)
    })
  };
}

/// Builds a dependency table literal.
///
/// Each entry pairs a constructor parameter name with the identifier of
/// the service injected for it.
///
/// # Examples
///
/// ```
/// use lattice_ioc::deps;
///
/// let table = deps! {
///   config: "app:config",
///   pool: "app:pool",
/// };
/// assert_eq!(table.len(), 2);
/// assert_eq!(table[0].param, "config");
/// ```
#[macro_export]
macro_rules! deps {
  () => {
    ::std::vec::Vec::new()
  };
  ($($param:ident : $id:expr),+ $(,)?) => {
    ::std::vec![
      $($crate::Dependency::new(stringify!($param), $id)),+
    ]
  };
}
