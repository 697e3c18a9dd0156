//! Registration records: lifetimes, dependency tables, factories.

use std::any::{self, Any};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use once_cell::unsync::OnceCell;

use crate::catalog::Catalog;
use crate::error::Result;
use crate::ident::ServiceId;

/// A resolved service instance, dynamically typed.
pub type Instance = Rc<dyn Any>;

/// Instance-producing function invoked with the resolved dependencies.
pub type Factory = Box<dyn Fn(&Resolved) -> Instance>;

/// Caching policy attached to each registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
  /// A fresh instance on every resolution; never cached.
  #[default]
  Transient,
  /// One instance per registry, cached in the store's global layer.
  Singleton,
  /// One instance per scope, cached in the store's local layer.
  Scoped,
}

impl Lifetime {
  /// Whether instances with this lifetime are looked up in the store
  /// before building.
  pub(crate) fn is_cached(self) -> bool {
    matches!(self, Lifetime::Singleton | Lifetime::Scoped)
  }

  pub fn name(self) -> &'static str {
    match self {
      Lifetime::Transient => "transient",
      Lifetime::Singleton => "singleton",
      Lifetime::Scoped => "scoped",
    }
  }
}

impl fmt::Display for Lifetime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

/// One entry of a dependency table: a constructor parameter and the
/// identifier of the service injected for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dependency {
  pub param: &'static str,
  pub id: ServiceId,
}

impl Dependency {
  pub fn new(param: &'static str, id: impl Into<ServiceId>) -> Self {
    Dependency { param, id: id.into() }
  }
}

/// Resolved dependencies handed to a factory, keyed by parameter name.
#[derive(Default)]
pub struct Resolved {
  values: HashMap<&'static str, Instance>,
}

impl Resolved {
  pub(crate) fn with_capacity(n: usize) -> Self {
    Resolved {
      values: HashMap::with_capacity(n),
    }
  }

  pub(crate) fn insert(&mut self, param: &'static str, instance: Instance) {
    self.values.insert(param, instance);
  }

  /// Typed accessor for one resolved dependency.
  ///
  /// # Panics
  ///
  /// Panics when nothing was resolved under `param`, or when the resolved
  /// instance is of a different type. Both mean the dependency table does
  /// not match the factory consuming it.
  pub fn get<T: Any>(&self, param: &str) -> Rc<T> {
    let instance = self
      .values
      .get(param)
      .unwrap_or_else(|| panic!("no dependency resolved for parameter `{param}`"));
    Rc::clone(instance)
      .downcast::<T>()
      .unwrap_or_else(|_| panic!("dependency `{param}` is not a `{}`", any::type_name::<T>()))
  }

  /// Untyped accessor; `None` when the parameter is absent.
  pub fn instance(&self, param: &str) -> Option<&Instance> {
    self.values.get(param)
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }
}

/// A constructible the container can build and wire.
///
/// Implementations declare their canonical identifier and dependency table
/// statically; the provider resolves each table entry and hands the result
/// to [`Injectable::build`].
pub trait Injectable: Any + Sized {
  /// Canonical `namespace:name` identifier of this type.
  fn service_id() -> ServiceId;

  /// Ordered constructor-parameter table. Parameters not listed here are
  /// not injected.
  fn dependencies() -> Vec<Dependency> {
    Vec::new()
  }

  /// Builds an instance from the resolved dependency set.
  fn build(args: &Resolved) -> Self;
}

/// Dependency table plus factory for one constructible.
pub(crate) struct Metadata {
  pub(crate) dependencies: Vec<Dependency>,
  pub(crate) factory: Factory,
}

impl Metadata {
  /// Metadata of a statically known constructible.
  pub(crate) fn of<T: Injectable>() -> Self {
    Metadata {
      dependencies: T::dependencies(),
      factory: Box::new(|args| Rc::new(T::build(args)) as Instance),
    }
  }
}

/// One registration: everything the provider needs to build and cache
/// instances under the registered key. The lifetime tag is chosen by the
/// registry at registration time.
pub(crate) enum Record {
  /// An unresolved identifier, looked up in the catalog on first use. The
  /// cell guarantees the lookup runs at most once per record.
  Deferred {
    target: ServiceId,
    cell: OnceCell<Metadata>,
    lifetime: Lifetime,
  },
  /// A constructible captured directly at registration.
  Direct { metadata: Metadata, lifetime: Lifetime },
}

impl Record {
  pub(crate) fn deferred(target: ServiceId, lifetime: Lifetime) -> Self {
    Record::Deferred {
      target,
      cell: OnceCell::new(),
      lifetime,
    }
  }

  pub(crate) fn direct(metadata: Metadata, lifetime: Lifetime) -> Self {
    Record::Direct { metadata, lifetime }
  }

  pub(crate) fn lifetime(&self) -> Lifetime {
    match self {
      Record::Deferred { lifetime, .. } | Record::Direct { lifetime, .. } => *lifetime,
    }
  }

  /// The record's metadata, initializing a deferred record on first access.
  pub(crate) fn metadata(&self, catalog: &Catalog) -> Result<&Metadata> {
    match self {
      Record::Deferred { target, cell, .. } => cell.get_or_try_init(|| catalog.load(target)),
      Record::Direct { metadata, .. } => Ok(metadata),
    }
  }
}
