//! Service registration and record storage.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use crate::catalog::Catalog;
use crate::ident::ServiceId;
use crate::provider::Provider;
use crate::record::{Dependency, Injectable, Instance, Lifetime, Metadata, Record, Resolved};
use crate::store::{ScopedStore, SharedMap};

/// The registration half of the container: canonical identifier to record.
///
/// A registry is single-threaded; registration goes through `&self` so
/// records can be added at any point, including from inside factories.
/// Re-registering a key overwrites the previous record: no merge, no
/// duplicate-key error.
#[derive(Default)]
pub struct Registry {
  records: RefCell<HashMap<ServiceId, Rc<Record>>>,
  catalog: Catalog,
  global: SharedMap,
}

impl Registry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Declares `T` loadable by identifier without registering it. Deferred
  /// registrations targeting `T::service_id()` resolve through this entry.
  pub fn declare<T: Injectable>(&self) {
    self.catalog.declare::<T>();
  }

  /// Registers `T` under its own canonical identifier.
  pub fn register<T: Injectable>(&self, lifetime: Lifetime) -> Binding<'_> {
    self.register_as::<T>(T::service_id(), lifetime)
  }

  /// Registers `T` under an explicit key.
  pub fn register_as<T: Injectable>(
    &self,
    key: impl Into<ServiceId>,
    lifetime: Lifetime,
  ) -> Binding<'_> {
    self.catalog.declare::<T>();
    self.bind(key.into(), Record::deferred(T::service_id(), lifetime), lifetime)
  }

  /// Registers `key` as a deferred reference to another identifier. The
  /// target is looked up among declared constructibles on first use, and
  /// the built instance is cached under `key` with this lifetime.
  pub fn register_ref(
    &self,
    key: impl Into<ServiceId>,
    target: impl Into<ServiceId>,
    lifetime: Lifetime,
  ) -> Binding<'_> {
    self.bind(key.into(), Record::deferred(target.into(), lifetime), lifetime)
  }

  /// Registers a bare factory with an explicit dependency table.
  pub fn register_factory<T, F>(
    &self,
    key: impl Into<ServiceId>,
    dependencies: Vec<Dependency>,
    build: F,
    lifetime: Lifetime,
  ) -> Binding<'_>
  where
    T: Any,
    F: Fn(&Resolved) -> T + 'static,
  {
    let metadata = Metadata {
      dependencies,
      factory: Box::new(move |args| Rc::new(build(args)) as Instance),
    };
    self.bind(key.into(), Record::direct(metadata, lifetime), lifetime)
  }

  fn bind(&self, key: ServiceId, record: Record, lifetime: Lifetime) -> Binding<'_> {
    debug!("registering `{key}` ({lifetime})");
    self.records.borrow_mut().insert(key.clone(), Rc::new(record));
    Binding {
      registry: self,
      key,
      lifetime,
    }
  }

  pub fn contains(&self, key: &str) -> bool {
    self.records.borrow().contains_key(key)
  }

  /// Snapshot of every registered identifier.
  pub fn keys(&self) -> Vec<ServiceId> {
    self.records.borrow().keys().cloned().collect()
  }

  pub(crate) fn record(&self, id: &str) -> Option<Rc<Record>> {
    self.records.borrow().get(id).cloned()
  }

  pub(crate) fn catalog(&self) -> &Catalog {
    &self.catalog
  }

  /// A root provider over this registry. Singletons cached through any
  /// provider of this registry are visible to every other one.
  pub fn create_provider(&self) -> Provider<'_> {
    Provider::new(self, ScopedStore::root(Rc::clone(&self.global)))
  }
}

/// Finalizer returned by every registration.
///
/// Holds the key and lifetime it was created with; [`Binding::apply`]
/// re-registers the key to a value's type and hands the value back, the
/// builder-style equivalent of decorator registration.
pub struct Binding<'r> {
  registry: &'r Registry,
  key: ServiceId,
  lifetime: Lifetime,
}

impl Binding<'_> {
  pub fn key(&self) -> &ServiceId {
    &self.key
  }

  pub fn lifetime(&self) -> Lifetime {
    self.lifetime
  }

  /// Re-registers the binding's key to `T` under the same lifetime and
  /// returns `value` unchanged.
  pub fn apply<T: Injectable>(&self, value: T) -> T {
    self.registry.register_as::<T>(self.key.clone(), self.lifetime);
    value
  }
}
