//! Graph resolution.
//!
//! The provider walks dependency tables depth-first, builds instances
//! through record factories, and caches them per lifetime. Dependency
//! cycles are caught by an RAII guard over the set of identifiers
//! currently being resolved.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::trace;

use crate::error::{Error, Result};
use crate::ident::{self, Alias, ServiceId};
use crate::record::{Injectable, Instance, Lifetime, Record, Resolved};
use crate::registry::Registry;
use crate::store::ScopedStore;

/// The resolution half of the container.
///
/// A provider borrows its registry and owns one [`ScopedStore`]. The
/// simple-name alias table is snapshotted from the registry's keys when
/// the provider is constructed; identifiers registered afterwards resolve
/// by their canonical form only, until a new provider (or scope) is
/// created.
pub struct Provider<'s> {
  registry: &'s Registry,
  store: ScopedStore<'s>,
  aliases: HashMap<String, Alias>,
  resolving: RefCell<Vec<ServiceId>>,
}

impl<'s> Provider<'s> {
  pub(crate) fn new(registry: &'s Registry, store: ScopedStore<'s>) -> Self {
    let keys = registry.keys();
    Provider {
      registry,
      store,
      aliases: ident::alias_table(keys.iter()),
      resolving: RefCell::new(Vec::new()),
    }
  }

  /// Builds the service registered under `key`.
  ///
  /// `key` is a canonical identifier or an unambiguous simple name.
  /// Depending on the registration's lifetime the result is freshly built
  /// or served from the scoped store.
  pub fn create(&self, key: &str) -> Result<Instance> {
    let (id, record) = self.lookup(key)?;
    self.instantiate(id, &record)
  }

  /// Builds the service registered under `key` and downcasts it to `T`.
  pub fn create_as<T: Any>(&self, key: &str) -> Result<Rc<T>> {
    let (id, record) = self.lookup(key)?;
    let instance = self.instantiate(id.clone(), &record)?;
    instance.downcast::<T>().map_err(|_| Error::TypeMismatch(id))
  }

  /// Builds `T` by its own canonical identifier.
  pub fn create_of<T: Injectable>(&self) -> Result<Rc<T>> {
    self.create_as::<T>(T::service_id().as_str())
  }

  /// A child provider whose store inherits this provider's entries
  /// read-through.
  ///
  /// Scoped instances cached inside the child never become visible here;
  /// singletons go to the shared global layer as usual. The child is a
  /// plain value; dropping it ends the scope, and no cleanup or disposal
  /// runs.
  pub fn scope(&self) -> Provider<'_> {
    Provider::new(self.registry, self.store.child())
  }

  /// Read access to this provider's store.
  pub fn store(&self) -> &ScopedStore<'s> {
    &self.store
  }

  /// Unambiguous simple names are replaced by their canonical form; all
  /// other strings are treated as canonical identifiers.
  fn lookup(&self, key: &str) -> Result<(ServiceId, Rc<Record>)> {
    let id = match self.aliases.get(key) {
      Some(Alias::Unique(canonical)) => canonical.clone(),
      _ => ServiceId::new(key),
    };
    match self.registry.record(id.as_str()) {
      Some(record) => Ok((id, record)),
      None => match self.aliases.get(key) {
        Some(Alias::Ambiguous) => Err(Error::AmbiguousName(key.to_owned())),
        _ => Err(Error::UnknownId(id)),
      },
    }
  }

  fn instantiate(&self, id: ServiceId, record: &Record) -> Result<Instance> {
    if record.lifetime().is_cached() {
      if let Some(instance) = self.store.get(&id) {
        trace!("cache hit for `{id}`");
        return Ok(instance);
      }
    }

    let _guard = ResolutionGuard::enter(&self.resolving, &id)?;

    let metadata = record.metadata(self.registry.catalog())?;
    trace!("building `{id}`");
    let mut args = Resolved::with_capacity(metadata.dependencies.len());
    for dependency in &metadata.dependencies {
      // Recursion re-enters `create`, so dependency tables may reference
      // unambiguous simple names as well as canonical identifiers.
      args.insert(dependency.param, self.create(dependency.id.as_str())?);
    }
    let instance = (metadata.factory)(&args);

    match record.lifetime() {
      Lifetime::Singleton => self.store.put_global(id, Rc::clone(&instance)),
      Lifetime::Scoped => self.store.put_local(id, Rc::clone(&instance)),
      Lifetime::Transient => {}
    }
    Ok(instance)
  }
}

/// RAII marker for identifiers currently being resolved.
///
/// Entering twice without leaving means the dependency graph loops back on
/// itself; the second entry reports the cycle instead of recursing until
/// the stack is exhausted.
struct ResolutionGuard<'a> {
  stack: &'a RefCell<Vec<ServiceId>>,
}

impl<'a> ResolutionGuard<'a> {
  fn enter(stack: &'a RefCell<Vec<ServiceId>>, id: &ServiceId) -> Result<Self> {
    let mut resolving = stack.borrow_mut();
    if resolving.contains(id) {
      return Err(Error::CircularDependency(id.clone()));
    }
    resolving.push(id.clone());
    Ok(ResolutionGuard { stack })
  }
}

impl Drop for ResolutionGuard<'_> {
  fn drop(&mut self) {
    self.stack.borrow_mut().pop();
  }
}
