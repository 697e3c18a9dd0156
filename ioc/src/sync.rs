//! Thread-safe variant of the container.
//!
//! Mirrors the single-threaded API over `Arc`, concurrent maps, and sync
//! once-cells. Registries and providers here are `Send + Sync`; factories
//! and instances must be too. Observable ordering and caching semantics
//! match the single-threaded API when used from one thread.
//!
//! Singleton construction is latched per record, so a singleton factory
//! runs at most once even when several threads resolve it concurrently.
//! Cycle detection is tracked per thread: resolutions running on different
//! threads never see each other as re-entrant.

use std::any::{self, Any};
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use dashmap::DashMap;
use log::{debug, trace};
use once_cell::sync::OnceCell;

use crate::error::{Error, Result};
use crate::ident::{self, Alias, ServiceId};
use crate::record::{Dependency, Lifetime};

/// A resolved service instance, dynamically typed.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// Instance-producing function invoked with the resolved dependencies.
pub type Factory = Box<dyn Fn(&Resolved) -> Instance + Send + Sync>;

thread_local! {
  // Identifiers being resolved on this thread; the cycle guard's backing
  // storage. Thread-local so concurrent resolution of one identifier on
  // two threads is not mistaken for a cycle.
  static RESOLVING: RefCell<Vec<ServiceId>> = RefCell::new(Vec::new());
}

/// Resolved dependencies handed to a factory, keyed by parameter name.
#[derive(Default)]
pub struct Resolved {
  values: HashMap<&'static str, Instance>,
}

impl Resolved {
  fn with_capacity(n: usize) -> Self {
    Resolved {
      values: HashMap::with_capacity(n),
    }
  }

  fn insert(&mut self, param: &'static str, instance: Instance) {
    self.values.insert(param, instance);
  }

  /// Typed accessor for one resolved dependency.
  ///
  /// # Panics
  ///
  /// Panics when nothing was resolved under `param`, or when the resolved
  /// instance is of a different type.
  pub fn get<T: Any + Send + Sync>(&self, param: &str) -> Arc<T> {
    let instance = self
      .values
      .get(param)
      .unwrap_or_else(|| panic!("no dependency resolved for parameter `{param}`"));
    Arc::clone(instance)
      .downcast::<T>()
      .unwrap_or_else(|_| panic!("dependency `{param}` is not a `{}`", any::type_name::<T>()))
  }

  /// Untyped accessor; `None` when the parameter is absent.
  pub fn instance(&self, param: &str) -> Option<&Instance> {
    self.values.get(param)
  }
}

/// A constructible the thread-safe container can build and wire.
pub trait Injectable: Any + Send + Sync + Sized {
  /// Canonical `namespace:name` identifier of this type.
  fn service_id() -> ServiceId;

  /// Ordered constructor-parameter table.
  fn dependencies() -> Vec<Dependency> {
    Vec::new()
  }

  /// Builds an instance from the resolved dependency set.
  fn build(args: &Resolved) -> Self;
}

struct Metadata {
  dependencies: Vec<Dependency>,
  factory: Factory,
}

impl Metadata {
  fn of<T: Injectable>() -> Self {
    Metadata {
      dependencies: T::dependencies(),
      factory: Box::new(|args| Arc::new(T::build(args)) as Instance),
    }
  }
}

enum Source {
  Deferred(ServiceId),
  Direct,
}

struct Record {
  lifetime: Lifetime,
  source: Source,
  cell: OnceCell<Metadata>,
  // Build latch for singleton instances: makes the factory run at most
  // once per record under concurrent resolution.
  singleton: OnceCell<Instance>,
}

impl Record {
  fn deferred(target: ServiceId, lifetime: Lifetime) -> Self {
    Record {
      lifetime,
      source: Source::Deferred(target),
      cell: OnceCell::new(),
      singleton: OnceCell::new(),
    }
  }

  fn direct(metadata: Metadata, lifetime: Lifetime) -> Self {
    Record {
      lifetime,
      source: Source::Direct,
      cell: OnceCell::with_value(metadata),
      singleton: OnceCell::new(),
    }
  }

  fn metadata(&self, catalog: &Catalog) -> Result<&Metadata> {
    self.cell.get_or_try_init(|| match &self.source {
      Source::Deferred(target) => catalog.load(target),
      // Direct records pre-fill the cell at registration.
      Source::Direct => unreachable!("direct records are initialized at registration"),
    })
  }
}

#[derive(Default)]
struct Catalog {
  entries: DashMap<ServiceId, Arc<dyn Fn() -> Metadata + Send + Sync>>,
}

impl Catalog {
  fn declare<T: Injectable>(&self) {
    self
      .entries
      .insert(T::service_id(), Arc::new(|| Metadata::of::<T>()));
  }

  fn load(&self, id: &ServiceId) -> Result<Metadata> {
    let entry = self
      .entries
      .get(id)
      .map(|entry| Arc::clone(entry.value()))
      .ok_or_else(|| Error::UnknownType(id.clone()))?;
    Ok(entry())
  }
}

type SharedMap = Arc<DashMap<ServiceId, Instance>>;

/// The thread-safe rendition of the layered instance cache.
///
/// Same layering contract as the single-threaded store: reads check local,
/// then the parent chain, then the shared global layer at the chain root;
/// removal is local-only; iteration walks outer layers first.
pub struct ScopedStore<'p> {
  global: SharedMap,
  parent: Option<&'p ScopedStore<'p>>,
  local: DashMap<ServiceId, Instance>,
}

impl<'p> ScopedStore<'p> {
  fn root(global: SharedMap) -> Self {
    ScopedStore {
      global,
      parent: None,
      local: DashMap::new(),
    }
  }

  fn child(&self) -> ScopedStore<'_> {
    ScopedStore {
      global: Arc::clone(&self.global),
      parent: Some(self),
      local: DashMap::new(),
    }
  }

  pub fn contains(&self, id: &ServiceId) -> bool {
    if self.local.contains_key(id) {
      return true;
    }
    match self.parent {
      Some(parent) => parent.contains(id),
      None => self.global.contains_key(id),
    }
  }

  pub fn get(&self, id: &ServiceId) -> Option<Instance> {
    if let Some(instance) = self.local.get(id) {
      return Some(Arc::clone(instance.value()));
    }
    match self.parent {
      Some(parent) => parent.get(id),
      None => self.global.get(id).map(|instance| Arc::clone(instance.value())),
    }
  }

  fn put_global(&self, id: ServiceId, instance: Instance) {
    self.global.insert(id, instance);
  }

  // First writer wins: concurrent scoped builds of one identifier converge
  // on a single cached instance.
  fn put_local_or_existing(&self, id: ServiceId, instance: Instance) -> Instance {
    self.local.entry(id).or_insert(instance).clone()
  }

  /// Drops this store's own cached instance for `id`, if any.
  pub fn remove(&self, id: &ServiceId) -> Option<Instance> {
    self.local.remove(id).map(|(_, instance)| instance)
  }

  /// Every cached identifier, outermost layer first.
  pub fn ids(&self) -> Vec<ServiceId> {
    let mut out = Vec::new();
    self.collect(&mut out);
    out
  }

  fn collect(&self, out: &mut Vec<ServiceId>) {
    match self.parent {
      Some(parent) => parent.collect(out),
      None => out.extend(self.global.iter().map(|entry| entry.key().clone())),
    }
    out.extend(self.local.iter().map(|entry| entry.key().clone()));
  }

  /// Number of cached entries across all layers, counting shadowed keys
  /// once per layer.
  pub fn len(&self) -> usize {
    self.ids().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

/// Thread-safe registry: canonical identifier to record.
///
/// Registration and resolution may happen concurrently from any number of
/// threads. Re-registering a key overwrites the previous record.
#[derive(Default)]
pub struct Registry {
  records: DashMap<ServiceId, Arc<Record>>,
  catalog: Catalog,
  global: SharedMap,
}

impl Registry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Declares `T` loadable by identifier without registering it.
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

  /// Registers `key` as a deferred reference to another identifier.
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
    T: Any + Send + Sync,
    F: Fn(&Resolved) -> T + Send + Sync + 'static,
  {
    let metadata = Metadata {
      dependencies,
      factory: Box::new(move |args| Arc::new(build(args)) as Instance),
    };
    self.bind(key.into(), Record::direct(metadata, lifetime), lifetime)
  }

  fn bind(&self, key: ServiceId, record: Record, lifetime: Lifetime) -> Binding<'_> {
    debug!("registering `{key}` ({lifetime})");
    self.records.insert(key.clone(), Arc::new(record));
    Binding {
      registry: self,
      key,
      lifetime,
    }
  }

  pub fn contains(&self, key: &str) -> bool {
    self.records.contains_key(key)
  }

  /// Snapshot of every registered identifier.
  pub fn keys(&self) -> Vec<ServiceId> {
    self.records.iter().map(|entry| entry.key().clone()).collect()
  }

  fn record(&self, id: &str) -> Option<Arc<Record>> {
    self.records.get(id).map(|entry| Arc::clone(entry.value()))
  }

  /// A root provider over this registry.
  pub fn create_provider(&self) -> Provider<'_> {
    Provider::new(self, ScopedStore::root(Arc::clone(&self.global)))
  }
}

/// Finalizer returned by every registration; see the single-threaded
/// [`Binding`](crate::Binding).
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

/// Thread-safe resolver; see the single-threaded
/// [`Provider`](crate::Provider) for the resolution contract.
pub struct Provider<'s> {
  registry: &'s Registry,
  store: ScopedStore<'s>,
  aliases: HashMap<String, Alias>,
}

impl<'s> Provider<'s> {
  fn new(registry: &'s Registry, store: ScopedStore<'s>) -> Self {
    let keys = registry.keys();
    Provider {
      registry,
      store,
      aliases: ident::alias_table(keys.iter()),
    }
  }

  /// Builds the service registered under `key`.
  pub fn create(&self, key: &str) -> Result<Instance> {
    let (id, record) = self.lookup(key)?;
    self.instantiate(id, &record)
  }

  /// Builds the service registered under `key` and downcasts it to `T`.
  pub fn create_as<T: Any + Send + Sync>(&self, key: &str) -> Result<Arc<T>> {
    let (id, record) = self.lookup(key)?;
    let instance = self.instantiate(id.clone(), &record)?;
    instance.downcast::<T>().map_err(|_| Error::TypeMismatch(id))
  }

  /// Builds `T` by its own canonical identifier.
  pub fn create_of<T: Injectable>(&self) -> Result<Arc<T>> {
    self.create_as::<T>(T::service_id().as_str())
  }

  /// A child provider whose store inherits this provider's entries
  /// read-through.
  pub fn scope(&self) -> Provider<'_> {
    Provider::new(self.registry, self.store.child())
  }

  /// Read access to this provider's store.
  pub fn store(&self) -> &ScopedStore<'s> {
    &self.store
  }

  fn lookup(&self, key: &str) -> Result<(ServiceId, Arc<Record>)> {
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
    if record.lifetime.is_cached() {
      if let Some(instance) = self.store.get(&id) {
        trace!("cache hit for `{id}`");
        return Ok(instance);
      }
    }

    let _guard = ResolutionGuard::enter(&id)?;

    let metadata = record.metadata(&self.registry.catalog)?;
    trace!("building `{id}`");
    let build = || -> Result<Instance> {
      let mut args = Resolved::with_capacity(metadata.dependencies.len());
      for dependency in &metadata.dependencies {
        args.insert(dependency.param, self.create(dependency.id.as_str())?);
      }
      Ok((metadata.factory)(&args))
    };

    match record.lifetime {
      Lifetime::Singleton => {
        let instance = Arc::clone(record.singleton.get_or_try_init(build)?);
        self.store.put_global(id, Arc::clone(&instance));
        Ok(instance)
      }
      Lifetime::Scoped => {
        let instance = build()?;
        Ok(self.store.put_local_or_existing(id, instance))
      }
      Lifetime::Transient => build(),
    }
  }
}

struct ResolutionGuard;

impl ResolutionGuard {
  fn enter(id: &ServiceId) -> Result<Self> {
    RESOLVING.with(|stack| {
      let mut resolving = stack.borrow_mut();
      if resolving.contains(id) {
        return Err(Error::CircularDependency(id.clone()));
      }
      resolving.push(id.clone());
      Ok(ResolutionGuard)
    })
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLVING.with(|stack| {
      stack.borrow_mut().pop();
    });
  }
}
