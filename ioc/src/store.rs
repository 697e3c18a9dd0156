//! The layered instance cache backing singleton and scoped lifetimes.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::ident::ServiceId;
use crate::record::Instance;

pub(crate) type InstanceMap = HashMap<ServiceId, Instance>;
pub(crate) type SharedMap = Rc<RefCell<InstanceMap>>;

/// A three-layer chained cache.
///
/// Reads check the local layer, then walk the parent chain, consulting the
/// shared global layer at the chain's root. Writes land either in the local
/// layer (scoped instances) or the global layer (singletons); the parent
/// layer is read-through only. Removal touches the local layer alone.
///
/// The parent reference is borrowed, so a child store cannot outlive the
/// scope it was created in.
pub struct ScopedStore<'p> {
  global: SharedMap,
  parent: Option<&'p ScopedStore<'p>>,
  local: RefCell<InstanceMap>,
}

impl<'p> ScopedStore<'p> {
  pub(crate) fn root(global: SharedMap) -> Self {
    ScopedStore {
      global,
      parent: None,
      local: RefCell::new(HashMap::new()),
    }
  }

  /// A child store inheriting this store's entries read-through.
  pub(crate) fn child(&self) -> ScopedStore<'_> {
    ScopedStore {
      global: Rc::clone(&self.global),
      parent: Some(self),
      local: RefCell::new(HashMap::new()),
    }
  }

  pub fn contains(&self, id: &ServiceId) -> bool {
    if self.local.borrow().contains_key(id) {
      return true;
    }
    match self.parent {
      Some(parent) => parent.contains(id),
      None => self.global.borrow().contains_key(id),
    }
  }

  pub fn get(&self, id: &ServiceId) -> Option<Instance> {
    if let Some(instance) = self.local.borrow().get(id) {
      return Some(Rc::clone(instance));
    }
    match self.parent {
      Some(parent) => parent.get(id),
      None => self.global.borrow().get(id).map(Rc::clone),
    }
  }

  /// Caches a scoped instance in this store's own layer.
  pub(crate) fn put_local(&self, id: ServiceId, instance: Instance) {
    self.local.borrow_mut().insert(id, instance);
  }

  /// Caches a singleton in the layer shared by every store of the registry.
  pub(crate) fn put_global(&self, id: ServiceId, instance: Instance) {
    self.global.borrow_mut().insert(id, instance);
  }

  /// Drops this store's own cached instance for `id`, if any. Entries in
  /// outer layers are untouched.
  pub fn remove(&self, id: &ServiceId) -> Option<Instance> {
    self.local.borrow_mut().remove(id)
  }

  /// Every cached identifier, outermost layer first. A key cached in more
  /// than one layer appears once per layer that holds it.
  pub fn ids(&self) -> Vec<ServiceId> {
    let mut out = Vec::new();
    self.collect(&mut out);
    out
  }

  fn collect(&self, out: &mut Vec<ServiceId>) {
    match self.parent {
      Some(parent) => parent.collect(out),
      None => out.extend(self.global.borrow().keys().cloned()),
    }
    out.extend(self.local.borrow().keys().cloned());
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
