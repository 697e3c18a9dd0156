//! The declared-constructible table.
//!
//! A deferred registration holds nothing but a canonical identifier; at
//! first use that identifier has to be turned into a dependency table and a
//! factory. The catalog is the table that lookup consults, standing in for
//! a language runtime's module loader.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::{Error, Result};
use crate::ident::ServiceId;
use crate::record::{Injectable, Metadata};

type Entry = Rc<dyn Fn() -> Metadata>;

/// Maps canonical identifiers to metadata constructors for every declared
/// constructible.
#[derive(Default)]
pub(crate) struct Catalog {
  entries: RefCell<HashMap<ServiceId, Entry>>,
}

impl Catalog {
  /// Declares `T` loadable under its canonical identifier. Re-declaring
  /// overwrites the previous entry.
  pub(crate) fn declare<T: Injectable>(&self) {
    self
      .entries
      .borrow_mut()
      .insert(T::service_id(), Rc::new(|| Metadata::of::<T>()));
  }

  /// Produces the metadata declared under `id`.
  pub(crate) fn load(&self, id: &ServiceId) -> Result<Metadata> {
    let entry = self
      .entries
      .borrow()
      .get(id)
      .cloned()
      .ok_or_else(|| Error::UnknownType(id.clone()))?;
    Ok(entry())
  }
}
