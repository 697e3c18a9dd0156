//! Canonical service identifiers and the simple-name alias table.

use std::borrow::Borrow;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

/// Canonical identifier of a registered service.
///
/// Conventionally `<namespace>:<name>`; the namespace keeps unrelated
/// registrations with the same bare name apart. An identifier without a
/// `:` is its own simple name.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceId(Box<str>);

impl ServiceId {
  pub fn new(id: impl Into<String>) -> Self {
    ServiceId(id.into().into_boxed_str())
  }

  /// Joins a namespace and a bare name into the canonical form.
  pub fn from_parts(namespace: &str, name: &str) -> Self {
    ServiceId(format!("{namespace}:{name}").into_boxed_str())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  /// The bare name after the last `:`, or the whole identifier when it
  /// carries no namespace.
  pub fn simple_name(&self) -> &str {
    match self.0.rfind(':') {
      Some(split) => &self.0[split + 1..],
      None => &self.0,
    }
  }

  /// Everything before the last `:`, when present.
  pub fn namespace(&self) -> Option<&str> {
    self.0.rfind(':').map(|split| &self.0[..split])
  }

  pub fn is_qualified(&self) -> bool {
    self.0.contains(':')
  }
}

impl fmt::Display for ServiceId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl fmt::Debug for ServiceId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "ServiceId({})", self.0)
  }
}

impl Borrow<str> for ServiceId {
  fn borrow(&self) -> &str {
    &self.0
  }
}

impl From<&str> for ServiceId {
  fn from(id: &str) -> Self {
    ServiceId::new(id)
  }
}

impl From<String> for ServiceId {
  fn from(id: String) -> Self {
    ServiceId::new(id)
  }
}

/// Outcome of simple-name aliasing for one bare name.
pub(crate) enum Alias {
  /// Exactly one canonical identifier carries this simple name.
  Unique(ServiceId),
  /// Two or more identifiers collide on this simple name. The entry stays
  /// tombstoned so a later colliding identifier cannot resurrect it.
  Ambiguous,
}

/// Builds the simple-name lookup table over a set of canonical identifiers.
pub(crate) fn alias_table<'a>(
  keys: impl IntoIterator<Item = &'a ServiceId>,
) -> HashMap<String, Alias> {
  let mut table: HashMap<String, Alias> = HashMap::new();
  for key in keys {
    match table.entry(key.simple_name().to_owned()) {
      Entry::Occupied(mut slot) => {
        slot.insert(Alias::Ambiguous);
      }
      Entry::Vacant(slot) => {
        slot.insert(Alias::Unique(key.clone()));
      }
    }
  }
  table
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn simple_name_takes_the_last_segment() {
    assert_eq!(ServiceId::new("app:db").simple_name(), "db");
    assert_eq!(ServiceId::new("app:sub:db").simple_name(), "db");
    assert_eq!(ServiceId::new("db").simple_name(), "db");
  }

  #[test]
  fn namespace_is_everything_before_the_last_segment() {
    assert_eq!(ServiceId::new("app:sub:db").namespace(), Some("app:sub"));
    assert_eq!(ServiceId::new("db").namespace(), None);
  }

  #[test]
  fn collisions_tombstone_the_alias() {
    let keys = [
      ServiceId::new("a:svc"),
      ServiceId::new("b:svc"),
      ServiceId::new("c:svc"),
      ServiceId::new("a:other"),
    ];
    let table = alias_table(keys.iter());
    assert!(matches!(table.get("svc"), Some(Alias::Ambiguous)));
    assert!(matches!(table.get("other"), Some(Alias::Unique(id)) if id.as_str() == "a:other"));
  }
}
