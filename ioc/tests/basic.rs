use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use lattice_ioc::{deps, Error, Injectable, Lifetime, Registry, Resolved, ServiceId};
use pretty_assertions::assert_eq;

// --- Test Fixtures ---

struct Settings {
  greeting: &'static str,
}

impl Injectable for Settings {
  fn service_id() -> ServiceId {
    ServiceId::new("app:settings")
  }
  fn build(_: &Resolved) -> Self {
    Settings { greeting: "ok" }
  }
}

// A service with interior mutability, for observing instance sharing.
struct Counter {
  hits: RefCell<u32>,
}

impl Counter {
  fn bump(&self) -> u32 {
    let mut hits = self.hits.borrow_mut();
    *hits += 1;
    *hits
  }
}

impl Injectable for Counter {
  fn service_id() -> ServiceId {
    ServiceId::new("app:counter")
  }
  fn build(_: &Resolved) -> Self {
    Counter {
      hits: RefCell::new(0),
    }
  }
}

// --- Basic Tests ---

#[test]
fn resolves_by_id_by_type_and_by_simple_name() {
  // Arrange
  let registry = Registry::new();
  registry.register::<Settings>(Lifetime::Transient);
  let provider = registry.create_provider();

  // Act
  let by_id = provider.create_as::<Settings>("app:settings").unwrap();
  let by_type = provider.create_of::<Settings>().unwrap();
  let by_name = provider.create_as::<Settings>("settings").unwrap();

  // Assert
  assert_eq!(by_id.greeting, "ok");
  assert_eq!(by_type.greeting, "ok");
  assert_eq!(by_name.greeting, "ok");
}

#[test]
fn factory_receives_declared_dependencies() {
  // Arrange
  let registry = Registry::new();
  registry.register::<Settings>(Lifetime::Transient);
  registry.register_factory(
    "app:report",
    deps! { settings: "app:settings" },
    |args: &Resolved| {
      let settings = args.get::<Settings>("settings");
      let mut report = HashMap::new();
      report.insert("result".to_string(), settings.greeting.to_string());
      report
    },
    Lifetime::Transient,
  );
  let provider = registry.create_provider();

  // Act
  let report = provider
    .create_as::<HashMap<String, String>>("app:report")
    .unwrap();

  // Assert
  assert_eq!(report.get("result"), Some(&"ok".to_string()));
}

#[test]
fn transient_instances_do_not_share_state() {
  // Arrange
  let registry = Registry::new();
  registry.register::<Counter>(Lifetime::Transient);
  let provider = registry.create_provider();

  // Act
  let first = provider.create_of::<Counter>().unwrap();
  first.bump();
  let second = provider.create_of::<Counter>().unwrap();

  // Assert
  assert!(!Rc::ptr_eq(&first, &second));
  assert_eq!(*first.hits.borrow(), 1);
  assert_eq!(*second.hits.borrow(), 0);
}

#[test]
fn singleton_is_shared_across_providers() {
  // Arrange
  let registry = Registry::new();
  registry.register::<Counter>(Lifetime::Singleton);

  // Act
  let provider = registry.create_provider();
  let first = provider.create_of::<Counter>().unwrap();
  first.bump();
  let second = provider.create_of::<Counter>().unwrap();

  // A wholly independent provider over the same registry.
  let other = registry.create_provider();
  let third = other.create_of::<Counter>().unwrap();

  // Assert
  assert!(Rc::ptr_eq(&first, &second));
  assert!(Rc::ptr_eq(&first, &third));
  // The mutation made through the first handle is visible everywhere.
  assert_eq!(third.bump(), 2);
}

#[test]
fn re_registration_overwrites_the_record() {
  // Arrange
  let registry = Registry::new();
  registry.register_factory(
    "app:value",
    deps! {},
    |_: &Resolved| String::from("first"),
    Lifetime::Transient,
  );
  let provider = registry.create_provider();
  assert_eq!(*provider.create_as::<String>("app:value").unwrap(), "first");

  // Act: overwrite with a new factory under the same key.
  registry.register_factory(
    "app:value",
    deps! {},
    |_: &Resolved| String::from("second"),
    Lifetime::Transient,
  );

  // Assert: record lookup is live, so even the existing provider sees the
  // replacement (only the alias table is snapshotted).
  assert_eq!(*provider.create_as::<String>("app:value").unwrap(), "second");
}

#[test]
fn unknown_identifier_is_reported() {
  let registry = Registry::new();
  let provider = registry.create_provider();

  let err = provider.create("app:missing").unwrap_err();
  assert_eq!(err, Error::UnknownId(ServiceId::new("app:missing")));
}

#[test]
fn ambiguous_simple_name_is_reported() {
  // Arrange: two registrations colliding on the simple name `store`.
  let registry = Registry::new();
  registry.register_factory("app:store", deps! {}, |_: &Resolved| 1_u32, Lifetime::Transient);
  registry.register_factory("cache:store", deps! {}, |_: &Resolved| 2_u32, Lifetime::Transient);
  let provider = registry.create_provider();

  // Act & Assert
  let err = provider.create("store").unwrap_err();
  assert_eq!(err, Error::AmbiguousName("store".to_string()));

  // The canonical forms still resolve.
  assert_eq!(*provider.create_as::<u32>("app:store").unwrap(), 1);
  assert_eq!(*provider.create_as::<u32>("cache:store").unwrap(), 2);
}

#[test]
fn a_third_collision_does_not_restore_the_alias() {
  let registry = Registry::new();
  registry.register_factory("a:svc", deps! {}, |_: &Resolved| 1_u8, Lifetime::Transient);
  registry.register_factory("b:svc", deps! {}, |_: &Resolved| 2_u8, Lifetime::Transient);
  registry.register_factory("c:svc", deps! {}, |_: &Resolved| 3_u8, Lifetime::Transient);
  let provider = registry.create_provider();

  assert!(matches!(provider.create("svc"), Err(Error::AmbiguousName(_))));
}

#[test]
fn reference_registration_builds_the_declared_target() {
  // Arrange: `app:settings` is declared loadable but never registered.
  let registry = Registry::new();
  registry.declare::<Settings>();
  registry.register_ref("app:legacy", "app:settings", Lifetime::Singleton);
  let provider = registry.create_provider();

  // Act
  let first = provider.create_as::<Settings>("app:legacy").unwrap();
  let second = provider.create_as::<Settings>("app:legacy").unwrap();

  // Assert: built from the declared target, cached under the registration
  // key with the registration's lifetime.
  assert_eq!(first.greeting, "ok");
  assert!(Rc::ptr_eq(&first, &second));
  // The target itself was never registered.
  assert!(matches!(
    provider.create("app:settings"),
    Err(Error::UnknownId(_))
  ));
}

#[test]
fn deferred_targets_must_be_declared() {
  let registry = Registry::new();
  registry.register_ref("app:legacy", "app:nowhere", Lifetime::Transient);
  let provider = registry.create_provider();

  let err = provider.create("app:legacy").unwrap_err();
  assert_eq!(err, Error::UnknownType(ServiceId::new("app:nowhere")));
}

#[test]
fn binding_reapplies_the_registration() {
  // Arrange: a placeholder registration to be finalized later.
  let registry = Registry::new();
  let binding = registry.register_factory(
    "app:widget",
    deps! {},
    |_: &Resolved| 0_u8,
    Lifetime::Singleton,
  );
  assert_eq!(binding.key().as_str(), "app:widget");
  assert_eq!(binding.lifetime(), Lifetime::Singleton);

  // Act: applying a value re-registers the key to the value's type under
  // the same lifetime and passes the value through unchanged.
  let settings = binding.apply(Settings { greeting: "ok" });
  assert_eq!(settings.greeting, "ok");

  // Assert
  let provider = registry.create_provider();
  let widget = provider.create_as::<Settings>("app:widget").unwrap();
  assert_eq!(widget.greeting, "ok");
}

#[test]
fn typed_resolution_checks_the_instance_type() {
  let registry = Registry::new();
  registry.register_factory("app:number", deps! {}, |_: &Resolved| 7_u32, Lifetime::Transient);
  let provider = registry.create_provider();

  let err = provider.create_as::<String>("app:number").unwrap_err();
  assert_eq!(err, Error::TypeMismatch(ServiceId::new("app:number")));
}
