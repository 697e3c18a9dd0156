use std::cell::Cell;
use std::rc::Rc;

use lattice_ioc::{Injectable, Lifetime, Registry, Resolved, ServiceId};

// A service that gets a unique serial number upon creation.
struct Tracker {
  serial: Cell<u32>,
}

impl Injectable for Tracker {
  fn service_id() -> ServiceId {
    ServiceId::new("demo:tracker")
  }
  fn build(_: &Resolved) -> Self {
    Tracker { serial: Cell::new(0) }
  }
}

fn main() {
  let registry = Registry::new();

  // --- Transient: a fresh instance per resolution ---
  registry.register::<Tracker>(Lifetime::Transient);
  let provider = registry.create_provider();

  let t1 = provider.create_of::<Tracker>().unwrap();
  let t2 = provider.create_of::<Tracker>().unwrap();
  t1.serial.set(41);
  println!("transient: t1={} t2={}", t1.serial.get(), t2.serial.get());
  assert!(!Rc::ptr_eq(&t1, &t2), "transient instances should be distinct");
  assert_eq!(t2.serial.get(), 0);

  // --- Singleton: re-registering the key switches the lifetime ---
  registry.register::<Tracker>(Lifetime::Singleton);

  let s1 = provider.create_of::<Tracker>().unwrap();
  s1.serial.set(7);
  let s2 = provider.create_of::<Tracker>().unwrap();
  println!("singleton: s1={} s2={}", s1.serial.get(), s2.serial.get());
  assert!(Rc::ptr_eq(&s1, &s2), "singleton instances should be identical");

  // Even a completely separate provider shares the singleton.
  let other = registry.create_provider();
  let s3 = other.create_of::<Tracker>().unwrap();
  assert!(Rc::ptr_eq(&s1, &s3));
  assert_eq!(s3.serial.get(), 7);
  println!("singleton survives across providers, serial={}", s3.serial.get());
}
