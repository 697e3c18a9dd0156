use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use lattice_ioc::sync::{Injectable, Registry, Resolved};
use lattice_ioc::{global, resolve, Lifetime, ServiceId};
use pretty_assertions::assert_eq;

// --- Test Fixtures ---

static POOL_BUILDS: AtomicUsize = AtomicUsize::new(0);

struct ConnectionPool {
  size: usize,
}

impl Injectable for ConnectionPool {
  fn service_id() -> ServiceId {
    ServiceId::new("app:pool")
  }
  fn build(_: &Resolved) -> Self {
    POOL_BUILDS.fetch_add(1, Ordering::SeqCst);
    // Widen the race window: without the per-record latch, several
    // threads would get through the cache miss together.
    thread::sleep(Duration::from_millis(20));
    ConnectionPool { size: 8 }
  }
}

struct Session {
  user: Mutex<String>,
}

impl Injectable for Session {
  fn service_id() -> ServiceId {
    ServiceId::new("app:session")
  }
  fn build(_: &Resolved) -> Self {
    Session {
      user: Mutex::new(String::new()),
    }
  }
}

// --- Thread-Safety Tests ---

#[test]
fn singleton_factory_runs_once_under_concurrent_resolution() {
  // Arrange
  let registry = Registry::new();
  registry.register::<ConnectionPool>(Lifetime::Singleton);

  // Act: many threads, each with its own provider over the registry.
  thread::scope(|s| {
    for _ in 0..16 {
      s.spawn(|| {
        let provider = registry.create_provider();
        let pool = provider.create_of::<ConnectionPool>().unwrap();
        assert_eq!(pool.size, 8);
      });
    }
  });

  // Assert
  assert_eq!(POOL_BUILDS.load(Ordering::SeqCst), 1);

  // And a resolution after the fact still serves the cached instance.
  let provider = registry.create_provider();
  provider.create_of::<ConnectionPool>().unwrap();
  assert_eq!(POOL_BUILDS.load(Ordering::SeqCst), 1);
}

#[test]
fn transients_are_fresh_per_resolution_and_per_thread() {
  // Arrange
  let registry = Registry::new();
  registry.register::<Session>(Lifetime::Transient);

  // Act & Assert: same thread, distinct instances.
  let provider = registry.create_provider();
  let a = provider.create_of::<Session>().unwrap();
  let b = provider.create_of::<Session>().unwrap();
  assert!(!Arc::ptr_eq(&a, &b));

  // Concurrent resolution of the same identifier is not a cycle: the
  // guard's state is thread-local.
  thread::scope(|s| {
    for _ in 0..8 {
      s.spawn(|| {
        let provider = registry.create_provider();
        provider.create_of::<Session>().unwrap();
      });
    }
  });
}

#[test]
fn scoped_instances_are_isolated_between_sibling_scopes() {
  // Arrange
  let registry = Registry::new();
  registry.register::<Session>(Lifetime::Scoped);
  let root = registry.create_provider();

  // Act
  let request = root.scope();
  let a = request.create_of::<Session>().unwrap();
  *a.user.lock().unwrap() = "alice".to_string();

  let b = request.create_of::<Session>().unwrap();
  let nested = request.scope().create_of::<Session>().unwrap();
  let sibling = root.scope().create_of::<Session>().unwrap();

  // Assert
  assert!(Arc::ptr_eq(&a, &b));
  assert!(Arc::ptr_eq(&a, &nested));
  assert!(!Arc::ptr_eq(&a, &sibling));
  assert_eq!(*sibling.user.lock().unwrap(), "");
}

#[test]
fn global_registry_is_shared_between_threads() {
  struct Motd(&'static str);

  impl Injectable for Motd {
    fn service_id() -> ServiceId {
      // Unique namespace: the global registry is shared test-wide.
      ServiceId::new("sync_test:motd")
    }
    fn build(_: &Resolved) -> Self {
      Motd("hello")
    }
  }

  // Arrange: register on the main thread.
  global().register::<Motd>(Lifetime::Singleton);

  // Act: resolve from another thread.
  let resolved = thread::spawn(|| {
    let provider = global().create_provider();
    resolve!(provider, Motd).0
  })
  .join()
  .unwrap();

  // Assert
  assert_eq!(resolved, "hello");
}
