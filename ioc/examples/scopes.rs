use std::cell::RefCell;

use lattice_ioc::{Injectable, Lifetime, Registry, Resolved, ServiceId};

// Per-request state: one instance per scope, never shared between
// sibling requests.
struct RequestContext {
  user: RefCell<String>,
}

impl Injectable for RequestContext {
  fn service_id() -> ServiceId {
    ServiceId::new("web:request")
  }
  fn build(_: &Resolved) -> Self {
    RequestContext {
      user: RefCell::new("anonymous".to_string()),
    }
  }
}

fn handle_request(registry: &Registry, user: &str) -> String {
  let provider = registry.create_provider();

  // Each request runs inside its own scope. Dropping the scope at the end
  // of this function discards its cache; nothing else happens on exit.
  let scope = provider.scope();

  let context = scope.create_of::<RequestContext>().unwrap();
  context.user.replace(user.to_string());

  // Deeper layers of the handler see the same request context.
  let again = scope.create_of::<RequestContext>().unwrap();
  format!("handled request for {}", again.user.borrow())
}

fn main() {
  let registry = Registry::new();
  registry.register::<RequestContext>(Lifetime::Scoped);

  let first = handle_request(&registry, "alice");
  let second = handle_request(&registry, "bob");

  println!("{first}");
  println!("{second}");
  assert_eq!(first, "handled request for alice");
  assert_eq!(second, "handled request for bob");
}
