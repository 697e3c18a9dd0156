use std::rc::Rc;

use lattice_ioc::{deps, resolve, Dependency, Injectable, Lifetime, Registry, Resolved, ServiceId};

// Application configuration, shared by everything that needs it.
struct Config {
  database_url: String,
}

impl Injectable for Config {
  fn service_id() -> ServiceId {
    ServiceId::new("app:config")
  }
  fn build(_: &Resolved) -> Self {
    Config {
      database_url: "postgres://localhost/app".to_string(),
    }
  }
}

struct Database {
  url: String,
}

impl Injectable for Database {
  fn service_id() -> ServiceId {
    ServiceId::new("app:database")
  }
  fn dependencies() -> Vec<Dependency> {
    deps! { config: "app:config" }
  }
  fn build(args: &Resolved) -> Self {
    let config = args.get::<Config>("config");
    Database {
      url: config.database_url.clone(),
    }
  }
}

struct UserRepository {
  db: Rc<Database>,
}

impl Injectable for UserRepository {
  fn service_id() -> ServiceId {
    ServiceId::new("app:users")
  }
  fn dependencies() -> Vec<Dependency> {
    deps! { db: "app:database" }
  }
  fn build(args: &Resolved) -> Self {
    UserRepository {
      db: args.get::<Database>("db"),
    }
  }
}

fn main() {
  let registry = Registry::new();
  registry.register::<Config>(Lifetime::Singleton);
  registry.register::<Database>(Lifetime::Singleton);
  registry.register::<UserRepository>(Lifetime::Transient);

  let provider = registry.create_provider();

  // The whole chain is wired from the dependency tables.
  let users = resolve!(provider, UserRepository);
  println!("repository talks to {}", users.db.url);
  assert_eq!(users.db.url, "postgres://localhost/app");

  // Simple names resolve too, as long as they are unambiguous.
  let db = provider.create_as::<Database>("database").unwrap();
  println!("resolved by simple name: {}", db.url);
  assert!(Rc::ptr_eq(&db, &users.db));
}
