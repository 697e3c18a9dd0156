//! # Lattice IoC
//!
//! A dynamic, lifetime-aware dependency injection container.
//!
//! Services are registered in a [`Registry`] under canonical
//! `namespace:name` identifiers, then built by a [`Provider`], which
//! resolves each registration's declared dependencies recursively and
//! caches instances according to their [`Lifetime`]:
//!
//! - [`Lifetime::Transient`]: a fresh instance per resolution.
//! - [`Lifetime::Singleton`]: one instance per registry, shared by every
//!   provider derived from it.
//! - [`Lifetime::Scoped`]: one instance per provider scope; child scopes
//!   created with [`Provider::scope`] read through to their parents.
//!
//! A bare simple name (the part after the last `:`) resolves too, as long
//! as exactly one registration carries it.
//!
//! The default API is single-threaded. Enabling the `sync` feature adds a
//! thread-safe mirror under [`sync`] along with the process-global
//! registry accessor `global()`.
//!
//! ## Quick Start
//!
//! ```
//! use lattice_ioc::{deps, resolve, Injectable, Lifetime, Registry, Resolved, ServiceId};
//!
//! struct Config {
//!   url: String,
//! }
//!
//! impl Injectable for Config {
//!   fn service_id() -> ServiceId {
//!     ServiceId::new("app:config")
//!   }
//!   fn build(_: &Resolved) -> Self {
//!     Config { url: "postgres://localhost".into() }
//!   }
//! }
//!
//! struct Database {
//!   url: String,
//! }
//!
//! impl Injectable for Database {
//!   fn service_id() -> ServiceId {
//!     ServiceId::new("app:database")
//!   }
//!   fn dependencies() -> Vec<lattice_ioc::Dependency> {
//!     deps! { config: "app:config" }
//!   }
//!   fn build(args: &Resolved) -> Self {
//!     let config = args.get::<Config>("config");
//!     Database { url: config.url.clone() }
//!   }
//! }
//!
//! let registry = Registry::new();
//! registry.register::<Config>(Lifetime::Singleton);
//! registry.register::<Database>(Lifetime::Transient);
//!
//! let provider = registry.create_provider();
//! let db = resolve!(provider, Database);
//! assert_eq!(db.url, "postgres://localhost");
//!
//! // Simple names work while unambiguous.
//! let db2 = provider.create_as::<Database>("database").unwrap();
//! assert_eq!(db2.url, db.url);
//! ```
//!
//! Dependency cycles are reported as [`Error::CircularDependency`] rather
//! than recursing until the stack is exhausted. There is no disposal
//! contract: dropping a provider drops its scope's cache and nothing else.

mod catalog;
mod error;
mod ident;
mod macros;
mod provider;
mod record;
mod registry;
mod store;

#[cfg(feature = "sync")]
mod global;
#[cfg(feature = "sync")]
pub mod sync;

pub use error::{Error, Result};
#[cfg(feature = "sync")]
pub use global::global;
pub use ident::ServiceId;
pub use provider::Provider;
pub use record::{Dependency, Injectable, Instance, Lifetime, Resolved};
pub use registry::{Binding, Registry};
pub use store::ScopedStore;
