use std::thread;

use lattice_ioc::sync::{Injectable, Resolved};
use lattice_ioc::{global, resolve, Lifetime, ServiceId};

// A singleton registered once at startup and resolved from worker threads.
struct Settings {
  workers: usize,
}

impl Injectable for Settings {
  fn service_id() -> ServiceId {
    ServiceId::new("app:settings")
  }
  fn build(_: &Resolved) -> Self {
    println!("building Settings once");
    Settings { workers: 4 }
  }
}

fn main() {
  global().register::<Settings>(Lifetime::Singleton);

  let settings = resolve!(global().create_provider(), Settings);

  thread::scope(|s| {
    for worker in 0..settings.workers {
      s.spawn(move || {
        // Every thread gets the same underlying instance.
        let provider = global().create_provider();
        let shared = resolve!(provider, Settings);
        println!("worker {worker} sees {} workers", shared.workers);
        assert_eq!(shared.workers, 4);
      });
    }
  });
}
