pub mod memory;
pub mod sweep;

pub use memory::InMemoryRevocationStore;
pub use sweep::spawn_revocation_sweep;
