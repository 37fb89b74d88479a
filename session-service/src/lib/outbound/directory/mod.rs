pub mod memory;
pub mod postgres;

pub use memory::InMemoryUserDirectory;
pub use postgres::PostgresUserDirectory;
