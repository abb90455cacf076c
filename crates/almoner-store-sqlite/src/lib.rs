//! SQLite backend for the Almoner store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on dedicated
//! connection threads without blocking the async runtime. Connections come
//! from a bounded [`Pool`](pool::Pool).

mod donations;
mod encode;
mod families;
mod persons;
mod resources;
mod schema;
mod store;
mod update;

pub mod error;
pub mod pool;

pub use donations::SqliteDonations;
pub use error::{Error, Result};
pub use families::SqliteFamilies;
pub use persons::SqlitePersons;
pub use pool::PoolConfig;
pub use resources::SqliteResources;
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
