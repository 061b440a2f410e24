//! Storage subsystem.
//!
//! # Data Flow
//! ```text
//! Load time:
//!     component → registry.register(repository)
//!
//! Startup (initializer.rs):
//!     connect (database.rs)
//!     → registry.initialize_all(db)     registration order, fail fast
//! ```

pub mod database;
pub mod initializer;
pub mod registry;
pub mod schema;

pub use database::{Database, StorageError};
pub use initializer::StorageInitializer;
pub use registry::{register, Registry, RegistryError, Repository};
pub use schema::TableSchema;
