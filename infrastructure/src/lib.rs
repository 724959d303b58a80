// Module declarations
pub mod config;
pub mod persistence;

// Re-export all implementations
pub use config::{MongoSettings, RepositoryConfig, build_repository};
pub use persistence::{InMemoryTouristRepository, MongoTouristRepository};
