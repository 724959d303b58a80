// ./infrastructure/src/config.rs
use crate::persistence::{InMemoryTouristRepository, MongoTouristRepository};
use application::{ApplicationError, TouristRepository};
use std::sync::Arc;
use tracing::info;

/// Connection parameters for the MongoDB backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoSettings {
    pub uri: String,
    pub database: String,
}

/// Resolved choice of storage backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryConfig {
    InMemory,
    Mongo(MongoSettings),
}

impl RepositoryConfig {
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::InMemory => "memory",
            Self::Mongo(_) => "mongo",
        }
    }
}

/// Builds the repository selected by `config`.
///
/// Call once from the composition root and share the returned handle.
pub async fn build_repository(
    config: &RepositoryConfig,
) -> Result<Arc<dyn TouristRepository>, ApplicationError> {
    info!(backend = config.backend_name(), "Initializing tourist repository");
    match config {
        RepositoryConfig::InMemory => Ok(Arc::new(InMemoryTouristRepository::new())),
        RepositoryConfig::Mongo(settings) => {
            if settings.database.trim().is_empty() {
                return Err(ApplicationError::Configuration(
                    "MongoDB database name must not be empty".to_string(),
                ));
            }
            Ok(Arc::new(MongoTouristRepository::connect(settings).await?))
        }
    }
}
