use async_trait::async_trait;
use domain::{DomainError, Preference, Tourist};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

// --- Application Errors ---
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Tourist not found: {0}")]
    NotFound(String),
    #[error("Validation failed: {0}")]
    Validation(#[from] DomainError), // Propagate domain errors cleanly
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

// --- Infrastructure Interfaces (Traits) ---

/// Storage contract shared by every tourist backend.
///
/// Identifiers the backend cannot interpret are never an error: lookups
/// resolve to `None` and deletes to `false`. Transport failures are reported
/// as [`ApplicationError::StorageUnavailable`] and are not retried here.
#[async_trait]
pub trait TouristRepository: Send + Sync {
    /// Inserts or replaces the tourist keyed by its id.
    ///
    /// The returned tourist carries the id the backend actually stored it
    /// under, which may differ from the input when the backend mints its own
    /// keys. Callers must keep using the returned value.
    async fn save(&self, tourist: Tourist) -> Result<Tourist, ApplicationError>;
    /// Retrieves a tourist by its id.
    async fn find_by_id(&self, id: &str) -> Result<Option<Tourist>, ApplicationError>;
    /// Deletes a tourist by its id. Returns true if a record was removed.
    async fn delete(&self, id: &str) -> Result<bool, ApplicationError>;
    /// Returns an owned snapshot of every stored tourist.
    async fn list_all(&self) -> Result<Vec<Tourist>, ApplicationError>;
    /// Releases backend resources. Called once at process shutdown.
    async fn close(&self) -> Result<(), ApplicationError> {
        Ok(())
    }
}

// --- Request Models (Data Transfer Objects - DTOs) ---

#[derive(Deserialize, Debug)]
pub struct CreateTouristRequest {
    pub name: String,
    pub email: String,
}

#[derive(Deserialize, Debug)]
pub struct UpdatePreferencesRequest {
    pub travel_type: String,
    pub nights: u32,
    pub group_size: u32,
}

// --- Application Services (Use Cases) ---

/// Orchestrates tourist use cases on top of whichever repository was injected.
pub struct TouristService {
    repository: Arc<dyn TouristRepository>,
}

impl TouristService {
    pub fn new(repository: Arc<dyn TouristRepository>) -> Self {
        Self { repository }
    }

    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn create_tourist(
        &self,
        request: CreateTouristRequest,
    ) -> Result<Tourist, ApplicationError> {
        info!("Attempting to create tourist");
        let tourist = Tourist::new(request.name, request.email)?;
        let saved = self.repository.save(tourist).await?;
        info!(tourist_id = %saved.id(), "Tourist created");
        Ok(saved)
    }

    #[instrument(skip(self, request))]
    pub async fn update_preferences(
        &self,
        id: &str,
        request: UpdatePreferencesRequest,
    ) -> Result<Tourist, ApplicationError> {
        info!("Attempting to update tourist preferences");
        let mut tourist = self.get_tourist_by_id(id).await?;
        let preferences =
            Preference::new(request.travel_type, request.nights, request.group_size)?;
        tourist.set_preferences(preferences);
        let saved = self.repository.save(tourist).await?;
        info!(tourist_id = %saved.id(), "Tourist preferences updated");
        Ok(saved)
    }

    #[instrument(skip(self))]
    pub async fn get_tourist_by_id(&self, id: &str) -> Result<Tourist, ApplicationError> {
        self.repository.find_by_id(id).await?.ok_or_else(|| {
            warn!(tourist_id = %id, "Tourist not found");
            ApplicationError::NotFound(id.to_string())
        })
    }

    #[instrument(skip(self))]
    pub async fn list_tourists(&self) -> Result<Vec<Tourist>, ApplicationError> {
        self.repository.list_all().await
    }

    #[instrument(skip(self))]
    pub async fn delete_tourist(&self, id: &str) -> Result<bool, ApplicationError> {
        let deleted = self.repository.delete(id).await?;
        if deleted {
            info!(tourist_id = %id, "Tourist deleted");
        } else {
            info!(tourist_id = %id, "Tourist not found for deletion");
        }
        Ok(deleted)
    }
}
