// ./infrastructure/src/persistence/mongo_repository.rs
use crate::config::MongoSettings;
use application::{ApplicationError, TouristRepository};
use async_trait::async_trait;
use domain::{DomainError, Preference, Tourist, TouristId};
use futures::TryStreamExt;
use mongodb::bson::{self, Document, doc, oid::ObjectId};
use mongodb::error::ErrorKind;
use mongodb::{Client, Collection};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

/// Name of the collection holding tourist documents.
pub const TOURIST_COLLECTION: &str = "tourists";

/// Tourist store backed by a MongoDB collection.
///
/// Documents are keyed by an `ObjectId`. A tourist whose id is not a valid
/// ObjectId is treated as a new record and stored under a freshly minted key;
/// the key is written back as the tourist's public id.
///
/// Documents that no longer decode into a valid tourist are logged and
/// treated as absent, both for single lookups and for listings.
#[derive(Debug, Clone)]
pub struct MongoTouristRepository {
    client: Client,
    collection: Collection<Document>,
}

impl MongoTouristRepository {
    /// Opens the shared client and verifies the server answers a `ping`.
    #[instrument(skip(settings), fields(database = %settings.database))]
    pub async fn connect(settings: &MongoSettings) -> Result<Self, ApplicationError> {
        let client = Client::with_uri_str(&settings.uri)
            .await
            .map_err(|e| {
                if matches!(*e.kind, ErrorKind::InvalidArgument { .. }) {
                    ApplicationError::Configuration(format!("Invalid MongoDB URI: {e}"))
                } else {
                    storage_error("Failed to create MongoDB client", e)
                }
            })?;
        let database = client.database(&settings.database);
        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| storage_error("Failed to reach MongoDB", e))?;
        info!("Connected to MongoDB database");

        Ok(Self {
            collection: database.collection(TOURIST_COLLECTION),
            client,
        })
    }
}

#[async_trait]
impl TouristRepository for MongoTouristRepository {
    #[instrument(skip(self, tourist), fields(tourist_id = %tourist.id()))]
    async fn save(&self, mut tourist: Tourist) -> Result<Tourist, ApplicationError> {
        let object_id = resolve_key(&tourist);
        tourist.assign_id(TouristId::new(object_id.to_hex()));

        let result = self
            .collection
            .replace_one(doc! { "_id": object_id }, to_document(&tourist, object_id))
            .upsert(true)
            .await
            .map_err(|e| storage_error("Failed to save tourist", e))?;
        if result.upserted_id.is_some() {
            info!(tourist_id = %tourist.id(), "New tourist document inserted");
        } else {
            debug!(tourist_id = %tourist.id(), "Tourist document replaced");
        }
        Ok(tourist)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<Tourist>, ApplicationError> {
        let Some(object_id) = native_key(id) else {
            debug!("Invalid tourist id, treating as not found");
            return Ok(None);
        };
        let document = self
            .collection
            .find_one(doc! { "_id": object_id })
            .await
            .map_err(|e| storage_error("Failed to retrieve tourist", e))?;
        match document {
            Some(document) => Ok(decode_or_skip(document)),
            None => {
                debug!("Tourist document not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<bool, ApplicationError> {
        let Some(object_id) = native_key(id) else {
            debug!("Invalid tourist id, nothing to delete");
            return Ok(false);
        };
        let result = self
            .collection
            .delete_one(doc! { "_id": object_id })
            .await
            .map_err(|e| storage_error("Failed to delete tourist", e))?;
        Ok(result.deleted_count > 0)
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<Tourist>, ApplicationError> {
        let mut cursor = self
            .collection
            .find(doc! {})
            .await
            .map_err(|e| storage_error("Failed to list tourists", e))?;
        let mut tourists = Vec::new();
        while let Some(document) = cursor
            .try_next()
            .await
            .map_err(|e| storage_error("Failed to read tourist cursor", e))?
        {
            if let Some(tourist) = decode_or_skip(document) {
                tourists.push(tourist);
            }
        }
        debug!(count = tourists.len(), "Listed tourists from MongoDB");
        Ok(tourists)
    }

    async fn close(&self) -> Result<(), ApplicationError> {
        self.client.clone().shutdown().await;
        info!("MongoDB connection closed");
        Ok(())
    }
}

// --- Document mapping ---

#[derive(Deserialize, Debug)]
struct TouristDocument {
    #[serde(rename = "_id")]
    object_id: ObjectId,
    name: String,
    email: String,
    #[serde(default)]
    preferences: Option<PreferenceDocument>,
}

#[derive(Deserialize, Debug)]
struct PreferenceDocument {
    travel_type: String,
    nights: StoredCount,
    group_size: StoredCount,
}

/// Counts are written as Int64, but documents edited by other clients may
/// carry Int32 or an integral Double.
#[derive(Deserialize, Debug, Clone, Copy)]
#[serde(untagged)]
enum StoredCount {
    Integer(i64),
    Float(f64),
}

impl StoredCount {
    fn to_u32(self) -> Option<u32> {
        match self {
            Self::Integer(value) => u32::try_from(value).ok(),
            Self::Float(value)
                if value.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(&value) =>
            {
                Some(value as u32)
            }
            Self::Float(_) => None,
        }
    }
}

#[derive(Error, Debug)]
enum DecodeError {
    #[error("document shape mismatch: {0}")]
    Shape(#[from] bson::de::Error),
    #[error("field '{0}' is out of range")]
    OutOfRange(&'static str),
    #[error("stored values violate tourist rules: {0}")]
    Invalid(#[from] DomainError),
}

/// Parses a public id into the store's native key. `None` means the id can
/// never match a stored document.
fn native_key(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

/// Native key a tourist is stored under: its own id when that is an ObjectId,
/// otherwise a freshly minted one.
fn resolve_key(tourist: &Tourist) -> ObjectId {
    native_key(tourist.id().as_str()).unwrap_or_else(|| {
        debug!("Tourist id is not an ObjectId, minting a new key");
        ObjectId::new()
    })
}

fn to_document(tourist: &Tourist, object_id: ObjectId) -> Document {
    let mut document = doc! {
        "_id": object_id,
        "id": object_id.to_hex(),
        "name": tourist.name(),
        "email": tourist.email(),
    };
    if let Some(preferences) = tourist.preferences() {
        document.insert(
            "preferences",
            doc! {
                "travel_type": preferences.travel_type(),
                "nights": i64::from(preferences.nights()),
                "group_size": i64::from(preferences.group_size()),
            },
        );
    }
    document
}

fn from_document(document: Document) -> Result<Tourist, DecodeError> {
    let stored: TouristDocument = bson::from_document(document)?;
    let mut tourist = Tourist::with_id(
        TouristId::new(stored.object_id.to_hex()),
        stored.name,
        stored.email,
    )?;
    if let Some(preferences) = stored.preferences {
        let nights = preferences
            .nights
            .to_u32()
            .ok_or(DecodeError::OutOfRange("nights"))?;
        let group_size = preferences
            .group_size
            .to_u32()
            .ok_or(DecodeError::OutOfRange("group_size"))?;
        tourist.set_preferences(Preference::new(
            preferences.travel_type,
            nights,
            group_size,
        )?);
    }
    Ok(tourist)
}

fn decode_or_skip(document: Document) -> Option<Tourist> {
    let key = document.get_object_id("_id").ok();
    match from_document(document) {
        Ok(tourist) => Some(tourist),
        Err(e) => {
            warn!(document_id = ?key, "Skipping corrupt tourist document: {}", e);
            None
        }
    }
}

fn storage_error(context: &str, err: mongodb::error::Error) -> ApplicationError {
    error!("{}: {}", context, err);
    ApplicationError::StorageUnavailable(format!("{context}: {err}"))
}
