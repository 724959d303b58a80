use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error; // For domain-specific errors
use uuid::Uuid;

/// Maximum number of characters accepted for a tourist name.
pub const MAX_NAME_LENGTH: usize = 100;

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    // dot-atom local part; domain labels may not start or end with '-'
    Regex::new(concat!(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*",
        r"@([A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?\.)+[A-Za-z]{2,}$",
    ))
    .expect("email pattern is a valid regex")
});

// --- Domain Errors ---
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Name must not be empty")]
    EmptyName,
    #[error("Name is too long: {actual} characters (max {max})")]
    NameTooLong { max: usize, actual: usize },
    #[error("Invalid email address: '{0}'")]
    InvalidEmail(String),
    #[error("Field '{field}' must be at least 1")]
    NonPositive { field: &'static str },
}

// --- Tourist ID ---
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TouristId(String);

impl TouristId {
    pub fn new(id: String) -> Self {
        Self(id)
    }

    /// Generates a fresh random (v4) identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TouristId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TouristId {
    fn from(id: String) -> Self {
        Self::new(id)
    }
}

impl From<&str> for TouristId {
    fn from(id: &str) -> Self {
        Self::new(id.to_string())
    }
}

impl From<TouristId> for String {
    fn from(id: TouristId) -> Self {
        id.0
    }
}

// --- Preference ---

/// Travel preferences of a tourist. Immutable once built; a new value
/// replaces the old one wholesale.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Preference {
    travel_type: String,
    nights: u32,
    group_size: u32,
}

impl Preference {
    pub fn new(
        travel_type: impl Into<String>,
        nights: u32,
        group_size: u32,
    ) -> Result<Self, DomainError> {
        if nights < 1 {
            return Err(DomainError::NonPositive { field: "nights" });
        }
        if group_size < 1 {
            return Err(DomainError::NonPositive {
                field: "group_size",
            });
        }
        Ok(Self {
            travel_type: travel_type.into(),
            nights,
            group_size,
        })
    }

    pub fn travel_type(&self) -> &str {
        &self.travel_type
    }

    pub fn nights(&self) -> u32 {
        self.nights
    }

    pub fn group_size(&self) -> u32 {
        self.group_size
    }
}

// --- Tourist ---

/// A tourist record. The id is assigned at construction and only changes when
/// a storage backend translates it into its own key format.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Tourist {
    id: TouristId,
    name: String,
    email: String,
    preferences: Option<Preference>,
}

impl Tourist {
    /// Creates a tourist with a freshly generated id.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Result<Self, DomainError> {
        Self::with_id(TouristId::generate(), name, email)
    }

    /// Creates a tourist keeping the supplied id verbatim.
    pub fn with_id(
        id: TouristId,
        name: impl Into<String>,
        email: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        let email = email.into();
        validate_name(&name)?;
        validate_email(&email)?;
        Ok(Self {
            id,
            name,
            email,
            preferences: None,
        })
    }

    pub fn id(&self) -> &TouristId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn preferences(&self) -> Option<&Preference> {
        self.preferences.as_ref()
    }

    /// Replaces the current preferences. The previous value is discarded.
    pub fn set_preferences(&mut self, preferences: Preference) {
        self.preferences = Some(preferences);
    }

    pub fn clear_preferences(&mut self) {
        self.preferences = None;
    }

    /// Overwrites the id with a backend-assigned key.
    pub fn assign_id(&mut self, id: TouristId) {
        self.id = id;
    }
}

fn validate_name(name: &str) -> Result<(), DomainError> {
    if name.trim().is_empty() {
        return Err(DomainError::EmptyName);
    }
    let length = name.chars().count();
    if length > MAX_NAME_LENGTH {
        return Err(DomainError::NameTooLong {
            max: MAX_NAME_LENGTH,
            actual: length,
        });
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), DomainError> {
    if EMAIL_PATTERN.is_match(email) {
        Ok(())
    } else {
        Err(DomainError::InvalidEmail(email.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_tourist_gets_generated_id() {
        let first = Tourist::new("Alice", "alice@example.com").unwrap();
        let second = Tourist::new("Alice", "alice@example.com").unwrap();
        assert!(!first.id().is_empty());
        assert_ne!(first.id(), second.id());
        assert!(Uuid::parse_str(first.id().as_str()).is_ok());
        assert!(first.preferences().is_none());
    }

    #[test]
    fn explicit_id_is_preserved() {
        let tourist =
            Tourist::with_id(TouristId::from("custom-42"), "Bob", "bob@example.org").unwrap();
        assert_eq!(tourist.id().as_str(), "custom-42");
        assert_eq!(tourist.name(), "Bob");
        assert_eq!(tourist.email(), "bob@example.org");
    }

    #[test]
    fn name_validation() {
        assert_eq!(
            Tourist::new("   ", "a@example.com"),
            Err(DomainError::EmptyName)
        );
        let long_name = "x".repeat(MAX_NAME_LENGTH + 1);
        assert_eq!(
            Tourist::new(long_name, "a@example.com"),
            Err(DomainError::NameTooLong {
                max: MAX_NAME_LENGTH,
                actual: MAX_NAME_LENGTH + 1
            })
        );
        assert!(Tourist::new("x".repeat(MAX_NAME_LENGTH), "a@example.com").is_ok());
    }

    #[test]
    fn email_validation() {
        for bad in [
            "",
            "plainaddress",
            "a@b",
            "@example.com",
            "a b@example.com",
            "a..b@example.com",
            ".a@example.com",
            "a.@example.com",
            "a@-example.com",
            "a@example-.com",
            "a@example..com",
        ] {
            assert!(
                matches!(Tourist::new("Alice", bad), Err(DomainError::InvalidEmail(_))),
                "expected '{bad}' to be rejected"
            );
        }
        assert!(Tourist::new("Alice", "first.last+tag@sub.example.co").is_ok());
        assert!(Tourist::new("Alice", "o'brien@my-host.example.org").is_ok());
    }

    #[test]
    fn preference_requires_positive_counts() {
        assert_eq!(
            Preference::new("Adventure", 0, 2),
            Err(DomainError::NonPositive { field: "nights" })
        );
        assert_eq!(
            Preference::new("Adventure", 3, 0),
            Err(DomainError::NonPositive {
                field: "group_size"
            })
        );
        let preference = Preference::new("Adventure", 3, 2).unwrap();
        assert_eq!(preference.travel_type(), "Adventure");
        assert_eq!(preference.nights(), 3);
        assert_eq!(preference.group_size(), 2);
    }

    #[test]
    fn set_preferences_replaces_whole_value() {
        let mut tourist = Tourist::new("Alice", "alice@example.com").unwrap();
        tourist.set_preferences(Preference::new("Adventure", 3, 2).unwrap());
        tourist.set_preferences(Preference::new("Family", 7, 4).unwrap());
        assert_eq!(
            tourist.preferences(),
            Some(&Preference::new("Family", 7, 4).unwrap())
        );

        tourist.clear_preferences();
        assert!(tourist.preferences().is_none());
    }

    #[test]
    fn tourist_serializes_with_flat_id() {
        let mut tourist =
            Tourist::with_id(TouristId::from("t-1"), "Alice", "alice@example.com").unwrap();
        assert_eq!(
            serde_json::to_value(&tourist).unwrap(),
            json!({"id": "t-1", "name": "Alice", "email": "alice@example.com", "preferences": null})
        );

        tourist.set_preferences(Preference::new("Adventure", 3, 2).unwrap());
        assert_eq!(
            serde_json::to_value(&tourist).unwrap()["preferences"],
            json!({"travel_type": "Adventure", "nights": 3, "group_size": 2})
        );
    }
}
