// ./infrastructure/src/persistence/in_memory_repository.rs
use application::{ApplicationError, TouristRepository};
use async_trait::async_trait;
use dashmap::DashMap;
use domain::{Tourist, TouristId};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Process-local tourist store.
///
/// Clones share the same underlying map, so the composition root builds one
/// instance and hands clones (or an `Arc`) to every caller.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTouristRepository {
    // Tourist ID -> Tourist
    store: Arc<DashMap<TouristId, Tourist>>,
}

impl InMemoryTouristRepository {
    pub fn new() -> Self {
        Self {
            store: Arc::new(DashMap::new()),
        }
    }
}

#[async_trait]
impl TouristRepository for InMemoryTouristRepository {
    #[instrument(skip(self, tourist), fields(tourist_id = %tourist.id()))]
    async fn save(&self, mut tourist: Tourist) -> Result<Tourist, ApplicationError> {
        if tourist.id().is_empty() {
            tourist.assign_id(TouristId::generate());
            debug!(assigned_id = %tourist.id(), "Assigned id to tourist saved without one");
        }
        debug!("Saving tourist to in-memory store");
        self.store.insert(tourist.id().clone(), tourist.clone());
        Ok(tourist)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: &str) -> Result<Option<Tourist>, ApplicationError> {
        debug!("Getting tourist from in-memory store");
        let tourist = self
            .store
            .get(&TouristId::from(id))
            .map(|entry| entry.value().clone());
        Ok(tourist)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<bool, ApplicationError> {
        debug!("Deleting tourist from in-memory store");
        Ok(self.store.remove(&TouristId::from(id)).is_some())
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<Tourist>, ApplicationError> {
        debug!("Listing all tourists from in-memory store");
        let tourists = self
            .store
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        Ok(tourists)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::Preference;

    fn tourist(name: &str) -> Tourist {
        Tourist::new(name, format!("{}@example.com", name.to_lowercase())).unwrap()
    }

    #[tokio::test]
    async fn save_then_find_returns_same_record() {
        let repo = InMemoryTouristRepository::new();
        let saved = repo.save(tourist("Alice")).await.unwrap();

        let found = repo.find_by_id(saved.id().as_str()).await.unwrap();
        assert_eq!(found, Some(saved));
    }

    #[tokio::test]
    async fn save_keeps_caller_supplied_id() {
        let repo = InMemoryTouristRepository::new();
        let input =
            Tourist::with_id(TouristId::from("custom-1"), "Alice", "alice@example.com").unwrap();
        let saved = repo.save(input).await.unwrap();
        assert_eq!(saved.id().as_str(), "custom-1");
    }

    #[tokio::test]
    async fn save_assigns_id_when_missing() {
        let repo = InMemoryTouristRepository::new();
        let input = Tourist::with_id(TouristId::from(""), "Alice", "alice@example.com").unwrap();
        let saved = repo.save(input).await.unwrap();
        assert!(!saved.id().is_empty());
        assert!(repo.find_by_id(saved.id().as_str()).await.unwrap().is_some());
        assert!(repo.find_by_id("").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn second_save_replaces_first() {
        let repo = InMemoryTouristRepository::new();
        let mut saved = repo.save(tourist("Alice")).await.unwrap();
        saved.set_preferences(Preference::new("Adventure", 3, 2).unwrap());
        let resaved = repo.save(saved.clone()).await.unwrap();
        assert_eq!(resaved.id(), saved.id());

        let all = repo.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(
            all[0].preferences(),
            Some(&Preference::new("Adventure", 3, 2).unwrap())
        );
    }

    #[tokio::test]
    async fn delete_reports_whether_record_existed() {
        let repo = InMemoryTouristRepository::new();
        let saved = repo.save(tourist("Alice")).await.unwrap();

        assert!(!repo.delete("never-created").await.unwrap());
        assert!(!repo.delete("").await.unwrap());
        assert!(repo.delete(saved.id().as_str()).await.unwrap());
        assert!(!repo.delete(saved.id().as_str()).await.unwrap());
        assert!(repo.find_by_id(saved.id().as_str()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_all_reflects_creates_and_deletes() {
        let repo = InMemoryTouristRepository::new();
        let mut ids = Vec::new();
        for name in ["Alice", "Bob", "Carol", "Dave", "Erin"] {
            ids.push(repo.save(tourist(name)).await.unwrap().id().clone());
        }
        for id in &ids[..2] {
            assert!(repo.delete(id.as_str()).await.unwrap());
        }

        let mut names: Vec<String> = repo
            .list_all()
            .await
            .unwrap()
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["Carol", "Dave", "Erin"]);
    }

    #[tokio::test]
    async fn list_all_is_a_snapshot() {
        let repo = InMemoryTouristRepository::new();
        repo.save(tourist("Alice")).await.unwrap();

        let mut snapshot = repo.list_all().await.unwrap();
        snapshot[0].set_preferences(Preference::new("Beach", 2, 1).unwrap());
        snapshot.clear();

        let fresh = repo.list_all().await.unwrap();
        assert_eq!(fresh.len(), 1);
        assert!(fresh[0].preferences().is_none());
    }

    #[tokio::test]
    async fn clones_share_the_same_store() {
        let repo = InMemoryTouristRepository::new();
        let other_handle = repo.clone();
        let saved = repo.save(tourist("Alice")).await.unwrap();
        assert!(
            other_handle
                .find_by_id(saved.id().as_str())
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_saves_are_not_lost() {
        let repo = InMemoryTouristRepository::new();
        let mut handles = Vec::new();
        for i in 0..64 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.save(tourist(&format!("Tourist{i}"))).await.unwrap()
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(repo.list_all().await.unwrap().len(), 64);
    }
}
