pub mod in_memory_repository;
pub mod mongo_repository;

// Re-export both repository types
pub use in_memory_repository::InMemoryTouristRepository;
pub use mongo_repository::MongoTouristRepository;
