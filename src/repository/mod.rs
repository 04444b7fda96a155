pub mod cache_repository;
pub mod contact_repository;
pub mod database;
pub mod models;

pub use cache_repository::CacheRepository;
pub use contact_repository::{ContactError, ContactRepository};
pub use database::Database;
pub use models::{CachedEntry, Contact};
