/// Database model definitions.
pub mod models;
/// Question bank lookups and finished-session persistence.
pub mod question_store;
/// Storage abstraction layer for database operations.
pub mod storage;
