pub mod app;
pub mod auth;
pub mod domain;
pub mod infra;
pub mod storage;
pub mod transport;
pub mod validation;

// Convenience re-exports (keeps call-sites clean)
pub use app::engine::LifecycleEngine;
pub use domain::error::AppError;
pub use infra::config::{Config, StorageConfig};
pub use storage::object::ObjectStore;
