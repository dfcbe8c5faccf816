pub mod extract;
pub mod router;
pub mod types;
pub mod views;
pub mod handlers {
    pub mod auth;
    pub mod chats;
    pub mod donations;
    pub mod files;
    pub mod health;
    pub mod posts;
    pub mod ratings;
    pub mod users;
    pub mod verifications;
}

pub use router::{create_router, ApiDoc};
pub use types::AppState;
