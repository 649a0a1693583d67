pub mod models;
pub mod services;

pub use models::*;
pub use services::api_client::{ApiClient, ApiError};
pub use services::session_service::{SessionController, SessionMessage};
pub use services::token_store::{FileTokenStore, MemoryTokenStore, TokenStore};
