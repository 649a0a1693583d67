pub mod api_client;
pub mod config_service;
pub mod session_service;
pub mod token_store;
