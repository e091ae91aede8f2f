pub mod config;
pub mod connection;
pub mod errors;
pub mod events;
pub mod feed;
pub mod kernel;
pub mod metadata;
pub mod traits;
pub mod types;
