pub mod api;
pub mod core;
pub mod exchanges;
pub mod utils;

pub use crate::api::{parse_command, WsCommand};
pub use crate::core::{
    config::FeedConfig,
    connection::{ConnectionManager, ConnectionState},
    errors::ExchangeError,
    events::ConnectionEvent,
    metadata::ExchangeMetadata,
    traits::ExchangeFeed,
    types::*,
};
