//! Downstream client protocol
pub mod commands;

pub use commands::{parse_command, WsCommand};
