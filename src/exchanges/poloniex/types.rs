use serde::Serialize;

/// Push API command
#[derive(Debug, Clone, Serialize)]
pub struct PoloniexCommand {
    pub command: &'static str,
    pub channel: u64,
}

impl PoloniexCommand {
    pub const fn subscribe(channel: u64) -> Self {
        Self {
            command: "subscribe",
            channel,
        }
    }
}
