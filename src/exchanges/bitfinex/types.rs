use serde::{Deserialize, Serialize};

/// Outbound `subscribe` request
#[derive(Debug, Serialize)]
pub struct BitfinexSubscribe<'a> {
    pub event: &'a str,
    pub channel: &'a str,
    pub symbol: &'a str,
}

/// Subscription acknowledgement carrying the allocated channel id
#[derive(Debug, Clone, Deserialize)]
pub struct BitfinexSubscribed {
    #[serde(rename = "chanId")]
    pub chan_id: u64,
    pub symbol: String,
}
