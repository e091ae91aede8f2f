use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC request subscribing to one symbol's trades
#[derive(Debug, Serialize)]
pub struct HitbtcSubscribe<'a> {
    pub method: &'a str,
    pub params: HitbtcSymbolParams<'a>,
    pub id: u64,
}

#[derive(Debug, Serialize)]
pub struct HitbtcSymbolParams<'a> {
    pub symbol: &'a str,
}

/// `params` of a `snapshotTrades` / `updateTrades` notification
#[derive(Debug, Clone, Deserialize)]
pub struct HitbtcTradesParams {
    pub data: Vec<HitbtcTrade>,
    pub symbol: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HitbtcTrade {
    pub id: Value,
    pub price: Value,
    pub quantity: Value,
    pub side: String,
    /// ISO-8601, e.g. `2017-10-19T16:34:25.041Z`
    pub timestamp: String,
}
