pub mod bitfinex;
pub mod hitbtc;
pub mod poloniex;
