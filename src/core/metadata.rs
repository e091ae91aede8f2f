use crate::core::types::TokensPair;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Per-exchange channel mapping for one connection epoch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeMetadata {
    pub exchange: String,
    pub ws_uri: String,
    pub channel_id_to_pair: BTreeMap<u64, TokensPair>,
    pub channel_symbol_to_pair: BTreeMap<String, TokensPair>,
}

impl ExchangeMetadata {
    pub fn new(exchange: impl Into<String>, ws_uri: impl Into<String>) -> Self {
        Self {
            exchange: exchange.into(),
            ws_uri: ws_uri.into(),
            channel_id_to_pair: BTreeMap::new(),
            channel_symbol_to_pair: BTreeMap::new(),
        }
    }

    pub fn with_channel_ids(
        mut self,
        channels: impl IntoIterator<Item = (u64, TokensPair)>,
    ) -> Self {
        self.channel_id_to_pair.extend(channels);
        self
    }

    pub fn with_channel_symbols(
        mut self,
        channels: impl IntoIterator<Item = (String, TokensPair)>,
    ) -> Self {
        self.channel_symbol_to_pair.extend(channels);
        self
    }

    /// Copy of this mapping with one more channel id binding
    pub fn with_channel(&self, channel_id: u64, pair: TokensPair) -> Self {
        let mut next = self.clone();
        next.channel_id_to_pair.insert(channel_id, pair);
        next
    }

    pub fn pair_for_channel_id(&self, channel_id: u64) -> Option<&TokensPair> {
        self.channel_id_to_pair.get(&channel_id)
    }

    pub fn pair_for_symbol(&self, symbol: &str) -> Option<&TokensPair> {
        self.channel_symbol_to_pair.get(symbol)
    }
}

/// Shared handle to the current metadata epoch.
///
/// Epochs are never mutated in place: a change builds a new
/// [`ExchangeMetadata`] and swaps the `Arc`, so a reader holding
/// [`MetadataEpochs::current`] keeps a consistent snapshot.
///
/// The bootstrap mapping is kept apart from the channel ids bound by the live
/// session, so a session's bindings can be dropped without losing it.
#[derive(Debug, Clone)]
pub struct MetadataEpochs {
    inner: Arc<RwLock<Epochs>>,
}

#[derive(Debug)]
struct Epochs {
    bootstrap: Arc<ExchangeMetadata>,
    current: Arc<ExchangeMetadata>,
}

impl MetadataEpochs {
    pub fn new(metadata: ExchangeMetadata) -> Self {
        let bootstrap = Arc::new(metadata);
        Self {
            inner: Arc::new(RwLock::new(Epochs {
                current: Arc::clone(&bootstrap),
                bootstrap,
            })),
        }
    }

    pub fn current(&self) -> Arc<ExchangeMetadata> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard.current)
    }

    /// Swap in a new bootstrap epoch, returning the previous current one.
    ///
    /// Channel ids bound by the live session survive when their pair is still
    /// subscribed by symbol in `next` and `next` does not map the id itself.
    pub fn replace(&self, next: ExchangeMetadata) -> Arc<ExchangeMetadata> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);

        let mut current = next.clone();
        for (&channel_id, pair) in &guard.current.channel_id_to_pair {
            let bound_by_session = !guard.bootstrap.channel_id_to_pair.contains_key(&channel_id);
            let still_subscribed = next.channel_symbol_to_pair.values().any(|p| p == pair);
            if bound_by_session && still_subscribed {
                current
                    .channel_id_to_pair
                    .entry(channel_id)
                    .or_insert_with(|| pair.clone());
            }
        }

        guard.bootstrap = Arc::new(next);
        std::mem::replace(&mut guard.current, Arc::new(current))
    }

    /// Drop every channel id bound by the previous session
    pub fn reset_bindings(&self) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.current = Arc::clone(&guard.bootstrap);
    }

    /// Start a new epoch that additionally maps `channel_id` to `pair`
    pub fn bind_channel(&self, channel_id: u64, pair: TokensPair) -> Arc<ExchangeMetadata> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let next = Arc::new(guard.current.with_channel(channel_id, pair));
        guard.current = Arc::clone(&next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> ExchangeMetadata {
        ExchangeMetadata::new("Bitfinex", "wss://example.com")
            .with_channel_symbols([("tBTCETH".to_string(), TokensPair::new("BTC", "ETH"))])
    }

    #[test]
    fn test_lookup_by_id_and_symbol() {
        let meta = metadata().with_channel_ids([(53, TokensPair::new("BTC", "ETH"))]);
        assert_eq!(meta.pair_for_channel_id(53), Some(&TokensPair::new("BTC", "ETH")));
        assert_eq!(meta.pair_for_channel_id(54), None);
        assert_eq!(meta.pair_for_symbol("tBTCETH"), Some(&TokensPair::new("BTC", "ETH")));
    }

    #[test]
    fn test_bind_channel_leaves_old_snapshot_untouched() {
        let epochs = MetadataEpochs::new(metadata());
        let before = epochs.current();

        epochs.bind_channel(53, TokensPair::new("BTC", "ETH"));

        assert!(before.channel_id_to_pair.is_empty());
        assert_eq!(
            epochs.current().pair_for_channel_id(53),
            Some(&TokensPair::new("BTC", "ETH"))
        );
    }

    #[test]
    fn test_replace_returns_previous_epoch() {
        let epochs = MetadataEpochs::new(metadata());
        let clone = epochs.clone();

        let previous = epochs.replace(ExchangeMetadata::new("Bitfinex", "wss://other"));

        assert_eq!(previous.ws_uri, "wss://example.com");
        assert_eq!(clone.current().ws_uri, "wss://other");
    }

    #[test]
    fn test_replace_keeps_session_bindings_of_subscribed_pairs() {
        let epochs = MetadataEpochs::new(metadata());
        epochs.bind_channel(53, TokensPair::new("BTC", "ETH"));
        epochs.bind_channel(54, TokensPair::new("LTC", "USD"));

        epochs.replace(metadata());

        let current = epochs.current();
        assert_eq!(current.pair_for_channel_id(53), Some(&TokensPair::new("BTC", "ETH")));
        assert_eq!(current.pair_for_channel_id(54), None);
    }

    #[test]
    fn test_replace_prefers_ids_from_new_epoch() {
        let epochs = MetadataEpochs::new(metadata());
        epochs.bind_channel(53, TokensPair::new("BTC", "ETH"));

        epochs.replace(metadata().with_channel_ids([(53, TokensPair::new("ETH", "USD"))]));

        assert_eq!(
            epochs.current().pair_for_channel_id(53),
            Some(&TokensPair::new("ETH", "USD"))
        );
    }

    #[test]
    fn test_reset_bindings_restores_bootstrap() {
        let bootstrap = metadata().with_channel_ids([(7, TokensPair::new("BTC", "ETH"))]);
        let epochs = MetadataEpochs::new(bootstrap.clone());
        epochs.bind_channel(53, TokensPair::new("BTC", "ETH"));

        epochs.reset_bindings();

        assert_eq!(*epochs.current(), bootstrap);
    }
}
