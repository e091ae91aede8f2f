use serde::{Deserialize, Serialize};

/// Lifecycle notifications emitted by a connection manager.
///
/// For one exchange the order is always `Established` followed by any number
/// of `Lost`/`Reestablished` pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ConnectionEvent {
    Established { exchange: String, time: i64 },
    Lost { exchange: String, time: i64 },
    Reestablished { exchange: String, time: i64 },
}

impl ConnectionEvent {
    pub fn established(exchange: impl Into<String>) -> Self {
        Self::Established {
            exchange: exchange.into(),
            time: now_seconds(),
        }
    }

    pub fn lost(exchange: impl Into<String>) -> Self {
        Self::Lost {
            exchange: exchange.into(),
            time: now_seconds(),
        }
    }

    pub fn reestablished(exchange: impl Into<String>) -> Self {
        Self::Reestablished {
            exchange: exchange.into(),
            time: now_seconds(),
        }
    }

    pub fn exchange(&self) -> &str {
        match self {
            Self::Established { exchange, .. }
            | Self::Lost { exchange, .. }
            | Self::Reestablished { exchange, .. } => exchange,
        }
    }

    /// Unix time in seconds
    pub fn time(&self) -> i64 {
        match self {
            Self::Established { time, .. }
            | Self::Lost { time, .. }
            | Self::Reestablished { time, .. } => *time,
        }
    }
}

fn now_seconds() -> i64 {
    chrono::Utc::now().timestamp()
}
