//! Configuration for the matching engine

use std::env;
use std::time::Duration;

use common::decimal::dec;
use rust_decimal::Decimal;

/// Configuration injected into the engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Fee rate charged to the taker on each trade
    pub fee_rate: Decimal,
    /// Capacity of the inbound request channel
    pub order_channel_capacity: usize,
    /// Capacity of the outbound trade batch channel
    pub trade_channel_capacity: usize,
    /// Bound on the wait for worker completion during shutdown
    pub shutdown_deadline: Duration,
    /// Node fanout hint for the side index (advisory)
    pub side_index_fanout: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fee_rate: dec!(0.001),
            order_channel_capacity: 10_000,
            trade_channel_capacity: 10_000,
            shutdown_deadline: Duration::from_secs(1),
            side_index_fanout: 32,
        }
    }
}

impl EngineConfig {
    /// Create a configuration from environment variables, falling back
    /// to the defaults for anything unset or unparsable
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            fee_rate: env::var("FEE_RATE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.fee_rate),
            order_channel_capacity: env::var("ORDER_CHANNEL_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.order_channel_capacity),
            trade_channel_capacity: env::var("TRADE_CHANNEL_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.trade_channel_capacity),
            shutdown_deadline: env::var("SHUTDOWN_DEADLINE_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.shutdown_deadline),
            side_index_fanout: env::var("SIDE_INDEX_FANOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.side_index_fanout),
        }
    }
}
