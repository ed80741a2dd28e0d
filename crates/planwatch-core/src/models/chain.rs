//! Chain identifiers and per-chain polling cadence.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

/// Polling interval used when no chain is known.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// EVM chain identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl ChainId {
    pub const ETHEREUM: ChainId = ChainId(1);
    pub const OPTIMISM: ChainId = ChainId(10);
    pub const BNB: ChainId = ChainId(56);
    pub const UNICHAIN: ChainId = ChainId(130);
    pub const POLYGON: ChainId = ChainId(137);
    pub const BASE: ChainId = ChainId(8453);
    pub const ARBITRUM: ChainId = ChainId(42161);
    pub const AVALANCHE: ChainId = ChainId(43114);
    pub const SEPOLIA: ChainId = ChainId(11_155_111);

    /// Human-readable name for known chains.
    pub fn name(&self) -> Option<&'static str> {
        match *self {
            ChainId::ETHEREUM => Some("Ethereum"),
            ChainId::OPTIMISM => Some("Optimism"),
            ChainId::BNB => Some("BNB Chain"),
            ChainId::UNICHAIN => Some("Unichain"),
            ChainId::POLYGON => Some("Polygon"),
            ChainId::BASE => Some("Base"),
            ChainId::ARBITRUM => Some("Arbitrum"),
            ChainId::AVALANCHE => Some("Avalanche"),
            ChainId::SEPOLIA => Some("Sepolia"),
            _ => None,
        }
    }

    /// Base interval between plan polls for steps on this chain.
    ///
    /// Roughly tracks block time so a fast chain gets observed quickly
    /// without hammering the planning service on slow chains.
    pub fn poll_interval(&self) -> Duration {
        match *self {
            ChainId::ETHEREUM | ChainId::SEPOLIA => Duration::from_millis(2_000),
            ChainId::POLYGON | ChainId::BNB | ChainId::AVALANCHE => Duration::from_millis(1_000),
            ChainId::OPTIMISM | ChainId::BASE | ChainId::ARBITRUM => Duration::from_millis(500),
            ChainId::UNICHAIN => Duration::from_millis(250),
            _ => DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Resolves the base polling interval for an optional chain.
pub fn poll_interval_for(chain: Option<ChainId>) -> Duration {
    chain.map_or(DEFAULT_POLL_INTERVAL, |chain| chain.poll_interval())
}

impl From<u64> for ChainId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl FromStr for ChainId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(ChainId)
            .map_err(|e| format!("Invalid chain id {s:?}: {e}"))
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name} ({})", self.0),
            None => write!(f, "{}", self.0),
        }
    }
}
