//! Configuration loading and the `probe` workflow behind the `dipneg` binary.

use anyhow::{bail, Context, Result};
use dipneg_bridge::{BridgeAdvisor, BridgeConfig};
use dipneg_core::{
    Board, Deal, DealAdvisor, MapBoard, NegotiatorConfig, RewardLedger, RoundContext,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};

/// Everything the binary can be configured with. Missing sections fall back
/// to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub negotiator: NegotiatorConfig,
    pub bridge: BridgeConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }
}

pub fn load_board(path: &Path) -> Result<MapBoard> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read board {}", path.display()))?;
    MapBoard::from_json(&text).with_context(|| format!("Invalid board {}", path.display()))
}

/// Deals obtained from the bridge during a probe.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeReport {
    pub handshake: Vec<Deal>,
    pub deals: Vec<Deal>,
}

/// Run the initial handshake and one deal request for `power` on `board`.
pub fn probe(
    board: &MapBoard,
    power: &str,
    config: &AppConfig,
    round: Duration,
) -> Result<ProbeReport> {
    let powers = board.powers();
    if !powers.iter().any(|p| p == power) {
        bail!(
            "Power '{}' is not on the board (known: {})",
            power,
            powers.join(", ")
        );
    }

    let mut advisor = BridgeAdvisor::new(
        config.bridge.clone(),
        config.negotiator.seed,
        config.negotiator.random_deal.clone(),
    );
    let mut rewards = RewardLedger::new();
    let unavailable = || {
        anyhow::anyhow!(
            "Bridge at {}:{} is unavailable",
            config.bridge.host,
            config.bridge.port
        )
    };

    advisor.begin_game();
    let mut ask = |advisor: &mut BridgeAdvisor| {
        let ctx = RoundContext {
            board,
            me: power,
            negotiating_powers: &powers,
            confirmed: &[],
            deadline: Instant::now() + round,
        };
        advisor.advise(&ctx, &mut rewards)
    };

    let handshake = ask(&mut advisor).ok_or_else(unavailable)?;
    log::info!("Handshake answered with {} deal(s)", handshake.len());
    let deals = ask(&mut advisor).ok_or_else(unavailable)?;
    log::info!("Deal request answered with {} deal(s)", deals.len());

    Ok(ProbeReport { handshake, deals })
}
