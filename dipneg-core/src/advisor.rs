//! Pluggable source of deals to propose.
//!
//! The negotiator asks its advisor first each round and falls back to local
//! search when the advisor has nothing to say.

use crate::board::Board;
use crate::deal::Deal;
use crate::reward::{RewardEvent, RewardLedger};
use crate::state::PowerName;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameOutcome {
    Won,
    Lost,
    Drawn,
}

impl GameOutcome {
    pub fn reward_event(self) -> Option<RewardEvent> {
        match self {
            GameOutcome::Won => Some(RewardEvent::GameWon),
            GameOutcome::Lost => Some(RewardEvent::GameLost),
            GameOutcome::Drawn => None,
        }
    }
}

/// What an advisor may look at during one round.
pub struct RoundContext<'a> {
    pub board: &'a dyn Board,
    pub me: &'a str,
    /// Negotiating powers, including ourselves.
    pub negotiating_powers: &'a [PowerName],
    pub confirmed: &'a [Deal],
    pub deadline: Instant,
}

impl RoundContext<'_> {
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn own_supply_center_count(&self) -> usize {
        self.board.owned_supply_centers(self.me).len()
    }
}

pub trait DealAdvisor {
    fn begin_game(&mut self) {}

    /// Deals to propose this round.
    ///
    /// `None` means the advisor is unavailable and the caller should search
    /// locally; `Some(vec![])` means propose nothing.
    fn advise(&mut self, ctx: &RoundContext<'_>, rewards: &mut RewardLedger) -> Option<Vec<Deal>>;

    fn end_game(
        &mut self,
        _outcome: GameOutcome,
        _ctx: &RoundContext<'_>,
        _rewards: &mut RewardLedger,
    ) {
    }
}
