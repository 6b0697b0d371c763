//! Reward shaping for the external decision process.
//!
//! The ledger accumulates what happened since the last bridge request and is
//! settled into one scalar each time a request goes out.

pub const ACCEPTED_DEAL_REWARD: f32 = 5.0;
pub const REJECTED_DEAL_REWARD: f32 = -5.0;
pub const INVALID_DEAL_REWARD: f32 = -5.0;
/// Per supply center gained (negated per center lost).
pub const CAPTURED_SC_REWARD: f32 = 10.0;
pub const WON_GAME_REWARD: f32 = 100.0;
pub const LOST_GAME_REWARD: f32 = -100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardEvent {
    DealProposed,
    /// A deal we authored was confirmed.
    OwnDealConfirmed,
    InvalidDeal,
    GameWon,
    GameLost,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RewardLedger {
    proposed: u32,
    accepted: u32,
    invalid: u32,
    outcome: f32,
    last_sc_count: Option<usize>,
}

impl RewardLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: RewardEvent) {
        match event {
            RewardEvent::DealProposed => self.proposed += 1,
            RewardEvent::OwnDealConfirmed => self.accepted += 1,
            RewardEvent::InvalidDeal => self.invalid += 1,
            RewardEvent::GameWon => self.outcome = WON_GAME_REWARD,
            RewardEvent::GameLost => self.outcome = LOST_GAME_REWARD,
        }
    }

    /// Reward accumulated since the last settle, then reset.
    ///
    /// Our own deals that were never confirmed count as rejected. The
    /// supply-center baseline moves to `own_sc_count`.
    pub fn settle(&mut self, own_sc_count: usize) -> f32 {
        let rejected = self.proposed.saturating_sub(self.accepted);
        let sc_delta = self
            .last_sc_count
            .map_or(0, |last| own_sc_count as i64 - last as i64);

        let reward = self.accepted as f32 * ACCEPTED_DEAL_REWARD
            + rejected as f32 * REJECTED_DEAL_REWARD
            + self.invalid as f32 * INVALID_DEAL_REWARD
            + sc_delta as f32 * CAPTURED_SC_REWARD
            + self.outcome;

        *self = Self {
            last_sc_count: Some(own_sc_count),
            ..Self::default()
        };
        reward
    }

    /// Forget everything, including the supply-center baseline.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_settle_has_no_sc_delta() {
        let mut ledger = RewardLedger::new();
        assert_eq!(ledger.settle(5), 0.0);
        assert_eq!(ledger.settle(7), 20.0);
        assert_eq!(ledger.settle(6), -10.0);
    }

    #[test]
    fn test_unconfirmed_proposals_count_as_rejected() {
        let mut ledger = RewardLedger::new();
        ledger.record(RewardEvent::DealProposed);
        ledger.record(RewardEvent::DealProposed);
        ledger.record(RewardEvent::DealProposed);
        ledger.record(RewardEvent::OwnDealConfirmed);
        ledger.record(RewardEvent::InvalidDeal);

        // 1 * 5 + 2 * -5 + 1 * -5
        assert_eq!(ledger.settle(3), -10.0);
        assert_eq!(ledger.settle(3), 0.0);
    }

    #[test]
    fn test_outcome_is_settled_once() {
        let mut ledger = RewardLedger::new();
        ledger.settle(10);
        ledger.record(RewardEvent::GameWon);
        assert_eq!(ledger.settle(12), 120.0);
        assert_eq!(ledger.settle(12), 0.0);

        ledger.record(RewardEvent::GameLost);
        assert_eq!(ledger.settle(12), -100.0);
    }

    #[test]
    fn test_reset_clears_baseline() {
        let mut ledger = RewardLedger::new();
        ledger.settle(4);
        ledger.record(RewardEvent::DealProposed);
        ledger.reset();
        assert_eq!(ledger.settle(9), 0.0);
    }
}
