//! Accept/reject decision for received proposals.
//!
//! A proposal is judged by what the planner expects to secure with and
//! without it. When the deal changes nothing, we only go along with powers
//! that are clearly behind us.

use crate::board::Board;
use crate::deal::Deal;
use crate::planner::TacticalPlanner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject,
}

impl Verdict {
    pub fn is_accept(self) -> bool {
        self == Verdict::Accept
    }
}

/// Decide from plan values and supply-center counts alone.
///
/// `own_scs` is the agent's count before the deal.
pub fn decide(
    base_value: i32,
    hypothetical_value: i32,
    proposer_scs: usize,
    own_scs: usize,
    weaker_margin: usize,
) -> Verdict {
    use std::cmp::Ordering;

    match hypothetical_value.cmp(&base_value) {
        Ordering::Greater => Verdict::Accept,
        Ordering::Less => Verdict::Reject,
        Ordering::Equal if proposer_scs + weaker_margin <= own_scs => Verdict::Accept,
        Ordering::Equal => Verdict::Reject,
    }
}

pub struct AcceptanceEvaluator<'a> {
    planner: &'a dyn TacticalPlanner,
    weaker_margin: usize,
}

impl<'a> AcceptanceEvaluator<'a> {
    pub fn new(planner: &'a dyn TacticalPlanner, weaker_margin: usize) -> Self {
        Self {
            planner,
            weaker_margin,
        }
    }

    /// Judge `deal`, proposed by `proposer`, against our confirmed commitments.
    pub fn evaluate(
        &self,
        board: &dyn Board,
        me: &str,
        proposer: &str,
        deal: &Deal,
        confirmed: &[Deal],
    ) -> Verdict {
        let Some(base) = self.planner.best_plan(board, me, confirmed) else {
            log::debug!(
                "No feasible plan under current commitments, rejecting {}",
                deal
            );
            return Verdict::Reject;
        };

        let mut hypothetical = confirmed.to_vec();
        hypothetical.push(deal.clone());
        let Some(with_deal) = self.planner.best_plan(board, me, &hypothetical) else {
            log::debug!("No feasible plan with {}, rejecting", deal);
            return Verdict::Reject;
        };

        let verdict = decide(
            base.value,
            with_deal.value,
            board.owned_supply_centers(proposer).len(),
            board.owned_supply_centers(me).len(),
            self.weaker_margin,
        );
        log::debug!(
            "Proposal from {}: base {} vs {} -> {:?}",
            proposer,
            base.value,
            with_deal.value,
            verdict
        );
        verdict
    }
}
