//! Tactical planner interface.
//!
//! The planner searches for the agent's best orders under a set of binding
//! commitments. Its search is not part of this crate; the negotiator only
//! compares the scalar values it returns.

use crate::board::Board;
use crate::deal::{Deal, Order};

/// Best plan found under a commitment set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Plan {
    /// Estimated supply centers securable this round.
    pub value: i32,
    pub orders: Vec<Order>,
}

pub trait TacticalPlanner {
    /// Best plan for `power` that honours every deal in `commitments`.
    ///
    /// Returns `None` when no order set satisfies the commitments.
    fn best_plan(&self, board: &dyn Board, power: &str, commitments: &[Deal]) -> Option<Plan>;
}
