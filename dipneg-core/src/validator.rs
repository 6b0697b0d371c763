//! Deal well-formedness and consistency checks.

use crate::board::Board;
use crate::deal::{Deal, Order, OrderCommitment};

/// Logical conflict checker supplied by the game framework.
///
/// Only the `None`/`Some` distinction is part of the contract.
pub trait ConsistencyOracle {
    /// `None` if the deals can all be honoured together, otherwise a report
    /// describing the first conflict.
    fn consistency(&self, board: &dyn Board, deals: &[Deal]) -> Option<String>;

    /// The orders realizing `deal` on `board`, or `None` if it cannot be
    /// carried out.
    fn test_validity(&self, board: &dyn Board, deal: &Deal) -> Option<Vec<Order>>;
}

/// True if `deal` commits at least one power other than `me` and only uses
/// negotiable order kinds.
pub fn is_well_structured(deal: &Deal, me: &str) -> bool {
    let dmz_involves_other = deal
        .dmzs
        .iter()
        .any(|dmz| dmz.powers.iter().any(|p| p != me));
    let order_involves_other = deal
        .order_commitments
        .iter()
        .any(|oc| oc.order.power() != me);
    let orders_negotiable = deal
        .order_commitments
        .iter()
        .all(|oc| oc.order.kind().is_negotiable());

    (dmz_involves_other || order_involves_other) && orders_negotiable
}

/// Validation bound to one agent on one board.
pub struct DealValidator<'a> {
    board: &'a dyn Board,
    oracle: &'a dyn ConsistencyOracle,
    me: &'a str,
}

impl<'a> DealValidator<'a> {
    pub fn new(board: &'a dyn Board, oracle: &'a dyn ConsistencyOracle, me: &'a str) -> Self {
        Self { board, oracle, me }
    }

    pub fn is_well_structured(&self, deal: &Deal) -> bool {
        is_well_structured(deal, self.me)
    }

    /// True if `deal` can be added to `standing` without conflict.
    pub fn is_consistent(&self, deal: &Deal, standing: &[Deal]) -> bool {
        let mut deals = standing.to_vec();
        deals.push(deal.clone());
        match self.oracle.consistency(self.board, &deals) {
            None => true,
            Some(report) => {
                log::debug!("Deal {} is inconsistent: {}", deal, report);
                false
            }
        }
    }

    pub fn is_valid(&self, deal: &Deal, confirmed: &[Deal]) -> bool {
        self.is_well_structured(deal) && self.is_consistent(deal, confirmed)
    }

    /// True if the oracle can produce orders that carry the deal out.
    pub fn is_executable(&self, deal: &Deal) -> bool {
        self.oracle.test_validity(self.board, deal).is_some()
    }
}

/// Structural checker that needs nothing beyond the board queries.
///
/// Two commitments conflict when they give different orders to the same unit
/// in the same turn, or when a commitment moves a unit into a province that a
/// DMZ closes to its power in that turn.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleConsistencyOracle;

impl RuleConsistencyOracle {
    pub fn new() -> Self {
        Self
    }

    fn order_conflict(a: &OrderCommitment, b: &OrderCommitment) -> bool {
        a.turn == b.turn && a.order.region() == b.order.region() && a.order != b.order
    }

    fn can_reach(board: &dyn Board, from: &str, to: &str) -> bool {
        board.adjacent_regions(from).iter().any(|r| r == to)
    }

    fn order_possible(board: &dyn Board, order: &Order) -> bool {
        if board.controller(order.region()).as_deref() != Some(order.power()) {
            return false;
        }
        match order {
            Order::Hold { .. } | Order::Convoy { .. } | Order::MoveByConvoy { .. } => true,
            Order::Move { from, to, .. } => Self::can_reach(board, from, to),
            Order::SupportHold { region, target, .. } => Self::can_reach(board, region, target),
            Order::SupportMove { region, to, .. } => Self::can_reach(board, region, to),
        }
    }
}

impl ConsistencyOracle for RuleConsistencyOracle {
    fn consistency(&self, board: &dyn Board, deals: &[Deal]) -> Option<String> {
        let commitments: Vec<&OrderCommitment> = deals
            .iter()
            .flat_map(|d| d.order_commitments.iter())
            .collect();

        for (i, a) in commitments.iter().enumerate() {
            if let Some(b) = commitments[i + 1..]
                .iter()
                .find(|b| Self::order_conflict(a, b))
            {
                return Some(format!(
                    "conflicting orders for {} in {}: '{}' vs '{}'",
                    a.order.region(),
                    a.turn,
                    a.order,
                    b.order
                ));
            }
        }

        for oc in &commitments {
            let Some(destination) = oc.order.destination() else {
                continue;
            };
            let province = board
                .province_of(destination)
                .unwrap_or_else(|| destination.to_string());
            let blocked = deals
                .iter()
                .flat_map(|d| d.dmzs.iter())
                .any(|dmz| dmz.forbids(oc.turn, oc.order.power(), &province));
            if blocked {
                return Some(format!(
                    "'{}' enters {} which is demilitarized for {} in {}",
                    oc.order,
                    province,
                    oc.order.power(),
                    oc.turn
                ));
            }
        }

        None
    }

    fn test_validity(&self, board: &dyn Board, deal: &Deal) -> Option<Vec<Order>> {
        let current = board.turn();
        let mut orders = Vec::with_capacity(deal.order_commitments.len());
        for oc in &deal.order_commitments {
            if oc.turn == current && !Self::order_possible(board, &oc.order) {
                log::debug!("Order '{}' cannot be carried out in {}", oc.order, current);
                return None;
            }
            orders.push(oc.order.clone());
        }
        Some(orders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deal::Dmz;
    use crate::state::{Phase, Turn};
    use crate::testing::BoardBuilder;

    fn turn() -> Turn {
        Turn::new(1901, Phase::Spring)
    }

    fn board() -> crate::board::MapBoard {
        BoardBuilder::new()
            .power("ENG")
            .power("FRA")
            .supply_center("LON", Some("ENG"))
            .supply_center("BEL", None)
            .province("PIC")
            .adjacent("LON", "PIC")
            .adjacent("PIC", "BEL")
            .unit("ENG", "LON")
            .unit("FRA", "PIC")
            .build()
    }

    #[test]
    fn test_self_only_deal_not_well_structured() {
        let own_orders = Deal::new(
            vec![OrderCommitment::new(turn(), Order::hold("ENG", "LON"))],
            vec![Dmz::new(turn(), vec!["ENG".into()], vec!["BEL".into()])],
        );
        assert!(!is_well_structured(&own_orders, "ENG"));
        assert!(!is_well_structured(&Deal::default(), "ENG"));

        let repeated_self = Deal::new(
            vec![],
            vec![Dmz::new(
                turn(),
                vec!["ENG".into(), "ENG".into()],
                vec!["BEL".into()],
            )],
        );
        assert!(!is_well_structured(&repeated_self, "ENG"));
    }

    #[test]
    fn test_other_power_makes_deal_well_structured() {
        let shared_dmz = Deal::new(
            vec![],
            vec![Dmz::new(
                turn(),
                vec!["ENG".into(), "FRA".into()],
                vec!["BEL".into()],
            )],
        );
        assert!(is_well_structured(&shared_dmz, "ENG"));

        let foreign_order = Deal::new(
            vec![OrderCommitment::new(turn(), Order::hold("FRA", "PIC"))],
            vec![],
        );
        assert!(is_well_structured(&foreign_order, "ENG"));
    }

    #[test]
    fn test_convoy_not_well_structured() {
        let deal = Deal::new(
            vec![OrderCommitment::new(
                turn(),
                Order::MoveByConvoy {
                    power: "FRA".into(),
                    from: "PIC".into(),
                    to: "LON".into(),
                },
            )],
            vec![],
        );
        assert!(!is_well_structured(&deal, "ENG"));
    }

    #[test]
    fn test_conflicting_orders_reported() {
        let board = board();
        let hold = Deal::new(
            vec![OrderCommitment::new(turn(), Order::hold("FRA", "PIC"))],
            vec![],
        );
        let attack = Deal::new(
            vec![OrderCommitment::new(
                turn(),
                Order::move_to("FRA", "PIC", "BEL"),
            )],
            vec![],
        );

        let oracle = RuleConsistencyOracle::new();
        assert!(oracle.consistency(&board, &[hold.clone()]).is_none());
        assert!(oracle.consistency(&board, &[hold, attack]).is_some());
    }

    #[test]
    fn test_move_into_dmz_reported() {
        let board = board();
        let dmz = Deal::new(
            vec![],
            vec![Dmz::new(
                turn(),
                vec!["ENG".into(), "FRA".into()],
                vec!["BEL".into()],
            )],
        );
        let attack = Deal::new(
            vec![OrderCommitment::new(
                turn(),
                Order::move_to("FRA", "PIC", "BEL"),
            )],
            vec![],
        );

        let validator = DealValidator::new(&board, &RuleConsistencyOracle, "ENG");
        assert!(!validator.is_consistent(&attack, &[dmz.clone()]));
        assert!(validator.is_valid(&dmz, &[]));
        assert!(!validator.is_valid(&attack, &[dmz]));
    }

    #[test]
    fn test_validity_checks_units_and_adjacency() {
        let board = board();
        let validator = DealValidator::new(&board, &RuleConsistencyOracle, "ENG");

        let reachable = Deal::new(
            vec![OrderCommitment::new(
                turn(),
                Order::move_to("FRA", "PIC", "BEL"),
            )],
            vec![],
        );
        assert!(validator.is_executable(&reachable));

        let too_far = Deal::new(
            vec![OrderCommitment::new(
                turn(),
                Order::move_to("ENG", "LON", "BEL"),
            )],
            vec![],
        );
        assert!(!validator.is_executable(&too_far));

        let wrong_owner = Deal::new(
            vec![OrderCommitment::new(turn(), Order::hold("FRA", "LON"))],
            vec![],
        );
        assert!(!validator.is_executable(&wrong_owner));

        // Future turns are not checked against the current unit positions.
        let later = Deal::new(
            vec![OrderCommitment::new(
                turn().advance(2),
                Order::hold("FRA", "LON"),
            )],
            vec![],
        );
        assert!(validator.is_executable(&later));
    }
}
