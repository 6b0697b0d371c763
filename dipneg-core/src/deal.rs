//! Deal value types.
//!
//! A [`Deal`] bundles order commitments and demilitarized zones. Deals are
//! never mutated once built; confirming, withdrawing or re-proposing a deal
//! always works on a clone.

use crate::state::{PowerName, ProvinceName, RegionName, Turn};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant of [`Order`], used by validation and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderKind {
    Hold,
    Move,
    SupportHold,
    SupportMove,
    Convoy,
    MoveByConvoy,
}

impl OrderKind {
    /// Order kinds that may appear in a negotiated commitment.
    pub fn is_negotiable(self) -> bool {
        matches!(
            self,
            OrderKind::Hold | OrderKind::Move | OrderKind::SupportHold | OrderKind::SupportMove
        )
    }
}

/// A unit order. The ordering unit is always identified by the region it occupies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Order {
    Hold {
        power: PowerName,
        region: RegionName,
    },
    Move {
        power: PowerName,
        from: RegionName,
        to: RegionName,
    },
    /// `region` supports the unit holding in `target`.
    SupportHold {
        power: PowerName,
        region: RegionName,
        target_power: PowerName,
        target: RegionName,
    },
    /// `region` supports the move `from -> to`.
    SupportMove {
        power: PowerName,
        region: RegionName,
        target_power: PowerName,
        from: RegionName,
        to: RegionName,
    },
    /// Fleet in `region` convoys an army `from -> to`.
    Convoy {
        power: PowerName,
        region: RegionName,
        target_power: PowerName,
        from: RegionName,
        to: RegionName,
    },
    MoveByConvoy {
        power: PowerName,
        from: RegionName,
        to: RegionName,
    },
}

impl Order {
    pub fn hold(power: impl Into<PowerName>, region: impl Into<RegionName>) -> Self {
        Order::Hold {
            power: power.into(),
            region: region.into(),
        }
    }

    pub fn move_to(
        power: impl Into<PowerName>,
        from: impl Into<RegionName>,
        to: impl Into<RegionName>,
    ) -> Self {
        Order::Move {
            power: power.into(),
            from: from.into(),
            to: to.into(),
        }
    }

    /// Support for the hold of `target_power`'s unit in `target`.
    pub fn support_hold(
        power: impl Into<PowerName>,
        region: impl Into<RegionName>,
        target_power: impl Into<PowerName>,
        target: impl Into<RegionName>,
    ) -> Self {
        Order::SupportHold {
            power: power.into(),
            region: region.into(),
            target_power: target_power.into(),
            target: target.into(),
        }
    }

    /// Support for `supported`, which must be a [`Order::Move`].
    ///
    /// Returns `None` for any other order kind.
    pub fn support_move(
        power: impl Into<PowerName>,
        region: impl Into<RegionName>,
        supported: &Order,
    ) -> Option<Self> {
        match supported {
            Order::Move { power: p, from, to } => Some(Order::SupportMove {
                power: power.into(),
                region: region.into(),
                target_power: p.clone(),
                from: from.clone(),
                to: to.clone(),
            }),
            _ => None,
        }
    }

    pub fn kind(&self) -> OrderKind {
        match self {
            Order::Hold { .. } => OrderKind::Hold,
            Order::Move { .. } => OrderKind::Move,
            Order::SupportHold { .. } => OrderKind::SupportHold,
            Order::SupportMove { .. } => OrderKind::SupportMove,
            Order::Convoy { .. } => OrderKind::Convoy,
            Order::MoveByConvoy { .. } => OrderKind::MoveByConvoy,
        }
    }

    /// Power issuing the order.
    pub fn power(&self) -> &str {
        match self {
            Order::Hold { power, .. }
            | Order::Move { power, .. }
            | Order::SupportHold { power, .. }
            | Order::SupportMove { power, .. }
            | Order::Convoy { power, .. }
            | Order::MoveByConvoy { power, .. } => power,
        }
    }

    /// Region of the ordered unit.
    pub fn region(&self) -> &str {
        match self {
            Order::Hold { region, .. }
            | Order::SupportHold { region, .. }
            | Order::SupportMove { region, .. }
            | Order::Convoy { region, .. } => region,
            Order::Move { from, .. } | Order::MoveByConvoy { from, .. } => from,
        }
    }

    /// Region the ordered unit tries to enter, for moving orders.
    pub fn destination(&self) -> Option<&str> {
        match self {
            Order::Move { to, .. } | Order::MoveByConvoy { to, .. } => Some(to),
            _ => None,
        }
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::Hold { power, region } => write!(f, "{power} {region} HLD"),
            Order::Move { power, from, to } => write!(f, "{power} {from} MTO {to}"),
            Order::SupportHold {
                power,
                region,
                target_power,
                target,
            } => write!(f, "{power} {region} SUP {target_power} {target} HLD"),
            Order::SupportMove {
                power,
                region,
                target_power,
                from,
                to,
            } => write!(f, "{power} {region} SUP {target_power} {from} MTO {to}"),
            Order::Convoy {
                power,
                region,
                target_power,
                from,
                to,
            } => write!(f, "{power} {region} CVY {target_power} {from} CTO {to}"),
            Order::MoveByConvoy { power, from, to } => write!(f, "{power} {from} CTO {to}"),
        }
    }
}

/// Promise to submit `order` in `turn`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderCommitment {
    pub turn: Turn,
    pub order: Order,
}

impl OrderCommitment {
    pub fn new(turn: Turn, order: Order) -> Self {
        Self { turn, order }
    }
}

/// None of `powers` may move a unit into any of `provinces` during `turn`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dmz {
    pub turn: Turn,
    pub powers: Vec<PowerName>,
    pub provinces: Vec<ProvinceName>,
}

impl Dmz {
    pub fn new(turn: Turn, powers: Vec<PowerName>, provinces: Vec<ProvinceName>) -> Self {
        Self {
            turn,
            powers,
            provinces,
        }
    }

    pub fn forbids(&self, turn: Turn, power: &str, province: &str) -> bool {
        self.turn == turn
            && self.powers.iter().any(|p| p == power)
            && self.provinces.iter().any(|p| p == province)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Deal {
    pub order_commitments: Vec<OrderCommitment>,
    pub dmzs: Vec<Dmz>,
}

impl Deal {
    pub fn new(order_commitments: Vec<OrderCommitment>, dmzs: Vec<Dmz>) -> Self {
        Self {
            order_commitments,
            dmzs,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.order_commitments.is_empty() && self.dmzs.is_empty()
    }

    /// True if any clause refers to a turn earlier than `current`.
    pub fn is_outdated(&self, current: Turn) -> bool {
        self.dmzs.iter().any(|d| d.turn.is_before(current))
            || self
                .order_commitments
                .iter()
                .any(|oc| oc.turn.is_before(current))
    }

    /// Every power named by a clause, in first-mention order.
    pub fn powers(&self) -> Vec<&str> {
        let mut powers: Vec<&str> = Vec::new();
        let named = self
            .dmzs
            .iter()
            .flat_map(|d| d.powers.iter().map(String::as_str))
            .chain(self.order_commitments.iter().map(|oc| oc.order.power()));
        for power in named {
            if !powers.contains(&power) {
                powers.push(power);
            }
        }
        powers
    }
}

impl fmt::Display for Deal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut clauses: Vec<String> = self
            .order_commitments
            .iter()
            .map(|oc| format!("[{}] {}", oc.turn, oc.order))
            .collect();
        clauses.extend(self.dmzs.iter().map(|d| {
            format!(
                "[{}] DMZ ({}) ({})",
                d.turn,
                d.powers.join(" "),
                d.provinces.join(" ")
            )
        }));
        write!(f, "{{{}}}", clauses.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Phase;

    fn spring_1901() -> Turn {
        Turn::new(1901, Phase::Spring)
    }

    #[test]
    fn test_support_move_only_wraps_moves() {
        let mv = Order::move_to("FRA", "BUR", "MUN");
        let sup = Order::support_move("ENG", "BEL", &mv).unwrap();
        assert_eq!(sup.kind(), OrderKind::SupportMove);
        assert_eq!(sup.power(), "ENG");
        assert_eq!(sup.region(), "BEL");

        assert!(Order::support_move("ENG", "BEL", &Order::hold("FRA", "BUR")).is_none());
    }

    #[test]
    fn test_negotiable_kinds() {
        assert!(OrderKind::Hold.is_negotiable());
        assert!(OrderKind::SupportMove.is_negotiable());
        assert!(!OrderKind::Convoy.is_negotiable());
        assert!(!OrderKind::MoveByConvoy.is_negotiable());
    }

    #[test]
    fn test_outdated_detects_any_past_clause() {
        let now = Turn::new(1902, Phase::Spring);
        let current = Deal::new(
            vec![OrderCommitment::new(now, Order::hold("ENG", "LON"))],
            vec![],
        );
        assert!(!current.is_outdated(now));

        let stale = Deal::new(
            vec![OrderCommitment::new(now, Order::hold("ENG", "LON"))],
            vec![Dmz::new(
                spring_1901(),
                vec!["ENG".into()],
                vec!["NTH".into()],
            )],
        );
        assert!(stale.is_outdated(now));

        let shared = Dmz::new(now, vec!["ENG".into(), "FRA".into()], vec!["NTH".into()]);
        let past_hold = OrderCommitment::new(spring_1901(), Order::hold("FRA", "PAR"));
        let stale_order = Deal::new(vec![past_hold], vec![shared]);
        assert!(stale_order.is_outdated(now));
    }

    #[test]
    fn test_powers_deduplicated() {
        let deal = Deal::new(
            vec![
                OrderCommitment::new(spring_1901(), Order::hold("FRA", "PAR")),
                OrderCommitment::new(spring_1901(), Order::hold("ENG", "LON")),
            ],
            vec![Dmz::new(
                spring_1901(),
                vec!["ENG".into(), "GER".into()],
                vec!["HOL".into()],
            )],
        );
        assert_eq!(deal.powers(), vec!["ENG", "GER", "FRA"]);
    }

    #[test]
    fn test_dmz_forbids() {
        let dmz = Dmz::new(spring_1901(), vec!["ENG".into()], vec!["BEL".into()]);
        assert!(dmz.forbids(spring_1901(), "ENG", "BEL"));
        assert!(!dmz.forbids(spring_1901(), "FRA", "BEL"));
        assert!(!dmz.forbids(spring_1901().advance(2), "ENG", "BEL"));
    }

    #[test]
    fn test_display() {
        let deal = Deal::new(
            vec![OrderCommitment::new(
                spring_1901(),
                Order::move_to("ENG", "LON", "NTH"),
            )],
            vec![],
        );
        assert_eq!(deal.to_string(), "{[SPR 1901] ENG LON MTO NTH}");
    }
}
