//! Deal synthesis.
//!
//! Every generator works over a [`NegotiationView`], which orders the agent's
//! units and the other negotiating powers by name so that the same seed on the
//! same board yields the same candidates. Targeted generators take an index
//! chosen by an external decision source and clamp it into range.

use crate::board::Board;
use crate::config::RandomDealConfig;
use crate::deal::{Deal, Dmz, Order, OrderCommitment};
use crate::state::{PowerName, RegionName, Turn};
use crate::validator::is_well_structured;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Clamp an externally supplied index into `0..size`.
///
/// Callers must ensure `size > 0`; for an empty collection the result is 0,
/// which is not a valid index.
pub fn clamp_index(n: usize, size: usize) -> usize {
    n.min(size.saturating_sub(1))
}

fn sort_names(mut names: Vec<String>) -> Vec<String> {
    names.sort_by_key(|n| n.to_lowercase());
    names
}

/// Deterministically ordered snapshot of what the agent can negotiate about.
pub struct NegotiationView<'a> {
    board: &'a dyn Board,
    me: PowerName,
    controlled_regions: Vec<RegionName>,
    negotiating_powers: Vec<PowerName>,
    others: Vec<PowerName>,
}

impl<'a> NegotiationView<'a> {
    /// `negotiating_powers` may or may not include `me`.
    pub fn new(board: &'a dyn Board, me: &str, negotiating_powers: &[PowerName]) -> Self {
        let negotiating_powers = sort_names(negotiating_powers.to_vec());
        let others = negotiating_powers
            .iter()
            .filter(|p| p.as_str() != me)
            .cloned()
            .collect();
        Self {
            board,
            me: me.to_string(),
            controlled_regions: sort_names(board.controlled_regions(me)),
            negotiating_powers,
            others,
        }
    }

    pub fn board(&self) -> &'a dyn Board {
        self.board
    }

    pub fn me(&self) -> &str {
        &self.me
    }

    /// The agent's unit regions, sorted by name.
    pub fn controlled_regions(&self) -> &[RegionName] {
        &self.controlled_regions
    }

    /// Negotiating powers other than the agent, sorted by name.
    pub fn other_powers(&self) -> &[PowerName] {
        &self.others
    }

    fn is_other_negotiator(&self, power: &str) -> bool {
        self.others.iter().any(|p| p == power)
    }

    fn our_region(&self, index: usize) -> Option<&RegionName> {
        if self.controlled_regions.is_empty() {
            return None;
        }
        self.controlled_regions
            .get(clamp_index(index, self.controlled_regions.len()))
    }
}

/// First `(target, helper region, helper power)` in neighbour order, where the
/// helper is another negotiator that does not control the target.
fn first_target_and_helper(
    view: &NegotiationView<'_>,
    neighbours: &[RegionName],
) -> Option<(RegionName, RegionName, PowerName)> {
    neighbours.iter().find_map(|target| {
        let target_power = view.board.controller(target);
        let (region, power) = neighbours
            .iter()
            .filter(|r| *r != target)
            .find_map(|region| {
                let power = view.board.controller(region)?;
                let usable =
                    Some(&power) != target_power.as_ref() && view.is_other_negotiator(&power);
                usable.then(|| (region.clone(), power))
            })?;
        Some((target.clone(), region, power))
    })
}

/// Generator selection decoded from an external decision source.
///
/// Each `Some` field asks for one deal of that category, targeted at the
/// given (unclamped) index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetAction {
    pub defend_unit: Option<usize>,
    pub defend_supply_centers: Option<usize>,
    pub attack_region: Option<usize>,
    pub support_attack_region: Option<usize>,
    pub phases_from_now: u32,
}

/// Seeded deal generator.
pub struct DealGenerator {
    rng: StdRng,
    config: RandomDealConfig,
}

impl DealGenerator {
    pub fn new(seed: u64, config: RandomDealConfig) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            config,
        }
    }

    /// Random DMZs and hold/move commitments for the current turn.
    ///
    /// Returns `None` when the agent is the only negotiating power left, or
    /// when the draw only commits the agent.
    pub fn random_deal(&mut self, view: &NegotiationView<'_>) -> Option<Deal> {
        if view.negotiating_powers.len() < 2 || view.others.is_empty() {
            return None;
        }

        let board = view.board;
        let turn = board.turn();
        let provinces = board.provinces();

        let mut dmzs = Vec::with_capacity(self.config.dmz_count);
        for _ in 0..self.config.dmz_count {
            let Some(partner) = view.others.choose(&mut self.rng) else {
                break;
            };
            let chosen: Vec<String> = provinces
                .choose_multiple(&mut self.rng, self.config.provinces_per_dmz)
                .cloned()
                .collect();
            if chosen.is_empty() {
                break;
            }
            dmzs.push(Dmz::new(
                turn,
                vec![view.me.clone(), partner.clone()],
                chosen,
            ));
        }

        let mut units: Vec<RegionName> = view
            .negotiating_powers
            .iter()
            .flat_map(|p| sort_names(board.controlled_regions(p)))
            .collect();

        let mut commitments = Vec::with_capacity(self.config.order_count);
        for _ in 0..self.config.order_count {
            if units.is_empty() {
                break;
            }
            let unit = units.remove(self.rng.gen_range(0..units.len()));
            let Some(power) = board.controller(&unit) else {
                continue;
            };

            let mut candidates = board.adjacent_regions(&unit);
            candidates.push(unit.clone());
            let destinations: Vec<RegionName> = candidates
                .into_iter()
                .filter(|region| {
                    let province = board.province_of(region).unwrap_or_else(|| region.clone());
                    !dmzs.iter().any(|d| d.forbids(turn, &power, &province))
                })
                .collect();

            let Some(destination) = destinations.choose(&mut self.rng) else {
                continue;
            };
            let order = if *destination == unit {
                Order::hold(power, unit)
            } else {
                Order::move_to(power, unit, destination.clone())
            };
            commitments.push(OrderCommitment::new(turn, order));
        }

        let deal = Deal::new(commitments, dmzs);
        is_well_structured(&deal, &view.me).then_some(deal)
    }

    /// Mutual hold support between one of our units and a neighbouring
    /// negotiator's unit.
    pub fn defend_unit(
        &mut self,
        view: &NegotiationView<'_>,
        region_index: usize,
        turn: Turn,
    ) -> Option<Deal> {
        let ours = view.our_region(region_index)?.clone();
        let mut neighbours = view.board.adjacent_regions(&ours);
        neighbours.shuffle(&mut self.rng);

        for neighbour in neighbours {
            let Some(ally) = view.board.controller(&neighbour) else {
                continue;
            };
            if !view.is_other_negotiator(&ally) {
                continue;
            }

            let ours_supports = Order::support_hold(view.me(), &ours, &ally, &neighbour);
            let theirs_supports = Order::support_hold(&ally, &neighbour, view.me(), &ours);
            return Some(Deal::new(
                vec![
                    OrderCommitment::new(turn, ours_supports),
                    OrderCommitment::new(turn, theirs_supports),
                ],
                vec![],
            ));
        }

        None
    }

    /// One DMZ over both sides' supply centers.
    pub fn defend_supply_centers(
        &mut self,
        view: &NegotiationView<'_>,
        power_index: usize,
        turn: Turn,
    ) -> Option<Deal> {
        if view.others.is_empty() {
            return None;
        }
        let opponent = &view.others[clamp_index(power_index, view.others.len())];

        let mut provinces = view.board.owned_supply_centers(opponent);
        provinces.extend(view.board.owned_supply_centers(view.me()));
        if provinces.is_empty() {
            return None;
        }

        Some(Deal::new(
            vec![],
            vec![Dmz::new(
                turn,
                vec![view.me.clone(), opponent.clone()],
                provinces,
            )],
        ))
    }

    /// We move into a neighbouring region, a third power supports the move.
    pub fn attack(
        &mut self,
        view: &NegotiationView<'_>,
        region_index: usize,
        turn: Turn,
    ) -> Option<Deal> {
        let ours = view.our_region(region_index)?.clone();
        let mut neighbours = view.board.adjacent_regions(&ours);
        neighbours.shuffle(&mut self.rng);

        let (target, helper_region, helper) = first_target_and_helper(view, &neighbours)?;
        let attack = Order::move_to(view.me(), &ours, &target);
        let support = Order::support_move(&helper, &helper_region, &attack)?;
        log::debug!(
            "Attack on {} from {} supported by {} in {}",
            target,
            ours,
            helper,
            helper_region
        );
        Some(Deal::new(
            vec![
                OrderCommitment::new(turn, attack),
                OrderCommitment::new(turn, support),
            ],
            vec![],
        ))
    }

    /// A third power moves into a region next to our unit, we support it.
    pub fn support_attack(
        &mut self,
        view: &NegotiationView<'_>,
        region_index: usize,
        turn: Turn,
    ) -> Option<Deal> {
        let ours = view.our_region(region_index)?.clone();
        let mut neighbours = view.board.adjacent_regions(&ours);
        neighbours.shuffle(&mut self.rng);

        let (target, ally_region, ally) = first_target_and_helper(view, &neighbours)?;
        let attack = Order::move_to(&ally, &ally_region, &target);
        let support = Order::support_move(view.me(), &ours, &attack)?;
        Some(Deal::new(
            vec![
                OrderCommitment::new(turn, attack),
                OrderCommitment::new(turn, support),
            ],
            vec![],
        ))
    }

    /// Run every generator the action asks for, in fixed category order.
    ///
    /// Categories whose generator finds no eligible target are skipped.
    pub fn deals_for_action(
        &mut self,
        view: &NegotiationView<'_>,
        action: &TargetAction,
    ) -> Vec<Deal> {
        let turn = view.board.turn().advance(action.phases_from_now);
        let mut deals = Vec::new();

        if let Some(index) = action.defend_unit {
            deals.extend(self.defend_unit(view, index, turn));
        }
        if let Some(index) = action.defend_supply_centers {
            deals.extend(self.defend_supply_centers(view, index, turn));
        }
        if let Some(index) = action.attack_region {
            deals.extend(self.attack(view, index, turn));
        }
        if let Some(index) = action.support_attack_region {
            deals.extend(self.support_attack(view, index, turn));
        }

        deals
    }
}
