//! Fixtures for tests: board builder and scripted collaborators.

use crate::advisor::{DealAdvisor, RoundContext};
use crate::board::{Board, MapBoard, ProvinceDef, RegionDef, Unit};
use crate::deal::{Deal, Order};
use crate::planner::{Plan, TacticalPlanner};
use crate::protocol::{Message, NegotiationTransport, Outbound, Proposal, TransportError};
use crate::reward::RewardLedger;
use crate::state::{Phase, PowerName, Turn};
use crate::validator::ConsistencyOracle;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Builder for small hand-made boards. Every province gets one region of the
/// same name.
pub struct BoardBuilder {
    board: MapBoard,
}

impl Default for BoardBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BoardBuilder {
    pub fn new() -> Self {
        Self {
            board: MapBoard::default(),
        }
    }

    pub fn turn(mut self, year: i32, phase: Phase) -> Self {
        self.board.turn = Turn::new(year, phase);
        self
    }

    pub fn power(mut self, name: &str) -> Self {
        self.board.powers.push(name.to_string());
        self
    }

    pub fn supply_center(self, name: &str, owner: Option<&str>) -> Self {
        self.add_province(name, true, owner)
    }

    pub fn province(self, name: &str) -> Self {
        self.add_province(name, false, None)
    }

    fn add_province(mut self, name: &str, supply_center: bool, owner: Option<&str>) -> Self {
        self.board.provinces.push(ProvinceDef {
            name: name.to_string(),
            supply_center,
            owner: owner.map(str::to_string),
        });
        self.board.regions.push(RegionDef {
            name: name.to_string(),
            province: name.to_string(),
            adjacent: Vec::new(),
        });
        self
    }

    /// Connect two regions both ways.
    pub fn adjacent(mut self, a: &str, b: &str) -> Self {
        for (from, to) in [(a, b), (b, a)] {
            if let Some(region) = self.board.regions.iter_mut().find(|r| r.name == from) {
                if !region.adjacent.iter().any(|r| r == to) {
                    region.adjacent.push(to.to_string());
                }
            }
        }
        self
    }

    pub fn unit(mut self, power: &str, region: &str) -> Self {
        self.board.units.push(Unit {
            power: power.to_string(),
            region: region.to_string(),
        });
        self
    }

    pub fn build(self) -> MapBoard {
        self.board
    }
}

/// Planner with fixed values.
///
/// A commitment set containing a scripted deal gets that deal's value (or is
/// infeasible); otherwise the value is `base + per_deal * commitments.len()`.
pub struct ScriptedPlanner {
    base: Option<i32>,
    per_deal: i32,
    rules: Vec<(Deal, Option<i32>)>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedPlanner {
    pub fn new(base: i32) -> Self {
        Self {
            base: Some(base),
            per_deal: 0,
            rules: Vec::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// No feasible plan for any commitment set.
    pub fn infeasible() -> Self {
        Self {
            base: None,
            ..Self::new(0)
        }
    }

    pub fn per_deal(mut self, gain: i32) -> Self {
        self.per_deal = gain;
        self
    }

    pub fn value_with(mut self, deal: Deal, value: i32) -> Self {
        self.rules.push((deal, Some(value)));
        self
    }

    pub fn infeasible_with(mut self, deal: Deal) -> Self {
        self.rules.push((deal, None));
        self
    }

    /// Shared counter of `best_plan` calls, readable after the planner is boxed.
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl TacticalPlanner for ScriptedPlanner {
    fn best_plan(&self, _board: &dyn Board, _power: &str, commitments: &[Deal]) -> Option<Plan> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let scripted = self
            .rules
            .iter()
            .rev()
            .find(|(deal, _)| commitments.contains(deal));
        let value = match scripted {
            Some((_, value)) => *value,
            None => self
                .base
                .map(|base| base + self.per_deal * commitments.len() as i32),
        }?;

        Some(Plan {
            value,
            orders: Vec::new(),
        })
    }
}

/// Oracle that reports conflicts only for scripted deals.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    conflicting: Vec<Deal>,
    unexecutable: Vec<Deal>,
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Any set containing `deal` is inconsistent.
    pub fn conflicting(mut self, deal: Deal) -> Self {
        self.conflicting.push(deal);
        self
    }

    pub fn unexecutable(mut self, deal: Deal) -> Self {
        self.unexecutable.push(deal);
        self
    }
}

impl ConsistencyOracle for ScriptedOracle {
    fn consistency(&self, _board: &dyn Board, deals: &[Deal]) -> Option<String> {
        deals
            .iter()
            .find(|d| self.conflicting.contains(d))
            .map(|d| format!("scripted conflict: {}", d))
    }

    fn test_validity(&self, _board: &dyn Board, deal: &Deal) -> Option<Vec<Order>> {
        if self.unexecutable.contains(deal) {
            return None;
        }
        Some(
            deal.order_commitments
                .iter()
                .map(|oc| oc.order.clone())
                .collect(),
        )
    }
}

/// In-memory transport: scripted inbound queue, recorded outbound actions.
#[derive(Debug, Default)]
pub struct QueueTransport {
    pub inbound: VecDeque<Message>,
    pub sent: Vec<Outbound>,
    pub powers: Vec<PowerName>,
}

impl QueueTransport {
    pub fn new(powers: &[&str]) -> Self {
        Self {
            powers: powers.iter().map(|p| p.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn push(&mut self, message: Message) {
        self.inbound.push_back(message);
    }

    pub fn proposals(&self) -> Vec<&Proposal> {
        self.sent
            .iter()
            .filter_map(|o| match o {
                Outbound::Propose(p) => Some(p),
                _ => None,
            })
            .collect()
    }
}

impl NegotiationTransport for QueueTransport {
    fn has_message(&mut self) -> bool {
        !self.inbound.is_empty()
    }

    fn next_message(&mut self) -> Option<Message> {
        self.inbound.pop_front()
    }

    fn wait_for_message(&mut self, timeout: Duration) -> bool {
        if self.inbound.is_empty() {
            std::thread::sleep(timeout);
        }
        !self.inbound.is_empty()
    }

    fn propose(&mut self, proposal: &Proposal) -> Result<(), TransportError> {
        self.sent.push(Outbound::Propose(proposal.clone()));
        Ok(())
    }

    fn accept(&mut self, proposal_id: &str) -> Result<(), TransportError> {
        self.sent.push(Outbound::Accept(proposal_id.to_string()));
        Ok(())
    }

    fn reject(&mut self, proposal_id: &str) -> Result<(), TransportError> {
        self.sent.push(Outbound::Reject(proposal_id.to_string()));
        Ok(())
    }

    fn negotiating_powers(&self) -> Vec<PowerName> {
        self.powers.clone()
    }
}

/// Advisor that always gives the same answer.
pub struct ScriptedAdvisor {
    response: Option<Vec<Deal>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedAdvisor {
    pub fn new(response: Option<Vec<Deal>>) -> Self {
        Self {
            response,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl DealAdvisor for ScriptedAdvisor {
    fn advise(&mut self, ctx: &RoundContext<'_>, rewards: &mut RewardLedger) -> Option<Vec<Deal>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        rewards.settle(ctx.own_supply_center_count());
        self.response.clone()
    }
}
