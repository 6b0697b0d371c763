//! The negotiation round loop.
//!
//! Each round the negotiator proposes once, then works through incoming
//! traffic until the deadline:
//!
//! ```text
//!   PROPOSE  -> drop if outdated, drop if inconsistent, else evaluate; accept or ignore
//!   CONFIRM  -> bind; withdraw pending proposals the new binding set rules out
//!   ACCEPT   -> log
//!   REJECT   -> log
//! ```
//!
//! Deals to propose come from the [`DealAdvisor`] when one is configured and
//! answers; otherwise from a local search over random deals scored by the
//! planner.

use crate::acceptance::AcceptanceEvaluator;
use crate::advisor::{DealAdvisor, GameOutcome, RoundContext};
use crate::board::Board;
use crate::config::NegotiatorConfig;
use crate::deal::Deal;
use crate::generator::{DealGenerator, NegotiationView};
use crate::planner::TacticalPlanner;
use crate::protocol::{Message, NegotiationTransport, Performative, Proposal};
use crate::reward::{RewardEvent, RewardLedger};
use crate::state::PowerName;
use crate::validator::{ConsistencyOracle, DealValidator};
use std::time::Instant;

/// What happened during one call to [`Negotiator::negotiate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundSummary {
    pub proposed: usize,
    pub accepted: usize,
    /// Pending proposals withdrawn after a confirmation.
    pub rejected: usize,
    pub confirmed: usize,
    pub outdated: usize,
    pub inconsistent: usize,
    pub advisor_used: bool,
}

pub struct Negotiator {
    me: PowerName,
    config: NegotiatorConfig,
    generator: DealGenerator,
    planner: Box<dyn TacticalPlanner>,
    oracle: Box<dyn ConsistencyOracle>,
    advisor: Option<Box<dyn DealAdvisor>>,
    rewards: RewardLedger,
    confirmed: Vec<Deal>,
    /// Proposals we proposed or accepted that are not yet confirmed.
    pending: Vec<Proposal>,
    next_sequence: u64,
}

impl Negotiator {
    pub fn new(
        me: impl Into<PowerName>,
        config: NegotiatorConfig,
        planner: Box<dyn TacticalPlanner>,
        oracle: Box<dyn ConsistencyOracle>,
    ) -> Self {
        let generator = DealGenerator::new(config.seed, config.random_deal.clone());
        Self {
            me: me.into(),
            config,
            generator,
            planner,
            oracle,
            advisor: None,
            rewards: RewardLedger::new(),
            confirmed: Vec::new(),
            pending: Vec::new(),
            next_sequence: 0,
        }
    }

    pub fn with_advisor(mut self, advisor: Box<dyn DealAdvisor>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    pub fn me(&self) -> &str {
        &self.me
    }

    pub fn confirmed(&self) -> &[Deal] {
        &self.confirmed
    }

    pub fn pending(&self) -> &[Proposal] {
        &self.pending
    }

    pub fn rewards(&self) -> &RewardLedger {
        &self.rewards
    }

    /// Forget the previous game's commitments.
    pub fn start_game(&mut self) {
        self.confirmed.clear();
        self.pending.clear();
        self.rewards.reset();
        if let Some(advisor) = self.advisor.as_mut() {
            advisor.begin_game();
        }
        log::info!("{} starting a new game", self.me);
    }

    pub fn end_game(
        &mut self,
        outcome: GameOutcome,
        board: &dyn Board,
        negotiating_powers: &[PowerName],
        deadline: Instant,
    ) {
        log::info!("{} finished the game: {:?}", self.me, outcome);
        if let Some(event) = outcome.reward_event() {
            self.rewards.record(event);
        }
        if let Some(advisor) = self.advisor.as_mut() {
            let ctx = RoundContext {
                board,
                me: &self.me,
                negotiating_powers,
                confirmed: &self.confirmed,
                deadline,
            };
            advisor.end_game(outcome, &ctx, &mut self.rewards);
        }
    }

    /// Run one negotiation round until `deadline`.
    pub fn negotiate(
        &mut self,
        board: &dyn Board,
        transport: &mut dyn NegotiationTransport,
        deadline: Instant,
    ) -> RoundSummary {
        let mut summary = RoundSummary::default();
        let current = board.turn();
        self.pending.retain(|p| !p.deal.is_outdated(current));

        let mut proposed = false;
        while Instant::now() < deadline {
            if !proposed {
                // Queued messages wait until our own proposal is out.
                self.propose_once(board, transport, deadline, &mut summary);
                proposed = true;
                continue;
            }

            while Instant::now() < deadline {
                let Some(message) = transport.next_message() else {
                    break;
                };
                self.handle_message(board, transport, message, &mut summary);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            transport.wait_for_message(remaining.min(self.config.poll_interval()));
        }

        log::debug!("{} round summary: {:?}", self.me, summary);
        summary
    }

    fn handle_message(
        &mut self,
        board: &dyn Board,
        transport: &mut dyn NegotiationTransport,
        message: Message,
        summary: &mut RoundSummary,
    ) {
        let Message {
            sender,
            performative,
            proposal,
        } = message;

        match performative {
            Performative::Propose => {
                self.handle_proposal(board, transport, &sender, proposal, summary)
            }
            Performative::Confirm => self.handle_confirm(board, transport, proposal, summary),
            Performative::Accept => {
                log::debug!("{} accepted {}", sender, proposal.id);
            }
            Performative::Reject => {
                log::debug!("{} rejected {}", sender, proposal.id);
            }
            Performative::Other(kind) => {
                log::info!("Ignoring {} message from {}", kind, sender);
            }
        }
    }

    fn handle_proposal(
        &mut self,
        board: &dyn Board,
        transport: &mut dyn NegotiationTransport,
        sender: &str,
        proposal: Proposal,
        summary: &mut RoundSummary,
    ) {
        if proposal.deal.is_outdated(board.turn()) {
            log::debug!("Dropping outdated proposal {} from {}", proposal.id, sender);
            summary.outdated += 1;
            return;
        }

        let validator = DealValidator::new(board, self.oracle.as_ref(), &self.me);
        if !validator.is_consistent(&proposal.deal, &self.confirmed) {
            summary.inconsistent += 1;
            return;
        }

        let evaluator = AcceptanceEvaluator::new(self.planner.as_ref(), self.config.weaker_margin);
        let verdict = evaluator.evaluate(board, &self.me, sender, &proposal.deal, &self.confirmed);
        if !verdict.is_accept() {
            return;
        }

        match transport.accept(&proposal.id) {
            Ok(()) => {
                log::info!("{} accepts {}: {}", self.me, proposal.id, proposal.deal);
                summary.accepted += 1;
                self.pending.push(proposal);
            }
            Err(e) => log::warn!("Could not accept {}: {}", proposal.id, e),
        }
    }

    fn handle_confirm(
        &mut self,
        board: &dyn Board,
        transport: &mut dyn NegotiationTransport,
        proposal: Proposal,
        summary: &mut RoundSummary,
    ) {
        log::info!("Confirmed {}: {}", proposal.id, proposal.deal);
        if proposal.is_authored_by(&self.me) {
            self.rewards.record(RewardEvent::OwnDealConfirmed);
        }
        self.pending.retain(|p| p.id != proposal.id);
        self.confirmed.push(proposal.deal);
        summary.confirmed += 1;

        let validator = DealValidator::new(board, self.oracle.as_ref(), &self.me);
        let (keep, withdraw): (Vec<Proposal>, Vec<Proposal>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|p| validator.is_consistent(&p.deal, &self.confirmed));
        self.pending = keep;

        for stale in withdraw {
            match transport.reject(&stale.id) {
                Ok(()) => {
                    log::debug!("Withdrew {} after confirmation", stale.id);
                    summary.rejected += 1;
                }
                Err(e) => log::warn!("Could not reject {}: {}", stale.id, e),
            }
        }
    }

    fn propose_once(
        &mut self,
        board: &dyn Board,
        transport: &mut dyn NegotiationTransport,
        deadline: Instant,
        summary: &mut RoundSummary,
    ) {
        let powers = transport.negotiating_powers();

        let advised = match self.advisor.as_mut() {
            Some(advisor) => {
                let ctx = RoundContext {
                    board,
                    me: &self.me,
                    negotiating_powers: &powers,
                    confirmed: &self.confirmed,
                    deadline,
                };
                advisor.advise(&ctx, &mut self.rewards)
            }
            None => None,
        };

        let candidates = match advised {
            Some(deals) => {
                summary.advisor_used = true;
                deals
            }
            None => {
                let view = NegotiationView::new(board, &self.me, &powers);
                self.local_search(board, &view).into_iter().collect()
            }
        };

        for deal in candidates {
            let validator = DealValidator::new(board, self.oracle.as_ref(), &self.me);
            let executable = validator.is_well_structured(&deal) && validator.is_executable(&deal);
            if summary.advisor_used && !executable {
                self.rewards.record(RewardEvent::InvalidDeal);
            }
            if !executable || !validator.is_consistent(&deal, &self.confirmed) {
                log::debug!("Not proposing invalid deal {}", deal);
                continue;
            }
            self.propose(transport, deal, summary);
        }
    }

    fn propose(
        &mut self,
        transport: &mut dyn NegotiationTransport,
        deal: Deal,
        summary: &mut RoundSummary,
    ) {
        let proposal = Proposal::new(format!("{}{}", self.me, self.next_sequence), deal);
        self.next_sequence += 1;

        match transport.propose(&proposal) {
            Ok(()) => {
                log::info!("{} proposes {}: {}", self.me, proposal.id, proposal.deal);
                self.rewards.record(RewardEvent::DealProposed);
                summary.proposed += 1;
                self.pending.push(proposal);
            }
            Err(e) => log::warn!("Could not propose {}: {}", proposal.id, e),
        }
    }

    /// Best random deal by plan-value gain over the current commitments.
    fn local_search(&mut self, board: &dyn Board, view: &NegotiationView<'_>) -> Option<Deal> {
        let Some(baseline) = self.planner.best_plan(board, &self.me, &self.confirmed) else {
            log::info!("{} has no feasible plan this round", self.me);
            return None;
        };

        let validator = DealValidator::new(board, self.oracle.as_ref(), &self.me);
        let mut best: Option<(i32, Deal)> = None;
        for _ in 0..self.config.local_search_attempts {
            let Some(deal) = self.generator.random_deal(view) else {
                continue;
            };
            if !validator.is_valid(&deal, &self.confirmed) {
                continue;
            }

            let mut commitments = self.confirmed.clone();
            commitments.push(deal.clone());
            let Some(plan) = self.planner.best_plan(board, &self.me, &commitments) else {
                continue;
            };

            let gain = plan.value - baseline.value;
            if gain > 0 && best.as_ref().map_or(true, |(best_gain, _)| gain > *best_gain) {
                best = Some((gain, deal));
            }
        }

        if let Some((gain, deal)) = &best {
            log::debug!("Local search picked {} (+{})", deal, gain);
        }
        best.map(|(_, deal)| deal)
    }
}
