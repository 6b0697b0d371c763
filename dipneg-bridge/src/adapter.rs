//! Deal advisor backed by the external policy.
//!
//! The first request of a game is an initial observation; every later one
//! is a deal request carrying the reward settled since the previous request.
//! A failed exchange makes the advisor report itself unavailable so the
//! negotiator falls back to local search.

use crate::client::{BridgeClient, BridgeConfig};
use crate::framing::BridgeError;
use crate::observation::{Observation, PowerIndexMap};
use crate::proto::{BandanaRequest, DealData, DiplomacyGymResponse, RequestType, ResponseType};
use dipneg_core::{
    Deal, DealAdvisor, DealGenerator, GameOutcome, NegotiationView, Order, OrderCommitment,
    RandomDealConfig, RewardLedger, RoundContext, TargetAction, clamp_index,
};
use std::time::Duration;

/// Negative indices from the wire are treated as 0.
fn wire_index(n: i32) -> usize {
    n.max(0) as usize
}

/// Generator selection requested by a deal response, in execute-flag order.
pub fn target_action(deal: &DealData) -> TargetAction {
    TargetAction {
        defend_unit: deal
            .defend_unit
            .as_ref()
            .filter(|d| d.execute)
            .map(|d| wire_index(d.region)),
        defend_supply_centers: deal
            .defend_sc
            .as_ref()
            .filter(|d| d.execute)
            .map(|d| wire_index(d.ally_power)),
        attack_region: deal
            .attack_region
            .as_ref()
            .filter(|d| d.execute)
            .map(|d| wire_index(d.region)),
        support_attack_region: deal
            .support_attack_region
            .as_ref()
            .filter(|d| d.execute)
            .map(|d| wire_index(d.region)),
        phases_from_now: wire_index(deal.phases_from_now) as u32,
    }
}

/// Handshake answer: move our unit from the start province to the
/// destination province this turn.
pub fn initial_move(ctx: &RoundContext<'_>, deal: &DealData) -> Option<Deal> {
    let provinces = ctx.board.provinces();
    if provinces.is_empty() {
        return None;
    }
    let start = &provinces[clamp_index(wire_index(deal.start_province), provinces.len())];
    let destination =
        &provinces[clamp_index(wire_index(deal.destination_province), provinces.len())];

    let from = ctx.board.regions_of(start).into_iter().next()?;
    let to = ctx.board.regions_of(destination).into_iter().next()?;
    Some(Deal::new(
        vec![OrderCommitment::new(
            ctx.board.turn(),
            Order::move_to(ctx.me, from, to),
        )],
        vec![],
    ))
}

pub struct BridgeAdvisor {
    client: BridgeClient,
    generator: DealGenerator,
    initialized: bool,
}

impl BridgeAdvisor {
    pub fn new(config: BridgeConfig, seed: u64, random_deal: RandomDealConfig) -> Self {
        Self {
            client: BridgeClient::new(config),
            generator: DealGenerator::new(seed, random_deal),
            initialized: false,
        }
    }

    /// Time allowed for one exchange inside the current round.
    fn budget(&self, ctx: &RoundContext<'_>) -> Duration {
        let config = self.client.config();
        ctx.remaining()
            .saturating_sub(config.safety_margin())
            .min(config.read_timeout())
    }

    fn request(
        &self,
        kind: RequestType,
        ctx: &RoundContext<'_>,
        rewards: &mut RewardLedger,
        done: bool,
    ) -> Result<DiplomacyGymResponse, BridgeError> {
        let budget = self.budget(ctx);
        if budget.is_zero() {
            return Err(BridgeError::Unavailable("no time left in round".into()));
        }

        let powers = PowerIndexMap::from_board(ctx.board);
        let reward = rewards.settle(ctx.own_supply_center_count());
        let observation = Observation::from_board(ctx.board, &powers, reward, done);
        log::debug!(
            "Sending {:?} with reward {} ({} provinces)",
            kind,
            reward,
            observation.provinces.len()
        );

        self.client
            .exchange(&BandanaRequest::new(kind, observation.to_proto()), budget)
    }
}

impl DealAdvisor for BridgeAdvisor {
    fn begin_game(&mut self) {
        self.initialized = false;
    }

    fn advise(&mut self, ctx: &RoundContext<'_>, rewards: &mut RewardLedger) -> Option<Vec<Deal>> {
        let kind = if self.initialized {
            RequestType::DealRequest
        } else {
            RequestType::InitialObservation
        };

        let response = match self.request(kind, ctx, rewards, false) {
            Ok(response) => response,
            Err(e) => {
                log::warn!("Bridge request failed, searching locally: {}", e);
                return None;
            }
        };
        self.initialized = true;

        if response.kind() != ResponseType::Valid {
            log::warn!("Bridge answered with an invalid response");
            return None;
        }
        let Some(deal) = response.deal else {
            return Some(Vec::new());
        };

        let deals = match kind {
            RequestType::InitialObservation => initial_move(ctx, &deal).into_iter().collect(),
            _ => {
                let action = target_action(&deal);
                log::debug!("Bridge action: {:?}", action);
                let view = NegotiationView::new(ctx.board, ctx.me, ctx.negotiating_powers);
                self.generator.deals_for_action(&view, &action)
            }
        };
        Some(deals)
    }

    fn end_game(
        &mut self,
        outcome: GameOutcome,
        ctx: &RoundContext<'_>,
        rewards: &mut RewardLedger,
    ) {
        match self.request(RequestType::DealRequest, ctx, rewards, true) {
            Ok(_) => log::info!("Reported {:?} to bridge", outcome),
            Err(e) => log::warn!("Could not report game end to bridge: {}", e),
        }
        self.initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{AttackRegion, DefendSc, DefendUnit, SupportAttackRegion};
    use dipneg_core::testing::BoardBuilder;
    use dipneg_core::{MapBoard, Phase, PowerName};
    use std::time::Instant;

    fn board() -> MapBoard {
        BoardBuilder::new()
            .turn(1901, Phase::Fall)
            .power("ENG")
            .power("FRA")
            .supply_center("LON", Some("ENG"))
            .supply_center("PAR", Some("FRA"))
            .province("PIC")
            .adjacent("LON", "PIC")
            .adjacent("PIC", "PAR")
            .unit("ENG", "LON")
            .unit("FRA", "PIC")
            .build()
    }

    #[test]
    fn test_target_action_follows_execute_flags() {
        let deal = DealData {
            defend_unit: Some(DefendUnit {
                execute: true,
                region: 4,
            }),
            defend_sc: Some(DefendSc {
                execute: false,
                ally_power: 2,
            }),
            attack_region: Some(AttackRegion {
                execute: true,
                region: -3,
            }),
            support_attack_region: None,
            phases_from_now: 2,
            ..Default::default()
        };

        let action = target_action(&deal);
        assert_eq!(action.defend_unit, Some(4));
        assert_eq!(action.defend_supply_centers, None);
        assert_eq!(action.attack_region, Some(0));
        assert_eq!(action.support_attack_region, None);
        assert_eq!(action.phases_from_now, 2);

        let only_support = DealData {
            support_attack_region: Some(SupportAttackRegion {
                execute: true,
                region: 1,
            }),
            ..Default::default()
        };
        assert_eq!(target_action(&only_support).support_attack_region, Some(1));
    }

    #[test]
    fn test_initial_move_clamps_indices() {
        let board = board();
        let powers: Vec<PowerName> = vec!["ENG".into(), "FRA".into()];
        let ctx = RoundContext {
            board: &board,
            me: "ENG",
            negotiating_powers: &powers,
            confirmed: &[],
            deadline: Instant::now(),
        };
        let deal = DealData {
            start_province: 0,
            destination_province: 99,
            ..Default::default()
        };

        let decoded = initial_move(&ctx, &deal).unwrap();
        assert_eq!(
            decoded.order_commitments[0].order,
            Order::move_to("ENG", "LON", "PIC")
        );
        assert_eq!(decoded.order_commitments[0].turn, board.turn);
    }

    #[test]
    fn test_unreachable_bridge_is_unavailable() {
        let board = board();
        let powers: Vec<PowerName> = vec!["ENG".into(), "FRA".into()];
        let ctx = RoundContext {
            board: &board,
            me: "ENG",
            negotiating_powers: &powers,
            confirmed: &[],
            deadline: Instant::now() + Duration::from_secs(2),
        };
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let mut advisor = BridgeAdvisor::new(
            BridgeConfig::with_address("127.0.0.1", port),
            0,
            RandomDealConfig::default(),
        );

        assert!(advisor.advise(&ctx, &mut RewardLedger::new()).is_none());
    }

    #[test]
    fn test_no_time_left_skips_request() {
        let board = board();
        let ctx = RoundContext {
            board: &board,
            me: "ENG",
            negotiating_powers: &[],
            confirmed: &[],
            deadline: Instant::now(),
        };
        let advisor = BridgeAdvisor::new(BridgeConfig::default(), 0, RandomDealConfig::default());
        let result = advisor.request(
            RequestType::DealRequest,
            &ctx,
            &mut RewardLedger::new(),
            false,
        );
        assert!(matches!(result, Err(BridgeError::Unavailable(_))));
    }
}
