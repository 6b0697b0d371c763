//! Local stand-in for the policy process.
//!
//! Serves one framed request per connection. Useful for development and for
//! exercising the client end to end.

use crate::framing::{BridgeError, read_frame, write_frame};
use crate::observation::Observation;
use crate::proto::{
    AttackRegion, BandanaRequest, DealData, DefendSc, DefendUnit, DiplomacyGymResponse,
    RequestType, SupportAttackRegion,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

/// Policy answering bridge requests.
pub trait RequestHandler {
    fn handle(&mut self, request: &BandanaRequest) -> anyhow::Result<DiplomacyGymResponse>;
}

/// Seeded policy with random execute flags and indices.
pub struct RandomPolicy {
    rng: StdRng,
    /// Exclusive upper bound for drawn region and power indices.
    index_space: i32,
    max_phases_from_now: i32,
    pub requests_seen: usize,
    pub last_reward: f32,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            index_space: 34,
            max_phases_from_now: 1,
            requests_seen: 0,
            last_reward: 0.0,
        }
    }

    pub fn with_index_space(mut self, index_space: i32) -> Self {
        self.index_space = index_space.max(1);
        self
    }

    fn index(&mut self) -> i32 {
        self.rng.gen_range(0..self.index_space)
    }

    fn initial_deal(&mut self, observation: &Observation) -> DealData {
        let provinces = observation.provinces.len().max(1) as i32;
        DealData {
            start_province: self.rng.gen_range(0..provinces),
            destination_province: self.rng.gen_range(0..provinces),
            ..Default::default()
        }
    }

    fn action_deal(&mut self) -> DealData {
        DealData {
            defend_unit: Some(DefendUnit {
                execute: self.rng.gen_bool(0.5),
                region: self.index(),
            }),
            defend_sc: Some(DefendSc {
                execute: self.rng.gen_bool(0.5),
                ally_power: self.index(),
            }),
            attack_region: Some(AttackRegion {
                execute: self.rng.gen_bool(0.5),
                region: self.index(),
            }),
            support_attack_region: Some(SupportAttackRegion {
                execute: self.rng.gen_bool(0.5),
                region: self.index(),
            }),
            phases_from_now: self.rng.gen_range(0..=self.max_phases_from_now),
            ..Default::default()
        }
    }
}

impl RequestHandler for RandomPolicy {
    fn handle(&mut self, request: &BandanaRequest) -> anyhow::Result<DiplomacyGymResponse> {
        let Some(data) = request.observation.as_ref() else {
            anyhow::bail!("Request carries no observation");
        };
        let observation = Observation::from_proto(data);
        self.requests_seen += 1;
        self.last_reward = observation.previous_reward;
        log::debug!(
            "{:?}: {} provinces, reward {}, done {}",
            request.kind(),
            observation.provinces.len(),
            observation.previous_reward,
            observation.done
        );

        let deal = match request.kind() {
            RequestType::InitialObservation => self.initial_deal(&observation),
            RequestType::DealRequest => self.action_deal(),
            RequestType::Invalid => return Ok(DiplomacyGymResponse::invalid()),
        };
        Ok(DiplomacyGymResponse::valid(deal))
    }
}

pub struct LocalBridgeServer {
    listener: TcpListener,
    read_timeout: Duration,
}

impl LocalBridgeServer {
    pub fn bind(addr: &str) -> Result<Self, BridgeError> {
        let listener = TcpListener::bind(addr)?;
        Ok(Self {
            listener,
            read_timeout: Duration::from_secs(5),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, BridgeError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept one connection and answer its request.
    pub fn serve_one(&self, handler: &mut dyn RequestHandler) -> Result<(), BridgeError> {
        let (stream, peer) = self.listener.accept()?;
        log::debug!("Bridge connection from {}", peer);
        self.handle_connection(stream, handler)
    }

    fn handle_connection(
        &self,
        mut stream: TcpStream,
        handler: &mut dyn RequestHandler,
    ) -> Result<(), BridgeError> {
        stream.set_read_timeout(Some(self.read_timeout))?;
        let request: BandanaRequest = read_frame(&mut stream)?;
        let response = handler.handle(&request).unwrap_or_else(|e| {
            log::warn!("Handler failed: {:#}", e);
            DiplomacyGymResponse::invalid()
        });
        write_frame(&mut stream, &response)
    }

    /// Serve connections one at a time, stopping after `limit` if given.
    ///
    /// Per-connection failures are logged and do not stop the server.
    pub fn serve(&self, handler: &mut dyn RequestHandler, limit: Option<usize>) {
        let mut served = 0;
        while limit.is_none_or(|max| served < max) {
            if let Err(e) = self.serve_one(handler) {
                log::warn!("Bridge connection failed: {}", e);
            }
            served += 1;
        }
        log::info!("Bridge server stopped after {} connections", served);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{ObservationData, ProvinceData, ResponseType};

    fn request(kind: RequestType) -> BandanaRequest {
        BandanaRequest::new(
            kind,
            ObservationData {
                provinces: vec![
                    ProvinceData {
                        id: 1,
                        sc: 1,
                        owner: 1,
                    },
                    ProvinceData {
                        id: 2,
                        sc: 0,
                        owner: 0,
                    },
                ],
                previous_action_reward: 5.0,
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_initial_answer_stays_in_province_range() {
        let mut policy = RandomPolicy::new(7);
        for _ in 0..20 {
            let response = policy
                .handle(&request(RequestType::InitialObservation))
                .unwrap();
            let deal = response.deal.unwrap();
            assert!((0..2).contains(&deal.start_province));
            assert!((0..2).contains(&deal.destination_province));
        }
        assert_eq!(policy.last_reward, 5.0);
    }

    #[test]
    fn test_deal_answer_is_valid() {
        let mut policy = RandomPolicy::new(7).with_index_space(3);
        let response = policy.handle(&request(RequestType::DealRequest)).unwrap();
        assert_eq!(response.kind(), ResponseType::Valid);
        let deal = response.deal.unwrap();
        assert!((0..3).contains(&deal.defend_unit.unwrap().region));
        assert!((0..=1).contains(&deal.phases_from_now));
    }

    #[test]
    fn test_same_seed_same_answers() {
        let mut a = RandomPolicy::new(11);
        let mut b = RandomPolicy::new(11);
        for _ in 0..5 {
            assert_eq!(
                a.handle(&request(RequestType::DealRequest)).unwrap(),
                b.handle(&request(RequestType::DealRequest)).unwrap()
            );
        }
    }

    #[test]
    fn test_missing_observation_is_error() {
        let mut policy = RandomPolicy::new(0);
        let bare = BandanaRequest {
            kind: RequestType::DealRequest as i32,
            observation: None,
        };
        assert!(policy.handle(&bare).is_err());
    }
}
