//! Board snapshot as the policy sees it.

use crate::proto::{ObservationData, ProvinceData};
use dipneg_core::{Board, PowerName};

/// Power name to wire index for one round.
///
/// Index 0 means "no owner"; living powers are numbered from 1 in board
/// order. Rebuilt every round, so indices are only stable within it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerIndexMap {
    powers: Vec<PowerName>,
}

impl PowerIndexMap {
    pub const NONE: i32 = 0;

    pub fn from_board(board: &dyn Board) -> Self {
        Self {
            powers: board.powers(),
        }
    }

    pub fn index_of(&self, power: &str) -> i32 {
        self.powers
            .iter()
            .position(|p| p == power)
            .map_or(Self::NONE, |i| i as i32 + 1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProvinceObservation {
    /// 1-based position in board order.
    pub id: i32,
    pub supply_center: bool,
    pub owner: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub provinces: Vec<ProvinceObservation>,
    pub previous_reward: f32,
    pub done: bool,
    pub info: Option<String>,
}

impl Observation {
    /// Snapshot of `board`. A province is owned by whoever has a unit in one
    /// of its regions.
    pub fn from_board(
        board: &dyn Board,
        powers: &PowerIndexMap,
        previous_reward: f32,
        done: bool,
    ) -> Self {
        let provinces = board
            .provinces()
            .iter()
            .enumerate()
            .map(|(i, province)| {
                let owner = board
                    .regions_of(province)
                    .iter()
                    .find_map(|region| board.controller(region))
                    .map_or(PowerIndexMap::NONE, |p| powers.index_of(&p));
                ProvinceObservation {
                    id: i as i32 + 1,
                    supply_center: board.is_supply_center(province),
                    owner,
                }
            })
            .collect();

        Self {
            provinces,
            previous_reward,
            done,
            info: None,
        }
    }

    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        self.info = Some(info.into());
        self
    }

    pub fn to_proto(&self) -> ObservationData {
        ObservationData {
            provinces: self
                .provinces
                .iter()
                .map(|p| ProvinceData {
                    id: p.id,
                    sc: i32::from(p.supply_center),
                    owner: p.owner,
                })
                .collect(),
            previous_action_reward: self.previous_reward,
            done: self.done,
            info: self.info.clone().unwrap_or_default(),
        }
    }

    pub fn from_proto(data: &ObservationData) -> Self {
        Self {
            provinces: data
                .provinces
                .iter()
                .map(|p| ProvinceObservation {
                    id: p.id,
                    supply_center: p.sc != 0,
                    owner: p.owner,
                })
                .collect(),
            previous_reward: data.previous_action_reward,
            done: data.done,
            info: (!data.info.is_empty()).then(|| data.info.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dipneg_core::testing::BoardBuilder;
    use prost::Message;

    fn board() -> dipneg_core::MapBoard {
        BoardBuilder::new()
            .power("AUS")
            .power("ENG")
            .supply_center("VIE", Some("AUS"))
            .supply_center("LON", Some("ENG"))
            .province("BOH")
            .unit("AUS", "VIE")
            .unit("ENG", "LON")
            .build()
    }

    #[test]
    fn test_power_index_map() {
        let map = PowerIndexMap::from_board(&board());
        assert_eq!(map.index_of("AUS"), 1);
        assert_eq!(map.index_of("ENG"), 2);
        assert_eq!(map.index_of("TUR"), PowerIndexMap::NONE);
    }

    #[test]
    fn test_three_province_snapshot() {
        let board = board();
        let map = PowerIndexMap::from_board(&board);
        let obs = Observation::from_board(&board, &map, 0.0, false);

        assert_eq!(obs.provinces.len(), 3);
        let owners: Vec<i32> = obs.provinces.iter().map(|p| p.owner).collect();
        assert_eq!(owners, vec![1, 2, 0]);
        let ids: Vec<i32> = obs.provinces.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(!obs.done);
        assert!(obs.provinces[0].supply_center);
        assert!(!obs.provinces[2].supply_center);
    }

    #[test]
    fn test_proto_round_trip_preserves_reward_bits() {
        let board = board();
        let map = PowerIndexMap::from_board(&board);
        let reward = -0.1_f32 + 15.0;
        let obs = Observation::from_board(&board, &map, reward, true).with_info("last round");

        let bytes = obs.to_proto().encode_to_vec();
        let decoded = Observation::from_proto(&ObservationData::decode(bytes.as_slice()).unwrap());

        assert_eq!(decoded, obs);
        assert_eq!(decoded.previous_reward.to_bits(), reward.to_bits());
    }

    #[test]
    fn test_empty_info_decodes_to_none() {
        let obs = Observation::from_proto(&ObservationData::default());
        assert!(obs.info.is_none());
        assert!(obs.provinces.is_empty());
    }
}
