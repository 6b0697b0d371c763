//! Hand-written protobuf messages for the bridge protocol.
//!
//! Uses prost derive macros for encode/decode without prost-build. Field
//! numbers are the wire contract with the policy process.

use prost::Message;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum RequestType {
    Invalid = 0,
    InitialObservation = 1,
    DealRequest = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ResponseType {
    Invalid = 0,
    Valid = 1,
}

// ── Requests ───────────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct BandanaRequest {
    #[prost(enumeration = "RequestType", tag = "1")]
    pub kind: i32,
    #[prost(message, optional, tag = "2")]
    pub observation: Option<ObservationData>,
}

#[derive(Clone, PartialEq, Message)]
pub struct ObservationData {
    #[prost(message, repeated, tag = "1")]
    pub provinces: Vec<ProvinceData>,
    #[prost(float, tag = "2")]
    pub previous_action_reward: f32,
    #[prost(bool, tag = "3")]
    pub done: bool,
    #[prost(string, tag = "4")]
    pub info: String,
}

#[derive(Clone, PartialEq, Message)]
pub struct ProvinceData {
    /// 1-based position in board order.
    #[prost(int32, tag = "1")]
    pub id: i32,
    #[prost(int32, tag = "2")]
    pub sc: i32,
    /// Power index, 0 when unowned.
    #[prost(int32, tag = "3")]
    pub owner: i32,
}

// ── Responses ──────────────────────────────────────────────────

#[derive(Clone, PartialEq, Message)]
pub struct DiplomacyGymResponse {
    #[prost(enumeration = "ResponseType", tag = "1")]
    pub kind: i32,
    #[prost(message, optional, tag = "2")]
    pub deal: Option<DealData>,
}

#[derive(Clone, PartialEq, Message)]
pub struct DealData {
    #[prost(message, optional, tag = "1")]
    pub defend_unit: Option<DefendUnit>,
    #[prost(message, optional, tag = "2")]
    pub defend_sc: Option<DefendSc>,
    #[prost(message, optional, tag = "3")]
    pub attack_region: Option<AttackRegion>,
    #[prost(message, optional, tag = "4")]
    pub support_attack_region: Option<SupportAttackRegion>,
    #[prost(int32, tag = "5")]
    pub phases_from_now: i32,
    #[prost(int32, tag = "6")]
    pub start_province: i32,
    #[prost(int32, tag = "7")]
    pub destination_province: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct DefendUnit {
    #[prost(bool, tag = "1")]
    pub execute: bool,
    #[prost(int32, tag = "2")]
    pub region: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct DefendSc {
    #[prost(bool, tag = "1")]
    pub execute: bool,
    #[prost(int32, tag = "2")]
    pub ally_power: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct AttackRegion {
    #[prost(bool, tag = "1")]
    pub execute: bool,
    #[prost(int32, tag = "2")]
    pub region: i32,
}

#[derive(Clone, PartialEq, Message)]
pub struct SupportAttackRegion {
    #[prost(bool, tag = "1")]
    pub execute: bool,
    #[prost(int32, tag = "2")]
    pub region: i32,
}

impl BandanaRequest {
    pub fn new(kind: RequestType, observation: ObservationData) -> Self {
        Self {
            kind: kind as i32,
            observation: Some(observation),
        }
    }
}

impl DiplomacyGymResponse {
    pub fn valid(deal: DealData) -> Self {
        Self {
            kind: ResponseType::Valid as i32,
            deal: Some(deal),
        }
    }

    pub fn invalid() -> Self {
        Self {
            kind: ResponseType::Invalid as i32,
            deal: None,
        }
    }
}
