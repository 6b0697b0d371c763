//! # Diplomacy Negotiation Bridge
//!
//! Request/response channel to an external deal-selection policy.
//!
//! Each exchange opens a TCP connection, sends one length-prefixed protobuf
//! [`BandanaRequest`](proto::BandanaRequest) carrying a board
//! [`Observation`] and the settled reward, and reads one
//! [`DiplomacyGymResponse`](proto::DiplomacyGymResponse) whose execute flags
//! select the deal generators to run.
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`BridgeClient`] | One bounded exchange per request |
//! | [`BridgeAdvisor`] | [`DealAdvisor`](dipneg_core::DealAdvisor) backed by the client |
//! | [`LocalBridgeServer`] | Serves a [`RequestHandler`] such as [`RandomPolicy`] |

pub mod adapter;
pub mod client;
pub mod framing;
pub mod observation;
pub mod proto;
pub mod server;

pub use adapter::{BridgeAdvisor, initial_move, target_action};
pub use client::{BridgeClient, BridgeConfig};
pub use framing::{BridgeError, MAX_FRAME_BYTES, read_frame, write_frame};
pub use observation::{Observation, PowerIndexMap, ProvinceObservation};
pub use server::{LocalBridgeServer, RandomPolicy, RequestHandler};
