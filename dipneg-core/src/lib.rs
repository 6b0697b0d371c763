//! # Diplomacy Negotiation Core
//!
//! Deal model, validation, generation and the round loop of a negotiating
//! Diplomacy agent.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌─────────────┐
//! │  Transport  │────▶│  Negotiator  │────▶│  Transport  │
//! │ (messages)  │     │ (one round)  │     │ (actions)   │
//! └─────────────┘     └──┬────────┬──┘     └─────────────┘
//!                        │        │
//!              ┌─────────▼──┐  ┌──▼──────────┐
//!              │ DealAdvisor│  │ local search│
//!              │ (external) │  │ (generator) │
//!              └────────────┘  └─────────────┘
//! ```
//!
//! ## Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Deal`] | Order commitments plus demilitarized zones |
//! | [`DealValidator`] | Well-formedness and consistency checks |
//! | [`DealGenerator`] | Random and targeted deal synthesis |
//! | [`AcceptanceEvaluator`] | Accept/reject by planner value comparison |
//! | [`Negotiator`] | Deadline-bounded negotiation round |
//! | [`DealAdvisor`] | Pluggable external deal source |
//!
//! The board, tactical planner and consistency oracle are external
//! collaborators behind the [`Board`], [`TacticalPlanner`] and
//! [`ConsistencyOracle`] traits.

pub mod acceptance;
pub mod advisor;
pub mod board;
pub mod config;
pub mod deal;
pub mod generator;
pub mod planner;
pub mod protocol;
pub mod reward;
pub mod session;
pub mod state;
pub mod testing;
pub mod validator;

pub use acceptance::{AcceptanceEvaluator, Verdict};
pub use advisor::{DealAdvisor, GameOutcome, RoundContext};
pub use board::{Board, BoardError, MapBoard};
pub use config::{ConfigError, NegotiatorConfig, RandomDealConfig};
pub use deal::{Deal, Dmz, Order, OrderCommitment, OrderKind};
pub use generator::{clamp_index, DealGenerator, NegotiationView, TargetAction};
pub use planner::{Plan, TacticalPlanner};
pub use protocol::{
    ChannelTransport, Message, NegotiationTransport, Outbound, Performative, Proposal,
    TransportError,
};
pub use reward::{RewardEvent, RewardLedger};
pub use session::{Negotiator, RoundSummary};
pub use state::{Phase, PowerName, ProvinceName, RegionName, Turn};
pub use validator::{ConsistencyOracle, DealValidator, RuleConsistencyOracle};
