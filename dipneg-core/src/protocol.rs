//! Proposal protocol messages and the transport the negotiator talks through.

use crate::deal::Deal;
use crate::state::PowerName;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Performative {
    Propose,
    Accept,
    Reject,
    Confirm,
    Other(String),
}

impl Performative {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "PROPOSE" => Performative::Propose,
            "ACCEPT" => Performative::Accept,
            "REJECT" => Performative::Reject,
            "CONFIRM" => Performative::Confirm,
            _ => Performative::Other(s.to_string()),
        }
    }
}

impl std::fmt::Display for Performative {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Performative::Propose => write!(f, "PROPOSE"),
            Performative::Accept => write!(f, "ACCEPT"),
            Performative::Reject => write!(f, "REJECT"),
            Performative::Confirm => write!(f, "CONFIRM"),
            Performative::Other(s) => write!(f, "{}", s),
        }
    }
}

/// A deal with its protocol identity, `<proposer><sequence>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub id: String,
    pub deal: Deal,
}

impl Proposal {
    pub fn new(id: impl Into<String>, deal: Deal) -> Self {
        Self {
            id: id.into(),
            deal,
        }
    }

    /// Whether `power` authored this proposal.
    ///
    /// Matches the power name anywhere in the id, ignoring case, so a power
    /// whose name contains another's will also match.
    pub fn is_authored_by(&self, power: &str) -> bool {
        self.id
            .to_ascii_lowercase()
            .contains(&power.to_ascii_lowercase())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub sender: PowerName,
    pub performative: Performative,
    pub proposal: Proposal,
}

impl Message {
    pub fn new(
        sender: impl Into<PowerName>,
        performative: Performative,
        proposal: Proposal,
    ) -> Self {
        Self {
            sender: sender.into(),
            performative,
            proposal,
        }
    }
}

/// Action the negotiator sends back into the protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Propose(Proposal),
    Accept(String),
    Reject(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Negotiation channel closed")]
    Disconnected,
}

/// Message layer between the negotiator and the other agents.
pub trait NegotiationTransport {
    fn has_message(&mut self) -> bool;

    fn next_message(&mut self) -> Option<Message>;

    /// Block up to `timeout` for a message; true if one is ready.
    fn wait_for_message(&mut self, timeout: Duration) -> bool;

    fn propose(&mut self, proposal: &Proposal) -> Result<(), TransportError>;

    fn accept(&mut self, proposal_id: &str) -> Result<(), TransportError>;

    fn reject(&mut self, proposal_id: &str) -> Result<(), TransportError>;

    /// Powers still taking part in negotiation, including ourselves.
    fn negotiating_powers(&self) -> Vec<PowerName>;
}

/// Transport over a pair of `mpsc` channels.
pub struct ChannelTransport {
    inbound: Receiver<Message>,
    outbound: Sender<Outbound>,
    lookahead: Option<Message>,
    powers: Vec<PowerName>,
}

impl ChannelTransport {
    pub fn new(
        inbound: Receiver<Message>,
        outbound: Sender<Outbound>,
        powers: Vec<PowerName>,
    ) -> Self {
        Self {
            inbound,
            outbound,
            lookahead: None,
            powers,
        }
    }

    /// Transport plus the far ends of both channels.
    pub fn pair(powers: Vec<PowerName>) -> (Self, Sender<Message>, Receiver<Outbound>) {
        let (in_tx, in_rx) = std::sync::mpsc::channel();
        let (out_tx, out_rx) = std::sync::mpsc::channel();
        (Self::new(in_rx, out_tx, powers), in_tx, out_rx)
    }

    pub fn set_negotiating_powers(&mut self, powers: Vec<PowerName>) {
        self.powers = powers;
    }

    fn send(&self, action: Outbound) -> Result<(), TransportError> {
        self.outbound
            .send(action)
            .map_err(|_| TransportError::Disconnected)
    }
}

impl NegotiationTransport for ChannelTransport {
    fn has_message(&mut self) -> bool {
        if self.lookahead.is_some() {
            return true;
        }
        match self.inbound.try_recv() {
            Ok(msg) => {
                self.lookahead = Some(msg);
                true
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => false,
        }
    }

    fn next_message(&mut self) -> Option<Message> {
        self.lookahead
            .take()
            .or_else(|| self.inbound.try_recv().ok())
    }

    fn wait_for_message(&mut self, timeout: Duration) -> bool {
        if self.lookahead.is_some() {
            return true;
        }
        match self.inbound.recv_timeout(timeout) {
            Ok(msg) => {
                self.lookahead = Some(msg);
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => {
                // Nothing will ever arrive; sleep out the wait instead of spinning.
                std::thread::sleep(timeout);
                false
            }
        }
    }

    fn propose(&mut self, proposal: &Proposal) -> Result<(), TransportError> {
        self.send(Outbound::Propose(proposal.clone()))
    }

    fn accept(&mut self, proposal_id: &str) -> Result<(), TransportError> {
        self.send(Outbound::Accept(proposal_id.to_string()))
    }

    fn reject(&mut self, proposal_id: &str) -> Result<(), TransportError> {
        self.send(Outbound::Reject(proposal_id.to_string()))
    }

    fn negotiating_powers(&self) -> Vec<PowerName> {
        self.powers.clone()
    }
}
