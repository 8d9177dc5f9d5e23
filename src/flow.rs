//! Transaction Flow State Machine
//!
//! Every transaction modal walks the same linear path: show information,
//! wait for the wallet to sign and submit, wait for on-chain confirmation,
//! show the result. [`FlowKind::transition`] is the pure step function; the
//! [`crate::controller::TransactionController`] feeds it events.

use serde::{Deserialize, Serialize};

/// Which modal flow a controller drives
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    /// Reward claim: ends in `Done`, which survives a close
    Claim,
    /// Allowance approval: returns to `Info` and closes the modal once confirmed
    Approval,
}

/// Current step of a transaction modal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum FlowStep {
    /// Initial step: data and the action button
    #[default]
    Info,
    /// Waiting for the wallet signature and submission
    Confirming,
    /// Submitted, waiting for confirmations
    Pending { tx_hash: String },
    /// Confirmed (claim flow only)
    Done { tx_hash: String },
}

impl FlowStep {
    pub fn is_info(&self) -> bool {
        matches!(self, FlowStep::Info)
    }

    pub fn tx_hash(&self) -> Option<&str> {
        match self {
            FlowStep::Pending { tx_hash } | FlowStep::Done { tx_hash } => Some(tx_hash),
            FlowStep::Info | FlowStep::Confirming => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FlowStep::Info => "info",
            FlowStep::Confirming => "confirming",
            FlowStep::Pending { .. } => "pending",
            FlowStep::Done { .. } => "done",
        }
    }
}

/// Inputs to the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    /// The user pressed the action button with all prerequisites loaded
    ActionStarted,
    /// The wallet signed and the node accepted the transaction
    Submitted { tx_hash: String },
    /// The wallet or node rejected the submission
    SubmissionFailed,
    /// The transaction reached the required confirmations
    Confirmed,
    /// Waiting for confirmations failed or timed out
    ConfirmationFailed,
    /// The modal was opened
    Opened,
    /// The modal was closed
    Closed,
}

impl FlowKind {
    /// Apply an event to a step. Pairs with no defined transition leave the step unchanged.
    pub fn transition(self, step: &FlowStep, event: &FlowEvent) -> FlowStep {
        use FlowEvent as E;
        use FlowStep as S;

        match (step, event) {
            (S::Info, E::ActionStarted) => S::Confirming,

            (S::Confirming, E::Submitted { tx_hash }) => S::Pending {
                tx_hash: tx_hash.clone(),
            },
            (S::Confirming, E::SubmissionFailed) => S::Info,
            // Closing only cancels the UI; the submission itself carries on
            (S::Confirming, E::Closed) => S::Info,

            (S::Pending { tx_hash }, E::Confirmed) => match self {
                FlowKind::Claim => S::Done {
                    tx_hash: tx_hash.clone(),
                },
                FlowKind::Approval => S::Info,
            },
            (S::Pending { .. }, E::ConfirmationFailed) => S::Info,

            // A finished claim stays visible after close and resets on the next open
            (S::Done { .. }, E::Opened) => S::Info,

            (current, _) => current.clone(),
        }
    }

    /// Whether confirming this flow should also dismiss the modal
    pub fn closes_on_confirmation(self) -> bool {
        matches!(self, FlowKind::Approval)
    }

    pub fn name(self) -> &'static str {
        match self {
            FlowKind::Claim => "claim",
            FlowKind::Approval => "approval",
        }
    }
}
