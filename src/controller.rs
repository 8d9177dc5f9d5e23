//! Transaction Lifecycle Controller
//!
//! One controller per modal. It owns the modal's [`FlowStep`], submits the
//! modal's contract call through an injected [`TransactionSubmitter`],
//! records the submitted hash in the pending-transaction registry and waits
//! for confirmations through a [`ConfirmationWaiter`]. Every failure is
//! absorbed here: the step falls back to `Info` and the caller gets a
//! [`FlowOutcome`] describing what happened.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::action::{ContractCall, FlowAction};
use crate::error::Error;
use crate::flow::{FlowEvent, FlowKind, FlowStep};
use crate::registry::PendingTransactionRegistry;

/// Confirmations required before a transaction counts as final
pub const DEFAULT_CONFIRMATIONS: u64 = 2;

/// Signs and submits a contract call, returning the transaction hash
#[async_trait]
pub trait TransactionSubmitter: Send + Sync {
    async fn submit(&self, call: &ContractCall) -> Result<String, Error>;
}

/// Resolves once a transaction has the requested number of confirmations
#[async_trait]
pub trait ConfirmationWaiter: Send + Sync {
    async fn wait_for_transaction(&self, tx_hash: &str, confirmations: u64) -> Result<(), Error>;
}

/// Notifications for whoever renders the modal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    StepChanged(FlowStep),
    /// The flow finished and the modal should be dismissed
    CloseRequested,
}

/// Result of one triggered action
#[derive(Debug)]
pub enum FlowOutcome {
    /// Not started: wrong flow, prerequisites missing, nothing to claim, or busy
    Ignored,
    /// The wallet or node refused the submission
    Rejected(Error),
    /// Submitted, but waiting for confirmations failed
    ConfirmationFailed { tx_hash: String, error: Error },
    Confirmed { tx_hash: String },
}

impl FlowOutcome {
    pub fn tx_hash(&self) -> Option<&str> {
        match self {
            FlowOutcome::ConfirmationFailed { tx_hash, .. }
            | FlowOutcome::Confirmed { tx_hash } => Some(tx_hash),
            FlowOutcome::Ignored | FlowOutcome::Rejected(_) => None,
        }
    }
}

#[derive(Debug, Default)]
struct ControllerState {
    step: FlowStep,
    /// Bumped when an action starts and when a close detaches the running one
    attempt: u64,
    in_flight: bool,
}

pub struct TransactionController {
    kind: FlowKind,
    state: Mutex<ControllerState>,
    submitter: Arc<dyn TransactionSubmitter>,
    waiter: Arc<dyn ConfirmationWaiter>,
    registry: Arc<dyn PendingTransactionRegistry>,
    confirmations: u64,
    event_sender: Option<mpsc::UnboundedSender<ControllerEvent>>,
}

impl TransactionController {
    pub fn new(
        kind: FlowKind,
        submitter: Arc<dyn TransactionSubmitter>,
        waiter: Arc<dyn ConfirmationWaiter>,
        registry: Arc<dyn PendingTransactionRegistry>,
    ) -> Self {
        Self {
            kind,
            state: Mutex::new(ControllerState::default()),
            submitter,
            waiter,
            registry,
            confirmations: DEFAULT_CONFIRMATIONS,
            event_sender: None,
        }
    }

    pub fn with_confirmations(mut self, confirmations: u64) -> Self {
        self.confirmations = confirmations;
        self
    }

    /// Send step changes and close requests to `sender`
    pub fn with_event_sender(mut self, sender: mpsc::UnboundedSender<ControllerEvent>) -> Self {
        self.event_sender = Some(sender);
        self
    }

    pub fn kind(&self) -> FlowKind {
        self.kind
    }

    pub async fn step(&self) -> FlowStep {
        self.state.lock().await.step.clone()
    }

    /// Whether the action button should be enabled for `action`
    pub async fn can_trigger(&self, action: &FlowAction) -> bool {
        let state = self.state.lock().await;
        action.kind() == self.kind
            && action.is_actionable()
            && state.step.is_info()
            && !state.in_flight
    }

    /// The modal was opened
    pub async fn open(&self) {
        let mut state = self.state.lock().await;
        self.apply(&mut state, FlowEvent::Opened);
    }

    /// The modal was closed. A submission still waiting on the wallet is
    /// detached from the modal but keeps running.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        if state.in_flight && matches!(state.step, FlowStep::Confirming) {
            state.attempt += 1;
            tracing::debug!(
                flow = self.kind.name(),
                "Modal closed while confirming, detaching attempt"
            );
        }
        self.apply(&mut state, FlowEvent::Closed);
    }

    /// Run `action` through the full lifecycle
    pub async fn trigger(&self, action: &FlowAction) -> FlowOutcome {
        if action.kind() != self.kind {
            tracing::warn!(
                flow = self.kind.name(),
                action = action.kind().name(),
                "Action does not belong to this flow"
            );
            return FlowOutcome::Ignored;
        }

        let Some(prepared) = action.prepare() else {
            tracing::debug!(flow = self.kind.name(), "Action prerequisites not met");
            return FlowOutcome::Ignored;
        };

        let attempt = {
            let mut state = self.state.lock().await;
            if !state.step.is_info() || state.in_flight {
                tracing::debug!(
                    flow = self.kind.name(),
                    step = state.step.name(),
                    "Action already in progress"
                );
                return FlowOutcome::Ignored;
            }
            state.attempt += 1;
            state.in_flight = true;
            self.apply(&mut state, FlowEvent::ActionStarted);
            state.attempt
        };

        let tx_hash = match self.submitter.submit(&prepared.call).await {
            Ok(tx_hash) => tx_hash,
            Err(e) => {
                tracing::warn!(flow = self.kind.name(), "Transaction submission failed: {}", e);
                self.finish(attempt, FlowEvent::SubmissionFailed).await;
                return FlowOutcome::Rejected(e);
            }
        };

        // The transaction exists on chain whether or not the modal still cares
        self.registry.record(prepared.pending_transaction(tx_hash.clone()));
        self.advance(
            attempt,
            FlowEvent::Submitted {
                tx_hash: tx_hash.clone(),
            },
        )
        .await;

        match self
            .waiter
            .wait_for_transaction(&tx_hash, self.confirmations)
            .await
        {
            Ok(()) => {
                let attached = self.finish(attempt, FlowEvent::Confirmed).await;
                if attached && self.kind.closes_on_confirmation() {
                    self.emit(ControllerEvent::CloseRequested);
                }
                FlowOutcome::Confirmed { tx_hash }
            }
            Err(error) => {
                tracing::warn!(
                    flow = self.kind.name(),
                    tx_hash = %tx_hash,
                    "Waiting for confirmation failed: {}",
                    error
                );
                self.finish(attempt, FlowEvent::ConfirmationFailed).await;
                FlowOutcome::ConfirmationFailed { tx_hash, error }
            }
        }
    }

    /// Apply `event` only if `attempt` still drives the step
    async fn advance(&self, attempt: u64, event: FlowEvent) -> bool {
        let mut state = self.state.lock().await;
        if state.attempt != attempt {
            return false;
        }
        self.apply(&mut state, event);
        true
    }

    /// Final event of an attempt; always releases the in-flight slot
    async fn finish(&self, attempt: u64, event: FlowEvent) -> bool {
        let mut state = self.state.lock().await;
        state.in_flight = false;
        if state.attempt != attempt {
            return false;
        }
        self.apply(&mut state, event);
        true
    }

    fn apply(&self, state: &mut ControllerState, event: FlowEvent) {
        let next = self.kind.transition(&state.step, &event);
        if next != state.step {
            tracing::debug!(
                flow = self.kind.name(),
                from = state.step.name(),
                to = next.name(),
                "Flow step changed"
            );
            state.step = next.clone();
            self.emit(ControllerEvent::StepChanged(next));
        }
    }

    fn emit(&self, event: ControllerEvent) {
        if let Some(sender) = &self.event_sender {
            let _ = sender.send(event);
        }
    }
}
