//! Chain context and transaction-step display content.

use serde::{Deserialize, Serialize};

use crate::flow::{FlowKind, FlowStep};

/// Supported chains, used only to build explorer links
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Chain {
    #[default]
    NotSelected,
    Ethereum,
    Avalanche,
}

impl Chain {
    /// Resolve a chain from its numeric chain id
    pub fn from_chain_id(chain_id: u64) -> Self {
        match chain_id {
            1 => Chain::Ethereum,
            43114 => Chain::Avalanche,
            _ => Chain::NotSelected,
        }
    }

    pub fn explorer_uri(&self) -> Option<&'static str> {
        match self {
            Chain::Ethereum => Some("https://etherscan.io"),
            Chain::Avalanche => Some("https://snowtrace.io"),
            Chain::NotSelected => None,
        }
    }

    pub fn explorer_name(&self) -> Option<&'static str> {
        match self {
            Chain::Ethereum => Some("Etherscan"),
            Chain::Avalanche => Some("SnowTrace"),
            Chain::NotSelected => None,
        }
    }

    /// `{explorer}/tx/{hash}`
    pub fn tx_url(&self, tx_hash: &str) -> Option<String> {
        self.explorer_uri()
            .map(|base| format!("{}/tx/{}", base, tx_hash))
    }
}

/// Bottom-of-modal message while a transaction is in progress
#[derive(Debug, Clone, PartialEq)]
pub enum StepMessage {
    /// No hash yet: the wallet still has to sign
    ConfirmInWallet,
    /// Submitted: link to the explorer
    ViewOnExplorer { name: String, url: String },
}

impl StepMessage {
    pub fn text(&self) -> String {
        match self {
            StepMessage::ConfirmInWallet => "Confirm this transaction in your wallet".to_string(),
            StepMessage::ViewOnExplorer { name, .. } => format!("View on {}", name),
        }
    }
}

/// Content of the non-info steps of a transaction modal
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionStepView {
    pub title: String,
    /// The pending indicator is lit once the transaction is submitted
    pub active: bool,
    pub message: StepMessage,
}

impl TransactionStepView {
    /// Build the step view; returns `None` for the info step, which shows flow data instead
    pub fn for_step(kind: FlowKind, step: &FlowStep, chain: Chain) -> Option<Self> {
        let title = step_title(kind, step)?;
        let tx_hash = step.tx_hash();

        let url = tx_hash.and_then(|h| chain.tx_url(h));
        let message = match (tx_hash, chain.explorer_name(), url) {
            (Some(_), Some(name), Some(url)) => StepMessage::ViewOnExplorer {
                name: name.to_string(),
                url,
            },
            _ => StepMessage::ConfirmInWallet,
        };

        Some(Self {
            title,
            active: tx_hash.is_some(),
            message,
        })
    }
}

fn step_title(kind: FlowKind, step: &FlowStep) -> Option<String> {
    let title = match (kind, step) {
        (_, FlowStep::Info) => return None,
        (FlowKind::Approval, FlowStep::Confirming) => "CONFIRM Approval",
        (FlowKind::Claim, FlowStep::Confirming) => "CONFIRM Transaction",
        (_, FlowStep::Pending { .. }) => "TRANSACTION PENDING",
        (_, FlowStep::Done { .. }) => "REWARDS CLAIMED",
    };
    Some(title.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explorer_urls() {
        assert_eq!(
            Chain::Ethereum.tx_url("0xabc").as_deref(),
            Some("https://etherscan.io/tx/0xabc")
        );
        assert_eq!(
            Chain::Avalanche.tx_url("0xabc").as_deref(),
            Some("https://snowtrace.io/tx/0xabc")
        );
        assert_eq!(Chain::NotSelected.tx_url("0xabc"), None);
        assert_eq!(Chain::from_chain_id(1), Chain::Ethereum);
        assert_eq!(Chain::from_chain_id(5), Chain::NotSelected);
    }

    #[test]
    fn test_step_view_before_submission() {
        let view = TransactionStepView::for_step(
            FlowKind::Approval,
            &FlowStep::Confirming,
            Chain::Ethereum,
        )
        .unwrap();
        assert_eq!(view.title, "CONFIRM Approval");
        assert!(!view.active);
        assert_eq!(view.message, StepMessage::ConfirmInWallet);
        assert_eq!(view.message.text(), "Confirm this transaction in your wallet");
    }

    #[test]
    fn test_step_view_pending_links_to_explorer() {
        let step = FlowStep::Pending {
            tx_hash: "0xfeed".to_string(),
        };
        let view = TransactionStepView::for_step(FlowKind::Claim, &step, Chain::Ethereum).unwrap();
        assert_eq!(view.title, "TRANSACTION PENDING");
        assert!(view.active);
        assert_eq!(view.message.text(), "View on Etherscan");
        assert_eq!(
            view.message,
            StepMessage::ViewOnExplorer {
                name: "Etherscan".to_string(),
                url: "https://etherscan.io/tx/0xfeed".to_string(),
            }
        );
    }

    #[test]
    fn test_step_view_without_chain_prompts_wallet() {
        let step = FlowStep::Pending {
            tx_hash: "0xfeed".to_string(),
        };
        let view =
            TransactionStepView::for_step(FlowKind::Claim, &step, Chain::NotSelected).unwrap();
        assert_eq!(view.message, StepMessage::ConfirmInWallet);
        assert!(
            TransactionStepView::for_step(FlowKind::Claim, &FlowStep::Info, Chain::Ethereum)
                .is_none()
        );
    }
}
