pub mod abi;
pub mod action;
pub mod amount;
pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod explorer;
pub mod flow;
pub mod logging;
pub mod registry;
pub mod rewards;
pub mod snapshot;

pub use abi::Address;
pub use action::{ApproveStaking, ClaimRewards, ContractCall, FlowAction};
pub use client::StakingClient;
pub use config::{Config, ContractAddresses, NetworkConfig};
pub use controller::{
    ConfirmationWaiter, ControllerEvent, FlowOutcome, TransactionController, TransactionSubmitter,
};
pub use error::Error;
pub use explorer::{Chain, TransactionStepView};
pub use flow::{FlowEvent, FlowKind, FlowStep};
pub use registry::{
    InMemoryRegistry, PendingTransaction, PendingTransactionRegistry, TransactionKind,
};
pub use rewards::{split_rewards, GaugePoolData, RewardSplit, RewardsBreakdown, StakingPoolData};
pub use snapshot::{NumericSnapshot, OracleReport, SnapshotHandle, SnapshotSource};

// Re-export the integer type used for on-chain amounts
pub use cosmwasm_std::Uint256;
