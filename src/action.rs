//! Contract actions a transaction modal can trigger.

use cosmwasm_std::Uint256;
use serde::{Deserialize, Serialize};

use crate::abi::{encode_call, Address, Token, APPROVE_SELECTOR, MAX_UINT256, MINT_SELECTOR};
use crate::amount::format_big_number;
use crate::flow::FlowKind;
use crate::registry::{PendingTransaction, TransactionKind};

/// A state-changing contract call, ready to be signed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCall {
    pub to: Address,
    pub data: Vec<u8>,
}

/// Claim gauge rewards through the token minter: `mint(gauge)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimRewards {
    pub minter: Option<Address>,
    pub gauge: Option<Address>,
    pub vault: String,
    /// `None` until the staking data has loaded
    pub claimable: Option<Uint256>,
    pub decimals: u32,
}

impl ClaimRewards {
    /// The claim button is enabled only with every binding present and something to claim
    pub fn is_actionable(&self) -> bool {
        self.minter.is_some()
            && self.gauge.is_some()
            && self.claimable.map_or(false, |amount| !amount.is_zero())
    }
}

/// Grant the staking pool an unlimited allowance: `approve(spender, MAX_UINT256)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApproveStaking {
    pub token: Option<Address>,
    pub spender: Option<Address>,
    pub vault: String,
}

impl ApproveStaking {
    pub fn is_actionable(&self) -> bool {
        self.token.is_some() && self.spender.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowAction {
    Claim(ClaimRewards),
    Approve(ApproveStaking),
}

/// The call to submit plus the registry entry to write once it has a hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedAction {
    pub call: ContractCall,
    pub kind: TransactionKind,
    pub amount: String,
    pub subject: String,
}

impl PreparedAction {
    pub fn pending_transaction(&self, hash: String) -> PendingTransaction {
        PendingTransaction {
            hash,
            kind: self.kind,
            amount: self.amount.clone(),
            subject: self.subject.clone(),
        }
    }
}

impl FlowAction {
    pub fn kind(&self) -> FlowKind {
        match self {
            FlowAction::Claim(_) => FlowKind::Claim,
            FlowAction::Approve(_) => FlowKind::Approval,
        }
    }

    pub fn is_actionable(&self) -> bool {
        match self {
            FlowAction::Claim(claim) => claim.is_actionable(),
            FlowAction::Approve(approve) => approve.is_actionable(),
        }
    }

    /// Build the call, or `None` when prerequisites are missing or there is nothing to claim
    pub fn prepare(&self) -> Option<PreparedAction> {
        match self {
            FlowAction::Claim(claim) => {
                let (minter, gauge, claimable) =
                    match (claim.minter, claim.gauge, claim.claimable) {
                        (Some(minter), Some(gauge), Some(claimable)) if !claimable.is_zero() => {
                            (minter, gauge, claimable)
                        }
                        _ => return None,
                    };

                Some(PreparedAction {
                    call: ContractCall {
                        to: minter,
                        data: encode_call(MINT_SELECTOR, &[Token::Address(gauge)]),
                    },
                    kind: TransactionKind::RewardClaim,
                    amount: format_big_number(claimable, claim.decimals),
                    subject: claim.vault.clone(),
                })
            }
            FlowAction::Approve(approve) => {
                let (token, spender) = approve.token.zip(approve.spender)?;

                Some(PreparedAction {
                    call: ContractCall {
                        to: token,
                        data: encode_call(
                            APPROVE_SELECTOR,
                            &[Token::Address(spender), Token::Uint(MAX_UINT256)],
                        ),
                    },
                    kind: TransactionKind::StakingApproval,
                    amount: format!("0x{}", hex::encode(MAX_UINT256.to_be_bytes())),
                    subject: approve.vault.clone(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn addr(byte: char) -> Address {
        Address::from_str(&format!("0x{}", byte.to_string().repeat(40))).unwrap()
    }

    fn claim(claimable: Option<Uint256>) -> FlowAction {
        FlowAction::Claim(ClaimRewards {
            minter: Some(addr('a')),
            gauge: Some(addr('b')),
            vault: "rETH-THETA".to_string(),
            claimable,
            decimals: 18,
        })
    }

    #[test]
    fn test_claim_prepares_mint_call() {
        let prepared = claim(Some(Uint256::from(250_000_000_000_000_000_000u128)))
            .prepare()
            .unwrap();

        assert_eq!(prepared.call.to, addr('a'));
        assert_eq!(&prepared.call.data[..4], &MINT_SELECTOR);
        assert_eq!(prepared.kind, TransactionKind::RewardClaim);
        assert_eq!(prepared.amount, "250");
        assert_eq!(prepared.subject, "rETH-THETA");
    }

    #[test]
    fn test_claim_not_actionable_without_amount() {
        assert!(claim(None).prepare().is_none());
        assert!(!claim(None).is_actionable());
        assert!(claim(Some(Uint256::zero())).prepare().is_none());
        assert!(!claim(Some(Uint256::zero())).is_actionable());
    }

    #[test]
    fn test_claim_not_actionable_without_gauge() {
        let action = FlowAction::Claim(ClaimRewards {
            minter: Some(addr('a')),
            gauge: None,
            vault: "rETH-THETA".to_string(),
            claimable: Some(Uint256::from(1u32)),
            decimals: 18,
        });
        assert!(action.prepare().is_none());
    }

    #[test]
    fn test_approve_prepares_unlimited_allowance() {
        let action = FlowAction::Approve(ApproveStaking {
            token: Some(addr('c')),
            spender: Some(addr('d')),
            vault: "rUSDC-ETH-P-THETA".to_string(),
        });
        let prepared = action.prepare().unwrap();

        assert_eq!(action.kind(), FlowKind::Approval);
        assert_eq!(prepared.call.to, addr('c'));
        assert_eq!(prepared.kind, TransactionKind::StakingApproval);
        assert_eq!(prepared.amount, format!("0x{}", "f".repeat(64)));

        let record = prepared.pending_transaction("0x99".to_string());
        assert_eq!(record.hash, "0x99");
        assert_eq!(record.subject, "rUSDC-ETH-P-THETA");
    }
}
