use async_trait::async_trait;
use staking_rewards_sdk::{
    Address, ConfirmationWaiter, ContractCall, Error, OracleReport, SnapshotSource,
    TransactionSubmitter, Uint256,
};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::Notify;

#[cfg(test)]
pub mod test_utils {
    use super::*;

    /// Address made of one repeated hex digit, e.g. `0xaaaa...`
    #[allow(dead_code)]
    pub fn address(digit: char) -> Address {
        Address::from_str(&format!("0x{}", digit.to_string().repeat(40)))
            .expect("Failed to build test address")
    }

    /// Whole tokens with 18 decimals
    #[allow(dead_code)]
    pub fn eth(whole: u128) -> Uint256 {
        Uint256::from(whole) * Uint256::from(10u128.pow(18))
    }

    /// Submitter returning a fixed hash, or rejecting like a wallet would
    #[allow(dead_code)]
    pub struct FakeSubmitter {
        response: Result<String, String>,
        calls: AtomicUsize,
    }

    #[allow(dead_code)]
    impl FakeSubmitter {
        pub fn accepting(tx_hash: &str) -> Self {
            Self {
                response: Ok(tx_hash.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn rejecting() -> Self {
            Self {
                response: Err("User denied transaction signature".to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TransactionSubmitter for FakeSubmitter {
        async fn submit(&self, _call: &ContractCall) -> Result<String, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.response.clone().map_err(Error::Rejected)
        }
    }

    /// Submitter that holds the wallet prompt open until released
    #[allow(dead_code)]
    pub struct GatedSubmitter {
        tx_hash: String,
        gate: Notify,
    }

    #[allow(dead_code)]
    impl GatedSubmitter {
        pub fn new(tx_hash: &str) -> Self {
            Self {
                tx_hash: tx_hash.to_string(),
                gate: Notify::new(),
            }
        }

        pub fn release(&self) {
            self.gate.notify_one();
        }
    }

    #[async_trait]
    impl TransactionSubmitter for GatedSubmitter {
        async fn submit(&self, _call: &ContractCall) -> Result<String, Error> {
            self.gate.notified().await;
            Ok(self.tx_hash.clone())
        }
    }

    /// Waiter that records each call and either confirms or times out
    #[allow(dead_code)]
    pub struct FakeWaiter {
        fail: bool,
        calls: Mutex<Vec<(String, u64)>>,
    }

    #[allow(dead_code)]
    impl FakeWaiter {
        pub fn confirming() -> Self {
            Self {
                fail: false,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn failing() -> Self {
            Self {
                fail: true,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> Vec<(String, u64)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ConfirmationWaiter for FakeWaiter {
        async fn wait_for_transaction(
            &self,
            tx_hash: &str,
            confirmations: u64,
        ) -> Result<(), Error> {
            self.calls
                .lock()
                .unwrap()
                .push((tx_hash.to_string(), confirmations));
            if self.fail {
                return Err(Error::Timeout(format!("waiting for {}", tx_hash)));
            }
            Ok(())
        }
    }

    /// Waiter that holds the transaction pending until released
    #[allow(dead_code)]
    pub struct GatedWaiter {
        gate: Notify,
    }

    #[allow(dead_code)]
    impl GatedWaiter {
        pub fn new() -> Self {
            Self {
                gate: Notify::new(),
            }
        }

        pub fn release(&self) {
            self.gate.notify_one();
        }
    }

    #[async_trait]
    impl ConfirmationWaiter for GatedWaiter {
        async fn wait_for_transaction(
            &self,
            _tx_hash: &str,
            _confirmations: u64,
        ) -> Result<(), Error> {
            self.gate.notified().await;
            Ok(())
        }
    }

    /// Oracle returning a fixed report, optionally after a delay
    #[allow(dead_code)]
    pub struct FakeOracle {
        pub report: OracleReport,
        pub delay: Option<Duration>,
    }

    #[async_trait]
    impl SnapshotSource for FakeOracle {
        async fn last_completed_report_delta(&self) -> Result<OracleReport, Error> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(self.report)
        }
    }

    /// Oracle whose call always reverts
    #[allow(dead_code)]
    pub struct FailingOracle;

    #[async_trait]
    impl SnapshotSource for FailingOracle {
        async fn last_completed_report_delta(&self) -> Result<OracleReport, Error> {
            Err(Error::Rpc("execution reverted".to_string()))
        }
    }
}
