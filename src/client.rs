use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cosmwasm_std::{Uint128, Uint256};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::abi::{
    decode_exact, encode_call, parse_quantity, to_hex_data, Address, Token, ALLOWANCE_SELECTOR,
    BALANCE_OF_SELECTOR, CLAIMABLE_TOKENS_SELECTOR, GAUGE_RELATIVE_WEIGHT_SELECTOR,
    INFLATION_RATE_SELECTOR, REPORT_DELTA_SELECTOR, WORKING_BALANCES_SELECTOR,
};
use crate::action::ContractCall;
use crate::config::NetworkConfig;
use crate::controller::{ConfirmationWaiter, TransactionSubmitter};
use crate::error::Error;
use crate::rewards::{
    current_period_end, pool_reward_for_duration, GaugePoolData, StakingPoolData, WEIGHT_SCALE,
};
use crate::snapshot::{OracleReport, SnapshotSource};

/// EIP-1193 "user rejected request"
const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// The fields of a transaction receipt the SDK reads
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: String,
    /// Absent while the receipt belongs to a pending block
    pub block_number: Option<String>,
    /// `0x1` success, `0x0` reverted
    pub status: Option<String>,
}

impl TransactionReceipt {
    pub fn block(&self) -> Result<Option<u64>, Error> {
        self.block_number.as_deref().map(parse_quantity).transpose()
    }

    pub fn succeeded(&self) -> Result<bool, Error> {
        match self.status.as_deref() {
            Some(status) => Ok(parse_quantity(status)? == 1),
            None => Ok(true),
        }
    }
}

/// JSON-RPC client for the staking contracts
pub struct StakingClient {
    http: reqwest::Client,
    config: NetworkConfig,
    account: Option<Address>,
    request_id: AtomicU64,
}

impl StakingClient {
    /// Create a new client with the given configuration
    pub fn new(config: NetworkConfig) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            config,
            account: None,
            request_id: AtomicU64::new(1),
        })
    }

    /// Set the account that signs transactions
    pub fn with_account(mut self, account: Address) -> Self {
        self.account = Some(account);
        self
    }

    /// Get the signing account if available
    pub fn account(&self) -> Result<Address, Error> {
        self.account
            .ok_or_else(|| Error::Config("No account configured".to_string()))
    }

    /// Get the network configuration
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Issue a raw JSON-RPC request
    pub async fn rpc_call<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<R, Error> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.request_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        tracing::trace!(method, id = request.id, "JSON-RPC request");

        let response: RpcResponse = self
            .http
            .post(&self.config.rpc_url)
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(error) = response.error {
            if error.code == USER_REJECTED_CODE {
                return Err(Error::Rejected(error.message));
            }
            return Err(Error::Rpc(format!(
                "{} failed ({}): {}",
                method, error.code, error.message
            )));
        }

        serde_json::from_value(response.result.unwrap_or(Value::Null)).map_err(Into::into)
    }

    /// Read-only contract call, returning the raw hex result.
    ///
    /// Empty return data means there is no contract at `to` (or it has no
    /// such function), which is reported as [`Error::Contract`].
    pub async fn eth_call(&self, to: Address, data: &[u8]) -> Result<String, Error> {
        let result: String = self
            .rpc_call(
                "eth_call",
                json!([{ "to": to.to_string(), "data": to_hex_data(data) }, "latest"]),
            )
            .await?;

        if result == "0x" {
            return Err(Error::Contract(format!("Call to {} returned no data", to)));
        }
        Ok(result)
    }

    /// Get the latest block number
    pub async fn block_number(&self) -> Result<u64, Error> {
        let height: String = self.rpc_call("eth_blockNumber", json!([])).await?;
        parse_quantity(&height)
    }

    pub async fn transaction_receipt(
        &self,
        tx_hash: &str,
    ) -> Result<Option<TransactionReceipt>, Error> {
        self.rpc_call("eth_getTransactionReceipt", json!([tx_hash]))
            .await
    }

    async fn call_uint(
        &self,
        to: Address,
        selector: [u8; 4],
        args: &[Token],
    ) -> Result<Uint256, Error> {
        let result = self.eth_call(to, &encode_call(selector, args)).await?;
        Ok(decode_exact(&result, 1)?[0])
    }

    /// Unclaimed gauge rewards for `user`
    pub async fn claimable_tokens(&self, gauge: Address, user: Address) -> Result<Uint256, Error> {
        self.call_uint(gauge, CLAIMABLE_TOKENS_SELECTOR, &[Token::Address(user)])
            .await
    }

    pub async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<Uint256, Error> {
        self.call_uint(
            token,
            ALLOWANCE_SELECTOR,
            &[Token::Address(owner), Token::Address(spender)],
        )
        .await
    }

    pub async fn balance_of(&self, token: Address, owner: Address) -> Result<Uint256, Error> {
        self.call_uint(token, BALANCE_OF_SELECTOR, &[Token::Address(owner)])
            .await
    }

    /// Pool-level gauge data for the period containing `now`, with `user`'s stake.
    ///
    /// Without a configured gauge controller the gauge gets the full weight.
    pub async fn gauge_pool_data(
        &self,
        gauge: Address,
        user: Address,
        now: DateTime<Utc>,
    ) -> Result<GaugePoolData, Error> {
        let controller = self.config.contracts.gauge_controller()?;
        let relative_weight = async {
            match controller {
                Some(controller) => {
                    self.call_uint(
                        controller,
                        GAUGE_RELATIVE_WEIGHT_SELECTOR,
                        &[Token::Address(gauge)],
                    )
                    .await
                }
                None => Ok(Uint256::from(WEIGHT_SCALE)),
            }
        };

        let working_balance_args = [Token::Address(user)];
        let (current_stake, working_balance, inflation_rate, relative_weight) = futures::try_join!(
            self.balance_of(gauge, user),
            self.call_uint(gauge, WORKING_BALANCES_SELECTOR, &working_balance_args),
            self.call_uint(gauge, INFLATION_RATE_SELECTOR, &[]),
            relative_weight,
        )?;
        tracing::debug!(%gauge, %inflation_rate, %relative_weight, "Loaded gauge data");

        Ok(GaugePoolData {
            period_end_time: current_period_end(now),
            pool_reward_for_duration: pool_reward_for_duration(inflation_rate, relative_weight),
            current_stake,
            working_balance,
        })
    }

    /// `user`'s claimable gauge rewards and unstaked vault token balance
    pub async fn staking_pool_data(
        &self,
        gauge: Address,
        vault_token: Option<Address>,
        user: Address,
    ) -> Result<StakingPoolData, Error> {
        let claimable = self.claimable_tokens(gauge, user).await?;
        let unstaked_balance = match vault_token {
            Some(token) => self.balance_of(token, user).await?,
            None => Uint256::zero(),
        };
        Ok(StakingPoolData {
            claimable,
            unstaked_balance,
        })
    }

    /// Ask the connected wallet to sign and broadcast `call`
    pub async fn send_transaction(&self, call: &ContractCall) -> Result<String, Error> {
        let from = self.account()?;
        let tx_hash: String = self
            .rpc_call(
                "eth_sendTransaction",
                json!([{
                    "from": from.to_string(),
                    "to": call.to.to_string(),
                    "data": to_hex_data(&call.data),
                }]),
            )
            .await?;
        tracing::info!(tx_hash = %tx_hash, to = %call.to, "Transaction submitted");
        Ok(tx_hash)
    }

    /// Poll until `tx_hash` has `confirmations` blocks on top of (and including) its own
    pub async fn wait_for_confirmations(
        &self,
        tx_hash: &str,
        confirmations: u64,
    ) -> Result<(), Error> {
        tokio::time::timeout(
            self.config.confirmation_timeout(),
            self.poll_confirmations(tx_hash, confirmations),
        )
        .await
        .map_err(|_| Error::Timeout(format!("{} confirmations of {}", confirmations, tx_hash)))?
    }

    async fn poll_confirmations(&self, tx_hash: &str, confirmations: u64) -> Result<(), Error> {
        let poll_interval = self.config.poll_interval();
        loop {
            if let Some(receipt) = self.transaction_receipt(tx_hash).await? {
                if let Some(block) = receipt.block()? {
                    if !receipt.succeeded()? {
                        return Err(Error::Reverted {
                            hash: tx_hash.to_string(),
                        });
                    }
                    let latest = self.block_number().await?;
                    let confirmed = latest.saturating_sub(block) + 1;
                    tracing::debug!(tx_hash, confirmed, required = confirmations, "Polled receipt");
                    if confirmed >= confirmations {
                        return Ok(());
                    }
                }
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    /// Oracle binding for the yield snapshot, `None` when no oracle is deployed
    pub fn lido_oracle(self: &Arc<Self>) -> Result<Option<Arc<dyn SnapshotSource>>, Error> {
        Ok(self.config.contracts.lido_oracle()?.map(|address| {
            Arc::new(LidoOracle {
                client: Arc::clone(self),
                address,
            }) as Arc<dyn SnapshotSource>
        }))
    }
}

#[async_trait]
impl TransactionSubmitter for StakingClient {
    async fn submit(&self, call: &ContractCall) -> Result<String, Error> {
        self.send_transaction(call).await
    }
}

#[async_trait]
impl ConfirmationWaiter for StakingClient {
    async fn wait_for_transaction(&self, tx_hash: &str, confirmations: u64) -> Result<(), Error> {
        self.wait_for_confirmations(tx_hash, confirmations).await
    }
}

/// Lido oracle contract binding
pub struct LidoOracle {
    client: Arc<StakingClient>,
    address: Address,
}

#[async_trait]
impl SnapshotSource for LidoOracle {
    async fn last_completed_report_delta(&self) -> Result<OracleReport, Error> {
        let result = self
            .client
            .eth_call(self.address, &encode_call(REPORT_DELTA_SELECTOR, &[]))
            .await?;
        let words = decode_exact(&result, 3)?;
        let time_elapsed = Uint128::try_from(words[2])
            .ok()
            .and_then(|elapsed| u64::try_from(elapsed.u128()).ok())
            .ok_or_else(|| Error::Abi(format!("timeElapsed out of range: {}", words[2])))?;

        // Returned as (postTotalPooledEther, preTotalPooledEther, timeElapsed)
        Ok(OracleReport {
            post_total_pooled_ether: words[0],
            pre_total_pooled_ether: words[1],
            time_elapsed,
        })
    }
}
