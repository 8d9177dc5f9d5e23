//! Oracle Snapshot Fetching
//!
//! Reads the last completed oracle report once, exposes it as a
//! `{data, loading}` snapshot and derives the annualised staking yield.
//! The fetch runs in a background task that is cancelled when its
//! [`SnapshotHandle`] is dropped; there is no retry and no cache.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use cosmwasm_std::Uint256;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::amount::{to_f64, DEFAULT_DECIMALS};
use crate::error::Error;

pub const SECONDS_PER_YEAR: f64 = 60.0 * 60.0 * 24.0 * 365.0;

/// Pooled totals around the last completed oracle report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OracleReport {
    pub pre_total_pooled_ether: Uint256,
    pub post_total_pooled_ether: Uint256,
    /// Seconds between the two reports
    pub time_elapsed: u64,
}

/// Point-in-time read of the oracle, with its loading flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericSnapshot {
    pub data: OracleReport,
    pub loading: bool,
}

impl Default for NumericSnapshot {
    fn default() -> Self {
        Self {
            data: OracleReport::default(),
            loading: true,
        }
    }
}

impl NumericSnapshot {
    pub fn loaded(data: OracleReport) -> Self {
        Self {
            data,
            loading: false,
        }
    }

    /// Annualised yield as a fraction (`0.05` is 5%).
    ///
    /// Reports zero while loading and whenever the pre-report total or the
    /// elapsed time is zero, so callers never see `NaN` or infinity.
    pub fn annual_yield(&self) -> f64 {
        if self.loading {
            return 0.0;
        }

        let pre = to_f64(self.data.pre_total_pooled_ether, DEFAULT_DECIMALS);
        let post = to_f64(self.data.post_total_pooled_ether, DEFAULT_DECIMALS);
        let elapsed = self.data.time_elapsed as f64;
        if pre == 0.0 || elapsed == 0.0 {
            return 0.0;
        }

        ((post - pre) * SECONDS_PER_YEAR) / (pre * elapsed)
    }
}

/// Read-only binding to the oracle contract
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn last_completed_report_delta(&self) -> Result<OracleReport, Error>;
}

/// Fetch a snapshot once.
///
/// With no source (oracle not deployed on this network) the snapshot is
/// marked loaded with zero values.
pub async fn fetch_snapshot(source: Option<&dyn SnapshotSource>) -> Result<NumericSnapshot, Error> {
    let Some(source) = source else {
        tracing::debug!("No oracle binding configured, snapshot left empty");
        return Ok(NumericSnapshot {
            loading: false,
            ..NumericSnapshot::default()
        });
    };

    let start_time = Instant::now();
    let report = source.last_completed_report_delta().await?;
    tracing::debug!(
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Oracle report fetched"
    );

    Ok(NumericSnapshot::loaded(report))
}

/// Background snapshot fetch bound to the lifetime of its consumer
pub struct SnapshotHandle {
    receiver: watch::Receiver<NumericSnapshot>,
    cancellation_token: CancellationToken,
}

impl SnapshotHandle {
    /// Start fetching. Must be called from within a tokio runtime.
    pub fn spawn(source: Option<Arc<dyn SnapshotSource>>) -> Self {
        let (sender, receiver) = watch::channel(NumericSnapshot::default());
        let cancellation_token = CancellationToken::new();
        let token = cancellation_token.clone();

        tokio::spawn(async move {
            let fetch = fetch_snapshot(source.as_deref());
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!("Snapshot consumer went away, discarding fetch");
                }
                result = fetch => match result {
                    Ok(snapshot) => {
                        sender.send_replace(snapshot);
                    }
                    Err(e) => {
                        // Left in the loading state; yield keeps reporting zero
                        tracing::warn!("Failed to fetch oracle snapshot: {}", e);
                    }
                },
            }
        });

        Self {
            receiver,
            cancellation_token,
        }
    }

    /// Latest snapshot value
    pub fn current(&self) -> NumericSnapshot {
        *self.receiver.borrow()
    }

    pub fn annual_yield(&self) -> f64 {
        self.current().annual_yield()
    }

    pub fn subscribe(&self) -> watch::Receiver<NumericSnapshot> {
        self.receiver.clone()
    }

    /// Wait until the fetch has settled and return the final snapshot.
    ///
    /// A failed fetch settles without ever leaving the loading state.
    pub async fn settled(&mut self) -> NumericSnapshot {
        loop {
            let snapshot = *self.receiver.borrow_and_update();
            if !snapshot.loading {
                return snapshot;
            }
            if self.receiver.changed().await.is_err() {
                return *self.receiver.borrow();
            }
        }
    }
}

impl Drop for SnapshotHandle {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(pre: u128, post: u128, elapsed: u64) -> OracleReport {
        OracleReport {
            pre_total_pooled_ether: Uint256::from(pre),
            post_total_pooled_ether: Uint256::from(post),
            time_elapsed: elapsed,
        }
    }

    #[test]
    fn test_weekly_report_yield() {
        let snapshot = NumericSnapshot::loaded(report(100, 110, 604_800));
        let expected = 0.1 * (31_536_000.0 / 604_800.0);
        assert!((snapshot.annual_yield() - expected).abs() < 1e-9);
        assert!((snapshot.annual_yield() - 5.214).abs() < 1e-3);
    }

    #[test]
    fn test_yield_is_zero_while_loading() {
        let snapshot = NumericSnapshot {
            data: report(100, 110, 604_800),
            loading: true,
        };
        assert_eq!(snapshot.annual_yield(), 0.0);
        assert_eq!(NumericSnapshot::default().annual_yield(), 0.0);
    }

    #[test]
    fn test_yield_guards_zero_denominators() {
        assert_eq!(NumericSnapshot::loaded(report(0, 110, 604_800)).annual_yield(), 0.0);
        assert_eq!(NumericSnapshot::loaded(report(100, 110, 0)).annual_yield(), 0.0);
        assert_eq!(NumericSnapshot::loaded(report(0, 0, 0)).annual_yield(), 0.0);
    }

    #[test]
    fn test_yield_uses_scaled_values() {
        let eth = 10u128.pow(18);
        let snapshot = NumericSnapshot::loaded(report(1000 * eth, 1001 * eth, 86_400));
        assert!((snapshot.annual_yield() - 0.365).abs() < 1e-9);
    }
}
