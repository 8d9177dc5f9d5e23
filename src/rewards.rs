//! Reward Breakdown Calculations
//!
//! Splits unclaimed gauge rewards into their base and boosted shares and
//! builds the strings shown in the claim modal's info step.

use chrono::{DateTime, Utc};
use cosmwasm_std::Uint256;
use serde::{Deserialize, Serialize};

use crate::amount::{
    format_big_number, format_decimal, loading_text, to_f64, DISPLAY_FRACTION_DIGITS,
};

/// Placeholder when user data is unavailable
pub const MISSING_VALUE: &str = "---";

/// Gauge reward periods are whole weeks aligned to the unix epoch
pub const REWARD_PERIOD_SECS: i64 = 7 * 86_400;

/// Fixed-point scale of gauge relative weights
pub const WEIGHT_SCALE: u128 = 1_000_000_000_000_000_000;

/// Share of a gauge balance that counts without any boost
const UNBOOSTED_SHARE: f64 = 0.4;

/// Pool-level gauge data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GaugePoolData {
    /// Unix timestamp when the current reward period ends
    pub period_end_time: i64,
    /// Rewards emitted to the pool over the current period
    pub pool_reward_for_duration: Uint256,
    /// The user's stake in the gauge
    pub current_stake: Uint256,
    /// The user's boosted balance as the gauge counts it
    pub working_balance: Uint256,
}

/// User-level staking data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StakingPoolData {
    pub claimable: Uint256,
    /// Vault tokens held but not yet staked
    pub unstaked_balance: Uint256,
}

impl StakingPoolData {
    /// The staking pool must be approved before the whole unstaked balance can be staked
    pub fn needs_approval(&self, allowance: Uint256) -> bool {
        allowance.is_zero() || allowance < self.unstaked_balance
    }
}

/// Display-ready base and boosted shares
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardSplit {
    pub base: String,
    pub boosted: String,
}

/// Split `total` in proportion to the two rates.
///
/// A zero combined rate yields `"0"` for both shares.
pub fn split_rewards(total: f64, base_rate: f64, boosted_rate: f64) -> RewardSplit {
    let total_rate = base_rate + boosted_rate;
    if total_rate == 0.0 || total_rate.is_nan() {
        return RewardSplit {
            base: "0".to_string(),
            boosted: "0".to_string(),
        };
    }

    RewardSplit {
        base: format_decimal(total * base_rate / total_rate, DISPLAY_FRACTION_DIGITS),
        boosted: format_decimal(total * boosted_rate / total_rate, DISPLAY_FRACTION_DIGITS),
    }
}

/// Split a raw claimable amount
pub fn split_claimable(
    claimable: Uint256,
    decimals: u32,
    base_rate: f64,
    boosted_rate: f64,
) -> RewardSplit {
    split_rewards(to_f64(claimable, decimals), base_rate, boosted_rate)
}

/// Extra yield earned on top of the base rate with a boost multiplier (1.0 means no boost)
pub fn boosted_rate(base_apy: f64, multiplier: f64) -> f64 {
    if multiplier > 1.0 {
        base_apy * (multiplier - 1.0)
    } else {
        0.0
    }
}

/// Boost multiplier from a gauge's working balance, `working / (0.4 * stake)`.
///
/// Zero when nothing is staked.
pub fn boost_multiplier(stake: Uint256, working_balance: Uint256, decimals: u32) -> f64 {
    let stake = to_f64(stake, decimals);
    if stake == 0.0 {
        return 0.0;
    }
    to_f64(working_balance, decimals) / (stake * UNBOOSTED_SHARE)
}

/// End of the reward period containing `now`
pub fn current_period_end(now: DateTime<Utc>) -> i64 {
    (now.timestamp().div_euclid(REWARD_PERIOD_SECS) + 1) * REWARD_PERIOD_SECS
}

/// Rewards a gauge emits over one period from its inflation rate
/// (tokens per second) and its relative weight (scaled by [`WEIGHT_SCALE`])
pub fn pool_reward_for_duration(inflation_rate: Uint256, relative_weight: Uint256) -> Uint256 {
    inflation_rate
        .saturating_mul(Uint256::from(REWARD_PERIOD_SECS as u64))
        .saturating_mul(relative_weight)
        / Uint256::from(WEIGHT_SCALE)
}

/// `(2.50X)`, or empty when there is no multiplier
pub fn multiplier_label(multiplier: f64) -> String {
    if multiplier == 0.0 || multiplier.is_nan() {
        String::new()
    } else {
        format!("({:.2}X)", multiplier)
    }
}

/// Countdown to the end of the reward period, e.g. `3D 4H 5M`
pub fn time_till_next_reward(period_end_time: i64, now: DateTime<Utc>) -> String {
    let remaining = period_end_time - now.timestamp();
    if remaining <= 0 {
        return "Program Ended".to_string();
    }

    let days = remaining / 86_400;
    let hours = (remaining % 86_400) / 3_600;
    let minutes = (remaining % 3_600) / 60;
    format!("{}D {}H {}M", days, hours, minutes)
}

/// Everything the claim modal's info step displays
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardsBreakdown {
    pub unclaimed: String,
    pub total_pool_rewards: String,
    pub base_rewards: String,
    pub boosted_multiplier: String,
    pub boosted_rewards: String,
    pub time_till_next_reward: String,
}

/// Inputs to [`RewardsBreakdown::compute`]
#[derive(Debug, Clone, Copy)]
pub struct BreakdownInputs<'a> {
    pub gauge: Option<&'a GaugePoolData>,
    pub gauge_loading: bool,
    pub staking: Option<&'a StakingPoolData>,
    pub apys_loading: bool,
    pub base_apy: f64,
    pub decimals: u32,
    pub reward_symbol: &'a str,
    pub now: DateTime<Utc>,
}

impl RewardsBreakdown {
    /// Compute the breakdown; `boost_for_stake` maps the user's gauge stake to a multiplier
    pub fn compute(inputs: BreakdownInputs<'_>, boost_for_stake: impl Fn(Uint256) -> f64) -> Self {
        let loading = loading_text("Loading");

        let unclaimed = inputs
            .staking
            .map(|s| format_big_number(s.claimable, inputs.decimals))
            .unwrap_or_else(|| "0".to_string());

        let time_till_next_reward = if inputs.gauge_loading {
            loading.clone()
        } else {
            match inputs.gauge {
                Some(gauge) => time_till_next_reward(gauge.period_end_time, inputs.now),
                None => MISSING_VALUE.to_string(),
            }
        };

        if inputs.apys_loading {
            return Self {
                unclaimed,
                total_pool_rewards: loading.clone(),
                base_rewards: loading.clone(),
                boosted_multiplier: String::new(),
                boosted_rewards: loading,
                time_till_next_reward,
            };
        }

        let total_pool_rewards = match inputs.gauge {
            Some(gauge) => format!(
                "{} {}",
                format_big_number(gauge.pool_reward_for_duration, inputs.decimals),
                inputs.reward_symbol
            ),
            None => "-".to_string(),
        };

        let multiplier = boost_for_stake(
            inputs
                .gauge
                .map(|g| g.current_stake)
                .unwrap_or_default(),
        );
        let boosted = boosted_rate(inputs.base_apy, multiplier);

        let (base_rewards, boosted_rewards) = match inputs.staking {
            Some(staking) => {
                let split = split_claimable(
                    staking.claimable,
                    inputs.decimals,
                    inputs.base_apy,
                    boosted,
                );
                (split.base, split.boosted)
            }
            None => (MISSING_VALUE.to_string(), MISSING_VALUE.to_string()),
        };

        Self {
            unclaimed,
            total_pool_rewards,
            base_rewards,
            boosted_multiplier: multiplier_label(multiplier),
            boosted_rewards,
            time_till_next_reward,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn eth(value: u128) -> Uint256 {
        Uint256::from(value) * Uint256::from(10u128.pow(18))
    }

    fn now() -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000, 0).unwrap()
    }

    fn inputs<'a>(
        gauge: Option<&'a GaugePoolData>,
        staking: Option<&'a StakingPoolData>,
    ) -> BreakdownInputs<'a> {
        BreakdownInputs {
            gauge,
            gauge_loading: false,
            staking,
            apys_loading: false,
            base_apy: 0.05,
            decimals: 18,
            reward_symbol: "RBN",
            now: now(),
        }
    }

    #[test]
    fn test_split_scenario() {
        let split = split_rewards(250.0, 0.05, 0.10);
        assert_eq!(split.base, "83.33");
        assert_eq!(split.boosted, "166.67");
    }

    #[test]
    fn test_split_zero_rate() {
        let split = split_rewards(250.0, 0.0, 0.0);
        assert_eq!(split, RewardSplit { base: "0".to_string(), boosted: "0".to_string() });
    }

    #[test]
    fn test_split_reconstructs_total() {
        let cases = [
            (250.0, 0.05, 0.10),
            (1.0, 0.3, 0.7),
            (999.99, 0.12, 0.01),
            (10.0, 1.0, 0.0),
            // halves that round up on both sides
            (0.25, 0.5, 0.5),
            (2.25, 0.5, 0.5),
        ];
        for (total, base, boosted) in cases {
            let split = split_rewards(total, base, boosted);
            let parse = |s: &str| s.replace(',', "").parse::<f64>().unwrap();
            let sum = parse(&split.base) + parse(&split.boosted);
            assert!((sum - total).abs() <= 0.01 + 1e-9, "{} vs {}", sum, total);
        }
    }

    #[test]
    fn test_split_rounds_halves_up() {
        let split = split_rewards(0.25, 0.5, 0.5);
        assert_eq!(split.base, "0.13");
        assert_eq!(split.boosted, "0.13");
    }

    #[test]
    fn test_split_claimable_uses_decimals() {
        let split = split_claimable(eth(250), 18, 0.05, 0.10);
        assert_eq!(split.base, "83.33");
    }

    #[test]
    fn test_boosted_rate_and_label() {
        assert!((boosted_rate(0.1, 2.5) - 0.15).abs() < 1e-12);
        assert_eq!(boosted_rate(0.1, 1.0), 0.0);
        assert_eq!(boosted_rate(0.1, 0.0), 0.0);
        assert_eq!(multiplier_label(2.5), "(2.50X)");
        assert_eq!(multiplier_label(0.0), "");
    }

    #[test]
    fn test_boost_from_working_balance() {
        assert!((boost_multiplier(eth(10), eth(10), 18) - 2.5).abs() < 1e-12);
        assert!((boost_multiplier(eth(10), eth(4), 18) - 1.0).abs() < 1e-12);
        assert_eq!(boost_multiplier(Uint256::zero(), eth(4), 18), 0.0);
    }

    #[test]
    fn test_period_end_and_pool_reward() {
        let end = current_period_end(now());
        assert_eq!(end % REWARD_PERIOD_SECS, 0);
        assert!(end > now().timestamp() && end - now().timestamp() <= REWARD_PERIOD_SECS);

        // 1 token per second at half weight
        let reward = pool_reward_for_duration(eth(1), Uint256::from(WEIGHT_SCALE / 2));
        assert_eq!(reward, eth(302_400));
        assert_eq!(pool_reward_for_duration(eth(1), Uint256::zero()), Uint256::zero());
    }

    #[test]
    fn test_needs_approval() {
        let staking = StakingPoolData {
            claimable: Uint256::zero(),
            unstaked_balance: eth(5),
        };
        assert!(staking.needs_approval(Uint256::zero()));
        assert!(staking.needs_approval(eth(4)));
        assert!(!staking.needs_approval(eth(5)));
        assert!(!staking.needs_approval(Uint256::MAX));
        assert!(StakingPoolData::default().needs_approval(Uint256::zero()));
    }

    #[test]
    fn test_time_till_next_reward() {
        let end = now().timestamp() + 3 * 86_400 + 4 * 3_600 + 5 * 60 + 30;
        assert_eq!(time_till_next_reward(end, now()), "3D 4H 5M");
        assert_eq!(time_till_next_reward(now().timestamp(), now()), "Program Ended");
        assert_eq!(time_till_next_reward(now().timestamp() - 10, now()), "Program Ended");
    }

    #[test]
    fn test_breakdown_while_loading() {
        let mut input = inputs(None, None);
        input.apys_loading = true;
        input.gauge_loading = true;
        let breakdown = RewardsBreakdown::compute(input, |_| 1.0);

        assert_eq!(breakdown.base_rewards, "Loading...");
        assert_eq!(breakdown.boosted_rewards, "Loading...");
        assert_eq!(breakdown.total_pool_rewards, "Loading...");
        assert_eq!(breakdown.time_till_next_reward, "Loading...");
        assert_eq!(breakdown.boosted_multiplier, "");
        assert_eq!(breakdown.unclaimed, "0");
    }

    #[test]
    fn test_breakdown_without_data() {
        let breakdown = RewardsBreakdown::compute(inputs(None, None), |_| 0.0);
        assert_eq!(breakdown.total_pool_rewards, "-");
        assert_eq!(breakdown.base_rewards, MISSING_VALUE);
        assert_eq!(breakdown.boosted_rewards, MISSING_VALUE);
        assert_eq!(breakdown.time_till_next_reward, MISSING_VALUE);
    }

    #[test]
    fn test_breakdown_with_boost() {
        let gauge = GaugePoolData {
            period_end_time: now().timestamp() + 86_400,
            pool_reward_for_duration: eth(12_500),
            current_stake: eth(10),
            working_balance: eth(10),
        };
        let staking = StakingPoolData {
            claimable: eth(250),
            unstaked_balance: Uint256::zero(),
        };

        let breakdown = RewardsBreakdown::compute(inputs(Some(&gauge), Some(&staking)), |stake| {
            assert_eq!(stake, eth(10));
            3.0
        });

        // base 0.05, boosted 0.10
        assert_eq!(breakdown.unclaimed, "250");
        assert_eq!(breakdown.base_rewards, "83.33");
        assert_eq!(breakdown.boosted_rewards, "166.67");
        assert_eq!(breakdown.boosted_multiplier, "(3.00X)");
        assert_eq!(breakdown.total_pool_rewards, "12,500 RBN");
        assert_eq!(breakdown.time_till_next_reward, "1D 0H 0M");
    }
}
