//! Staking Rewards CLI
//!
//! Command-line front end for the staking SDK: yield snapshot, reward
//! breakdown, reward claims and staking approvals against a JSON-RPC
//! endpoint whose wallet holds the configured account.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use staking_rewards_sdk::{
    amount::{format_big_number, format_decimal, parse_units, to_f64},
    explorer::StepMessage,
    logging::{init_logging, LoggingConfig},
    rewards::{boost_multiplier, BreakdownInputs},
    Address, ApproveStaking, Chain, ClaimRewards, Config, ControllerEvent, FlowAction, FlowKind,
    FlowOutcome, FlowStep, InMemoryRegistry, NetworkConfig, RewardsBreakdown, SnapshotHandle,
    StakingClient, StakingPoolData, TransactionController, TransactionStepView,
};
use tokio::sync::mpsc;

#[derive(Parser)]
#[command(name = "staking-cli")]
#[command(about = "Staking rewards: yield, reward claims and approvals")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Network section to load from config/network.toml
    #[arg(short, long, global = true, default_value = "mainnet")]
    network: String,

    /// Path to a full config file (overrides --network)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Custom RPC endpoint URL
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Signing account, must be unlocked in the connected wallet
    #[arg(long, global = true)]
    account: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the stETH yield from the last completed oracle report
    Yield,
    /// Split a reward amount into base and boosted shares
    Split(SplitArgs),
    /// Show the reward breakdown for a vault's gauge
    Rewards(RewardsArgs),
    /// Claim gauge rewards for a vault
    Claim(VaultArgs),
    /// Approve the staking pool to spend a vault's tokens
    Approve(VaultArgs),
}

#[derive(Args)]
struct SplitArgs {
    /// Total reward amount, in whole tokens
    #[arg(long)]
    claimable: String,
    /// Base APY as a fraction (0.05 = 5%)
    #[arg(long)]
    base_apy: f64,
    /// Boosted APY as a fraction
    #[arg(long)]
    boosted_apy: f64,
}

#[derive(Args)]
struct RewardsArgs {
    #[arg(long)]
    vault: String,
    /// Base APY as a fraction
    #[arg(long, default_value = "0")]
    base_apy: f64,
    /// Boost multiplier override (defaults to the gauge's working balance boost)
    #[arg(long)]
    boost: Option<f64>,
}

#[derive(Args)]
struct VaultArgs {
    #[arg(long)]
    vault: String,
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path).with_context(|| format!("loading {}", path.display()))?,
        None if Config::default_path().exists() => Config::load(&Config::default_path())?,
        None => Config::with_network(
            NetworkConfig::load(&cli.network)
                .with_context(|| format!("loading network {}", cli.network))?,
        ),
    };

    if let Some(rpc_url) = &cli.rpc_url {
        config.network = config.network.with_rpc_url(rpc_url.clone());
    }
    if let Some(account) = &cli.account {
        config.account = Some(account.clone());
    }
    Ok(config)
}

fn build_client(config: &Config) -> anyhow::Result<Arc<StakingClient>> {
    let mut client = StakingClient::new(config.network.clone())?;
    if let Some(account) = config.account()? {
        client = client.with_account(account);
    }
    Ok(Arc::new(client))
}

async fn show_yield(config: &Config) -> anyhow::Result<()> {
    let client = build_client(config)?;
    let mut handle = SnapshotHandle::spawn(client.lido_oracle()?);
    let snapshot = handle.settled().await;

    if snapshot.loading {
        bail!("oracle snapshot could not be fetched");
    }

    let data = snapshot.data;
    println!(
        "Pre-report pooled ETH:  {}",
        format_big_number(data.pre_total_pooled_ether, 18)
    );
    println!(
        "Post-report pooled ETH: {}",
        format_big_number(data.post_total_pooled_ether, 18)
    );
    println!("Time elapsed:           {}s", data.time_elapsed);
    println!("Yield:                  {}%", format_decimal(snapshot.annual_yield() * 100.0, 2));
    Ok(())
}

fn show_split(args: &SplitArgs) -> anyhow::Result<()> {
    let total = to_f64(parse_units(&args.claimable, 18)?, 18);
    let split = staking_rewards_sdk::split_rewards(total, args.base_apy, args.boosted_apy);
    println!("Base rewards:    {}", split.base);
    println!("Boosted rewards: {}", split.boosted);
    Ok(())
}

async fn show_rewards(config: &Config, args: &RewardsArgs) -> anyhow::Result<()> {
    let client = build_client(config)?;
    let account = client.account()?;
    let contracts = &config.network.contracts;
    let Some(gauge) = contracts.gauge(&args.vault)? else {
        bail!("no gauge configured for {}", args.vault);
    };

    let now = Utc::now();
    let gauge_data = client.gauge_pool_data(gauge, account, now).await?;
    let staking = client
        .staking_pool_data(gauge, contracts.vault_token(&args.vault)?, account)
        .await?;
    let decimals = config.decimals(&args.vault);
    let symbol = &config.network.reward_symbol;

    let breakdown = RewardsBreakdown::compute(
        BreakdownInputs {
            gauge: Some(&gauge_data),
            gauge_loading: false,
            staking: Some(&staking),
            apys_loading: false,
            base_apy: args.base_apy,
            decimals,
            reward_symbol: symbol,
            now,
        },
        |stake| {
            args.boost
                .unwrap_or_else(|| boost_multiplier(stake, gauge_data.working_balance, decimals))
        },
    );

    println!("Unclaimed {}: {}", symbol, breakdown.unclaimed);
    println!("Time Till Next Reward: {}", breakdown.time_till_next_reward);
    println!("Total Pool Rewards: {}", breakdown.total_pool_rewards);
    println!("Base Rewards: {}", breakdown.base_rewards);
    println!(
        "Boosted Rewards {}: {}",
        breakdown.boosted_multiplier, breakdown.boosted_rewards
    );
    println!(
        "Unstaked balance: {}",
        format_big_number(staking.unstaked_balance, decimals)
    );
    Ok(())
}

fn print_step(kind: FlowKind, step: &FlowStep, chain: Chain) {
    let Some(view) = TransactionStepView::for_step(kind, step, chain) else {
        println!("Back to info");
        return;
    };

    match &view.message {
        StepMessage::ViewOnExplorer { url, .. } => {
            println!("{}: {} ({})", view.title, view.message.text(), url)
        }
        StepMessage::ConfirmInWallet => println!("{}: {}", view.title, view.message.text()),
    }
}

async fn run_flow(
    config: &Config,
    client: Arc<StakingClient>,
    action: FlowAction,
) -> anyhow::Result<()> {
    let registry = Arc::new(InMemoryRegistry::new());
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let kind = action.kind();
    let chain = config.network.explorer_chain();

    let controller = TransactionController::new(kind, client.clone(), client, registry)
        .with_confirmations(config.network.confirmations)
        .with_event_sender(event_tx);

    if !controller.can_trigger(&action).await {
        bail!("nothing to do: prerequisites are not loaded or the amount is zero");
    }

    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                ControllerEvent::StepChanged(step) => print_step(kind, &step, chain),
                ControllerEvent::CloseRequested => println!("Done"),
            }
        }
    });

    let outcome = controller.trigger(&action).await;
    drop(controller);
    printer.await.context("step printer task failed")?;

    match outcome {
        FlowOutcome::Confirmed { tx_hash } => {
            println!("Confirmed: {}", tx_hash);
            Ok(())
        }
        FlowOutcome::Rejected(e) => bail!("transaction rejected: {}", e),
        FlowOutcome::ConfirmationFailed { tx_hash, error } => {
            bail!("transaction {} was not confirmed: {}", tx_hash, error)
        }
        FlowOutcome::Ignored => bail!("action ignored"),
    }
}

async fn claim(config: &Config, args: &VaultArgs) -> anyhow::Result<()> {
    let client = build_client(config)?;
    let contracts = &config.network.contracts;
    let gauge = contracts.gauge(&args.vault)?;
    let claimable = match gauge {
        Some(gauge) => Some(client.claimable_tokens(gauge, client.account()?).await?),
        None => None,
    };

    let action = FlowAction::Claim(ClaimRewards {
        minter: contracts.token_minter()?,
        gauge,
        vault: args.vault.clone(),
        claimable,
        decimals: config.decimals(&args.vault),
    });
    run_flow(config, client, action).await
}

async fn approve(config: &Config, args: &VaultArgs) -> anyhow::Result<()> {
    let client = build_client(config)?;
    let contracts = &config.network.contracts;
    let token = contracts.vault_token(&args.vault)?;
    let spender = contracts.staking_pool(&args.vault)?;

    if let (Some(token), Some(spender)) = (token, spender) {
        let owner = client.account()?;
        let staking = StakingPoolData {
            unstaked_balance: client.balance_of(token, owner).await?,
            ..StakingPoolData::default()
        };
        let allowance = client.allowance(token, owner, spender).await?;
        if !staking.needs_approval(allowance) {
            println!("{} is already approved for staking", args.vault);
            return Ok(());
        }
    }

    let action = FlowAction::Approve(ApproveStaking {
        token,
        spender,
        vault: args.vault.clone(),
    });
    run_flow(config, client, action).await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_logging(&LoggingConfig::from_env().verbose(cli.verbose))?;

    if let Some(account) = &cli.account {
        Address::from_str(account).context("invalid --account")?;
    }

    match &cli.command {
        Commands::Split(args) => show_split(args),
        Commands::Yield => show_yield(&load_config(&cli)?).await,
        Commands::Rewards(args) => show_rewards(&load_config(&cli)?, args).await,
        Commands::Claim(args) => claim(&load_config(&cli)?, args).await,
        Commands::Approve(args) => approve(&load_config(&cli)?, args).await,
    }
}
