//! Venus → Piggy vault migrator
//!
//! Moves a leveraged Venus position into a Piggy trove through the
//! VaultMigration flash-loan contract.
//!
//! ```text
//! vault-migrator plan <account>          read-only plan and hints
//! vault-migrator migrate                 plan and execute for the signer
//! vault-migrator open <deposit> <bps>    open a source position (12500 = 125%)
//! vault-migrator close                   repay and redeem the source position
//! ```

use std::num::NonZeroU64;
use std::sync::Arc;

use alloy::primitives::{utils::parse_ether, Address, U256};
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use migrator_chain::{
    PiggyTroves, ProviderManager, TransactionSender, TransactionSenderBuilder,
    VaultMigrationGateway, VenusMarket, VenusPositionWriter,
};
use migrator_core::{
    DeploymentConfig, MigrationConfig, MigrationMarkets, MigrationPreparer, Migrator,
    PositionPreparer, ResolvedDeployment,
};

/// Environment variable names.
mod env {
    pub const DEPLOYMENT: &str = "MIGRATOR_DEPLOYMENT";
    pub const CONFIG: &str = "MIGRATOR_CONFIG";
    pub const PRIVATE_KEY: &str = "PRIVATE_KEY";
}

const DEFAULT_DEPLOYMENT: &str = "config/bsc.toml";

enum Command {
    Plan { account: Address },
    Migrate,
    Open { deposit: U256, ratio_bps: NonZeroU64 },
    Close,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,migrator_core=debug,migrator_chain=debug")),
        )
        .init();

    let command = parse_command(std::env::args().skip(1).collect())?;

    // MIGRATOR_CONFIG points at a TOML file, otherwise MIGRATOR_PROFILE picks a profile
    let config = match std::env::var(env::CONFIG) {
        Ok(path) => MigrationConfig::from_file(&path)?,
        Err(_) => MigrationConfig::from_env(),
    };
    config.log_config();

    let deployment_path =
        std::env::var(env::DEPLOYMENT).unwrap_or_else(|_| DEFAULT_DEPLOYMENT.to_string());
    let deployment = DeploymentConfig::from_file(&deployment_path)?.resolve()?;
    info!(chain = %deployment.name, chain_id = deployment.chain_id, "Deployment loaded");

    let providers = ProviderManager::new(
        &deployment.rpc.read,
        &deployment.rpc.hint,
        &deployment.rpc.send,
    )?;
    if !providers.health_check(deployment.chain_id).await? {
        warn!(expected = deployment.chain_id, "RPC endpoints report a different chain");
    }

    match command {
        Command::Plan { account } => {
            // Read-only: no signer needed
            let preparer = MigrationPreparer::new(
                Arc::new(VenusMarket::new(providers.read_provider()?, deployment.contracts.venus())),
                Arc::new(PiggyTroves::new(providers.hint_provider()?, deployment.contracts.piggy())),
                migration_markets(&deployment),
                &config,
            );
            let prepared = preparer.prepare(account).await?;
            print_json(&prepared)
        }
        Command::Migrate => {
            let sender = build_sender(&providers, &deployment, &config).await?;
            let gateway = Arc::new(VaultMigrationGateway::new(
                sender.clone(),
                deployment.contracts.vault_migration,
            ));
            let mut migrator = Migrator::new(
                Arc::new(VenusMarket::new(providers.read_provider()?, deployment.contracts.venus())),
                Arc::new(PiggyTroves::new(providers.hint_provider()?, deployment.contracts.piggy())),
                gateway,
                migration_markets(&deployment),
                &config,
            );

            let report = migrator.migrate(sender.address).await?;
            if let Some(url) = deployment.tx_url(&report.migration_tx.to_string()) {
                info!(url = %url, "Migration transaction");
            }
            print_json(&report)
        }
        Command::Open { deposit, ratio_bps } => {
            let preparer = build_preparer(&providers, &deployment, &config).await?;
            let opened = preparer.open_with_ratio(deposit, ratio_bps).await?;
            print_json(&opened)
        }
        Command::Close => {
            let preparer = build_preparer(&providers, &deployment, &config).await?;
            let closed = preparer.close_all().await?;
            print_json(&closed)
        }
    }
}

fn parse_command(args: Vec<String>) -> Result<Command> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    match args.as_slice() {
        ["plan", account] => Ok(Command::Plan {
            account: account
                .parse()
                .with_context(|| format!("invalid account {account}"))?,
        }),
        ["migrate"] => Ok(Command::Migrate),
        ["open", deposit, ratio_bps] => Ok(Command::Open {
            deposit: parse_ether(deposit).with_context(|| format!("invalid deposit {deposit}"))?,
            ratio_bps: ratio_bps
                .parse()
                .with_context(|| format!("invalid ratio {ratio_bps}, expected basis points"))?,
        }),
        ["close"] => Ok(Command::Close),
        _ => anyhow::bail!(
            "usage: vault-migrator plan <account> | migrate | open <deposit> <ratio_bps> | close"
        ),
    }
}

fn migration_markets(deployment: &ResolvedDeployment) -> MigrationMarkets {
    MigrationMarkets {
        collateral_vtoken: deployment.contracts.collateral_vtoken,
        debt_vtoken: deployment.contracts.debt_vtoken,
        debt_token: deployment.contracts.debt_token,
    }
}

async fn build_sender(
    providers: &ProviderManager,
    deployment: &ResolvedDeployment,
    config: &MigrationConfig,
) -> Result<Arc<TransactionSender>> {
    let private_key = std::env::var(env::PRIVATE_KEY)
        .map_err(|_| anyhow::anyhow!("Missing env var: {}", env::PRIVATE_KEY))?;
    let gas = &deployment.gas;

    let sender = TransactionSenderBuilder::new(providers.send_url(), deployment.chain_id)
        .gas_from_config(
            &gas.pricing,
            gas.default_gas_price_gwei,
            gas.max_gas_price_gwei,
            gas.priority_fee_gwei,
        )
        .gas_limit(config.execution.migration_gas_limit)
        .build(&private_key)
        .await?;

    let balance = sender.get_balance().await?;
    info!(address = %sender.address, balance = %balance, "Signer ready");
    Ok(Arc::new(sender))
}

async fn build_preparer(
    providers: &ProviderManager,
    deployment: &ResolvedDeployment,
    config: &MigrationConfig,
) -> Result<PositionPreparer> {
    let sender = build_sender(providers, deployment, config).await?;
    let contracts = &deployment.contracts;
    Ok(PositionPreparer::new(
        Arc::new(VenusMarket::new(providers.read_provider()?, contracts.venus())),
        Arc::new(VenusPositionWriter::new(sender, contracts.comptroller)),
        contracts.collateral_vtoken,
        contracts.debt_vtoken,
        contracts.debt_underlying,
        &config.preparation,
    ))
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
