//! Ethereum wallet CLI
//!
//! Command-line interface for creating a local wallet and sending ETH.

use clap::{Parser, Subcommand};
use eth_wallet::chain::RpcChainClient;
use eth_wallet::commands;
use eth_wallet::secret::TerminalPrompt;
use eth_wallet::units::format_ether;
use eth_wallet::{Config, Error, Interrupt, Result, RpcConfig, TransferFlow};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Exit status after Ctrl-C
const EXIT_INTERRUPTED: u8 = 130;

/// How long an interrupted command gets to reach its next interrupt check
const INTERRUPT_GRACE: Duration = Duration::from_millis(500);

#[derive(Parser)]
#[command(name = "eth-wallet")]
#[command(about = "Simple Ethereum wallet with a local address book")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the wallet files
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// JSON-RPC endpoint (overrides config file and environment)
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Seconds to wait for confirmation, 0 waits forever
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new wallet
    Create {
        /// Replace an existing wallet key
        #[arg(long)]
        force: bool,
    },

    /// Get the wallet address
    GetAddress,

    /// Decrypt and print the private key
    GetPrivateKey,

    /// Save an address under an alias
    SaveAlias {
        alias: String,
        address: String,
    },

    /// Send ETH to a saved alias
    SendToAlias {
        alias: String,
        /// Amount in ETH
        amount: String,
    },

    /// Get the balance of an address or alias
    Balance {
        /// Address or alias
        address: String,
    },

    /// Send ETH to an address or alias
    Send {
        /// Recipient address or alias
        #[arg(long)]
        to: String,

        /// Amount in ETH
        #[arg(long)]
        amount: String,
    },

    /// Show current configuration
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for command output
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let (text_layer, json_layer) = if cli.log_json {
        (None, Some(fmt::layer().json().with_writer(std::io::stderr)))
    } else {
        (Some(fmt::layer().with_writer(std::io::stderr)), None)
    };

    tracing_subscriber::registry()
        .with(text_layer)
        .with(json_layer)
        .with(filter)
        .init();

    // Password prompts block their worker, so the command runs on its own task
    let interrupt = Interrupt::new();
    let mut command = tokio::spawn(run(cli, interrupt.clone()));

    let joined = tokio::select! {
        joined = &mut command => joined,
        _ = tokio::signal::ctrl_c() => {
            interrupt.trigger();
            tracing::warn!("Interrupted");
            // A command between steps stops at its next check; one blocked in a
            // password prompt never returns, so the process exits without it
            let _ = tokio::time::timeout(INTERRUPT_GRACE, &mut command).await;
            std::process::exit(i32::from(EXIT_INTERRUPTED));
        }
    };

    match joined {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(Error::Interrupted)) => ExitCode::from(EXIT_INTERRUPTED),
        Ok(Err(e)) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    if let Some(url) = &cli.rpc_url {
        config.rpc_url = Some(url.clone());
    }
    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if let Some(secs) = cli.timeout {
        config.confirmation_timeout_secs = (secs > 0).then_some(secs);
    }

    Ok(config.with_rpc_fallback(&RpcConfig::from_env()))
}

async fn run(cli: Cli, interrupt: Interrupt) -> Result<()> {
    let config = load_config(&cli)?;
    let files = config.files();
    let prompt = TerminalPrompt;

    tracing::debug!(data_dir = %config.data_dir.display(), "Using wallet directory");

    match cli.command {
        Commands::Create { force } => {
            let wallet = commands::create(&files, &prompt, force, &interrupt)?;
            println!(
                "Wallet created:\nAddress: {}\n(Note: The private key is encrypted.)",
                wallet.address_string()
            );
            println!("Alias \"{}\" has been set for your address.", eth_wallet::SELF_ALIAS);
        }
        Commands::GetAddress => {
            let address = commands::get_address(&files)?;
            println!("Wallet Address: {}", address);
        }
        Commands::GetPrivateKey => {
            let key = commands::get_private_key(&files, &prompt, &interrupt)?;
            println!("Private Key: {}", key.as_str());
        }
        Commands::SaveAlias { alias, address } => {
            commands::save_alias(&files, &alias, &address)?;
            println!("Address {} saved as {}.", address.trim(), alias.trim());
        }
        Commands::SendToAlias { alias, amount } => {
            let chain = RpcChainClient::from_config(&config)?;
            let flow = TransferFlow::new(&chain, config.confirmation_timeout())
                .with_interrupt(interrupt.clone());
            println!("Sending {} ETH to {}...", amount, alias);
            let receipt =
                commands::send_to_alias(&files, &prompt, &flow, &alias, &amount).await?;
            println!("Transaction successful! Hash: {}", receipt.tx_hash);
        }
        Commands::Balance { address } => {
            let chain = RpcChainClient::from_config(&config)?;
            let balance = commands::balance(&files, &chain, &address).await?;
            println!(
                "Balance of {} ({}): {} ETH",
                balance.address.to_checksum(None),
                balance.query,
                format_ether(balance.wei)
            );
        }
        Commands::Send { to, amount } => {
            let chain = RpcChainClient::from_config(&config)?;
            let flow = TransferFlow::new(&chain, config.confirmation_timeout())
                .with_interrupt(interrupt.clone());
            println!("Sending {} ETH to {}...", amount, to);
            let receipt = commands::send(&files, &prompt, &flow, &to, &amount).await?;
            println!("Transaction successful! Hash: {}", receipt.tx_hash);
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
