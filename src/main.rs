// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ethers::types::Address;
use shade_network_node::{
    ConnectionType, FheSession, NetworkConfig, PrivacySettings, ShadeGraphClient, Web3Client,
    Web3Config,
};
use std::env;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "shade-node", about = "Confidential social-graph ledger client")]
struct Cli {
    /// Signer private key; without one, write operations are disabled
    #[arg(long, env = "SHADE_PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register the signer with a public name and bio
    Register {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        bio: String,
        /// Initial reputation score (encrypted before submission)
        #[arg(long, default_value_t = 50)]
        reputation: u32,
    },
    /// Create a connection to another user
    Connect {
        #[arg(long)]
        to: u64,
        /// friend, follower or blocked (encrypted before submission)
        #[arg(long, default_value = "friend")]
        kind: ConnectionType,
    },
    /// Send a pre-encrypted message
    Message {
        #[arg(long)]
        to: u64,
        /// Content, already encrypted by the caller; opaque to the ledger
        #[arg(long)]
        content: String,
    },
    /// Replace all four privacy flags
    Privacy {
        #[arg(long)]
        show_connections: bool,
        #[arg(long)]
        show_activity: bool,
        #[arg(long)]
        allow_messages: bool,
        #[arg(long)]
        show_reputation: bool,
    },
    /// Show a user's public profile
    Profile {
        #[arg(long)]
        id: u64,
    },
    /// Look up registration status and id for an address
    Lookup {
        #[arg(long)]
        address: Address,
    },
    /// Rotate the trusted proof authority (owner only)
    SetVerifier {
        #[arg(long)]
        address: Address,
    },
    /// Show connection, configuration and gateway status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = NetworkConfig::from_env()?;

    let web3 = Web3Client::new(Web3Config {
        rpc_url: config.rpc_url.clone(),
        chain_id: config.chain_id,
        confirmations: 1,
        polling_interval: Duration::from_millis(500),
        private_key: cli.private_key.clone(),
    })
    .await
    .context("failed to connect to the ledger RPC")?;

    if let Command::Status = cli.command {
        return status(&config, &web3).await;
    }

    let session = FheSession::new(config.gateway()?);
    session
        .initialize()
        .await
        .context("failed to initialize the FHE session")?;

    let client = ShadeGraphClient::connect(config, session, &web3).await?;

    match cli.command {
        Command::Register {
            name,
            bio,
            reputation,
        } => {
            let tx = client.register_user(&name, &bio, reputation).await?;
            println!("registration submitted: {:#x}", tx);
        }
        Command::Connect { to, kind } => {
            let tx = client.create_connection(to, kind).await?;
            println!("connection submitted: {:#x}", tx);
        }
        Command::Message { to, content } => {
            let tx = client.send_message(to, &content, false).await?;
            println!("message submitted: {:#x}", tx);
        }
        Command::Privacy {
            show_connections,
            show_activity,
            allow_messages,
            show_reputation,
        } => {
            let tx = client
                .update_privacy_settings(PrivacySettings {
                    show_connections,
                    show_activity,
                    allow_messages,
                    show_reputation,
                })
                .await?;
            println!("privacy update submitted: {:#x}", tx);
        }
        Command::Profile { id } => match client.get_user_profile(id).await? {
            Some(profile) => {
                println!("name:        {}", profile.public_name);
                println!("bio:         {}", profile.public_bio);
                println!("wallet:      {:#x}", profile.wallet);
                println!("created:     {}", format_timestamp(profile.created_at));
                println!("last active: {}", format_timestamp(profile.last_active));
            }
            None => println!("no user with id {}", id),
        },
        Command::Lookup { address } => {
            let registered = client.is_user_registered(address).await?;
            let id = client.get_user_id(address).await?;
            println!("registered: {}", registered);
            println!("user id:    {}", id);
        }
        Command::SetVerifier { address } => {
            let tx = client.set_verifier(address).await?;
            println!("verifier rotation submitted: {:#x}", tx);
        }
        Command::Status => unreachable!("handled above"),
    }

    Ok(())
}

async fn status(config: &NetworkConfig, web3: &Web3Client) -> Result<()> {
    println!("chain id:  {}", config.chain_id);
    println!("rpc:       {}", config.rpc_url);
    println!("connected: {}", web3.is_connected().await);
    match &config.contract_address {
        Some(address) => println!("contract:  {:#x}", address),
        None => println!("contract:  (not configured, operations disabled)"),
    }
    match &config.gateway_url {
        Some(gateway) => {
            let session = FheSession::new(gateway.clone());
            println!(
                "gateway:   {} (supported: {})",
                gateway,
                session.is_supported().await
            );
        }
        None => println!("gateway:   (not configured, encryption disabled)"),
    }
    Ok(())
}

fn format_timestamp(secs: u64) -> String {
    chrono::DateTime::from_timestamp(secs as i64, 0)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| secs.to_string())
}
