// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Network configuration
//!
//! Explicit configuration struct for the confidential graph client. Every
//! recognized option is a named field with a documented effect; an unset
//! contract or gateway is a typed `NotConfigured` state, never a silent
//! empty-string fallback.

use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A required option is unset; all dependent operations are disabled
    #[error("not configured: {0}")]
    NotConfigured(&'static str),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Recognized configuration options.
///
/// Environment mapping (`from_env`, dotenv-aware via the binary):
/// - `SHADE_CHAIN_ID` — ledger chain identifier (default: Sepolia)
/// - `SHADE_RPC_URL` — ledger RPC endpoint
/// - `SHADE_CONTRACT_ADDRESS` — ledger contract; unset disables all
///   write/read operations (`NotConfigured`)
/// - `SHADE_FHE_GATEWAY_URL` — encryption network endpoint; unset
///   disables encryption (`NotConfigured`)
/// - `SHADE_WALLETCONNECT_PROJECT_ID` — passed through to wallet UX,
///   unused by this crate beyond carrying it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub chain_id: u64,
    pub rpc_url: String,
    pub contract_address: Option<Address>,
    pub gateway_url: Option<Url>,
    pub walletconnect_project_id: Option<String>,
}

impl NetworkConfig {
    /// Sepolia testnet defaults with nothing deployed.
    pub fn sepolia() -> Self {
        Self {
            chain_id: 11155111,
            rpc_url: "https://rpc.sepolia.org".to_string(),
            contract_address: None,
            gateway_url: None,
            walletconnect_project_id: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::sepolia();

        if let Ok(raw) = std::env::var("SHADE_CHAIN_ID") {
            config.chain_id = raw.parse().map_err(|_| ConfigError::Invalid {
                field: "SHADE_CHAIN_ID",
                reason: format!("not a chain id: {}", raw),
            })?;
        }
        if let Ok(raw) = std::env::var("SHADE_RPC_URL") {
            if !raw.is_empty() {
                config.rpc_url = raw;
            }
        }
        if let Ok(raw) = std::env::var("SHADE_CONTRACT_ADDRESS") {
            if !raw.is_empty() {
                config.contract_address =
                    Some(Address::from_str(&raw).map_err(|e| ConfigError::Invalid {
                        field: "SHADE_CONTRACT_ADDRESS",
                        reason: e.to_string(),
                    })?);
            }
        }
        if let Ok(raw) = std::env::var("SHADE_FHE_GATEWAY_URL") {
            if !raw.is_empty() {
                config.gateway_url = Some(Url::parse(&raw).map_err(|e| ConfigError::Invalid {
                    field: "SHADE_FHE_GATEWAY_URL",
                    reason: e.to_string(),
                })?);
            }
        }
        if let Ok(raw) = std::env::var("SHADE_WALLETCONNECT_PROJECT_ID") {
            if !raw.is_empty() {
                config.walletconnect_project_id = Some(raw);
            }
        }

        Ok(config)
    }

    /// Ledger contract address, or `NotConfigured`.
    pub fn contract(&self) -> Result<Address, ConfigError> {
        self.contract_address
            .ok_or(ConfigError::NotConfigured("contract address"))
    }

    /// Encryption gateway URL, or `NotConfigured`.
    pub fn gateway(&self) -> Result<Url, ConfigError> {
        self.gateway_url
            .clone()
            .ok_or(ConfigError::NotConfigured("FHE gateway URL"))
    }
}
