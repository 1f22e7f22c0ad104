use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use std::sync::Arc;
use std::time::Duration;
use anyhow::{anyhow, Result};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
pub struct Web3Config {
    pub rpc_url: String,
    pub chain_id: u64,
    pub confirmations: usize,
    pub polling_interval: Duration,
    pub private_key: Option<String>,
}

impl Default for Web3Config {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            chain_id: 31337,
            confirmations: 1,
            polling_interval: Duration::from_millis(100),
            private_key: None,
        }
    }
}

/// Provider + optional signer against the configured ledger chain.
pub struct Web3Client {
    pub provider: Arc<Provider<Http>>,
    wallet: Arc<RwLock<Option<SignerMiddleware<Arc<Provider<Http>>, LocalWallet>>>>,
    config: Web3Config,
}

impl Web3Client {
    pub async fn new(config: Web3Config) -> Result<Self> {
        let provider = Provider::<Http>::try_from(&config.rpc_url)
            .map_err(|e| anyhow!("Failed to create provider: {}", e))?
            .interval(config.polling_interval);

        // Verify we are talking to the chain the config names
        let chain_id = provider
            .get_chainid()
            .await
            .map_err(|e| anyhow!("Failed to connect to RPC: {}", e))?;

        if chain_id.as_u64() != config.chain_id {
            return Err(anyhow!(
                "Chain ID mismatch: expected {}, got {}",
                config.chain_id,
                chain_id
            ));
        }

        let provider = Arc::new(provider);

        let wallet = if let Some(private_key) = &config.private_key {
            let wallet = private_key
                .parse::<LocalWallet>()
                .map_err(|e| anyhow!("Invalid private key: {}", e))?
                .with_chain_id(config.chain_id);

            Some(SignerMiddleware::new(provider.clone(), wallet))
        } else {
            None
        };

        Ok(Self {
            provider,
            wallet: Arc::new(RwLock::new(wallet)),
            config,
        })
    }

    pub async fn is_connected(&self) -> bool {
        self.provider.get_block_number().await.is_ok()
    }

    pub async fn chain_id(&self) -> Result<u64> {
        let chain_id = self.provider.get_chainid().await?;
        Ok(chain_id.as_u64())
    }

    pub async fn get_block_number(&self) -> Result<u64> {
        let block_number = self.provider.get_block_number().await?;
        Ok(block_number.as_u64())
    }

    /// Address of the connected signer, if any.
    pub async fn signer_address(&self) -> Option<Address> {
        self.wallet.read().await.as_ref().map(|w| w.address())
    }

    /// Middleware for contract writes; `None` when no signer is connected.
    pub async fn signer(
        &self,
    ) -> Option<SignerMiddleware<Arc<Provider<Http>>, LocalWallet>> {
        self.wallet.read().await.clone()
    }

    pub async fn set_wallet(&self, private_key: &str) -> Result<()> {
        let wallet = private_key
            .parse::<LocalWallet>()
            .map_err(|e| anyhow!("Invalid private key: {}", e))?
            .with_chain_id(self.config.chain_id);

        let signer = SignerMiddleware::new(self.provider.clone(), wallet);
        *self.wallet.write().await = Some(signer);
        Ok(())
    }

    pub async fn wait_for_confirmation(&self, tx_hash: H256) -> Result<TransactionReceipt> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await?
            .ok_or_else(|| anyhow!("Transaction not found"))?;

        if self.config.confirmations > 1 {
            let current_block = self.provider.get_block_number().await?;
            let tx_block = receipt
                .block_number
                .ok_or_else(|| anyhow!("Receipt has no block number"))?;
            let confirmations = current_block.saturating_sub(tx_block);

            if confirmations < U64::from(self.config.confirmations) {
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }

        Ok(receipt)
    }
}
