use anyhow::Result;
use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

use super::client::Web3Client;
use super::types::{ShadeNetwork, ShadeNetworkEvents};

/// Decoded ledger events, delivered to external collaborators for UI
/// refresh and write confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphEvent {
    UserRegistered {
        user_id: u64,
        wallet: Address,
        public_name: String,
        timestamp: u64,
    },
    ConnectionCreated {
        connection_id: u64,
        from_id: u64,
        to_id: u64,
        timestamp: u64,
    },
    MessageSent {
        message_id: u64,
        from_id: u64,
        to_id: u64,
        timestamp: u64,
    },
    PrivacySettingsUpdated {
        user_id: u64,
        timestamp: u64,
    },
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub poll_interval: Duration,
    pub start_block: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            start_block: 0,
        }
    }
}

/// Polls the ledger for new logs and fans decoded events out over mpsc.
pub struct GraphEventMonitor {
    config: MonitorConfig,
    web3: Arc<Web3Client>,
    contract: ShadeNetwork<Provider<Http>>,
    subscribers: Arc<RwLock<Vec<mpsc::Sender<GraphEvent>>>>,
}

impl GraphEventMonitor {
    pub fn new(config: MonitorConfig, web3: Arc<Web3Client>, contract_address: Address) -> Self {
        let contract = ShadeNetwork::new(contract_address, web3.provider.clone());
        Self {
            config,
            web3,
            contract,
            subscribers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn subscribe(&self) -> mpsc::Receiver<GraphEvent> {
        let (tx, rx) = mpsc::channel(100);
        self.subscribers.write().await.push(tx);
        rx
    }

    /// Spawn the polling loop. Runs until the returned handle is aborted.
    pub fn start(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        let monitor = self;
        tokio::spawn(async move {
            let mut last_block = monitor.config.start_block;

            loop {
                match monitor.poll_range(last_block + 1).await {
                    Ok(Some(scanned_to)) => last_block = scanned_to,
                    Ok(None) => {}
                    Err(e) => warn!("event poll failed: {}", e),
                }
                tokio::time::sleep(monitor.config.poll_interval).await;
            }
        })
    }

    /// Scan `[from, head]` once; returns the head block when it advanced.
    async fn poll_range(&self, from: u64) -> Result<Option<u64>> {
        let head = self.web3.get_block_number().await?;
        if head < from {
            return Ok(None);
        }

        let events = self
            .contract
            .events()
            .from_block(from)
            .to_block(head)
            .query()
            .await?;

        if !events.is_empty() {
            debug!("decoded {} graph events in [{}, {}]", events.len(), from, head);
        }

        for event in events {
            let decoded = Self::decode(event);
            for subscriber in self.subscribers.read().await.iter() {
                let _ = subscriber.send(decoded.clone()).await;
            }
        }
        Ok(Some(head))
    }

    fn decode(event: ShadeNetworkEvents) -> GraphEvent {
        match event {
            ShadeNetworkEvents::UserRegisteredFilter(e) => GraphEvent::UserRegistered {
                user_id: e.user_id.as_u64(),
                wallet: e.wallet,
                public_name: e.public_name,
                timestamp: e.timestamp.as_u64(),
            },
            ShadeNetworkEvents::ConnectionCreatedFilter(e) => GraphEvent::ConnectionCreated {
                connection_id: e.connection_id.as_u64(),
                from_id: e.from_id.as_u64(),
                to_id: e.to_id.as_u64(),
                timestamp: e.timestamp.as_u64(),
            },
            ShadeNetworkEvents::MessageSentFilter(e) => GraphEvent::MessageSent {
                message_id: e.message_id.as_u64(),
                from_id: e.from_id.as_u64(),
                to_id: e.to_id.as_u64(),
                timestamp: e.timestamp.as_u64(),
            },
            ShadeNetworkEvents::PrivacySettingsUpdatedFilter(e) => {
                GraphEvent::PrivacySettingsUpdated {
                    user_id: e.user_id.as_u64(),
                    timestamp: e.timestamp.as_u64(),
                }
            }
        }
    }
}
