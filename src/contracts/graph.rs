// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Confidential graph client
//!
//! Translates the five protocol operations into ledger calls. Sensitive
//! values are encrypted and proof-bound client-side; the ledger only ever
//! receives ciphertexts. Writes return a pending-transaction handle and
//! confirmation arrives through events; a caller abandoning the await does
//! not roll back a submitted transaction.
//!
//! The ledger sits behind [`LedgerTransport`]: one implementation encodes
//! real contract calls over ethers, the other drives the in-process state
//! machine (the serialization point is a `tokio` RwLock standing in for
//! the chain's total order).

use ethers::prelude::*;
use ethers::providers::{Http, Provider};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

use crate::config::{ConfigError, NetworkConfig};
use crate::fhe::{CiphertextProof, ConnectionType, FheError, FheSession};
use crate::ledger::{EncryptedPrivacyUpdate, LedgerError, LedgerEvent, ShadeLedger, UserProfile};

use super::client::Web3Client;
use super::types::{PrivacySettings, ShadeNetwork};

/// Handle to a submitted, not yet confirmed, transaction.
pub type TxHandle = H256;

#[derive(Debug, Clone)]
pub enum ClientError {
    /// No signer connected
    NotConnected,
    /// No ledger contract configured; writes and reads are disabled
    NotConfigured,
    AlreadyRegistered,
    NotRegistered,
    UnknownTarget,
    Unauthorized,
    /// Ledger rejected an input proof
    ProofInvalid(String),
    /// Encryption subsystem failure
    Fhe(FheError),
    /// Revert with a reason this client does not map
    Rejected(String),
    Rpc(String),
    Other(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::NotConnected => write!(f, "No signer connected"),
            ClientError::NotConfigured => write!(f, "Ledger contract not configured"),
            ClientError::AlreadyRegistered => write!(f, "User already registered"),
            ClientError::NotRegistered => write!(f, "User not registered"),
            ClientError::UnknownTarget => write!(f, "Target user does not exist"),
            ClientError::Unauthorized => write!(f, "Caller is not the owner"),
            ClientError::ProofInvalid(reason) => write!(f, "Proof rejected: {}", reason),
            ClientError::Fhe(e) => write!(f, "Encryption error: {}", e),
            ClientError::Rejected(reason) => write!(f, "Transaction reverted: {}", reason),
            ClientError::Rpc(e) => write!(f, "RPC error: {}", e),
            ClientError::Other(e) => write!(f, "Other error: {}", e),
        }
    }
}

impl std::error::Error for ClientError {}

impl From<FheError> for ClientError {
    fn from(err: FheError) -> Self {
        ClientError::Fhe(err)
    }
}

impl From<ConfigError> for ClientError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NotConfigured(_) => ClientError::NotConfigured,
            other => ClientError::Other(other.to_string()),
        }
    }
}

impl From<anyhow::Error> for ClientError {
    fn from(err: anyhow::Error) -> Self {
        ClientError::Other(err.to_string())
    }
}

impl From<LedgerError> for ClientError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::AlreadyRegistered => ClientError::AlreadyRegistered,
            LedgerError::NotRegistered => ClientError::NotRegistered,
            LedgerError::UnknownTarget => ClientError::UnknownTarget,
            LedgerError::Unauthorized => ClientError::Unauthorized,
            LedgerError::ProofInvalid(field) => ClientError::ProofInvalid(field),
            LedgerError::Internal(msg) => ClientError::Other(msg),
        }
    }
}

impl ClientError {
    /// Map a revert-reason string back to a typed failure. Any revert is a
    /// no-op on the ledger; there is no partial state to reconcile.
    pub fn from_revert_reason(reason: &str) -> Self {
        match reason {
            "User already registered" => ClientError::AlreadyRegistered,
            "User not registered" => ClientError::NotRegistered,
            "Target user does not exist" => ClientError::UnknownTarget,
            "Caller is not the owner" => ClientError::Unauthorized,
            other if other.starts_with("Invalid input proof") => {
                ClientError::ProofInvalid(other.to_string())
            }
            other => ClientError::Rejected(other.to_string()),
        }
    }
}

/// Raw call surface of the ledger contract.
#[async_trait::async_trait]
pub trait LedgerTransport: Send + Sync {
    async fn register_user(
        &self,
        public_name: String,
        public_bio: String,
        enc_reputation: CiphertextProof,
    ) -> Result<TxHandle, ClientError>;

    async fn create_connection(
        &self,
        to_user_id: u64,
        enc_connection_type: CiphertextProof,
    ) -> Result<TxHandle, ClientError>;

    async fn send_message(
        &self,
        to_user_id: u64,
        encrypted_content: String,
        enc_is_read: CiphertextProof,
    ) -> Result<TxHandle, ClientError>;

    async fn update_privacy_settings(
        &self,
        update: EncryptedPrivacyUpdate,
    ) -> Result<TxHandle, ClientError>;

    async fn set_verifier(&self, verifier: Address) -> Result<TxHandle, ClientError>;

    async fn is_user_registered(&self, address: Address) -> Result<bool, ClientError>;
    async fn get_user_id(&self, address: Address) -> Result<u64, ClientError>;
    async fn get_user_profile(&self, user_id: u64) -> Result<Option<UserProfile>, ClientError>;
}

// ---------------------------------------------------------------------
// Ethers-backed transport
// ---------------------------------------------------------------------

type SignerClient = SignerMiddleware<Arc<Provider<Http>>, LocalWallet>;

/// Transport encoding real contract calls via ethers.
pub struct ShadeNetworkContract {
    contract: ShadeNetwork<SignerClient>,
}

impl ShadeNetworkContract {
    pub async fn new(web3: &Web3Client, address: Address) -> Result<Self, ClientError> {
        let signer = web3.signer().await.ok_or(ClientError::NotConnected)?;
        Ok(Self {
            contract: ShadeNetwork::new(address, Arc::new(signer)),
        })
    }

    fn map_err(e: ContractError<SignerClient>) -> ClientError {
        if let Some(reason) = e.decode_revert::<String>() {
            ClientError::from_revert_reason(&reason)
        } else {
            ClientError::Rpc(e.to_string())
        }
    }
}

#[async_trait::async_trait]
impl LedgerTransport for ShadeNetworkContract {
    async fn register_user(
        &self,
        public_name: String,
        public_bio: String,
        enc_reputation: CiphertextProof,
    ) -> Result<TxHandle, ClientError> {
        let call = self.contract.register_user(
            public_name,
            public_bio,
            enc_reputation.ciphertext.into(),
            enc_reputation.input_proof.into(),
        );
        let pending = call.send().await.map_err(Self::map_err)?;
        Ok(pending.tx_hash())
    }

    async fn create_connection(
        &self,
        to_user_id: u64,
        enc_connection_type: CiphertextProof,
    ) -> Result<TxHandle, ClientError> {
        let call = self.contract.create_connection(
            U256::from(to_user_id),
            enc_connection_type.ciphertext.into(),
            enc_connection_type.input_proof.into(),
        );
        let pending = call.send().await.map_err(Self::map_err)?;
        Ok(pending.tx_hash())
    }

    async fn send_message(
        &self,
        to_user_id: u64,
        encrypted_content: String,
        enc_is_read: CiphertextProof,
    ) -> Result<TxHandle, ClientError> {
        let call = self.contract.send_message(
            U256::from(to_user_id),
            encrypted_content,
            enc_is_read.ciphertext.into(),
            enc_is_read.input_proof.into(),
        );
        let pending = call.send().await.map_err(Self::map_err)?;
        Ok(pending.tx_hash())
    }

    async fn update_privacy_settings(
        &self,
        update: EncryptedPrivacyUpdate,
    ) -> Result<TxHandle, ClientError> {
        // Four ciphertexts, four proofs; pairs stay together on the wire.
        let call = self.contract.update_privacy_settings(
            update.show_connections.ciphertext.into(),
            update.show_connections.input_proof.into(),
            update.show_activity.ciphertext.into(),
            update.show_activity.input_proof.into(),
            update.allow_messages.ciphertext.into(),
            update.allow_messages.input_proof.into(),
            update.show_reputation.ciphertext.into(),
            update.show_reputation.input_proof.into(),
        );
        let pending = call.send().await.map_err(Self::map_err)?;
        Ok(pending.tx_hash())
    }

    async fn set_verifier(&self, verifier: Address) -> Result<TxHandle, ClientError> {
        let call = self.contract.set_verifier(verifier);
        let pending = call.send().await.map_err(Self::map_err)?;
        Ok(pending.tx_hash())
    }

    async fn is_user_registered(&self, address: Address) -> Result<bool, ClientError> {
        self.contract
            .is_user_registered(address)
            .call()
            .await
            .map_err(Self::map_err)
    }

    async fn get_user_id(&self, address: Address) -> Result<u64, ClientError> {
        let id = self
            .contract
            .get_user_id(address)
            .call()
            .await
            .map_err(Self::map_err)?;
        Ok(id.as_u64())
    }

    async fn get_user_profile(&self, user_id: u64) -> Result<Option<UserProfile>, ClientError> {
        let (public_name, public_bio, wallet, created_at, last_active) = self
            .contract
            .get_user_profile(U256::from(user_id))
            .call()
            .await
            .map_err(Self::map_err)?;

        if wallet.is_zero() {
            return Ok(None);
        }
        Ok(Some(UserProfile {
            public_name,
            public_bio,
            wallet,
            created_at: created_at.as_u64(),
            last_active: last_active.as_u64(),
        }))
    }
}

// ---------------------------------------------------------------------
// In-process transport
// ---------------------------------------------------------------------

/// Transport driving the state machine directly, with the RwLock as the
/// transaction serialization point. Backs tests and local tooling.
pub struct InProcessLedger {
    ledger: Arc<RwLock<ShadeLedger>>,
    signer: Address,
    event_subscribers: Arc<RwLock<Vec<mpsc::Sender<LedgerEvent>>>>,
}

impl InProcessLedger {
    pub fn new(ledger: Arc<RwLock<ShadeLedger>>, signer: Address) -> Self {
        Self {
            ledger,
            signer,
            event_subscribers: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Same ledger seen by a different signer.
    pub fn as_signer(&self, signer: Address) -> Self {
        Self {
            ledger: self.ledger.clone(),
            signer,
            event_subscribers: self.event_subscribers.clone(),
        }
    }

    pub async fn subscribe(&self) -> mpsc::Receiver<LedgerEvent> {
        let (tx, rx) = mpsc::channel(100);
        self.event_subscribers.write().await.push(tx);
        rx
    }

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }

    async fn emit(&self, event: LedgerEvent) -> TxHandle {
        for subscriber in self.event_subscribers.read().await.iter() {
            let _ = subscriber.send(event.clone()).await;
        }
        H256::random()
    }
}

#[async_trait::async_trait]
impl LedgerTransport for InProcessLedger {
    async fn register_user(
        &self,
        public_name: String,
        public_bio: String,
        enc_reputation: CiphertextProof,
    ) -> Result<TxHandle, ClientError> {
        let event = self.ledger.write().await.register_user(
            self.signer,
            Self::now(),
            public_name,
            public_bio,
            enc_reputation,
        )?;
        Ok(self.emit(event).await)
    }

    async fn create_connection(
        &self,
        to_user_id: u64,
        enc_connection_type: CiphertextProof,
    ) -> Result<TxHandle, ClientError> {
        let event = self.ledger.write().await.create_connection(
            self.signer,
            Self::now(),
            to_user_id,
            enc_connection_type,
        )?;
        Ok(self.emit(event).await)
    }

    async fn send_message(
        &self,
        to_user_id: u64,
        encrypted_content: String,
        enc_is_read: CiphertextProof,
    ) -> Result<TxHandle, ClientError> {
        let event = self.ledger.write().await.send_message(
            self.signer,
            Self::now(),
            to_user_id,
            encrypted_content,
            enc_is_read,
        )?;
        Ok(self.emit(event).await)
    }

    async fn update_privacy_settings(
        &self,
        update: EncryptedPrivacyUpdate,
    ) -> Result<TxHandle, ClientError> {
        let event = self
            .ledger
            .write()
            .await
            .update_privacy_settings(self.signer, Self::now(), update)?;
        Ok(self.emit(event).await)
    }

    async fn set_verifier(&self, verifier: Address) -> Result<TxHandle, ClientError> {
        self.ledger
            .write()
            .await
            .set_verifier(self.signer, verifier)?;
        Ok(H256::random())
    }

    async fn is_user_registered(&self, address: Address) -> Result<bool, ClientError> {
        Ok(self.ledger.read().await.is_user_registered(address))
    }

    async fn get_user_id(&self, address: Address) -> Result<u64, ClientError> {
        Ok(self.ledger.read().await.get_user_id(address))
    }

    async fn get_user_profile(&self, user_id: u64) -> Result<Option<UserProfile>, ClientError> {
        Ok(self.ledger.read().await.get_user_profile(user_id))
    }
}

// ---------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------

/// High-level client for the confidential social graph.
///
/// Encrypts sensitive inputs through the injected [`FheSession`] and
/// submits them over an [`Arc<dyn LedgerTransport>`].
pub struct ShadeGraphClient {
    config: NetworkConfig,
    session: FheSession,
    transport: Arc<dyn LedgerTransport>,
    signer: Option<Address>,
}

impl ShadeGraphClient {
    pub fn new(
        config: NetworkConfig,
        session: FheSession,
        transport: Arc<dyn LedgerTransport>,
        signer: Option<Address>,
    ) -> Self {
        Self {
            config,
            session,
            transport,
            signer,
        }
    }

    /// Client over a real chain connection. Fails with `NotConfigured`
    /// when no contract address is set and `NotConnected` without a
    /// signer.
    pub async fn connect(
        config: NetworkConfig,
        session: FheSession,
        web3: &Web3Client,
    ) -> Result<Self, ClientError> {
        let contract_address = config.contract()?;
        let signer = web3
            .signer_address()
            .await
            .ok_or(ClientError::NotConnected)?;
        let transport = ShadeNetworkContract::new(web3, contract_address).await?;
        Ok(Self::new(config, session, Arc::new(transport), Some(signer)))
    }

    pub fn session(&self) -> &FheSession {
        &self.session
    }

    fn require_signer(&self) -> Result<Address, ClientError> {
        self.signer.ok_or(ClientError::NotConnected)
    }

    /// Register the signer with a public name/bio and an encrypted
    /// initial reputation (uint32 domain).
    pub async fn register_user(
        &self,
        public_name: &str,
        public_bio: &str,
        reputation: u32,
    ) -> Result<TxHandle, ClientError> {
        let contract = self.config.contract()?;
        let signer = self.require_signer()?;
        let engine = self.session.engine().await?;

        let pair = engine.encrypt_u32(reputation, contract, signer)?;
        info!(name = public_name, "submitting registration");
        self.transport
            .register_user(public_name.to_string(), public_bio.to_string(), pair)
            .await
    }

    /// Record a directed edge with an encrypted type (uint8 domain).
    pub async fn create_connection(
        &self,
        to_user_id: u64,
        connection_type: ConnectionType,
    ) -> Result<TxHandle, ClientError> {
        let contract = self.config.contract()?;
        let signer = self.require_signer()?;
        let engine = self.session.engine().await?;

        let pair = engine.encrypt_connection_type(connection_type, contract, signer)?;
        debug!(to_user_id, "submitting connection");
        self.transport.create_connection(to_user_id, pair).await
    }

    /// Send a message. `encrypted_content` is pre-encrypted by the caller
    /// and opaque here; only the read flag goes through the FHE engine.
    pub async fn send_message(
        &self,
        to_user_id: u64,
        encrypted_content: &str,
        is_read: bool,
    ) -> Result<TxHandle, ClientError> {
        let contract = self.config.contract()?;
        let signer = self.require_signer()?;
        let engine = self.session.engine().await?;

        let pair = engine.encrypt_bool(is_read, contract, signer)?;
        debug!(to_user_id, "submitting message");
        self.transport
            .send_message(to_user_id, encrypted_content.to_string(), pair)
            .await
    }

    /// Replace all four privacy flags.
    ///
    /// Each flag is encrypted and proved independently; a proof belongs to
    /// exactly one ciphertext and is never shared across flags.
    pub async fn update_privacy_settings(
        &self,
        settings: PrivacySettings,
    ) -> Result<TxHandle, ClientError> {
        let contract = self.config.contract()?;
        let signer = self.require_signer()?;
        let engine = self.session.engine().await?;

        let update = EncryptedPrivacyUpdate {
            show_connections: engine.encrypt_bool(settings.show_connections, contract, signer)?,
            show_activity: engine.encrypt_bool(settings.show_activity, contract, signer)?,
            allow_messages: engine.encrypt_bool(settings.allow_messages, contract, signer)?,
            show_reputation: engine.encrypt_bool(settings.show_reputation, contract, signer)?,
        };
        info!("submitting privacy settings update (4 proofs)");
        self.transport.update_privacy_settings(update).await
    }

    /// Rotate the ledger's trusted proof authority (owner-only).
    pub async fn set_verifier(&self, verifier: Address) -> Result<TxHandle, ClientError> {
        self.config.contract()?;
        self.require_signer()?;
        self.transport.set_verifier(verifier).await
    }

    pub async fn is_user_registered(&self, address: Address) -> Result<bool, ClientError> {
        self.config.contract()?;
        self.transport.is_user_registered(address).await
    }

    /// Identity id for an address; 0 means unregistered.
    pub async fn get_user_id(&self, address: Address) -> Result<u64, ClientError> {
        self.config.contract()?;
        self.transport.get_user_id(address).await
    }

    /// Plaintext profile fields only; encrypted fields never travel this
    /// path.
    pub async fn get_user_profile(
        &self,
        user_id: u64,
    ) -> Result<Option<UserProfile>, ClientError> {
        self.config.contract()?;
        let profile = self.transport.get_user_profile(user_id).await?;
        if profile.is_none() {
            warn!(user_id, "profile lookup for unknown user");
        }
        Ok(profile)
    }
}
