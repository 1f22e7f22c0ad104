// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod config;
pub mod contracts;
pub mod fhe;
pub mod ledger;

// Re-export main types
pub use config::{ConfigError, NetworkConfig};
pub use contracts::{
    ClientError, GraphEvent, GraphEventMonitor, InProcessLedger, LedgerTransport, MonitorConfig,
    PrivacySettings, ShadeGraphClient, ShadeNetworkContract, TxHandle, Web3Client, Web3Config,
};
pub use fhe::{
    CiphertextProof, ClearValue, ConnectionType, Domain, FheEngine, FheError, FheSession,
    PublicParameters, ReencryptionKey,
};
pub use ledger::{EncryptedPrivacyUpdate, LedgerError, LedgerEvent, ShadeLedger, UserProfile};
