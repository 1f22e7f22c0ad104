// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Ledger client
//!
//! Encodes the confidential-graph protocol operations into ledger calls
//! and decodes read results and events. Everything sensitive arrives here
//! already encrypted; this layer only moves ciphertexts and proofs.

pub mod client;
pub mod graph;
pub mod monitor;
pub mod types;

pub use client::{Web3Client, Web3Config};
pub use graph::{
    ClientError, InProcessLedger, LedgerTransport, ShadeGraphClient, ShadeNetworkContract,
    TxHandle,
};
pub use monitor::{GraphEvent, GraphEventMonitor, MonitorConfig};
pub use types::{PrivacySettings, ShadeNetwork};
