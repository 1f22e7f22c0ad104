// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Typed events emitted by successful ledger transitions. External
//! collaborators (UI refresh, monitors) consume these for confirmation.

use ethers::types::Address;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
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
