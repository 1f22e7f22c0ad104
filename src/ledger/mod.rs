// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Confidential State Machine (authoritative)
//!
//! Deterministic ledger logic behind the trust boundary: proof
//! validation, uniqueness/ownership invariants, ciphertext storage and
//! event emission. The surrounding ledger runtime supplies transaction
//! ordering, signer identity and timestamps.

pub mod error;
pub mod events;
pub mod state;

pub use error::LedgerError;
pub use events::LedgerEvent;
pub use state::{
    Connection, EncryptedPrivacyUpdate, Identity, Message, PrivacyRecord, ShadeLedger, UserProfile,
};
