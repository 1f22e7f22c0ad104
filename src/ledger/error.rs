// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Ledger-side guard failures.
//!
//! Every variant aborts the whole transition (no partial writes). The
//! `Display` strings double as revert-reason strings, so the on-chain
//! transport and the in-process transport surface identical errors.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Address already maps to a nonzero identity id
    AlreadyRegistered,
    /// Signer has no identity on the ledger
    NotRegistered,
    /// Target user id is zero or does not resolve
    UnknownTarget,
    /// Non-owner calling an owner-gated entry point
    Unauthorized,
    /// Input proof rejected for (this-contract, tx-signer, domain)
    ProofInvalid(String),
    /// Scheme failure while materializing ledger-originated ciphertexts
    Internal(String),
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::AlreadyRegistered => write!(f, "User already registered"),
            LedgerError::NotRegistered => write!(f, "User not registered"),
            LedgerError::UnknownTarget => write!(f, "Target user does not exist"),
            LedgerError::Unauthorized => write!(f, "Caller is not the owner"),
            LedgerError::ProofInvalid(field) => write!(f, "Invalid input proof: {}", field),
            LedgerError::Internal(msg) => write!(f, "Internal ledger error: {}", msg),
        }
    }
}

impl std::error::Error for LedgerError {}
