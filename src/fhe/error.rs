// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! FHE Error Types
//!
//! Typed failures for the encryption engine and session manager. Client
//! callers decide whether to retry; nothing here is silently swallowed.
//!
//! Authorization failures deliberately carry no plaintext or ciphertext
//! material.

use thiserror::Error;

use super::domain::Domain;

#[derive(Error, Debug, Clone)]
pub enum FheError {
    /// Engine used before the session supplied public parameters
    #[error("FHE engine not initialized")]
    EngineUninitialized,

    /// Value lies outside its declared domain
    #[error("value {value} does not fit domain {domain}")]
    DomainMismatch { domain: Domain, value: u64 },

    /// Viewer holds no valid re-encryption key for the ciphertext scope
    #[error("viewer is not authorized for this ciphertext")]
    UnauthorizedViewer,

    /// Encryption gateway unreachable or returned a malformed response
    #[error("FHE gateway unavailable: {0}")]
    FheUnavailable(String),

    /// Ciphertext blob failed structural validation
    #[error("malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    /// Input proof rejected for the presented (contract, signer, domain)
    #[error("input proof invalid: {0}")]
    ProofInvalid(String),

    #[error("FHE error: {0}")]
    Other(String),
}

impl From<anyhow::Error> for FheError {
    fn from(err: anyhow::Error) -> Self {
        FheError::Other(err.to_string())
    }
}

impl From<reqwest::Error> for FheError {
    fn from(err: reqwest::Error) -> Self {
        FheError::FheUnavailable(err.to_string())
    }
}
