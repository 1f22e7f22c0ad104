// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Confidential Value Encryption
//!
//! This module implements the client side of the confidential-state
//! protocol: plaintext scalars and booleans become ciphertexts plus input
//! proofs bound to a (contract, signer) pair before they ever leave the
//! process.
//!
//! - **Domains**: closed set of plaintext types (uint8, uint32, bool)
//! - **Engine**: encryption, decryption, re-encryption for viewers
//! - **Session**: public-parameter cache with explicit init/teardown
//!
//! ## Security Considerations
//!
//! - Plaintext never appears in errors or logs
//! - Each ciphertext gets its own input proof; proofs are not
//!   transferable between ciphertexts, signers, contracts or domains
//! - Re-encryption keys are scoped to one (contract, viewer) pair
//!
//! ## Protocol Flow
//!
//! 1. Session fetches the network's public parameters once and caches them
//! 2. Engine encrypts each value under its declared domain
//! 3. Engine MACs an input proof over (ciphertext, contract, signer)
//! 4. Ledger verifies every proof before accepting a ciphertext
//! 5. Authorized viewers obtain plaintext via scoped re-encryption keys

pub mod domain;
pub mod engine;
pub mod error;
pub mod session;

pub use domain::{ClearValue, ConnectionType, Domain};
pub use engine::{verify_input_proof, CiphertextProof, FheEngine, PublicParameters, ReencryptionKey};
pub use error::FheError;
pub use session::FheSession;
