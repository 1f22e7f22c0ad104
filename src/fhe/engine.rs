// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Encryption Engine
//!
//! Turns plaintext scalars and booleans into ciphertexts plus input proofs
//! bound to a (contract, signer) pair. The scheme here is an
//! interface-faithful stand-in for the fhevm coprocessor: keyed blake3
//! masking for ciphertexts and keyed blake3 MACs for input proofs, derived
//! from the network's public parameters. Ciphertext bytes are fresh per
//! call (random nonce); the interface is deterministic.
//!
//! Proof binding is the hard invariant: a proof verifies only for the
//! exact (contract, signer, domain) tuple it was generated against. The
//! ledger side verifies with [`verify_input_proof`] and never needs an
//! engine instance.

use ethers::types::Address;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use super::domain::{ClearValue, ConnectionType, Domain};
use super::error::FheError;

const CIPHER_CONTEXT: &str = "shade-network v1 ciphertext mask";
const PROOF_CONTEXT: &str = "shade-network v1 input proof";
const REENCRYPT_CONTEXT: &str = "shade-network v1 reencryption key";

const NONCE_LEN: usize = 16;
const PROOF_LEN: usize = 32;

/// Public parameters of the encryption network, fetched once per session
/// from `GET /publicKey`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicParameters {
    #[serde(rename = "publicKey")]
    pub public_key: String,
}

/// The fundamental transport unit: opaque ciphertext plus its input proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiphertextProof {
    pub ciphertext: Vec<u8>,
    pub input_proof: Vec<u8>,
}

/// Key material letting one viewer decrypt ciphertexts within a
/// (contract, viewer) scope. Issued by the session manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReencryptionKey {
    pub contract: Address,
    pub viewer: Address,
    secret: [u8; 32],
}

fn cipher_key(params: &PublicParameters) -> [u8; 32] {
    blake3::derive_key(CIPHER_CONTEXT, params.public_key.as_bytes())
}

fn proof_key(params: &PublicParameters) -> [u8; 32] {
    blake3::derive_key(PROOF_CONTEXT, params.public_key.as_bytes())
}

fn reencrypt_root(params: &PublicParameters) -> [u8; 32] {
    blake3::derive_key(REENCRYPT_CONTEXT, params.public_key.as_bytes())
}

fn viewer_secret(params: &PublicParameters, contract: Address, viewer: Address) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_keyed(&reencrypt_root(params));
    hasher.update(contract.as_bytes());
    hasher.update(viewer.as_bytes());
    *hasher.finalize().as_bytes()
}

/// Ledger-side proof verification. True only when `(ciphertext, contract,
/// signer, domain)` exactly match the generation context.
pub fn verify_input_proof(
    params: &PublicParameters,
    ciphertext: &[u8],
    proof: &[u8],
    contract: Address,
    signer: Address,
    domain: Domain,
) -> bool {
    if proof.len() != PROOF_LEN {
        return false;
    }
    if ciphertext.len() != 1 + NONCE_LEN + domain.width() {
        return false;
    }
    if ciphertext[0] != domain.tag() {
        return false;
    }
    let expected = compute_proof(&proof_key(params), ciphertext, contract, signer);
    // blake3::Hash comparison is constant-time
    blake3::Hash::from(expected) == blake3::Hash::from_bytes(proof.try_into().unwrap_or([0u8; 32]))
}

fn compute_proof(key: &[u8; 32], ciphertext: &[u8], contract: Address, signer: Address) -> [u8; 32] {
    let mut hasher = blake3::Hasher::new_keyed(key);
    hasher.update(ciphertext);
    hasher.update(contract.as_bytes());
    hasher.update(signer.as_bytes());
    *hasher.finalize().as_bytes()
}

fn keystream(key: &[u8; 32], nonce: &[u8], len: usize) -> Vec<u8> {
    let mut hasher = blake3::Hasher::new_keyed(key);
    hasher.update(nonce);
    let mut out = vec![0u8; len];
    hasher.finalize_xof().fill(&mut out);
    out
}

/// Encryption engine over one parameter set.
///
/// Constructed by the session manager once public parameters are cached;
/// cheap to clone.
#[derive(Debug, Clone)]
pub struct FheEngine {
    params: PublicParameters,
}

impl FheEngine {
    pub fn new(params: PublicParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &PublicParameters {
        &self.params
    }

    /// Encrypt `value` under `domain`, binding the proof to
    /// (`contract`, `signer`).
    ///
    /// The range check runs before any other work, so an out-of-domain
    /// value fails without touching the RNG.
    pub fn encrypt(
        &self,
        value: u64,
        domain: Domain,
        contract: Address,
        signer: Address,
    ) -> Result<CiphertextProof, FheError> {
        if !domain.contains(value) {
            return Err(FheError::DomainMismatch { domain, value });
        }

        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let width = domain.width();
        let mask = keystream(&cipher_key(&self.params), &nonce, width);
        let value_bytes = value.to_le_bytes();

        let mut ciphertext = Vec::with_capacity(1 + NONCE_LEN + width);
        ciphertext.push(domain.tag());
        ciphertext.extend_from_slice(&nonce);
        for i in 0..width {
            ciphertext.push(value_bytes[i] ^ mask[i]);
        }

        let input_proof =
            compute_proof(&proof_key(&self.params), &ciphertext, contract, signer).to_vec();

        tracing::debug!(
            domain = %domain,
            signer = %format!("{:#x}", signer),
            "encrypted value ({} byte ciphertext)",
            ciphertext.len()
        );

        Ok(CiphertextProof {
            ciphertext,
            input_proof,
        })
    }

    pub fn encrypt_u32(
        &self,
        value: u32,
        contract: Address,
        signer: Address,
    ) -> Result<CiphertextProof, FheError> {
        self.encrypt(value as u64, Domain::Uint32, contract, signer)
    }

    pub fn encrypt_bool(
        &self,
        value: bool,
        contract: Address,
        signer: Address,
    ) -> Result<CiphertextProof, FheError> {
        self.encrypt(value as u64, Domain::Bool, contract, signer)
    }

    pub fn encrypt_connection_type(
        &self,
        connection_type: ConnectionType,
        contract: Address,
        signer: Address,
    ) -> Result<CiphertextProof, FheError> {
        self.encrypt(connection_type.as_u8() as u64, Domain::Uint8, contract, signer)
    }

    /// Owner-side decryption.
    pub fn decrypt(&self, ciphertext: &[u8]) -> Result<ClearValue, FheError> {
        if ciphertext.is_empty() {
            return Err(FheError::MalformedCiphertext("empty".to_string()));
        }
        let domain = Domain::from_tag(ciphertext[0]).ok_or_else(|| {
            FheError::MalformedCiphertext(format!("unknown domain tag {:#04x}", ciphertext[0]))
        })?;
        let width = domain.width();
        if ciphertext.len() != 1 + NONCE_LEN + width {
            return Err(FheError::MalformedCiphertext(format!(
                "expected {} bytes for {}, got {}",
                1 + NONCE_LEN + width,
                domain,
                ciphertext.len()
            )));
        }

        let nonce = &ciphertext[1..1 + NONCE_LEN];
        let masked = &ciphertext[1 + NONCE_LEN..];
        let mask = keystream(&cipher_key(&self.params), nonce, width);

        let mut value_bytes = [0u8; 8];
        for i in 0..width {
            value_bytes[i] = masked[i] ^ mask[i];
        }
        let value = u64::from_le_bytes(value_bytes);

        match domain {
            Domain::Uint8 => Ok(ClearValue::Uint8(value as u8)),
            Domain::Uint32 => Ok(ClearValue::Uint32(value as u32)),
            Domain::Bool => match value {
                0 => Ok(ClearValue::Bool(false)),
                1 => Ok(ClearValue::Bool(true)),
                other => Err(FheError::MalformedCiphertext(format!(
                    "bool ciphertext decrypted to {}",
                    other
                ))),
            },
        }
    }

    /// Derive the re-encryption key for one viewer within a contract scope.
    pub fn reencryption_key(&self, contract: Address, viewer: Address) -> ReencryptionKey {
        ReencryptionKey {
            contract,
            viewer,
            secret: viewer_secret(&self.params, contract, viewer),
        }
    }

    /// Decrypt on behalf of a viewer.
    ///
    /// The key's scope MAC is checked against this engine's parameter set
    /// first; a forged or wrong-scope key fails with `UnauthorizedViewer`
    /// and the error carries no key or value material.
    pub fn reencrypt(
        &self,
        ciphertext: &[u8],
        key: &ReencryptionKey,
    ) -> Result<ClearValue, FheError> {
        let expected = viewer_secret(&self.params, key.contract, key.viewer);
        if blake3::Hash::from(expected) != blake3::Hash::from(key.secret) {
            return Err(FheError::UnauthorizedViewer);
        }
        self.decrypt(ciphertext)
    }
}
