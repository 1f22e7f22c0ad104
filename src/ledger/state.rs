// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Confidential State Machine
//!
//! The authoritative ledger logic. It validates input proofs, enforces
//! uniqueness and ownership invariants, and stores ciphertexts it cannot
//! read. Deterministic and I/O-free: transaction ordering and timestamps
//! are supplied by the surrounding ledger runtime, which serializes all
//! transitions.
//!
//! Invariants enforced here:
//! - exactly one identity per address; ids are sequential and 1-based,
//!   id 0 is reserved and never assigned
//! - every write verifies its input proof against
//!   (this-contract, tx-signer, declared domain)
//! - connections and messages are append-only facts
//! - the four privacy ciphertexts are replaced all-or-nothing

use ethers::types::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::fhe::{verify_input_proof, CiphertextProof, Domain, FheEngine, PublicParameters};

use super::error::LedgerError;
use super::events::LedgerEvent;

/// One registered identity. Name and bio are public by design; the
/// reputation score exists only as a ciphertext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: u64,
    pub wallet: Address,
    pub public_name: String,
    pub public_bio: String,
    pub enc_reputation: Vec<u8>,
    pub created_at: u64,
    pub last_active: u64,
}

/// Directed edge between two identities. The edge type is opaque to the
/// ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub id: u64,
    pub from_id: u64,
    pub to_id: u64,
    pub enc_connection_type: Vec<u8>,
    pub created_at: u64,
}

/// Directed message. Content is pre-encrypted by the sender and opaque
/// here; only the read flag is an FHE ciphertext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub from_id: u64,
    pub to_id: u64,
    pub encrypted_content: String,
    pub enc_is_read: Vec<u8>,
    pub sent_at: u64,
}

/// Four independently encrypted boolean flags, replaced atomically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrivacyRecord {
    pub enc_show_connections: Vec<u8>,
    pub enc_show_activity: Vec<u8>,
    pub enc_allow_messages: Vec<u8>,
    pub enc_show_reputation: Vec<u8>,
}

/// Plaintext-only profile view. Never exposes encrypted fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub public_name: String,
    pub public_bio: String,
    pub wallet: Address,
    pub created_at: u64,
    pub last_active: u64,
}

/// The ciphertext+proof pairs of one privacy update. One proof per
/// ciphertext; a proof generated for one flag never validates another.
#[derive(Debug, Clone)]
pub struct EncryptedPrivacyUpdate {
    pub show_connections: CiphertextProof,
    pub show_activity: CiphertextProof,
    pub allow_messages: CiphertextProof,
    pub show_reputation: CiphertextProof,
}

pub struct ShadeLedger {
    owner: Address,
    verifier: Address,
    /// Address this ledger instance answers to; proofs bind to it
    contract: Address,
    /// Verification key material of the trusted proof authority
    params: PublicParameters,

    user_ids: HashMap<Address, u64>,
    identities: HashMap<u64, Identity>,
    connections: HashMap<u64, Connection>,
    messages: HashMap<u64, Message>,
    privacy: HashMap<u64, PrivacyRecord>,

    user_counter: u64,
    connection_counter: u64,
    message_counter: u64,
}

impl ShadeLedger {
    pub fn new(owner: Address, verifier: Address, contract: Address, params: PublicParameters) -> Self {
        Self {
            owner,
            verifier,
            contract,
            params,
            user_ids: HashMap::new(),
            identities: HashMap::new(),
            connections: HashMap::new(),
            messages: HashMap::new(),
            privacy: HashMap::new(),
            user_counter: 0,
            connection_counter: 0,
            message_counter: 0,
        }
    }

    /// Register the signer as a new identity.
    ///
    /// Guards: address not already mapped; reputation proof verifies for
    /// (this-contract, signer, uint32). Effects: next sequential id,
    /// identity stored with default privacy settings, `UserRegistered`.
    pub fn register_user(
        &mut self,
        signer: Address,
        now: u64,
        public_name: String,
        public_bio: String,
        enc_reputation: CiphertextProof,
    ) -> Result<LedgerEvent, LedgerError> {
        if self.user_ids.contains_key(&signer) {
            return Err(LedgerError::AlreadyRegistered);
        }
        self.verify_proof(&enc_reputation, signer, Domain::Uint32, "reputation")?;

        let defaults = self.default_privacy_record()?;

        let user_id = self.user_counter + 1;
        self.user_counter = user_id;
        self.user_ids.insert(signer, user_id);
        self.identities.insert(
            user_id,
            Identity {
                id: user_id,
                wallet: signer,
                public_name: public_name.clone(),
                public_bio,
                enc_reputation: enc_reputation.ciphertext,
                created_at: now,
                last_active: now,
            },
        );
        self.privacy.insert(user_id, defaults);

        tracing::info!(user_id, wallet = %format!("{:#x}", signer), "user registered");

        Ok(LedgerEvent::UserRegistered {
            user_id,
            wallet: signer,
            public_name,
            timestamp: now,
        })
    }

    /// Append a directed connection edge.
    ///
    /// Guards: signer registered, target resolves to a nonzero id, type
    /// proof verifies for (this-contract, signer, uint8). Connections are
    /// immutable facts once recorded.
    pub fn create_connection(
        &mut self,
        signer: Address,
        now: u64,
        to_user_id: u64,
        enc_connection_type: CiphertextProof,
    ) -> Result<LedgerEvent, LedgerError> {
        let from_id = self.require_registered(signer)?;
        if to_user_id == 0 || !self.identities.contains_key(&to_user_id) {
            return Err(LedgerError::UnknownTarget);
        }
        self.verify_proof(&enc_connection_type, signer, Domain::Uint8, "connection_type")?;

        let connection_id = self.connection_counter + 1;
        self.connection_counter = connection_id;
        self.connections.insert(
            connection_id,
            Connection {
                id: connection_id,
                from_id,
                to_id: to_user_id,
                enc_connection_type: enc_connection_type.ciphertext,
                created_at: now,
            },
        );
        self.touch(from_id, now);

        tracing::info!(connection_id, from_id, to_id = to_user_id, "connection created");

        Ok(LedgerEvent::ConnectionCreated {
            connection_id,
            from_id,
            to_id: to_user_id,
            timestamp: now,
        })
    }

    /// Append a directed message.
    ///
    /// Content is opaque to the ledger. Unknown or zero target ids are
    /// rejected so no orphan messages accumulate.
    pub fn send_message(
        &mut self,
        signer: Address,
        now: u64,
        to_user_id: u64,
        encrypted_content: String,
        enc_is_read: CiphertextProof,
    ) -> Result<LedgerEvent, LedgerError> {
        let from_id = self.require_registered(signer)?;
        if to_user_id == 0 || !self.identities.contains_key(&to_user_id) {
            return Err(LedgerError::UnknownTarget);
        }
        self.verify_proof(&enc_is_read, signer, Domain::Bool, "is_read")?;

        let message_id = self.message_counter + 1;
        self.message_counter = message_id;
        self.messages.insert(
            message_id,
            Message {
                id: message_id,
                from_id,
                to_id: to_user_id,
                encrypted_content,
                enc_is_read: enc_is_read.ciphertext,
                sent_at: now,
            },
        );
        self.touch(from_id, now);

        tracing::info!(message_id, from_id, to_id = to_user_id, "message recorded");

        Ok(LedgerEvent::MessageSent {
            message_id,
            from_id,
            to_id: to_user_id,
            timestamp: now,
        })
    }

    /// Replace the signer's four privacy ciphertexts atomically.
    ///
    /// All four proofs are verified before any stored value changes; one
    /// failing proof leaves every prior value intact.
    pub fn update_privacy_settings(
        &mut self,
        signer: Address,
        now: u64,
        update: EncryptedPrivacyUpdate,
    ) -> Result<LedgerEvent, LedgerError> {
        let user_id = self.require_registered(signer)?;

        self.verify_proof(&update.show_connections, signer, Domain::Bool, "show_connections")?;
        self.verify_proof(&update.show_activity, signer, Domain::Bool, "show_activity")?;
        self.verify_proof(&update.allow_messages, signer, Domain::Bool, "allow_messages")?;
        self.verify_proof(&update.show_reputation, signer, Domain::Bool, "show_reputation")?;

        self.privacy.insert(
            user_id,
            PrivacyRecord {
                enc_show_connections: update.show_connections.ciphertext,
                enc_show_activity: update.show_activity.ciphertext,
                enc_allow_messages: update.allow_messages.ciphertext,
                enc_show_reputation: update.show_reputation.ciphertext,
            },
        );
        self.touch(user_id, now);

        tracing::info!(user_id, "privacy settings replaced");

        Ok(LedgerEvent::PrivacySettingsUpdated {
            user_id,
            timestamp: now,
        })
    }

    /// Rotate the trusted proof authority. Owner-only; already-recorded
    /// ciphertexts are untouched.
    pub fn set_verifier(&mut self, caller: Address, verifier: Address) -> Result<(), LedgerError> {
        if caller != self.owner {
            return Err(LedgerError::Unauthorized);
        }
        tracing::info!(
            old = %format!("{:#x}", self.verifier),
            new = %format!("{:#x}", verifier),
            "verifier rotated"
        );
        self.verifier = verifier;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read-only views (plaintext fields only)
    // ------------------------------------------------------------------

    pub fn is_user_registered(&self, address: Address) -> bool {
        self.user_ids.contains_key(&address)
    }

    /// Identity id for an address; 0 means unregistered.
    pub fn get_user_id(&self, address: Address) -> u64 {
        self.user_ids.get(&address).copied().unwrap_or(0)
    }

    pub fn get_user_profile(&self, user_id: u64) -> Option<UserProfile> {
        self.identities.get(&user_id).map(|identity| UserProfile {
            public_name: identity.public_name.clone(),
            public_bio: identity.public_bio.clone(),
            wallet: identity.wallet,
            created_at: identity.created_at,
            last_active: identity.last_active,
        })
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn verifier(&self) -> Address {
        self.verifier
    }

    pub fn contract_address(&self) -> Address {
        self.contract
    }

    pub fn user_counter(&self) -> u64 {
        self.user_counter
    }

    pub fn connection_counter(&self) -> u64 {
        self.connection_counter
    }

    pub fn message_counter(&self) -> u64 {
        self.message_counter
    }

    /// Stored ciphertext records, for holders of a re-encryption key.
    pub fn connection(&self, id: u64) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn message(&self, id: u64) -> Option<&Message> {
        self.messages.get(&id)
    }

    pub fn privacy_of(&self, user_id: u64) -> Option<&PrivacyRecord> {
        self.privacy.get(&user_id)
    }

    pub fn identity(&self, user_id: u64) -> Option<&Identity> {
        self.identities.get(&user_id)
    }

    // ------------------------------------------------------------------

    fn require_registered(&self, signer: Address) -> Result<u64, LedgerError> {
        self.user_ids
            .get(&signer)
            .copied()
            .ok_or(LedgerError::NotRegistered)
    }

    fn verify_proof(
        &self,
        pair: &CiphertextProof,
        signer: Address,
        domain: Domain,
        field: &str,
    ) -> Result<(), LedgerError> {
        let ok = verify_input_proof(
            &self.params,
            &pair.ciphertext,
            &pair.input_proof,
            self.contract,
            signer,
            domain,
        );
        if ok {
            Ok(())
        } else {
            tracing::warn!(
                field,
                %domain,
                proof = %hex::encode(&pair.input_proof),
                "rejected input proof"
            );
            Err(LedgerError::ProofInvalid(field.to_string()))
        }
    }

    fn touch(&mut self, user_id: u64, now: u64) {
        if let Some(identity) = self.identities.get_mut(&user_id) {
            identity.last_active = now;
        }
    }

    /// Ledger-originated scheme-default ciphertexts (encrypted false for
    /// all four flags). These are not client inputs, so no proofs attach.
    fn default_privacy_record(&self) -> Result<PrivacyRecord, LedgerError> {
        let engine = FheEngine::new(self.params.clone());
        let encrypt_false = || {
            engine
                .encrypt(0, Domain::Bool, self.contract, self.contract)
                .map(|pair| pair.ciphertext)
                .map_err(|e| LedgerError::Internal(e.to_string()))
        };
        Ok(PrivacyRecord {
            enc_show_connections: encrypt_false()?,
            enc_show_activity: encrypt_false()?,
            enc_allow_messages: encrypt_false()?,
            enc_show_reputation: encrypt_false()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fhe::FheEngine;

    fn addr(byte: u8) -> Address {
        Address::from([byte; 20])
    }

    fn params() -> PublicParameters {
        PublicParameters {
            public_key: "ledger-test-key".to_string(),
        }
    }

    fn ledger() -> (ShadeLedger, FheEngine, Address) {
        let contract = addr(0xcc);
        let ledger = ShadeLedger::new(addr(0x01), addr(0x02), contract, params());
        let engine = FheEngine::new(params());
        (ledger, engine, contract)
    }

    #[test]
    fn test_register_assigns_sequential_ids_from_one() {
        let (mut ledger, engine, contract) = ledger();

        for i in 1..=3u8 {
            let signer = addr(0xa0 + i);
            let pair = engine.encrypt_u32(50, contract, signer).unwrap();
            let event = ledger
                .register_user(signer, 100 + i as u64, format!("user-{}", i), String::new(), pair)
                .unwrap();
            match event {
                LedgerEvent::UserRegistered { user_id, .. } => assert_eq!(user_id, i as u64),
                other => panic!("unexpected event: {:?}", other),
            }
        }
        assert_eq!(ledger.user_counter(), 3);
        assert_eq!(ledger.get_user_id(addr(0xa1)), 1);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let (mut ledger, engine, contract) = ledger();
        let signer = addr(0xaa);

        let pair = engine.encrypt_u32(50, contract, signer).unwrap();
        ledger
            .register_user(signer, 1, "Alice".into(), "hi".into(), pair)
            .unwrap();

        let pair = engine.encrypt_u32(60, contract, signer).unwrap();
        let err = ledger
            .register_user(signer, 2, "Alice".into(), "hi".into(), pair)
            .unwrap_err();
        assert_eq!(err, LedgerError::AlreadyRegistered);
        assert_eq!(ledger.user_counter(), 1);
    }

    #[test]
    fn test_registration_rejects_foreign_signer_proof() {
        let (mut ledger, engine, contract) = ledger();
        let (alice, mallory) = (addr(0xaa), addr(0xbb));

        // Proof generated for alice, submitted by mallory
        let pair = engine.encrypt_u32(50, contract, alice).unwrap();
        let err = ledger
            .register_user(mallory, 1, "Mallory".into(), String::new(), pair)
            .unwrap_err();
        assert!(matches!(err, LedgerError::ProofInvalid(_)));
        assert_eq!(ledger.user_counter(), 0);
    }

    #[test]
    fn test_registration_stores_default_privacy() {
        let (mut ledger, engine, contract) = ledger();
        let signer = addr(0xaa);

        let pair = engine.encrypt_u32(50, contract, signer).unwrap();
        ledger
            .register_user(signer, 1, "Alice".into(), String::new(), pair)
            .unwrap();

        let record = ledger.privacy_of(1).expect("defaults must exist");
        // Defaults decrypt to false under the scheme
        assert_eq!(
            engine.decrypt(&record.enc_show_connections).unwrap(),
            crate::fhe::ClearValue::Bool(false)
        );
        assert_eq!(
            engine.decrypt(&record.enc_allow_messages).unwrap(),
            crate::fhe::ClearValue::Bool(false)
        );
    }

    #[test]
    fn test_connection_requires_registered_endpoints() {
        let (mut ledger, engine, contract) = ledger();
        let (alice, bob) = (addr(0xaa), addr(0xbb));

        let pair = engine.encrypt(0, Domain::Uint8, contract, alice).unwrap();
        // Sender unregistered
        assert_eq!(
            ledger.create_connection(alice, 1, 1, pair.clone()).unwrap_err(),
            LedgerError::NotRegistered
        );

        let rep = engine.encrypt_u32(50, contract, alice).unwrap();
        ledger.register_user(alice, 1, "Alice".into(), String::new(), rep).unwrap();

        // Unknown target id
        let err = ledger.create_connection(alice, 2, 999, pair.clone()).unwrap_err();
        assert_eq!(err, LedgerError::UnknownTarget);
        assert_eq!(ledger.connection_counter(), 0);

        // Target id zero is never valid
        assert_eq!(
            ledger.create_connection(alice, 2, 0, pair).unwrap_err(),
            LedgerError::UnknownTarget
        );

        let rep = engine.encrypt_u32(50, contract, bob).unwrap();
        ledger.register_user(bob, 3, "Bob".into(), String::new(), rep).unwrap();

        let pair = engine.encrypt(1, Domain::Uint8, contract, alice).unwrap();
        let event = ledger.create_connection(alice, 4, 2, pair).unwrap();
        assert!(matches!(
            event,
            LedgerEvent::ConnectionCreated { connection_id: 1, from_id: 1, to_id: 2, .. }
        ));
        assert_eq!(ledger.connection_counter(), 1);
    }

    #[test]
    fn test_connection_rejects_wrong_domain_proof() {
        let (mut ledger, engine, contract) = ledger();
        let (alice, bob) = (addr(0xaa), addr(0xbb));
        let rep = engine.encrypt_u32(50, contract, alice).unwrap();
        ledger.register_user(alice, 1, "Alice".into(), String::new(), rep).unwrap();
        let rep = engine.encrypt_u32(50, contract, bob).unwrap();
        ledger.register_user(bob, 1, "Bob".into(), String::new(), rep).unwrap();

        // Bool ciphertext where uint8 is required
        let pair = engine.encrypt_bool(true, contract, alice).unwrap();
        let err = ledger.create_connection(alice, 2, 2, pair).unwrap_err();
        assert!(matches!(err, LedgerError::ProofInvalid(_)));
    }

    #[test]
    fn test_message_flow_and_last_active() {
        let (mut ledger, engine, contract) = ledger();
        let (alice, bob) = (addr(0xaa), addr(0xbb));
        let rep = engine.encrypt_u32(50, contract, alice).unwrap();
        ledger.register_user(alice, 10, "Alice".into(), String::new(), rep).unwrap();
        let rep = engine.encrypt_u32(50, contract, bob).unwrap();
        ledger.register_user(bob, 11, "Bob".into(), String::new(), rep).unwrap();

        let flag = engine.encrypt_bool(false, contract, alice).unwrap();
        let event = ledger
            .send_message(alice, 42, 2, "0xciphertext".into(), flag)
            .unwrap();
        assert!(matches!(event, LedgerEvent::MessageSent { message_id: 1, .. }));

        let stored = ledger.message(1).unwrap();
        assert_eq!(stored.encrypted_content, "0xciphertext");
        assert_eq!(ledger.get_user_profile(1).unwrap().last_active, 42);
        // Recipient's activity is untouched
        assert_eq!(ledger.get_user_profile(2).unwrap().last_active, 11);
    }

    #[test]
    fn test_privacy_update_is_atomic() {
        let (mut ledger, engine, contract) = ledger();
        let alice = addr(0xaa);
        let rep = engine.encrypt_u32(50, contract, alice).unwrap();
        ledger.register_user(alice, 1, "Alice".into(), String::new(), rep).unwrap();

        let before = ledger.privacy_of(1).unwrap().clone();

        let good = || engine.encrypt_bool(true, contract, alice).unwrap();
        let mut bad = engine.encrypt_bool(true, contract, alice).unwrap();
        // Corrupt the last flag's proof
        bad.input_proof[0] ^= 0xff;

        let update = EncryptedPrivacyUpdate {
            show_connections: good(),
            show_activity: good(),
            allow_messages: good(),
            show_reputation: bad,
        };
        let err = ledger.update_privacy_settings(alice, 2, update).unwrap_err();
        assert!(matches!(err, LedgerError::ProofInvalid(_)));

        // All four prior values unchanged
        let after = ledger.privacy_of(1).unwrap();
        assert_eq!(after.enc_show_connections, before.enc_show_connections);
        assert_eq!(after.enc_show_activity, before.enc_show_activity);
        assert_eq!(after.enc_allow_messages, before.enc_allow_messages);
        assert_eq!(after.enc_show_reputation, before.enc_show_reputation);
    }

    #[test]
    fn test_privacy_update_rejects_reused_proof() {
        // A client that generates one proof and attaches it to all four
        // ciphertexts must be rejected at the first mismatched flag.
        let (mut ledger, engine, contract) = ledger();
        let alice = addr(0xaa);
        let rep = engine.encrypt_u32(50, contract, alice).unwrap();
        ledger.register_user(alice, 1, "Alice".into(), String::new(), rep).unwrap();

        let first = engine.encrypt_bool(true, contract, alice).unwrap();
        let reused = |value: bool| {
            let mut pair = engine.encrypt_bool(value, contract, alice).unwrap();
            pair.input_proof = first.input_proof.clone();
            pair
        };

        let update = EncryptedPrivacyUpdate {
            show_connections: first.clone(),
            show_activity: reused(false),
            allow_messages: reused(true),
            show_reputation: reused(false),
        };
        let err = ledger.update_privacy_settings(alice, 2, update).unwrap_err();
        assert_eq!(err, LedgerError::ProofInvalid("show_activity".to_string()));
    }

    #[test]
    fn test_privacy_update_success() {
        let (mut ledger, engine, contract) = ledger();
        let alice = addr(0xaa);
        let rep = engine.encrypt_u32(50, contract, alice).unwrap();
        ledger.register_user(alice, 1, "Alice".into(), String::new(), rep).unwrap();

        let update = EncryptedPrivacyUpdate {
            show_connections: engine.encrypt_bool(true, contract, alice).unwrap(),
            show_activity: engine.encrypt_bool(false, contract, alice).unwrap(),
            allow_messages: engine.encrypt_bool(true, contract, alice).unwrap(),
            show_reputation: engine.encrypt_bool(false, contract, alice).unwrap(),
        };
        let event = ledger.update_privacy_settings(alice, 7, update).unwrap();
        assert_eq!(event, LedgerEvent::PrivacySettingsUpdated { user_id: 1, timestamp: 7 });

        let record = ledger.privacy_of(1).unwrap();
        assert_eq!(
            engine.decrypt(&record.enc_show_connections).unwrap(),
            crate::fhe::ClearValue::Bool(true)
        );
        assert_eq!(
            engine.decrypt(&record.enc_show_activity).unwrap(),
            crate::fhe::ClearValue::Bool(false)
        );
    }

    #[test]
    fn test_set_verifier_owner_gate() {
        let (mut ledger, _engine, _contract) = ledger();
        let owner = addr(0x01);

        assert_eq!(
            ledger.set_verifier(addr(0x99), addr(0xcc)).unwrap_err(),
            LedgerError::Unauthorized
        );
        assert_eq!(ledger.verifier(), addr(0x02));

        ledger.set_verifier(owner, addr(0xcc)).unwrap();
        assert_eq!(ledger.verifier(), addr(0xcc));
    }

    #[test]
    fn test_views_for_unknown_users() {
        let (ledger, _engine, _contract) = ledger();
        assert!(!ledger.is_user_registered(addr(0xbb)));
        assert_eq!(ledger.get_user_id(addr(0xbb)), 0);
        assert!(ledger.get_user_profile(0).is_none());
        assert!(ledger.get_user_profile(999).is_none());
    }
}
