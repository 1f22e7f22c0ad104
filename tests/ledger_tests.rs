// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! State-machine scenarios: registration uniqueness, id monotonicity,
//! proof binding, privacy-update atomicity and owner gating.

use ethers::types::Address;
use shade_network_node::fhe::{Domain, FheEngine, PublicParameters};
use shade_network_node::ledger::{
    EncryptedPrivacyUpdate, LedgerError, LedgerEvent, ShadeLedger,
};

fn addr(byte: u8) -> Address {
    Address::from([byte; 20])
}

fn params() -> PublicParameters {
    PublicParameters {
        public_key: "scenario-test-key".to_string(),
    }
}

fn setup() -> (ShadeLedger, FheEngine, Address) {
    let contract = addr(0xc0);
    let owner = addr(0x01);
    let verifier = addr(0x02);
    (
        ShadeLedger::new(owner, verifier, contract, params()),
        FheEngine::new(params()),
        contract,
    )
}

#[test]
fn scenario_a_register_and_look_up() {
    let (mut ledger, engine, contract) = setup();
    let alice = addr(0xaa);

    let rep = engine.encrypt_u32(50, contract, alice).unwrap();
    let event = ledger
        .register_user(alice, 1_700_000_000, "Alice".into(), "hi".into(), rep)
        .unwrap();

    assert!(matches!(
        event,
        LedgerEvent::UserRegistered { user_id: 1, wallet, .. } if wallet == alice
    ));
    assert!(ledger.is_user_registered(alice));
    assert_eq!(ledger.get_user_id(alice), 1);

    let profile = ledger.get_user_profile(1).unwrap();
    assert_eq!(profile.public_name, "Alice");
    assert_eq!(profile.public_bio, "hi");
    assert_eq!(profile.wallet, alice);
    assert_eq!(profile.created_at, 1_700_000_000);
}

#[test]
fn scenario_b_duplicate_registration_is_rejected() {
    let (mut ledger, engine, contract) = setup();
    let alice = addr(0xaa);

    let rep = engine.encrypt_u32(50, contract, alice).unwrap();
    ledger
        .register_user(alice, 1, "Alice".into(), "hi".into(), rep)
        .unwrap();

    let rep = engine.encrypt_u32(99, contract, alice).unwrap();
    let err = ledger
        .register_user(alice, 2, "Alice again".into(), String::new(), rep)
        .unwrap_err();

    assert_eq!(err, LedgerError::AlreadyRegistered);
    assert_eq!(err.to_string(), "User already registered");
    assert_eq!(ledger.user_counter(), 1);
}

#[test]
fn scenario_c_unregistered_address_resolves_to_zero() {
    let (ledger, _engine, _contract) = setup();
    let bob = addr(0xbb);

    assert!(!ledger.is_user_registered(bob));
    assert_eq!(ledger.get_user_id(bob), 0);
}

#[test]
fn scenario_d_verifier_rotation_is_owner_gated() {
    let (mut ledger, _engine, _contract) = setup();
    let owner = addr(0x01);
    let outsider = addr(0x77);

    ledger.set_verifier(owner, addr(0xcc)).unwrap();
    assert_eq!(ledger.verifier(), addr(0xcc));

    let err = ledger.set_verifier(outsider, addr(0xdd)).unwrap_err();
    assert_eq!(err, LedgerError::Unauthorized);
    assert_eq!(ledger.verifier(), addr(0xcc));
}

#[test]
fn scenario_e_connection_to_nonexistent_target() {
    let (mut ledger, engine, contract) = setup();
    let alice = addr(0xaa);

    let rep = engine.encrypt_u32(50, contract, alice).unwrap();
    ledger
        .register_user(alice, 1, "Alice".into(), String::new(), rep)
        .unwrap();

    let edge = engine.encrypt(0, Domain::Uint8, contract, alice).unwrap();
    let err = ledger.create_connection(alice, 2, 999, edge).unwrap_err();

    assert_eq!(err, LedgerError::UnknownTarget);
    assert_eq!(ledger.connection_counter(), 0);
}

#[test]
fn ids_are_strictly_increasing_from_one_per_record_type() {
    let (mut ledger, engine, contract) = setup();

    let users: Vec<Address> = (1..=4).map(|i| addr(0xa0 + i)).collect();
    for (i, user) in users.iter().enumerate() {
        let rep = engine.encrypt_u32(10, contract, *user).unwrap();
        let event = ledger
            .register_user(*user, i as u64, format!("u{}", i), String::new(), rep)
            .unwrap();
        match event {
            LedgerEvent::UserRegistered { user_id, .. } => {
                assert_eq!(user_id, i as u64 + 1);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    for (i, target) in (2..=4).enumerate() {
        let edge = engine.encrypt(1, Domain::Uint8, contract, users[0]).unwrap();
        let event = ledger
            .create_connection(users[0], 100, target, edge)
            .unwrap();
        match event {
            LedgerEvent::ConnectionCreated { connection_id, .. } => {
                assert_eq!(connection_id, i as u64 + 1);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    for i in 0..3u64 {
        let flag = engine.encrypt_bool(false, contract, users[1]).unwrap();
        let event = ledger
            .send_message(users[1], 200 + i, 1, format!("enc-{}", i), flag)
            .unwrap();
        match event {
            LedgerEvent::MessageSent { message_id, .. } => assert_eq!(message_id, i + 1),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    assert_eq!(ledger.user_counter(), 4);
    assert_eq!(ledger.connection_counter(), 3);
    assert_eq!(ledger.message_counter(), 3);
}

#[test]
fn proof_for_wrong_signer_or_domain_never_applies() {
    let (mut ledger, engine, contract) = setup();
    let (alice, bob) = (addr(0xaa), addr(0xbb));

    for user in [alice, bob] {
        let rep = engine.encrypt_u32(50, contract, user).unwrap();
        ledger
            .register_user(user, 1, format!("{:#x}", user), String::new(), rep)
            .unwrap();
    }

    // Edge proof generated by bob, submitted by alice
    let edge = engine.encrypt(0, Domain::Uint8, contract, bob).unwrap();
    let err = ledger.create_connection(alice, 2, 2, edge).unwrap_err();
    assert!(matches!(err, LedgerError::ProofInvalid(_)));

    // Correct signer but wrong domain (bool instead of uint8)
    let edge = engine.encrypt_bool(false, contract, alice).unwrap();
    let err = ledger.create_connection(alice, 2, 2, edge).unwrap_err();
    assert!(matches!(err, LedgerError::ProofInvalid(_)));

    assert_eq!(ledger.connection_counter(), 0);
}

#[test]
fn privacy_update_is_all_or_nothing() {
    let (mut ledger, engine, contract) = setup();
    let alice = addr(0xaa);
    let rep = engine.encrypt_u32(50, contract, alice).unwrap();
    ledger
        .register_user(alice, 1, "Alice".into(), String::new(), rep)
        .unwrap();

    // First update succeeds
    let update = EncryptedPrivacyUpdate {
        show_connections: engine.encrypt_bool(true, contract, alice).unwrap(),
        show_activity: engine.encrypt_bool(true, contract, alice).unwrap(),
        allow_messages: engine.encrypt_bool(true, contract, alice).unwrap(),
        show_reputation: engine.encrypt_bool(true, contract, alice).unwrap(),
    };
    ledger.update_privacy_settings(alice, 2, update).unwrap();
    let applied = ledger.privacy_of(1).unwrap().clone();

    // Second update carries one tampered ciphertext; nothing may change
    let mut tampered = engine.encrypt_bool(false, contract, alice).unwrap();
    tampered.ciphertext[1] ^= 0x01;
    let update = EncryptedPrivacyUpdate {
        show_connections: engine.encrypt_bool(false, contract, alice).unwrap(),
        show_activity: tampered,
        allow_messages: engine.encrypt_bool(false, contract, alice).unwrap(),
        show_reputation: engine.encrypt_bool(false, contract, alice).unwrap(),
    };
    let err = ledger.update_privacy_settings(alice, 3, update).unwrap_err();
    assert!(matches!(err, LedgerError::ProofInvalid(_)));

    let after = ledger.privacy_of(1).unwrap();
    assert_eq!(after.enc_show_connections, applied.enc_show_connections);
    assert_eq!(after.enc_show_activity, applied.enc_show_activity);
    assert_eq!(after.enc_allow_messages, applied.enc_allow_messages);
    assert_eq!(after.enc_show_reputation, applied.enc_show_reputation);
}

#[test]
fn stored_ciphertexts_decrypt_for_the_scheme_owner_only_path() {
    let (mut ledger, engine, contract) = setup();
    let alice = addr(0xaa);
    let rep = engine.encrypt_u32(77, contract, alice).unwrap();
    ledger
        .register_user(alice, 1, "Alice".into(), String::new(), rep)
        .unwrap();

    let identity = ledger.identity(1).unwrap();
    let key = engine.reencryption_key(contract, alice);
    let clear = engine.reencrypt(&identity.enc_reputation, &key).unwrap();
    assert_eq!(clear, shade_network_node::ClearValue::Uint32(77));
}
