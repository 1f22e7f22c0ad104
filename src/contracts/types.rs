use ethers::prelude::*;
use serde::{Deserialize, Serialize};

// Ledger contract ABI. The call surface carries ciphertext blobs plus one
// input proof per ciphertext; updatePrivacySettings therefore takes four
// proofs, not a shared one.
abigen!(
    ShadeNetwork,
    r#"[
        {
            "inputs": [
                {"internalType": "string", "name": "_publicName", "type": "string"},
                {"internalType": "string", "name": "_publicBio", "type": "string"},
                {"internalType": "bytes", "name": "_encryptedReputation", "type": "bytes"},
                {"internalType": "bytes", "name": "_inputProof", "type": "bytes"}
            ],
            "name": "registerUser",
            "outputs": [],
            "stateMutability": "nonpayable",
            "type": "function"
        },
        {
            "inputs": [
                {"internalType": "uint256", "name": "_toUserId", "type": "uint256"},
                {"internalType": "bytes", "name": "_encryptedConnectionType", "type": "bytes"},
                {"internalType": "bytes", "name": "_inputProof", "type": "bytes"}
            ],
            "name": "createConnection",
            "outputs": [],
            "stateMutability": "nonpayable",
            "type": "function"
        },
        {
            "inputs": [
                {"internalType": "uint256", "name": "_toUserId", "type": "uint256"},
                {"internalType": "string", "name": "_encryptedContent", "type": "string"},
                {"internalType": "bytes", "name": "_encryptedIsRead", "type": "bytes"},
                {"internalType": "bytes", "name": "_inputProof", "type": "bytes"}
            ],
            "name": "sendMessage",
            "outputs": [],
            "stateMutability": "nonpayable",
            "type": "function"
        },
        {
            "inputs": [
                {"internalType": "bytes", "name": "_showConnections", "type": "bytes"},
                {"internalType": "bytes", "name": "_showConnectionsProof", "type": "bytes"},
                {"internalType": "bytes", "name": "_showActivity", "type": "bytes"},
                {"internalType": "bytes", "name": "_showActivityProof", "type": "bytes"},
                {"internalType": "bytes", "name": "_allowMessages", "type": "bytes"},
                {"internalType": "bytes", "name": "_allowMessagesProof", "type": "bytes"},
                {"internalType": "bytes", "name": "_showReputation", "type": "bytes"},
                {"internalType": "bytes", "name": "_showReputationProof", "type": "bytes"}
            ],
            "name": "updatePrivacySettings",
            "outputs": [],
            "stateMutability": "nonpayable",
            "type": "function"
        },
        {
            "inputs": [{"internalType": "address", "name": "_address", "type": "address"}],
            "name": "isUserRegistered",
            "outputs": [{"internalType": "bool", "name": "", "type": "bool"}],
            "stateMutability": "view",
            "type": "function"
        },
        {
            "inputs": [{"internalType": "address", "name": "_address", "type": "address"}],
            "name": "getUserId",
            "outputs": [{"internalType": "uint256", "name": "", "type": "uint256"}],
            "stateMutability": "view",
            "type": "function"
        },
        {
            "inputs": [{"internalType": "uint256", "name": "_userId", "type": "uint256"}],
            "name": "getUserProfile",
            "outputs": [
                {"internalType": "string", "name": "publicName", "type": "string"},
                {"internalType": "string", "name": "publicBio", "type": "string"},
                {"internalType": "address", "name": "walletAddress", "type": "address"},
                {"internalType": "uint256", "name": "createdAt", "type": "uint256"},
                {"internalType": "uint256", "name": "lastActive", "type": "uint256"}
            ],
            "stateMutability": "view",
            "type": "function"
        },
        {
            "inputs": [{"internalType": "address", "name": "_verifier", "type": "address"}],
            "name": "setVerifier",
            "outputs": [],
            "stateMutability": "nonpayable",
            "type": "function"
        },
        {
            "inputs": [],
            "name": "verifier",
            "outputs": [{"internalType": "address", "name": "", "type": "address"}],
            "stateMutability": "view",
            "type": "function"
        },
        {
            "inputs": [],
            "name": "owner",
            "outputs": [{"internalType": "address", "name": "", "type": "address"}],
            "stateMutability": "view",
            "type": "function"
        },
        {
            "inputs": [],
            "name": "userCounter",
            "outputs": [{"internalType": "uint256", "name": "", "type": "uint256"}],
            "stateMutability": "view",
            "type": "function"
        },
        {
            "inputs": [],
            "name": "connectionCounter",
            "outputs": [{"internalType": "uint256", "name": "", "type": "uint256"}],
            "stateMutability": "view",
            "type": "function"
        },
        {
            "inputs": [],
            "name": "messageCounter",
            "outputs": [{"internalType": "uint256", "name": "", "type": "uint256"}],
            "stateMutability": "view",
            "type": "function"
        },
        {
            "anonymous": false,
            "inputs": [
                {"indexed": true, "internalType": "uint256", "name": "userId", "type": "uint256"},
                {"indexed": true, "internalType": "address", "name": "wallet", "type": "address"},
                {"indexed": false, "internalType": "string", "name": "publicName", "type": "string"},
                {"indexed": false, "internalType": "uint256", "name": "timestamp", "type": "uint256"}
            ],
            "name": "UserRegistered",
            "type": "event"
        },
        {
            "anonymous": false,
            "inputs": [
                {"indexed": true, "internalType": "uint256", "name": "connectionId", "type": "uint256"},
                {"indexed": false, "internalType": "uint256", "name": "fromId", "type": "uint256"},
                {"indexed": false, "internalType": "uint256", "name": "toId", "type": "uint256"},
                {"indexed": false, "internalType": "uint256", "name": "timestamp", "type": "uint256"}
            ],
            "name": "ConnectionCreated",
            "type": "event"
        },
        {
            "anonymous": false,
            "inputs": [
                {"indexed": true, "internalType": "uint256", "name": "messageId", "type": "uint256"},
                {"indexed": false, "internalType": "uint256", "name": "fromId", "type": "uint256"},
                {"indexed": false, "internalType": "uint256", "name": "toId", "type": "uint256"},
                {"indexed": false, "internalType": "uint256", "name": "timestamp", "type": "uint256"}
            ],
            "name": "MessageSent",
            "type": "event"
        },
        {
            "anonymous": false,
            "inputs": [
                {"indexed": true, "internalType": "uint256", "name": "userId", "type": "uint256"},
                {"indexed": false, "internalType": "uint256", "name": "timestamp", "type": "uint256"}
            ],
            "name": "PrivacySettingsUpdated",
            "type": "event"
        }
    ]"#
);

/// Plaintext privacy flags as the user edits them. Each flag is encrypted
/// and proved independently before submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrivacySettings {
    pub show_connections: bool,
    pub show_activity: bool,
    pub allow_messages: bool,
    pub show_reputation: bool,
}
