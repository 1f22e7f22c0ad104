// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Plaintext value domains
//!
//! Every ciphertext is proved to encode a value from a declared domain
//! (bit-width/type). The domain tag is baked into the ciphertext and
//! participates in proof binding, so a uint8 proof can never validate a
//! uint32 ciphertext.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declared plaintext type of a ciphertext
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    Uint8,
    Uint32,
    Bool,
}

impl Domain {
    /// Stable wire tag, first byte of every ciphertext
    pub fn tag(&self) -> u8 {
        match self {
            Domain::Uint8 => 0x01,
            Domain::Uint32 => 0x02,
            Domain::Bool => 0x03,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Domain> {
        match tag {
            0x01 => Some(Domain::Uint8),
            0x02 => Some(Domain::Uint32),
            0x03 => Some(Domain::Bool),
            _ => None,
        }
    }

    /// Plaintext width in bytes inside the ciphertext body
    pub fn width(&self) -> usize {
        match self {
            Domain::Uint8 => 1,
            Domain::Uint32 => 4,
            Domain::Bool => 1,
        }
    }

    /// Range check, performed before any encryption work
    pub fn contains(&self, value: u64) -> bool {
        match self {
            Domain::Uint8 => value <= u8::MAX as u64,
            Domain::Uint32 => value <= u32::MAX as u64,
            Domain::Bool => value <= 1,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Uint8 => write!(f, "uint8"),
            Domain::Uint32 => write!(f, "uint32"),
            Domain::Bool => write!(f, "bool"),
        }
    }
}

/// Directed-edge classification, stored only as a ciphertext on the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionType {
    Friend = 0,
    Follower = 1,
    Blocked = 2,
}

impl ConnectionType {
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }
}

impl TryFrom<u8> for ConnectionType {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ConnectionType::Friend),
            1 => Ok(ConnectionType::Follower),
            2 => Ok(ConnectionType::Blocked),
            other => Err(other),
        }
    }
}

impl FromStr for ConnectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "friend" => Ok(ConnectionType::Friend),
            "follower" => Ok(ConnectionType::Follower),
            "blocked" => Ok(ConnectionType::Blocked),
            other => Err(format!("unknown connection type: {}", other)),
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionType::Friend => write!(f, "friend"),
            ConnectionType::Follower => write!(f, "follower"),
            ConnectionType::Blocked => write!(f, "blocked"),
        }
    }
}

/// Typed output of decryption / re-encryption
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearValue {
    Uint8(u8),
    Uint32(u32),
    Bool(bool),
}

impl ClearValue {
    pub fn domain(&self) -> Domain {
        match self {
            ClearValue::Uint8(_) => Domain::Uint8,
            ClearValue::Uint32(_) => Domain::Uint32,
            ClearValue::Bool(_) => Domain::Bool,
        }
    }

    pub fn as_u64(&self) -> u64 {
        match self {
            ClearValue::Uint8(v) => *v as u64,
            ClearValue::Uint32(v) => *v as u64,
            ClearValue::Bool(v) => *v as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_ranges() {
        assert!(Domain::Uint8.contains(0));
        assert!(Domain::Uint8.contains(255));
        assert!(!Domain::Uint8.contains(256));

        assert!(Domain::Uint32.contains(u32::MAX as u64));
        assert!(!Domain::Uint32.contains(u32::MAX as u64 + 1));

        assert!(Domain::Bool.contains(0));
        assert!(Domain::Bool.contains(1));
        assert!(!Domain::Bool.contains(2));
    }

    #[test]
    fn test_domain_tag_round_trip() {
        for domain in [Domain::Uint8, Domain::Uint32, Domain::Bool] {
            assert_eq!(Domain::from_tag(domain.tag()), Some(domain));
        }
        assert_eq!(Domain::from_tag(0x00), None);
        assert_eq!(Domain::from_tag(0xff), None);
    }

    #[test]
    fn test_connection_type_codes() {
        assert_eq!(ConnectionType::Friend.as_u8(), 0);
        assert_eq!(ConnectionType::Follower.as_u8(), 1);
        assert_eq!(ConnectionType::Blocked.as_u8(), 2);

        assert_eq!(ConnectionType::try_from(1), Ok(ConnectionType::Follower));
        assert_eq!(ConnectionType::try_from(3), Err(3));
    }

    #[test]
    fn test_connection_type_from_str() {
        assert_eq!("Friend".parse::<ConnectionType>(), Ok(ConnectionType::Friend));
        assert_eq!("blocked".parse::<ConnectionType>(), Ok(ConnectionType::Blocked));
        assert!("enemy".parse::<ConnectionType>().is_err());
    }

    #[test]
    fn test_clear_value_accessors() {
        assert_eq!(ClearValue::Uint32(50).domain(), Domain::Uint32);
        assert_eq!(ClearValue::Bool(true).as_u64(), 1);
        assert_eq!(ClearValue::Uint8(2).as_u64(), 2);
    }
}
