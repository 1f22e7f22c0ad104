// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod network;

pub use network::{ConfigError, NetworkConfig};
