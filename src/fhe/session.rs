// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! FHE Session Manager
//!
//! Obtains and caches the encryption network's public parameters and
//! hands out per-viewer re-encryption keys. Explicit lifecycle:
//! `initialize` / `teardown`, injectable into every component that
//! encrypts (no implicit global).
//!
//! Concurrent first callers of `initialize` collapse into one in-flight
//! fetch: an init mutex gates the network round trip while a read-mostly
//! `RwLock` cache serves everyone afterwards. This holds on both paths —
//! waiters of a failed attempt all receive that attempt's error instead
//! of refetching. Duplicate parameter fetches are a correctness bug, not
//! just wasted traffic.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use url::Url;

use super::engine::{FheEngine, PublicParameters, ReencryptionKey};
use super::error::FheError;
use ethers::types::Address;

/// Process-wide FHE session state. Cheap to clone; all clones share one
/// parameter cache.
#[derive(Clone)]
pub struct FheSession {
    gateway_url: Option<Url>,
    http: reqwest::Client,
    engine: Arc<RwLock<Option<FheEngine>>>,
    /// Serializes fetch attempts; holds the last attempt's failure so
    /// waiters of that attempt share it instead of refetching.
    init_gate: Arc<Mutex<Option<FheError>>>,
    /// Completed-attempt counter; lets a waiter tell "an attempt finished
    /// while I queued" apart from "nothing has run since I looked".
    attempts: Arc<AtomicU64>,
}

impl FheSession {
    pub fn new(gateway_url: Url) -> Self {
        Self {
            gateway_url: Some(gateway_url),
            http: reqwest::Client::new(),
            engine: Arc::new(RwLock::new(None)),
            init_gate: Arc::new(Mutex::new(None)),
            attempts: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Session seeded with known parameters; no network involved.
    /// Used by tests and by tooling that already holds the key.
    pub fn with_parameters(params: PublicParameters) -> Self {
        Self {
            gateway_url: None,
            http: reqwest::Client::new(),
            engine: Arc::new(RwLock::new(Some(FheEngine::new(params)))),
            init_gate: Arc::new(Mutex::new(None)),
            attempts: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Fetch (once) and cache the network's public parameters.
    ///
    /// Idempotent: later callers get the cached value. Concurrent first
    /// callers block on the init gate and converge on a single fetch,
    /// succeeding or failing together: waiters of a failed attempt all
    /// receive that attempt's `FheUnavailable`. The cache stays empty on
    /// failure, so a call arriving after the attempt concluded retries.
    pub async fn initialize(&self) -> Result<PublicParameters, FheError> {
        if let Some(engine) = self.engine.read().await.as_ref() {
            return Ok(engine.params().clone());
        }

        let observed = self.attempts.load(Ordering::Acquire);
        let mut gate = self.init_gate.lock().await;

        // Another initializer may have won the race while we waited.
        if let Some(engine) = self.engine.read().await.as_ref() {
            return Ok(engine.params().clone());
        }
        if self.attempts.load(Ordering::Acquire) != observed {
            // An attempt concluded while we queued; an empty cache means
            // it failed, and its error is ours too.
            if let Some(err) = (*gate).clone() {
                return Err(err);
            }
        }

        let result = self.fetch_public_parameters().await;
        self.attempts.fetch_add(1, Ordering::AcqRel);
        match result {
            Ok(params) => {
                *gate = None;
                *self.engine.write().await = Some(FheEngine::new(params.clone()));
                tracing::info!("FHE session initialized (public key cached)");
                Ok(params)
            }
            Err(err) => {
                *gate = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Drop cached parameters. The next `initialize` fetches afresh.
    pub async fn teardown(&self) {
        let mut gate = self.init_gate.lock().await;
        *gate = None;
        let mut engine = self.engine.write().await;
        if engine.take().is_some() {
            tracing::info!("FHE session torn down");
        }
    }

    pub async fn is_initialized(&self) -> bool {
        self.engine.read().await.is_some()
    }

    /// Engine over the cached parameters, or `EngineUninitialized`.
    pub async fn engine(&self) -> Result<FheEngine, FheError> {
        self.engine
            .read()
            .await
            .clone()
            .ok_or(FheError::EngineUninitialized)
    }

    /// Re-encryption key for one viewer within a contract scope.
    pub async fn key_for(
        &self,
        contract: Address,
        viewer: Address,
    ) -> Result<ReencryptionKey, FheError> {
        let engine = self.engine().await?;
        Ok(engine.reencryption_key(contract, viewer))
    }

    /// Probe whether the encryption network is reachable at all.
    pub async fn is_supported(&self) -> bool {
        self.fetch_public_parameters().await.is_ok()
    }

    async fn fetch_public_parameters(&self) -> Result<PublicParameters, FheError> {
        let gateway = self
            .gateway_url
            .as_ref()
            .ok_or_else(|| FheError::FheUnavailable("no gateway URL configured".to_string()))?;

        let endpoint = gateway
            .join("publicKey")
            .map_err(|e| FheError::FheUnavailable(format!("bad gateway URL: {}", e)))?;

        tracing::debug!("fetching FHE public parameters from {}", endpoint);

        let response = self.http.get(endpoint.clone()).send().await?;
        if !response.status().is_success() {
            return Err(FheError::FheUnavailable(format!(
                "gateway returned {} for {}",
                response.status(),
                endpoint
            )));
        }

        let params: PublicParameters = response.json().await?;
        if params.public_key.is_empty() {
            return Err(FheError::FheUnavailable(
                "gateway returned an empty public key".to_string(),
            ));
        }
        Ok(params)
    }
}
