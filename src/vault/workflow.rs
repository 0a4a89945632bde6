//! Vault unsealing workflow
//!
//! Walks an operator through first-time initiation and the multi-shard
//! unseal. The local step is always re-derived from the vault status fetched
//! after each successful action; the workflow never predicts the next state.
//!
//! ```text
//! AwaitingInit ──initiate──▶ Sealed ──begin_entry──▶ EnteringShard
//!                              ▲                         │ submit
//!                              │ cancel             ┌────┴─────┐
//!                              └──────────────── Waiting    Unsealed
//! ```
//!
//! Any failed remote call moves to `Error`. The error only affects messaging:
//! which actions are allowed depends on the last fetched [`VaultState`].

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

use super::client::VaultApi;
use super::shard::{fingerprint, validate_shard, DEFAULT_MIN_SHARD_LENGTH};
use super::types::{SealState, VaultState};

/// Local, client-only step of the unseal ritual
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsealStep {
    AwaitingInit,
    Sealed,
    EnteringShard,
    Waiting,
    Unsealed,
    Error,
}

impl UnsealStep {
    /// Step implied by a fetched vault state
    pub fn from_state(state: &VaultState) -> Self {
        if !state.initiated {
            return UnsealStep::AwaitingInit;
        }
        match state.state {
            SealState::Sealed => UnsealStep::Sealed,
            SealState::Waiting => UnsealStep::Waiting,
            SealState::Unsealed => UnsealStep::Unsealed,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            UnsealStep::AwaitingInit => "awaiting initiation",
            UnsealStep::Sealed => "sealed",
            UnsealStep::EnteringShard => "entering a shard",
            UnsealStep::Waiting => "waiting for shards",
            UnsealStep::Unsealed => "unsealed",
            UnsealStep::Error => "in error",
        }
    }
}

/// Snapshot of everything a vault page renders
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowView {
    pub step: UnsealStep,
    pub storage_state: Option<VaultState>,
    /// Message of the last failed remote call
    pub last_error: Option<String>,
    /// Inline message for the shard form
    pub validation_error: Option<String>,
    /// Shard text as typed
    pub draft: String,
    pub busy: bool,
}

impl WorkflowView {
    pub fn remaining_shards(&self) -> Option<u32> {
        self.storage_state.as_ref().and_then(VaultState::remaining_shards)
    }

    pub fn can_initiate(&self) -> bool {
        matches!(&self.storage_state, Some(s) if !s.initiated)
    }

    pub fn can_enter_shard(&self) -> bool {
        matches!(
            &self.storage_state,
            Some(s) if s.initiated && s.state != SealState::Unsealed
        )
    }

    pub fn can_cancel(&self) -> bool {
        matches!(
            &self.storage_state,
            Some(s) if s.initiated && matches!(s.state, SealState::Waiting | SealState::Unsealed)
        )
    }
}

/// Clears the busy flag when the action ends, even if its future is dropped
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Client-driven unseal state machine
pub struct UnsealWorkflow {
    api: Arc<dyn VaultApi>,
    view: RwLock<WorkflowView>,
    busy: AtomicBool,
    liveness: CancellationToken,
    min_shard_length: usize,
}

impl UnsealWorkflow {
    pub fn new(api: Arc<dyn VaultApi>) -> Self {
        Self::with_min_shard_length(api, DEFAULT_MIN_SHARD_LENGTH)
    }

    pub fn with_min_shard_length(api: Arc<dyn VaultApi>, min_shard_length: usize) -> Self {
        Self {
            api,
            view: RwLock::new(WorkflowView {
                step: UnsealStep::AwaitingInit,
                storage_state: None,
                last_error: None,
                validation_error: None,
                draft: String::new(),
                busy: false,
            }),
            busy: AtomicBool::new(false),
            liveness: CancellationToken::new(),
            min_shard_length,
        }
    }

    /// Current snapshot
    pub async fn view(&self) -> WorkflowView {
        let mut view = self.view.read().await.clone();
        view.busy = self.is_busy();
        view
    }

    pub async fn step(&self) -> UnsealStep {
        self.view.read().await.step
    }

    pub async fn storage_state(&self) -> Option<VaultState> {
        self.view.read().await.storage_state.clone()
    }

    pub async fn remaining_shards(&self) -> Option<u32> {
        self.view.read().await.remaining_shards()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Stop applying results; in-flight requests are abandoned
    pub fn detach(&self) {
        debug!("Unseal workflow detached");
        self.liveness.cancel();
    }

    pub fn is_detached(&self) -> bool {
        self.liveness.is_cancelled()
    }

    /// Replace the shard form text
    pub async fn set_draft(&self, text: impl Into<String>) -> Result<()> {
        if self.is_detached() {
            return Err(Error::Detached);
        }
        let mut view = self.view.write().await;
        view.draft = text.into();
        view.validation_error = None;
        Ok(())
    }

    pub async fn draft(&self) -> String {
        self.view.read().await.draft.clone()
    }

    /// Fetch the vault state and derive the step from it
    pub async fn refresh(&self) -> Result<VaultState> {
        let _busy = self.acquire()?;
        self.fetch_and_apply().await
    }

    /// Run first-time vault setup, then re-fetch
    pub async fn initiate_storage(&self) -> Result<VaultState> {
        let _busy = self.acquire()?;
        let view = self.view.read().await.clone();
        if !view.can_initiate() {
            return Err(self.invalid(view.step, "initiate the vault"));
        }

        info!("Initiating custody vault");
        match self.guarded(self.api.initiate_vault()).await {
            Ok(()) => self.fetch_and_apply().await,
            Err(e) => Err(self.fail("initiate", e).await),
        }
    }

    /// Switch the page into shard entry; no remote call
    pub async fn begin_entry(&self) -> Result<()> {
        if self.is_detached() {
            return Err(Error::Detached);
        }
        let mut view = self.view.write().await;
        if view.step == UnsealStep::EnteringShard {
            return Ok(());
        }
        let allowed = matches!(
            view.step,
            UnsealStep::Sealed | UnsealStep::Waiting | UnsealStep::Error
        ) && view.can_enter_shard();
        if !allowed {
            return Err(self.invalid(view.step, "enter a shard"));
        }
        view.step = UnsealStep::EnteringShard;
        view.validation_error = None;
        Ok(())
    }

    /// Submit the drafted shard, then re-fetch
    ///
    /// A draft shorter than the minimum (after trimming) is rejected locally
    /// and kept for correction. Once the request is sent the draft is cleared
    /// whether it succeeds or not.
    pub async fn submit_shard(&self) -> Result<VaultState> {
        let _busy = self.acquire()?;

        let shard = {
            let mut view = self.view.write().await;
            if view.step != UnsealStep::EnteringShard {
                return Err(self.invalid(view.step, "submit a shard"));
            }
            let validated = validate_shard(&view.draft, self.min_shard_length).map(str::to_string);
            match validated {
                Ok(shard) => {
                    view.validation_error = None;
                    shard
                }
                Err(e) => {
                    view.validation_error = Some(e.to_string());
                    return Err(e);
                }
            }
        };

        info!(fingerprint = %fingerprint(&shard), "Submitting partial key");
        let result = self.guarded(self.api.add_partial_key(&shard)).await;

        if !self.is_detached() {
            self.view.write().await.draft.clear();
        }

        match result {
            Ok(()) => self.fetch_and_apply().await,
            Err(e) => Err(self.fail("submit partial key", e).await),
        }
    }

    /// Set the draft and submit it in one go
    pub async fn submit(&self, shard: &str) -> Result<VaultState> {
        self.set_draft(shard).await?;
        self.submit_shard().await
    }

    /// Abort the current unseal (or reseal), then re-fetch
    pub async fn cancel_unsealing(&self) -> Result<VaultState> {
        let _busy = self.acquire()?;
        let view = self.view.read().await.clone();
        if !view.can_cancel() {
            return Err(self.invalid(view.step, "cancel unsealing"));
        }

        info!("Cancelling vault unsealing");
        match self.guarded(self.api.cancel_unsealing()).await {
            Ok(()) => self.fetch_and_apply().await,
            Err(e) => Err(self.fail("cancel unsealing", e).await),
        }
    }

    fn acquire(&self) -> Result<BusyGuard<'_>> {
        if self.is_detached() {
            return Err(Error::Detached);
        }
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| Error::Busy)?;
        Ok(BusyGuard(&self.busy))
    }

    /// Race a remote call against detachment
    async fn guarded<T>(&self, call: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            _ = self.liveness.cancelled() => Err(Error::Detached),
            result = call => result,
        }
    }

    async fn fetch_and_apply(&self) -> Result<VaultState> {
        let state = match self.guarded(self.api.get_vault_state()).await {
            Ok(state) => state,
            Err(e) => return Err(self.fail("fetch vault state", e).await),
        };
        if self.is_detached() {
            return Err(Error::Detached);
        }

        if let Err(e) = state.check_invariant() {
            warn!(error = %e, "Vault reported inconsistent shard counts");
        }

        let mut view = self.view.write().await;
        view.step = UnsealStep::from_state(&state);
        view.storage_state = Some(state.clone());
        view.last_error = None;
        debug!(step = ?view.step, "Vault state applied");
        Ok(state)
    }

    /// Record a failed remote call and hand the error back
    async fn fail(&self, action: &str, error: Error) -> Error {
        if matches!(error, Error::Detached) || self.is_detached() {
            return error;
        }
        warn!(action, error = %error, "Vault action failed");
        let mut view = self.view.write().await;
        view.step = UnsealStep::Error;
        view.last_error = Some(error.to_string());
        error
    }

    fn invalid(&self, step: UnsealStep, action: &str) -> Error {
        Error::InvalidTransition {
            step: step.label().to_string(),
            action: action.to_string(),
        }
    }
}
