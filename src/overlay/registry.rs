//! Sheet registry
//!
//! Keeps the ordered list of requested detail sheets. Any component can ask
//! for a sheet to open or close; the renderer observes the list and draws
//! whatever is in it.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::auth::{AuthProbe, HttpAuthProbe};
use crate::api::ApiClient;
use crate::config::Config;
use crate::error::Result;

use super::kind::{SheetKind, SheetPayload};

/// One requested sheet
#[derive(Debug, Clone, PartialEq)]
pub struct SheetEntry {
    pub kind: SheetKind,
    /// False while the sheet plays its exit transition
    pub is_open: bool,
    pub payload: Option<SheetPayload>,
    pub opened_at: DateTime<Utc>,
}

/// Result of an open request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetOpen {
    Opened,
    /// Session check failed; registry unchanged
    Dropped,
}

/// Registry of detail sheets, at most one entry per kind
pub struct SheetRegistry {
    entries: watch::Sender<Vec<SheetEntry>>,
    auth: Arc<dyn AuthProbe>,
}

impl SheetRegistry {
    /// Create a registry gated by the given session check
    pub fn new(auth: Arc<dyn AuthProbe>) -> Self {
        let (entries, _) = watch::channel(Vec::new());
        Self { entries, auth }
    }

    /// Build a registry gated by the platform's auth check endpoint
    pub fn from_config(config: &Config) -> Result<Self> {
        let api = ApiClient::new(&config.api)?;
        let check = HttpAuthProbe::new(api, config.auth.check_path.clone());
        Ok(Self::new(Arc::new(check)))
    }

    /// Open a sheet, replacing any existing entry for the same kind
    ///
    /// The session check runs first. A failed check drops the request
    /// silently: nothing is added and no error reaches the caller.
    pub async fn open(&self, kind: SheetKind, payload: Option<SheetPayload>) -> SheetOpen {
        if let Err(e) = self.auth.check_auth().await {
            debug!(kind = %kind, error = %e, "Session check failed, dropping sheet open");
            return SheetOpen::Dropped;
        }

        self.entries.send_modify(|entries| {
            entries.retain(|entry| entry.kind != kind);
            entries.push(SheetEntry {
                kind,
                is_open: true,
                payload,
                opened_at: Utc::now(),
            });
        });
        debug!(kind = %kind, "Sheet opened");
        SheetOpen::Opened
    }

    /// Mark a sheet closed; keeps its payload and position
    pub fn close(&self, kind: SheetKind) {
        self.entries.send_if_modified(|entries| {
            match entries.iter_mut().find(|entry| entry.kind == kind) {
                Some(entry) if entry.is_open => {
                    entry.is_open = false;
                    true
                }
                _ => false,
            }
        });
    }

    /// Mark every sheet closed
    pub fn close_all(&self) {
        self.entries.send_if_modified(|entries| {
            let mut changed = false;
            for entry in entries.iter_mut().filter(|entry| entry.is_open) {
                entry.is_open = false;
                changed = true;
            }
            changed
        });
    }

    /// Open-state callback handed to each rendered sheet
    pub fn on_open_change(&self, kind: SheetKind, next: bool) {
        if !next {
            self.close(kind);
        }
    }

    /// Remove a closed sheet once its exit transition has finished
    ///
    /// Open sheets are left alone. Returns whether an entry was removed.
    pub fn prune(&self, kind: SheetKind) -> bool {
        self.entries.send_if_modified(|entries| {
            let before = entries.len();
            entries.retain(|entry| entry.kind != kind || entry.is_open);
            entries.len() != before
        })
    }

    /// Remove every closed sheet; returns how many were removed
    pub fn prune_closed(&self) -> usize {
        let mut removed = 0;
        self.entries.send_if_modified(|entries| {
            let before = entries.len();
            entries.retain(|entry| entry.is_open);
            removed = before - entries.len();
            removed > 0
        });
        if removed > 0 {
            info!(removed, "Pruned closed sheets");
        }
        removed
    }

    /// Snapshot of all entries in open order
    pub fn sheets(&self) -> Vec<SheetEntry> {
        self.entries.borrow().clone()
    }

    pub fn get(&self, kind: SheetKind) -> Option<SheetEntry> {
        self.entries
            .borrow()
            .iter()
            .find(|entry| entry.kind == kind)
            .cloned()
    }

    pub fn is_open(&self, kind: SheetKind) -> bool {
        self.get(kind).map(|entry| entry.is_open).unwrap_or(false)
    }

    /// Subscribe to entry list changes
    pub fn subscribe(&self) -> watch::Receiver<Vec<SheetEntry>> {
        self.entries.subscribe()
    }
}

/// Names matching the console's sheet API
impl SheetRegistry {
    pub async fn open_sheet(&self, kind: SheetKind, payload: Option<SheetPayload>) -> SheetOpen {
        self.open(kind, payload).await
    }

    pub fn close_sheet(&self, kind: SheetKind) {
        self.close(kind)
    }

    pub fn close_all_sheets(&self) {
        self.close_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AllowAll;
    use crate::error::Error;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Session whose verdict can be flipped mid-test
    struct SwitchSession {
        valid: AtomicBool,
        calls: AtomicUsize,
    }

    impl SwitchSession {
        fn new(valid: bool) -> Arc<Self> {
            Arc::new(Self {
                valid: AtomicBool::new(valid),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl AuthProbe for SwitchSession {
        async fn check_auth(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.valid.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(Error::SessionExpired)
            }
        }
    }

    /// Session check that parks until released
    struct GatedSession {
        entered: AtomicUsize,
        release: Notify,
    }

    #[async_trait]
    impl AuthProbe for GatedSession {
        async fn check_auth(&self) -> Result<()> {
            self.entered.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
            Ok(())
        }
    }

    fn registry() -> SheetRegistry {
        SheetRegistry::new(Arc::new(AllowAll))
    }

    #[tokio::test]
    async fn test_reopen_replaces_entry() {
        let registry = registry();

        registry
            .open_sheet(SheetKind::Account, Some(SheetPayload::new("123")))
            .await;
        registry
            .open_sheet(SheetKind::Account, Some(SheetPayload::new("456")))
            .await;

        let sheets = registry.sheets();
        assert_eq!(sheets.len(), 1);
        assert_eq!(sheets[0].payload.as_ref().unwrap().id, "456");
        assert!(sheets[0].is_open);
    }

    #[tokio::test]
    async fn test_reopen_moves_entry_to_end() {
        let registry = registry();

        registry.open(SheetKind::Account, Some(SheetPayload::new("a1"))).await;
        registry.open(SheetKind::User, Some(SheetPayload::new("u1"))).await;
        registry.close(SheetKind::Account);
        registry.open(SheetKind::Account, Some(SheetPayload::new("a2"))).await;

        let kinds: Vec<_> = registry.sheets().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec![SheetKind::User, SheetKind::Account]);
        assert!(registry.is_open(SheetKind::Account));
    }

    #[tokio::test]
    async fn test_close_keeps_payload_and_position() {
        let registry = registry();

        let merchant = SheetPayload::new("m1").with_field("merchantName", "Acme");
        registry.open(SheetKind::Merchant, Some(merchant)).await;
        registry.open(SheetKind::Terminal, Some(SheetPayload::new("t1"))).await;
        registry.close(SheetKind::Merchant);

        let sheets = registry.sheets();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].kind, SheetKind::Merchant);
        assert!(!sheets[0].is_open);
        assert_eq!(
            sheets[0].payload.as_ref().unwrap().field("merchantName"),
            Some("Acme")
        );
        assert!(sheets[1].is_open);
    }

    #[test]
    fn test_close_absent_kind_is_noop() {
        let registry = registry();
        let rx = registry.subscribe();

        registry.close(SheetKind::Wallet);

        assert!(registry.sheets().is_empty());
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_close_all_clears_flags_not_entries() {
        let registry = registry();

        registry.open_sheet(SheetKind::User, Some(SheetPayload::new("u1"))).await;
        registry.open_sheet(SheetKind::Transaction, Some(SheetPayload::new("t1"))).await;
        registry.close_all_sheets();

        let sheets = registry.sheets();
        assert_eq!(sheets.len(), 2);
        assert!(sheets.iter().all(|entry| !entry.is_open));
        assert_eq!(sheets[0].payload.as_ref().unwrap().id, "u1");
        assert_eq!(sheets[1].payload.as_ref().unwrap().id, "t1");
    }

    #[tokio::test]
    async fn test_rejected_session_drops_open() {
        let session = SwitchSession::new(false);
        let registry = SheetRegistry::new(session.clone());

        let outcome = registry
            .open_sheet(SheetKind::Account, Some(SheetPayload::new("1")))
            .await;

        assert_eq!(outcome, SheetOpen::Dropped);
        assert!(registry.sheets().is_empty());
        assert_eq!(session.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejected_session_keeps_existing_entry() {
        let session = SwitchSession::new(true);
        let registry = SheetRegistry::new(session.clone());

        registry.open(SheetKind::Account, Some(SheetPayload::new("old"))).await;
        session.valid.store(false, Ordering::SeqCst);
        let outcome = registry.open(SheetKind::Account, Some(SheetPayload::new("new"))).await;

        assert_eq!(outcome, SheetOpen::Dropped);
        let entry = registry.get(SheetKind::Account).unwrap();
        assert_eq!(entry.payload.unwrap().id, "old");
    }

    #[tokio::test]
    async fn test_open_resolving_after_close_wins() {
        let session = Arc::new(GatedSession {
            entered: AtomicUsize::new(0),
            release: Notify::new(),
        });
        let registry = Arc::new(SheetRegistry::new(session.clone()));

        // Seed an open entry without going through the gate
        registry.entries.send_modify(|entries| {
            entries.push(SheetEntry {
                kind: SheetKind::Account,
                is_open: true,
                payload: Some(SheetPayload::new("old")),
                opened_at: Utc::now(),
            })
        });

        let pending = tokio::spawn({
            let registry = registry.clone();
            async move {
                registry
                    .open(SheetKind::Account, Some(SheetPayload::new("new")))
                    .await
            }
        });
        while session.entered.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        registry.close(SheetKind::Account);
        assert!(!registry.is_open(SheetKind::Account));

        session.release.notify_one();
        assert_eq!(pending.await.unwrap(), SheetOpen::Opened);

        let entry = registry.get(SheetKind::Account).unwrap();
        assert!(entry.is_open);
        assert_eq!(entry.payload.unwrap().id, "new");
        assert_eq!(registry.sheets().len(), 1);
    }

    #[tokio::test]
    async fn test_open_without_payload() {
        let registry = registry();
        assert_eq!(registry.open(SheetKind::Provider, None).await, SheetOpen::Opened);
        assert!(registry.get(SheetKind::Provider).unwrap().payload.is_none());
    }

    #[tokio::test]
    async fn test_on_open_change() {
        let registry = registry();
        registry.open(SheetKind::Direction, Some(SheetPayload::new("d1"))).await;

        registry.on_open_change(SheetKind::Direction, true);
        assert!(registry.is_open(SheetKind::Direction));

        registry.on_open_change(SheetKind::Direction, false);
        assert!(!registry.is_open(SheetKind::Direction));
    }

    #[tokio::test]
    async fn test_prune_only_closed() {
        let registry = registry();
        registry.open(SheetKind::Wallet, Some(SheetPayload::new("w1"))).await;
        registry.open(SheetKind::WalletTransactions, Some(SheetPayload::new("w1"))).await;

        assert!(!registry.prune(SheetKind::Wallet));
        assert!(!registry.prune(SheetKind::Cascade));

        registry.close(SheetKind::Wallet);
        assert!(registry.prune(SheetKind::Wallet));
        assert_eq!(registry.sheets().len(), 1);

        registry.close_all();
        assert_eq!(registry.prune_closed(), 1);
        assert!(registry.sheets().is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let registry = registry();
        let mut rx = registry.subscribe();

        registry.open(SheetKind::User, Some(SheetPayload::new("u1"))).await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().len(), 1);

        registry.close(SheetKind::User);
        rx.changed().await.unwrap();
        assert!(!rx.borrow_and_update()[0].is_open);

        // Closing again changes nothing
        registry.close(SheetKind::User);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_from_config_fails_fast_on_bad_url() {
        let mut config = Config::default();
        config.api.base_url = "not a url".to_string();
        assert!(SheetRegistry::from_config(&config).is_err());
        assert!(SheetRegistry::from_config(&Config::default()).is_ok());
    }
}
