//! Dispatch from sheet kind to panel renderer
//!
//! Every kind has exactly one renderer method on [`PanelTable`]; adding a
//! kind without a renderer fails to compile.

use std::fmt;

use super::kind::{SheetKind, SheetPayload};
use super::registry::SheetRegistry;

/// Open-state callback bound to one rendered sheet
#[derive(Clone, Copy)]
pub struct OpenChange<'r> {
    registry: &'r SheetRegistry,
    kind: SheetKind,
}

impl<'r> OpenChange<'r> {
    pub fn new(registry: &'r SheetRegistry, kind: SheetKind) -> Self {
        Self { registry, kind }
    }

    /// `false` closes the sheet; `true` is ignored
    pub fn call(&self, next: bool) {
        self.registry.on_open_change(self.kind, next);
    }
}

impl fmt::Debug for OpenChange<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenChange").field("kind", &self.kind).finish()
    }
}

/// Properties handed to a panel renderer
#[derive(Debug, Clone)]
pub struct PanelProps<'r> {
    pub kind: SheetKind,
    pub open: bool,
    pub payload: Option<SheetPayload>,
    pub on_open_change: OpenChange<'r>,
}

impl PanelProps<'_> {
    pub fn id(&self) -> Option<&str> {
        self.payload.as_ref().map(|p| p.id.as_str())
    }

    /// Report a new open state back to the registry
    pub fn set_open(&self, next: bool) {
        self.on_open_change.call(next);
    }
}

/// One renderer per sheet kind
pub trait PanelTable {
    type Output;

    fn account(&self, props: PanelProps<'_>) -> Self::Output;
    fn direction(&self, props: PanelProps<'_>) -> Self::Output;
    fn merchant(&self, props: PanelProps<'_>) -> Self::Output;
    fn user(&self, props: PanelProps<'_>) -> Self::Output;
    fn transaction(&self, props: PanelProps<'_>) -> Self::Output;
    fn terminal(&self, props: PanelProps<'_>) -> Self::Output;
    fn provider(&self, props: PanelProps<'_>) -> Self::Output;
    fn wallet(&self, props: PanelProps<'_>) -> Self::Output;
    fn wallet_linked_transactions(&self, props: PanelProps<'_>) -> Self::Output;
    fn wallet_transactions(&self, props: PanelProps<'_>) -> Self::Output;
    fn cascade(&self, props: PanelProps<'_>) -> Self::Output;
    fn financial_institution(&self, props: PanelProps<'_>) -> Self::Output;
    fn payment_type(&self, props: PanelProps<'_>) -> Self::Output;
}

/// Route props to the renderer for their kind
pub fn dispatch<T: PanelTable>(table: &T, props: PanelProps<'_>) -> T::Output {
    match props.kind {
        SheetKind::Account => table.account(props),
        SheetKind::Direction => table.direction(props),
        SheetKind::Merchant => table.merchant(props),
        SheetKind::User => table.user(props),
        SheetKind::Transaction => table.transaction(props),
        SheetKind::Terminal => table.terminal(props),
        SheetKind::Provider => table.provider(props),
        SheetKind::Wallet => table.wallet(props),
        SheetKind::WalletLinkedTransactions => table.wallet_linked_transactions(props),
        SheetKind::WalletTransactions => table.wallet_transactions(props),
        SheetKind::Cascade => table.cascade(props),
        SheetKind::FinancialInstitution => table.financial_institution(props),
        SheetKind::PaymentType => table.payment_type(props),
    }
}

/// Render every entry currently in the registry, in open order
pub fn render<T: PanelTable>(registry: &SheetRegistry, table: &T) -> Vec<T::Output> {
    registry
        .sheets()
        .into_iter()
        .map(|entry| {
            dispatch(
                table,
                PanelProps {
                    kind: entry.kind,
                    open: entry.is_open,
                    payload: entry.payload,
                    on_open_change: OpenChange {
                        registry,
                        kind: entry.kind,
                    },
                },
            )
        })
        .collect()
}

/// Plain-text renderer used by the terminal session
pub struct TextPanels;

impl TextPanels {
    fn line(&self, title: &str, props: &PanelProps<'_>) -> String {
        let state = if props.open { "open" } else { "closed" };
        let id = props.id().unwrap_or("-");
        let mut line = format!("[{}] {} {}", state, title, id);
        if let Some(payload) = &props.payload {
            for (key, value) in &payload.fields {
                line.push_str(&format!(" {}={}", key, value));
            }
        }
        line
    }
}

impl PanelTable for TextPanels {
    type Output = String;

    fn account(&self, props: PanelProps<'_>) -> String {
        self.line("Account", &props)
    }
    fn direction(&self, props: PanelProps<'_>) -> String {
        self.line("Direction", &props)
    }
    fn merchant(&self, props: PanelProps<'_>) -> String {
        // Merchant sheets are usually opened with the display name attached
        match props.payload.as_ref().and_then(|p| p.field("merchantName")) {
            Some(name) => format!("{} ({})", self.line("Merchant", &props), name),
            None => self.line("Merchant", &props),
        }
    }
    fn user(&self, props: PanelProps<'_>) -> String {
        self.line("User", &props)
    }
    fn transaction(&self, props: PanelProps<'_>) -> String {
        self.line("Transaction", &props)
    }
    fn terminal(&self, props: PanelProps<'_>) -> String {
        self.line("Terminal", &props)
    }
    fn provider(&self, props: PanelProps<'_>) -> String {
        self.line("Provider", &props)
    }
    fn wallet(&self, props: PanelProps<'_>) -> String {
        self.line("Wallet", &props)
    }
    fn wallet_linked_transactions(&self, props: PanelProps<'_>) -> String {
        self.line("Wallet linked transactions", &props)
    }
    fn wallet_transactions(&self, props: PanelProps<'_>) -> String {
        self.line("Wallet transactions", &props)
    }
    fn cascade(&self, props: PanelProps<'_>) -> String {
        self.line("Cascade", &props)
    }
    fn financial_institution(&self, props: PanelProps<'_>) -> String {
        self.line("Financial institution", &props)
    }
    fn payment_type(&self, props: PanelProps<'_>) -> String {
        self.line("Payment type", &props)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AllowAll;
    use std::sync::Arc;

    /// Records which renderer handled each kind, optionally dismissing one
    struct KindEcho {
        dismiss: Option<SheetKind>,
    }

    impl KindEcho {
        fn echo(&self, name: &'static str, p: PanelProps<'_>) -> (&'static str, bool) {
            if self.dismiss == Some(p.kind) {
                p.set_open(false);
            }
            (name, p.open)
        }
    }

    impl PanelTable for KindEcho {
        type Output = (&'static str, bool);

        fn account(&self, p: PanelProps<'_>) -> Self::Output {
            self.echo("account", p)
        }
        fn direction(&self, p: PanelProps<'_>) -> Self::Output {
            self.echo("direction", p)
        }
        fn merchant(&self, p: PanelProps<'_>) -> Self::Output {
            self.echo("merchant", p)
        }
        fn user(&self, p: PanelProps<'_>) -> Self::Output {
            self.echo("user", p)
        }
        fn transaction(&self, p: PanelProps<'_>) -> Self::Output {
            self.echo("transaction", p)
        }
        fn terminal(&self, p: PanelProps<'_>) -> Self::Output {
            self.echo("terminal", p)
        }
        fn provider(&self, p: PanelProps<'_>) -> Self::Output {
            self.echo("provider", p)
        }
        fn wallet(&self, p: PanelProps<'_>) -> Self::Output {
            self.echo("wallet", p)
        }
        fn wallet_linked_transactions(&self, p: PanelProps<'_>) -> Self::Output {
            self.echo("wallet-linked-transactions", p)
        }
        fn wallet_transactions(&self, p: PanelProps<'_>) -> Self::Output {
            self.echo("wallet-transactions", p)
        }
        fn cascade(&self, p: PanelProps<'_>) -> Self::Output {
            self.echo("cascade", p)
        }
        fn financial_institution(&self, p: PanelProps<'_>) -> Self::Output {
            self.echo("financial-institution", p)
        }
        fn payment_type(&self, p: PanelProps<'_>) -> Self::Output {
            self.echo("payment-type", p)
        }
    }

    #[test]
    fn test_dispatch_covers_every_kind() {
        let registry = SheetRegistry::new(Arc::new(AllowAll));
        for kind in SheetKind::ALL {
            let (name, open) = dispatch(
                &KindEcho { dismiss: None },
                PanelProps {
                    kind,
                    open: true,
                    payload: None,
                    on_open_change: OpenChange::new(&registry, kind),
                },
            );
            assert_eq!(name, kind.as_str());
            assert!(open);
        }
    }

    #[tokio::test]
    async fn test_render_in_open_order() {
        let registry = SheetRegistry::new(Arc::new(AllowAll));
        registry.open(SheetKind::Transaction, Some(SheetPayload::new("t1"))).await;
        registry
            .open(
                SheetKind::Merchant,
                Some(SheetPayload::new("m1").with_field("merchantName", "Acme")),
            )
            .await;
        registry.close(SheetKind::Transaction);

        let lines = render(&registry, &TextPanels);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "[closed] Transaction t1");
        assert!(lines[1].starts_with("[open] Merchant m1"));
        assert!(lines[1].ends_with("(Acme)"));
    }

    #[tokio::test]
    async fn test_panel_closes_itself_through_props() {
        let registry = SheetRegistry::new(Arc::new(AllowAll));
        registry.open(SheetKind::Wallet, Some(SheetPayload::new("w1"))).await;
        registry.open(SheetKind::User, Some(SheetPayload::new("u1"))).await;

        let rendered = render(
            &registry,
            &KindEcho {
                dismiss: Some(SheetKind::Wallet),
            },
        );

        assert_eq!(rendered, vec![("wallet", true), ("user", true)]);
        assert!(!registry.is_open(SheetKind::Wallet));
        assert!(registry.is_open(SheetKind::User));
        assert_eq!(registry.sheets().len(), 2);
    }

    #[tokio::test]
    async fn test_open_change_true_keeps_sheet() {
        let registry = SheetRegistry::new(Arc::new(AllowAll));
        registry.open(SheetKind::Cascade, Some(SheetPayload::new("c1"))).await;

        OpenChange::new(&registry, SheetKind::Cascade).call(true);
        assert!(registry.is_open(SheetKind::Cascade));

        OpenChange::new(&registry, SheetKind::Cascade).call(false);
        assert!(!registry.is_open(SheetKind::Cascade));
    }
}
