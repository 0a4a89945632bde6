//! Sheet kinds and payloads

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Entity kinds that have a detail sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SheetKind {
    Account,
    Direction,
    Merchant,
    User,
    Transaction,
    Terminal,
    Provider,
    Wallet,
    WalletLinkedTransactions,
    WalletTransactions,
    Cascade,
    FinancialInstitution,
    PaymentType,
}

impl SheetKind {
    pub const ALL: [SheetKind; 13] = [
        SheetKind::Account,
        SheetKind::Direction,
        SheetKind::Merchant,
        SheetKind::User,
        SheetKind::Transaction,
        SheetKind::Terminal,
        SheetKind::Provider,
        SheetKind::Wallet,
        SheetKind::WalletLinkedTransactions,
        SheetKind::WalletTransactions,
        SheetKind::Cascade,
        SheetKind::FinancialInstitution,
        SheetKind::PaymentType,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SheetKind::Account => "account",
            SheetKind::Direction => "direction",
            SheetKind::Merchant => "merchant",
            SheetKind::User => "user",
            SheetKind::Transaction => "transaction",
            SheetKind::Terminal => "terminal",
            SheetKind::Provider => "provider",
            SheetKind::Wallet => "wallet",
            SheetKind::WalletLinkedTransactions => "wallet-linked-transactions",
            SheetKind::WalletTransactions => "wallet-transactions",
            SheetKind::Cascade => "cascade",
            SheetKind::FinancialInstitution => "financial-institution",
            SheetKind::PaymentType => "payment-type",
        }
    }
}

impl fmt::Display for SheetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SheetKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SheetKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::Validation(format!("Unknown sheet kind: {}", s)))
    }
}

/// Kind-specific data a sheet is opened with
///
/// Always carries the entity id; display fields (e.g. a merchant's name)
/// are denormalized so the sheet can render its header before loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetPayload {
    pub id: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, String>,
}

impl SheetPayload {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}
