//! Customer data read by the ledger.
//!
//! Customer profiles are owned by the customer CRUD service; the ledger
//! only reads contact fields and mutates the balance.

use serde::Serialize;

/// Balance owner as seen at a single point in a transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomerSnapshot {
    /// Customer identifier.
    pub id: i64,
    /// Full display name.
    pub full_name: String,
    /// Contact e-mail.
    pub email: String,
    /// WhatsApp number, when on file.
    pub whatsapp: Option<String>,
    /// Point balance (never negative).
    pub balance: i64,
}

impl CustomerSnapshot {
    /// Public customer code shown on cards and receipts.
    #[must_use]
    pub fn customer_code(&self) -> String {
        customer_code(self.id)
    }
}

/// Formats the public customer code, `CLI-<id>`.
#[must_use]
pub fn customer_code(id: i64) -> String {
    format!("CLI-{id}")
}
