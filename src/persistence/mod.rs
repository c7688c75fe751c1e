//! Persistence layer: ledger store and reward catalog ports.
//!
//! [`LedgerStore`] owns balances, movements and the redemption code
//! registry; every mutating method is a single atomic unit. The
//! [`RewardCatalog`] is read-only. Two implementations ship with the
//! crate: [`postgres::PostgresLedgerStore`] over `sqlx::PgPool` and
//! [`memory::InMemoryLedgerStore`] for tests and embedding.

pub mod memory;
pub mod models;
pub mod postgres;
pub mod provisioning;

use async_trait::async_trait;

use crate::domain::{
    CodeLookup, CodeMinter, ConsumeOutcome, CustomerSnapshot, PendingCode, Redemption,
    RedemptionCode, RedemptionDetail, RewardItem, Tenant,
};
use crate::error::LedgerError;

pub use memory::InMemoryLedgerStore;
pub use models::{
    CreditEntry, CreditOutcome, MovementFilter, MovementPage, RedemptionDebit, RedemptionOutcome,
    RewardWithPending, SortOrder,
};
pub use postgres::PostgresLedgerStore;

/// Balance store, movement log and redemption code registry.
#[async_trait]
pub trait LedgerStore: Send + Sync + std::fmt::Debug {
    /// Adds `entry.points` to the balance and appends a credit movement,
    /// atomically.
    ///
    /// # Errors
    ///
    /// [`LedgerError::CustomerNotFound`] if the customer does not exist,
    /// [`LedgerError::TenantNotProvisioned`] for an unknown tenant, and
    /// [`LedgerError::Persistence`] on store failure (rolled back).
    async fn apply_credit(
        &self,
        tenant: &Tenant,
        entry: &CreditEntry,
    ) -> Result<CreditOutcome, LedgerError>;

    /// Locks the balance, checks it covers `debit.cost`, subtracts it,
    /// appends a debit movement and mints a code, all in one transaction.
    ///
    /// # Errors
    ///
    /// [`LedgerError::CustomerNotFound`], [`LedgerError::InsufficientBalance`]
    /// (nothing written), [`LedgerError::CodeSpaceExhausted`] when every
    /// candidate collided (rolled back), plus store failures.
    async fn apply_redemption(
        &self,
        tenant: &Tenant,
        debit: &RedemptionDebit,
        minter: &CodeMinter,
    ) -> Result<RedemptionOutcome, LedgerError>;

    /// Looks a code up by value, joined with owner and item names.
    ///
    /// # Errors
    ///
    /// Store failures only; absence is `Ok(None)`.
    async fn find_code(
        &self,
        tenant: &Tenant,
        code: &RedemptionCode,
    ) -> Result<Option<CodeLookup>, LedgerError>;

    /// Newest unused code for a (customer, item) pair.
    ///
    /// # Errors
    ///
    /// Store failures only; absence is `Ok(None)`.
    async fn find_unused_code(
        &self,
        tenant: &Tenant,
        customer_id: i64,
        reward_item_id: i64,
    ) -> Result<Option<PendingCode>, LedgerError>;

    /// Flips a code from unused to used if it exists, is unused, and (when
    /// `expected_customer` is set) belongs to that customer.
    ///
    /// # Errors
    ///
    /// Store failures only; rule violations come back as [`ConsumeOutcome`].
    async fn consume_code(
        &self,
        tenant: &Tenant,
        code: &RedemptionCode,
        expected_customer: Option<i64>,
    ) -> Result<ConsumeOutcome, LedgerError>;

    /// Current customer data.
    ///
    /// # Errors
    ///
    /// Store failures only; absence is `Ok(None)`.
    async fn customer_snapshot(
        &self,
        tenant: &Tenant,
        customer_id: i64,
    ) -> Result<Option<CustomerSnapshot>, LedgerError>;

    /// One page of a customer's movements.
    ///
    /// # Errors
    ///
    /// Store failures only.
    async fn list_movements(
        &self,
        tenant: &Tenant,
        customer_id: i64,
        filter: &MovementFilter,
    ) -> Result<MovementPage, LedgerError>;

    /// Unused codes of a customer, newest first.
    ///
    /// # Errors
    ///
    /// Store failures only.
    async fn pending_codes(
        &self,
        tenant: &Tenant,
        customer_id: i64,
    ) -> Result<Vec<Redemption>, LedgerError>;

    /// Full view of one redemption row.
    ///
    /// # Errors
    ///
    /// Store failures only; absence is `Ok(None)`.
    async fn redemption_detail(
        &self,
        tenant: &Tenant,
        redemption_id: i64,
    ) -> Result<Option<RedemptionDetail>, LedgerError>;

    /// Creates the tenant's tables if they do not exist. Idempotent.
    ///
    /// # Errors
    ///
    /// Store failures only.
    async fn provision(&self, tenant: &Tenant) -> Result<(), LedgerError>;

    /// Round-trips to the store.
    ///
    /// # Errors
    ///
    /// Returns the store failure when it is unreachable.
    async fn ping(&self) -> Result<(), LedgerError>;
}

/// Read-only access to a tenant's reward items.
#[async_trait]
pub trait RewardCatalog: Send + Sync + std::fmt::Debug {
    /// Finds one item.
    ///
    /// # Errors
    ///
    /// Store failures only; absence is `Ok(None)`.
    async fn find_reward_item(
        &self,
        tenant: &Tenant,
        item_id: i64,
    ) -> Result<Option<RewardItem>, LedgerError>;

    /// All items, ordered by cost then id.
    ///
    /// # Errors
    ///
    /// Store failures only.
    async fn list_reward_items(&self, tenant: &Tenant) -> Result<Vec<RewardItem>, LedgerError>;
}
