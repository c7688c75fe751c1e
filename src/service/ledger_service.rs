//! Ledger service: validates requests, drives the store, emits events.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::movement::resolve_credit_points;
use crate::domain::{
    CodeLookup, CodeMinter, ConsumeOutcome, CustomerSnapshot, EventBus, LedgerEvent,
    MovementKind, PendingCode, Redemption, RedemptionCode, RedemptionDetail, Tenant,
};
use crate::error::LedgerError;
use crate::persistence::models::RewardWithPending;
use crate::persistence::{
    CreditEntry, CreditOutcome, LedgerStore, MovementFilter, MovementPage, RedemptionDebit,
    RedemptionOutcome, RewardCatalog,
};

/// Raw credit request as received from a caller.
#[derive(Debug, Clone, PartialEq)]
pub struct CreditRequest {
    /// Customer to credit.
    pub customer_id: i64,
    /// Movement type; must be `CREDITO`.
    pub kind: String,
    /// Explicit points.
    pub points: Option<i64>,
    /// Currency amount converted at 100 points per unit.
    pub currency_amount: Option<f64>,
    /// Source label.
    pub origin: Option<String>,
    /// Originating store.
    pub store_id: Option<i64>,
    /// Free-text note.
    pub note: Option<String>,
    /// Acting user.
    pub actor: i64,
}

/// Raw redemption request as received from a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemRequest {
    /// Customer spending the points.
    pub customer_id: i64,
    /// Item to redeem.
    pub reward_item_id: Option<i64>,
    /// Free-text note.
    pub note: Option<String>,
    /// Acting user.
    pub actor: i64,
}

/// Customer balance with the tenant catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewardsSummary {
    /// The customer.
    pub customer: CustomerSnapshot,
    /// Catalog ordered by cost then id, with pending codes.
    pub rewards: Vec<RewardWithPending>,
}

/// Orchestration layer for all ledger operations.
///
/// Stateless coordinator over a [`LedgerStore`], a [`RewardCatalog`] and
/// the [`EventBus`]. Mutations follow the same pattern: validate, run one
/// store transaction, publish a [`LedgerEvent`] after commit, return.
#[derive(Debug, Clone)]
pub struct LedgerService {
    store: Arc<dyn LedgerStore>,
    catalog: Arc<dyn RewardCatalog>,
    minter: CodeMinter,
    event_bus: EventBus,
}

impl LedgerService {
    /// Creates a service minting random codes.
    #[must_use]
    pub fn new(
        store: Arc<dyn LedgerStore>,
        catalog: Arc<dyn RewardCatalog>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            store,
            catalog,
            minter: CodeMinter::random(),
            event_bus,
        }
    }

    /// Replaces the code minter.
    #[must_use]
    pub fn with_minter(mut self, minter: CodeMinter) -> Self {
        self.minter = minter;
        self
    }

    /// Returns a reference to the inner [`EventBus`].
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    /// Credits points to a customer.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidInput`] when `tipo` is not `CREDITO`, the
    /// origin is blank or no positive amount resolves;
    /// [`LedgerError::CustomerNotFound`]; store failures.
    pub async fn credit(
        &self,
        tenant: &Tenant,
        request: CreditRequest,
    ) -> Result<CreditOutcome, LedgerError> {
        let kind: MovementKind = request.kind.parse()?;
        if kind != MovementKind::Credit {
            return Err(LedgerError::InvalidInput(
                "tipo must be CREDITO".to_string(),
            ));
        }
        let origin = request
            .origin
            .as_deref()
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .ok_or_else(|| LedgerError::InvalidInput("origem is required".to_string()))?;
        let points = resolve_credit_points(request.points, request.currency_amount)?;

        let entry = CreditEntry {
            customer_id: request.customer_id,
            points,
            origin: origin.to_string(),
            store_id: request.store_id,
            note: request.note,
            created_by: request.actor,
        };
        let outcome = self.store.apply_credit(tenant, &entry).await?;

        tracing::info!(
            %tenant,
            customer_id = entry.customer_id,
            movement_id = outcome.movement.id,
            points,
            balance = outcome.customer.balance,
            "points credited"
        );
        let _ = self.event_bus.publish(LedgerEvent::PointsCredited {
            event_id: Uuid::new_v4(),
            tenant: tenant.clone(),
            customer: outcome.customer.clone(),
            movement_id: outcome.movement.id,
            points,
            timestamp: Utc::now(),
        });
        Ok(outcome)
    }

    /// Spends points on a reward item and issues a redemption code.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidInput`] when the item id is missing or the
    /// item has no positive cost; [`LedgerError::RewardItemNotFound`];
    /// [`LedgerError::CustomerNotFound`];
    /// [`LedgerError::InsufficientBalance`];
    /// [`LedgerError::CodeSpaceExhausted`]; store failures.
    pub async fn redeem(
        &self,
        tenant: &Tenant,
        request: RedeemRequest,
    ) -> Result<RedemptionOutcome, LedgerError> {
        let item_id = request.reward_item_id.ok_or_else(|| {
            LedgerError::InvalidInput("id_item_recompensa is required".to_string())
        })?;
        let item = self
            .catalog
            .find_reward_item(tenant, item_id)
            .await?
            .ok_or(LedgerError::RewardItemNotFound(item_id))?;
        let cost = item.redeemable_cost().ok_or_else(|| {
            LedgerError::InvalidInput(format!("reward item {item_id} has no point cost"))
        })?;

        let debit = RedemptionDebit {
            customer_id: request.customer_id,
            reward_item_id: item_id,
            cost,
            note: request.note,
            created_by: request.actor,
        };
        let outcome = self
            .store
            .apply_redemption(tenant, &debit, &self.minter)
            .await?;

        tracing::info!(
            %tenant,
            customer_id = debit.customer_id,
            movement_id = outcome.movement.id,
            code = %outcome.redemption.code,
            cost,
            balance = outcome.customer.balance,
            "reward redeemed"
        );
        let _ = self.event_bus.publish(LedgerEvent::RewardRedeemed {
            event_id: Uuid::new_v4(),
            tenant: tenant.clone(),
            customer: outcome.customer.clone(),
            item,
            movement_id: outcome.movement.id,
            code: outcome.redemption.code.clone(),
            timestamp: Utc::now(),
        });
        Ok(outcome)
    }

    /// Looks a code up by value.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidInput`] for a malformed code,
    /// [`LedgerError::CodeNotFound`], store failures.
    pub async fn find_code(&self, tenant: &Tenant, raw_code: &str) -> Result<CodeLookup, LedgerError> {
        let code = RedemptionCode::parse(raw_code)?;
        self.store
            .find_code(tenant, &code)
            .await?
            .ok_or(LedgerError::CodeNotFound)
    }

    /// Newest unused code of a customer for an item.
    ///
    /// # Errors
    ///
    /// [`LedgerError::CodeNotFound`] when there is none; store failures.
    pub async fn find_unused_code(
        &self,
        tenant: &Tenant,
        customer_id: i64,
        reward_item_id: i64,
    ) -> Result<PendingCode, LedgerError> {
        self.store
            .find_unused_code(tenant, customer_id, reward_item_id)
            .await?
            .ok_or(LedgerError::CodeNotFound)
    }

    /// Marks a code as used. With `expected_customer`, the code must belong
    /// to that customer.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidInput`] for a malformed code,
    /// [`LedgerError::CodeNotFound`], [`LedgerError::AlreadyUsed`],
    /// [`LedgerError::Forbidden`], store failures.
    pub async fn consume_code(
        &self,
        tenant: &Tenant,
        raw_code: &str,
        expected_customer: Option<i64>,
    ) -> Result<Redemption, LedgerError> {
        let code = RedemptionCode::parse(raw_code)?;
        match self
            .store
            .consume_code(tenant, &code, expected_customer)
            .await?
        {
            ConsumeOutcome::Consumed(redemption) => {
                tracing::info!(
                    %tenant,
                    customer_id = redemption.customer_id,
                    code = %redemption.code,
                    "redemption code consumed"
                );
                let _ = self.event_bus.publish(LedgerEvent::CodeConsumed {
                    event_id: Uuid::new_v4(),
                    tenant: tenant.clone(),
                    customer_id: redemption.customer_id,
                    reward_item_id: redemption.reward_item_id,
                    code: redemption.code.clone(),
                    timestamp: Utc::now(),
                });
                Ok(redemption)
            }
            ConsumeOutcome::Missing => Err(LedgerError::CodeNotFound),
            ConsumeOutcome::AlreadyUsed(redemption) => {
                Err(LedgerError::AlreadyUsed(redemption.code.to_string()))
            }
            ConsumeOutcome::OwnedByOther(redemption) => {
                tracing::warn!(
                    %tenant,
                    owner = redemption.customer_id,
                    expected = ?expected_customer,
                    code = %redemption.code,
                    "consume attempt for a code owned by another customer"
                );
                Err(LedgerError::Forbidden(redemption.code.to_string()))
            }
        }
    }

    /// One page of a customer's movement history.
    ///
    /// # Errors
    ///
    /// [`LedgerError::InvalidInput`] for bad paging or dates,
    /// [`LedgerError::CustomerNotFound`], store failures.
    pub async fn movement_history(
        &self,
        tenant: &Tenant,
        customer_id: i64,
        filter: &MovementFilter,
    ) -> Result<MovementPage, LedgerError> {
        filter.validate()?;
        self.require_customer(tenant, customer_id).await?;
        self.store.list_movements(tenant, customer_id, filter).await
    }

    /// Customer balance plus the catalog annotated with pending codes.
    ///
    /// # Errors
    ///
    /// [`LedgerError::CustomerNotFound`], store failures.
    pub async fn rewards_summary(
        &self,
        tenant: &Tenant,
        customer_id: i64,
    ) -> Result<RewardsSummary, LedgerError> {
        let customer = self.require_customer(tenant, customer_id).await?;
        let items = self.catalog.list_reward_items(tenant).await?;
        let pending = self.store.pending_codes(tenant, customer_id).await?;

        // `pending` is newest first, so the first code seen per item wins.
        let mut newest: HashMap<i64, String> = HashMap::new();
        for redemption in pending {
            newest
                .entry(redemption.reward_item_id)
                .or_insert_with(|| redemption.code.to_string());
        }
        let rewards = items
            .into_iter()
            .map(|item| RewardWithPending {
                pending_code: newest.get(&item.id).cloned(),
                item,
            })
            .collect();
        Ok(RewardsSummary { customer, rewards })
    }

    /// Full view of a redemption by row id.
    ///
    /// # Errors
    ///
    /// [`LedgerError::RedemptionNotFound`], store failures.
    pub async fn redemption_detail(
        &self,
        tenant: &Tenant,
        redemption_id: i64,
    ) -> Result<RedemptionDetail, LedgerError> {
        self.store
            .redemption_detail(tenant, redemption_id)
            .await?
            .ok_or(LedgerError::RedemptionNotFound(redemption_id))
    }

    /// Creates the tenant's tables if missing.
    ///
    /// # Errors
    ///
    /// Store failures.
    pub async fn provision_tenant(&self, tenant: &Tenant) -> Result<(), LedgerError> {
        self.store.provision(tenant).await
    }

    /// Checks the store is reachable.
    ///
    /// # Errors
    ///
    /// The store failure when it is not.
    pub async fn health(&self) -> Result<(), LedgerError> {
        self.store.ping().await
    }

    async fn require_customer(
        &self,
        tenant: &Tenant,
        customer_id: i64,
    ) -> Result<CustomerSnapshot, LedgerError> {
        self.store
            .customer_snapshot(tenant, customer_id)
            .await?
            .ok_or(LedgerError::CustomerNotFound(customer_id))
    }
}
