//! In-memory ledger store.
//!
//! [`InMemoryLedgerStore`] keeps one book per tenant behind its own
//! [`tokio::sync::Mutex`], so every mutation of a tenant is serialized and
//! applied all-or-nothing, matching the transactional guarantees of the
//! PostgreSQL store. Different tenants proceed concurrently. Used by tests
//! and when embedding the ledger without a database.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use super::models::{
    CreditEntry, CreditOutcome, MovementFilter, MovementPage, RedemptionDebit, RedemptionOutcome,
    SortOrder,
};
use super::{LedgerStore, RewardCatalog};
use crate::domain::movement::REDEMPTION_ORIGIN;
use crate::domain::{
    CodeLookup, CodeMinter, ConsumeOutcome, CustomerSnapshot, Movement, MovementKind,
    PendingCode, Redemption, RedemptionCode, RedemptionDetail, RewardItem, Tenant,
};
use crate::error::LedgerError;

#[derive(Debug, Default)]
struct TenantBook {
    customers: BTreeMap<i64, CustomerSnapshot>,
    items: BTreeMap<i64, RewardItem>,
    movements: Vec<Movement>,
    redemptions: Vec<Redemption>,
    last_customer_id: i64,
    last_item_id: i64,
    last_movement_id: i64,
    last_redemption_id: i64,
}

impl TenantBook {
    fn movement(&self, id: i64) -> Option<&Movement> {
        self.movements.iter().find(|m| m.id == id)
    }

    fn redemption_by_code(&self, code: &RedemptionCode) -> Option<&Redemption> {
        self.redemptions.iter().find(|r| &r.code == code)
    }

    fn redemption_by_code_mut(&mut self, code: &RedemptionCode) -> Option<&mut Redemption> {
        self.redemptions.iter_mut().find(|r| &r.code == code)
    }

    fn push_movement(&mut self, mut movement: Movement) -> Movement {
        self.last_movement_id += 1;
        movement.id = self.last_movement_id;
        self.movements.push(movement.clone());
        movement
    }
}

/// Ledger store that keeps every tenant in process memory.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    tenants: RwLock<HashMap<Tenant, Arc<Mutex<TenantBook>>>>,
}

impl InMemoryLedgerStore {
    /// Creates a store with no tenants.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn book(&self, tenant: &Tenant) -> Result<Arc<Mutex<TenantBook>>, LedgerError> {
        let map = self.tenants.read().await;
        map.get(tenant)
            .map(Arc::clone)
            .ok_or_else(|| LedgerError::TenantNotProvisioned(tenant.to_string()))
    }

    /// Registers a customer with a zero balance and returns its id.
    ///
    /// Customer profiles are owned elsewhere; this exists to seed data.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::TenantNotProvisioned`] for an unknown tenant.
    pub async fn insert_customer(
        &self,
        tenant: &Tenant,
        full_name: &str,
        email: &str,
        whatsapp: Option<&str>,
    ) -> Result<i64, LedgerError> {
        let book = self.book(tenant).await?;
        let mut book = book.lock().await;
        book.last_customer_id += 1;
        let id = book.last_customer_id;
        book.customers.insert(
            id,
            CustomerSnapshot {
                id,
                full_name: full_name.to_string(),
                email: email.to_string(),
                whatsapp: whatsapp.map(str::to_string),
                balance: 0,
            },
        );
        Ok(id)
    }

    /// Adds a reward item to the catalog. The given `id` is replaced by the
    /// next free one, which is returned.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::TenantNotProvisioned`] for an unknown tenant.
    pub async fn insert_reward_item(
        &self,
        tenant: &Tenant,
        mut item: RewardItem,
    ) -> Result<i64, LedgerError> {
        let book = self.book(tenant).await?;
        let mut book = book.lock().await;
        book.last_item_id += 1;
        item.id = book.last_item_id;
        let id = item.id;
        book.items.insert(id, item);
        Ok(id)
    }

    /// Every movement of a customer in creation order.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::TenantNotProvisioned`] for an unknown tenant.
    pub async fn movements_of(
        &self,
        tenant: &Tenant,
        customer_id: i64,
    ) -> Result<Vec<Movement>, LedgerError> {
        let book = self.book(tenant).await?;
        let book = book.lock().await;
        Ok(book
            .movements
            .iter()
            .filter(|m| m.customer_id == customer_id)
            .cloned()
            .collect())
    }

    /// Every issued code of the tenant in issue order.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::TenantNotProvisioned`] for an unknown tenant.
    pub async fn redemptions(&self, tenant: &Tenant) -> Result<Vec<Redemption>, LedgerError> {
        let book = self.book(tenant).await?;
        let book = book.lock().await;
        Ok(book.redemptions.clone())
    }

    /// Inserts a code row directly, bypassing the debit path.
    ///
    /// Lets callers occupy code values, e.g. to exercise collisions.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::TenantNotProvisioned`] for an unknown tenant,
    /// [`LedgerError::CustomerNotFound`] / [`LedgerError::RewardItemNotFound`]
    /// for dangling references, and [`LedgerError::InvalidInput`] if the
    /// code is already taken.
    pub async fn insert_redemption(
        &self,
        tenant: &Tenant,
        customer_id: i64,
        reward_item_id: i64,
        code: RedemptionCode,
    ) -> Result<Redemption, LedgerError> {
        let book = self.book(tenant).await?;
        let mut book = book.lock().await;
        if !book.customers.contains_key(&customer_id) {
            return Err(LedgerError::CustomerNotFound(customer_id));
        }
        if !book.items.contains_key(&reward_item_id) {
            return Err(LedgerError::RewardItemNotFound(reward_item_id));
        }
        if book.redemption_by_code(&code).is_some() {
            return Err(LedgerError::InvalidInput(format!("code {code} already issued")));
        }
        book.last_redemption_id += 1;
        let redemption = Redemption {
            id: book.last_redemption_id,
            customer_id,
            reward_item_id,
            movement_id: None,
            code,
            tenant: tenant.to_string(),
            used: false,
            created_by: 1,
            created_at: Utc::now(),
        };
        book.redemptions.push(redemption.clone());
        Ok(redemption)
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn apply_credit(
        &self,
        tenant: &Tenant,
        entry: &CreditEntry,
    ) -> Result<CreditOutcome, LedgerError> {
        let book = self.book(tenant).await?;
        let mut book = book.lock().await;

        let customer = book
            .customers
            .get_mut(&entry.customer_id)
            .ok_or(LedgerError::CustomerNotFound(entry.customer_id))?;
        let new_balance = customer
            .balance
            .checked_add(entry.points)
            .ok_or_else(|| LedgerError::Internal("balance overflow".to_string()))?;
        customer.balance = new_balance;
        let customer = customer.clone();

        let movement = book.push_movement(Movement {
            id: 0,
            customer_id: entry.customer_id,
            kind: MovementKind::Credit,
            points: entry.points,
            resulting_balance: new_balance,
            origin: entry.origin.clone(),
            store_id: entry.store_id,
            reward_item_id: None,
            note: entry.note.clone(),
            created_by: entry.created_by,
            created_at: Utc::now(),
        });

        Ok(CreditOutcome { movement, customer })
    }

    async fn apply_redemption(
        &self,
        tenant: &Tenant,
        debit: &RedemptionDebit,
        minter: &CodeMinter,
    ) -> Result<RedemptionOutcome, LedgerError> {
        let book = self.book(tenant).await?;
        let mut book = book.lock().await;

        let balance = book
            .customers
            .get(&debit.customer_id)
            .map(|c| c.balance)
            .ok_or(LedgerError::CustomerNotFound(debit.customer_id))?;
        if balance < debit.cost {
            return Err(LedgerError::InsufficientBalance {
                balance,
                required: debit.cost,
            });
        }

        // Pick the code before touching anything so exhaustion leaves the
        // book unchanged.
        let Some(code) = minter
            .candidates()
            .find(|candidate| book.redemption_by_code(candidate).is_none())
        else {
            tracing::error!(
                %tenant,
                customer_id = debit.customer_id,
                attempts = minter.max_attempts(),
                "redemption code space exhausted"
            );
            return Err(minter.exhausted());
        };

        let new_balance = balance - debit.cost;
        let customer = match book.customers.get_mut(&debit.customer_id) {
            Some(customer) => {
                customer.balance = new_balance;
                customer.clone()
            }
            None => return Err(LedgerError::CustomerNotFound(debit.customer_id)),
        };

        let now = Utc::now();
        let movement = book.push_movement(Movement {
            id: 0,
            customer_id: debit.customer_id,
            kind: MovementKind::Debit,
            points: debit.cost,
            resulting_balance: new_balance,
            origin: REDEMPTION_ORIGIN.to_string(),
            store_id: None,
            reward_item_id: Some(debit.reward_item_id),
            note: debit.note.clone(),
            created_by: debit.created_by,
            created_at: now,
        });

        book.last_redemption_id += 1;
        let redemption = Redemption {
            id: book.last_redemption_id,
            customer_id: debit.customer_id,
            reward_item_id: debit.reward_item_id,
            movement_id: Some(movement.id),
            code,
            tenant: tenant.to_string(),
            used: false,
            created_by: debit.created_by,
            created_at: now,
        };
        book.redemptions.push(redemption.clone());

        Ok(RedemptionOutcome {
            movement,
            redemption,
            customer,
        })
    }

    async fn find_code(
        &self,
        tenant: &Tenant,
        code: &RedemptionCode,
    ) -> Result<Option<CodeLookup>, LedgerError> {
        let book = self.book(tenant).await?;
        let book = book.lock().await;
        let Some(redemption) = book.redemption_by_code(code) else {
            return Ok(None);
        };
        let Some(customer) = book.customers.get(&redemption.customer_id) else {
            return Ok(None);
        };
        Ok(Some(CodeLookup {
            redemption: redemption.clone(),
            customer_name: customer.full_name.clone(),
            customer_balance: customer.balance,
            item_name: book
                .items
                .get(&redemption.reward_item_id)
                .map(|i| i.name.clone()),
        }))
    }

    async fn find_unused_code(
        &self,
        tenant: &Tenant,
        customer_id: i64,
        reward_item_id: i64,
    ) -> Result<Option<PendingCode>, LedgerError> {
        let book = self.book(tenant).await?;
        let book = book.lock().await;
        let Some(customer) = book.customers.get(&customer_id) else {
            return Ok(None);
        };
        let newest = book
            .redemptions
            .iter()
            .filter(|r| {
                !r.used && r.customer_id == customer_id && r.reward_item_id == reward_item_id
            })
            .max_by_key(|r| (r.created_at, r.id));
        Ok(newest.map(|redemption| {
            let movement = redemption.movement_id.and_then(|id| book.movement(id));
            PendingCode {
                redemption: redemption.clone(),
                current_balance: customer.balance,
                movement_points: movement.map(|m| m.points),
                movement_resulting_balance: movement.map(|m| m.resulting_balance),
            }
        }))
    }

    async fn consume_code(
        &self,
        tenant: &Tenant,
        code: &RedemptionCode,
        expected_customer: Option<i64>,
    ) -> Result<ConsumeOutcome, LedgerError> {
        let book = self.book(tenant).await?;
        let mut book = book.lock().await;
        let Some(redemption) = book.redemption_by_code_mut(code) else {
            return Ok(ConsumeOutcome::Missing);
        };
        if redemption.used {
            return Ok(ConsumeOutcome::AlreadyUsed(redemption.clone()));
        }
        if expected_customer.is_some_and(|id| id != redemption.customer_id) {
            return Ok(ConsumeOutcome::OwnedByOther(redemption.clone()));
        }
        redemption.used = true;
        Ok(ConsumeOutcome::Consumed(redemption.clone()))
    }

    async fn customer_snapshot(
        &self,
        tenant: &Tenant,
        customer_id: i64,
    ) -> Result<Option<CustomerSnapshot>, LedgerError> {
        let book = self.book(tenant).await?;
        let book = book.lock().await;
        Ok(book.customers.get(&customer_id).cloned())
    }

    async fn list_movements(
        &self,
        tenant: &Tenant,
        customer_id: i64,
        filter: &MovementFilter,
    ) -> Result<MovementPage, LedgerError> {
        let book = self.book(tenant).await?;
        let book = book.lock().await;
        let mut matching: Vec<&Movement> = book
            .movements
            .iter()
            .filter(|m| m.customer_id == customer_id && filter.matches(m))
            .collect();
        matching.sort_by_key(|m| (m.created_at, m.id));
        if filter.order == SortOrder::Desc {
            matching.reverse();
        }
        let total = matching.len() as u64;
        let offset = usize::try_from(filter.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(filter.limit).unwrap_or(usize::MAX);
        let movements = matching
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok(MovementPage { movements, total })
    }

    async fn pending_codes(
        &self,
        tenant: &Tenant,
        customer_id: i64,
    ) -> Result<Vec<Redemption>, LedgerError> {
        let book = self.book(tenant).await?;
        let book = book.lock().await;
        let mut pending: Vec<Redemption> = book
            .redemptions
            .iter()
            .filter(|r| !r.used && r.customer_id == customer_id)
            .cloned()
            .collect();
        pending.sort_by_key(|r| std::cmp::Reverse((r.created_at, r.id)));
        Ok(pending)
    }

    async fn redemption_detail(
        &self,
        tenant: &Tenant,
        redemption_id: i64,
    ) -> Result<Option<RedemptionDetail>, LedgerError> {
        let book = self.book(tenant).await?;
        let book = book.lock().await;
        let Some(redemption) = book.redemptions.iter().find(|r| r.id == redemption_id) else {
            return Ok(None);
        };
        let customer = book
            .customers
            .get(&redemption.customer_id)
            .cloned()
            .ok_or_else(|| {
                LedgerError::Internal(format!(
                    "redemption {redemption_id} references missing customer"
                ))
            })?;
        Ok(Some(RedemptionDetail {
            redemption: redemption.clone(),
            customer,
            item: book.items.get(&redemption.reward_item_id).cloned(),
            movement: redemption
                .movement_id
                .and_then(|id| book.movement(id))
                .cloned(),
        }))
    }

    async fn provision(&self, tenant: &Tenant) -> Result<(), LedgerError> {
        let mut map = self.tenants.write().await;
        map.entry(tenant.clone()).or_default();
        Ok(())
    }

    async fn ping(&self) -> Result<(), LedgerError> {
        Ok(())
    }
}

#[async_trait]
impl RewardCatalog for InMemoryLedgerStore {
    async fn find_reward_item(
        &self,
        tenant: &Tenant,
        item_id: i64,
    ) -> Result<Option<RewardItem>, LedgerError> {
        let book = self.book(tenant).await?;
        let book = book.lock().await;
        Ok(book.items.get(&item_id).cloned())
    }

    async fn list_reward_items(&self, tenant: &Tenant) -> Result<Vec<RewardItem>, LedgerError> {
        let book = self.book(tenant).await?;
        let book = book.lock().await;
        let mut items: Vec<RewardItem> = book.items.values().cloned().collect();
        items.sort_by_key(|i| (i.cost.is_none(), i.cost, i.id));
        Ok(items)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::redemption_code::SequenceCodeGenerator;

    fn tenant() -> Tenant {
        let Ok(tenant) = Tenant::parse("casona") else {
            panic!("valid tenant");
        };
        tenant
    }

    fn item(cost: Option<i64>) -> RewardItem {
        RewardItem {
            id: 0,
            name: "Caneca".to_string(),
            cost,
            description: None,
            image: None,
            remote_fulfilment: false,
        }
    }

    async fn seeded() -> (InMemoryLedgerStore, i64) {
        let store = InMemoryLedgerStore::new();
        let Ok(()) = store.provision(&tenant()).await else {
            panic!("provision failed");
        };
        let Ok(id) = store
            .insert_customer(&tenant(), "Ana Souza", "ana@example.com", None)
            .await
        else {
            panic!("seed customer failed");
        };
        (store, id)
    }

    fn credit(customer_id: i64, points: i64) -> CreditEntry {
        CreditEntry {
            customer_id,
            points,
            origin: "LOJA".to_string(),
            store_id: Some(3),
            note: None,
            created_by: 1,
        }
    }

    #[tokio::test]
    async fn unknown_tenant_is_not_provisioned() {
        let store = InMemoryLedgerStore::new();
        let result = store.apply_credit(&tenant(), &credit(1, 10)).await;
        assert!(matches!(result, Err(LedgerError::TenantNotProvisioned(_))));
    }

    #[tokio::test]
    async fn provision_is_idempotent() {
        let (store, id) = seeded().await;
        let Ok(()) = store.provision(&tenant()).await else {
            panic!("second provision failed");
        };
        let snapshot = store.customer_snapshot(&tenant(), id).await;
        assert!(matches!(snapshot, Ok(Some(_))));
    }

    #[tokio::test]
    async fn credit_updates_balance_and_appends_movement() {
        let (store, id) = seeded().await;
        let Ok(outcome) = store.apply_credit(&tenant(), &credit(id, 250)).await else {
            panic!("credit failed");
        };
        assert_eq!(outcome.customer.balance, 250);
        assert_eq!(outcome.movement.resulting_balance, 250);
        assert_eq!(outcome.movement.kind, MovementKind::Credit);
        assert_eq!(outcome.movement.store_id, Some(3));
    }

    #[tokio::test]
    async fn exhausted_minting_writes_nothing() {
        let (store, id) = seeded().await;
        let Ok(item_id) = store.insert_reward_item(&tenant(), item(Some(100))).await else {
            panic!("seed item failed");
        };
        let Ok(code) = RedemptionCode::parse("AAAAA") else {
            panic!("valid code");
        };
        let Ok(_) = store.insert_redemption(&tenant(), id, item_id, code).await else {
            panic!("seed redemption failed");
        };
        let Ok(_) = store.apply_credit(&tenant(), &credit(id, 500)).await else {
            panic!("credit failed");
        };

        let Ok(generator) = SequenceCodeGenerator::new(["AAAAA"]) else {
            panic!("valid sequence");
        };
        let minter = CodeMinter::new(Arc::new(generator), 5);
        let debit = RedemptionDebit {
            customer_id: id,
            reward_item_id: item_id,
            cost: 100,
            note: None,
            created_by: 1,
        };
        let result = store.apply_redemption(&tenant(), &debit, &minter).await;
        assert!(matches!(
            result,
            Err(LedgerError::CodeSpaceExhausted { attempts: 5 })
        ));

        let Ok(Some(customer)) = store.customer_snapshot(&tenant(), id).await else {
            panic!("customer vanished");
        };
        assert_eq!(customer.balance, 500);
        let Ok(movements) = store.movements_of(&tenant(), id).await else {
            panic!("movements failed");
        };
        assert_eq!(movements.len(), 1);
        let Ok(codes) = store.redemptions(&tenant()).await else {
            panic!("redemptions failed");
        };
        assert_eq!(codes.len(), 1);
    }

    #[tokio::test]
    async fn catalog_is_ordered_by_cost_then_id() {
        let (store, _) = seeded().await;
        for cost in [Some(300), None, Some(100), Some(300)] {
            let Ok(_) = store.insert_reward_item(&tenant(), item(cost)).await else {
                panic!("seed item failed");
            };
        }
        let Ok(items) = store.list_reward_items(&tenant()).await else {
            panic!("list failed");
        };
        let order: Vec<(i64, Option<i64>)> = items.iter().map(|i| (i.id, i.cost)).collect();
        assert_eq!(
            order,
            vec![(3, Some(100)), (1, Some(300)), (4, Some(300)), (2, None)]
        );
    }

    #[tokio::test]
    async fn history_pages_newest_first() {
        let (store, id) = seeded().await;
        for points in [10, 20, 30] {
            let Ok(_) = store.apply_credit(&tenant(), &credit(id, points)).await else {
                panic!("credit failed");
            };
        }
        let filter = MovementFilter {
            limit: 2,
            ..MovementFilter::default()
        };
        let Ok(page) = store.list_movements(&tenant(), id, &filter).await else {
            panic!("history failed");
        };
        assert_eq!(page.total, 3);
        let points: Vec<i64> = page.movements.iter().map(|m| m.points).collect();
        assert_eq!(points, vec![30, 20]);

        let second = MovementFilter {
            page: 2,
            limit: 2,
            order: SortOrder::Asc,
            ..MovementFilter::default()
        };
        let Ok(page) = store.list_movements(&tenant(), id, &second).await else {
            panic!("history failed");
        };
        let points: Vec<i64> = page.movements.iter().map(|m| m.points).collect();
        assert_eq!(points, vec![30]);
    }
}
