//! PostgreSQL implementation of the ledger store and reward catalog.
//!
//! Every tenant lives in its own schema, so table references are built
//! from a validated [`Tenant`] at query time. Values are always bound.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use super::models::{
    CreditEntry, CreditOutcome, MovementFilter, MovementPage, RedemptionDebit, RedemptionOutcome,
};
use super::provisioning::{
    CUSTOMERS_TABLE, MOVEMENTS_TABLE, REDEMPTIONS_TABLE, REWARD_ITEMS_TABLE, tenant_ddl,
};
use super::{LedgerStore, RewardCatalog};
use crate::domain::movement::REDEMPTION_ORIGIN;
use crate::domain::{
    CodeLookup, CodeMinter, ConsumeOutcome, CustomerSnapshot, Movement, MovementKind,
    PendingCode, Redemption, RedemptionCode, RedemptionDetail, RewardItem, Tenant,
};
use crate::error::LedgerError;

const CUSTOMER_COLUMNS: &str = "id_cliente, nome_completo, email, whatsapp, saldo";

const ITEM_COLUMNS: &str =
    "id_item_recompensa, nome_item, qtd_pontos, descricao, imagem_item, nao_retirar_loja";

const MOVEMENT_COLUMNS: &str = "id_movimentacao, id_cliente, tipo, pontos, saldo_resultante, \
     origem, id_loja, id_item_recompensa, observacao, usu_cadastro, dt_cadastro";

// Always used with the registry table aliased as `cir`.
const REDEMPTION_COLUMNS: &str = "cir.id_cliente_item_recompensa, cir.id_cliente, \
     cir.id_item_recompensa, cir.id_movimentacao, cir.codigo_resgate, cir.schema, \
     cir.resgate_utilizado, cir.usu_cadastro, cir.dt_cadastro";

/// PostgreSQL error codes meaning the tenant schema or its tables are absent.
const UNDEFINED_TABLE: &str = "42P01";
const INVALID_SCHEMA_NAME: &str = "3F000";

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id_cliente: i64,
    nome_completo: String,
    email: String,
    whatsapp: Option<String>,
    saldo: i64,
}

impl From<CustomerRow> for CustomerSnapshot {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id_cliente,
            full_name: row.nome_completo,
            email: row.email,
            whatsapp: row.whatsapp,
            balance: row.saldo,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    id_item_recompensa: i64,
    nome_item: String,
    qtd_pontos: Option<i64>,
    descricao: Option<String>,
    imagem_item: Option<String>,
    nao_retirar_loja: bool,
}

impl From<ItemRow> for RewardItem {
    fn from(row: ItemRow) -> Self {
        Self {
            id: row.id_item_recompensa,
            name: row.nome_item,
            cost: row.qtd_pontos,
            description: row.descricao,
            image: row.imagem_item,
            remote_fulfilment: row.nao_retirar_loja,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct MovementRow {
    id_movimentacao: i64,
    id_cliente: i64,
    tipo: String,
    pontos: i64,
    saldo_resultante: i64,
    origem: String,
    id_loja: Option<i64>,
    id_item_recompensa: Option<i64>,
    observacao: Option<String>,
    usu_cadastro: i64,
    dt_cadastro: DateTime<Utc>,
}

impl TryFrom<MovementRow> for Movement {
    type Error = LedgerError;

    fn try_from(row: MovementRow) -> Result<Self, Self::Error> {
        let kind = row.tipo.parse::<MovementKind>().map_err(|_| {
            LedgerError::Internal(format!("stored movement has unknown type {}", row.tipo))
        })?;
        Ok(Self {
            id: row.id_movimentacao,
            customer_id: row.id_cliente,
            kind,
            points: row.pontos,
            resulting_balance: row.saldo_resultante,
            origin: row.origem,
            store_id: row.id_loja,
            reward_item_id: row.id_item_recompensa,
            note: row.observacao,
            created_by: row.usu_cadastro,
            created_at: row.dt_cadastro,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RedemptionRow {
    id_cliente_item_recompensa: i64,
    id_cliente: i64,
    id_item_recompensa: i64,
    id_movimentacao: Option<i64>,
    codigo_resgate: String,
    #[sqlx(rename = "schema")]
    tenant: String,
    resgate_utilizado: bool,
    usu_cadastro: i64,
    dt_cadastro: DateTime<Utc>,
}

impl TryFrom<RedemptionRow> for Redemption {
    type Error = LedgerError;

    fn try_from(row: RedemptionRow) -> Result<Self, Self::Error> {
        let code = RedemptionCode::parse(&row.codigo_resgate).map_err(|_| {
            LedgerError::Internal(format!(
                "stored redemption {} has malformed code",
                row.id_cliente_item_recompensa
            ))
        })?;
        Ok(Self {
            id: row.id_cliente_item_recompensa,
            customer_id: row.id_cliente,
            reward_item_id: row.id_item_recompensa,
            movement_id: row.id_movimentacao,
            code,
            tenant: row.tenant,
            used: row.resgate_utilizado,
            created_by: row.usu_cadastro,
            created_at: row.dt_cadastro,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CodeLookupRow {
    #[sqlx(flatten)]
    redemption: RedemptionRow,
    nome_completo: String,
    saldo: i64,
    nome_item: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct PendingCodeRow {
    #[sqlx(flatten)]
    redemption: RedemptionRow,
    saldo: i64,
    pontos: Option<i64>,
    saldo_resultante: Option<i64>,
}

/// Maps driver errors, turning "schema or table missing" into
/// [`LedgerError::TenantNotProvisioned`].
trait TenantScoped<T> {
    fn scoped(self, tenant: &Tenant) -> Result<T, LedgerError>;
}

impl<T> TenantScoped<T> for Result<T, sqlx::Error> {
    fn scoped(self, tenant: &Tenant) -> Result<T, LedgerError> {
        self.map_err(|err| {
            if let sqlx::Error::Database(db) = &err
                && matches!(
                    db.code().as_deref(),
                    Some(UNDEFINED_TABLE | INVALID_SCHEMA_NAME)
                )
            {
                return LedgerError::TenantNotProvisioned(tenant.to_string());
            }
            LedgerError::Persistence(err)
        })
    }
}

struct NewMovement<'a> {
    customer_id: i64,
    kind: MovementKind,
    points: i64,
    resulting_balance: i64,
    origin: &'a str,
    store_id: Option<i64>,
    reward_item_id: Option<i64>,
    note: Option<&'a str>,
    created_by: i64,
}

/// Stamps `dt_cadastro` with `clock_timestamp()`, read after the balance row
/// lock is held, so creation order follows balance order.
async fn insert_movement(
    conn: &mut PgConnection,
    tenant: &Tenant,
    movement: NewMovement<'_>,
) -> Result<Movement, LedgerError> {
    let sql = format!(
        "INSERT INTO {} (id_cliente, tipo, pontos, saldo_resultante, origem, id_loja, \
         id_item_recompensa, observacao, usu_cadastro, dt_cadastro) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, clock_timestamp()) \
         RETURNING {MOVEMENT_COLUMNS}",
        tenant.qualified(MOVEMENTS_TABLE)
    );
    let row: MovementRow = sqlx::query_as(&sql)
        .bind(movement.customer_id)
        .bind(movement.kind.as_str())
        .bind(movement.points)
        .bind(movement.resulting_balance)
        .bind(movement.origin)
        .bind(movement.store_id)
        .bind(movement.reward_item_id)
        .bind(movement.note)
        .bind(movement.created_by)
        .fetch_one(conn)
        .await
        .scoped(tenant)?;
    Movement::try_from(row)
}

fn push_movement_filters(qb: &mut QueryBuilder<'_, Postgres>, filter: &MovementFilter) {
    if let Some(kind) = filter.kind {
        qb.push(" AND tipo = ").push_bind(kind.as_str());
    }
    if let Some(origin) = &filter.origin {
        qb.push(" AND origem = ").push_bind(origin.clone());
    }
    if let Some(from) = filter.from {
        qb.push(" AND dt_cadastro >= ").push_bind(from);
    }
    if let Some(to) = filter.to {
        qb.push(" AND dt_cadastro <= ").push_bind(to);
    }
}

/// PostgreSQL-backed ledger store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: PgPool,
}

impl PostgresLedgerStore {
    /// Creates a new store over the given connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_customer(
        conn: &mut PgConnection,
        tenant: &Tenant,
        customer_id: i64,
    ) -> Result<Option<CustomerRow>, LedgerError> {
        let sql = format!(
            "SELECT {CUSTOMER_COLUMNS} FROM {} WHERE id_cliente = $1",
            tenant.qualified(CUSTOMERS_TABLE)
        );
        sqlx::query_as(&sql)
            .bind(customer_id)
            .fetch_optional(conn)
            .await
            .scoped(tenant)
    }

    async fn fetch_item(
        conn: &mut PgConnection,
        tenant: &Tenant,
        item_id: i64,
    ) -> Result<Option<ItemRow>, LedgerError> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM {} WHERE id_item_recompensa = $1",
            tenant.qualified(REWARD_ITEMS_TABLE)
        );
        sqlx::query_as(&sql)
            .bind(item_id)
            .fetch_optional(conn)
            .await
            .scoped(tenant)
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    async fn apply_credit(
        &self,
        tenant: &Tenant,
        entry: &CreditEntry,
    ) -> Result<CreditOutcome, LedgerError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE {} SET saldo = saldo + $1 WHERE id_cliente = $2 RETURNING {CUSTOMER_COLUMNS}",
            tenant.qualified(CUSTOMERS_TABLE)
        );
        let customer: Option<CustomerRow> = sqlx::query_as(&sql)
            .bind(entry.points)
            .bind(entry.customer_id)
            .fetch_optional(&mut *tx)
            .await
            .scoped(tenant)?;
        let Some(customer) = customer else {
            return Err(LedgerError::CustomerNotFound(entry.customer_id));
        };

        let movement = insert_movement(
            &mut tx,
            tenant,
            NewMovement {
                customer_id: entry.customer_id,
                kind: MovementKind::Credit,
                points: entry.points,
                resulting_balance: customer.saldo,
                origin: &entry.origin,
                store_id: entry.store_id,
                reward_item_id: None,
                note: entry.note.as_deref(),
                created_by: entry.created_by,
            },
        )
        .await?;

        tx.commit().await?;

        Ok(CreditOutcome {
            movement,
            customer: customer.into(),
        })
    }

    async fn apply_redemption(
        &self,
        tenant: &Tenant,
        debit: &RedemptionDebit,
        minter: &CodeMinter,
    ) -> Result<RedemptionOutcome, LedgerError> {
        let mut tx = self.pool.begin().await?;
        let customers = tenant.qualified(CUSTOMERS_TABLE);

        let lock_sql =
            format!("SELECT {CUSTOMER_COLUMNS} FROM {customers} WHERE id_cliente = $1 FOR UPDATE");
        let locked: Option<CustomerRow> = sqlx::query_as(&lock_sql)
            .bind(debit.customer_id)
            .fetch_optional(&mut *tx)
            .await
            .scoped(tenant)?;
        let Some(locked) = locked else {
            return Err(LedgerError::CustomerNotFound(debit.customer_id));
        };
        if locked.saldo < debit.cost {
            return Err(LedgerError::InsufficientBalance {
                balance: locked.saldo,
                required: debit.cost,
            });
        }

        let update_sql = format!(
            "UPDATE {customers} SET saldo = saldo - $1 WHERE id_cliente = $2 \
             RETURNING {CUSTOMER_COLUMNS}"
        );
        let customer: CustomerRow = sqlx::query_as(&update_sql)
            .bind(debit.cost)
            .bind(debit.customer_id)
            .fetch_one(&mut *tx)
            .await
            .scoped(tenant)?;

        let movement = insert_movement(
            &mut tx,
            tenant,
            NewMovement {
                customer_id: debit.customer_id,
                kind: MovementKind::Debit,
                points: debit.cost,
                resulting_balance: customer.saldo,
                origin: REDEMPTION_ORIGIN,
                store_id: None,
                reward_item_id: Some(debit.reward_item_id),
                note: debit.note.as_deref(),
                created_by: debit.created_by,
            },
        )
        .await?;

        let mint_sql = format!(
            "INSERT INTO {} AS cir (id_cliente, id_item_recompensa, id_movimentacao, \
             codigo_resgate, schema, resgate_utilizado, usu_cadastro, dt_cadastro) \
             VALUES ($1, $2, $3, $4, $5, false, $6, clock_timestamp()) \
             ON CONFLICT (codigo_resgate) DO NOTHING RETURNING {REDEMPTION_COLUMNS}",
            tenant.qualified(REDEMPTIONS_TABLE)
        );
        let mut minted: Option<RedemptionRow> = None;
        for (attempt, candidate) in minter.candidates().enumerate() {
            let row: Option<RedemptionRow> = sqlx::query_as(&mint_sql)
                .bind(debit.customer_id)
                .bind(debit.reward_item_id)
                .bind(movement.id)
                .bind(candidate.as_str())
                .bind(tenant.as_str())
                .bind(debit.created_by)
                .fetch_optional(&mut *tx)
                .await
                .scoped(tenant)?;
            if row.is_some() {
                minted = row;
                break;
            }
            tracing::debug!(%tenant, attempt, code = %candidate, "redemption code collision");
        }
        let Some(minted) = minted else {
            tracing::error!(
                %tenant,
                customer_id = debit.customer_id,
                attempts = minter.max_attempts(),
                "redemption code space exhausted, rolling back"
            );
            return Err(minter.exhausted());
        };
        let redemption = Redemption::try_from(minted)?;

        tx.commit().await?;

        Ok(RedemptionOutcome {
            movement,
            redemption,
            customer: customer.into(),
        })
    }

    async fn find_code(
        &self,
        tenant: &Tenant,
        code: &RedemptionCode,
    ) -> Result<Option<CodeLookup>, LedgerError> {
        let sql = format!(
            "SELECT {REDEMPTION_COLUMNS}, c.nome_completo, c.saldo, i.nome_item \
             FROM {} cir \
             JOIN {} c ON c.id_cliente = cir.id_cliente \
             LEFT JOIN {} i ON i.id_item_recompensa = cir.id_item_recompensa \
             WHERE cir.codigo_resgate = $1",
            tenant.qualified(REDEMPTIONS_TABLE),
            tenant.qualified(CUSTOMERS_TABLE),
            tenant.qualified(REWARD_ITEMS_TABLE),
        );
        let row: Option<CodeLookupRow> = sqlx::query_as(&sql)
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await
            .scoped(tenant)?;
        row.map(|row| {
            Ok(CodeLookup {
                redemption: Redemption::try_from(row.redemption)?,
                customer_name: row.nome_completo,
                customer_balance: row.saldo,
                item_name: row.nome_item,
            })
        })
        .transpose()
    }

    async fn find_unused_code(
        &self,
        tenant: &Tenant,
        customer_id: i64,
        reward_item_id: i64,
    ) -> Result<Option<PendingCode>, LedgerError> {
        let sql = format!(
            "SELECT {REDEMPTION_COLUMNS}, c.saldo, m.pontos, m.saldo_resultante \
             FROM {} cir \
             JOIN {} c ON c.id_cliente = cir.id_cliente \
             LEFT JOIN {} m ON m.id_movimentacao = cir.id_movimentacao \
             WHERE cir.id_cliente = $1 AND cir.id_item_recompensa = $2 \
               AND cir.resgate_utilizado = false \
             ORDER BY cir.dt_cadastro DESC, cir.id_cliente_item_recompensa DESC \
             LIMIT 1",
            tenant.qualified(REDEMPTIONS_TABLE),
            tenant.qualified(CUSTOMERS_TABLE),
            tenant.qualified(MOVEMENTS_TABLE),
        );
        let row: Option<PendingCodeRow> = sqlx::query_as(&sql)
            .bind(customer_id)
            .bind(reward_item_id)
            .fetch_optional(&self.pool)
            .await
            .scoped(tenant)?;
        row.map(|row| {
            Ok(PendingCode {
                redemption: Redemption::try_from(row.redemption)?,
                current_balance: row.saldo,
                movement_points: row.pontos,
                movement_resulting_balance: row.saldo_resultante,
            })
        })
        .transpose()
    }

    async fn consume_code(
        &self,
        tenant: &Tenant,
        code: &RedemptionCode,
        expected_customer: Option<i64>,
    ) -> Result<ConsumeOutcome, LedgerError> {
        let table = tenant.qualified(REDEMPTIONS_TABLE);
        let update_sql = format!(
            "UPDATE {table} AS cir SET resgate_utilizado = true \
             WHERE cir.codigo_resgate = $1 AND cir.resgate_utilizado = false \
               AND ($2::BIGINT IS NULL OR cir.id_cliente = $2) \
             RETURNING {REDEMPTION_COLUMNS}"
        );
        let updated: Option<RedemptionRow> = sqlx::query_as(&update_sql)
            .bind(code.as_str())
            .bind(expected_customer)
            .fetch_optional(&self.pool)
            .await
            .scoped(tenant)?;
        if let Some(row) = updated {
            return Ok(ConsumeOutcome::Consumed(Redemption::try_from(row)?));
        }

        let select_sql =
            format!("SELECT {REDEMPTION_COLUMNS} FROM {table} cir WHERE cir.codigo_resgate = $1");
        let existing: Option<RedemptionRow> = sqlx::query_as(&select_sql)
            .bind(code.as_str())
            .fetch_optional(&self.pool)
            .await
            .scoped(tenant)?;
        let Some(existing) = existing else {
            return Ok(ConsumeOutcome::Missing);
        };
        let existing = Redemption::try_from(existing)?;
        if !existing.used && expected_customer.is_some_and(|id| id != existing.customer_id) {
            Ok(ConsumeOutcome::OwnedByOther(existing))
        } else {
            Ok(ConsumeOutcome::AlreadyUsed(existing))
        }
    }

    async fn customer_snapshot(
        &self,
        tenant: &Tenant,
        customer_id: i64,
    ) -> Result<Option<CustomerSnapshot>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let row = Self::fetch_customer(&mut conn, tenant, customer_id).await?;
        Ok(row.map(CustomerSnapshot::from))
    }

    async fn list_movements(
        &self,
        tenant: &Tenant,
        customer_id: i64,
        filter: &MovementFilter,
    ) -> Result<MovementPage, LedgerError> {
        let table = tenant.qualified(MOVEMENTS_TABLE);

        let mut count_qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new(format!("SELECT COUNT(*) FROM {table} WHERE id_cliente = "));
        count_qb.push_bind(customer_id);
        push_movement_filters(&mut count_qb, filter);
        let total: i64 = count_qb
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .scoped(tenant)?;

        let mut page_qb: QueryBuilder<'_, Postgres> = QueryBuilder::new(format!(
            "SELECT {MOVEMENT_COLUMNS} FROM {table} WHERE id_cliente = "
        ));
        page_qb.push_bind(customer_id);
        push_movement_filters(&mut page_qb, filter);
        let order = filter.order.as_sql();
        page_qb.push(format!(
            " ORDER BY dt_cadastro {order}, id_movimentacao {order} LIMIT "
        ));
        page_qb.push_bind(i64::from(filter.limit));
        page_qb.push(" OFFSET ");
        page_qb.push_bind(i64::try_from(filter.offset()).unwrap_or(i64::MAX));
        let rows: Vec<MovementRow> = page_qb
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .scoped(tenant)?;

        let movements = rows
            .into_iter()
            .map(Movement::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(MovementPage {
            movements,
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    async fn pending_codes(
        &self,
        tenant: &Tenant,
        customer_id: i64,
    ) -> Result<Vec<Redemption>, LedgerError> {
        let sql = format!(
            "SELECT {REDEMPTION_COLUMNS} FROM {} cir \
             WHERE cir.id_cliente = $1 AND cir.resgate_utilizado = false \
             ORDER BY cir.dt_cadastro DESC, cir.id_cliente_item_recompensa DESC",
            tenant.qualified(REDEMPTIONS_TABLE)
        );
        let rows: Vec<RedemptionRow> = sqlx::query_as(&sql)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await
            .scoped(tenant)?;
        rows.into_iter().map(Redemption::try_from).collect()
    }

    async fn redemption_detail(
        &self,
        tenant: &Tenant,
        redemption_id: i64,
    ) -> Result<Option<RedemptionDetail>, LedgerError> {
        let mut conn = self.pool.acquire().await?;

        let sql = format!(
            "SELECT {REDEMPTION_COLUMNS} FROM {} cir WHERE cir.id_cliente_item_recompensa = $1",
            tenant.qualified(REDEMPTIONS_TABLE)
        );
        let row: Option<RedemptionRow> = sqlx::query_as(&sql)
            .bind(redemption_id)
            .fetch_optional(&mut *conn)
            .await
            .scoped(tenant)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let redemption = Redemption::try_from(row)?;

        let Some(customer) = Self::fetch_customer(&mut conn, tenant, redemption.customer_id).await?
        else {
            return Err(LedgerError::Internal(format!(
                "redemption {redemption_id} references missing customer {}",
                redemption.customer_id
            )));
        };
        let item = Self::fetch_item(&mut conn, tenant, redemption.reward_item_id).await?;

        let movement = match redemption.movement_id {
            Some(movement_id) => {
                let sql = format!(
                    "SELECT {MOVEMENT_COLUMNS} FROM {} WHERE id_movimentacao = $1",
                    tenant.qualified(MOVEMENTS_TABLE)
                );
                let row: Option<MovementRow> = sqlx::query_as(&sql)
                    .bind(movement_id)
                    .fetch_optional(&mut *conn)
                    .await
                    .scoped(tenant)?;
                row.map(Movement::try_from).transpose()?
            }
            None => None,
        };

        Ok(Some(RedemptionDetail {
            redemption,
            customer: customer.into(),
            item: item.map(RewardItem::from),
            movement,
        }))
    }

    async fn provision(&self, tenant: &Tenant) -> Result<(), LedgerError> {
        let mut tx = self.pool.begin().await?;
        for statement in tenant_ddl(tenant) {
            sqlx::query(&statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        tracing::info!(%tenant, "tenant schema provisioned");
        Ok(())
    }

    async fn ping(&self) -> Result<(), LedgerError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl RewardCatalog for PostgresLedgerStore {
    async fn find_reward_item(
        &self,
        tenant: &Tenant,
        item_id: i64,
    ) -> Result<Option<RewardItem>, LedgerError> {
        let mut conn = self.pool.acquire().await?;
        let row = Self::fetch_item(&mut conn, tenant, item_id).await?;
        Ok(row.map(RewardItem::from))
    }

    async fn list_reward_items(&self, tenant: &Tenant) -> Result<Vec<RewardItem>, LedgerError> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM {} \
             ORDER BY qtd_pontos ASC NULLS LAST, id_item_recompensa ASC",
            tenant.qualified(REWARD_ITEMS_TABLE)
        );
        let rows: Vec<ItemRow> = sqlx::query_as(&sql)
            .fetch_all(&self.pool)
            .await
            .scoped(tenant)?;
        Ok(rows.into_iter().map(RewardItem::from).collect())
    }
}
