//! Per-tenant schema DDL.
//!
//! Each tenant owns a PostgreSQL schema with four tables. The statements are
//! idempotent and run in one transaction from
//! [`super::LedgerStore::provision`]; request paths never create tables.

use crate::domain::Tenant;

/// Customer balances.
pub const CUSTOMERS_TABLE: &str = "clientes";
/// Reward catalog.
pub const REWARD_ITEMS_TABLE: &str = "itens_recompensa";
/// Append-only movement log.
pub const MOVEMENTS_TABLE: &str = "cliente_pontos_movimentacao";
/// Redemption code registry.
pub const REDEMPTIONS_TABLE: &str = "clientes_itens_recompensa";

/// Returns the ordered DDL statements that bring `tenant`'s schema up.
#[must_use]
pub fn tenant_ddl(tenant: &Tenant) -> Vec<String> {
    let schema = tenant.as_str();
    let customers = tenant.qualified(CUSTOMERS_TABLE);
    let items = tenant.qualified(REWARD_ITEMS_TABLE);
    let movements = tenant.qualified(MOVEMENTS_TABLE);
    let redemptions = tenant.qualified(REDEMPTIONS_TABLE);

    vec![
        format!("CREATE SCHEMA IF NOT EXISTS \"{schema}\""),
        format!(
            "CREATE TABLE IF NOT EXISTS {customers} (\
                id_cliente BIGSERIAL PRIMARY KEY, \
                nome_completo VARCHAR(255) NOT NULL, \
                email VARCHAR(255) NOT NULL, \
                whatsapp VARCHAR(32), \
                saldo BIGINT NOT NULL DEFAULT 0 CHECK (saldo >= 0), \
                dt_cadastro TIMESTAMPTZ NOT NULL DEFAULT NOW())"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {items} (\
                id_item_recompensa BIGSERIAL PRIMARY KEY, \
                nome_item VARCHAR(255) NOT NULL, \
                qtd_pontos BIGINT, \
                descricao TEXT, \
                imagem_item TEXT, \
                nao_retirar_loja BOOLEAN NOT NULL DEFAULT false)"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {movements} (\
                id_movimentacao BIGSERIAL PRIMARY KEY, \
                id_cliente BIGINT NOT NULL REFERENCES {customers}(id_cliente), \
                tipo VARCHAR(10) NOT NULL CHECK (tipo IN ('CREDITO', 'DEBITO')), \
                pontos BIGINT NOT NULL CHECK (pontos > 0), \
                saldo_resultante BIGINT NOT NULL, \
                origem VARCHAR(100) NOT NULL, \
                id_loja BIGINT, \
                id_item_recompensa BIGINT, \
                observacao TEXT, \
                usu_cadastro BIGINT NOT NULL, \
                dt_cadastro TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp())"
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_movimentacao_cliente \
             ON {movements}(id_cliente, dt_cadastro)"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS {redemptions} (\
                id_cliente_item_recompensa BIGSERIAL PRIMARY KEY, \
                id_cliente BIGINT NOT NULL REFERENCES {customers}(id_cliente), \
                id_item_recompensa BIGINT NOT NULL REFERENCES {items}(id_item_recompensa), \
                id_movimentacao BIGINT REFERENCES {movements}(id_movimentacao), \
                codigo_resgate VARCHAR(5) NOT NULL, \
                schema VARCHAR(63) NOT NULL, \
                resgate_utilizado BOOLEAN NOT NULL DEFAULT false, \
                usu_cadastro BIGINT NOT NULL, \
                dt_cadastro TIMESTAMPTZ NOT NULL DEFAULT clock_timestamp(), \
                CONSTRAINT uk_codigo_resgate UNIQUE (codigo_resgate))"
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_resgate_cliente \
             ON {redemptions}(id_cliente)"
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_resgate_item \
             ON {redemptions}(id_item_recompensa)"
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_resgate_cliente_item \
             ON {redemptions}(id_cliente, id_item_recompensa)"
        ),
        format!(
            "CREATE INDEX IF NOT EXISTS idx_resgate_pendente \
             ON {redemptions}(id_cliente, id_item_recompensa) WHERE resgate_utilizado = false"
        ),
    ]
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn every_statement_is_idempotent_and_scoped() {
        let Ok(tenant) = Tenant::parse("casona") else {
            panic!("valid tenant");
        };
        let ddl = tenant_ddl(&tenant);
        assert!(!ddl.is_empty());
        for stmt in &ddl {
            assert!(stmt.contains("IF NOT EXISTS"), "not idempotent: {stmt}");
            assert!(stmt.contains("casona"), "not tenant scoped: {stmt}");
        }
        assert!(ddl.iter().any(|s| s.contains("UNIQUE (codigo_resgate)")));
        assert!(ddl.iter().any(|s| s.contains("CHECK (saldo >= 0)")));
    }

    #[test]
    fn index_names_survive_the_longest_tenant() {
        let Ok(tenant) = Tenant::parse(&format!("t{}", "a".repeat(62))) else {
            panic!("63-char tenant is valid");
        };
        let ddl = tenant_ddl(&tenant);
        let names: Vec<&str> = ddl
            .iter()
            .filter_map(|stmt| stmt.strip_prefix("CREATE INDEX IF NOT EXISTS "))
            .filter_map(|rest| rest.split_whitespace().next())
            .collect();
        assert_eq!(names.len(), 5);
        for name in &names {
            assert!(name.len() <= 63, "identifier truncated: {name}");
            assert!(!name.contains(tenant.as_str()));
        }
        let mut unique = names.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), names.len());
        assert!(ddl.iter().any(|s| s.contains("CONSTRAINT uk_codigo_resgate UNIQUE")));
    }

    #[test]
    fn movement_and_code_rows_use_statement_clock() {
        let Ok(tenant) = Tenant::parse("casona") else {
            panic!("valid tenant");
        };
        let ddl = tenant_ddl(&tenant);
        let stamped = ddl
            .iter()
            .filter(|s| s.contains("DEFAULT clock_timestamp()"))
            .count();
        assert_eq!(stamped, 2);
    }

    #[test]
    fn schema_is_created_first() {
        let Ok(tenant) = Tenant::parse("loja_7") else {
            panic!("valid tenant");
        };
        let ddl = tenant_ddl(&tenant);
        assert_eq!(
            ddl.first().map(String::as_str),
            Some("CREATE SCHEMA IF NOT EXISTS \"loja_7\"")
        );
    }
}
