//! REST API layer: route handlers, DTOs, extractors and router composition.
//!
//! Resource routes live under `/clientes/{tenant}`; system routes sit at
//! the root. With the `swagger-ui` feature the OpenAPI document is served
//! at `/api-docs/openapi.json` and browsable under `/docs`.

pub mod dto;
pub mod extract;
pub mod handlers;
pub mod openapi;

use axum::Router;

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    let router = Router::new()
        .merge(handlers::routes())
        .merge(handlers::system::routes());
    with_docs(router)
}

#[cfg(feature = "swagger-ui")]
fn with_docs(router: Router<AppState>) -> Router<AppState> {
    use utoipa::OpenApi;
    use utoipa_swagger_ui::SwaggerUi;

    router.merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
}

#[cfg(not(feature = "swagger-ui"))]
fn with_docs(router: Router<AppState>) -> Router<AppState> {
    router
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::domain::{EventBus, RewardItem, Tenant};
    use crate::persistence::{InMemoryLedgerStore, LedgerStore, RewardCatalog};
    use crate::service::LedgerService;

    struct TestApp {
        router: Router,
        store: Arc<InMemoryLedgerStore>,
        tenant: Tenant,
        customer: i64,
        item: i64,
        bus: EventBus,
    }

    async fn app() -> TestApp {
        let Ok(tenant) = Tenant::parse("casona") else {
            panic!("valid tenant");
        };
        let store = Arc::new(InMemoryLedgerStore::new());
        tokio_test::assert_ok!(store.provision(&tenant).await);
        let Ok(customer) = store
            .insert_customer(&tenant, "Ana Souza", "ana@example.com", None)
            .await
        else {
            panic!("seed customer failed");
        };
        let item = RewardItem {
            id: 0,
            name: "Mochila".to_string(),
            cost: Some(400),
            description: Some("Mochila azul".to_string()),
            image: Some("https://cdn.example.com/mochila.png".to_string()),
            remote_fulfilment: false,
        };
        let Ok(item) = store.insert_reward_item(&tenant, item).await else {
            panic!("seed item failed");
        };
        let bus = EventBus::new(64);
        let service = LedgerService::new(
            Arc::clone(&store) as Arc<dyn LedgerStore>,
            Arc::clone(&store) as Arc<dyn RewardCatalog>,
            bus.clone(),
        );
        let router = build_router().with_state(AppState::new(Arc::new(service)));
        TestApp {
            router,
            store,
            tenant,
            customer,
            item,
            bus,
        }
    }

    async fn call(
        app: &TestApp,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("x-user-id", "42");
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let Ok(request) = builder.body(body) else {
            panic!("request should build");
        };
        let Ok(response) = app.router.clone().oneshot(request).await else {
            panic!("router is infallible");
        };
        let status = response.status();
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body is in memory");
        };
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn credit(app: &TestApp, points: i64) -> (StatusCode, Value) {
        call(
            app,
            Method::POST,
            &format!("/clientes/casona/{}/creditar-pontos", app.customer),
            Some(json!({"tipo": "CREDITO", "pontos": points, "origem": "COMPRA"})),
        )
        .await
    }

    async fn debit(app: &TestApp) -> (StatusCode, Value) {
        call(
            app,
            Method::POST,
            &format!("/clientes/casona/{}/debitar-pontos", app.customer),
            Some(json!({"id_item_recompensa": app.item})),
        )
        .await
    }

    #[tokio::test]
    async fn credit_returns_created_with_balance() {
        let app = app().await;
        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/clientes/casona/{}/creditar-pontos", app.customer),
            Some(json!({"tipo": "CREDITO", "valor_reais": 2.5, "origem": "COMPRA"})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["saldo_atual"], 250);
        assert_eq!(body["movimentacao"]["pontos"], 250);
        assert_eq!(body["movimentacao"]["saldo_resultante"], 250);

        let Ok(movements) = app.store.movements_of(&app.tenant, app.customer).await else {
            panic!("movements readable");
        };
        assert_eq!(movements.len(), 1);
        assert!(movements.iter().all(|m| m.created_by == 42));
    }

    #[tokio::test]
    async fn malformed_requests_are_bad_requests() {
        let app = app().await;
        let (status, body) = call(
            &app,
            Method::POST,
            &format!("/clientes/casona/{}/creditar-pontos", app.customer),
            Some(json!({"pontos": 10})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
        assert_eq!(body["code"], 1001);

        let (status, _) = call(
            &app,
            Method::POST,
            "/clientes/casona/abc/creditar-pontos",
            Some(json!({"tipo": "CREDITO", "pontos": 10, "origem": "COMPRA"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            Method::POST,
            "/clientes/bad-tenant/1/creditar-pontos",
            Some(json!({"tipo": "CREDITO", "pontos": 10, "origem": "COMPRA"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_customer_and_tenant_are_not_found() {
        let app = app().await;
        let (status, _) = call(
            &app,
            Method::POST,
            "/clientes/casona/999/creditar-pontos",
            Some(json!({"tipo": "CREDITO", "pontos": 10, "origem": "COMPRA"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = call(
            &app,
            Method::POST,
            "/clientes/outra_loja/1/creditar-pontos",
            Some(json!({"tipo": "CREDITO", "pontos": 10, "origem": "COMPRA"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn debit_without_balance_conflicts() {
        let app = app().await;
        credit(&app, 300).await;
        let (status, body) = debit(&app).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["code"], 2101);
    }

    #[tokio::test]
    async fn redeem_lookup_consume_flow() {
        let app = app().await;
        let mut events = app.bus.subscribe();
        credit(&app, 500).await;

        let (status, body) = debit(&app).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["saldo_atual"], 100);
        assert_eq!(body["resgate_utilizado"], false);
        let Some(code) = body["codigo_resgate"].as_str().map(str::to_string) else {
            panic!("code expected");
        };
        assert_eq!(code.len(), 5);

        let (status, body) = call(
            &app,
            Method::GET,
            &format!("/clientes/casona/codigos-resgate/{}", code.to_lowercase()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["codigo_resgate"], code.as_str());
        assert_eq!(body["cliente_nome"], "Ana Souza");
        assert_eq!(body["cliente_saldo"], 100);
        assert_eq!(body["item_nome"], "Mochila");

        let pending_uri = format!(
            "/clientes/casona/{}/codigos-resgate/item/{}",
            app.customer, app.item
        );
        let (status, body) = call(&app, Method::GET, &pending_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pontos"], 400);
        assert_eq!(body["saldo_resultante"], 100);

        let (status, _) = call(
            &app,
            Method::PUT,
            &format!("/clientes/casona/{}/pontos/{code}", app.customer + 1),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let consume_uri = format!("/clientes/casona/{}/pontos/{code}", app.customer);
        let (status, body) = call(&app, Method::PUT, &consume_uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["resgate_utilizado"], true);

        let (status, _) = call(&app, Method::PUT, &consume_uri, None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        let (status, _) = call(&app, Method::GET, &pending_uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let mut kinds = Vec::new();
        while let Ok(event) = events.try_recv() {
            kinds.push(event.event_type_str());
        }
        assert_eq!(kinds, vec!["points_credited", "reward_redeemed", "code_consumed"]);
    }

    #[tokio::test]
    async fn consume_with_zero_customer_skips_owner_check() {
        let app = app().await;
        credit(&app, 400).await;
        let (_, body) = debit(&app).await;
        let Some(code) = body["codigo_resgate"].as_str() else {
            panic!("code expected");
        };
        let (status, body) = call(
            &app,
            Method::PUT,
            &format!("/clientes/casona/0/pontos/{code}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id_cliente"], app.customer);

        let (status, _) = call(&app, Method::PUT, "/clientes/casona/0/pontos/AB!", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn history_pages_and_validates() {
        let app = app().await;
        for points in [10, 20, 30] {
            credit(&app, points).await;
        }
        let base = format!("/clientes/casona/{}/movimentacoes", app.customer);

        let (status, body) = call(&app, Method::GET, &format!("{base}?limit=2"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["pagination"]["total"], 3);
        assert_eq!(body["pagination"]["total_pages"], 2);
        assert_eq!(body["data"][0]["saldo_resultante"], 60);
        assert_eq!(body["data"][0]["tipo"], "CREDITO");

        let (_, body) = call(&app, Method::GET, &format!("{base}?order=asc&page=2&limit=2"), None)
            .await;
        assert_eq!(body["data"][0]["pontos"], 30);

        let (_, body) = call(&app, Method::GET, &format!("{base}?tipo=DEBITO"), None).await;
        assert_eq!(body["pagination"]["total"], 0);

        for bad in ["?limit=0", "?limit=101", "?page=0", "?page=x", "?tipo=X", "?dt_ini=ontem"] {
            let (status, _) = call(&app, Method::GET, &format!("{base}{bad}"), None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "query {bad}");
        }
    }

    #[tokio::test]
    async fn summary_and_detail_reflect_redemptions() {
        let app = app().await;
        credit(&app, 500).await;
        let (_, redeemed) = debit(&app).await;

        let (status, body) = call(
            &app,
            Method::GET,
            &format!("/clientes/casona/{}/pontos-recompensas", app.customer),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["quantidade_pontos"], 100);
        assert_eq!(body["codigo_cliente"], format!("CLI-{}", app.customer));
        assert_eq!(body["recompensas"][0]["tipo"], "ITEM_RECOMPENSA");
        assert_eq!(
            body["recompensas"][0]["codigo_resgate_pendente"],
            redeemed["codigo_resgate"]
        );

        let Ok(redemptions) = app.store.redemptions(&app.tenant).await else {
            panic!("redemptions readable");
        };
        let Some(redemption) = redemptions.first() else {
            panic!("one redemption expected");
        };
        let (status, body) = call(
            &app,
            Method::GET,
            &format!("/clientes/casona/resgates/{}", redemption.id),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "pendente");
        assert_eq!(body["dt_utilizado"], Value::Null);
        assert_eq!(body["cliente"]["nome"], "Ana Souza");
        assert_eq!(body["item"]["quantidade_pontos"], 400);
        assert_eq!(body["movimentacao"]["pontos"], 400);

        let (status, _) = call(&app, Method::GET, "/clientes/casona/resgates/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn provision_and_health() {
        let app = app().await;
        let (status, _) = call(&app, Method::POST, "/tenants/nova_loja/provision", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = call(&app, Method::POST, "/tenants/Nova-Loja/provision", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = call(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }
}
