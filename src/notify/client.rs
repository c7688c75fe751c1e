//! HTTP client for the communications service.

use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use reqwest::Client;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::Tenant;

/// Header carrying the event id so the receiver can drop duplicates.
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Errors raised while delivering a notification.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// Transport failure (connect, timeout, TLS, body).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered 429 or 5xx.
    #[error("communications service unavailable: {0}")]
    Unavailable(String),

    /// The service rejected the request (4xx other than 429).
    #[error("communications service rejected notification: {0}")]
    Rejected(String),

    /// The client is misconfigured.
    #[error("invalid notifier configuration: {0}")]
    Config(String),
}

impl NotifyError {
    /// Whether another attempt may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(err) => err.is_timeout() || err.is_connect(),
            Self::Unavailable(_) => true,
            Self::Rejected(_) | Self::Config(_) => false,
        }
    }
}

/// Which template the communications service should send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NotificationKind {
    /// Points were credited.
    #[serde(rename = "atualizacao_pontos")]
    PointsUpdate,
    /// Reward redeemed for in-store pickup.
    #[serde(rename = "resgate")]
    Redemption,
    /// Reward redeemed for remote fulfilment; routed to franchise staff.
    #[serde(rename = "resgate_nao_retirar_loja")]
    RemoteRedemption,
}

/// Customer block of a notification. Absent fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NotifiedCustomer {
    /// Customer id.
    #[serde(rename = "id_cliente")]
    pub id: i64,
    /// Full name.
    #[serde(rename = "nome_completo")]
    pub full_name: String,
    /// E-mail.
    pub email: String,
    /// WhatsApp number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whatsapp: Option<String>,
    /// Points added by the credit.
    #[serde(rename = "pontos_acumulados", skip_serializing_if = "Option::is_none")]
    pub points_added: Option<i64>,
    /// Balance after the credit.
    #[serde(rename = "total_pontos", skip_serializing_if = "Option::is_none")]
    pub total_points: Option<i64>,
    /// Issued redemption code.
    #[serde(rename = "codigo_resgate", skip_serializing_if = "Option::is_none")]
    pub redemption_code: Option<String>,
    /// Redeemed item name.
    #[serde(rename = "item_nome", skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    /// Redeemed item description.
    #[serde(rename = "item_descricao", skip_serializing_if = "Option::is_none")]
    pub item_description: Option<String>,
    /// Redeemed item cost.
    #[serde(rename = "item_qtd_pontos", skip_serializing_if = "Option::is_none")]
    pub item_cost: Option<i64>,
    /// Balance after the redemption.
    #[serde(rename = "pontos_apos_resgate", skip_serializing_if = "Option::is_none")]
    pub balance_after_redemption: Option<i64>,
}

/// Body of `POST {base}/{tenant}/disparo-automatico`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationPayload {
    /// Template selector.
    #[serde(rename = "tipo_envio")]
    pub kind: NotificationKind,
    /// Recipient data.
    #[serde(rename = "cliente")]
    pub customer: NotifiedCustomer,
}

/// Communications client configuration.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Service base URL, e.g. `http://comunicacoes:4000`.
    pub base_url: String,
    /// Bearer token sent on every call.
    pub token: Option<String>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retries after the first attempt.
    pub max_retries: usize,
    /// First backoff delay.
    pub min_backoff: Duration,
    /// Backoff ceiling.
    pub max_backoff: Duration,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: None,
            timeout: Duration::from_secs(10),
            max_retries: 3,
            min_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl NotifierConfig {
    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the bearer token.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the retry budget and backoff bounds.
    #[must_use]
    pub const fn with_retries(mut self, max_retries: usize, min: Duration, max: Duration) -> Self {
        self.max_retries = max_retries;
        self.min_backoff = min;
        self.max_backoff = max;
        self
    }
}

/// Client for the communications service with retry on transient failures.
#[derive(Debug, Clone)]
pub struct CommunicationsClient {
    client: Client,
    config: NotifierConfig,
}

impl CommunicationsClient {
    /// Builds a client.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Config`] when the base URL is empty and
    /// [`NotifyError::Http`] if the HTTP client cannot be built.
    pub fn new(config: NotifierConfig) -> Result<Self, NotifyError> {
        if config.base_url.trim().is_empty() {
            return Err(NotifyError::Config(
                "communications base URL not configured".to_string(),
            ));
        }
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Endpoint for a tenant.
    #[must_use]
    pub fn endpoint(&self, tenant: &Tenant) -> String {
        format!(
            "{}/{tenant}/disparo-automatico",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.config.min_backoff)
            .with_max_delay(self.config.max_backoff)
            .with_max_times(self.config.max_retries)
            .with_jitter()
    }

    fn is_retryable_status(status: reqwest::StatusCode) -> bool {
        status == reqwest::StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
    }

    async fn post_once(
        &self,
        url: &str,
        event_id: Uuid,
        payload: &NotificationPayload,
    ) -> Result<(), NotifyError> {
        let mut request = self
            .client
            .post(url)
            .header(IDEMPOTENCY_HEADER, event_id.to_string())
            .json(payload);
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        let detail = format!(
            "HTTP {status} - {}",
            body.chars().take(200).collect::<String>()
        );
        if Self::is_retryable_status(status) {
            Err(NotifyError::Unavailable(detail))
        } else {
            Err(NotifyError::Rejected(detail))
        }
    }

    /// Delivers one notification, retrying transient failures.
    ///
    /// # Errors
    ///
    /// Returns the last [`NotifyError`] once retries are exhausted or a
    /// non-retryable failure occurs.
    pub async fn send(
        &self,
        tenant: &Tenant,
        event_id: Uuid,
        payload: &NotificationPayload,
    ) -> Result<(), NotifyError> {
        let url = self.endpoint(tenant);
        (|| async { self.post_once(&url, event_id, payload).await })
            .retry(self.backoff())
            .when(NotifyError::is_retryable)
            .notify(|err, delay| {
                tracing::warn!(
                    %tenant,
                    %event_id,
                    error = %err,
                    retry_in_ms = delay.as_millis(),
                    "notification attempt failed"
                );
            })
            .await?;
        tracing::debug!(%tenant, %event_id, kind = ?payload.kind, "notification delivered");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::Router;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;

    use super::*;

    #[derive(Clone, Default)]
    struct Receiver {
        hits: Arc<AtomicUsize>,
        fail_first: usize,
        status_on_fail: u16,
        auth: Arc<std::sync::Mutex<Option<String>>>,
    }

    async fn receive(State(rx): State<Receiver>, headers: HeaderMap) -> StatusCode {
        let n = rx.hits.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut auth) = rx.auth.lock() {
            *auth = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
        }
        if n < rx.fail_first {
            StatusCode::from_u16(rx.status_on_fail).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        } else {
            StatusCode::OK
        }
    }

    async fn serve(receiver: Receiver) -> String {
        let app = Router::new()
            .route("/{tenant}/disparo-automatico", post(receive))
            .with_state(receiver);
        let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
            panic!("bind failed");
        };
        let Ok(addr) = listener.local_addr() else {
            panic!("no local addr");
        };
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{addr}")
    }

    fn tenant() -> Tenant {
        let Ok(tenant) = Tenant::parse("casona") else {
            panic!("valid tenant");
        };
        tenant
    }

    fn payload() -> NotificationPayload {
        NotificationPayload {
            kind: NotificationKind::PointsUpdate,
            customer: NotifiedCustomer {
                id: 1,
                full_name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
                points_added: Some(250),
                total_points: Some(350),
                ..NotifiedCustomer::default()
            },
        }
    }

    fn client(base_url: String) -> CommunicationsClient {
        let config = NotifierConfig::default()
            .with_base_url(base_url)
            .with_token(Some("service-token".to_string()))
            .with_retries(3, Duration::from_millis(5), Duration::from_millis(20));
        let Ok(client) = CommunicationsClient::new(config) else {
            panic!("client should build");
        };
        client
    }

    #[test]
    fn empty_base_url_is_rejected() {
        assert!(matches!(
            CommunicationsClient::new(NotifierConfig::default()),
            Err(NotifyError::Config(_))
        ));
    }

    #[test]
    fn endpoint_joins_tenant() {
        let c = client("http://comunicacoes:4000/".to_string());
        assert_eq!(
            c.endpoint(&tenant()),
            "http://comunicacoes:4000/casona/disparo-automatico"
        );
    }

    #[test]
    fn retryable_statuses() {
        use reqwest::StatusCode;
        assert!(CommunicationsClient::is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(CommunicationsClient::is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!CommunicationsClient::is_retryable_status(StatusCode::BAD_REQUEST));
        assert!(!CommunicationsClient::is_retryable_status(StatusCode::UNAUTHORIZED));
    }

    #[test]
    fn payload_uses_wire_names_and_omits_absent_fields() {
        let json = serde_json::to_value(payload()).unwrap_or_default();
        assert_eq!(json["tipo_envio"], "atualizacao_pontos");
        assert_eq!(json["cliente"]["id_cliente"], 1);
        assert_eq!(json["cliente"]["pontos_acumulados"], 250);
        assert_eq!(json["cliente"]["total_pontos"], 350);
        assert!(json["cliente"].get("codigo_resgate").is_none());
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let receiver = Receiver {
            fail_first: 2,
            status_on_fail: 503,
            ..Receiver::default()
        };
        let hits = Arc::clone(&receiver.hits);
        let auth = Arc::clone(&receiver.auth);
        let c = client(serve(receiver).await);

        let result = c.send(&tenant(), Uuid::new_v4(), &payload()).await;
        assert!(result.is_ok());
        assert_eq!(hits.load(Ordering::SeqCst), 3);
        let seen = auth.lock().map(|a| a.clone()).unwrap_or_default();
        assert_eq!(seen.as_deref(), Some("Bearer service-token"));
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let receiver = Receiver {
            fail_first: usize::MAX,
            status_on_fail: 400,
            ..Receiver::default()
        };
        let hits = Arc::clone(&receiver.hits);
        let c = client(serve(receiver).await);

        let result = c.send(&tenant(), Uuid::new_v4(), &payload()).await;
        assert!(matches!(result, Err(NotifyError::Rejected(_))));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_stop_at_budget() {
        let receiver = Receiver {
            fail_first: usize::MAX,
            status_on_fail: 502,
            ..Receiver::default()
        };
        let hits = Arc::clone(&receiver.hits);
        let c = client(serve(receiver).await);

        let result = c.send(&tenant(), Uuid::new_v4(), &payload()).await;
        assert!(matches!(result, Err(NotifyError::Unavailable(_))));
        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }
}
