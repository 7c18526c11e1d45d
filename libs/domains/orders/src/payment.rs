//! Webpay Plus payment gateway.
//!
//! Two implementations sit behind [`PaymentGateway`]: a REST client for
//! Transbank and a simulator that approves every payment. The simulator is
//! used in integration mode so checkout can be exercised without card data.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_config::{ConfigError, FromEnv, env_optional, env_or_default};
use reqwest::Client;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::codes::random_base36;
use crate::error::{OrderError, OrderResult};

const INTEGRATION_API_KEY: &str =
    "579B532A7440BB0C9079DED94D31EA1615BACEB56610332264630D42D0A36B1C";
const INTEGRATION_COMMERCE_CODE: &str = "597055555532";
const TRANSACTIONS_PATH: &str = "/rswebpaytransaction/api/webpay/v1.2/transactions";

/// Transaction the buyer is redirected to pay
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTransaction {
    pub amount: Decimal,
    pub buy_order: String,
    pub session_id: String,
    pub return_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransactionCreated {
    pub token: String,
    pub url: String,
}

/// Result of committing a transaction; `response_code == 0` means approved
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionCommit {
    pub response_code: i32,
    pub buy_order: String,
    pub session_id: String,
    pub amount: i64,
    pub authorization_code: Option<String>,
    pub payment_type_code: Option<String>,
    pub installments_number: Option<i32>,
    pub card_number: Option<String>,
    /// `MMDD`
    pub accounting_date: Option<String>,
    pub transaction_date: Option<DateTime<Utc>>,
}

impl TransactionCommit {
    pub fn is_approved(&self) -> bool {
        self.response_code == 0
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_transaction(&self, request: CreateTransaction)
    -> OrderResult<TransactionCreated>;

    async fn commit_transaction(&self, token: &str) -> OrderResult<TransactionCommit>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebpayEnvironment {
    Integration,
    Production,
}

impl WebpayEnvironment {
    pub fn base_url(&self) -> &'static str {
        match self {
            WebpayEnvironment::Integration => "https://webpay3gint.transbank.cl",
            WebpayEnvironment::Production => "https://webpay3g.transbank.cl",
        }
    }
}

/// Webpay settings from `FRONTEND_URL` and `WEBPAY_*`
#[derive(Debug, Clone)]
pub struct WebpayConfig {
    /// Storefront base URL, used for return and simulation links
    pub frontend_url: String,
    pub api_key: String,
    pub commerce_code: String,
    pub environment: WebpayEnvironment,
    pub simulate: bool,
}

impl FromEnv for WebpayConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let environment = if env_or_default("WEBPAY_ENVIRONMENT", "integration")
            .eq_ignore_ascii_case("production")
        {
            WebpayEnvironment::Production
        } else {
            WebpayEnvironment::Integration
        };

        Ok(Self {
            frontend_url: env_or_default("FRONTEND_URL", "http://localhost:3000")
                .trim_end_matches('/')
                .to_string(),
            api_key: env_optional("WEBPAY_API_KEY")
                .unwrap_or_else(|| INTEGRATION_API_KEY.to_string()),
            commerce_code: env_optional("WEBPAY_COMMERCE_CODE")
                .unwrap_or_else(|| INTEGRATION_COMMERCE_CODE.to_string()),
            environment,
            simulate: env_or_default("WEBPAY_SIMULATE", "true").eq_ignore_ascii_case("true"),
        })
    }
}

impl WebpayConfig {
    pub fn is_simulated(&self) -> bool {
        self.simulate || self.environment == WebpayEnvironment::Integration
    }

    /// The gateway this configuration selects
    pub fn gateway(&self) -> Arc<dyn PaymentGateway> {
        if self.is_simulated() {
            info!("Webpay running in simulation mode");
            Arc::new(SimulatedWebpay::new(self.frontend_url.clone()))
        } else {
            info!(commerce_code = %self.commerce_code, "Webpay running against Transbank");
            Arc::new(WebpayClient::new(self.clone()))
        }
    }
}

/// Gateway that approves every payment without contacting Transbank
#[derive(Debug, Clone)]
pub struct SimulatedWebpay {
    frontend_url: String,
}

impl SimulatedWebpay {
    pub fn new(frontend_url: impl Into<String>) -> Self {
        Self {
            frontend_url: frontend_url.into(),
        }
    }
}

#[async_trait]
impl PaymentGateway for SimulatedWebpay {
    async fn create_transaction(
        &self,
        request: CreateTransaction,
    ) -> OrderResult<TransactionCreated> {
        let token = format!(
            "simulated_token_{}_{}",
            Utc::now().timestamp_millis(),
            random_base36(7)
        );

        debug!(buy_order = %request.buy_order, amount = %request.amount, "Simulated Webpay transaction");

        Ok(TransactionCreated {
            url: format!("{}/checkout/simulate?token={}", self.frontend_url, token),
            token,
        })
    }

    async fn commit_transaction(&self, token: &str) -> OrderResult<TransactionCommit> {
        let now = Utc::now();

        Ok(TransactionCommit {
            response_code: 0,
            buy_order: format!("ORD-{}", now.timestamp_millis()),
            session_id: token.to_string(),
            amount: 0,
            authorization_code: Some("123456".to_string()),
            payment_type_code: Some("VD".to_string()),
            installments_number: Some(0),
            card_number: Some("****1234".to_string()),
            accounting_date: Some(now.format("%m%d").to_string()),
            transaction_date: Some(now),
        })
    }
}

/// Transbank Webpay Plus REST client
pub struct WebpayClient {
    config: WebpayConfig,
    client: Client,
}

impl WebpayClient {
    pub fn new(config: WebpayConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn transactions_url(&self) -> String {
        format!("{}{}", self.config.environment.base_url(), TRANSACTIONS_PATH)
    }

    async fn error_from(response: reqwest::Response, action: &str) -> OrderError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<WebpayError>(&body)
            .map(|e| e.error_message)
            .unwrap_or_else(|_| body.clone());

        error!(status = %status, error = %message, "Webpay {} failed", action);
        OrderError::Gateway(format!("Webpay {} failed ({}): {}", action, status, message))
    }
}

#[derive(Debug, Serialize)]
struct CreateRequest<'a> {
    buy_order: &'a str,
    session_id: &'a str,
    amount: i64,
    return_url: &'a str,
}

#[derive(Debug, Deserialize)]
struct WebpayError {
    error_message: String,
}

#[derive(Debug, Deserialize)]
struct CardDetail {
    card_number: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    response_code: i32,
    buy_order: String,
    session_id: String,
    amount: i64,
    authorization_code: Option<String>,
    payment_type_code: Option<String>,
    installments_number: Option<i32>,
    card_detail: Option<CardDetail>,
    accounting_date: Option<String>,
    transaction_date: Option<DateTime<Utc>>,
}

impl From<CommitResponse> for TransactionCommit {
    fn from(raw: CommitResponse) -> Self {
        Self {
            response_code: raw.response_code,
            buy_order: raw.buy_order,
            session_id: raw.session_id,
            amount: raw.amount,
            authorization_code: raw.authorization_code,
            payment_type_code: raw.payment_type_code,
            installments_number: raw.installments_number,
            card_number: raw.card_detail.and_then(|c| c.card_number),
            accounting_date: raw.accounting_date,
            transaction_date: raw.transaction_date,
        }
    }
}

/// Webpay takes whole pesos
fn amount_in_pesos(amount: Decimal) -> OrderResult<i64> {
    amount
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or_else(|| OrderError::Gateway(format!("Amount {} out of range", amount)))
}

#[async_trait]
impl PaymentGateway for WebpayClient {
    async fn create_transaction(
        &self,
        request: CreateTransaction,
    ) -> OrderResult<TransactionCreated> {
        let body = CreateRequest {
            buy_order: &request.buy_order,
            session_id: &request.session_id,
            amount: amount_in_pesos(request.amount)?,
            return_url: &request.return_url,
        };

        debug!(buy_order = %request.buy_order, amount = body.amount, "Creating Webpay transaction");

        let response = self
            .client
            .post(self.transactions_url())
            .header("Tbk-Api-Key-Id", &self.config.commerce_code)
            .header("Tbk-Api-Key-Secret", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, "create").await);
        }

        let created: TransactionCreated = response.json().await?;
        info!(buy_order = %request.buy_order, "Webpay transaction created");
        Ok(created)
    }

    async fn commit_transaction(&self, token: &str) -> OrderResult<TransactionCommit> {
        let response = self
            .client
            .put(format!("{}/{}", self.transactions_url(), token))
            .header("Tbk-Api-Key-Id", &self.config.commerce_code)
            .header("Tbk-Api-Key-Secret", &self.config.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response, "commit").await);
        }

        let commit: CommitResponse = response.json().await?;
        info!(
            buy_order = %commit.buy_order,
            response_code = commit.response_code,
            "Webpay transaction committed"
        );
        Ok(commit.into())
    }
}
