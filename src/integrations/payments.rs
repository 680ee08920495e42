use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::StripeConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntentRequest {
    /// Amount in the currency's minor unit (paise, cents).
    pub amount_minor: i64,
    pub currency: String,
    pub metadata: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

#[derive(Debug, Error)]
pub enum PaymentGatewayError {
    #[error("payment gateway is not configured")]
    NotConfigured,

    #[error("payment gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("payment gateway rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentGatewayError>;
}

/// Stripe PaymentIntents over the form-encoded REST API.
#[derive(Clone)]
pub struct StripeGateway {
    config: StripeConfig,
    client: reqwest::Client,
}

impl StripeGateway {
    pub fn new(config: StripeConfig, timeout: Duration) -> Result<Self, PaymentGatewayError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { config, client })
    }
}

fn intent_form(request: &PaymentIntentRequest) -> Vec<(String, String)> {
    let mut params = vec![
        ("amount".to_string(), request.amount_minor.to_string()),
        ("currency".to_string(), request.currency.clone()),
    ];
    for (key, value) in &request.metadata {
        params.push((format!("metadata[{key}]"), value.clone()));
    }
    params
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[tracing::instrument(skip(self), fields(amount = request.amount_minor))]
    async fn create_payment_intent(
        &self,
        request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentGatewayError> {
        let url = format!("{}/v1/payment_intents", self.config.api_base.trim_end_matches('/'));
        let response = self
            .client
            .post(url)
            .basic_auth(&self.config.secret_key, Some(""))
            .form(&intent_form(&request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "payment intent rejected");
            return Err(PaymentGatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let intent: PaymentIntent = response.json().await?;
        tracing::info!(intent_id = %intent.id, "payment intent created");
        Ok(intent)
    }
}

/// Stand-in used when no gateway key is configured.
pub struct UnconfiguredGateway;

#[async_trait]
impl PaymentGateway for UnconfiguredGateway {
    async fn create_payment_intent(
        &self,
        _request: PaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentGatewayError> {
        Err(PaymentGatewayError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_flattens_metadata_with_bracket_keys() {
        let request = PaymentIntentRequest {
            amount_minor: 2500,
            currency: "inr".into(),
            metadata: vec![("order_id".into(), "17".into())],
        };
        let form = intent_form(&request);
        assert!(form.contains(&("amount".into(), "2500".into())));
        assert!(form.contains(&("currency".into(), "inr".into())));
        assert!(form.contains(&("metadata[order_id]".into(), "17".into())));
    }

    #[tokio::test]
    async fn unconfigured_gateway_reports_not_configured() {
        let err = UnconfiguredGateway
            .create_payment_intent(PaymentIntentRequest {
                amount_minor: 100,
                currency: "inr".into(),
                metadata: vec![],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentGatewayError::NotConfigured));
    }
}
