use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::instrument;

use crate::error::PaymentError;
use crate::gateway::{
    CardDetails, CheckoutParams, CheckoutSession, PaymentGateway, PaymentIntent,
    PaymentIntentParams, PaymentIntentStatus,
};

const API_URL: &str = "https://api.stripe.com";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the customer lands after a hosted checkout.
const SUCCESS_URL: &str = "https://example.com/success?session_id={CHECKOUT_SESSION_ID}";
const CANCEL_URL: &str = "https://example.com/cancel";

/// Operating mode encoded in a secret key's prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyMode {
    Test,
    Live,
}

/// Classify a secret key by prefix; `None` means the prefix is not
/// recognized and the key must be rejected at startup.
pub fn classify_secret_key(key: &str) -> Option<KeyMode> {
    if key.starts_with("sk_test_") || key.starts_with("rk_test_") {
        Some(KeyMode::Test)
    } else if key.starts_with("sk_live_") || key.starts_with("rk_live_") {
        Some(KeyMode::Live)
    } else {
        None
    }
}

/// REST client for the Stripe API. Bodies are form-encoded; errors come
/// back as an `{"error": {...}}` envelope classified into [`PaymentError`].
pub struct StripeGateway {
    client: Client,
    secret_key: SecretString,
    api_url: String,
}

impl StripeGateway {
    pub fn new(secret_key: SecretString) -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            secret_key,
            api_url: API_URL.to_string(),
        }
    }

    /// Point the client at a different endpoint (stripe-mock, test servers).
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(String, String)],
    ) -> Result<T, PaymentError> {
        let resp = self
            .client
            .post(format!("{}{path}", self.api_url))
            .bearer_auth(self.secret_key.expose_secret())
            .form(form)
            .send()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        if (200..300).contains(&status) {
            serde_json::from_str(&body)
                .map_err(|e| PaymentError::Api(format!("unparseable response: {e}")))
        } else {
            let envelope: ErrorEnvelope = serde_json::from_str(&body).unwrap_or_default();
            let message = envelope
                .error
                .message
                .unwrap_or_else(|| format!("HTTP {status}"));
            Err(PaymentError::from_api_error(
                status,
                envelope.error.kind.as_deref(),
                message,
            ))
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self, params), fields(product_id = %params.product_id))]
    async fn create_checkout_session(
        &self,
        params: &CheckoutParams,
    ) -> Result<CheckoutSession, PaymentError> {
        let form = vec![
            ("payment_method_types[0]".into(), "card".into()),
            (
                "line_items[0][price_data][currency]".into(),
                params.currency.clone(),
            ),
            (
                "line_items[0][price_data][product_data][name]".into(),
                params.name.clone(),
            ),
            (
                "line_items[0][price_data][product_data][description]".into(),
                params.description.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]".into(),
                params.amount_cents.to_string(),
            ),
            ("line_items[0][quantity]".into(), "1".into()),
            ("mode".into(), "payment".into()),
            ("success_url".into(), SUCCESS_URL.into()),
            ("cancel_url".into(), CANCEL_URL.into()),
            ("metadata[product_id]".into(), params.product_id.clone()),
        ];

        let session: CheckoutSessionResponse =
            self.post_form("/v1/checkout/sessions", &form).await?;
        tracing::info!(session_id = %session.id, "checkout session created");

        Ok(CheckoutSession {
            id: session.id,
            url: session.url,
        })
    }

    #[instrument(skip_all)]
    async fn create_payment_method(&self, card: &CardDetails) -> Result<String, PaymentError> {
        let form = vec![
            ("type".into(), "card".into()),
            ("card[number]".into(), card.number.clone()),
            ("card[exp_month]".into(), card.exp_month.to_string()),
            ("card[exp_year]".into(), card.exp_year.to_string()),
            ("card[cvc]".into(), card.cvc.clone()),
        ];

        let method: PaymentMethodResponse = self.post_form("/v1/payment_methods", &form).await?;
        Ok(method.id)
    }

    #[instrument(skip(self, params), fields(product_id = %params.product_id))]
    async fn create_payment_intent(
        &self,
        params: &PaymentIntentParams,
    ) -> Result<PaymentIntent, PaymentError> {
        let form = vec![
            ("amount".into(), params.amount_cents.to_string()),
            ("currency".into(), params.currency.clone()),
            ("payment_method".into(), params.payment_method.clone()),
            ("confirm".into(), "true".into()),
            ("automatic_payment_methods[enabled]".into(), "true".into()),
            (
                "automatic_payment_methods[allow_redirects]".into(),
                "never".into(),
            ),
            ("metadata[product_id]".into(), params.product_id.clone()),
            ("metadata[product_name]".into(), params.product_name.clone()),
        ];

        let intent: PaymentIntentResponse = self.post_form("/v1/payment_intents", &form).await?;
        let status = PaymentIntentStatus::from_wire(&intent.status);
        tracing::info!(intent_id = %intent.id, status = %status, "payment intent confirmed");

        Ok(PaymentIntent {
            id: intent.id,
            status,
            amount_cents: intent.amount,
            currency: intent.currency,
        })
    }
}

// --- Wire types ---

#[derive(Deserialize)]
struct CheckoutSessionResponse {
    id: String,
    url: String,
}

#[derive(Deserialize)]
struct PaymentMethodResponse {
    id: String,
}

#[derive(Deserialize)]
struct PaymentIntentResponse {
    id: String,
    status: String,
    amount: i64,
    currency: String,
}

#[derive(Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: ApiError,
}

#[derive(Default, Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    kind: Option<String>,
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_classification() {
        assert_eq!(classify_secret_key("sk_test_abc123"), Some(KeyMode::Test));
        assert_eq!(classify_secret_key("rk_test_abc123"), Some(KeyMode::Test));
        assert_eq!(classify_secret_key("sk_live_abc123"), Some(KeyMode::Live));
        assert_eq!(classify_secret_key("rk_live_abc123"), Some(KeyMode::Live));
        assert_eq!(classify_secret_key("pk_test_abc123"), None);
        assert_eq!(classify_secret_key("hunter2"), None);
        assert_eq!(classify_secret_key(""), None);
    }

    #[test]
    fn error_envelope_parses_stripe_shape() {
        let body = r#"{"error": {"type": "card_error", "message": "Your card was declined."}}"#;
        let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.error.kind.as_deref(), Some("card_error"));
        assert_eq!(
            envelope.error.message.as_deref(),
            Some("Your card was declined.")
        );
    }

    #[test]
    fn error_envelope_tolerates_garbage() {
        let envelope: ErrorEnvelope = serde_json::from_str("{}").unwrap();
        assert!(envelope.error.kind.is_none());
        assert!(envelope.error.message.is_none());
    }

    #[test]
    fn api_url_override() {
        let gw = StripeGateway::new(SecretString::from("sk_test_x"))
            .with_api_url("http://127.0.0.1:12111");
        assert_eq!(gw.api_url, "http://127.0.0.1:12111");
    }
}
