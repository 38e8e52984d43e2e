use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PaymentError;

/// Parameters for a redirect-based checkout session.
#[derive(Clone, Debug)]
pub struct CheckoutParams {
    pub product_id: String,
    pub name: String,
    pub description: String,
    pub amount_cents: i64,
    pub currency: String,
}

/// A provider-hosted checkout session the customer is redirected to.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Raw card credentials for creating a payment method.
#[derive(Clone, Debug)]
pub struct CardDetails {
    pub number: String,
    pub exp_month: u32,
    pub exp_year: u32,
    pub cvc: String,
}

impl CardDetails {
    /// The well-known always-succeeds test card.
    pub fn test_card() -> Self {
        Self {
            number: "4242424242424242".into(),
            exp_month: 12,
            exp_year: 2034,
            cvc: "123".into(),
        }
    }
}

/// Parameters for creating and immediately confirming a payment intent.
#[derive(Clone, Debug)]
pub struct PaymentIntentParams {
    pub amount_cents: i64,
    pub currency: String,
    pub payment_method: String,
    pub product_id: String,
    pub product_name: String,
}

/// One attempted charge.
#[derive(Clone, Debug)]
pub struct PaymentIntent {
    pub id: String,
    pub status: PaymentIntentStatus,
    pub amount_cents: i64,
    pub currency: String,
}

/// Lifecycle state of a payment intent as reported by the provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentIntentStatus {
    Succeeded,
    RequiresAction,
    RequiresPaymentMethod,
    RequiresConfirmation,
    Processing,
    Canceled,
    Other(String),
}

impl PaymentIntentStatus {
    pub fn from_wire(s: &str) -> Self {
        match s {
            "succeeded" => Self::Succeeded,
            "requires_action" => Self::RequiresAction,
            "requires_payment_method" => Self::RequiresPaymentMethod,
            "requires_confirmation" => Self::RequiresConfirmation,
            "processing" => Self::Processing,
            "canceled" => Self::Canceled,
            other => Self::Other(other.to_owned()),
        }
    }

    pub fn is_succeeded(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl std::fmt::Display for PaymentIntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Succeeded => "succeeded",
            Self::RequiresAction => "requires_action",
            Self::RequiresPaymentMethod => "requires_payment_method",
            Self::RequiresConfirmation => "requires_confirmation",
            Self::Processing => "processing",
            Self::Canceled => "canceled",
            Self::Other(s) => s,
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for PaymentIntentStatus {
    type Err = std::convert::Infallible;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_wire(s))
    }
}

/// Trait implemented by each payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a redirect-based checkout session for one product.
    async fn create_checkout_session(
        &self,
        params: &CheckoutParams,
    ) -> Result<CheckoutSession, PaymentError>;

    /// Create a payment method from raw card details; returns its id.
    async fn create_payment_method(&self, card: &CardDetails) -> Result<String, PaymentError>;

    /// Create and immediately confirm a payment intent, redirects disabled.
    async fn create_payment_intent(
        &self,
        params: &PaymentIntentParams,
    ) -> Result<PaymentIntent, PaymentError>;
}
