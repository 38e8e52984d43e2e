use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::PaymentError;
use crate::gateway::{
    CardDetails, CheckoutParams, CheckoutSession, PaymentGateway, PaymentIntent,
    PaymentIntentParams, PaymentIntentStatus,
};

/// Gateway with programmable outcomes and per-operation call counters,
/// for testing tools without provider calls.
pub struct MockGateway {
    checkout_error: Mutex<Option<PaymentError>>,
    payment_method_error: Mutex<Option<PaymentError>>,
    intent_error: Mutex<Option<PaymentError>>,
    intent_status: Mutex<PaymentIntentStatus>,
    checkout_calls: AtomicUsize,
    payment_method_calls: AtomicUsize,
    intent_calls: AtomicUsize,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    /// A gateway where every operation succeeds.
    pub fn new() -> Self {
        Self {
            checkout_error: Mutex::new(None),
            payment_method_error: Mutex::new(None),
            intent_error: Mutex::new(None),
            intent_status: Mutex::new(PaymentIntentStatus::Succeeded),
            checkout_calls: AtomicUsize::new(0),
            payment_method_calls: AtomicUsize::new(0),
            intent_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_checkout_error(self, error: PaymentError) -> Self {
        *self.checkout_error.lock() = Some(error);
        self
    }

    pub fn with_payment_method_error(self, error: PaymentError) -> Self {
        *self.payment_method_error.lock() = Some(error);
        self
    }

    pub fn with_intent_error(self, error: PaymentError) -> Self {
        *self.intent_error.lock() = Some(error);
        self
    }

    pub fn with_intent_status(self, status: PaymentIntentStatus) -> Self {
        *self.intent_status.lock() = status;
        self
    }

    pub fn checkout_calls(&self) -> usize {
        self.checkout_calls.load(Ordering::Relaxed)
    }

    pub fn payment_method_calls(&self) -> usize {
        self.payment_method_calls.load(Ordering::Relaxed)
    }

    pub fn intent_calls(&self) -> usize {
        self.intent_calls.load(Ordering::Relaxed)
    }

    pub fn total_calls(&self) -> usize {
        self.checkout_calls() + self.payment_method_calls() + self.intent_calls()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_checkout_session(
        &self,
        params: &CheckoutParams,
    ) -> Result<CheckoutSession, PaymentError> {
        self.checkout_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(error) = self.checkout_error.lock().clone() {
            return Err(error);
        }
        Ok(CheckoutSession {
            id: format!("cs_test_{}", params.product_id),
            url: format!("https://checkout.example.com/{}", params.product_id),
        })
    }

    async fn create_payment_method(&self, _card: &CardDetails) -> Result<String, PaymentError> {
        self.payment_method_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(error) = self.payment_method_error.lock().clone() {
            return Err(error);
        }
        Ok("pm_test_card".into())
    }

    async fn create_payment_intent(
        &self,
        params: &PaymentIntentParams,
    ) -> Result<PaymentIntent, PaymentError> {
        self.intent_calls.fetch_add(1, Ordering::Relaxed);
        if let Some(error) = self.intent_error.lock().clone() {
            return Err(error);
        }
        Ok(PaymentIntent {
            id: format!("pi_test_{}", params.product_id),
            status: self.intent_status.lock().clone(),
            amount_cents: params.amount_cents,
            currency: params.currency.clone(),
        })
    }
}
