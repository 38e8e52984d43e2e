use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use vend_core::catalog::ProductCatalog;
use vend_core::tools::{Tool, ToolError, ToolReply};
use vend_payments::{CardDetails, PaymentGateway, PaymentIntentParams};

use super::{payment_error_message, product_id_schema, required_product_id};

/// Charges the fixed test card server-side: creates a throwaway payment
/// method, then creates and immediately confirms a payment intent with
/// redirects disabled.
pub struct ProcessTestPaymentTool {
    catalog: Arc<ProductCatalog>,
    gateway: Arc<dyn PaymentGateway>,
}

impl ProcessTestPaymentTool {
    pub fn new(catalog: Arc<ProductCatalog>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { catalog, gateway }
    }
}

#[async_trait]
impl Tool for ProcessTestPaymentTool {
    fn name(&self) -> &str {
        "process_test_payment"
    }

    fn description(&self) -> &str {
        "Process payment immediately server-side using test card credentials (no redirect needed)"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        product_id_schema()
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolReply, ToolError> {
        let product_id = required_product_id(&args)?;

        let Some(product) = self.catalog.get(product_id) else {
            return Ok(ToolReply::error_payload("Product not found"));
        };

        info!(product_id, product = %product.name, "processing server-side test payment");

        let payment_method = match self.gateway.create_payment_method(&CardDetails::test_card()).await
        {
            Ok(id) => id,
            Err(error) => {
                warn!(error = %error, kind = error.error_kind(), "payment method creation failed");
                return Ok(ToolReply::error_payload(payment_error_message(&error)));
            }
        };

        let params = PaymentIntentParams {
            amount_cents: product.price_cents,
            currency: product.currency.clone(),
            payment_method,
            product_id: product_id.to_string(),
            product_name: product.name.clone(),
        };

        let intent = match self.gateway.create_payment_intent(&params).await {
            Ok(intent) => intent,
            Err(error) => {
                warn!(error = %error, kind = error.error_kind(), "payment intent failed");
                return Ok(ToolReply::error_payload(payment_error_message(&error)));
            }
        };

        if intent.status.is_succeeded() {
            Ok(ToolReply::success(
                json!({
                    "success": true,
                    "payment_id": intent.id,
                    "amount": intent.amount_cents as f64 / 100.0,
                    "currency": intent.currency.to_uppercase(),
                    "status": "succeeded",
                    "message": format!("Payment successful! You purchased {}", product.name),
                })
                .to_string(),
            ))
        } else {
            Ok(ToolReply::success(
                json!({
                    "success": false,
                    "status": intent.status.to_string(),
                    "message": "Payment requires additional action",
                })
                .to_string(),
            ))
        }
    }
}
