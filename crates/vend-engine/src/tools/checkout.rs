use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{info, warn};

use vend_core::catalog::ProductCatalog;
use vend_core::tools::{Tool, ToolError, ToolReply};
use vend_payments::{CheckoutParams, PaymentGateway};

use super::{payment_error_message, product_id_schema, required_product_id};

/// Creates a redirect-based checkout session for one product.
pub struct CreateCheckoutSessionTool {
    catalog: Arc<ProductCatalog>,
    gateway: Arc<dyn PaymentGateway>,
}

impl CreateCheckoutSessionTool {
    pub fn new(catalog: Arc<ProductCatalog>, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { catalog, gateway }
    }
}

#[async_trait]
impl Tool for CreateCheckoutSessionTool {
    fn name(&self) -> &str {
        "create_checkout_session"
    }

    fn description(&self) -> &str {
        "Create a checkout session for a product (redirects to the payment page)"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        product_id_schema()
    }

    async fn execute(&self, args: serde_json::Value) -> Result<ToolReply, ToolError> {
        let product_id = required_product_id(&args)?;

        let Some(product) = self.catalog.get(product_id) else {
            return Ok(ToolReply::error_payload("Product not found"));
        };

        info!(product_id, "creating checkout session");

        let params = CheckoutParams {
            product_id: product_id.to_string(),
            name: product.name.clone(),
            description: product.description.clone(),
            amount_cents: product.price_cents,
            currency: product.currency.clone(),
        };

        match self.gateway.create_checkout_session(&params).await {
            Ok(session) => Ok(ToolReply::success(
                json!({
                    "success": true,
                    "checkout_url": session.url,
                    "session_id": session.id,
                })
                .to_string(),
            )),
            Err(error) => {
                warn!(error = %error, kind = error.error_kind(), "checkout session failed");
                Ok(ToolReply::error_payload(payment_error_message(&error)))
            }
        }
    }
}
