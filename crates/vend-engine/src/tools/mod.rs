mod checkout;
mod list_products;
mod test_payment;

pub use checkout::CreateCheckoutSessionTool;
pub use list_products::ListProductsTool;
pub use test_payment::ProcessTestPaymentTool;

use std::sync::Arc;

use vend_core::catalog::ProductCatalog;
use vend_core::tools::ToolError;
use vend_payments::{PaymentError, PaymentGateway};

use crate::registry::ToolRegistry;

/// Build a registry with the full sales tool set.
pub fn sales_registry(
    catalog: Arc<ProductCatalog>,
    gateway: Arc<dyn PaymentGateway>,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(ListProductsTool::new(Arc::clone(&catalog))));
    registry.register(Arc::new(CreateCheckoutSessionTool::new(
        Arc::clone(&catalog),
        Arc::clone(&gateway),
    )));
    registry.register(Arc::new(ProcessTestPaymentTool::new(catalog, gateway)));
    registry
}

/// Extract the `product_id` argument the purchase tools require.
fn required_product_id(args: &serde_json::Value) -> Result<&str, ToolError> {
    args.get("product_id")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolError::InvalidArguments("product_id is required".into()))
}

/// Human-readable wording for provider faults surfaced to the model.
fn payment_error_message(error: &PaymentError) -> String {
    match error {
        PaymentError::Authentication(_) => {
            "Authentication failed. Please check your payment API key.".into()
        }
        PaymentError::Card(msg) => format!("Card error: {msg}"),
        PaymentError::InvalidRequest(msg) | PaymentError::Api(msg) => {
            format!("Payment provider error: {msg}")
        }
        PaymentError::Network(msg) => format!("Payment provider unreachable: {msg}"),
    }
}

/// JSON schema for tools taking a single required `product_id`.
fn product_id_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "product_id": {
                "type": "string",
                "description": "The product ID to purchase"
            }
        },
        "required": ["product_id"]
    })
}
