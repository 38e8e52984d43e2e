use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use vend_core::catalog::ProductCatalog;
use vend_core::tools::{Tool, ToolError, ToolReply};

/// Returns the full catalog with display-formatted prices.
pub struct ListProductsTool {
    catalog: Arc<ProductCatalog>,
}

impl ListProductsTool {
    pub fn new(catalog: Arc<ProductCatalog>) -> Self {
        Self { catalog }
    }
}

#[async_trait]
impl Tool for ListProductsTool {
    fn name(&self) -> &str {
        "list_products"
    }

    fn description(&self) -> &str {
        "Get list of available products for sale"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(&self, _args: serde_json::Value) -> Result<ToolReply, ToolError> {
        let products: Vec<serde_json::Value> = self
            .catalog
            .iter()
            .map(|(id, product)| {
                json!({
                    "id": id,
                    "name": product.name,
                    "price": product.display_price(),
                    "description": product.description,
                })
            })
            .collect();

        Ok(ToolReply::success(serde_json::Value::Array(products).to_string()))
    }
}
