use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A catalog entry. Prices are in minor currency units (cents).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub price_cents: i64,
    pub currency: String,
    pub description: String,
}

impl Product {
    /// Price formatted for display, e.g. 2500 → "$25.00".
    pub fn display_price(&self) -> String {
        format!("${:.2}", self.price_cents as f64 / 100.0)
    }
}

/// Immutable product catalog, built at startup.
#[derive(Clone, Debug, Default)]
pub struct ProductCatalog {
    products: BTreeMap<String, Product>,
}

impl ProductCatalog {
    pub fn new() -> Self {
        Self {
            products: BTreeMap::new(),
        }
    }

    pub fn with_product(mut self, id: impl Into<String>, product: Product) -> Self {
        self.products.insert(id.into(), product);
        self
    }

    pub fn get(&self, id: &str) -> Option<&Product> {
        self.products.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.products.contains_key(id)
    }

    /// Products in stable (sorted-by-id) order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Product)> {
        self.products.iter().map(|(id, p)| (id.as_str(), p))
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// The gift-card catalog the service ships with.
    pub fn gift_cards() -> Self {
        Self::new()
            .with_product(
                "gift_card_25",
                Product {
                    name: "$25 Gift Card".into(),
                    price_cents: 2500,
                    currency: "usd".into(),
                    description: "Perfect starter gift".into(),
                },
            )
            .with_product(
                "gift_card_50",
                Product {
                    name: "$50 Gift Card".into(),
                    price_cents: 5000,
                    currency: "usd".into(),
                    description: "Most popular choice".into(),
                },
            )
            .with_product(
                "gift_card_100",
                Product {
                    name: "$100 Gift Card".into(),
                    price_cents: 10000,
                    currency: "usd".into(),
                    description: "Premium gift option".into(),
                },
            )
    }
}
