use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use meridian_core::{DomainError, DomainResult, ProductId};

/// Catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    /// Unit price in major currency units, at most two decimal places.
    pub price: f64,
    pub category: String,
    pub stock: u32,
    pub sku: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Command: create a product.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateProduct {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub stock: u32,
    pub sku: String,
}

impl CreateProduct {
    pub fn validate(&self) -> DomainResult<()> {
        validate_price(self.price)?;
        non_empty("name", &self.name)?;
        non_empty("category", &self.category)?;
        non_empty("sku", &self.sku)
    }
}

/// Command: partial update; absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub stock: Option<u32>,
    pub sku: Option<String>,
}

impl UpdateProduct {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(name) = &self.name {
            non_empty("name", name)?;
        }
        if let Some(category) = &self.category {
            non_empty("category", category)?;
        }
        if let Some(sku) = &self.sku {
            non_empty("sku", sku)?;
        }
        Ok(())
    }
}

impl Product {
    pub fn create(cmd: CreateProduct, now: DateTime<Utc>) -> DomainResult<Self> {
        cmd.validate()?;
        Ok(Self {
            id: ProductId::new(),
            name: cmd.name,
            description: cmd.description,
            price: cmd.price,
            category: cmd.category,
            stock: cmd.stock,
            sku: cmd.sku,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update. Nothing changes when validation fails.
    pub fn apply_update(&mut self, patch: UpdateProduct, now: DateTime<Utc>) -> DomainResult<()> {
        patch.validate()?;
        let UpdateProduct {
            name,
            description,
            price,
            category,
            stock,
            sku,
        } = patch;

        if let Some(v) = name {
            self.name = v;
        }
        if let Some(v) = description {
            self.description = v;
        }
        if let Some(v) = price {
            self.price = v;
        }
        if let Some(v) = category {
            self.category = v;
        }
        if let Some(v) = stock {
            self.stock = v;
        }
        if let Some(v) = sku {
            self.sku = v;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn in_category(&self, category: &str) -> bool {
        same_category(&self.category, category)
    }
}

/// Category names compare case-insensitively.
pub fn same_category(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Example records the catalog starts with.
pub fn seed_products(now: DateTime<Utc>) -> Vec<Product> {
    [
        (
            "Wireless Headphones",
            "High-quality wireless Bluetooth headphones with noise cancellation",
            299.99,
            "electronics",
            50,
            "WH-001",
        ),
        (
            "Smart Watch",
            "Advanced fitness tracking smartwatch with heart rate monitor",
            199.99,
            "electronics",
            30,
            "SW-002",
        ),
        (
            "Coffee Maker",
            "Programmable drip coffee maker with thermal carafe",
            89.99,
            "appliances",
            25,
            "CM-003",
        ),
    ]
    .into_iter()
    .map(|(name, description, price, category, stock, sku)| Product {
        id: ProductId::new(),
        name: name.to_string(),
        description: description.to_string(),
        price,
        category: category.to_string(),
        stock,
        sku: sku.to_string(),
        created_at: now,
        updated_at: now,
    })
    .collect()
}

fn validate_price(price: f64) -> DomainResult<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(DomainError::validation("price must be a non-negative number"));
    }
    let cents = price * 100.0;
    if (cents - cents.round()).abs() > 1e-6 {
        return Err(DomainError::validation("price must have at most 2 decimal places"));
    }
    Ok(())
}

fn non_empty(field: &str, value: &str) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headphones() -> CreateProduct {
        CreateProduct {
            name: "Wireless Headphones".to_string(),
            description: "Noise cancelling".to_string(),
            price: 299.99,
            category: "electronics".to_string(),
            stock: 50,
            sku: "WH-001".to_string(),
        }
    }

    #[test]
    fn create_accepts_valid_product() {
        let p = Product::create(headphones(), Utc::now()).unwrap();
        assert_eq!(p.sku, "WH-001");
        assert_eq!(p.created_at, p.updated_at);
    }

    #[test]
    fn negative_price_is_rejected() {
        let mut cmd = headphones();
        cmd.price = -1.0;
        assert!(matches!(Product::create(cmd, Utc::now()), Err(DomainError::Validation(_))));
    }

    #[test]
    fn more_than_two_decimals_is_rejected() {
        let mut cmd = headphones();
        cmd.price = 1.005;
        assert!(Product::create(cmd, Utc::now()).is_err());
    }

    #[test]
    fn negative_stock_fails_to_deserialize() {
        let body = serde_json::json!({
            "name": "x", "description": "y", "price": 1.0,
            "category": "c", "stock": -3, "sku": "s"
        });
        assert!(serde_json::from_value::<CreateProduct>(body).is_err());
    }

    #[test]
    fn update_is_partial() {
        let now = Utc::now();
        let mut p = Product::create(headphones(), now).unwrap();
        p.apply_update(
            UpdateProduct {
                stock: Some(7),
                ..Default::default()
            },
            now,
        )
        .unwrap();
        assert_eq!(p.stock, 7);
        assert_eq!(p.name, "Wireless Headphones");
    }

    #[test]
    fn invalid_update_changes_nothing() {
        let mut p = Product::create(headphones(), Utc::now()).unwrap();
        let before = p.clone();
        let patch = UpdateProduct {
            name: Some("Renamed".to_string()),
            price: Some(f64::NAN),
            ..Default::default()
        };
        assert!(p.apply_update(patch, Utc::now()).is_err());
        assert_eq!(p.name, before.name);
        assert_eq!(p.updated_at, before.updated_at);
    }

    #[test]
    fn category_match_ignores_case() {
        let p = Product::create(headphones(), Utc::now()).unwrap();
        assert!(p.in_category("Electronics"));
        assert!(!p.in_category("appliances"));
    }

    #[test]
    fn seed_catalog_has_three_products() {
        let seeded = seed_products(Utc::now());
        let skus: Vec<_> = seeded.iter().map(|p| p.sku.as_str()).collect();
        assert_eq!(skus, ["WH-001", "SW-002", "CM-003"]);
        assert_eq!(seeded.iter().filter(|p| p.in_category("electronics")).count(), 2);
    }

    proptest::proptest! {
        #[test]
        fn whole_cent_prices_always_validate(cents in 0u32..10_000_000) {
            let price = f64::from(cents) / 100.0;
            proptest::prop_assert!(validate_price(price).is_ok());
        }
    }
}
