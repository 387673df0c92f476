//! Product catalog.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use meridian_core::id::parse_or_not_found;
use meridian_core::{DomainError, DomainResult, ProductId};
use meridian_products::{CreateProduct, Product, UpdateProduct, seed_products};

use crate::read_model::{InMemoryRecordStore, RecordStore};

fn product_not_found(id: &str) -> DomainError {
    DomainError::not_found(format!("Product with ID {id} not found"))
}

/// CRUD and category queries over products.
#[derive(Debug)]
pub struct ProductService<S> {
    store: Arc<S>,
}

impl<S> Clone for ProductService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl ProductService<InMemoryRecordStore<ProductId, Product>> {
    /// In-memory service holding the three demo products.
    pub fn seeded() -> Self {
        let products = seed_products(Utc::now()).into_iter().map(|p| (p.id, p));
        Self::new(Arc::new(InMemoryRecordStore::seeded(products)))
    }
}

impl<S> ProductService<S>
where
    S: RecordStore<ProductId, Product>,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn create(&self, cmd: CreateProduct) -> DomainResult<Product> {
        let product = Product::create(cmd, Utc::now())?;
        self.store.upsert(product.id, product.clone());
        info!(product_id = %product.id, sku = %product.sku, "product created");
        Ok(product)
    }

    /// All products, optionally narrowed to one category (case-insensitive).
    pub fn find_all(&self, category: Option<&str>) -> Vec<Product> {
        match category {
            Some(category) => self.find_by_category(category),
            None => self.store.list(),
        }
    }

    pub fn find_by_category(&self, category: &str) -> Vec<Product> {
        self.store
            .list()
            .into_iter()
            .filter(|p| p.in_category(category))
            .collect()
    }

    pub fn find_one(&self, id: &str) -> DomainResult<Product> {
        let key: ProductId = parse_or_not_found(id, || product_not_found(id))?;
        self.store.get(&key).ok_or_else(|| product_not_found(id))
    }

    pub fn update(&self, id: &str, patch: UpdateProduct) -> DomainResult<Product> {
        let key: ProductId = parse_or_not_found(id, || product_not_found(id))?;
        let now = Utc::now();
        let updated = self
            .store
            .modify(&key, &mut |product| product.apply_update(patch.clone(), now))?
            .ok_or_else(|| product_not_found(id))?;
        debug!(product_id = %key, "product updated");
        Ok(updated)
    }

    pub fn remove(&self, id: &str) -> DomainResult<Product> {
        let key: ProductId = parse_or_not_found(id, || product_not_found(id))?;
        let removed = self.store.remove(&key).ok_or_else(|| product_not_found(id))?;
        info!(product_id = %key, "product deleted");
        Ok(removed)
    }
}
