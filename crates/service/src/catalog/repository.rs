use async_trait::async_trait;

use crate::catalog::product::{NewProduct, Product, ProductPatch};
use crate::catalog::store::ProductStore;
use crate::errors::ServiceError;

/// Trait abstraction over product catalog storage, consumed by the HTTP layer.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Product>, ServiceError>;
    async fn find_by_id(&self, id: u64) -> Option<Product>;
    async fn create(&self, candidate: NewProduct) -> Result<Product, ServiceError>;
    async fn update(&self, id: u64, patch: ProductPatch) -> Result<Option<Product>, ServiceError>;
    async fn delete(&self, id: u64) -> Result<bool, ServiceError>;
}

#[async_trait]
impl ProductRepository for ProductStore {
    async fn list_all(&self) -> Result<Vec<Product>, ServiceError> { self.list_all().await }
    async fn find_by_id(&self, id: u64) -> Option<Product> { self.find_by_id(id).await }
    async fn create(&self, candidate: NewProduct) -> Result<Product, ServiceError> { self.create(candidate).await }
    async fn update(&self, id: u64, patch: ProductPatch) -> Result<Option<Product>, ServiceError> { self.update(id, patch).await }
    async fn delete(&self, id: u64) -> Result<bool, ServiceError> { self.delete(id).await }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn store_is_usable_as_trait_object() -> Result<(), anyhow::Error> {
        let tmp = std::env::temp_dir().join(format!("product_repo_{}.json", uuid::Uuid::new_v4()));
        let repo: Arc<dyn ProductRepository> = ProductStore::open(&tmp).await;

        let created = repo
            .create(NewProduct {
                title: "Mug".into(),
                description: "Ceramic mug".into(),
                price: 7.5,
                thumbnail: "mug.png".into(),
                code: "M1".into(),
                stock: 3,
                category: "kitchen".into(),
            })
            .await?;
        assert_eq!(repo.find_by_id(created.id).await, Some(created.clone()));
        assert_eq!(repo.list_all().await?.len(), 1);
        assert!(repo.delete(created.id).await?);

        let _ = tokio::fs::remove_file(&tmp).await;
        Ok(())
    }
}
