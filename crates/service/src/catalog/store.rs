use std::{collections::HashSet, path::{Path, PathBuf}, sync::Arc};

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::catalog::product::{NewProduct, Product, ProductPatch};
use crate::errors::ServiceError;
use crate::storage::json_file;

/// What `ProductStore::open` found at the backing path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadState {
    /// File parsed; holds the number of products loaded.
    Loaded(usize),
    /// No file yet; the store started empty.
    Missing,
    /// File present but unreadable, unparsable or holding invalid records; the
    /// store started empty and the file is left as is until the next write.
    Unreadable(String),
}

/// Result of a staged mutation: only `Changed` is written to disk and committed.
enum Outcome<R> {
    Changed(R),
    Unchanged(R),
}

/// File-backed product catalog.
///
/// The whole collection lives in memory and is rewritten to a single JSON
/// array on every mutation. Mutations hold the write lock across
/// stage, persist and commit, so they are applied one at a time and the
/// in-memory state only changes once the file write has succeeded.
pub struct ProductStore {
    products: RwLock<Vec<Product>>,
    file_path: PathBuf,
    load_state: LoadState,
}

impl ProductStore {
    /// Load the catalog from `path`. Never fails: a missing or broken file
    /// yields an empty catalog and is reported through `load_state`.
    pub async fn open<P: Into<PathBuf>>(path: P) -> Arc<Self> {
        let file_path = path.into();

        let (products, load_state) = match json_file::read_json::<Vec<Product>>(&file_path).await {
            Ok(Some(products)) => match check_records(&products) {
                Ok(()) => {
                    let n = products.len();
                    info!(path = %file_path.display(), count = n, "product catalog loaded");
                    (products, LoadState::Loaded(n))
                }
                Err(reason) => {
                    warn!(path = %file_path.display(), %reason, "product catalog rejected; starting empty");
                    (Vec::new(), LoadState::Unreadable(reason))
                }
            },
            Ok(None) => {
                info!(path = %file_path.display(), "product catalog not found; starting empty");
                let empty: Vec<Product> = Vec::new();
                if let Err(e) = json_file::write_json_atomic(&file_path, &empty).await {
                    warn!(path = %file_path.display(), error = %e, "could not create empty catalog file");
                }
                (empty, LoadState::Missing)
            }
            Err(e) => {
                warn!(path = %file_path.display(), error = %e, "product catalog unreadable; starting empty");
                (Vec::new(), LoadState::Unreadable(e.to_string()))
            }
        };

        Arc::new(Self { products: RwLock::new(products), file_path, load_state })
    }

    pub fn load_state(&self) -> &LoadState {
        &self.load_state
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    pub async fn len(&self) -> usize {
        self.products.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.products.read().await.is_empty()
    }

    /// Every product, read fresh from the backing file.
    pub async fn list_all(&self) -> Result<Vec<Product>, ServiceError> {
        json_file::read_json::<Vec<Product>>(&self.file_path)
            .await?
            .ok_or_else(|| ServiceError::not_found("product file"))
    }

    /// Look up a product in the in-memory catalog.
    pub async fn find_by_id(&self, id: u64) -> Option<Product> {
        let products = self.products.read().await;
        products.iter().find(|p| p.id == id).cloned()
    }

    /// Validate and append a new product with the next sequential id.
    pub async fn create(&self, candidate: NewProduct) -> Result<Product, ServiceError> {
        if let Err(e) = candidate.validate() {
            warn!(code = %candidate.code, error = %e, "product rejected");
            return Err(e);
        }

        let res = self
            .mutate(|products| {
                if products.iter().any(|p| p.code == candidate.code) {
                    return Err(ServiceError::validation(format!(
                        "product with code {} already exists",
                        candidate.code
                    )));
                }
                let product = candidate.into_product(next_id(products)?)?;
                products.push(product.clone());
                Ok(Outcome::Changed(product))
            })
            .await;

        match &res {
            Ok(p) => info!(id = p.id, code = %p.code, "product created"),
            Err(e) => warn!(error = %e, kind = e.kind(), "product create failed"),
        }
        res
    }

    /// Merge `patch` onto product `id`. `Ok(None)` when no such product.
    pub async fn update(&self, id: u64, patch: ProductPatch) -> Result<Option<Product>, ServiceError> {
        patch.validate()?;

        let res = self
            .mutate(|products| {
                let Some(existing) = products.iter_mut().find(|p| p.id == id) else {
                    return Ok(Outcome::Unchanged(None));
                };
                if patch.is_empty() {
                    return Ok(Outcome::Unchanged(Some(existing.clone())));
                }
                patch.apply(existing)?;
                Ok(Outcome::Changed(Some(existing.clone())))
            })
            .await;

        match &res {
            Ok(Some(_)) => info!(id, "product updated"),
            Ok(None) => debug!(id, "update skipped; product not found"),
            Err(e) => warn!(id, error = %e, kind = e.kind(), "product update failed"),
        }
        res
    }

    /// Remove product `id`; returns whether it existed.
    pub async fn delete(&self, id: u64) -> Result<bool, ServiceError> {
        let res = self
            .mutate(|products| {
                let Some(idx) = products.iter().position(|p| p.id == id) else {
                    return Ok(Outcome::Unchanged(false));
                };
                products.remove(idx);
                Ok(Outcome::Changed(true))
            })
            .await;

        match &res {
            Ok(true) => info!(id, "product deleted"),
            Ok(false) => debug!(id, "delete skipped; product not found"),
            Err(e) => warn!(id, error = %e, kind = e.kind(), "product delete failed"),
        }
        res
    }

    /// Wait for any in-flight mutation and log the final state.
    pub async fn shutdown(&self) {
        let products = self.products.write().await;
        info!(path = %self.file_path.display(), count = products.len(), "product store closed");
    }

    async fn persist(&self, products: &[Product]) -> Result<(), ServiceError> {
        json_file::write_json_atomic(&self.file_path, products).await?;
        debug!(path = %self.file_path.display(), count = products.len(), "product catalog written");
        Ok(())
    }

    /// Apply `f` to a copy of the catalog; write it and commit only on success.
    async fn mutate<R, F>(&self, f: F) -> Result<R, ServiceError>
    where
        F: FnOnce(&mut Vec<Product>) -> Result<Outcome<R>, ServiceError>,
    {
        let mut current = self.products.write().await;
        let mut staged = current.clone();
        match f(&mut staged)? {
            Outcome::Unchanged(r) => Ok(r),
            Outcome::Changed(r) => {
                self.persist(&staged).await?;
                *current = staged;
                Ok(r)
            }
        }
    }
}

/// One more than the largest id, or 1 for an empty catalog.
fn next_id(products: &[Product]) -> Result<u64, ServiceError> {
    match products.iter().map(|p| p.id).max() {
        None => Ok(1),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| ServiceError::validation("id space exhausted")),
    }
}

/// Records loaded from disk must satisfy the creation rules and be unique.
fn check_records(products: &[Product]) -> Result<(), String> {
    let mut ids = HashSet::new();
    let mut codes = HashSet::new();
    for p in products {
        p.validate().map_err(|e| format!("product {}: {e}", p.id))?;
        if !ids.insert(p.id) {
            return Err(format!("duplicate id {}", p.id));
        }
        if !codes.insert(p.code.as_str()) {
            return Err(format!("duplicate code {}", p.code));
        }
    }
    Ok(())
}
