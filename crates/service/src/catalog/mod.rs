//! Product catalog: domain model, validation and the file-backed store.

pub mod product;
pub mod repository;
pub mod store;

pub use product::{NewProduct, Product, ProductPatch};
pub use repository::ProductRepository;
pub use store::{LoadState, ProductStore};
