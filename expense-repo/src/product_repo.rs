use crate::ids::{CategoryId, Money, ProductCategoryId, ProductId};
use crate::limits::{check_length, TooLong, MAX_CODE_LENGTH, MAX_TEXT_LENGTH};
use crate::status::RecordStatus;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, PartialEq, Debug)]
pub struct Product {
    pub id: ProductId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewProduct {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    #[serde(default)]
    pub status: RecordStatus,
}

impl NewProduct {
    pub fn check_lengths(&self) -> Result<(), TooLong> {
        check_length("code", &self.code, MAX_CODE_LENGTH)?;
        check_length("name", &self.name, MAX_TEXT_LENGTH)
    }
}

/// Link between a product and one of its categories. A product is linked at most once to a given
/// category.
#[derive(Clone, PartialEq, Debug)]
pub struct ProductCategory {
    pub id: ProductCategoryId,
    pub product_id: ProductId,
    pub category_id: CategoryId,
    pub status: RecordStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Error, Debug)]
pub enum ProductRepoError {
    #[error("Product with id {0} not found")]
    ProductNotFound(ProductId),
    #[error("Category with id {0} not found")]
    CategoryNotFound(CategoryId),
    #[error("Product with code {0} already exists")]
    CodeAlreadyExists(String),
    #[error(transparent)]
    TooLong(#[from] TooLong),
    #[error("Product {product_id} is already in category {category_id}")]
    AlreadyInCategory {
        product_id: ProductId,
        category_id: CategoryId,
    },
    #[error("Product {product_id} is not in category {category_id}")]
    NotInCategory {
        product_id: ProductId,
        category_id: CategoryId,
    },
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait ProductRepo: Sync + Send {
    async fn create_product(&self, new_product: NewProduct) -> Result<Product, ProductRepoError>;

    async fn get_product(&self, product_id: ProductId) -> Result<Product, ProductRepoError>;

    /// Ordered by code
    async fn get_all_products(&self) -> Result<Vec<Product>, ProductRepoError>;

    async fn update_product(
        &self,
        product_id: ProductId,
        updated_product: NewProduct,
    ) -> Result<Product, ProductRepoError>;

    /// Also removes the product from its categories and from promotions
    async fn delete_product(&self, product_id: ProductId) -> Result<Product, ProductRepoError>;

    async fn add_category(
        &self,
        product_id: ProductId,
        category_id: CategoryId,
        status: RecordStatus,
    ) -> Result<ProductCategory, ProductRepoError>;

    async fn remove_category(
        &self,
        product_id: ProductId,
        category_id: CategoryId,
    ) -> Result<ProductCategory, ProductRepoError>;

    async fn get_product_categories(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductCategory>, ProductRepoError>;
}
