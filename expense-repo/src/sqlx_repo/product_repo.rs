use crate::ids::{CategoryId, Money, ProductCategoryId, ProductId};
use crate::product_repo::ProductRepoError::{
    AlreadyInCategory, CategoryNotFound, CodeAlreadyExists, NotInCategory, ProductNotFound,
};
use crate::product_repo::{NewProduct, Product, ProductCategory, ProductRepo, ProductRepoError};
use crate::sqlx_repo::{is_foreign_key_violation, is_unique_violation, violated_constraint, SQLxRepo};
use crate::status::RecordStatus;
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::query_as;
use tracing::instrument;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct ProductEntry {
    id: Uuid,
    code: String,
    name: String,
    description: Option<String>,
    price: Decimal,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductEntry> for Product {
    type Error = anyhow::Error;

    fn try_from(value: ProductEntry) -> Result<Self, Self::Error> {
        Ok(Product {
            id: value.id.into(),
            code: value.code,
            name: value.name,
            description: value.description,
            price: Money::new(value.price)?,
            status: value.status.parse()?,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProductCategoryEntry {
    id: Uuid,
    product_id: Uuid,
    category_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductCategoryEntry> for ProductCategory {
    type Error = anyhow::Error;

    fn try_from(value: ProductCategoryEntry) -> Result<Self, Self::Error> {
        Ok(ProductCategory {
            id: ProductCategoryId::from(value.id),
            product_id: value.product_id.into(),
            category_id: value.category_id.into(),
            status: value.status.parse()?,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[async_trait]
impl ProductRepo for SQLxRepo {
    #[instrument(skip(self, new_product), fields(code = %new_product.code))]
    async fn create_product(&self, new_product: NewProduct) -> Result<Product, ProductRepoError> {
        new_product.check_lengths()?;
        let result: Result<ProductEntry, sqlx::Error> = query_as(
            "INSERT INTO products(id, code, name, description, price, status) VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(ProductId::generate().as_uuid())
        .bind(&new_product.code)
        .bind(&new_product.name)
        .bind(&new_product.description)
        .bind(new_product.price.amount())
        .bind(new_product.status.as_str())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(entry) => Ok(entry.try_into()?),
            Err(e) if is_unique_violation(&e) => Err(CodeAlreadyExists(new_product.code)),
            Err(e) => Err(anyhow::Error::new(e)
                .context("Unable to insert product")
                .into()),
        }
    }

    #[instrument(skip(self))]
    async fn get_product(&self, product_id: ProductId) -> Result<Product, ProductRepoError> {
        let entry: Option<ProductEntry> = query_as("SELECT * FROM products WHERE id = $1")
            .bind(product_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Unable to get product {}", product_id))?;
        let entry = entry.ok_or(ProductNotFound(product_id))?;
        Ok(entry.try_into()?)
    }

    #[instrument(skip(self))]
    async fn get_all_products(&self) -> Result<Vec<Product>, ProductRepoError> {
        let entries: Vec<ProductEntry> = query_as("SELECT * FROM products ORDER BY code")
            .fetch_all(&self.pool)
            .await
            .context("Unable to get products")?;
        let products = entries
            .into_iter()
            .map(Product::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(products)
    }

    #[instrument(skip(self, updated_product))]
    async fn update_product(
        &self,
        product_id: ProductId,
        updated_product: NewProduct,
    ) -> Result<Product, ProductRepoError> {
        updated_product.check_lengths()?;
        let result: Result<Option<ProductEntry>, sqlx::Error> = query_as(
            "UPDATE products SET code = $1, name = $2, description = $3, price = $4, status = $5, updated_at = NOW() WHERE id = $6 RETURNING *",
        )
        .bind(&updated_product.code)
        .bind(&updated_product.name)
        .bind(&updated_product.description)
        .bind(updated_product.price.amount())
        .bind(updated_product.status.as_str())
        .bind(product_id.as_uuid())
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(entry)) => Ok(entry.try_into()?),
            Ok(None) => Err(ProductNotFound(product_id)),
            Err(e) if is_unique_violation(&e) => Err(CodeAlreadyExists(updated_product.code)),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("Unable to update product {}", product_id))
                .into()),
        }
    }

    #[instrument(skip(self))]
    async fn delete_product(&self, product_id: ProductId) -> Result<Product, ProductRepoError> {
        let entry: Option<ProductEntry> =
            query_as("DELETE FROM products WHERE id = $1 RETURNING *")
                .bind(product_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("Unable to delete product {}", product_id))?;
        let entry = entry.ok_or(ProductNotFound(product_id))?;
        Ok(entry.try_into()?)
    }

    #[instrument(skip(self))]
    async fn add_category(
        &self,
        product_id: ProductId,
        category_id: CategoryId,
        status: RecordStatus,
    ) -> Result<ProductCategory, ProductRepoError> {
        let result: Result<ProductCategoryEntry, sqlx::Error> = query_as(
            "INSERT INTO product_categories(id, product_id, category_id, status) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(ProductCategoryId::generate().as_uuid())
        .bind(product_id.as_uuid())
        .bind(category_id.as_uuid())
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(entry) => Ok(entry.try_into()?),
            Err(e) if is_unique_violation(&e) => Err(AlreadyInCategory {
                product_id,
                category_id,
            }),
            Err(e) if is_foreign_key_violation(&e) => {
                if violated_constraint(&e) == Some("product_categories_product_id_fkey") {
                    Err(ProductNotFound(product_id))
                } else {
                    Err(CategoryNotFound(category_id))
                }
            }
            Err(e) => Err(anyhow::Error::new(e)
                .context("Unable to add product to category")
                .into()),
        }
    }

    #[instrument(skip(self))]
    async fn remove_category(
        &self,
        product_id: ProductId,
        category_id: CategoryId,
    ) -> Result<ProductCategory, ProductRepoError> {
        let entry: Option<ProductCategoryEntry> = query_as(
            "DELETE FROM product_categories WHERE product_id = $1 AND category_id = $2 RETURNING *",
        )
        .bind(product_id.as_uuid())
        .bind(category_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .context("Unable to remove product from category")?;
        let entry = entry.ok_or(NotInCategory {
            product_id,
            category_id,
        })?;
        Ok(entry.try_into()?)
    }

    #[instrument(skip(self))]
    async fn get_product_categories(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductCategory>, ProductRepoError> {
        self.get_product(product_id).await?;
        let entries: Vec<ProductCategoryEntry> = query_as(
            "SELECT * FROM product_categories WHERE product_id = $1 ORDER BY created_at, id",
        )
        .bind(product_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Unable to get categories of product {}", product_id))?;
        let links = entries
            .into_iter()
            .map(ProductCategory::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(links)
    }
}
