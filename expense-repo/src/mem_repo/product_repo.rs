use crate::ids::{CategoryId, ProductCategoryId, ProductId};
use crate::mem_repo::MemRepo;
use crate::product_repo::ProductRepoError::{
    AlreadyInCategory, CategoryNotFound, CodeAlreadyExists, NotInCategory, ProductNotFound,
};
use crate::product_repo::{NewProduct, Product, ProductCategory, ProductRepo, ProductRepoError};
use crate::status::RecordStatus;
use async_trait::async_trait;
use chrono::Utc;

#[async_trait]
impl ProductRepo for MemRepo {
    async fn create_product(&self, new_product: NewProduct) -> Result<Product, ProductRepoError> {
        new_product.check_lengths()?;
        let mut write_guard = self.write_lock()?;

        if write_guard
            .products
            .values()
            .any(|p| p.code == new_product.code)
        {
            return Err(CodeAlreadyExists(new_product.code));
        }

        let now = Utc::now();
        let product = Product {
            id: ProductId::generate(),
            code: new_product.code,
            name: new_product.name,
            description: new_product.description,
            price: new_product.price,
            status: new_product.status,
            created_at: now,
            updated_at: now,
        };
        write_guard.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn get_product(&self, product_id: ProductId) -> Result<Product, ProductRepoError> {
        let read_guard = self.read_lock()?;

        read_guard
            .products
            .get(&product_id)
            .cloned()
            .ok_or(ProductNotFound(product_id))
    }

    async fn get_all_products(&self) -> Result<Vec<Product>, ProductRepoError> {
        let read_guard = self.read_lock()?;

        let mut products: Vec<Product> = read_guard.products.values().cloned().collect();
        products.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(products)
    }

    async fn update_product(
        &self,
        product_id: ProductId,
        updated_product: NewProduct,
    ) -> Result<Product, ProductRepoError> {
        updated_product.check_lengths()?;
        let mut write_guard = self.write_lock()?;

        if !write_guard.products.contains_key(&product_id) {
            return Err(ProductNotFound(product_id));
        }
        if write_guard
            .products
            .values()
            .any(|p| p.id != product_id && p.code == updated_product.code)
        {
            return Err(CodeAlreadyExists(updated_product.code));
        }

        let product = write_guard
            .products
            .get_mut(&product_id)
            .ok_or(ProductNotFound(product_id))?;
        product.code = updated_product.code;
        product.name = updated_product.name;
        product.description = updated_product.description;
        product.price = updated_product.price;
        product.status = updated_product.status;
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn delete_product(&self, product_id: ProductId) -> Result<Product, ProductRepoError> {
        let mut write_guard = self.write_lock()?;

        let product = write_guard
            .products
            .remove(&product_id)
            .ok_or(ProductNotFound(product_id))?;
        write_guard
            .product_categories
            .retain(|_, link| link.product_id != product_id);
        write_guard
            .applicable_products
            .retain(|_, link| link.product_id != product_id);
        Ok(product)
    }

    async fn add_category(
        &self,
        product_id: ProductId,
        category_id: CategoryId,
        status: RecordStatus,
    ) -> Result<ProductCategory, ProductRepoError> {
        let mut write_guard = self.write_lock()?;

        if !write_guard.products.contains_key(&product_id) {
            return Err(ProductNotFound(product_id));
        }
        if !write_guard.categories.contains_key(&category_id) {
            return Err(CategoryNotFound(category_id));
        }
        if write_guard
            .product_categories
            .values()
            .any(|l| l.product_id == product_id && l.category_id == category_id)
        {
            return Err(AlreadyInCategory {
                product_id,
                category_id,
            });
        }

        let now = Utc::now();
        let link = ProductCategory {
            id: ProductCategoryId::generate(),
            product_id,
            category_id,
            status,
            created_at: now,
            updated_at: now,
        };
        write_guard.product_categories.insert(link.id, link.clone());
        Ok(link)
    }

    async fn remove_category(
        &self,
        product_id: ProductId,
        category_id: CategoryId,
    ) -> Result<ProductCategory, ProductRepoError> {
        let mut write_guard = self.write_lock()?;

        let link_id = write_guard
            .product_categories
            .values()
            .find(|l| l.product_id == product_id && l.category_id == category_id)
            .map(|l| l.id)
            .ok_or(NotInCategory {
                product_id,
                category_id,
            })?;
        write_guard
            .product_categories
            .remove(&link_id)
            .ok_or(NotInCategory {
                product_id,
                category_id,
            })
    }

    async fn get_product_categories(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductCategory>, ProductRepoError> {
        let read_guard = self.read_lock()?;

        if !read_guard.products.contains_key(&product_id) {
            return Err(ProductNotFound(product_id));
        }
        let mut links: Vec<ProductCategory> = read_guard
            .product_categories
            .values()
            .filter(|l| l.product_id == product_id)
            .cloned()
            .collect();
        links.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(links)
    }
}
