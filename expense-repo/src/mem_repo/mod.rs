use crate::category_repo::Category;
use crate::expense_repo::Expense;
use crate::ids::{
    CategoryId, ExpenseId, ProductCategoryId, ProductId, PromotionApplicableCategoryId,
    PromotionApplicableProductId, PromotionId, PromotionRuleId, UserId,
};
use crate::product_repo::{Product, ProductCategory};
use crate::promotion_repo::{
    Promotion, PromotionApplicableCategory, PromotionApplicableProduct, PromotionRule,
};
use crate::user_repo::User;
use crate::{HealthCheck, Repos};
use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

mod category_repo;
mod expense_repo;
mod product_repo;
mod promotion_repo;
mod user_repo;

/// Every table of the database. Foreign key cascades are applied by hand on delete.
#[derive(Default)]
struct State {
    users: HashMap<UserId, User>,
    expenses: HashMap<ExpenseId, Expense>,
    categories: HashMap<CategoryId, Category>,
    products: HashMap<ProductId, Product>,
    product_categories: HashMap<ProductCategoryId, ProductCategory>,
    promotions: HashMap<PromotionId, Promotion>,
    promotion_rules: HashMap<PromotionRuleId, PromotionRule>,
    applicable_products: HashMap<PromotionApplicableProductId, PromotionApplicableProduct>,
    applicable_categories: HashMap<PromotionApplicableCategoryId, PromotionApplicableCategory>,
}

pub struct MemRepo {
    state: RwLock<State>,
}

impl MemRepo {
    pub fn new() -> MemRepo {
        MemRepo {
            state: RwLock::new(State::default()),
        }
    }

    fn read_lock(&self) -> Result<RwLockReadGuard<State>, anyhow::Error> {
        self.state
            .read()
            .map_err(|_| anyhow!("Unable to acquire lock"))
    }

    fn write_lock(&self) -> Result<RwLockWriteGuard<State>, anyhow::Error> {
        self.state
            .write()
            .map_err(|_| anyhow!("Unable to acquire lock"))
    }
}

impl Default for MemRepo {
    fn default() -> Self {
        MemRepo::new()
    }
}

#[async_trait]
impl HealthCheck for MemRepo {
    async fn check(&self) -> bool {
        self.read_lock().is_ok()
    }
}

pub fn create_repos() -> Repos {
    Repos::from_store(Arc::new(MemRepo::new()))
}
