use async_trait::async_trait;
use std::sync::Arc;

pub mod category_repo;
pub mod category_tree;
pub mod expense_repo;
pub mod ids;
pub mod limits;
pub mod migration;
pub mod product_repo;
pub mod promotion_repo;
pub mod status;
pub mod user_repo;

// implementation modules
pub mod mem_repo;
pub mod sqlx_repo;

use category_repo::CategoryRepo;
use expense_repo::ExpenseRepo;
use product_repo::ProductRepo;
use promotion_repo::PromotionRepo;
use user_repo::UserRepo;

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn check(&self) -> bool;
}

/// Every repository, backed by the same store
#[derive(Clone)]
pub struct Repos {
    pub user_repo: Arc<dyn UserRepo>,
    pub expense_repo: Arc<dyn ExpenseRepo>,
    pub category_repo: Arc<dyn CategoryRepo>,
    pub product_repo: Arc<dyn ProductRepo>,
    pub promotion_repo: Arc<dyn PromotionRepo>,
    pub health_check: Arc<dyn HealthCheck>,
}

impl Repos {
    fn from_store<S>(store: Arc<S>) -> Repos
    where
        S: UserRepo + ExpenseRepo + CategoryRepo + ProductRepo + PromotionRepo + HealthCheck + 'static,
    {
        Repos {
            user_repo: store.clone(),
            expense_repo: store.clone(),
            category_repo: store.clone(),
            product_repo: store.clone(),
            promotion_repo: store.clone(),
            health_check: store,
        }
    }
}
