use crate::ids::{
    CategoryId, Money, ProductId, PromotionApplicableCategoryId, PromotionApplicableProductId,
    PromotionId, PromotionRuleId,
};
use crate::limits::{check_length, TooLong, MAX_TEXT_LENGTH};
use crate::status::varchar_enum;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

varchar_enum!(PromotionStatus {
    Draft => "draft",
    Active => "active",
    Paused => "paused",
    Expired => "expired",
});

varchar_enum!(DiscountType {
    Percentage => "percentage",
    FixedAmount => "fixed_amount",
});

varchar_enum!(
    /// What a rule's thresholds are measured against
    RuleScope {
        Order => "order",
        Product => "product",
        Category => "category",
    }
);

#[derive(Clone, PartialEq, Debug)]
pub struct Promotion {
    pub id: PromotionId,
    pub name: String,
    pub status: PromotionStatus,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub discount_type: DiscountType,
    pub discount_value: Money,
    pub max_discount_amount: Option<Money>,
    pub priority: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewPromotion {
    pub name: String,
    pub status: PromotionStatus,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub discount_type: DiscountType,
    pub discount_value: Money,
    pub max_discount_amount: Option<Money>,
    #[serde(default)]
    pub priority: i32,
}

impl NewPromotion {
    pub fn check_lengths(&self) -> Result<(), TooLong> {
        check_length("name", &self.name, MAX_TEXT_LENGTH)
    }

    /// A promotion cannot end before it starts
    pub fn check_schedule(&self) -> Result<(), PromotionRepoError> {
        match self.ends_at {
            Some(ends_at) if ends_at < self.starts_at => Err(PromotionRepoError::InvalidSchedule {
                starts_at: self.starts_at,
                ends_at,
            }),
            _ => Ok(()),
        }
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct PromotionRule {
    pub id: PromotionRuleId,
    pub promotion_id: PromotionId,
    pub scope: RuleScope,
    pub min_qty: Option<i32>,
    pub min_amount: Option<Money>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewPromotionRule {
    pub scope: RuleScope,
    pub min_qty: Option<i32>,
    pub min_amount: Option<Money>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct PromotionApplicableProduct {
    pub id: PromotionApplicableProductId,
    pub promotion_id: PromotionId,
    pub product_id: ProductId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, PartialEq, Debug)]
pub struct PromotionApplicableCategory {
    pub id: PromotionApplicableCategoryId,
    pub promotion_id: PromotionId,
    pub category_id: CategoryId,
    pub include_children: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Error, Debug)]
pub enum PromotionRepoError {
    #[error("Promotion with id {0} not found")]
    PromotionNotFound(PromotionId),
    #[error("Rule with id {0} not found")]
    RuleNotFound(PromotionRuleId),
    #[error("Product with id {0} not found")]
    ProductNotFound(ProductId),
    #[error("Category with id {0} not found")]
    CategoryNotFound(CategoryId),
    #[error("Promotion ends at {ends_at} before it starts at {starts_at}")]
    InvalidSchedule {
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    },
    #[error("Product {product_id} already applies to promotion {promotion_id}")]
    ProductAlreadyApplicable {
        promotion_id: PromotionId,
        product_id: ProductId,
    },
    #[error("Product {product_id} does not apply to promotion {promotion_id}")]
    ProductNotApplicable {
        promotion_id: PromotionId,
        product_id: ProductId,
    },
    #[error("Category {category_id} already applies to promotion {promotion_id}")]
    CategoryAlreadyApplicable {
        promotion_id: PromotionId,
        category_id: CategoryId,
    },
    #[error("Category {category_id} does not apply to promotion {promotion_id}")]
    CategoryNotApplicable {
        promotion_id: PromotionId,
        category_id: CategoryId,
    },
    #[error(transparent)]
    TooLong(#[from] TooLong),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[async_trait]
pub trait PromotionRepo: Sync + Send {
    async fn create_promotion(
        &self,
        new_promotion: NewPromotion,
    ) -> Result<Promotion, PromotionRepoError>;

    async fn get_promotion(&self, promotion_id: PromotionId)
        -> Result<Promotion, PromotionRepoError>;

    /// Highest priority first, then by start
    async fn get_all_promotions(&self) -> Result<Vec<Promotion>, PromotionRepoError>;

    async fn update_promotion(
        &self,
        promotion_id: PromotionId,
        updated_promotion: NewPromotion,
    ) -> Result<Promotion, PromotionRepoError>;

    /// Also deletes the promotion's rules and applicable products and categories
    async fn delete_promotion(
        &self,
        promotion_id: PromotionId,
    ) -> Result<Promotion, PromotionRepoError>;

    async fn add_rule(
        &self,
        promotion_id: PromotionId,
        new_rule: NewPromotionRule,
    ) -> Result<PromotionRule, PromotionRepoError>;

    async fn get_rules(
        &self,
        promotion_id: PromotionId,
    ) -> Result<Vec<PromotionRule>, PromotionRepoError>;

    async fn delete_rule(
        &self,
        promotion_id: PromotionId,
        rule_id: PromotionRuleId,
    ) -> Result<PromotionRule, PromotionRepoError>;

    async fn add_applicable_product(
        &self,
        promotion_id: PromotionId,
        product_id: ProductId,
    ) -> Result<PromotionApplicableProduct, PromotionRepoError>;

    async fn get_applicable_products(
        &self,
        promotion_id: PromotionId,
    ) -> Result<Vec<PromotionApplicableProduct>, PromotionRepoError>;

    async fn remove_applicable_product(
        &self,
        promotion_id: PromotionId,
        product_id: ProductId,
    ) -> Result<PromotionApplicableProduct, PromotionRepoError>;

    async fn add_applicable_category(
        &self,
        promotion_id: PromotionId,
        category_id: CategoryId,
        include_children: bool,
    ) -> Result<PromotionApplicableCategory, PromotionRepoError>;

    async fn get_applicable_categories(
        &self,
        promotion_id: PromotionId,
    ) -> Result<Vec<PromotionApplicableCategory>, PromotionRepoError>;

    async fn remove_applicable_category(
        &self,
        promotion_id: PromotionId,
        category_id: CategoryId,
    ) -> Result<PromotionApplicableCategory, PromotionRepoError>;
}
