use crate::ids::{
    CategoryId, Money, ProductId, PromotionApplicableCategoryId, PromotionApplicableProductId,
    PromotionId, PromotionRuleId,
};
use crate::promotion_repo::PromotionRepoError::{
    CategoryAlreadyApplicable, CategoryNotApplicable, CategoryNotFound, ProductAlreadyApplicable,
    ProductNotApplicable, ProductNotFound, PromotionNotFound, RuleNotFound,
};
use crate::promotion_repo::{
    NewPromotion, NewPromotionRule, Promotion, PromotionApplicableCategory,
    PromotionApplicableProduct, PromotionRepo, PromotionRepoError, PromotionRule,
};
use crate::sqlx_repo::{is_foreign_key_violation, is_unique_violation, violated_constraint, SQLxRepo};
use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::query_as;
use tracing::instrument;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct PromotionEntry {
    id: Uuid,
    name: String,
    status: String,
    starts_at: DateTime<Utc>,
    ends_at: Option<DateTime<Utc>>,
    discount_type: String,
    discount_value: Decimal,
    max_discount_amount: Option<Decimal>,
    priority: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PromotionEntry> for Promotion {
    type Error = anyhow::Error;

    fn try_from(value: PromotionEntry) -> Result<Self, Self::Error> {
        Ok(Promotion {
            id: value.id.into(),
            name: value.name,
            status: value.status.parse()?,
            starts_at: value.starts_at,
            ends_at: value.ends_at,
            discount_type: value.discount_type.parse()?,
            discount_value: Money::new(value.discount_value)?,
            max_discount_amount: value.max_discount_amount.map(Money::new).transpose()?,
            priority: value.priority,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RuleEntry {
    id: Uuid,
    promotion_id: Uuid,
    scope: String,
    min_qty: Option<i32>,
    min_amount: Option<Decimal>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RuleEntry> for PromotionRule {
    type Error = anyhow::Error;

    fn try_from(value: RuleEntry) -> Result<Self, Self::Error> {
        Ok(PromotionRule {
            id: value.id.into(),
            promotion_id: value.promotion_id.into(),
            scope: value.scope.parse()?,
            min_qty: value.min_qty,
            min_amount: value.min_amount.map(Money::new).transpose()?,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ApplicableProductEntry {
    id: Uuid,
    promotion_id: Uuid,
    product_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ApplicableProductEntry> for PromotionApplicableProduct {
    fn from(value: ApplicableProductEntry) -> Self {
        PromotionApplicableProduct {
            id: value.id.into(),
            promotion_id: value.promotion_id.into(),
            product_id: value.product_id.into(),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ApplicableCategoryEntry {
    id: Uuid,
    promotion_id: Uuid,
    category_id: Uuid,
    include_children: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ApplicableCategoryEntry> for PromotionApplicableCategory {
    fn from(value: ApplicableCategoryEntry) -> Self {
        PromotionApplicableCategory {
            id: value.id.into(),
            promotion_id: value.promotion_id.into(),
            category_id: value.category_id.into(),
            include_children: value.include_children,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

fn to_promotions(entries: Vec<PromotionEntry>) -> Result<Vec<Promotion>, PromotionRepoError> {
    let promotions = entries
        .into_iter()
        .map(Promotion::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(promotions)
}

#[async_trait]
impl PromotionRepo for SQLxRepo {
    #[instrument(skip(self, new_promotion), fields(name = %new_promotion.name))]
    async fn create_promotion(
        &self,
        new_promotion: NewPromotion,
    ) -> Result<Promotion, PromotionRepoError> {
        new_promotion.check_lengths()?;
        new_promotion.check_schedule()?;

        let entry: PromotionEntry = query_as(
            "INSERT INTO promotions(id, name, status, starts_at, ends_at, discount_type, discount_value, max_discount_amount, priority) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING *",
        )
        .bind(PromotionId::generate().as_uuid())
        .bind(&new_promotion.name)
        .bind(new_promotion.status.as_str())
        .bind(new_promotion.starts_at)
        .bind(new_promotion.ends_at)
        .bind(new_promotion.discount_type.as_str())
        .bind(new_promotion.discount_value.amount())
        .bind(new_promotion.max_discount_amount.map(|m| m.amount()))
        .bind(new_promotion.priority)
        .fetch_one(&self.pool)
        .await
        .context("Unable to insert promotion")?;
        Ok(entry.try_into()?)
    }

    #[instrument(skip(self))]
    async fn get_promotion(
        &self,
        promotion_id: PromotionId,
    ) -> Result<Promotion, PromotionRepoError> {
        let entry: Option<PromotionEntry> = query_as("SELECT * FROM promotions WHERE id = $1")
            .bind(promotion_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("Unable to get promotion {}", promotion_id))?;
        let entry = entry.ok_or(PromotionNotFound(promotion_id))?;
        Ok(entry.try_into()?)
    }

    #[instrument(skip(self))]
    async fn get_all_promotions(&self) -> Result<Vec<Promotion>, PromotionRepoError> {
        let entries: Vec<PromotionEntry> =
            query_as("SELECT * FROM promotions ORDER BY priority DESC, starts_at, id")
                .fetch_all(&self.pool)
                .await
                .context("Unable to get promotions")?;
        to_promotions(entries)
    }

    #[instrument(skip(self, updated_promotion))]
    async fn update_promotion(
        &self,
        promotion_id: PromotionId,
        updated_promotion: NewPromotion,
    ) -> Result<Promotion, PromotionRepoError> {
        updated_promotion.check_lengths()?;
        updated_promotion.check_schedule()?;

        let entry: Option<PromotionEntry> = query_as(
            "UPDATE promotions SET name = $1, status = $2, starts_at = $3, ends_at = $4, discount_type = $5, \
             discount_value = $6, max_discount_amount = $7, priority = $8, updated_at = NOW() WHERE id = $9 RETURNING *",
        )
        .bind(&updated_promotion.name)
        .bind(updated_promotion.status.as_str())
        .bind(updated_promotion.starts_at)
        .bind(updated_promotion.ends_at)
        .bind(updated_promotion.discount_type.as_str())
        .bind(updated_promotion.discount_value.amount())
        .bind(updated_promotion.max_discount_amount.map(|m| m.amount()))
        .bind(updated_promotion.priority)
        .bind(promotion_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Unable to update promotion {}", promotion_id))?;
        let entry = entry.ok_or(PromotionNotFound(promotion_id))?;
        Ok(entry.try_into()?)
    }

    #[instrument(skip(self))]
    async fn delete_promotion(
        &self,
        promotion_id: PromotionId,
    ) -> Result<Promotion, PromotionRepoError> {
        // rules and applicability rows cascade
        let entry: Option<PromotionEntry> =
            query_as("DELETE FROM promotions WHERE id = $1 RETURNING *")
                .bind(promotion_id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("Unable to delete promotion {}", promotion_id))?;
        let entry = entry.ok_or(PromotionNotFound(promotion_id))?;
        Ok(entry.try_into()?)
    }

    #[instrument(skip(self, new_rule))]
    async fn add_rule(
        &self,
        promotion_id: PromotionId,
        new_rule: NewPromotionRule,
    ) -> Result<PromotionRule, PromotionRepoError> {
        let result: Result<RuleEntry, sqlx::Error> = query_as(
            "INSERT INTO promotion_rules(id, promotion_id, scope, min_qty, min_amount) VALUES ($1, $2, $3, $4, $5) RETURNING *",
        )
        .bind(PromotionRuleId::generate().as_uuid())
        .bind(promotion_id.as_uuid())
        .bind(new_rule.scope.as_str())
        .bind(new_rule.min_qty)
        .bind(new_rule.min_amount.map(|m| m.amount()))
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(entry) => Ok(entry.try_into()?),
            Err(e) if is_foreign_key_violation(&e) => Err(PromotionNotFound(promotion_id)),
            Err(e) => Err(anyhow::Error::new(e)
                .context("Unable to insert promotion rule")
                .into()),
        }
    }

    #[instrument(skip(self))]
    async fn get_rules(
        &self,
        promotion_id: PromotionId,
    ) -> Result<Vec<PromotionRule>, PromotionRepoError> {
        self.get_promotion(promotion_id).await?;
        let entries: Vec<RuleEntry> = query_as(
            "SELECT * FROM promotion_rules WHERE promotion_id = $1 ORDER BY created_at, id",
        )
        .bind(promotion_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("Unable to get rules of promotion {}", promotion_id))?;
        let rules = entries
            .into_iter()
            .map(PromotionRule::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rules)
    }

    #[instrument(skip(self))]
    async fn delete_rule(
        &self,
        promotion_id: PromotionId,
        rule_id: PromotionRuleId,
    ) -> Result<PromotionRule, PromotionRepoError> {
        let entry: Option<RuleEntry> = query_as(
            "DELETE FROM promotion_rules WHERE id = $1 AND promotion_id = $2 RETURNING *",
        )
        .bind(rule_id.as_uuid())
        .bind(promotion_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Unable to delete rule {}", rule_id))?;
        let entry = entry.ok_or(RuleNotFound(rule_id))?;
        Ok(entry.try_into()?)
    }

    #[instrument(skip(self))]
    async fn add_applicable_product(
        &self,
        promotion_id: PromotionId,
        product_id: ProductId,
    ) -> Result<PromotionApplicableProduct, PromotionRepoError> {
        let result: Result<ApplicableProductEntry, sqlx::Error> = query_as(
            "INSERT INTO promotion_applicable_products(id, promotion_id, product_id) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(PromotionApplicableProductId::generate().as_uuid())
        .bind(promotion_id.as_uuid())
        .bind(product_id.as_uuid())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(entry) => Ok(entry.into()),
            Err(e) if is_unique_violation(&e) => Err(ProductAlreadyApplicable {
                promotion_id,
                product_id,
            }),
            Err(e) if is_foreign_key_violation(&e) => {
                if violated_constraint(&e)
                    == Some("promotion_applicable_products_promotion_id_fkey")
                {
                    Err(PromotionNotFound(promotion_id))
                } else {
                    Err(ProductNotFound(product_id))
                }
            }
            Err(e) => Err(anyhow::Error::new(e)
                .context("Unable to add applicable product")
                .into()),
        }
    }

    #[instrument(skip(self))]
    async fn get_applicable_products(
        &self,
        promotion_id: PromotionId,
    ) -> Result<Vec<PromotionApplicableProduct>, PromotionRepoError> {
        self.get_promotion(promotion_id).await?;
        let entries: Vec<ApplicableProductEntry> = query_as(
            "SELECT * FROM promotion_applicable_products WHERE promotion_id = $1 ORDER BY created_at, id",
        )
        .bind(promotion_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .context("Unable to get applicable products")?;
        Ok(entries.into_iter().map(|e| e.into()).collect())
    }

    #[instrument(skip(self))]
    async fn remove_applicable_product(
        &self,
        promotion_id: PromotionId,
        product_id: ProductId,
    ) -> Result<PromotionApplicableProduct, PromotionRepoError> {
        let entry: Option<ApplicableProductEntry> = query_as(
            "DELETE FROM promotion_applicable_products WHERE promotion_id = $1 AND product_id = $2 RETURNING *",
        )
        .bind(promotion_id.as_uuid())
        .bind(product_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .context("Unable to remove applicable product")?;
        let entry = entry.ok_or(ProductNotApplicable {
            promotion_id,
            product_id,
        })?;
        Ok(entry.into())
    }

    #[instrument(skip(self))]
    async fn add_applicable_category(
        &self,
        promotion_id: PromotionId,
        category_id: CategoryId,
        include_children: bool,
    ) -> Result<PromotionApplicableCategory, PromotionRepoError> {
        let result: Result<ApplicableCategoryEntry, sqlx::Error> = query_as(
            "INSERT INTO promotion_applicable_categories(id, promotion_id, category_id, include_children) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(PromotionApplicableCategoryId::generate().as_uuid())
        .bind(promotion_id.as_uuid())
        .bind(category_id.as_uuid())
        .bind(include_children)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(entry) => Ok(entry.into()),
            Err(e) if is_unique_violation(&e) => Err(CategoryAlreadyApplicable {
                promotion_id,
                category_id,
            }),
            Err(e) if is_foreign_key_violation(&e) => {
                if violated_constraint(&e)
                    == Some("promotion_applicable_categories_promotion_id_fkey")
                {
                    Err(PromotionNotFound(promotion_id))
                } else {
                    Err(CategoryNotFound(category_id))
                }
            }
            Err(e) => Err(anyhow::Error::new(e)
                .context("Unable to add applicable category")
                .into()),
        }
    }

    #[instrument(skip(self))]
    async fn get_applicable_categories(
        &self,
        promotion_id: PromotionId,
    ) -> Result<Vec<PromotionApplicableCategory>, PromotionRepoError> {
        self.get_promotion(promotion_id).await?;
        let entries: Vec<ApplicableCategoryEntry> = query_as(
            "SELECT * FROM promotion_applicable_categories WHERE promotion_id = $1 ORDER BY created_at, id",
        )
        .bind(promotion_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .context("Unable to get applicable categories")?;
        Ok(entries.into_iter().map(|e| e.into()).collect())
    }

    #[instrument(skip(self))]
    async fn remove_applicable_category(
        &self,
        promotion_id: PromotionId,
        category_id: CategoryId,
    ) -> Result<PromotionApplicableCategory, PromotionRepoError> {
        let entry: Option<ApplicableCategoryEntry> = query_as(
            "DELETE FROM promotion_applicable_categories WHERE promotion_id = $1 AND category_id = $2 RETURNING *",
        )
        .bind(promotion_id.as_uuid())
        .bind(category_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .context("Unable to remove applicable category")?;
        let entry = entry.ok_or(CategoryNotApplicable {
            promotion_id,
            category_id,
        })?;
        Ok(entry.into())
    }
}
